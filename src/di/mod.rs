mod builder;
mod component;
mod injectable;
mod registry;

pub use builder::RegistryBuilder;
pub use component::{Capabilities, Component, ComponentRef};
pub use injectable::Injectable;
pub use registry::{Registry, RegistryId};
