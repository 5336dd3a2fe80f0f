//! Host Binding
//!
//! [`HostPlatform`] is the seam to a concrete server or proxy;
//! [`HostAdapter`] drives a coordinator from that host's callbacks.

mod adapter;
mod platform;

pub use adapter::{DisableReport, EnableReport, HostAdapter};
pub use platform::{HostPlatform, Platform, TaskId};
