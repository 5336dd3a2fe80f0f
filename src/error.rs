use thiserror::Error;

pub type Result<T> = std::result::Result<T, MossError>;

#[derive(Debug, Error)]
pub enum MossError {
    #[error("Dependency not found: {type_name}")]
    DependencyNotFound { type_name: String },

    #[error("Failed to downcast type: {type_name}")]
    DowncastFailed { type_name: String },

    #[error("Unsatisfiable dependencies between: {cycle}")]
    CircularDependency { cycle: String },

    #[error("Component registered twice: {type_name}")]
    DuplicateComponent { type_name: String },

    #[error("Registry {registry} is closed")]
    RegistryClosed { registry: String },

    #[error("Module registration failed: {message}")]
    ModuleRegistrationFailed { message: String },

    #[error("Invalid configuration for {key}: {message}")]
    Config { key: String, message: String },

    #[error("Component factory failed for {type_name}: {source}")]
    Factory {
        type_name: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl MossError {
    pub fn not_found<T: ?Sized>() -> Self {
        MossError::DependencyNotFound {
            type_name: std::any::type_name::<T>().to_string(),
        }
    }

    pub fn config(key: impl Into<String>, message: impl Into<String>) -> Self {
        MossError::Config {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Whether the failure may resolve once more components are wired.
    pub(crate) fn is_missing_dependency(&self) -> bool {
        matches!(self, MossError::DependencyNotFound { .. })
    }
}
