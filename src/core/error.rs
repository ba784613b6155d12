use thiserror::Error;

#[derive(Error, Debug)]
pub enum SeedError {
    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    #[error("Property '{0}' not found on '{1}'")]
    PropertyNotFound(String, String),

    #[error("Key mismatch: {0}")]
    KeyMismatch(String),

    #[error("Entity type '{0}' is not mapped in this context")]
    EntityNotMapped(String),

    #[error("Entity type '{0}' is already mapped")]
    EntityExists(String),

    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("History store error: {0}")]
    History(String),

    #[error("Migration '{migration}' failed: {source}")]
    Migration {
        migration: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Execution error: {0}")]
    Execution(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Lock error: {0}")]
    LockError(String),
}

pub type Result<T> = std::result::Result<T, SeedError>;

impl<T> From<std::sync::PoisonError<T>> for SeedError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        Self::LockError(err.to_string())
    }
}

impl From<serde_json::Error> for SeedError {
    fn from(err: serde_json::Error) -> Self {
        Self::Config(err.to_string())
    }
}
