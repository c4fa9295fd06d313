//! Crate-level error type

use thiserror::Error;

use crate::repository::RepositoryError;

/// Result type alias using the crate's [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the crate
///
/// Large error variants are boxed to reduce stack size
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(Box<figment::Error>),

    /// Repository operation failed
    #[error("{0}")]
    Repository(#[from] RepositoryError),

    /// Connection pool could not be established
    #[error("Database connection error: {0}")]
    Connection(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// The repository error, if this is one
    pub fn as_repository(&self) -> Option<&RepositoryError> {
        match self {
            Self::Repository(err) => Some(err),
            _ => None,
        }
    }
}

// Manual From implementations for boxed errors
impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Error::Config(Box::new(err))
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        Error::Repository(RepositoryError::from(err))
    }
}
