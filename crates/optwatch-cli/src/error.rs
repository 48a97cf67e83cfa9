use optwatch_core::{CoreError, PersistenceError, SourceError, ValidationError};
use thiserror::Error;

/// Startup and terminal failures mapped to exit codes.
///
/// Per-command problems never reach this type; they are printed and the
/// session goes on.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<CoreError> for CliError {
    fn from(error: CoreError) -> Self {
        match error {
            CoreError::Validation(error) => Self::Validation(error),
            CoreError::Persistence(error) => Self::Persistence(error),
            CoreError::Source(error) => Self::Source(error),
        }
    }
}

impl CliError {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Validation(_) => 2,
            Self::Source(_) => 3,
            Self::Persistence(_) | Self::Io(_) => 10,
        }
    }
}
