use thiserror::Error;

use crate::path::PathError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditorError {
    #[error(transparent)]
    Path(#[from] PathError),

    #[error("Structural error: {0}")]
    Structural(String),

    /// Nothing to act on. Benign: the tree is untouched and history is unchanged.
    #[error("Nothing to do: {0}")]
    NoOp(String),

    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("Unknown query: {0}")]
    UnknownQuery(String),

    #[error("Invalid arguments for {command}: {reason}")]
    InvalidArgs { command: String, reason: String },

    #[error("Normalization did not converge after {0} passes")]
    NormalizeDidNotConverge(usize),
}

impl EditorError {
    pub fn structural(message: impl Into<String>) -> Self {
        EditorError::Structural(message.into())
    }

    pub fn no_op(message: impl Into<String>) -> Self {
        EditorError::NoOp(message.into())
    }

    pub fn invalid_args(command: impl Into<String>, reason: impl Into<String>) -> Self {
        EditorError::InvalidArgs {
            command: command.into(),
            reason: reason.into(),
        }
    }

    pub fn is_no_op(&self) -> bool {
        matches!(self, EditorError::NoOp(_))
    }
}

pub type Result<T> = std::result::Result<T, EditorError>;
