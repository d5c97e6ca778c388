//! Model error types.

use thiserror::Error;

pub type ModelResult<T> = Result<T, ModelError>;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Invalid render mode: {0}")]
    InvalidMode(String),

    #[error("Invalid style preset: {0}")]
    InvalidStyle(String),
}

impl ModelError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}
