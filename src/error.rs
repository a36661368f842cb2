//! Error types for the rules engine

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Illegal action: {0}")]
    IllegalAction(String),

    #[error("Entity not found: {0}")]
    EntityNotFound(u32),

    #[error("Invalid selection: {0}")]
    InvalidSelection(String),

    #[error("Invalid card data: {0}")]
    InvalidCardData(String),

    #[error("Invalid deck format: {0}")]
    InvalidDeckFormat(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl EngineError {
    /// Shorthand used throughout action validation
    pub fn illegal(message: impl Into<String>) -> Self {
        EngineError::IllegalAction(message.into())
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
