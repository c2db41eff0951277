/// Core error types for Platter
use thiserror::Error;

/// Result type alias using `CoreError`
pub type Result<T> = std::result::Result<T, CoreError>;

/// Core error type for Platter
#[derive(Error, Debug)]
pub enum CoreError {
    /// Entity not found
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// A track locator could not be turned into a playable URL
    #[error("Cannot resolve {locator}: {reason}")]
    Unresolvable { locator: String, reason: String },

    /// The locator points at something that is not audio
    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The played sink could not record the play
    #[error("Sink error: {0}")]
    Sink(String),

    /// I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

impl CoreError {
    /// Create a not found error
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Create an unresolvable locator error
    pub fn unresolvable(locator: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Unresolvable {
            locator: locator.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }
}
