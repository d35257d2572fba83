/// Convenience result type used across dualalpha.
pub type DualAlphaResult<T> = Result<T, DualAlphaError>;

/// Top-level error taxonomy used by engine and dispatch APIs.
#[derive(thiserror::Error, Debug)]
pub enum DualAlphaError {
    /// Malformed input: missing frame data, zero dimensions, bad options.
    #[error("validation error: {0}")]
    Validation(String),

    /// A job could not be carried out by the worker pool (panic, shutdown, lost worker).
    #[error("dispatch error: {0}")]
    Dispatch(String),

    /// Errors when serializing or deserializing configuration.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DualAlphaError {
    /// Build a [`DualAlphaError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`DualAlphaError::Dispatch`] value.
    pub fn dispatch(msg: impl Into<String>) -> Self {
        Self::Dispatch(msg.into())
    }

    /// Build a [`DualAlphaError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

impl From<serde_json::Error> for DualAlphaError {
    fn from(e: serde_json::Error) -> Self {
        Self::serde(e.to_string())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
