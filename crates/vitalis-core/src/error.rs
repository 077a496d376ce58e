//! Error types for the Vitalis conversational core.

use serde::Serialize;
use thiserror::Error;

/// A shared error type for the conversational core.
///
/// This provides typed, structured error variants with automatic conversion
/// from common error types via the `From` trait.
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
pub enum CoreError {
    /// User input was empty after trimming; rejected before dispatch.
    #[error("Input is empty")]
    EmptyInput,

    /// Entity not found error with type information
    #[error("Entity not found: {entity_type} '{id}'")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// A generation call failed (after retries, if any)
    #[error("Generation error: {0}")]
    Generation(String),

    /// Session transport failure (listing, paging, sending)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization {
        format: String, // "TOML", "JSON", etc.
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// The operation was superseded by a newer request
    #[error("Operation cancelled")]
    Cancelled,

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates a NotFound error
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Creates a Generation error
    pub fn generation(message: impl Into<String>) -> Self {
        Self::Generation(message.into())
    }

    /// Creates a Transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if this is a NotFound error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is an empty-input rejection
    pub fn is_empty_input(&self) -> bool {
        matches!(self, Self::EmptyInput)
    }

    /// Check if this is a cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Check if this is a serialization error
    pub fn is_serialization(&self) -> bool {
        matches!(self, Self::Serialization { .. })
    }

    /// Returns true for failures a retry may resolve.
    ///
    /// Generation and transport failures are transient; everything else is
    /// deterministic and retrying would only repeat it.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Generation(_) | Self::Transport(_))
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for CoreError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal(format!("{} (kind: {:?})", err, err.kind()))
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for CoreError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<crate::generation::GenerationError> for CoreError {
    fn from(err: crate::generation::GenerationError) -> Self {
        use crate::generation::GenerationError;

        match err {
            GenerationError::Cancelled => Self::Cancelled,
            other => Self::generation(other.to_string()),
        }
    }
}

/// Conversion from String (for error messages)
impl From<String> for CoreError {
    fn from(err: String) -> Self {
        Self::internal(err)
    }
}

/// A type alias for `Result<T, CoreError>`.
pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(CoreError::generation("boom").is_transient());
        assert!(CoreError::transport("offline").is_transient());
        assert!(!CoreError::EmptyInput.is_transient());
        assert!(!CoreError::not_found("Session", "s-1").is_transient());
    }

    #[test]
    fn test_json_error_conversion() {
        let err: CoreError = serde_json::from_str::<serde_json::Value>("{oops")
            .unwrap_err()
            .into();
        assert!(err.is_serialization());
        assert!(err.to_string().starts_with("Serialization error: JSON"));
    }

    #[test]
    fn test_generation_error_conversion() {
        use crate::generation::GenerationError;

        let err: CoreError = GenerationError::failed("quota").into();
        assert_eq!(err, CoreError::Generation("Generation failed: quota".to_string()));
        assert!(CoreError::from(GenerationError::Cancelled).is_cancelled());
        assert_eq!(
            CoreError::from("boom".to_string()),
            CoreError::Internal("boom".to_string())
        );
    }

    #[test]
    fn test_not_found_display() {
        let err = CoreError::not_found("Session", "abc");
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Entity not found: Session 'abc'");
    }
}
