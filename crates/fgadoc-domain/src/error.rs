//! Domain error types for model canonicalization.

use thiserror::Error;

/// Domain-specific errors raised while turning a model document into its
/// canonical form.
#[derive(Debug, Error)]
pub enum DomainError {
    /// Zero or several input forms were supplied.
    #[error("invalid input: {message}")]
    InvalidInput { message: String },

    /// The selected adapter (DSL, JSON, native object, module compiler)
    /// rejected the input, or the parsed model violates a model invariant.
    #[error("model parse error: {message}")]
    ModelParseError { message: String },

    /// The module descriptor or one of its referenced files could not be
    /// read or understood.
    #[error("module resolution error for '{path}': {message}")]
    ModuleResolution { path: String, message: String },

    /// A valid model could not be rendered: canonical serialization failed,
    /// or the model uses constructs the DSL cannot express.
    #[error("encoding error: {message}")]
    EncodingError { message: String },
}

impl DomainError {
    /// Shorthand for a [`DomainError::ModelParseError`].
    pub fn parse(message: impl Into<String>) -> Self {
        Self::ModelParseError {
            message: message.into(),
        }
    }

    /// Shorthand for a [`DomainError::EncodingError`].
    pub fn encoding(message: impl Into<String>) -> Self {
        Self::EncodingError {
            message: message.into(),
        }
    }

    /// Shorthand for a [`DomainError::ModuleResolution`] attributed to `path`.
    pub fn module(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ModuleResolution {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
