//! # Procedural Error Types
//!
//! All errors that can occur while configuring or running generation.
//!
//! Sampling itself never fails: parameters are validated when they are
//! constructed, so the hot path only ever sees values it can use.

use thiserror::Error;

/// Errors that can occur in the procedural system.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProceduralError {
    /// A generation parameter is outside its valid range.
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter {
        /// Name of the offending parameter.
        name: &'static str,
        /// Why the value was rejected.
        reason: String,
    },

    /// Configuration text could not be parsed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A compressed tile could not be decoded.
    #[error("corrupt tile: {0}")]
    CorruptTile(String),
}

impl ProceduralError {
    /// Shorthand for an [`ProceduralError::InvalidParameter`].
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

/// Result type for procedural operations.
pub type ProceduralResult<T> = Result<T, ProceduralError>;
