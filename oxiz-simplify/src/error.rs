//! Error types for OxiZ simplification.

use thiserror::Error;

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, OxizError>;

/// Errors surfaced to the driver.
///
/// Simplification passes themselves never fail; these errors come from
/// configuration handling and pass lookup.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OxizError {
    /// A parameter name that no registered schema knows about.
    #[error("unknown parameter '{0}'")]
    UnknownParameter(String),

    /// A simplifier name that is not registered.
    #[error("unknown simplifier '{0}'")]
    UnknownSimplifier(String),

    /// A parameter value that does not parse for the declared kind.
    #[error("invalid value '{value}' for parameter '{name}': expected {expected}")]
    InvalidParameter {
        /// Parameter name.
        name: String,
        /// Offending text.
        value: String,
        /// Expected kind.
        expected: &'static str,
    },
}

impl OxizError {
    /// Build an [`OxizError::InvalidParameter`].
    pub fn invalid_parameter(
        name: impl Into<String>,
        value: impl Into<String>,
        expected: &'static str,
    ) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            value: value.into(),
            expected,
        }
    }
}
