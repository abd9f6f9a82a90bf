//! Error types for wiregen-runtime
//!
//! Runtime failures are immediate startup errors: a consumer configured to
//! fail found no contributions, or options validation refused the
//! configuration. Nothing here retries or times out.

use thiserror::Error;

use crate::options::ValidationFinding;

/// Main error type for runtime consumers
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// A consumer with `FallbackPolicy::Fail` found the bootstrap empty
    #[error("no generated contributions available: {0}")]
    NoContributions(String),

    /// Error-severity options validation findings at startup
    #[error("{failed} options validation failure(s): {summary}")]
    OptionsValidation {
        failed: usize,
        summary: String,
        findings: Vec<ValidationFinding>,
    },
}

impl RuntimeError {
    /// Create a no-contributions error
    pub fn no_contributions(context: impl Into<String>) -> Self {
        RuntimeError::NoContributions(context.into())
    }
}

/// Result type alias for runtime operations
pub type Result<T> = std::result::Result<T, RuntimeError>;
