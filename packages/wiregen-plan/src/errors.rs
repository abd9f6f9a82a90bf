//! Error types for wiregen-plan
//!
//! Provides unified error handling across the crate. Findings are not errors:
//! only blocking findings surface here, when a caller asks for an artifact.

use thiserror::Error;

use crate::shared::models::Finding;

/// Main error type for planning operations
#[derive(Debug, Error)]
pub enum PlanError {
    /// Input model violates a pass invariant
    #[error("invalid input model: {0}")]
    InvalidInput(String),

    /// Cooperative cancellation observed between descriptors
    #[error("planning cancelled after {completed} descriptor(s)")]
    Cancelled { completed: usize },

    /// Error-severity findings refuse artifact generation
    #[error("{blocking} blocking finding(s); artifact generation refused")]
    BlockedByFindings {
        blocking: usize,
        findings: Vec<Finding>,
    },

    /// Graph export serialization error
    #[error("graph export failed: {0}")]
    Export(#[from] serde_json::Error),

    /// Configuration error
    #[error("invalid planner configuration: {0}")]
    Config(String),
}

impl PlanError {
    /// Create an invalid-input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        PlanError::InvalidInput(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        PlanError::Config(msg.into())
    }

    /// Wrap blocking findings, keeping only the blocking subset
    pub fn blocked(findings: Vec<Finding>) -> Self {
        let blocking: Vec<Finding> = findings.into_iter().filter(Finding::is_blocking).collect();
        PlanError::BlockedByFindings {
            blocking: blocking.len(),
            findings: blocking,
        }
    }
}

/// Result type alias for planning operations
pub type Result<T> = std::result::Result<T, PlanError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::models::{DiagnosticCode, SourceLocation};

    #[test]
    fn test_blocked_keeps_only_errors() {
        let warn = Finding::new(
            DiagnosticCode::LifetimeMismatch,
            &["singleton", "A", "scoped", "B"],
            SourceLocation::unknown(),
        );
        let err = Finding::new(
            DiagnosticCode::CircularDependency,
            &["A -> B -> A"],
            SourceLocation::unknown(),
        );

        match PlanError::blocked(vec![warn, err]) {
            PlanError::BlockedByFindings { blocking, findings } => {
                assert_eq!(blocking, 1);
                assert_eq!(findings.len(), 1);
                assert_eq!(findings[0].code, DiagnosticCode::CircularDependency);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_error_display() {
        let err = PlanError::Cancelled { completed: 3 };
        assert_eq!(err.to_string(), "planning cancelled after 3 descriptor(s)");
    }
}
