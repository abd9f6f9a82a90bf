//! Fallback policy for unconfigured consumers

use tracing::warn;

use crate::errors::{Result, RuntimeError};

/// What a consumer does when the bootstrap holds nothing for it.
///
/// Consumers handed an explicit view never consult this; the host's own
/// registration path stays valid under `Silent`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FallbackPolicy {
    /// No-op.
    #[default]
    Silent,
    /// Log a warning and continue.
    Log,
    /// Refuse startup.
    Fail,
}

impl FallbackPolicy {
    pub fn engage(&self, context: &str) -> Result<()> {
        match self {
            FallbackPolicy::Silent => Ok(()),
            FallbackPolicy::Log => {
                warn!(context, "no generated contributions; falling back");
                Ok(())
            }
            FallbackPolicy::Fail => Err(RuntimeError::no_contributions(context)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silent_and_log_continue() {
        assert!(FallbackPolicy::Silent.engage("test").is_ok());
        assert!(FallbackPolicy::Log.engage("test").is_ok());
    }

    #[test]
    fn test_fail_refuses() {
        let err = FallbackPolicy::Fail.engage("plugin catalog").unwrap_err();
        assert!(matches!(err, RuntimeError::NoContributions(_)));
    }
}
