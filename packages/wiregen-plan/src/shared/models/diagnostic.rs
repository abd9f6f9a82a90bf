//! Diagnostic findings
//!
//! Every analyzer reports through the same coded channel. Codes are stable:
//! severity and message template are fixed per code, and messages are
//! rendered from positional arguments so tooling can match on either.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::symbol::SourceLocation;

/// Severity of a finding. Order matters: `Error` blocks generation,
/// `Warning` and `Info` ride along in the outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stable diagnostic code. The wire string, severity and message template of
/// a code never change once shipped; new behavior gets a new code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiagnosticCode {
    /// A marker names a contract the type does not implement.
    ContractNotImplemented,
    /// Open decorator and target disagree on generic arity.
    DecoratorArityMismatch,
    /// Decorator does not implement the contract it decorates.
    DecoratorMissingContract,
    /// Constructor dependency cycle.
    CircularDependency,
    /// Longer-lived consumer of a shorter-lived dependency.
    LifetimeMismatch,
    /// Longer-lived consumer capturing a shorter-lived disposable.
    CaptiveDisposable,
    /// Marker with no effect.
    RedundantMarker,
    /// Collection dependency with zero discovered implementations.
    EmptyCollection,
    /// Deferred reference to a contract nothing registers.
    DeferredUnregistered,
    /// Unparseable pattern in a Matches validation rule.
    InvalidPattern,
}

impl DiagnosticCode {
    pub fn code(&self) -> &'static str {
        match self {
            DiagnosticCode::ContractNotImplemented => "WG001",
            DiagnosticCode::DecoratorArityMismatch => "WG002",
            DiagnosticCode::DecoratorMissingContract => "WG003",
            DiagnosticCode::CircularDependency => "WG004",
            DiagnosticCode::LifetimeMismatch => "WG005",
            DiagnosticCode::CaptiveDisposable => "WG006",
            DiagnosticCode::RedundantMarker => "WG007",
            DiagnosticCode::EmptyCollection => "WG008",
            DiagnosticCode::DeferredUnregistered => "WG009",
            DiagnosticCode::InvalidPattern => "WG010",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            DiagnosticCode::ContractNotImplemented
            | DiagnosticCode::DecoratorArityMismatch
            | DiagnosticCode::DecoratorMissingContract
            | DiagnosticCode::CircularDependency
            | DiagnosticCode::CaptiveDisposable
            | DiagnosticCode::InvalidPattern => Severity::Error,
            DiagnosticCode::LifetimeMismatch | DiagnosticCode::RedundantMarker => Severity::Warning,
            DiagnosticCode::EmptyCollection | DiagnosticCode::DeferredUnregistered => Severity::Info,
        }
    }

    /// Message template with positional `{n}` slots.
    pub fn template(&self) -> &'static str {
        match self {
            DiagnosticCode::ContractNotImplemented => {
                "'{0}' does not implement contract '{1}' named by its {2} marker"
            }
            DiagnosticCode::DecoratorArityMismatch => {
                "decorator '{0}' has {1} type parameter(s) but target '{2}' expects {3}"
            }
            DiagnosticCode::DecoratorMissingContract => {
                "decorator '{0}' does not implement its target contract '{1}'"
            }
            DiagnosticCode::CircularDependency => "circular constructor dependency: {0}",
            DiagnosticCode::LifetimeMismatch => "{0} '{1}' depends on {2} '{3}'",
            DiagnosticCode::CaptiveDisposable => "{0} '{1}' captures disposable {2} '{3}'",
            DiagnosticCode::RedundantMarker => "{0} marker on '{1}' has no effect: {2}",
            DiagnosticCode::EmptyCollection => {
                "collection of '{0}' consumed by '{1}' has no registered implementations"
            }
            DiagnosticCode::DeferredUnregistered => {
                "deferred reference to '{0}' in '{1}' resolves to no registration"
            }
            DiagnosticCode::InvalidPattern => {
                "pattern '{0}' on member '{1}' of '{2}' does not parse: {3}"
            }
        }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A rendered diagnostic finding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub code: DiagnosticCode,
    pub message: String,
    pub location: SourceLocation,
}

impl Finding {
    /// Render a finding from the code's template and positional args.
    pub fn new(code: DiagnosticCode, args: &[&str], location: SourceLocation) -> Self {
        let mut message = code.template().to_string();
        for (i, arg) in args.iter().enumerate() {
            message = message.replace(&format!("{{{i}}}"), arg);
        }
        Self {
            code,
            message,
            location,
        }
    }

    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    pub fn is_blocking(&self) -> bool {
        self.severity() == Severity::Error
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] {} ({})",
            self.code,
            self.severity(),
            self.message,
            self.location
        )
    }
}

/// Whether any finding blocks artifact generation.
pub fn has_blocking(findings: &[Finding]) -> bool {
    findings.iter().any(Finding::is_blocking)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_order() {
        assert!(Severity::Error > Severity::Warning);
        assert!(Severity::Warning > Severity::Info);
    }

    #[test]
    fn test_template_rendering() {
        let finding = Finding::new(
            DiagnosticCode::LifetimeMismatch,
            &["singleton", "app.Api", "scoped", "app.Session"],
            SourceLocation::new("api.src", 12),
        );
        assert_eq!(finding.message, "singleton 'app.Api' depends on scoped 'app.Session'");
        assert_eq!(finding.severity(), Severity::Warning);
        assert_eq!(finding.code.code(), "WG005");
    }

    #[test]
    fn test_display_carries_code_and_location() {
        let finding = Finding::new(
            DiagnosticCode::CircularDependency,
            &["app.A -> app.B -> app.A"],
            SourceLocation::new("a.src", 3),
        );
        let rendered = finding.to_string();
        assert!(rendered.starts_with("WG004 [error]"));
        assert!(rendered.contains("a.src:3"));
    }

    #[test]
    fn test_has_blocking() {
        let warn = Finding::new(
            DiagnosticCode::RedundantMarker,
            &["lifetime", "app.A", "duplicate"],
            SourceLocation::unknown(),
        );
        assert!(!has_blocking(&[warn.clone()]));

        let err = Finding::new(
            DiagnosticCode::DecoratorMissingContract,
            &["app.Deco", "app.IHandler<app.Order>"],
            SourceLocation::unknown(),
        );
        assert!(has_blocking(&[warn, err]));
    }
}
