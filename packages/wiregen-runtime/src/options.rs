//! Options binding support
//!
//! The generated module binds configuration values onto options types and
//! validates them at startup. This module is the runtime half of that
//! contract: the configuration seam, scalar coercion, validation rules and
//! the startup gate that turns error findings into a refusal.
//!
//! Key rules:
//! - Coercion failures are silent. A member whose raw value does not parse
//!   keeps its default; validation treats it as absent.
//! - `rules::required` is the only presence check. Every other rule passes
//!   on absent values and validates only what actually parsed.
//! - `rules::matches` anchors the pattern to the full value.

use rustc_hash::FxHashMap;
use tracing::{info, warn};

use crate::errors::{Result, RuntimeError};

/// Configuration lookup seam between the host and generated binding code.
///
/// Sections arrive in the host's path convention verbatim (for example
/// `"Billing:Retry"`); the runtime never splits or normalizes them.
pub trait ConfigSource {
    /// Raw text for `key` under `section`, or `None` when unset.
    fn value(&self, section: &str, key: &str) -> Option<String>;
}

/// In-memory configuration for tests and small hosts.
#[derive(Debug, Clone, Default)]
pub struct MemoryConfigSource {
    values: FxHashMap<(String, String), String>,
}

impl MemoryConfigSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Chainable insert for building fixtures.
    pub fn set(
        mut self,
        section: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.insert(section, key, value);
        self
    }

    pub fn insert(
        &mut self,
        section: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<String>,
    ) {
        self.values
            .insert((section.into(), key.into()), value.into());
    }
}

impl ConfigSource for MemoryConfigSource {
    fn value(&self, section: &str, key: &str) -> Option<String> {
        self.values
            .get(&(section.to_owned(), key.to_owned()))
            .cloned()
    }
}

/// Severity of a validation finding. Only errors refuse startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// One validation outcome for a bound member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationFinding {
    pub member: String,
    pub code: &'static str,
    pub message: String,
    pub severity: Severity,
}

impl ValidationFinding {
    /// Create an error-severity finding
    pub fn error(member: impl Into<String>, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            member: member.into(),
            code,
            message: message.into(),
            severity: Severity::Error,
        }
    }
}

/// Scalar coercion from raw configuration text.
pub mod coerce {
    /// Parse an integer member value.
    pub fn integer(raw: &str) -> Option<i64> {
        raw.trim().parse().ok()
    }

    /// Parse a float member value.
    pub fn float(raw: &str) -> Option<f64> {
        raw.trim().parse().ok()
    }

    /// Accepts the usual configuration spellings of a flag, case-insensitive.
    pub fn boolean(raw: &str) -> Option<bool> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Some(true),
            "false" | "0" | "no" | "off" => Some(false),
            _ => None,
        }
    }
}

/// Validation rules invoked by generated `validate_*` functions.
pub mod rules {
    use std::fmt;

    use regex::Regex;

    use super::ValidationFinding;

    /// The value must be present and non-blank.
    pub fn required(member: &str, value: Option<&str>, findings: &mut Vec<ValidationFinding>) {
        let present = value.is_some_and(|v| !v.trim().is_empty());
        if !present {
            findings.push(ValidationFinding::error(
                member,
                "required",
                "value is required",
            ));
        }
    }

    /// The parsed value must fall inside the closed interval.
    pub fn range(
        member: &str,
        value: Option<f64>,
        min: Option<f64>,
        max: Option<f64>,
        findings: &mut Vec<ValidationFinding>,
    ) {
        let Some(value) = value else { return };
        let below = min.is_some_and(|lo| value < lo);
        let above = max.is_some_and(|hi| value > hi);
        if below || above {
            findings.push(ValidationFinding::error(
                member,
                "range",
                format!("value {value} outside {}", bounds(min, max)),
            ));
        }
    }

    /// The value's character count must fall inside the closed interval.
    pub fn length(
        member: &str,
        value: Option<&str>,
        min: Option<usize>,
        max: Option<usize>,
        findings: &mut Vec<ValidationFinding>,
    ) {
        let Some(value) = value else { return };
        let count = value.chars().count();
        let below = min.is_some_and(|lo| count < lo);
        let above = max.is_some_and(|hi| count > hi);
        if below || above {
            findings.push(ValidationFinding::error(
                member,
                "length",
                format!("length {count} outside {}", bounds(min, max)),
            ));
        }
    }

    /// The whole value must match `pattern`. An invalid pattern is itself a
    /// finding rather than a panic.
    pub fn matches(
        member: &str,
        value: Option<&str>,
        pattern: &str,
        findings: &mut Vec<ValidationFinding>,
    ) {
        let Some(value) = value else { return };
        match Regex::new(&format!("^(?:{pattern})$")) {
            Ok(re) => {
                if !re.is_match(value) {
                    findings.push(ValidationFinding::error(
                        member,
                        "pattern",
                        format!("value {value:?} does not match pattern {pattern:?}"),
                    ));
                }
            }
            Err(err) => {
                findings.push(ValidationFinding::error(
                    member,
                    "invalid-pattern",
                    format!("invalid validation pattern {pattern:?}: {err}"),
                ));
            }
        }
    }

    fn bounds<T: fmt::Display>(min: Option<T>, max: Option<T>) -> String {
        match (min, max) {
            (Some(lo), Some(hi)) => format!("{lo}..={hi}"),
            (Some(lo), None) => format!(">= {lo}"),
            (None, Some(hi)) => format!("<= {hi}"),
            (None, None) => "unbounded".to_owned(),
        }
    }
}

/// Startup gate over validation findings.
///
/// Error findings refuse startup; warnings and infos are logged and
/// discarded.
pub fn ensure_valid(findings: Vec<ValidationFinding>) -> Result<()> {
    let mut errors = Vec::new();
    for finding in findings {
        match finding.severity {
            Severity::Error => errors.push(finding),
            Severity::Warning => warn!(
                member = %finding.member,
                "options validation: {}",
                finding.message
            ),
            Severity::Info => info!(
                member = %finding.member,
                "options validation: {}",
                finding.message
            ),
        }
    }
    if errors.is_empty() {
        return Ok(());
    }
    let summary = errors
        .iter()
        .map(|f| format!("{}: {}", f.member, f.message))
        .collect::<Vec<_>>()
        .join("; ");
    Err(RuntimeError::OptionsValidation {
        failed: errors.len(),
        summary,
        findings: errors,
    })
}
