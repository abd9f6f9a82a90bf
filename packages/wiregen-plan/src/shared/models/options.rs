//! Options binding model
//!
//! Options types are bound from configuration sections rather than resolved
//! from other services. The planner picks a binding strategy per type and
//! collects the validation rules to wire when validate-on-start is set.

use serde::{Deserialize, Serialize};

use super::symbol::{ScalarKind, SourceLocation, TypeId};

/// Declarative validation attached to a bindable member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ValidationRule {
    /// The key must be present and non-empty.
    Required,
    /// Numeric bounds, inclusive on both ends.
    Range { min: Option<f64>, max: Option<f64> },
    /// String length bounds, inclusive on both ends.
    Length { min: Option<usize>, max: Option<usize> },
    /// The value must match the pattern in full.
    Matches { pattern: String },
}

impl ValidationRule {
    pub fn name(&self) -> &'static str {
        match self {
            ValidationRule::Required => "required",
            ValidationRule::Range { .. } => "range",
            ValidationRule::Length { .. } => "length",
            ValidationRule::Matches { .. } => "matches",
        }
    }
}

/// How an options type is materialized from its section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BindingStrategy {
    /// Construct with defaults, then assign each bound property whose key is
    /// present. Absent keys leave the member's default untouched.
    SetProperties,
    /// Single construction expression with per-parameter key lookups, for
    /// types whose members are init-only.
    Construct,
}

impl BindingStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            BindingStrategy::SetProperties => "set-properties",
            BindingStrategy::Construct => "construct",
        }
    }
}

/// One member bound from one configuration key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberBinding {
    pub member: String,
    pub scalar: ScalarKind,
    /// Key within the section, defaulting to the member name.
    pub key: String,
}

/// A validation rule anchored to the member it checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberRule {
    pub member: String,
    pub rule: ValidationRule,
}

/// A fully planned options binding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionsDescriptor {
    pub target: TypeId,
    /// Configuration section path (`Services:Payments`).
    pub section: String,
    /// Named-instance qualifier, `None` for the default instance.
    pub name: Option<String>,
    pub validate_on_start: bool,
    pub strategy: BindingStrategy,
    pub members: Vec<MemberBinding>,
    /// Rules to evaluate at startup; empty unless `validate_on_start`.
    pub rules: Vec<MemberRule>,
    pub location: SourceLocation,
}

impl OptionsDescriptor {
    pub fn binding_for(&self, member: &str) -> Option<&MemberBinding> {
        self.members.iter().find(|m| m.member == member)
    }
}
