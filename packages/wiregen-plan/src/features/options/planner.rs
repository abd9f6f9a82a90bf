//! Options binding planner
//!
//! Fifth stage of a pass. Each options seed resolves to a binding strategy:
//!
//! - `SetProperties` when the type has assignable bindable members: construct
//!   with defaults, then assign each member whose key is present
//! - `Construct` otherwise: a single construction expression with
//!   per-parameter key lookups, covering init-only shapes
//!
//! Validation rules are collected off the bound members and wired only when
//! the seed asks for validate-on-start. Matches patterns are syntax-checked
//! here regardless, so a bad pattern fails the pass instead of the host's
//! startup.

use regex::Regex;
use tracing::debug;

use crate::errors::{PlanError, Result};
use crate::features::catalog::{OptionsSeed, SymbolCatalog};
use crate::shared::cancel::CancelToken;
use crate::shared::models::{
    BindingStrategy, DiagnosticCode, Finding, MemberBinding, MemberRule, OptionsDescriptor,
    PropertySymbol, TypeSymbol, ValidationRule,
};

pub struct OptionsBindingPlanner;

impl OptionsBindingPlanner {
    pub fn plan(
        catalog: &SymbolCatalog,
        cancel: &CancelToken,
    ) -> Result<(Vec<OptionsDescriptor>, Vec<Finding>)> {
        let mut descriptors = Vec::new();
        let mut findings = Vec::new();

        for (completed, seed) in catalog.options_seeds.iter().enumerate() {
            if cancel.is_cancelled() {
                return Err(PlanError::Cancelled { completed });
            }
            let Some(symbol) = catalog.symbol(&seed.target) else {
                continue;
            };
            descriptors.push(Self::plan_one(seed, symbol, &mut findings));
        }

        debug!(
            options = descriptors.len(),
            findings = findings.len(),
            "options binding planned"
        );
        Ok((descriptors, findings))
    }

    fn plan_one(
        seed: &OptionsSeed,
        symbol: &TypeSymbol,
        findings: &mut Vec<Finding>,
    ) -> OptionsDescriptor {
        let assignable: Vec<&PropertySymbol> = symbol
            .properties
            .iter()
            .filter(|p| p.assignable && p.scalar.bindable())
            .collect();

        let (strategy, bound) = if assignable.is_empty() {
            let init_only: Vec<&PropertySymbol> = symbol
                .properties
                .iter()
                .filter(|p| !p.assignable && p.scalar.bindable())
                .collect();
            (BindingStrategy::Construct, init_only)
        } else {
            (BindingStrategy::SetProperties, assignable)
        };

        let mut members: Vec<MemberBinding> = bound
            .iter()
            .map(|p| MemberBinding {
                member: p.name.clone(),
                scalar: p.scalar.clone(),
                key: p.name.clone(),
            })
            .collect();
        members.sort_by(|a, b| a.member.cmp(&b.member));

        let mut rules = Vec::new();
        for property in &bound {
            for rule in &property.rules {
                if let ValidationRule::Matches { pattern } = rule {
                    // A pattern that does not parse can never run; report it
                    // whether or not the seed wires validation.
                    if let Err(err) = Regex::new(pattern) {
                        findings.push(Finding::new(
                            DiagnosticCode::InvalidPattern,
                            &[pattern, &property.name, symbol.id.as_str(), &err.to_string()],
                            symbol.location.clone(),
                        ));
                        continue;
                    }
                }
                if seed.validate_on_start {
                    rules.push(MemberRule {
                        member: property.name.clone(),
                        rule: rule.clone(),
                    });
                }
            }
        }
        rules.sort_by(|a, b| {
            a.member
                .cmp(&b.member)
                .then_with(|| a.rule.name().cmp(b.rule.name()))
        });

        OptionsDescriptor {
            target: seed.target.clone(),
            section: seed.section.clone(),
            name: seed.name.clone(),
            validate_on_start: seed.validate_on_start,
            strategy,
            members,
            rules,
            location: seed.location.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::catalog::SymbolCatalogBuilder;
    use crate::shared::models::{CompilationUnit, Marker, ScalarKind};

    fn plan(types: Vec<TypeSymbol>) -> (Vec<OptionsDescriptor>, Vec<Finding>) {
        let unit = CompilationUnit {
            module: "app".to_string(),
            types,
        };
        let catalog = SymbolCatalogBuilder::build(&unit, &CancelToken::new()).unwrap();
        OptionsBindingPlanner::plan(&catalog, &CancelToken::new()).unwrap()
    }

    fn options_marker(validate: bool) -> Marker {
        Marker::Options {
            section: "Services:Retry".to_string(),
            name: None,
            validate_on_start: validate,
        }
    }

    #[test]
    fn test_assignable_members_choose_set_properties() {
        let (descriptors, findings) = plan(vec![TypeSymbol::new("app.RetryOptions")
            .with_marker(options_marker(false))
            .with_property(PropertySymbol::new("Count", ScalarKind::Integer).with_default())
            .with_property(PropertySymbol::new("Enabled", ScalarKind::Boolean))]);

        assert!(findings.is_empty());
        let descriptor = &descriptors[0];
        assert_eq!(descriptor.strategy, BindingStrategy::SetProperties);
        let members: Vec<&str> = descriptor.members.iter().map(|m| m.member.as_str()).collect();
        assert_eq!(members, vec!["Count", "Enabled"]);
        assert_eq!(descriptor.members[0].key, "Count");
    }

    #[test]
    fn test_init_only_members_choose_construct() {
        let (descriptors, _) = plan(vec![TypeSymbol::new("app.EndpointOptions")
            .with_marker(options_marker(false))
            .with_property(PropertySymbol::new("Url", ScalarKind::Text).init_only())
            .with_property(PropertySymbol::new("Timeout", ScalarKind::Integer).init_only())]);

        let descriptor = &descriptors[0];
        assert_eq!(descriptor.strategy, BindingStrategy::Construct);
        assert_eq!(descriptor.members.len(), 2);
    }

    #[test]
    fn test_unbindable_members_are_skipped() {
        let (descriptors, findings) = plan(vec![TypeSymbol::new("app.MixedOptions")
            .with_marker(options_marker(false))
            .with_property(PropertySymbol::new("Count", ScalarKind::Integer))
            .with_property(PropertySymbol::new(
                "Nested",
                ScalarKind::Other("app.Inner".into()),
            ))]);

        assert!(findings.is_empty());
        assert_eq!(descriptors[0].members.len(), 1);
        assert_eq!(descriptors[0].members[0].member, "Count");
    }

    #[test]
    fn test_rules_wired_only_with_validate_on_start() {
        let property = PropertySymbol::new("Count", ScalarKind::Integer)
            .with_rule(ValidationRule::Required)
            .with_rule(ValidationRule::Range {
                min: Some(1.0),
                max: Some(100.0),
            });

        let (without, _) = plan(vec![TypeSymbol::new("app.RetryOptions")
            .with_marker(options_marker(false))
            .with_property(property.clone())]);
        assert!(without[0].rules.is_empty());

        let (with, _) = plan(vec![TypeSymbol::new("app.RetryOptions")
            .with_marker(options_marker(true))
            .with_property(property)]);
        assert_eq!(with[0].rules.len(), 2);
        assert_eq!(with[0].rules[0].rule.name(), "range");
        assert_eq!(with[0].rules[1].rule.name(), "required");
    }

    #[test]
    fn test_invalid_pattern_reports_even_without_validation() {
        let (descriptors, findings) = plan(vec![TypeSymbol::new("app.HostOptions")
            .with_marker(options_marker(false))
            .with_property(
                PropertySymbol::new("Host", ScalarKind::Text).with_rule(ValidationRule::Matches {
                    pattern: "[unclosed".to_string(),
                }),
            )]);

        assert_eq!(descriptors.len(), 1);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].code, DiagnosticCode::InvalidPattern);
        assert!(findings[0].is_blocking());
    }

    #[test]
    fn test_invalid_pattern_not_wired_into_rules() {
        let (descriptors, findings) = plan(vec![TypeSymbol::new("app.HostOptions")
            .with_marker(options_marker(true))
            .with_property(
                PropertySymbol::new("Host", ScalarKind::Text)
                    .with_rule(ValidationRule::Matches {
                        pattern: "[unclosed".to_string(),
                    })
                    .with_rule(ValidationRule::Required),
            )]);

        assert_eq!(findings.len(), 1);
        assert_eq!(descriptors[0].rules.len(), 1);
        assert_eq!(descriptors[0].rules[0].rule.name(), "required");
    }
}
