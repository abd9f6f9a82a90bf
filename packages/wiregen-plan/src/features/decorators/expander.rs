//! Decorator expander
//!
//! Fourth stage of a pass. Open-generic decorators are declarations over an
//! open contract; this stage grounds them in the catalog by finding every
//! distinct closed instantiation actually registered and emitting one
//! registration per instantiation. Closed-type decorators pass through with
//! the same validation.
//!
//! Ordering is part of the contract: registrations sort by ascending order,
//! then decorator name, so equal orders wrap deterministically. Lower order
//! sits closest to the decorated implementation.

use rustc_hash::FxHashSet;
use tracing::debug;

use crate::errors::{PlanError, Result};
use crate::features::catalog::SymbolCatalog;
use crate::shared::cancel::CancelToken;
use crate::shared::models::{
    ContractRef, DecoratorRegistration, DiagnosticCode, Finding, OpenDecoratorDescriptor,
};

pub struct DecoratorExpander;

impl DecoratorExpander {
    pub fn expand(
        catalog: &SymbolCatalog,
        cancel: &CancelToken,
    ) -> Result<(Vec<DecoratorRegistration>, Vec<Finding>)> {
        let mut registrations = Vec::new();
        let mut findings = Vec::new();

        for (completed, open) in catalog.open_decorators.iter().enumerate() {
            if cancel.is_cancelled() {
                return Err(PlanError::Cancelled { completed });
            }
            if let Some(finding) = Self::validate_open(catalog, open) {
                findings.push(finding);
                continue;
            }
            Self::expand_open(catalog, open, &mut registrations);
        }

        for decl in &catalog.closed_decorators {
            let implements = catalog
                .symbol(&decl.decorator)
                .map(|s| s.contracts.contains(&decl.target))
                .unwrap_or(false);
            if !implements {
                findings.push(Finding::new(
                    DiagnosticCode::DecoratorMissingContract,
                    &[decl.decorator.as_str(), &decl.target.display()],
                    decl.location.clone(),
                ));
                continue;
            }
            registrations.push(DecoratorRegistration {
                contract: decl.target.clone(),
                decorator: decl.decorator.clone(),
                decorator_display: decl.decorator.to_string(),
                order: 0,
                location: decl.location.clone(),
            });
        }

        registrations.sort_by(|a, b| {
            a.contract
                .display()
                .cmp(&b.contract.display())
                .then_with(|| a.sort_key().cmp(&b.sort_key()))
        });
        registrations.dedup_by(|a, b| {
            a.contract == b.contract && a.decorator_display == b.decorator_display
        });

        debug!(
            registrations = registrations.len(),
            findings = findings.len(),
            "decorator expansion finished"
        );
        Ok((registrations, findings))
    }

    /// Arity and implementation checks; a failed declaration expands to
    /// nothing beyond its finding.
    fn validate_open(catalog: &SymbolCatalog, open: &OpenDecoratorDescriptor) -> Option<Finding> {
        if open.decorator_arity != open.target_arity {
            return Some(Finding::new(
                DiagnosticCode::DecoratorArityMismatch,
                &[
                    open.decorator.as_str(),
                    &open.decorator_arity.to_string(),
                    open.target.as_str(),
                    &open.target_arity.to_string(),
                ],
                open.location.clone(),
            ));
        }

        let implements = catalog
            .symbol(&open.decorator)
            .map(|s| {
                s.contracts
                    .iter()
                    .any(|c| c.open == open.target && c.arity() == open.target_arity)
            })
            .unwrap_or(false);
        if !implements {
            return Some(Finding::new(
                DiagnosticCode::DecoratorMissingContract,
                &[
                    open.decorator.as_str(),
                    &format!("{}<{}>", open.target, vec!["_"; open.target_arity].join(", ")),
                ],
                open.location.clone(),
            ));
        }
        None
    }

    /// One registration per distinct closed instantiation of the target among
    /// the registered injectables. Zero instantiations expand to zero
    /// registrations, deliberately without a finding.
    fn expand_open(
        catalog: &SymbolCatalog,
        open: &OpenDecoratorDescriptor,
        registrations: &mut Vec<DecoratorRegistration>,
    ) {
        let mut seen: FxHashSet<String> = FxHashSet::default();
        for descriptor in &catalog.injectables {
            for closed in descriptor.instantiations_of(&open.target, open.target_arity) {
                if !seen.insert(closed.display()) {
                    continue;
                }
                registrations.push(DecoratorRegistration {
                    contract: closed.clone(),
                    decorator: open.decorator.clone(),
                    decorator_display: Self::closed_decorator_name(open, closed),
                    order: open.order,
                    location: open.location.clone(),
                });
            }
        }
    }

    /// `LoggingDecorator` applied to `IHandler<Order>` reads
    /// `LoggingDecorator<Order>`.
    fn closed_decorator_name(open: &OpenDecoratorDescriptor, closed: &ContractRef) -> String {
        if closed.args.is_empty() {
            open.decorator.to_string()
        } else {
            format!("{}<{}>", open.decorator, closed.args.join(", "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::catalog::SymbolCatalogBuilder;
    use crate::features::contracts::InterfaceResolver;
    use crate::shared::models::{CompilationUnit, Marker, TypeId, TypeSymbol};

    fn expand(types: Vec<TypeSymbol>) -> (Vec<DecoratorRegistration>, Vec<Finding>) {
        let unit = CompilationUnit {
            module: "app".to_string(),
            types,
        };
        let mut catalog = SymbolCatalogBuilder::build(&unit, &CancelToken::new()).unwrap();
        InterfaceResolver::resolve(&mut catalog, &CancelToken::new()).unwrap();
        DecoratorExpander::expand(&catalog, &CancelToken::new()).unwrap()
    }

    fn open_decorator(name: &str, order: i32) -> TypeSymbol {
        TypeSymbol::new(name)
            .with_generic_params(&["T"])
            .with_contract(ContractRef::generic("app.IHandler", &["T"]))
            .with_marker(Marker::DecorateOpen {
                target: TypeId::new("app.IHandler"),
                arity: 1,
                order,
            })
    }

    fn handler(name: &str, arg: &str) -> TypeSymbol {
        TypeSymbol::new(name).with_contract(ContractRef::generic("app.IHandler", &[arg]))
    }

    #[test]
    fn test_one_registration_per_distinct_instantiation() {
        let (regs, findings) = expand(vec![
            open_decorator("app.LoggingDecorator", 1),
            handler("app.OrderHandler", "app.Order"),
            handler("app.RefundHandler", "app.Refund"),
            // second implementation of an already-seen instantiation
            handler("app.BackupOrderHandler", "app.Order"),
        ]);

        assert!(findings.is_empty());
        assert_eq!(regs.len(), 2);
        let contracts: Vec<String> = regs.iter().map(|r| r.contract.display()).collect();
        assert_eq!(contracts, vec!["app.IHandler<app.Order>", "app.IHandler<app.Refund>"]);
        assert_eq!(regs[0].decorator_display, "app.LoggingDecorator<app.Order>");
    }

    #[test]
    fn test_zero_instantiations_zero_registrations_no_finding() {
        let (regs, findings) = expand(vec![open_decorator("app.LoggingDecorator", 1)]);
        assert!(regs.is_empty());
        assert!(findings.is_empty());
    }

    #[test]
    fn test_arity_mismatch_is_blocking() {
        let decorator = TypeSymbol::new("app.PairDecorator")
            .with_generic_params(&["A", "B"])
            .with_marker(Marker::DecorateOpen {
                target: TypeId::new("app.IHandler"),
                arity: 1,
                order: 1,
            });
        let (regs, findings) = expand(vec![decorator, handler("app.OrderHandler", "app.Order")]);

        assert!(regs.is_empty());
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].code, DiagnosticCode::DecoratorArityMismatch);
        assert!(findings[0].is_blocking());
    }

    #[test]
    fn test_decorator_must_implement_target() {
        let decorator = TypeSymbol::new("app.BogusDecorator")
            .with_generic_params(&["T"])
            // implements nothing
            .with_marker(Marker::DecorateOpen {
                target: TypeId::new("app.IHandler"),
                arity: 1,
                order: 1,
            });
        let (regs, findings) = expand(vec![decorator, handler("app.OrderHandler", "app.Order")]);

        assert!(regs.is_empty());
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].code, DiagnosticCode::DecoratorMissingContract);
    }

    #[test]
    fn test_equal_order_ties_break_by_name() {
        let (regs, _) = expand(vec![
            open_decorator("app.ZDecorator", 1),
            open_decorator("app.ADecorator", 1),
            handler("app.OrderHandler", "app.Order"),
        ]);

        let names: Vec<&str> = regs.iter().map(|r| r.decorator.as_str()).collect();
        assert_eq!(names, vec!["app.ADecorator", "app.ZDecorator"]);
    }

    #[test]
    fn test_orders_sort_ascending_within_contract() {
        let (regs, _) = expand(vec![
            open_decorator("app.MetricsDecorator", 2),
            open_decorator("app.LoggingDecorator", 1),
            handler("app.OrderHandler", "app.Order"),
        ]);

        let names: Vec<&str> = regs.iter().map(|r| r.decorator.as_str()).collect();
        assert_eq!(names, vec!["app.LoggingDecorator", "app.MetricsDecorator"]);
        assert!(regs[0].order < regs[1].order);
    }

    #[test]
    fn test_closed_decorator_validated_and_passed_through() {
        let target = ContractRef::generic("app.IHandler", &["app.Order"]);
        let decorator = TypeSymbol::new("app.AuditDecorator")
            .with_contract(target.clone())
            .with_marker(Marker::DecorateClosed { target });
        let (regs, findings) = expand(vec![decorator, handler("app.OrderHandler", "app.Order")]);

        assert!(findings.is_empty());
        assert_eq!(regs.len(), 1);
        assert_eq!(regs[0].decorator_display, "app.AuditDecorator");
        assert_eq!(regs[0].order, 0);
    }

    #[test]
    fn test_closed_decorator_missing_contract_reports() {
        let decorator = TypeSymbol::new("app.AuditDecorator").with_marker(Marker::DecorateClosed {
            target: ContractRef::generic("app.IHandler", &["app.Order"]),
        });
        let (regs, findings) = expand(vec![decorator]);

        assert!(regs.is_empty());
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].code, DiagnosticCode::DecoratorMissingContract);
    }
}
