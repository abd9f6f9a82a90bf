//! Lifetime mismatch and captive disposable detection
//!
//! Scans every dependency edge where the consumer's lifetime outranks the
//! dependency's. Deferred and factory edges participate: the wrapper is
//! captured at construction and pins whatever it later resolves. Transient
//! consumers never outrank anything, so they fall out of the comparison.
//!
//! A shorter-lived disposable dependency upgrades the finding from a
//! warning to an error: the consumer keeps using an instance the host has
//! already disposed.

use rustc_hash::FxHashSet;

use crate::errors::{PlanError, Result};
use crate::shared::cancel::CancelToken;
use crate::shared::models::{DiagnosticCode, Finding, TypeId};

use super::graph::ServiceGraph;

pub struct LifetimeMismatchAnalyzer;

impl LifetimeMismatchAnalyzer {
    /// `check_mismatch` gates WG005 warnings, `check_captive` gates WG006
    /// errors. A disposable dependency reports as WG006 when captive
    /// checking is on, and degrades to WG005 otherwise.
    pub fn analyze(
        graph: &ServiceGraph,
        check_mismatch: bool,
        check_captive: bool,
        cancel: &CancelToken,
    ) -> Result<Vec<Finding>> {
        let mut findings = Vec::new();
        let mut seen: FxHashSet<(TypeId, TypeId)> = FxHashSet::default();

        for (completed, consumer) in graph.nodes().into_iter().enumerate() {
            if cancel.is_cancelled() {
                return Err(PlanError::Cancelled { completed });
            }
            let Some(consumer_facts) = graph.facts(&consumer) else {
                continue;
            };
            let Some(consumer_lifetime) = consumer_facts.lifetime else {
                continue;
            };

            for (dependency, _) in graph.edges_of(&consumer) {
                let Some(dep_facts) = graph.facts(&dependency) else {
                    continue;
                };
                let Some(dep_lifetime) = dep_facts.lifetime else {
                    continue;
                };
                if consumer_lifetime.rank() <= dep_lifetime.rank() {
                    continue;
                }
                if !seen.insert((consumer.clone(), dependency.clone())) {
                    continue;
                }

                let args = [
                    consumer_lifetime.as_str(),
                    consumer.as_str(),
                    dep_lifetime.as_str(),
                    dependency.as_str(),
                ];
                if dep_facts.is_disposable && check_captive {
                    findings.push(Finding::new(
                        DiagnosticCode::CaptiveDisposable,
                        &args,
                        consumer_facts.location.clone(),
                    ));
                } else if check_mismatch {
                    findings.push(Finding::new(
                        DiagnosticCode::LifetimeMismatch,
                        &args,
                        consumer_facts.location.clone(),
                    ));
                }
            }
        }
        Ok(findings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::models::{
        ConstructorParam, ContractRef, InjectableDescriptor, Lifetime, ParamKind,
    };

    fn service(id: &str, lifetime: Lifetime, contract: Option<&str>) -> InjectableDescriptor {
        let mut d = InjectableDescriptor::new(id);
        if let Some(c) = contract {
            d.contracts = vec![ContractRef::new(c)];
        }
        d.lifetime = Some(lifetime);
        d
    }

    fn depends_on(mut d: InjectableDescriptor, contract: &str) -> InjectableDescriptor {
        d.dependencies
            .push(ConstructorParam::service("dep", ContractRef::new(contract)));
        d
    }

    fn analyze(injectables: &[InjectableDescriptor]) -> Vec<Finding> {
        let graph = ServiceGraph::build(injectables);
        LifetimeMismatchAnalyzer::analyze(&graph, true, true, &CancelToken::new())
            .unwrap_or_else(|e| panic!("analysis failed: {e}"))
    }

    #[test]
    fn test_singleton_over_scoped_warns() {
        let findings = analyze(&[
            depends_on(service("app.Api", Lifetime::Singleton, None), "app.ISession"),
            service("app.Session", Lifetime::Scoped, Some("app.ISession")),
        ]);

        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].code, DiagnosticCode::LifetimeMismatch);
        assert_eq!(
            findings[0].message,
            "singleton 'app.Api' depends on scoped 'app.Session'"
        );
    }

    #[test]
    fn test_matching_lifetimes_are_clean() {
        let findings = analyze(&[
            depends_on(service("app.Api", Lifetime::Scoped, None), "app.ISession"),
            service("app.Session", Lifetime::Scoped, Some("app.ISession")),
        ]);
        assert!(findings.is_empty());
    }

    #[test]
    fn test_transient_consumer_is_exempt() {
        let findings = analyze(&[
            depends_on(service("app.Widget", Lifetime::Transient, None), "app.ISession"),
            service("app.Session", Lifetime::Scoped, Some("app.ISession")),
        ]);
        assert!(findings.is_empty());
    }

    #[test]
    fn test_disposable_dependency_is_an_error() {
        let mut session = service("app.Session", Lifetime::Scoped, Some("app.ISession"));
        session.is_disposable = true;
        let findings = analyze(&[
            depends_on(service("app.Api", Lifetime::Singleton, None), "app.ISession"),
            session,
        ]);

        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].code, DiagnosticCode::CaptiveDisposable);
        assert!(findings[0].is_blocking());
        assert_eq!(
            findings[0].message,
            "singleton 'app.Api' captures disposable scoped 'app.Session'"
        );
    }

    #[test]
    fn test_disposable_degrades_to_warning_when_captive_disabled() {
        let mut session = service("app.Session", Lifetime::Scoped, Some("app.ISession"));
        session.is_disposable = true;
        let injectables = vec![
            depends_on(service("app.Api", Lifetime::Singleton, None), "app.ISession"),
            session,
        ];

        let graph = ServiceGraph::build(&injectables);
        let findings = LifetimeMismatchAnalyzer::analyze(&graph, true, false, &CancelToken::new())
            .unwrap_or_else(|e| panic!("analysis failed: {e}"));

        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].code, DiagnosticCode::LifetimeMismatch);
    }

    #[test]
    fn test_deferred_dependency_still_pins() {
        let mut api = service("app.Api", Lifetime::Singleton, None);
        api.dependencies = vec![ConstructorParam {
            name: "session".to_string(),
            kind: ParamKind::Deferred(ContractRef::new("app.ISession")),
        }];
        let findings = analyze(&[
            api,
            service("app.Session", Lifetime::Scoped, Some("app.ISession")),
        ]);

        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].code, DiagnosticCode::LifetimeMismatch);
    }

    #[test]
    fn test_pair_reported_once_across_contracts() {
        let mut store = service("app.Store", Lifetime::Transient, Some("app.IReader"));
        store.contracts.push(ContractRef::new("app.IWriter"));
        let api = depends_on(
            depends_on(service("app.Api", Lifetime::Singleton, None), "app.IReader"),
            "app.IWriter",
        );
        let findings = analyze(&[api, store]);

        assert_eq!(findings.len(), 1);
    }

    #[test]
    fn test_unresolved_lifetime_is_skipped() {
        let mut orphan = InjectableDescriptor::new("app.Orphan");
        orphan.contracts = vec![ContractRef::new("app.IOrphan")];
        let findings = analyze(&[
            depends_on(service("app.Api", Lifetime::Singleton, None), "app.IOrphan"),
            orphan,
        ]);
        assert!(findings.is_empty());
    }
}
