//! Empty collection and unregistered deferred reference advisories
//!
//! Both findings are informational: another module's registry or the
//! runtime fallback path may supply the missing registrations, so nothing
//! here blocks emission. Plain service dependencies are deliberately not
//! checked for the same reason.

use rustc_hash::FxHashSet;

use crate::errors::{PlanError, Result};
use crate::shared::cancel::CancelToken;
use crate::shared::models::{DiagnosticCode, Finding, InjectableDescriptor, ParamKind};

use super::graph::ServiceGraph;

pub struct CollectionAnalyzer;

impl CollectionAnalyzer {
    pub fn analyze(
        injectables: &[InjectableDescriptor],
        graph: &ServiceGraph,
        cancel: &CancelToken,
    ) -> Result<Vec<Finding>> {
        let mut findings = Vec::new();
        let mut seen: FxHashSet<(DiagnosticCode, String, String)> = FxHashSet::default();

        for (completed, descriptor) in injectables.iter().enumerate() {
            if cancel.is_cancelled() {
                return Err(PlanError::Cancelled { completed });
            }
            for param in &descriptor.dependencies {
                let (code, contract) = match &param.kind {
                    ParamKind::Collection(c) => (DiagnosticCode::EmptyCollection, c),
                    ParamKind::Deferred(c) | ParamKind::Factory(c) => {
                        (DiagnosticCode::DeferredUnregistered, c)
                    }
                    ParamKind::Service(_) | ParamKind::Scalar(_) => continue,
                };
                let display = contract.display();
                if !graph.implementers_of(&display).is_empty() {
                    continue;
                }
                if !seen.insert((code, descriptor.type_id.to_string(), display.clone())) {
                    continue;
                }
                findings.push(Finding::new(
                    code,
                    &[&display, descriptor.type_id.as_str()],
                    descriptor.location.clone(),
                ));
            }
        }
        Ok(findings)
    }
}
