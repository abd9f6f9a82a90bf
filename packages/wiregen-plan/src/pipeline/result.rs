//! Outcome of a registration pass

use serde::{Deserialize, Serialize};

use crate::features::emission::EmittedArtifacts;
use crate::shared::models::{Finding, Lifetime, RegistrationPlan, Severity};

/// Everything one pass produced. Blocking findings never reach an outcome;
/// they surface as `PlanError::BlockedByFindings` instead, so `findings`
/// holds warnings and infos only.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanOutcome {
    pub plan: RegistrationPlan,
    pub findings: Vec<Finding>,
    pub artifacts: EmittedArtifacts,
    pub stats: PlanStats,
}

impl PlanOutcome {
    pub fn has_warnings(&self) -> bool {
        self.findings
            .iter()
            .any(|f| f.severity() == Severity::Warning)
    }
}

/// Per-pass summary counters, cheap to log and assert on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanStats {
    pub injectables: usize,
    pub singletons: usize,
    pub scoped: usize,
    pub transient: usize,
    /// Cataloged without a lifetime; registration falls to the runtime chain.
    pub unresolved: usize,
    pub plugins: usize,
    pub decorators: usize,
    pub options: usize,
    pub warnings: usize,
    pub infos: usize,
}

impl PlanStats {
    pub fn tally(plan: &RegistrationPlan, findings: &[Finding]) -> Self {
        let with_lifetime = |lifetime: Lifetime| {
            plan.injectables
                .iter()
                .filter(|d| d.lifetime == Some(lifetime))
                .count()
        };
        let with_severity = |severity: Severity| {
            findings.iter().filter(|f| f.severity() == severity).count()
        };
        Self {
            injectables: plan.injectables.len(),
            singletons: with_lifetime(Lifetime::Singleton),
            scoped: with_lifetime(Lifetime::Scoped),
            transient: with_lifetime(Lifetime::Transient),
            unresolved: plan
                .injectables
                .iter()
                .filter(|d| d.lifetime.is_none())
                .count(),
            plugins: plan.plugins.len(),
            decorators: plan.decorators.len(),
            options: plan.options.len(),
            warnings: with_severity(Severity::Warning),
            infos: with_severity(Severity::Info),
        }
    }
}
