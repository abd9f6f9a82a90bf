//! Registration pass orchestration
//!
//! One `Planner` drives the stage slices over a compilation unit:
//! catalog -> contracts -> lifetimes -> decorators -> options -> analyzers
//! -> emission. A pass is a pure function of the unit and configuration.
//! Cancellation is observed between descriptors at every stage, never inside
//! one.

use tracing::debug;

use crate::config::PlannerConfig;
use crate::errors::{PlanError, Result};
use crate::features::analyzers::DiagnosticAnalyzers;
use crate::features::catalog::SymbolCatalogBuilder;
use crate::features::contracts::InterfaceResolver;
use crate::features::decorators::DecoratorExpander;
use crate::features::emission::RegistryEmitter;
use crate::features::lifetimes::{LifetimeInference, LifetimeResolver, NoInference};
use crate::features::options::OptionsBindingPlanner;
use crate::shared::cancel::CancelToken;
use crate::shared::models::{CompilationUnit, Finding, RegistrationPlan, Severity};

use super::result::{PlanOutcome, PlanStats};

pub struct Planner {
    config: PlannerConfig,
    inference: Box<dyn LifetimeInference>,
}

impl Default for Planner {
    fn default() -> Self {
        Self::new(PlannerConfig::default())
    }
}

impl Planner {
    pub fn new(config: PlannerConfig) -> Self {
        Self {
            config,
            inference: Box::new(NoInference),
        }
    }

    /// Replace the lifetime inference strategy consulted between explicit
    /// markers and the Singleton default.
    pub fn with_inference(mut self, inference: Box<dyn LifetimeInference>) -> Self {
        self.inference = inference;
        self
    }

    /// Run one full pass over a compilation unit.
    pub fn plan(&self, unit: &CompilationUnit) -> Result<PlanOutcome> {
        self.plan_with_cancel(unit, &CancelToken::new())
    }

    pub fn plan_with_cancel(
        &self,
        unit: &CompilationUnit,
        cancel: &CancelToken,
    ) -> Result<PlanOutcome> {
        debug!(module = %unit.module, types = unit.types.len(), "registration pass started");

        let mut catalog = SymbolCatalogBuilder::build(unit, cancel)?;
        let mut findings = std::mem::take(&mut catalog.findings);

        findings.extend(InterfaceResolver::resolve(&mut catalog, cancel)?);
        LifetimeResolver::resolve(&mut catalog, self.inference.as_ref(), cancel)?;

        let (decorators, expansion_findings) = DecoratorExpander::expand(&catalog, cancel)?;
        findings.extend(expansion_findings);

        let (options, options_findings) = OptionsBindingPlanner::plan(&catalog, cancel)?;
        findings.extend(options_findings);

        findings.extend(DiagnosticAnalyzers::run(
            &catalog.injectables,
            &self.config.analyzers,
            cancel,
        )?);

        let plan = RegistrationPlan {
            module: catalog.module,
            injectables: catalog.injectables,
            plugins: catalog.plugins,
            decorators,
            options,
        };

        let refused: Vec<Finding> = findings.iter().filter(|f| self.refuses(f)).cloned().collect();
        if !refused.is_empty() {
            debug!(
                module = %plan.module,
                refused = refused.len(),
                "artifact generation refused"
            );
            return Err(PlanError::BlockedByFindings {
                blocking: refused.len(),
                findings: refused,
            });
        }

        let artifacts = RegistryEmitter::emit(&plan, &self.config.emit)?;
        let stats = PlanStats::tally(&plan, &findings);
        debug!(
            module = %plan.module,
            injectables = stats.injectables,
            plugins = stats.plugins,
            decorators = stats.decorators,
            options = stats.options,
            findings = findings.len(),
            "registration pass finished"
        );
        Ok(PlanOutcome {
            plan,
            findings,
            artifacts,
            stats,
        })
    }

    /// Plan several units, one independent pass per unit. Outcomes come back
    /// in input order; the first failing pass fails the batch.
    pub fn plan_many(&self, units: &[CompilationUnit]) -> Result<Vec<PlanOutcome>> {
        self.plan_many_with_cancel(units, &CancelToken::new())
    }

    #[cfg(feature = "parallel")]
    pub fn plan_many_with_cancel(
        &self,
        units: &[CompilationUnit],
        cancel: &CancelToken,
    ) -> Result<Vec<PlanOutcome>> {
        use rayon::prelude::*;
        units
            .par_iter()
            .map(|unit| self.plan_with_cancel(unit, cancel))
            .collect()
    }

    #[cfg(not(feature = "parallel"))]
    pub fn plan_many_with_cancel(
        &self,
        units: &[CompilationUnit],
        cancel: &CancelToken,
    ) -> Result<Vec<PlanOutcome>> {
        units
            .iter()
            .map(|unit| self.plan_with_cancel(unit, cancel))
            .collect()
    }

    fn refuses(&self, finding: &Finding) -> bool {
        finding.is_blocking()
            || (self.config.warnings_as_errors && finding.severity() == Severity::Warning)
    }
}
