//! Type registrar
//!
//! Applies the bootstrap's type records to an external container through the
//! `ServiceSink` seam. Only records from the candidate modules register;
//! unresolved-lifetime records route through an injected `TypeFilter` when
//! one is provided and are skipped otherwise. Decorator wiring follows the
//! records: a decorator registers only when its contract is carried by a
//! record that registered in this application.

use rustc_hash::FxHashSet;
use tracing::debug;

use crate::bootstrap::{self, CombinedView};
use crate::errors::Result;
use crate::fallback::FallbackPolicy;
use crate::filter::TypeFilter;
use crate::records::{DecoratorRecord, ServiceLifetime, TypeRecord};

/// Registration seam of the external container.
pub trait ServiceSink {
    fn register(&mut self, lifetime: ServiceLifetime, record: &TypeRecord);

    /// Records the planner left without a lifetime. The default ignores
    /// them; containers with their own construction path can accept them.
    fn register_unresolved(&mut self, record: &TypeRecord) {
        let _ = record;
    }

    fn register_decorator(&mut self, record: &DecoratorRecord);
}

/// Counters for one `apply` run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistrationSummary {
    pub registered: usize,
    /// Unresolved-lifetime records admitted by the injected filter.
    pub unresolved: usize,
    pub skipped: usize,
    pub decorators: usize,
}

pub struct TypeRegistrar {
    modules: Vec<String>,
    fallback: FallbackPolicy,
    unresolved: Option<TypeFilter>,
    explicit: Option<CombinedView>,
}

impl Default for TypeRegistrar {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeRegistrar {
    /// Registrar over every module in the bootstrap.
    pub fn new() -> Self {
        Self {
            modules: Vec::new(),
            fallback: FallbackPolicy::default(),
            unresolved: None,
            explicit: None,
        }
    }

    /// Registrar restricted to the named candidate modules.
    pub fn for_modules<I, S>(modules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            modules: modules.into_iter().map(Into::into).collect(),
            ..Self::new()
        }
    }

    pub fn with_fallback(mut self, fallback: FallbackPolicy) -> Self {
        self.fallback = fallback;
        self
    }

    /// Inject the filter deciding unresolved-lifetime records.
    pub fn with_unresolved_filter(mut self, filter: TypeFilter) -> Self {
        self.unresolved = Some(filter);
        self
    }

    /// Register from an explicit view instead of the bootstrap. An
    /// explicitly configured registrar never engages the fallback policy.
    pub fn with_view(mut self, view: CombinedView) -> Self {
        self.explicit = Some(view);
        self
    }

    /// Apply candidate records to the sink.
    pub fn apply(&self, sink: &mut dyn ServiceSink) -> Result<RegistrationSummary> {
        let view = match &self.explicit {
            Some(view) => view.clone(),
            None => {
                let view = bootstrap::combined();
                if view.is_empty() {
                    self.fallback.engage("type registrar")?;
                    return Ok(RegistrationSummary::default());
                }
                view
            }
        };

        let mut summary = RegistrationSummary::default();
        let mut registered_contracts: FxHashSet<&str> = FxHashSet::default();

        for record in &view.types {
            if !self.candidate(record.module) {
                summary.skipped += 1;
                continue;
            }
            match record.lifetime {
                Some(lifetime) => {
                    sink.register(lifetime, record);
                    registered_contracts.extend(record.identities());
                    summary.registered += 1;
                }
                None => match &self.unresolved {
                    Some(filter) if filter.admits(record) => {
                        sink.register_unresolved(record);
                        registered_contracts.extend(record.identities());
                        summary.unresolved += 1;
                    }
                    _ => summary.skipped += 1,
                },
            }
        }

        for record in &view.decorators {
            if registered_contracts.contains(record.contract) {
                sink.register_decorator(record);
                summary.decorators += 1;
            }
        }

        debug!(
            registered = summary.registered,
            unresolved = summary.unresolved,
            skipped = summary.skipped,
            decorators = summary.decorators,
            "type registration applied"
        );
        Ok(summary)
    }

    fn candidate(&self, module: &str) -> bool {
        self.modules.is_empty() || self.modules.iter().any(|m| m == module)
    }
}
