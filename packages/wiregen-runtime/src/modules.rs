//! Module enumeration
//!
//! Hosts that stage registration per module (feature toggles, ordered
//! startup) enumerate contributions here instead of walking the bootstrap
//! themselves. Identity conflicts are already settled first-wins in the
//! combined view; this module only decides the module sequence.

use std::cmp::Ordering;

use crate::bootstrap;
use crate::records::{PluginRecord, TypeRecord};

type ModuleOrdering = Box<dyn Fn(&str, &str) -> Ordering + Send + Sync>;

/// Enumerates contributing modules and their records in a stable sequence.
///
/// Without an ordering hook the sequence is contribution order: link-time
/// contributions first, then dynamic registrations.
#[derive(Default)]
pub struct ModuleProvider {
    ordering: Option<ModuleOrdering>,
}

impl ModuleProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sort module names with a host comparator.
    pub fn with_ordering(
        mut self,
        ordering: impl Fn(&str, &str) -> Ordering + Send + Sync + 'static,
    ) -> Self {
        self.ordering = Some(Box::new(ordering));
        self
    }

    /// Contributing module names in provider order.
    pub fn modules(&self) -> Vec<&'static str> {
        self.order(bootstrap::combined().modules)
    }

    /// All type records, grouped by module in provider order.
    pub fn type_records(&self) -> Vec<TypeRecord> {
        let view = bootstrap::combined();
        let mut records = Vec::with_capacity(view.types.len());
        for module in self.order(view.modules.clone()) {
            records.extend(view.types.iter().filter(|r| r.module == module).cloned());
        }
        records
    }

    /// All plugin records, grouped by module in provider order.
    pub fn plugin_records(&self) -> Vec<PluginRecord> {
        let view = bootstrap::combined();
        let mut records = Vec::with_capacity(view.plugins.len());
        for module in self.order(view.modules.clone()) {
            records.extend(view.plugins.iter().filter(|r| r.module == module).cloned());
        }
        records
    }

    fn order(&self, mut modules: Vec<&'static str>) -> Vec<&'static str> {
        if let Some(ordering) = &self.ordering {
            modules.sort_by(|a, b| ordering(a, b));
        }
        modules
    }
}
