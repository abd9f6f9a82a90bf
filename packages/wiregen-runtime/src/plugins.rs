//! Plugin discovery
//!
//! Filters the combined plugin population by role contract, candidate module
//! and declared tag, then instantiates matches through their emitted
//! construct paths. The tag probe walks each candidate's tag list at query
//! time; discovery runs once at startup, not during steady-state resolution.

use crate::bootstrap;
use crate::errors::Result;
use crate::fallback::FallbackPolicy;
use crate::records::{PluginRecord, ServiceResolver, SharedInstance};

/// Selection criteria for one discovery query. Unset dimensions match
/// everything.
#[derive(Debug, Clone, Default)]
pub struct PluginQuery {
    pub role: Option<String>,
    pub modules: Vec<String>,
    pub tag: Option<String>,
}

impl PluginQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    pub fn with_module(mut self, module: impl Into<String>) -> Self {
        self.modules.push(module.into());
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    fn matches(&self, record: &PluginRecord) -> bool {
        let role_ok = self.role.as_deref().map_or(true, |role| record.serves(role));
        let module_ok = self.modules.is_empty() || self.modules.iter().any(|m| m == record.module);
        let tag_ok = self.tag.as_deref().map_or(true, |tag| record.has_tag(tag));
        role_ok && module_ok && tag_ok
    }
}

/// Queryable view over plugin records.
pub struct PluginCatalog {
    plugins: Vec<PluginRecord>,
}

impl PluginCatalog {
    /// Catalog over an explicit record set. Never engages a fallback.
    pub fn new(plugins: Vec<PluginRecord>) -> Self {
        Self { plugins }
    }

    /// Catalog over the bootstrap's combined view.
    pub fn from_bootstrap() -> Self {
        Self::new(bootstrap::combined().plugins)
    }

    /// Like [`from_bootstrap`](Self::from_bootstrap), but consults `fallback`
    /// when the bootstrap holds no contributions at all.
    pub fn from_bootstrap_with(fallback: FallbackPolicy) -> Result<Self> {
        let view = bootstrap::combined();
        if view.is_empty() {
            fallback.engage("plugin catalog")?;
        }
        Ok(Self::new(view.plugins))
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    /// All records serving `role`.
    pub fn for_role(&self, role: &str) -> Vec<&PluginRecord> {
        self.plugins.iter().filter(|p| p.serves(role)).collect()
    }

    pub fn select(&self, query: &PluginQuery) -> Vec<&PluginRecord> {
        self.plugins.iter().filter(|p| query.matches(p)).collect()
    }

    /// Instantiate every match through its construct path.
    pub fn instantiate(
        &self,
        query: &PluginQuery,
        resolver: &dyn ServiceResolver,
    ) -> Vec<SharedInstance> {
        self.select(query)
            .into_iter()
            .filter_map(|p| p.instantiate(resolver))
            .collect()
    }
}
