//! JSON dependency-graph export
//!
//! A machine-readable companion to the source artifact, consumed by build
//! dashboards and architecture linters. Services are listed in type-name
//! order; the only unstable field is `generatedAt`, which `EmitConfig` can
//! pin for reproducible output.

use chrono::Utc;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::shared::models::{InjectableDescriptor, PluginDescriptor, RegistrationPlan};

/// Bump when the document shape changes incompatibly.
const SCHEMA_VERSION: u32 = 1;

/// Top-level export document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphExportDocument {
    pub schema_version: u32,
    /// RFC 3339 stamp; wall clock unless pinned by configuration.
    pub generated_at: String,
    pub module_name: String,
    pub services: Vec<ServiceExport>,
    pub statistics: GraphStatistics,
}

/// One registered service or plugin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceExport {
    pub full_type_name: String,
    /// `None` when the lifetime is left to the runtime fallback.
    pub lifetime: Option<String>,
    /// Contracts consumed by the registration constructor.
    pub dependencies: Vec<String>,
    /// Decorators applied to this service's contracts, innermost first.
    pub decorators: Vec<String>,
    pub metadata: ServiceMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceMetadata {
    pub has_factory: bool,
    pub has_options: bool,
    pub is_plugin: bool,
    /// No hosted-service tracking in planning; stays `false` so downstream
    /// consumers keep a stable schema.
    pub is_hosted_service: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphStatistics {
    pub total_services: usize,
    pub singletons: usize,
    pub scoped: usize,
    pub transient: usize,
    pub decorators: usize,
    pub factories: usize,
    pub options: usize,
    pub hosted_services: usize,
    pub plugins: usize,
}

impl GraphExportDocument {
    pub fn build(plan: &RegistrationPlan, fixed_timestamp: Option<&str>) -> Self {
        let mut injectables: Vec<&InjectableDescriptor> = plan.injectables.iter().collect();
        injectables.sort_by(|a, b| a.type_id.cmp(&b.type_id));
        let mut plugins: Vec<&PluginDescriptor> = plan.plugins.iter().collect();
        plugins.sort_by(|a, b| a.type_id.cmp(&b.type_id));

        let mut services = Vec::with_capacity(injectables.len() + plugins.len());
        for descriptor in injectables {
            services.push(ServiceExport::from_injectable(descriptor, plan));
        }
        for plugin in plugins {
            services.push(ServiceExport::from_plugin(plugin));
        }

        let statistics = GraphStatistics::tally(&services, plan);
        let generated_at = match fixed_timestamp {
            Some(stamp) => stamp.to_string(),
            None => Utc::now().to_rfc3339(),
        };
        Self {
            schema_version: SCHEMA_VERSION,
            generated_at,
            module_name: plan.module.clone(),
            services,
            statistics,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl ServiceExport {
    fn from_injectable(descriptor: &InjectableDescriptor, plan: &RegistrationPlan) -> Self {
        let dependencies = descriptor
            .dependencies
            .iter()
            .filter_map(|p| p.kind.contract().map(|c| c.display()))
            .collect();

        // A decorator shared by two of the service's contracts lists once.
        let mut decorators = Vec::new();
        let mut seen = FxHashSet::default();
        for contract in &descriptor.contracts {
            let mut registrations = plan.decorators_for(&contract.display());
            registrations.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
            for registration in registrations {
                if seen.insert(registration.decorator_display.clone()) {
                    decorators.push(registration.decorator_display.clone());
                }
            }
        }

        Self {
            full_type_name: descriptor.type_id.to_string(),
            lifetime: descriptor.lifetime.map(|l| l.as_str().to_string()),
            dependencies,
            decorators,
            metadata: ServiceMetadata {
                has_factory: descriptor.factory.is_some() || descriptor.factory_mode.is_some(),
                has_options: plan.has_options_for(&descriptor.type_id),
                is_plugin: false,
                is_hosted_service: false,
            },
        }
    }

    fn from_plugin(plugin: &PluginDescriptor) -> Self {
        Self {
            full_type_name: plugin.type_id.to_string(),
            lifetime: None,
            dependencies: Vec::new(),
            decorators: Vec::new(),
            metadata: ServiceMetadata {
                has_factory: plugin.factory.is_some(),
                has_options: false,
                is_plugin: true,
                is_hosted_service: false,
            },
        }
    }
}

impl GraphStatistics {
    fn tally(services: &[ServiceExport], plan: &RegistrationPlan) -> Self {
        let by_lifetime = |name: &str| {
            services
                .iter()
                .filter(|s| s.lifetime.as_deref() == Some(name))
                .count()
        };
        Self {
            total_services: services.len(),
            singletons: by_lifetime("singleton"),
            scoped: by_lifetime("scoped"),
            transient: by_lifetime("transient"),
            decorators: plan.decorators.len(),
            factories: services.iter().filter(|s| s.metadata.has_factory).count(),
            options: plan.options.len(),
            hosted_services: 0,
            plugins: plan.plugins.len(),
        }
    }
}
