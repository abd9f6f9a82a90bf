//! Descriptor records linked into generated registry modules
//!
//! Generated code builds these as plain values: string literals, fn pointers
//! and builder chains, nothing reflective. `ModuleContribution` is fully
//! const-constructible so a module can hand it to `inventory::submit!`.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Type-erased service instance shared across the container.
pub type SharedInstance = Arc<dyn Any + Send + Sync>;

/// Construction path of one registration.
pub type Construct = fn(&dyn ServiceResolver) -> SharedInstance;

/// Decorator application: wraps an inner instance of the same contract.
pub type Wrap = fn(SharedInstance, &dyn ServiceResolver) -> SharedInstance;

/// Resolution seam generated construction paths call into. The container
/// behind it is the host's; these are the only operations emitted code needs.
pub trait ServiceResolver {
    fn resolve(&self, contract: &str) -> SharedInstance;
    fn resolve_all(&self, contract: &str) -> Vec<SharedInstance>;

    /// Deferred-resolution parameter; the default resolves eagerly.
    fn resolve_deferred(&self, contract: &str) -> SharedInstance {
        self.resolve(contract)
    }

    /// Factory-function parameter; the default resolves eagerly.
    fn resolve_factory(&self, contract: &str) -> SharedInstance {
        self.resolve(contract)
    }
}

/// How long a resolved instance lives relative to the container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceLifetime {
    Singleton,
    Scoped,
    Transient,
}

impl ServiceLifetime {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceLifetime::Singleton => "singleton",
            ServiceLifetime::Scoped => "scoped",
            ServiceLifetime::Transient => "transient",
        }
    }
}

impl fmt::Display for ServiceLifetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One injectable registration.
///
/// `lifetime` and `construct` stay `None` on records the planner cataloged
/// without resolving; the registrar routes those through its injected filter
/// instead of registering them directly.
#[derive(Debug, Clone)]
pub struct TypeRecord {
    pub module: &'static str,
    pub type_name: &'static str,
    /// Contracts this type registers under, beyond its own identity.
    pub contracts: Vec<&'static str>,
    /// Contracts whose collections this type contributes to.
    pub collection_contracts: Vec<&'static str>,
    /// Contracts this type serves as an on-demand factory for.
    pub factory_contracts: Vec<&'static str>,
    pub lifetime: Option<ServiceLifetime>,
    pub construct: Option<Construct>,
    pub tags: Vec<&'static str>,
}

impl TypeRecord {
    pub fn new(module: &'static str, type_name: &'static str) -> Self {
        Self {
            module,
            type_name,
            contracts: Vec::new(),
            collection_contracts: Vec::new(),
            factory_contracts: Vec::new(),
            lifetime: None,
            construct: None,
            tags: Vec::new(),
        }
    }

    pub fn with_lifetime(mut self, lifetime: ServiceLifetime) -> Self {
        self.lifetime = Some(lifetime);
        self
    }

    pub fn with_contract(mut self, contract: &'static str) -> Self {
        self.contracts.push(contract);
        self
    }

    pub fn with_collection_contract(mut self, contract: &'static str) -> Self {
        self.collection_contracts.push(contract);
        self
    }

    pub fn with_factory_contract(mut self, contract: &'static str) -> Self {
        self.factory_contracts.push(contract);
        self
    }

    pub fn with_construct(mut self, construct: Construct) -> Self {
        self.construct = Some(construct);
        self
    }

    pub fn with_tag(mut self, tag: &'static str) -> Self {
        self.tags.push(tag);
        self
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| *t == tag)
    }

    /// Every identity this record registers under: its own type name first,
    /// then the resolved contracts.
    pub fn identities(&self) -> Vec<&'static str> {
        let mut identities = Vec::with_capacity(1 + self.contracts.len());
        identities.push(self.type_name);
        identities.extend(self.contracts.iter().copied());
        identities
    }
}

/// One plugin registration. The construct path is always emitted; the
/// `Option` exists only so the builder chain mirrors `TypeRecord`.
#[derive(Debug, Clone)]
pub struct PluginRecord {
    pub module: &'static str,
    pub type_name: &'static str,
    /// Role contracts this plugin serves.
    pub roles: Vec<&'static str>,
    pub tags: Vec<&'static str>,
    pub construct: Option<Construct>,
}

impl PluginRecord {
    pub fn new(module: &'static str, type_name: &'static str) -> Self {
        Self {
            module,
            type_name,
            roles: Vec::new(),
            tags: Vec::new(),
            construct: None,
        }
    }

    pub fn with_role(mut self, role: &'static str) -> Self {
        self.roles.push(role);
        self
    }

    pub fn with_tag(mut self, tag: &'static str) -> Self {
        self.tags.push(tag);
        self
    }

    pub fn with_construct(mut self, construct: Construct) -> Self {
        self.construct = Some(construct);
        self
    }

    pub fn serves(&self, role: &str) -> bool {
        self.roles.iter().any(|r| *r == role)
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| *t == tag)
    }

    pub fn instantiate(&self, resolver: &dyn ServiceResolver) -> Option<SharedInstance> {
        self.construct.map(|construct| construct(resolver))
    }
}

/// One decorator wiring entry. Lower order sits closest to the decorated
/// implementation.
#[derive(Debug, Clone)]
pub struct DecoratorRecord {
    /// Closed contract being decorated.
    pub contract: &'static str,
    /// Closed rendering of the decorator type.
    pub decorator: &'static str,
    pub order: i32,
    pub wrap: Option<Wrap>,
}

impl DecoratorRecord {
    pub fn new(contract: &'static str, decorator: &'static str, order: i32) -> Self {
        Self {
            contract,
            decorator,
            order,
            wrap: None,
        }
    }

    pub fn with_wrap(mut self, wrap: Wrap) -> Self {
        self.wrap = Some(wrap);
        self
    }
}

/// One generated module's accessor functions, as contributed to the
/// bootstrap. Const-constructible and `Copy` so a module can both submit it
/// through `inventory` and pass it to `bootstrap::register`.
#[derive(Debug, Clone, Copy)]
pub struct ModuleContribution {
    pub module: &'static str,
    pub types: fn() -> Vec<TypeRecord>,
    pub plugins: fn() -> Vec<PluginRecord>,
    pub decorators: Option<fn() -> Vec<DecoratorRecord>>,
}

impl ModuleContribution {
    pub const fn new(
        module: &'static str,
        types: fn() -> Vec<TypeRecord>,
        plugins: fn() -> Vec<PluginRecord>,
    ) -> Self {
        Self {
            module,
            types,
            plugins,
            decorators: None,
        }
    }

    pub const fn with_decorators(mut self, decorators: fn() -> Vec<DecoratorRecord>) -> Self {
        self.decorators = Some(decorators);
        self
    }

    pub fn type_records(&self) -> Vec<TypeRecord> {
        (self.types)()
    }

    pub fn plugin_records(&self) -> Vec<PluginRecord> {
        (self.plugins)()
    }

    pub fn decorator_records(&self) -> Vec<DecoratorRecord> {
        self.decorators.map(|accessor| accessor()).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_types() -> Vec<TypeRecord> {
        Vec::new()
    }

    fn no_plugins() -> Vec<PluginRecord> {
        Vec::new()
    }

    #[test]
    fn test_type_record_builder() {
        let record = TypeRecord::new("billing", "billing.OrderHandler")
            .with_lifetime(ServiceLifetime::Singleton)
            .with_contract("billing.IHandler<billing.Order>")
            .with_tag("handlers");

        assert_eq!(record.module, "billing");
        assert_eq!(record.lifetime, Some(ServiceLifetime::Singleton));
        assert!(record.has_tag("handlers"));
        assert!(!record.has_tag("other"));
        assert_eq!(
            record.identities(),
            vec!["billing.OrderHandler", "billing.IHandler<billing.Order>"]
        );
    }

    #[test]
    fn test_plugin_record_roles() {
        let record = PluginRecord::new("billing", "billing.CsvExporter")
            .with_role("billing.IExporter");

        assert!(record.serves("billing.IExporter"));
        assert!(!record.serves("billing.IImporter"));
    }

    #[test]
    fn test_contribution_is_const_constructible() {
        const CONTRIBUTION: ModuleContribution = ModuleContribution::new("billing", no_types, no_plugins);

        assert_eq!(CONTRIBUTION.module, "billing");
        assert!(CONTRIBUTION.type_records().is_empty());
        assert!(CONTRIBUTION.decorator_records().is_empty());
    }
}
