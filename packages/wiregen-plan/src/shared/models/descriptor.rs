//! Descriptor model produced by a registration pass
//!
//! Descriptors are the validated, resolved output the emitter renders from.
//! They are plain values: once a pass completes, nothing mutates them.

use serde::{Deserialize, Serialize};

use super::marker::{FactoryMode, Lifetime};
use super::symbol::{ConstructorParam, ContractRef, SourceLocation, TypeId};

/// Extra contract lists a type contributes beyond the contracts it implements.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Provisions {
    /// Registered as entries of a contract collection.
    pub collection: Vec<ContractRef>,
    /// Registered as on-demand factories for the contract.
    pub factory: Vec<ContractRef>,
}

impl Provisions {
    pub fn is_empty(&self) -> bool {
        self.collection.is_empty() && self.factory.is_empty()
    }
}

/// A concrete type eligible for registration, fully resolved.
///
/// Invariants held by construction: at most one descriptor per type id in a
/// pass, and a decorator's `contracts` never include the contract it
/// decorates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InjectableDescriptor {
    pub type_id: TypeId,
    /// Contracts the type registers under, in deterministic order.
    pub contracts: Vec<ContractRef>,
    /// `None` means unresolved: cataloged, but left to runtime fallback.
    pub lifetime: Option<Lifetime>,
    /// Explicit construction path when declared; otherwise the emitter derives
    /// one from the registration constructor.
    pub factory: Option<String>,
    pub tags: Vec<String>,
    pub provisions: Provisions,
    pub factory_mode: Option<FactoryMode>,
    /// A construction path exists: an explicit factory or a resolvable
    /// constructor. Without one the emitter renders metadata only.
    pub constructible: bool,
    /// Implements a host disposal contract; feeds captive-dependency analysis.
    pub is_disposable: bool,
    /// Parameters of the registration constructor; the service graph's edges.
    pub dependencies: Vec<ConstructorParam>,
    pub location: SourceLocation,
}

impl InjectableDescriptor {
    pub fn new(type_id: impl Into<TypeId>) -> Self {
        Self {
            type_id: type_id.into(),
            contracts: Vec::new(),
            lifetime: None,
            factory: None,
            tags: Vec::new(),
            provisions: Provisions::default(),
            factory_mode: None,
            constructible: false,
            is_disposable: false,
            dependencies: Vec::new(),
            location: SourceLocation::unknown(),
        }
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Closed instantiations of `open` among this type's contracts.
    pub fn instantiations_of(&self, open: &TypeId, arity: usize) -> Vec<&ContractRef> {
        self.contracts
            .iter()
            .filter(|c| &c.open == open && c.arity() == arity)
            .collect()
    }
}

/// A plugin implementation grouped under a role contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginDescriptor {
    pub type_id: TypeId,
    /// Role contracts this plugin serves.
    pub roles: Vec<ContractRef>,
    pub factory: Option<String>,
    pub tags: Vec<String>,
    pub location: SourceLocation,
}

impl PluginDescriptor {
    pub fn new(type_id: impl Into<TypeId>) -> Self {
        Self {
            type_id: type_id.into(),
            roles: Vec::new(),
            factory: None,
            tags: Vec::new(),
            location: SourceLocation::unknown(),
        }
    }

    pub fn serves(&self, role: &ContractRef) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

/// An open-generic decorator declaration, before expansion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenDecoratorDescriptor {
    pub decorator: TypeId,
    pub decorator_arity: usize,
    /// Open identity of the decorated contract.
    pub target: TypeId,
    pub target_arity: usize,
    /// Ascending application order; lower sits closer to the implementation.
    pub order: i32,
    pub location: SourceLocation,
}

/// One expanded decorator registration for a closed contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecoratorRegistration {
    /// The closed contract being decorated.
    pub contract: ContractRef,
    /// Open identity of the decorator type.
    pub decorator: TypeId,
    /// Closed rendering of the decorator (`LoggingDecorator<Order>`).
    pub decorator_display: String,
    pub order: i32,
    pub location: SourceLocation,
}

impl DecoratorRegistration {
    /// Sort key for deterministic wrapping: ascending order, then decorator
    /// name. Lower order wraps first and therefore sits closest to the
    /// decorated implementation.
    pub fn sort_key(&self) -> (i32, &str) {
        (self.order, self.decorator_display.as_str())
    }
}
