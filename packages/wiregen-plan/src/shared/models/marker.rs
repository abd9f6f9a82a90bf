//! Declarative markers and service lifetimes
//!
//! Markers are the host-side annotations the front end already parsed off
//! each declaration. The catalog builder folds them into descriptors; nothing
//! downstream looks at markers again.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::symbol::{ContractRef, TypeId};

/// How long a resolved instance lives relative to the container.
///
/// `Singleton` instances are created once and shared for the container's
/// lifetime. `Scoped` instances are shared within one resolution scope.
/// `Transient` instances are created on every resolution and never shared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Lifetime {
    Singleton,
    Scoped,
    Transient,
}

impl Lifetime {
    /// Longevity rank used by lifetime-mismatch analysis: a consumer must not
    /// outrank its dependencies.
    pub fn rank(&self) -> u8 {
        match self {
            Lifetime::Singleton => 2,
            Lifetime::Scoped => 1,
            Lifetime::Transient => 0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Lifetime::Singleton => "singleton",
            Lifetime::Scoped => "scoped",
            Lifetime::Transient => "transient",
        }
    }
}

impl fmt::Display for Lifetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the emitter generates for a factory-marked type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FactoryMode {
    /// A factory trait plus its generated implementation.
    Interface,
    /// A standalone factory function.
    Function,
    /// Both of the above.
    Both,
}

impl FactoryMode {
    pub fn emits_interface(&self) -> bool {
        matches!(self, FactoryMode::Interface | FactoryMode::Both)
    }

    pub fn emits_function(&self) -> bool {
        matches!(self, FactoryMode::Function | FactoryMode::Both)
    }
}

/// One declarative marker as declared on a type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Marker {
    /// Explicit lifetime choice.
    Lifetime(Lifetime),
    /// Keep the type out of the catalog entirely.
    Exclude,
    /// Register under exactly this contract instead of everything implemented.
    RestrictTo(ContractRef),
    /// Bind this type from a configuration section.
    Options {
        section: String,
        name: Option<String>,
        validate_on_start: bool,
    },
    /// Decorate a closed contract with this concrete type.
    DecorateClosed { target: ContractRef },
    /// Decorate every closed instantiation of an open contract.
    DecorateOpen {
        target: TypeId,
        arity: usize,
        order: i32,
    },
    /// Additional contract lists this type provides beyond what it implements.
    Provides {
        required: Vec<ContractRef>,
        optional: Vec<ContractRef>,
        collection: Vec<ContractRef>,
        factory: Vec<ContractRef>,
    },
    /// Generate factory surfaces for this type.
    Factory(FactoryMode),
    /// Free-form tag used by runtime candidate filtering.
    Tag(String),
    /// Declare this type a plugin for the given role contract.
    Plugin { role: ContractRef },
    /// Explicit construction path, bypassing constructor selection.
    FactoryRef(String),
}

impl Marker {
    pub fn name(&self) -> &'static str {
        match self {
            Marker::Lifetime(_) => "lifetime",
            Marker::Exclude => "exclude",
            Marker::RestrictTo(_) => "restrict-to",
            Marker::Options { .. } => "options",
            Marker::DecorateClosed { .. } => "decorate",
            Marker::DecorateOpen { .. } => "decorate-open",
            Marker::Provides { .. } => "provides",
            Marker::Factory(_) => "factory",
            Marker::Tag(_) => "tag",
            Marker::Plugin { .. } => "plugin",
            Marker::FactoryRef(_) => "factory-ref",
        }
    }

    /// Markers that only make sense on a type that stays in the catalog.
    pub fn is_registration_marker(&self) -> bool {
        !matches!(self, Marker::Exclude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifetime_rank_order() {
        assert!(Lifetime::Singleton.rank() > Lifetime::Scoped.rank());
        assert!(Lifetime::Scoped.rank() > Lifetime::Transient.rank());
    }

    #[test]
    fn test_lifetime_as_str() {
        assert_eq!(Lifetime::Singleton.as_str(), "singleton");
        assert_eq!(Lifetime::Scoped.as_str(), "scoped");
        assert_eq!(Lifetime::Transient.as_str(), "transient");
    }

    #[test]
    fn test_factory_mode_surfaces() {
        assert!(FactoryMode::Both.emits_interface());
        assert!(FactoryMode::Both.emits_function());
        assert!(FactoryMode::Interface.emits_interface());
        assert!(!FactoryMode::Interface.emits_function());
        assert!(FactoryMode::Function.emits_function());
        assert!(!FactoryMode::Function.emits_interface());
    }
}
