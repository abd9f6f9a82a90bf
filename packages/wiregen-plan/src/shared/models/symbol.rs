//! Input symbol model for a registration pass
//!
//! A pass consumes a `CompilationUnit`: the declarative view of every type
//! the host front end discovered, already stripped of syntax. The planner is
//! a pure function of this model; nothing here touches source text.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::marker::Marker;
use super::options::ValidationRule;

/// Fully-qualified type name, interned as a plain string.
///
/// Ordering is lexicographic on the qualified name, which is what every
/// deterministic sort in the pipeline keys on.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeId(String);

impl TypeId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Last path segment (`app.handlers.OrderHandler` -> `OrderHandler`).
    pub fn simple_name(&self) -> &str {
        self.0
            .rsplit(|c| c == '.' || c == ':')
            .next()
            .unwrap_or(&self.0)
    }
}

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TypeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for TypeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Reference to an implemented contract.
///
/// `args` holds the type arguments as display strings: concrete qualified
/// names on a concrete type, or the declaring type's own parameter names on a
/// generic definition (`IHandler<T>` on `LoggingDecorator<T>`). Non-generic
/// contracts have no args.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContractRef {
    /// Open identity of the contract (`IHandler` for `IHandler<Order>`).
    pub open: TypeId,
    pub args: Vec<String>,
}

impl ContractRef {
    pub fn new(open: impl Into<TypeId>) -> Self {
        Self {
            open: open.into(),
            args: Vec::new(),
        }
    }

    pub fn generic(open: impl Into<TypeId>, args: &[&str]) -> Self {
        Self {
            open: open.into(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    pub fn arity(&self) -> usize {
        self.args.len()
    }

    pub fn is_generic(&self) -> bool {
        !self.args.is_empty()
    }

    /// Rendered closed form: `IHandler<Order>` or bare `IClock`.
    pub fn display(&self) -> String {
        if self.args.is_empty() {
            self.open.to_string()
        } else {
            format!("{}<{}>", self.open, self.args.join(", "))
        }
    }
}

impl fmt::Display for ContractRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

/// Scalar shape of a bindable member, driving configuration coercion.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScalarKind {
    Text,
    Integer,
    Float,
    Boolean,
    /// Enum member resolved by name at bind time.
    Enum(TypeId),
    /// Anything the binder cannot coerce from a flat key.
    Other(TypeId),
}

impl ScalarKind {
    /// Whether the options binder can produce this member from a config key.
    pub fn bindable(&self) -> bool {
        !matches!(self, ScalarKind::Other(_))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ScalarKind::Text => "text",
            ScalarKind::Integer => "integer",
            ScalarKind::Float => "float",
            ScalarKind::Boolean => "boolean",
            ScalarKind::Enum(_) => "enum",
            ScalarKind::Other(_) => "other",
        }
    }
}

/// How a constructor parameter is satisfied at resolution time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParamKind {
    /// Plain contract dependency.
    Service(ContractRef),
    /// Deferred-resolution wrapper; resolved on first use, not at construction.
    Deferred(ContractRef),
    /// All registered implementations of the contract.
    Collection(ContractRef),
    /// Factory function producing the contract on demand.
    Factory(ContractRef),
    /// Non-injectable scalar (bound from configuration or defaulted).
    Scalar(ScalarKind),
}

impl ParamKind {
    /// Contract consumed by this parameter, if it is an injectable kind.
    pub fn contract(&self) -> Option<&ContractRef> {
        match self {
            ParamKind::Service(c)
            | ParamKind::Deferred(c)
            | ParamKind::Collection(c)
            | ParamKind::Factory(c) => Some(c),
            ParamKind::Scalar(_) => None,
        }
    }

    pub fn is_injectable(&self) -> bool {
        self.contract().is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConstructorParam {
    pub name: String,
    pub kind: ParamKind,
}

impl ConstructorParam {
    pub fn service(name: impl Into<String>, contract: ContractRef) -> Self {
        Self {
            name: name.into(),
            kind: ParamKind::Service(contract),
        }
    }

    pub fn scalar(name: impl Into<String>, scalar: ScalarKind) -> Self {
        Self {
            name: name.into(),
            kind: ParamKind::Scalar(scalar),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constructor {
    pub public: bool,
    pub params: Vec<ConstructorParam>,
}

impl Constructor {
    pub fn new(params: Vec<ConstructorParam>) -> Self {
        Self {
            public: true,
            params,
        }
    }

    /// A constructor the container can satisfy without configuration help:
    /// public, with every parameter an injectable kind.
    pub fn resolvable(&self) -> bool {
        self.public && self.params.iter().all(|p| p.kind.is_injectable())
    }
}

/// Settable or init-only member of a type, as seen by the options planner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertySymbol {
    pub name: String,
    pub scalar: ScalarKind,
    /// Writable after construction (a `SetProperties` candidate).
    pub assignable: bool,
    /// Carries an initializer, so an absent config key leaves it untouched.
    pub has_default: bool,
    /// Declarative validation markers attached to the member.
    pub rules: Vec<ValidationRule>,
}

impl PropertySymbol {
    pub fn new(name: impl Into<String>, scalar: ScalarKind) -> Self {
        Self {
            name: name.into(),
            scalar,
            assignable: true,
            has_default: false,
            rules: Vec::new(),
        }
    }

    pub fn init_only(mut self) -> Self {
        self.assignable = false;
        self
    }

    pub fn with_default(mut self) -> Self {
        self.has_default = true;
        self
    }

    pub fn with_rule(mut self, rule: ValidationRule) -> Self {
        self.rules.push(rule);
        self
    }
}

/// Position of a declaration in host source, carried through to findings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceLocation {
    pub file: String,
    pub line: u32,
}

impl SourceLocation {
    pub fn new(file: impl Into<String>, line: u32) -> Self {
        Self {
            file: file.into(),
            line,
        }
    }

    pub fn unknown() -> Self {
        Self::default()
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.file.is_empty() {
            f.write_str("<unknown>")
        } else {
            write!(f, "{}:{}", self.file, self.line)
        }
    }
}

/// One type declaration in the input model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeSymbol {
    pub id: TypeId,
    /// Generic parameter names when this is an open definition, empty otherwise.
    pub generic_params: Vec<String>,
    pub is_abstract: bool,
    pub is_exception: bool,
    pub is_marker_type: bool,
    pub is_synthesized: bool,
    pub is_nested_private: bool,
    /// Contracts this type implements (closed on concrete types, possibly
    /// parameter-referencing on generic definitions).
    pub contracts: Vec<ContractRef>,
    pub constructors: Vec<Constructor>,
    pub properties: Vec<PropertySymbol>,
    pub markers: Vec<Marker>,
    pub location: SourceLocation,
}

impl TypeSymbol {
    pub fn new(id: impl Into<TypeId>) -> Self {
        Self {
            id: id.into(),
            generic_params: Vec::new(),
            is_abstract: false,
            is_exception: false,
            is_marker_type: false,
            is_synthesized: false,
            is_nested_private: false,
            contracts: Vec::new(),
            constructors: Vec::new(),
            properties: Vec::new(),
            markers: Vec::new(),
            location: SourceLocation::unknown(),
        }
    }

    pub fn with_contract(mut self, contract: ContractRef) -> Self {
        self.contracts.push(contract);
        self
    }

    pub fn with_constructor(mut self, ctor: Constructor) -> Self {
        self.constructors.push(ctor);
        self
    }

    pub fn with_property(mut self, property: PropertySymbol) -> Self {
        self.properties.push(property);
        self
    }

    pub fn with_marker(mut self, marker: Marker) -> Self {
        self.markers.push(marker);
        self
    }

    pub fn with_generic_params(mut self, params: &[&str]) -> Self {
        self.generic_params = params.iter().map(|p| p.to_string()).collect();
        self
    }

    pub fn at(mut self, location: SourceLocation) -> Self {
        self.location = location;
        self
    }

    pub fn is_generic_definition(&self) -> bool {
        !self.generic_params.is_empty()
    }

    pub fn generic_arity(&self) -> usize {
        self.generic_params.len()
    }

    /// The constructor registration resolves against: the resolvable
    /// constructor with the most parameters, first declared wins on ties.
    pub fn registration_constructor(&self) -> Option<&Constructor> {
        let mut best: Option<&Constructor> = None;
        for ctor in self.constructors.iter().filter(|c| c.resolvable()) {
            match best {
                Some(current) if ctor.params.len() <= current.params.len() => {}
                _ => best = Some(ctor),
            }
        }
        best
    }

    pub fn has_resolvable_constructor(&self) -> bool {
        self.constructors.iter().any(|c| c.resolvable())
    }
}

/// Everything the front end hands a single pass: the unit's module name and
/// its visible type declarations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompilationUnit {
    pub module: String,
    pub types: Vec<TypeSymbol>,
}

impl CompilationUnit {
    pub fn new(module: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            types: Vec::new(),
        }
    }

    pub fn with_type(mut self, symbol: TypeSymbol) -> Self {
        self.types.push(symbol);
        self
    }
}
