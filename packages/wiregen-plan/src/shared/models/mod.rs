//! Shared models
//!
//! Value types shared by every pipeline stage: the input symbol model,
//! the descriptor model produced by a pass, and diagnostic findings.

mod descriptor;
mod diagnostic;
mod marker;
mod options;
mod plan;
mod symbol;

pub use descriptor::{
    DecoratorRegistration, InjectableDescriptor, OpenDecoratorDescriptor, PluginDescriptor,
    Provisions,
};
pub use diagnostic::{has_blocking, DiagnosticCode, Finding, Severity};
pub use marker::{FactoryMode, Lifetime, Marker};
pub use options::{BindingStrategy, MemberBinding, MemberRule, OptionsDescriptor, ValidationRule};
pub use plan::RegistrationPlan;
pub use symbol::{
    CompilationUnit, Constructor, ConstructorParam, ContractRef, ParamKind, PropertySymbol,
    ScalarKind, SourceLocation, TypeId, TypeSymbol,
};
