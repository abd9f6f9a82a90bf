//! Resolved plan for one compilation unit

use serde::{Deserialize, Serialize};

use super::descriptor::{DecoratorRegistration, InjectableDescriptor, PluginDescriptor};
use super::options::OptionsDescriptor;
use super::symbol::TypeId;

/// Everything one pass resolved, ready for emission. All populations are
/// sorted (types by id, decorators by contract then application order), so
/// rendering the plan twice yields identical text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegistrationPlan {
    pub module: String,
    pub injectables: Vec<InjectableDescriptor>,
    pub plugins: Vec<PluginDescriptor>,
    pub decorators: Vec<DecoratorRegistration>,
    pub options: Vec<OptionsDescriptor>,
}

impl RegistrationPlan {
    pub fn new(module: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            ..Self::default()
        }
    }

    /// Decorator registrations applied to one closed contract, in
    /// application order.
    pub fn decorators_for(&self, contract_display: &str) -> Vec<&DecoratorRegistration> {
        self.decorators
            .iter()
            .filter(|d| d.contract.display() == contract_display)
            .collect()
    }

    pub fn has_options_for(&self, id: &TypeId) -> bool {
        self.options.iter().any(|o| &o.target == id)
    }

    pub fn is_empty(&self) -> bool {
        self.injectables.is_empty()
            && self.plugins.is_empty()
            && self.decorators.is_empty()
            && self.options.is_empty()
    }
}
