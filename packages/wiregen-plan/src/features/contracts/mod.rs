//! Contract eligibility resolution (stage 2)

mod resolver;

pub use resolver::InterfaceResolver;
