//! Decorator expansion (stage 4)

mod expander;

pub use expander::DecoratorExpander;
