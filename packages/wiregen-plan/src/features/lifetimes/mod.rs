//! Lifetime resolution (stage 3)

mod resolver;

pub use resolver::{LifetimeInference, LifetimeResolver, NoInference};
