//! Feature modules (pipeline stages)
//!
//! Each slice owns one stage of a registration pass, in execution order:
//! catalog -> contracts -> lifetimes -> decorators -> options -> analyzers
//! -> emission.

pub mod analyzers;
pub mod catalog;
pub mod contracts;
pub mod decorators;
pub mod emission;
pub mod lifetimes;
pub mod options;
