//! Pass orchestration
//!
//! Drives the stage slices in order over one or many compilation units and
//! packages the result.

mod planner;
mod result;

pub use planner::Planner;
pub use result::{PlanOutcome, PlanStats};
