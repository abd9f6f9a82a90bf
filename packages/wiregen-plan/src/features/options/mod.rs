//! Options binding planning (stage 5)

mod planner;

pub use planner::OptionsBindingPlanner;
