//! Shared models and utilities

pub mod cancel;
pub mod models;

