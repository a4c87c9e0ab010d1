//! Core domain types and logic.

pub mod table;
pub mod normalize;
pub mod selection;
pub mod chart;
pub mod fetch;
pub mod cache;
pub mod dashboard;
pub mod config_validation;
pub mod error;
