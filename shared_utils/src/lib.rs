//! Configuration and environment helpers shared by the chart crates.

pub mod config;
pub mod env;
