//! HTTP provider for the batched `/complex` endpoint.

pub mod provider;

pub use provider::ComplexDataProvider;
