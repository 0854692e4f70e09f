//! Pure transforms applied once a batch response has arrived.

pub mod binding;
pub mod layout;
pub mod normalizer;
pub mod timestamp;
pub mod windowing;
