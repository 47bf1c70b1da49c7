//! Utility functions

pub mod names;
pub mod signature;

pub use names::last_segment;
pub use signature::sha256_hex;
