//! Shared helpers used across features

pub mod utils;
