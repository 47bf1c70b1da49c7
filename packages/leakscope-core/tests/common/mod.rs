//! Common test utilities for leakscope-core
//!
//! Shared heap builders, ready-made scenario graphs and assertions for the
//! integration tests.

#![allow(dead_code)]

mod assertions;
mod builders;
mod fixtures;

pub use assertions::*;
pub use builders::*;
pub use fixtures::*;
