//! Analysis configuration
//!
//! Two levels:
//! - Preset: one-liner defaults (`AnalysisConfig::preset(Preset::Fast)`)
//! - Overrides: builder setters or a versioned YAML file on top of a preset
//!
//! ```rust,ignore
//! use leakscope_core::config::{AnalysisConfig, Preset};
//!
//! let config = AnalysisConfig::preset(Preset::Balanced)
//!     .compute_native_sizes(true)
//!     .validated()?;
//!
//! let config = AnalysisConfig::from_yaml_file("leakscope.yaml")?;
//! ```

pub mod analysis_config;
pub mod error;
pub mod io;
pub mod preset;

pub use analysis_config::{AnalysisConfig, MatcherSet};
pub use error::{ConfigError, ConfigResult};
pub use io::{ConfigFileV1, ConfigOverrides};
pub use preset::Preset;
