//! Analysis configuration
//!
//! Presets fill every field; builder setters override single fields.

use serde::{Deserialize, Serialize};

use crate::features::reference_reader::{
    android_reference_matchers, jdk_reference_matchers, ReferenceMatcher,
};

use super::error::{ConfigError, ConfigResult};
use super::preset::Preset;

pub const MIN_CANCELLATION_CHECK_INTERVAL: u32 = 1;
pub const MAX_CANCELLATION_CHECK_INTERVAL: u32 = 1_000_000;

/// Built-in reference matcher tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatcherSet {
    None,
    Jdk,
    JdkAndAndroid,
}

impl MatcherSet {
    pub fn matchers(&self) -> Vec<ReferenceMatcher> {
        match self {
            Self::None => Vec::new(),
            Self::Jdk => jdk_reference_matchers(),
            Self::JdkAndAndroid => {
                let mut matchers = jdk_reference_matchers();
                matchers.extend(android_reference_matchers());
                matchers
            }
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "none" => Some(Self::None),
            "jdk" => Some(Self::Jdk),
            "jdk_and_android" => Some(Self::JdkAndAndroid),
            _ => None,
        }
    }
}

/// Settings of one analysis run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    pub preset: Preset,

    /// Build the dominator tree and report retained sizes
    pub compute_retained_heap_size: bool,

    /// Credit native allocations to their Java owners (requires retained sizes)
    pub compute_native_sizes: bool,

    pub reference_matchers: MatcherSet,

    /// Run the built-in object inspectors before the custom ones
    pub default_inspectors: bool,

    /// Dequeued objects between two cancellation polls (1..=1_000_000)
    pub cancellation_check_interval: u32,
}

impl AnalysisConfig {
    pub fn preset(preset: Preset) -> Self {
        let (retained, native, matchers) = match preset {
            Preset::Fast => (false, false, MatcherSet::Jdk),
            Preset::Balanced => (true, false, MatcherSet::JdkAndAndroid),
            Preset::Thorough => (true, true, MatcherSet::JdkAndAndroid),
        };
        Self {
            preset,
            compute_retained_heap_size: retained,
            compute_native_sizes: native,
            reference_matchers: matchers,
            default_inspectors: true,
            cancellation_check_interval: MIN_CANCELLATION_CHECK_INTERVAL,
        }
    }

    pub fn compute_retained_heap_size(mut self, enabled: bool) -> Self {
        self.compute_retained_heap_size = enabled;
        self
    }

    pub fn compute_native_sizes(mut self, enabled: bool) -> Self {
        self.compute_native_sizes = enabled;
        self
    }

    pub fn reference_matchers(mut self, matchers: MatcherSet) -> Self {
        self.reference_matchers = matchers;
        self
    }

    pub fn default_inspectors(mut self, enabled: bool) -> Self {
        self.default_inspectors = enabled;
        self
    }

    pub fn cancellation_check_interval(mut self, interval: u32) -> Self {
        self.cancellation_check_interval = interval;
        self
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if !(MIN_CANCELLATION_CHECK_INTERVAL..=MAX_CANCELLATION_CHECK_INTERVAL)
            .contains(&self.cancellation_check_interval)
        {
            return Err(ConfigError::range_with_hint(
                "cancellation_check_interval",
                self.cancellation_check_interval,
                MIN_CANCELLATION_CHECK_INTERVAL,
                MAX_CANCELLATION_CHECK_INTERVAL,
                "Cancellation is polled every N dequeued objects",
            ));
        }

        if self.compute_native_sizes && !self.compute_retained_heap_size {
            return Err(ConfigError::Conflict {
                issue: "compute_native_sizes is enabled but compute_retained_heap_size is not"
                    .to_string(),
                fix: "Enable compute_retained_heap_size or disable compute_native_sizes"
                    .to_string(),
            });
        }

        Ok(())
    }

    /// Validate and return self
    pub fn validated(self) -> ConfigResult<Self> {
        self.validate()?;
        Ok(self)
    }

    pub fn describe(&self) -> String {
        format!(
            "preset={} retained_sizes={} native_sizes={} matchers={:?} default_inspectors={}",
            self.preset,
            self.compute_retained_heap_size,
            self.compute_native_sizes,
            self.reference_matchers,
            self.default_inspectors
        )
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self::preset(Preset::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        let fast = AnalysisConfig::preset(Preset::Fast);
        assert!(!fast.compute_retained_heap_size);
        assert_eq!(fast.reference_matchers, MatcherSet::Jdk);

        let balanced = AnalysisConfig::default();
        assert!(balanced.compute_retained_heap_size);
        assert!(!balanced.compute_native_sizes);

        let thorough = AnalysisConfig::preset(Preset::Thorough);
        assert!(thorough.compute_native_sizes);
        assert!(thorough.validate().is_ok());
    }

    #[test]
    fn test_native_sizes_require_retained_sizes() {
        let config = AnalysisConfig::preset(Preset::Fast).compute_native_sizes(true);
        assert!(matches!(config.validate(), Err(ConfigError::Conflict { .. })));
    }

    #[test]
    fn test_interval_range() {
        let config = AnalysisConfig::default().cancellation_check_interval(0);
        assert!(matches!(config.validated(), Err(ConfigError::Range { .. })));

        let config = AnalysisConfig::default().cancellation_check_interval(1_000_000);
        assert!(config.validated().is_ok());
    }

    #[test]
    fn test_matcher_sets() {
        assert!(MatcherSet::None.matchers().is_empty());
        let jdk = MatcherSet::Jdk.matchers().len();
        assert!(jdk > 0);
        assert!(MatcherSet::JdkAndAndroid.matchers().len() > jdk);
        assert_eq!(MatcherSet::from_str("jdk_and_android"), Some(MatcherSet::JdkAndAndroid));
    }
}
