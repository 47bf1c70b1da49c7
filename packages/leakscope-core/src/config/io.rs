//! Configuration I/O (YAML)
//!
//! Schema v1:
//!
//! ```yaml
//! version: 1
//! preset: balanced
//! overrides:
//!   compute_native_sizes: true
//!   cancellation_check_interval: 100
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::analysis_config::{AnalysisConfig, MatcherSet};
use super::error::{ConfigError, ConfigResult};
use super::preset::Preset;

pub const SUPPORTED_VERSIONS: &[u32] = &[1];

const TOP_LEVEL_FIELDS: &[&str] = &["version", "preset", "overrides"];
const OVERRIDE_FIELDS: &[&str] = &[
    "compute_retained_heap_size",
    "compute_native_sizes",
    "reference_matchers",
    "default_inspectors",
    "cancellation_check_interval",
];

/// YAML Schema v1
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFileV1 {
    pub version: Option<u32>,

    pub preset: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub overrides: Option<ConfigOverrides>,
}

/// Any subset of [`AnalysisConfig`] fields
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compute_retained_heap_size: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub compute_native_sizes: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_matchers: Option<MatcherSet>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_inspectors: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancellation_check_interval: Option<u32>,
}

impl ConfigOverrides {
    fn apply(self, mut config: AnalysisConfig) -> AnalysisConfig {
        if let Some(enabled) = self.compute_retained_heap_size {
            config = config.compute_retained_heap_size(enabled);
        }
        if let Some(enabled) = self.compute_native_sizes {
            config = config.compute_native_sizes(enabled);
        }
        if let Some(matchers) = self.reference_matchers {
            config = config.reference_matchers(matchers);
        }
        if let Some(enabled) = self.default_inspectors {
            config = config.default_inspectors(enabled);
        }
        if let Some(interval) = self.cancellation_check_interval {
            config = config.cancellation_check_interval(interval);
        }
        config
    }
}

/// Reject unknown keys with a suggestion before serde sees them
fn check_fields(value: &serde_yaml::Value) -> ConfigResult<()> {
    let Some(mapping) = value.as_mapping() else {
        return Ok(());
    };
    for (key, nested) in mapping {
        let Some(key) = key.as_str() else { continue };
        if !TOP_LEVEL_FIELDS.contains(&key) {
            return Err(ConfigError::unknown_field_with_suggestion(
                key,
                "config",
                TOP_LEVEL_FIELDS,
            ));
        }
        if key == "overrides" {
            if let Some(overrides) = nested.as_mapping() {
                for field in overrides.keys().filter_map(|k| k.as_str()) {
                    if !OVERRIDE_FIELDS.contains(&field) {
                        return Err(ConfigError::unknown_field_with_suggestion(
                            field,
                            "overrides",
                            OVERRIDE_FIELDS,
                        ));
                    }
                }
            }
        }
    }
    Ok(())
}

impl AnalysisConfig {
    /// Parse and validate a v1 YAML document
    pub fn from_yaml_str(content: &str) -> ConfigResult<Self> {
        let value: serde_yaml::Value = serde_yaml::from_str(content)?;
        check_fields(&value)?;
        let file: ConfigFileV1 = serde_yaml::from_value(value)?;

        let version = file.version.ok_or(ConfigError::MissingVersion)?;
        if !SUPPORTED_VERSIONS.contains(&version) {
            return Err(ConfigError::UnsupportedVersion {
                found: version,
                supported: SUPPORTED_VERSIONS.to_vec(),
            });
        }

        let preset = Preset::from_str(&file.preset)
            .map_err(|_| ConfigError::UnknownPreset(file.preset.clone()))?;

        let config = AnalysisConfig::preset(preset);
        let config = match file.overrides {
            Some(overrides) => overrides.apply(config),
            None => config,
        };
        debug!(config = %config.describe(), "Loaded analysis configuration");
        config.validated()
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&content)
    }

    /// Export as a v1 document with every field overridden
    pub fn to_yaml(&self) -> ConfigResult<String> {
        let file = ConfigFileV1 {
            version: Some(1),
            preset: self.preset.to_string(),
            overrides: Some(ConfigOverrides {
                compute_retained_heap_size: Some(self.compute_retained_heap_size),
                compute_native_sizes: Some(self.compute_native_sizes),
                reference_matchers: Some(self.reference_matchers),
                default_inspectors: Some(self.default_inspectors),
                cancellation_check_interval: Some(self.cancellation_check_interval),
            }),
        };
        Ok(serde_yaml::to_string(&file)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_yaml_loading() {
        let yaml = r#"
version: 1
preset: fast
overrides:
  reference_matchers: jdk_and_android
  cancellation_check_interval: 500
"#;
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(yaml.as_bytes()).unwrap();

        let config = AnalysisConfig::from_yaml_file(file.path()).unwrap();
        assert_eq!(config.preset, Preset::Fast);
        assert!(!config.compute_retained_heap_size);
        assert_eq!(config.reference_matchers, MatcherSet::JdkAndAndroid);
        assert_eq!(config.cancellation_check_interval, 500);
    }

    #[test]
    fn test_yaml_roundtrip() {
        let config = AnalysisConfig::preset(Preset::Thorough).default_inspectors(false);
        let yaml = config.to_yaml().unwrap();
        assert!(yaml.contains("version: 1"));
        assert!(yaml.contains("preset: thorough"));
        assert_eq!(AnalysisConfig::from_yaml_str(&yaml).unwrap(), config);
    }

    #[test]
    fn test_yaml_missing_version() {
        let result = AnalysisConfig::from_yaml_str("preset: fast\n");
        assert!(matches!(result, Err(ConfigError::MissingVersion)));
    }

    #[test]
    fn test_yaml_unsupported_version() {
        let result = AnalysisConfig::from_yaml_str("version: 2\npreset: fast\n");
        assert!(matches!(
            result,
            Err(ConfigError::UnsupportedVersion { found: 2, .. })
        ));
    }

    #[test]
    fn test_yaml_unknown_override() {
        let yaml = "version: 1\npreset: fast\noverrides:\n  compute_native_size: true\n";
        match AnalysisConfig::from_yaml_str(yaml) {
            Err(ConfigError::UnknownField { field, suggestion, .. }) => {
                assert_eq!(field, "compute_native_size");
                assert!(suggestion.contains("compute_native_sizes"));
            }
            other => panic!("expected unknown field, got {:?}", other),
        }
    }

    #[test]
    fn test_yaml_unknown_preset_and_conflict() {
        let result = AnalysisConfig::from_yaml_str("version: 1\npreset: paranoid\n");
        assert!(matches!(result, Err(ConfigError::UnknownPreset(_))));

        let yaml = "version: 1\npreset: fast\noverrides:\n  compute_native_sizes: true\n";
        assert!(matches!(
            AnalysisConfig::from_yaml_str(yaml),
            Err(ConfigError::Conflict { .. })
        ));
    }
}
