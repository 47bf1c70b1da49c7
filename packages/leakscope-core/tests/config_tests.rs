//! Configuration loading tests
//!
//! - Presets: every preset validates
//! - YAML: documents round-trip and unknown keys are explained
//! - Ranges: out-of-range values are rejected with a hint

use std::io::Write;

use leakscope_core::config::{AnalysisConfig, ConfigError, MatcherSet, Preset};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use tempfile::NamedTempFile;

#[test]
fn test_every_preset_validates() {
    for preset in [Preset::Fast, Preset::Balanced, Preset::Thorough] {
        let config = AnalysisConfig::preset(preset);
        assert!(config.validate().is_ok(), "{} should validate", preset);
        assert_eq!(config.preset, preset);
    }
}

#[test]
fn test_yaml_file_with_overrides() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        "version: 1\npreset: fast\noverrides:\n  compute_retained_heap_size: true\n  reference_matchers: none"
    )
    .unwrap();

    let config = AnalysisConfig::from_yaml_file(file.path()).unwrap();
    assert_eq!(config.preset, Preset::Fast);
    assert!(config.compute_retained_heap_size);
    assert!(!config.compute_native_sizes);
    assert_eq!(config.reference_matchers, MatcherSet::None);
}

#[test]
fn test_unknown_override_suggests_closest_field() {
    let err = AnalysisConfig::from_yaml_str(
        "version: 1\npreset: balanced\noverrides:\n  compute_retained_heap_sizes: true",
    )
    .unwrap_err();

    match err {
        ConfigError::UnknownField { field, suggestion, .. } => {
            assert_eq!(field, "compute_retained_heap_sizes");
            assert_eq!(suggestion, "Did you mean 'compute_retained_heap_size'?");
        }
        other => panic!("Expected UnknownField, got {:?}", other),
    }
}

#[test]
fn test_version_is_required() {
    let err = AnalysisConfig::from_yaml_str("preset: fast").unwrap_err();
    assert!(matches!(err, ConfigError::MissingVersion));

    let err = AnalysisConfig::from_yaml_str("version: 2\npreset: fast").unwrap_err();
    assert!(matches!(err, ConfigError::UnsupportedVersion { found: 2, .. }));
}

#[test]
fn test_native_sizes_need_retained_sizes() {
    let err = AnalysisConfig::from_yaml_str(
        "version: 1\npreset: fast\noverrides:\n  compute_native_sizes: true",
    )
    .unwrap_err();
    assert!(matches!(err, ConfigError::Conflict { .. }));
}

#[test]
fn test_missing_file_is_an_io_error() {
    let err = AnalysisConfig::from_yaml_file("/nonexistent/leakscope.yaml").unwrap_err();
    assert!(matches!(err, ConfigError::Io(_)));
}

proptest! {
    #[test]
    fn prop_yaml_roundtrip(
        preset_idx in 0u8..3,
        retained in any::<bool>(),
        matchers_idx in 0u8..3,
        inspectors in any::<bool>(),
        interval in 1u32..=1_000_000,
    ) {
        let preset = [Preset::Fast, Preset::Balanced, Preset::Thorough][preset_idx as usize];
        let matchers = [MatcherSet::None, MatcherSet::Jdk, MatcherSet::JdkAndAndroid][matchers_idx as usize];
        let config = AnalysisConfig::preset(preset)
            .compute_retained_heap_size(retained)
            .compute_native_sizes(false)
            .reference_matchers(matchers)
            .default_inspectors(inspectors)
            .cancellation_check_interval(interval);

        let yaml = config.to_yaml().unwrap();
        let recovered = AnalysisConfig::from_yaml_str(&yaml).unwrap();
        prop_assert_eq!(recovered, config);
    }

    #[test]
    fn prop_interval_range(interval in any::<u32>()) {
        let config = AnalysisConfig::default().cancellation_check_interval(interval);
        let in_range = (1..=1_000_000).contains(&interval);
        prop_assert_eq!(config.validate().is_ok(), in_range);
    }
}
