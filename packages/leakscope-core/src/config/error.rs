//! Configuration error types

use thiserror::Error;

/// Configuration error type
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Range validation error
    #[error("Invalid range for field '{field}': {value} not in {min}..={max}. {hint}")]
    Range {
        field: String,
        value: String,
        min: String,
        max: String,
        hint: String,
    },

    /// Unknown field in YAML
    #[error("Unknown field '{field}' in '{section}'. {suggestion}")]
    UnknownField {
        field: String,
        section: String,
        suggestion: String,
        valid_fields: Vec<String>,
    },

    /// Missing version field in YAML
    #[error("Missing 'version' field in configuration file. Add 'version: 1' to the top of your YAML file.")]
    MissingVersion,

    #[error("Unsupported configuration version {found}. Supported versions: {}", supported.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(", "))]
    UnsupportedVersion { found: u32, supported: Vec<u32> },

    #[error("Unknown preset '{0}'. Valid presets: fast, balanced, thorough")]
    UnknownPreset(String),

    /// Two settings that cannot be combined
    #[error("Configuration conflict: {issue}. Fix: {fix}")]
    Conflict { issue: String, fix: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Configuration result type
pub type ConfigResult<T> = Result<T, ConfigError>;

impl ConfigError {
    /// Create a range error with a hint
    pub fn range_with_hint(
        field: impl Into<String>,
        value: impl ToString,
        min: impl ToString,
        max: impl ToString,
        hint: impl Into<String>,
    ) -> Self {
        Self::Range {
            field: field.into(),
            value: value.to_string(),
            min: min.to_string(),
            max: max.to_string(),
            hint: hint.into(),
        }
    }

    /// Create an unknown field error suggesting the closest valid name
    pub fn unknown_field_with_suggestion(
        field: impl Into<String>,
        section: impl Into<String>,
        valid_fields: &[&str],
    ) -> Self {
        let field = field.into();
        let suggestion = find_closest_match(&field, valid_fields);

        Self::UnknownField {
            field,
            section: section.into(),
            suggestion,
            valid_fields: valid_fields.iter().map(|f| f.to_string()).collect(),
        }
    }
}

fn find_closest_match(target: &str, candidates: &[&str]) -> String {
    candidates
        .iter()
        .min_by_key(|candidate| levenshtein_distance(target, candidate))
        .map(|closest| format!("Did you mean '{}'?", closest))
        .unwrap_or_else(|| "No valid fields available".to_string())
}

fn levenshtein_distance(s1: &str, s2: &str) -> usize {
    let b: Vec<char> = s2.chars().collect();
    let mut previous: Vec<usize> = (0..=b.len()).collect();

    for (i, c1) in s1.chars().enumerate() {
        let mut current = vec![i + 1; b.len() + 1];
        for (j, c2) in b.iter().enumerate() {
            let cost = usize::from(c1 != *c2);
            current[j + 1] = (previous[j + 1] + 1)
                .min(current[j] + 1)
                .min(previous[j] + cost);
        }
        previous = current;
    }

    previous[b.len()]
}
