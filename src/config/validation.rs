//! Config validation: unknown-key detection with Levenshtein suggestions
//! and non-fatal range checks.
//!
//! Two-pass parse approach: first deserialize raw TOML into `toml::Value`,
//! walk the key tree, compare against known field names, and emit warnings
//! with "did you mean?" suggestions. Then proceed with normal serde
//! deserialization. Warnings never break existing configs.

use std::collections::HashSet;

/// A non-fatal config warning (typo, suspicious value).
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(ref s) = self.suggestion {
            write!(f, " — did you mean '{s}'?")?;
        }
        Ok(())
    }
}

// ============================================================================
// Known Config Keys
// ============================================================================

/// Returns the complete set of valid dotted key paths for DeviceConfig.
///
/// Maintained by hand to match the struct hierarchy in device_config.rs.
/// Entries of `[[model.bands]]` are walked as `model.bands.<field>`.
pub fn known_config_keys() -> HashSet<&'static str> {
    let keys: &[&str] = &[
        // [device]
        "device",
        "device.name",
        // [model]
        "model",
        "model.labels",
        "model.anomaly_supported",
        "model.bands",
        "model.bands.label",
        "model.bands.energy_min",
        "model.bands.energy_max",
        // [sampling]
        "sampling",
        "sampling.frame_size",
        "sampling.interval_ms",
        "sampling.scale_divisor",
        // [smoothing]
        "smoothing",
        "smoothing.readings",
        "smoothing.min_readings_same",
        "smoothing.classifier_confidence",
        "smoothing.anomaly_confidence",
        "smoothing.interval_ms",
        "smoothing.wait_for_full_frame",
        "smoothing.max_consecutive_failures",
        // [sensor]
        "sensor",
        "sensor.max_attempts",
        "sensor.initial_backoff_ms",
        "sensor.max_backoff_ms",
    ];
    keys.iter().copied().collect()
}

// ============================================================================
// TOML Key Walking
// ============================================================================

/// Recursively walks a `toml::Value` tree and collects all dotted key paths.
///
/// For example, a table `{ a = { b = 1, c = 2 } }` yields:
/// `["a", "a.b", "a.c"]`. Tables inside arrays contribute their keys under the
/// array's path, deduplicated.
pub fn walk_toml_keys(value: &toml::Value, prefix: &str) -> Vec<String> {
    let mut keys = Vec::new();
    if let Some(table) = value.as_table() {
        for (k, v) in table {
            let path = if prefix.is_empty() {
                k.clone()
            } else {
                format!("{prefix}.{k}")
            };
            keys.push(path.clone());
            if v.is_table() {
                keys.extend(walk_toml_keys(v, &path));
            } else if let Some(items) = v.as_array() {
                for item in items.iter().filter(|i| i.is_table()) {
                    for nested in walk_toml_keys(item, &path) {
                        if !keys.contains(&nested) {
                            keys.push(nested);
                        }
                    }
                }
            }
        }
    }
    keys
}

// ============================================================================
// Levenshtein Distance
// ============================================================================

/// Compute the Levenshtein edit distance between two strings.
fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1)
                .min(curr[j] + 1)
                .min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Suggest the closest known key for an unknown key, if within edit distance 3.
pub fn suggest_correction(unknown: &str, known: &HashSet<&str>) -> Option<String> {
    let mut best: Option<(&str, usize)> = None;
    for &k in known {
        let dist = levenshtein(unknown, k);
        if dist > 3 {
            continue;
        }
        // Ties resolve alphabetically so suggestions are stable across runs
        let better = match best {
            None => true,
            Some((bk, bd)) => dist < bd || (dist == bd && k < bk),
        };
        if better {
            best = Some((k, dist));
        }
    }
    best.map(|(k, _)| k.to_string())
}

// ============================================================================
// Unknown Key Validation (entry point)
// ============================================================================

/// Parse a raw TOML string and return warnings for any unknown config keys.
///
/// This does NOT fail on unknown keys, it only warns.
pub fn validate_unknown_keys(raw_toml: &str) -> Vec<ValidationWarning> {
    let value: toml::Value = match raw_toml.parse() {
        Ok(v) => v,
        Err(_) => return Vec::new(), // parse errors are handled by serde later
    };

    let known = known_config_keys();
    walk_toml_keys(&value, "")
        .into_iter()
        .filter(|key| !known.contains(key.as_str()))
        .map(|key| {
            let suggestion = suggest_correction(&key, &known);
            ValidationWarning {
                message: format!("Unknown config key '{key}'"),
                field: key,
                suggestion,
            }
        })
        .collect()
}

// ============================================================================
// Range Validation
// ============================================================================

/// Suspicious-but-legal values. Impossible values are rejected by
/// `DeviceConfig::validate` instead.
pub fn validate_ranges(config: &super::DeviceConfig) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();
    let s = &config.smoothing;

    // Less than a simple majority barely smooths anything
    if s.readings > 0 && s.min_readings_same * 2 < s.readings {
        warnings.push(ValidationWarning {
            field: "smoothing.min_readings_same".to_string(),
            message: format!(
                "min_readings_same = {} is below half of readings ({}); decisions will flicker",
                s.min_readings_same, s.readings
            ),
            suggestion: None,
        });
    }

    if s.classifier_confidence.is_finite() && s.classifier_confidence < 0.5 {
        warnings.push(ValidationWarning {
            field: "smoothing.classifier_confidence".to_string(),
            message: format!(
                "classifier_confidence = {:.2} lets more than one class qualify per frame",
                s.classifier_confidence
            ),
            suggestion: None,
        });
    }

    if !config.model.anomaly_supported && s.anomaly_confidence != super::defaults::ANOMALY_CONFIDENCE {
        warnings.push(ValidationWarning {
            field: "smoothing.anomaly_confidence".to_string(),
            message: "anomaly_confidence is set but model.anomaly_supported = false".to_string(),
            suggestion: None,
        });
    }

    warnings
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levenshtein_identical() {
        assert_eq!(levenshtein("hello", "hello"), 0);
    }

    #[test]
    fn test_levenshtein_one_edit() {
        assert_eq!(levenshtein("readngs", "readings"), 1);
    }

    #[test]
    fn test_levenshtein_empty() {
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("abc", ""), 3);
    }

    #[test]
    fn test_walk_toml_keys_nested() {
        let toml: toml::Value = r#"
            [smoothing]
            readings = 10
        "#
        .parse()
        .unwrap();
        let keys = walk_toml_keys(&toml, "");
        assert!(keys.contains(&"smoothing".to_string()));
        assert!(keys.contains(&"smoothing.readings".to_string()));
    }

    #[test]
    fn test_walk_toml_keys_array_of_tables() {
        let toml: toml::Value = r#"
            [[model.bands]]
            label = "idle"
            energy_min = 0.0
            energy_max = 0.1

            [[model.bands]]
            label = "walk"
            energy_min = 0.2
            energy_max = 1.0
        "#
        .parse()
        .unwrap();
        let keys = walk_toml_keys(&toml, "");
        assert!(keys.contains(&"model.bands".to_string()));
        assert_eq!(
            keys.iter().filter(|k| *k == "model.bands.label").count(),
            1
        );
    }

    #[test]
    fn test_typo_key_produces_warning_with_suggestion() {
        let toml_str = r#"
[smoothing]
min_reading_same = 7
"#;
        let warnings = validate_unknown_keys(toml_str);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].field.contains("min_reading_same"));
        assert_eq!(
            warnings[0].suggestion.as_deref(),
            Some("smoothing.min_readings_same")
        );
    }

    #[test]
    fn test_all_valid_keys_produce_zero_warnings() {
        let toml_str = r#"
[device]
name = "wrist-1"

[model]
labels = ["idle", "walk"]
anomaly_supported = true

[[model.bands]]
label = "idle"
energy_min = 0.0
energy_max = 0.05

[smoothing]
readings = 6
min_readings_same = 4
"#;
        let warnings = validate_unknown_keys(toml_str);
        assert!(warnings.is_empty(), "Expected 0 warnings, got: {:?}", warnings);
    }

    #[test]
    fn test_suggest_correction_no_match_for_garbage() {
        let known = known_config_keys();
        assert!(suggest_correction("completely_unrelated_garbage_key_xyz", &known).is_none());
    }

    #[test]
    fn test_weak_consensus_warns() {
        let mut config = crate::config::DeviceConfig::default();
        config.smoothing.min_readings_same = 2;
        let warnings = validate_ranges(&config);
        assert!(warnings.iter().any(|w| w.field == "smoothing.min_readings_same"));
    }

    #[test]
    fn test_defaults_produce_no_range_warnings() {
        let config = crate::config::DeviceConfig::default();
        let warnings = validate_ranges(&config);
        assert!(warnings.is_empty(), "{:?}", warnings);
    }
}
