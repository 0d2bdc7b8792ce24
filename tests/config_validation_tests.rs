//! Config Validation Tests
//!
//! Typo detection, fatal validation rules and file loading, exercised
//! independently from the rest of the pipeline.

use std::io::Write;

use motion_consensus::config::validation::{
    known_config_keys, suggest_correction, validate_ranges, validate_unknown_keys,
};
use motion_consensus::config::{ConfigError, DeviceConfig};

fn write_config(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

// ============================================================================
// Typo Detection
// ============================================================================

#[test]
fn typo_in_threshold_warns_with_suggestion() {
    let toml_str = r#"
[smoothing]
classifer_confidence = 0.85
"#;
    let warnings = validate_unknown_keys(toml_str);
    assert_eq!(warnings.len(), 1, "Expected exactly 1 warning");
    assert!(warnings[0].field.contains("classifer_confidence"));
    assert_eq!(
        warnings[0].suggestion.as_deref(),
        Some("smoothing.classifier_confidence")
    );
}

#[test]
fn typo_in_section_name_warns() {
    let toml_str = r#"
[smoothng]
readings = 10
"#;
    let warnings = validate_unknown_keys(toml_str);
    // Section and its child are both unknown
    assert_eq!(warnings.len(), 2);
    assert!(warnings
        .iter()
        .any(|w| w.suggestion.as_deref() == Some("smoothing")));
}

#[test]
fn typo_in_band_entry_warns() {
    let toml_str = r#"
[[model.bands]]
label = "idle"
energy_mn = 0.0
energy_max = 0.1
"#;
    let warnings = validate_unknown_keys(toml_str);
    assert_eq!(warnings.len(), 1);
    assert_eq!(
        warnings[0].suggestion.as_deref(),
        Some("model.bands.energy_min")
    );
}

#[test]
fn every_known_key_is_silent() {
    let toml_str = DeviceConfig::default().to_toml().unwrap();
    assert!(validate_unknown_keys(&toml_str).is_empty());
}

#[test]
fn unrelated_key_gets_no_suggestion() {
    let known = known_config_keys();
    assert!(suggest_correction("totally.unrelated.setting", &known).is_none());
}

// ============================================================================
// Range and Rule Validation
// ============================================================================

#[test]
fn low_confidence_threshold_warns() {
    let mut config = DeviceConfig::default();
    config.smoothing.classifier_confidence = 0.3;
    let warnings = validate_ranges(&config);
    assert!(warnings
        .iter()
        .any(|w| w.field == "smoothing.classifier_confidence"));
}

#[test]
fn threshold_equal_to_window_is_rejected() {
    let toml_str = r#"
[smoothing]
readings = 5
min_readings_same = 5
"#;
    let file = write_config(toml_str);
    match DeviceConfig::load_from_file(file.path()) {
        Err(ConfigError::Validation(errors)) => {
            assert!(errors.iter().any(|e| e.contains("min_readings_same")));
        }
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[test]
fn duplicate_labels_are_rejected() {
    let mut config = DeviceConfig::default();
    config.model.labels = vec!["idle".to_string(), "idle".to_string()];
    config.model.bands.clear();
    assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
}

#[test]
fn inverted_band_is_rejected() {
    let mut config = DeviceConfig::default();
    config.model.bands[1].energy_min = 5.0;
    let Err(ConfigError::Validation(errors)) = config.validate() else {
        panic!("inverted band should fail");
    };
    assert!(errors.iter().any(|e| e.contains("energy_min")));
}

// ============================================================================
// File Loading
// ============================================================================

#[test]
fn partial_file_keeps_defaults_for_missing_sections() {
    let file = write_config(
        r#"
[device]
name = "wrist-left"

[smoothing]
readings = 6
min_readings_same = 4
"#,
    );
    let config = DeviceConfig::load_from_file(file.path()).unwrap();
    assert_eq!(config.device.name, "wrist-left");
    assert_eq!(config.smoothing.readings, 6);
    assert_eq!(config.smoothing.min_readings_same, 4);
    assert_eq!(config.sampling.frame_size, 375);
    assert_eq!(config.sensor.max_attempts, 3);
}

#[test]
fn malformed_toml_is_a_parse_error() {
    let file = write_config("[smoothing\nreadings = ");
    assert!(matches!(
        DeviceConfig::load_from_file(file.path()),
        Err(ConfigError::Parse(..))
    ));
}

#[test]
fn missing_file_is_an_io_error() {
    let result = DeviceConfig::load_from_file(std::path::Path::new("/nonexistent/motion.toml"));
    assert!(matches!(result, Err(ConfigError::Io(..))));
}

#[test]
fn printed_config_loads_back_identically() {
    let mut original = DeviceConfig::default();
    original.device.name = "bench".to_string();
    original.smoothing.max_consecutive_failures = 5;
    let file = write_config(&original.to_toml().unwrap());

    let loaded = DeviceConfig::load_from_file(file.path()).unwrap();
    assert_eq!(loaded.device.name, "bench");
    assert_eq!(loaded.smoothing.max_consecutive_failures, 5);
    assert_eq!(loaded.model.bands, original.model.bands);
}

// ============================================================================
// Search Order
// ============================================================================

/// Only test in this binary that touches the environment variable.
#[test]
fn env_selected_file_errors_propagate_instead_of_falling_back() {
    let invalid = write_config(
        r#"
[smoothing]
readings = 5
min_readings_same = 9
"#,
    );
    std::env::set_var("MOTION_CONSENSUS_CONFIG", invalid.path());
    assert_eq!(DeviceConfig::resolve_path().as_deref(), Some(invalid.path()));
    match DeviceConfig::load() {
        Err(ConfigError::Validation(errors)) => {
            assert!(errors.iter().any(|e| e.contains("min_readings_same")), "{errors:?}");
        }
        other => panic!("expected validation error, got {other:?}"),
    }

    std::env::set_var("MOTION_CONSENSUS_CONFIG", "/nonexistent/motion_consensus.toml");
    assert!(matches!(DeviceConfig::load(), Err(ConfigError::Io(..))));

    let valid = write_config("[device]\nname = \"from-env\"\n");
    std::env::set_var("MOTION_CONSENSUS_CONFIG", valid.path());
    let config = DeviceConfig::load().unwrap();
    assert_eq!(config.device.name, "from-env");

    std::env::remove_var("MOTION_CONSENSUS_CONFIG");
}
