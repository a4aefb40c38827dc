//! Integration tests for Settings loading from an explicit config file.
//!
//! Note: a global config at `$XDG_CONFIG_HOME/ruletree/ruletree.toml` would be
//! layered underneath; these tests only assert values the local file sets.

use std::fs;

use tempfile::TempDir;

use ruletree::config::Settings;
use ruletree::{ApplicationError, Disabled, DisabledFlags, ValidationMode};

fn write_config(dir: &TempDir, content: &str) -> std::path::PathBuf {
    let path = dir.path().join("ruletree.toml");
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn given_local_config_with_scalars_when_load_then_values_applied() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
max_deep = 3
validation = "all-leaves"
disabled = true
"#,
    );

    let settings = Settings::load(Some(path.as_path())).expect("load settings");

    assert_eq!(settings.max_deep, 3);
    assert_eq!(settings.validation, ValidationMode::AllLeaves);
    assert_eq!(settings.disabled, Disabled::All(true));
    assert_eq!(settings.engine_config().disabled, DisabledFlags::all());
}

#[test]
fn given_local_config_with_disabled_table_when_load_then_flags_applied() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
max_deep = 2

[disabled]
del_item = true
"#,
    );

    let settings = Settings::load(Some(path.as_path())).expect("load settings");

    assert_eq!(
        settings.engine_config().disabled,
        DisabledFlags {
            del_item: true,
            ..Default::default()
        }
    );
}

#[test]
fn given_zero_max_deep_when_engine_config_then_coerced_to_one() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "max_deep = 0\n");

    let settings = Settings::load(Some(path.as_path())).expect("load settings");

    assert_eq!(settings.max_deep, 0);
    assert_eq!(settings.engine_config().max_deep, 1);
}

#[test]
fn given_missing_config_file_when_load_then_config_error() {
    let dir = TempDir::new().unwrap();

    let result = Settings::load(Some(dir.path().join("absent.toml").as_path()));

    assert!(matches!(result, Err(ApplicationError::Config { .. })));
}

#[test]
fn given_invalid_toml_when_load_then_config_error_names_file() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "max_deep = \"deep\"\n");

    let err = Settings::load(Some(path.as_path())).unwrap_err();

    assert!(err.to_string().contains("ruletree.toml"), "{err}");
}

#[test]
fn given_settings_when_to_toml_then_roundtrips_through_file() {
    let dir = TempDir::new().unwrap();
    let original = Settings {
        max_deep: 4,
        validation: ValidationMode::AllLeaves,
        disabled: Disabled::Each(DisabledFlags {
            link_change: true,
            ..Default::default()
        }),
    };
    let path = write_config(&dir, &original.to_toml().unwrap());

    let loaded = Settings::load(Some(path.as_path())).expect("load settings");

    assert_eq!(loaded.max_deep, 4);
    assert_eq!(loaded.validation, ValidationMode::AllLeaves);
    assert_eq!(DisabledFlags::from(loaded.disabled), DisabledFlags::from(original.disabled));
}
