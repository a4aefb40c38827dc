//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/ruletree/ruletree.toml`
//! 3. Local config: file passed with `--config`
//! 4. Environment variables: `RULETREE_*` prefix

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::application::{ApplicationError, EngineConfig};
use crate::domain::{coerce_max_deep, Disabled, DisabledFlags, ValidationMode};

/// Engine settings as configured by the user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Maximum nesting depth; values below 1 are coerced when the engine is built
    pub max_deep: i64,
    /// Group completeness rule used by validated snapshots
    pub validation: ValidationMode,
    /// `true`/`false`, or `{ add_item, del_item, link_change }`
    pub disabled: Disabled,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_deep: 1,
            validation: ValidationMode::default(),
            disabled: Disabled::default(),
        }
    }
}

/// Raw settings for intermediate parsing (`None` → inherit from base).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub max_deep: Option<i64>,
    pub disabled: Option<Disabled>,
    pub validation: Option<ValidationMode>,
}

/// Get the XDG config directory for ruletree.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "ruletree").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("ruletree.toml"))
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}

impl Settings {
    /// Overlay wins where it specifies a value.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            max_deep: overlay.max_deep.unwrap_or(self.max_deep),
            disabled: overlay.disabled.unwrap_or(self.disabled),
            validation: overlay.validation.unwrap_or(self.validation),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `local_path` - Optional explicit config file; it must exist when given
    pub fn load(local_path: Option<&Path>) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                debug!(path = %global_path.display(), "loading global config");
                current = current.merge_with(&load_raw_settings(&global_path)?);
            }
        }

        if let Some(path) = local_path {
            debug!(path = %path.display(), "loading local config");
            current = current.merge_with(&load_raw_settings(path)?);
        }

        current.apply_env_overrides(None)
    }

    /// Apply `RULETREE_*` environment variables as explicit overrides.
    ///
    /// `source` replaces the process environment (used by tests).
    ///
    /// - `RULETREE_MAX_DEEP=3`
    /// - `RULETREE_DISABLED=true`
    /// - `RULETREE_DISABLED__ADD_ITEM=true` (also `DEL_ITEM`, `LINK_CHANGE`)
    /// - `RULETREE_VALIDATION=all-leaves`
    pub fn apply_env_overrides(
        mut self,
        source: Option<HashMap<String, String>>,
    ) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(
                Environment::with_prefix("RULETREE")
                    .prefix_separator("_")
                    .separator("__")
                    .source(source),
            )
            .build()
            .map_err(config_err)?;

        if let Ok(val) = config.get_int("max_deep") {
            self.max_deep = val;
        }
        if let Ok(val) = config.get_bool("disabled") {
            self.disabled = Disabled::All(val);
        } else {
            let mut flags = DisabledFlags::from(self.disabled);
            let mut touched = false;
            for (key, flag) in [
                ("disabled.add_item", &mut flags.add_item),
                ("disabled.del_item", &mut flags.del_item),
                ("disabled.link_change", &mut flags.link_change),
            ] {
                if let Ok(val) = config.get_bool(key) {
                    *flag = val;
                    touched = true;
                }
            }
            if touched {
                self.disabled = Disabled::Each(flags);
            }
        }
        if let Ok(val) = config.get_string("validation") {
            self.validation = val
                .parse()
                .map_err(|message| ApplicationError::Config { message })?;
        }

        Ok(self)
    }

    /// Engine configuration with `max_deep` coerced to at least 1.
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            max_deep: coerce_max_deep(self.max_deep),
            disabled: self.disabled.into(),
            validation: self.validation,
        }
    }

    /// Render as TOML (for `config show`).
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: e.to_string(),
        })
    }
}
