//! TOML-based application configuration.
//!
//! Stores:
//! - The target date of the yearly window
//! - Page resource stems
//! - Scheduler safety margin and fallback period
//! - The key under which the opt-in flag is stored
//!
//! Configuration is stored at `~/.config/dategate/config.toml`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::error::{ConfigError, CoreError, ValidationError};
use crate::page::PageNames;
use crate::window::TargetDate;

/// Target date of the window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowConfig {
    #[serde(default = "default_month")]
    pub month: u32,
    #[serde(default = "default_day")]
    pub day: u32,
}

/// Timer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Added to every boundary so the one-shot never fires early.
    #[serde(default = "default_safety_margin_ms")]
    pub safety_margin_ms: u64,
    #[serde(default = "default_fallback_interval_secs")]
    pub fallback_interval_secs: u64,
}

/// Opt-in flag storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptInConfig {
    #[serde(default = "default_optin_key")]
    pub key: String,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/dategate/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub window: WindowConfig,
    #[serde(default)]
    pub pages: PageNames,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub optin: OptInConfig,
}

// Default functions
fn default_month() -> u32 {
    TargetDate::VALENTINE.month
}
fn default_day() -> u32 {
    TargetDate::VALENTINE.day
}
fn default_safety_margin_ms() -> u64 {
    50
}
fn default_fallback_interval_secs() -> u64 {
    60
}
fn default_optin_key() -> String {
    "valentineAccepted".into()
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            month: default_month(),
            day: default_day(),
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            safety_margin_ms: default_safety_margin_ms(),
            fallback_interval_secs: default_fallback_interval_secs(),
        }
    }
}

impl Default for OptInConfig {
    fn default() -> Self {
        Self {
            key: default_optin_key(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let (parents, leaf) = match key.rsplit_once('.') {
            Some((parents, leaf)) => (Some(parents), leaf),
            None => (None, key),
        };
        if leaf.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        if let Some(parents) = parents {
            for part in parents.split('.') {
                current = current.get_mut(part).ok_or_else(unknown)?;
            }
        }

        let obj = current.as_object_mut().ok_or_else(unknown)?;
        let existing = obj.get(leaf).ok_or_else(unknown)?;
        let new_value = match existing {
            serde_json::Value::Bool(_) => serde_json::Value::Bool(
                value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
            ),
            serde_json::Value::Number(_) => {
                let n = value
                    .parse::<u64>()
                    .map_err(|_| invalid(format!("cannot parse '{value}' as number")))?;
                serde_json::Value::Number(n.into())
            }
            serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                return Err(invalid("cannot set a section, set one of its keys".into()));
            }
            _ => serde_json::Value::String(value.into()),
        };

        obj.insert(leaf.to_string(), new_value);
        Ok(())
    }

    /// Default location of the config file.
    pub fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the default location or write and return defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, CoreError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from `path`, writing defaults there if the file is missing.
    pub fn load_from(path: &Path) -> Result<Self, CoreError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config =
                    toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                        path: path.to_path_buf(),
                        message: e.to_string(),
                    })?;
                cfg.validate()?;
                Ok(cfg)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Persist to the default location.
    pub fn save(&self) -> Result<(), CoreError> {
        self.save_to(&Self::path()?)
    }

    /// Persist to `path`.
    pub fn save_to(&self, path: &Path) -> Result<(), CoreError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    /// Check cross-field constraints that serde defaults cannot express.
    pub fn validate(&self) -> Result<(), ValidationError> {
        TargetDate::new(self.window.month, self.window.day)?;
        if self.scheduler.fallback_interval_secs == 0 {
            return Err(ValidationError::InvalidValue {
                field: "scheduler.fallback_interval_secs".into(),
                message: "must be greater than zero".into(),
            });
        }
        self.pages.validate()?;
        if self.optin.key.is_empty() {
            return Err(ValidationError::InvalidValue {
                field: "optin.key".into(),
                message: "must not be empty".into(),
            });
        }
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by dotted key without saving.
    ///
    /// The config is left untouched if the key is unknown or the result
    /// fails validation.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), CoreError> {
        let mut json = serde_json::to_value(&*self)?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json)?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    pub fn target_date(&self) -> TargetDate {
        TargetDate::new(self.window.month, self.window.day).unwrap_or_default()
    }

    pub fn safety_margin(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.scheduler.safety_margin_ms)
    }

    pub fn fallback_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.scheduler.fallback_interval_secs.max(1))
    }
}
