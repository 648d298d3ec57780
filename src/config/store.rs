//! Dotted-key access to the user configuration file
//!
//! The file is a nested JSON object. Tasks keep their scheduling under
//! `<Task>.Scheduler`, feature flags live in `<Task>.<Group>.<Arg>`:
//!
//! ```json
//! {
//!   "Settings": { "server": "en" },
//!   "OpsiAshBeacon": {
//!     "Scheduler": { "Enable": true, "NextRun": "2026-10-18 12:00:00" },
//!     "OpsiAshBeacon": { "AshAttack": true },
//!     "OpsiDossierBeacon": { "Enable": false }
//!   }
//! }
//! ```

use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};
use once_cell::sync::Lazy;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use super::settings::Settings;

/// Format of timestamps stored in the configuration
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Next-run placeholder for tasks that never ran
pub static DEFAULT_TIME: Lazy<NaiveDateTime> = Lazy::new(|| {
    NaiveDate::from_ymd_opt(2020, 1, 1)
        .unwrap_or_default()
        .and_time(NaiveTime::MIN)
});

/// The user configuration
#[derive(Debug, Clone)]
pub struct Config {
    data: Value,
    settings: Settings,
    path: Option<PathBuf>,
}

impl Config {
    /// Build from an in-memory JSON tree
    pub fn from_value(data: Value) -> Result<Self, ConfigError> {
        if !data.is_object() {
            return Err(ConfigError::NotAnObject);
        }
        let settings = match data.get("Settings") {
            Some(section) => serde_json::from_value(section.clone())?,
            None => Settings::default(),
        };
        Ok(Self {
            data,
            settings,
            path: None,
        })
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Self::from_value(serde_json::from_str(json)?)
    }

    /// Load from disk; `task_call` writes changes back to the same file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_json_str(&json)?;
        config.path = Some(path.to_path_buf());
        log::info!("Loaded config {}", path.display());
        Ok(config)
    }

    /// Write the tree back to the file it was loaded from
    pub fn save(&self) -> Result<(), ConfigError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let json = serde_json::to_string_pretty(&self.data)?;
        std::fs::write(path, json).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        log::debug!("Saved config {}", path.display());
        Ok(())
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn data(&self) -> &Value {
        &self.data
    }

    /// Value at a dotted key path
    pub fn deep_get(&self, keys: &str) -> Option<&Value> {
        keys.split('.')
            .try_fold(&self.data, |node, key| node.as_object()?.get(key))
    }

    /// Set a value at a dotted key path, creating objects along the way.
    ///
    /// Non-object values in the way are replaced.
    pub fn deep_set(&mut self, keys: &str, value: Value) {
        let mut parts: Vec<&str> = keys.split('.').collect();
        let Some(last) = parts.pop() else {
            return;
        };
        let mut node = &mut self.data;
        for key in parts {
            let current = node;
            if !current.is_object() {
                *current = Value::Object(Map::new());
            }
            node = match current {
                Value::Object(map) => map
                    .entry(key.to_string())
                    .or_insert_with(|| Value::Object(Map::new())),
                _ => return,
            };
        }
        if !node.is_object() {
            *node = Value::Object(Map::new());
        }
        if let Value::Object(map) = node {
            map.insert(last.to_string(), value);
        }
    }

    /// Typed value at a dotted key path, `default` if missing or mistyped
    pub fn cross_get<T: DeserializeOwned>(&self, keys: &str, default: T) -> T {
        match self.deep_get(keys) {
            Some(value) => match T::deserialize(value) {
                Ok(value) => value,
                Err(e) => {
                    log::warn!("Config {} has unexpected value {}: {}", keys, value, e);
                    default
                }
            },
            None => default,
        }
    }

    /// Timestamp at a dotted key path
    pub fn cross_get_datetime(&self, keys: &str, default: NaiveDateTime) -> NaiveDateTime {
        let Some(text) = self.deep_get(keys).and_then(Value::as_str) else {
            return default;
        };
        match NaiveDateTime::parse_from_str(text, TIME_FORMAT) {
            Ok(time) => time,
            Err(e) => {
                log::warn!("Config {} has invalid time {:?}: {}", keys, text, e);
                default
            }
        }
    }

    /// Boolean feature flag, false when missing
    pub fn flag(&self, keys: &str) -> bool {
        self.cross_get(keys, false)
    }

    pub fn is_task_enabled(&self, task: &str) -> bool {
        self.flag(&format!("{}.Scheduler.Enable", task))
    }

    /// Ask the scheduler to run `task` now
    pub fn task_call(&mut self, task: &str) -> Result<bool, ConfigError> {
        self.task_call_at(task, Local::now().naive_local())
    }

    /// Set `<task>.Scheduler.NextRun` to `now` and enable the task
    pub fn task_call_at(&mut self, task: &str, now: NaiveDateTime) -> Result<bool, ConfigError> {
        let next_run = format!("{}.Scheduler.NextRun", task);
        if self.deep_get(&next_run).is_none() {
            return Err(ConfigError::TaskNotFound(task.to_string()));
        }
        log::info!("Task call: {}", task);
        self.deep_set(&next_run, Value::String(now.format(TIME_FORMAT).to_string()));
        self.deep_set(&format!("{}.Scheduler.Enable", task), Value::Bool(true));
        self.save()?;
        Ok(true)
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config root must be a JSON object")]
    NotAnObject,
    #[error("Task to call: `{0}` does not exist in user config")]
    TaskNotFound(String),
    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid config: {0}")]
    Json(#[from] serde_json::Error),
}
