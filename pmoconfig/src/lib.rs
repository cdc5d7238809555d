//! # PMORadio Configuration Module
//!
//! This module provides configuration management for PMORadio, including:
//! - Loading configuration from YAML files
//! - Merging with embedded default configuration
//! - Environment variable overrides
//! - Type-safe getters and setters for configuration values
//! - Thread-safe singleton access pattern
//!
//! Crates that need their own settings (`pmoplayer`, `pmostations`) extend
//! [`Config`] through extension traits instead of adding getters here.
//!
//! ## Usage
//!
//! ```no_run
//! use pmoconfig::get_config;
//!
//! let config = get_config();
//! let port = config.get_http_port();
//! config.set_http_port(9000)?;
//! # Ok::<(), anyhow::Error>(())
//! ```

use anyhow::{Result, anyhow};
use dirs::home_dir;
use lazy_static::lazy_static;
use serde_yaml::{Mapping, Number, Value};
use std::{
    env, fs,
    path::Path,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};
use tracing::info;

// Configuration par défaut intégrée
const DEFAULT_CONFIG: &str = include_str!("pmoradio.yaml");

lazy_static! {
    static ref CONFIG: Arc<Config> =
        Arc::new(Config::load_config("").expect("Failed to load PMORadio configuration"));
}

const ENV_CONFIG_DIR: &str = "PMORADIO_CONFIG";
const ENV_PREFIX: &str = "PMORADIO_CONFIG__";

const DEFAULT_HTTP_PORT: u16 = 8080;
const DEFAULT_BASE_URL: &str = "localhost";
const DEFAULT_LOG_BUFFER_CAPACITY: usize = 1000;
const DEFAULT_LOG_MIN_LEVEL: &str = "INFO";
const DEFAULT_LOG_ENABLE_CONSOLE: bool = true;

/// Macro to generate getter/setter for usize values with default
macro_rules! impl_usize_config {
    ($getter:ident, $setter:ident, $path:expr, $default:expr) => {
        pub fn $getter(&self) -> Result<usize> {
            match self.get_value($path) {
                Ok(Value::Number(n)) => Ok(n.as_u64().map(|v| v as usize).unwrap_or($default)),
                _ => Ok($default),
            }
        }

        pub fn $setter(&self, size: usize) -> Result<()> {
            self.set_value($path, Value::Number(Number::from(size)))
        }
    };
}

/// Macro to generate getter/setter for bool values with default
macro_rules! impl_bool_config {
    ($getter:ident, $setter:ident, $path:expr, $default:expr) => {
        pub fn $getter(&self) -> Result<bool> {
            match self.get_value($path) {
                Ok(Value::Bool(b)) => Ok(b),
                _ => Ok($default),
            }
        }

        pub fn $setter(&self, value: bool) -> Result<()> {
            self.set_value($path, Value::Bool(value))
        }
    };
}

/// Configuration manager for PMORadio
///
/// The whole configuration tree is kept as a YAML [`Value`]; every setter
/// writes the tree back to `config.yaml` so the file always reflects the
/// running configuration.
#[derive(Debug)]
pub struct Config {
    config_dir: String,
    path: String,
    data: Mutex<Value>,
}

impl Clone for Config {
    fn clone(&self) -> Self {
        Self {
            config_dir: self.config_dir.clone(),
            path: self.path.clone(),
            data: Mutex::new(self.data().clone()),
        }
    }
}

impl Config {
    fn data(&self) -> MutexGuard<'_, Value> {
        self.data.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Finds a config directory by trying different locations in order
    fn find_config_dir(directory: &str) -> String {
        if !directory.is_empty() {
            return directory.to_string();
        }

        if let Ok(env_path) = env::var(ENV_CONFIG_DIR) {
            info!(env_var = ENV_CONFIG_DIR, path = %env_path, "Trying to load config from env");
            return env_path;
        }

        if Path::new(".pmoradio").exists() {
            return ".pmoradio".to_string();
        }

        if let Some(home) = home_dir() {
            let home_config = home.join(".pmoradio");
            if home_config.exists() {
                return home_config.to_string_lossy().to_string();
            }
        }

        ".pmoradio".to_string()
    }

    /// Creates the directory if needed and checks it is readable and writable
    fn validate_config_dir(path: &Path) -> Result<()> {
        if !path.exists() {
            fs::create_dir_all(path)?;
        }

        if !path.is_dir() {
            return Err(anyhow!("{} is not a directory", path.display()));
        }

        let probe = path.join(".write_test");
        fs::write(&probe, b"test")?;
        fs::remove_file(&probe)?;
        fs::read_dir(path)?;

        Ok(())
    }

    /// Determines and validates the configuration directory
    ///
    /// The directory is searched in the following order:
    /// 1. The provided `directory` parameter if not empty
    /// 2. The `PMORADIO_CONFIG` environment variable
    /// 3. `.pmoradio` in the current directory
    /// 4. `.pmoradio` in the user's home directory
    pub fn config_dir(directory: &str) -> Result<String> {
        let dir_path = Self::find_config_dir(directory);
        Self::validate_config_dir(Path::new(&dir_path))?;
        Ok(dir_path)
    }

    /// Loads the configuration from the specified directory
    ///
    /// The embedded defaults are merged with `config.yaml` when present,
    /// `PMORADIO_CONFIG__*` environment overrides are applied, and the merged
    /// result is written back.
    pub fn load_config(directory: &str) -> Result<Self> {
        let config_dir = Self::config_dir(directory)?;
        info!(config_dir = %config_dir, "Using config directory");

        let path = Path::new(&config_dir)
            .join("config.yaml")
            .to_string_lossy()
            .to_string();

        let mut value = lower_keys_value(serde_yaml::from_str(DEFAULT_CONFIG)?);

        match fs::read(&path) {
            Ok(data) => {
                info!(config_file = %path, "Loaded config file");
                let external = lower_keys_value(serde_yaml::from_slice(&data)?);
                merge_yaml(&mut value, &external);
            }
            Err(_) => {
                info!(config_file = %path, "Config file not found, using default embedded config");
            }
        }

        apply_overrides(&mut value, env::vars());

        let config = Config {
            config_dir,
            path,
            data: Mutex::new(value),
        };

        config.save()?;
        Ok(config)
    }

    /// Directory holding `config.yaml`
    pub fn directory(&self) -> &str {
        &self.config_dir
    }

    /// Saves the current configuration to the config.yaml file
    pub fn save(&self) -> Result<()> {
        let yaml = serde_yaml::to_string(&*self.data())?;
        fs::write(&self.path, yaml)?;
        Ok(())
    }

    /// Sets a configuration value at the specified path and saves it
    ///
    /// # Arguments
    ///
    /// * `path` - Array of keys representing the path (e.g., `&["host", "http_port"]`)
    /// * `value` - The YAML value to set
    pub fn set_value(&self, path: &[&str], value: Value) -> Result<()> {
        {
            let mut data = self.data();
            set_value_internal(&mut data, path, value)?;
        }
        self.save()
    }

    /// Gets a configuration value at the specified path
    ///
    /// Fails when one of the path segments does not exist.
    pub fn get_value(&self, path: &[&str]) -> Result<Value> {
        let data = self.data();
        let mut current = &*data;
        for (i, key) in path.iter().enumerate() {
            match current {
                Value::Mapping(map) => match map.get(&Value::String(key.to_lowercase())) {
                    Some(next) => current = next,
                    None => return Err(anyhow!("Path {} does not exist", path[..=i].join("."))),
                },
                _ => return Err(anyhow!("Path {} is not a mapping", path[..i].join("."))),
            }
        }
        Ok(current.clone())
    }

    /// Gets the base URL for the HTTP server
    ///
    /// Falls back to `localhost` when the value is missing or empty.
    pub fn get_base_url(&self) -> String {
        match self.get_value(&["host", "base_url"]) {
            Ok(Value::String(s)) if !s.is_empty() => s,
            _ => DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Gets the HTTP port from configuration
    ///
    /// Accepts numbers and numeric strings; anything else yields 8080.
    pub fn get_http_port(&self) -> u16 {
        match self.get_value(&["host", "http_port"]) {
            Ok(Value::Number(n)) => match n.as_u64().and_then(|p| u16::try_from(p).ok()) {
                Some(port) => port,
                None => {
                    tracing::warn!("Invalid HTTP port '{}', using default {}", n, DEFAULT_HTTP_PORT);
                    DEFAULT_HTTP_PORT
                }
            },
            Ok(Value::String(s)) => s.parse::<u16>().unwrap_or_else(|_| {
                tracing::warn!("Invalid HTTP port '{}', using default {}", s, DEFAULT_HTTP_PORT);
                DEFAULT_HTTP_PORT
            }),
            Ok(_) => DEFAULT_HTTP_PORT,
            Err(err) => {
                tracing::warn!(
                    "Failed to get HTTP port: {}, using default {}",
                    err,
                    DEFAULT_HTTP_PORT
                );
                DEFAULT_HTTP_PORT
            }
        }
    }

    /// Sets the HTTP port in configuration
    pub fn set_http_port(&self, port: u16) -> Result<()> {
        self.set_value(&["host", "http_port"], Value::Number(Number::from(port)))
    }

    impl_usize_config!(
        get_log_cache_size,
        set_log_cache_size,
        &["host", "logger", "buffer_capacity"],
        DEFAULT_LOG_BUFFER_CAPACITY
    );

    impl_bool_config!(
        get_log_enable_console,
        set_log_enable_console,
        &["host", "logger", "enable_console"],
        DEFAULT_LOG_ENABLE_CONSOLE
    );

    /// Récupère le niveau de log minimum depuis la configuration
    pub fn get_log_min_level(&self) -> Result<String> {
        match self.get_value(&["host", "logger", "min_level"]) {
            Ok(Value::String(s)) => Ok(s),
            _ => Ok(DEFAULT_LOG_MIN_LEVEL.to_string()),
        }
    }

    /// Définit le niveau de log minimum dans la configuration
    pub fn set_log_min_level(&self, level: String) -> Result<()> {
        self.set_value(&["host", "logger", "min_level"], Value::String(level))
    }
}

/// Returns the global configuration instance
///
/// The configuration is lazily loaded on first access.
pub fn get_config() -> Arc<Config> {
    CONFIG.clone()
}

fn set_value_internal(data: &mut Value, path: &[&str], value: Value) -> Result<()> {
    let Some((head, rest)) = path.split_first() else {
        *data = value;
        return Ok(());
    };

    if data.is_null() {
        *data = Value::Mapping(Mapping::new());
    }

    let Value::Mapping(map) = data else {
        return Err(anyhow!("Current node is not a map"));
    };

    let key = Value::String(head.to_lowercase());
    if rest.is_empty() {
        map.insert(key, value);
        Ok(())
    } else {
        let entry = map.entry(key).or_insert(Value::Mapping(Mapping::new()));
        set_value_internal(entry, rest, value)
    }
}

/// Applies `PMORADIO_CONFIG__A__B=value` style overrides
///
/// Values are parsed as YAML first so numbers and booleans keep their type.
fn apply_overrides<I>(config: &mut Value, vars: I)
where
    I: IntoIterator<Item = (String, String)>,
{
    for (key, raw) in vars {
        let Some(stripped) = key.strip_prefix(ENV_PREFIX) else {
            continue;
        };
        let key_path: Vec<&str> = stripped.split("__").collect();
        let value = serde_yaml::from_str::<Value>(&raw).unwrap_or(Value::String(raw));
        if let Err(err) = set_value_internal(config, &key_path, value) {
            tracing::warn!(variable = %key, "Ignoring configuration override: {}", err);
        }
    }
}

fn lower_keys_value(value: Value) -> Value {
    match value {
        Value::Mapping(map) => Value::Mapping(
            map.into_iter()
                .map(|(k, v)| {
                    let k = match k {
                        Value::String(s) => Value::String(s.to_lowercase()),
                        other => other,
                    };
                    (k, lower_keys_value(v))
                })
                .collect(),
        ),
        Value::Sequence(seq) => Value::Sequence(seq.into_iter().map(lower_keys_value).collect()),
        other => other,
    }
}

/// Merges external YAML configuration into default configuration
///
/// Mappings are merged key by key; scalars and sequences from `external`
/// replace the default value.
fn merge_yaml(default: &mut Value, external: &Value) {
    match (default, external) {
        (Value::Mapping(dmap), Value::Mapping(emap)) => {
            for (k, v) in emap {
                match dmap.get_mut(k) {
                    Some(dv) => merge_yaml(dv, v),
                    None => {
                        dmap.insert(k.clone(), v.clone());
                    }
                }
            }
        }
        (d, e) => *d = e.clone(),
    }
}
