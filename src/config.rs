use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use anyhow::{Context, Result};
use toml::Value;
use log::{debug, info};
use crate::addon::discovery::DEFAULT_MANIFEST_NAMES;

/// Configuration storage - section_name -> key -> value
pub type Configuration = HashMap<String, HashMap<String, String>>;

/// Section holding the addon locations
pub const ADDONS_SECTION: &str = "addons";

/// Where addons are found and where their activation records live
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddonSettings {
    /// Directory scanned for addon manifests
    pub directory: PathBuf,
    /// Activation store file
    pub store: PathBuf,
    /// File names recognised as manifests
    pub manifest_names: Vec<String>,
}

impl AddonSettings {
    /// Defaults under the platform data directory
    pub fn defaults() -> Self {
        let base = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("addonmgr");
        Self {
            directory: base.join("addons"),
            store: base.join("activations.json"),
            manifest_names: DEFAULT_MANIFEST_NAMES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Configuration manager
pub struct ConfigManager {
    config: Configuration,
    config_file_path: Option<PathBuf>,
}

impl ConfigManager {
    /// Create a new ConfigManager from a Configuration (primarily for testing)
    pub fn from_config(config: Configuration) -> Self {
        Self {
            config,
            config_file_path: None,
        }
    }

    /// Load configuration using discovery hierarchy
    pub fn load() -> Result<Self> {
        debug!("Starting configuration discovery");

        for path in discover_config_files() {
            debug!("Attempting to load config from: {}", path.display());
            if path.exists() {
                return Self::load_from_file(path);
            }
        }

        info!("No configuration file found, using defaults");
        Ok(Self::from_config(Configuration::new()))
    }

    /// Load configuration from explicit file path
    pub fn load_from_file(path: PathBuf) -> Result<Self> {
        debug!("Loading configuration from file: {}", path.display());

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config = parse_toml_config(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        info!("Loaded configuration from: {}", path.display());
        Ok(Self {
            config,
            config_file_path: Some(path),
        })
    }

    /// File the configuration came from, if any
    pub fn config_file_path(&self) -> Option<&Path> {
        self.config_file_path.as_deref()
    }

    /// Get value from a section, falling back to `base`
    pub fn get_value(&self, section: &str, key: &str) -> Option<&String> {
        self.config
            .get(section)
            .and_then(|s| s.get(key))
            .or_else(|| self.config.get("base").and_then(|s| s.get(key)))
    }

    /// Get boolean value with type conversion
    pub fn get_bool(&self, section: &str, key: &str) -> Result<Option<bool>> {
        match self.get_value(section, key) {
            Some(value) => match value.to_lowercase().as_str() {
                "true" => Ok(Some(true)),
                "false" => Ok(Some(false)),
                _ => Err(anyhow::anyhow!("Invalid boolean value for {}.{}: {}", section, key, value)),
            },
            None => Ok(None),
        }
    }

    /// Get log level value with type conversion
    pub fn get_log_level(&self, section: &str, key: &str) -> Result<Option<log::LevelFilter>> {
        match self.get_value(section, key) {
            Some(value) => Ok(Some(crate::logging::parse_log_level(value)?)),
            None => Ok(None),
        }
    }

    /// Get path value with `~/` expanded
    pub fn get_path(&self, section: &str, key: &str) -> Option<PathBuf> {
        self.get_value(section, key).map(|v| expand_home(v))
    }

    /// Addon settings from `[addons]`, defaults filling the gaps
    pub fn addon_settings(&self) -> Result<AddonSettings> {
        let mut settings = AddonSettings::defaults();

        if let Some(directory) = self.get_path(ADDONS_SECTION, "directory") {
            settings.directory = directory;
        }
        if let Some(store) = self.get_path(ADDONS_SECTION, "store") {
            settings.store = store;
        }
        if let Some(names) = self.get_value(ADDONS_SECTION, "manifest-names") {
            let names: Vec<String> = names
                .split(',')
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(str::to_string)
                .collect();
            if names.is_empty() {
                return Err(anyhow::anyhow!("addons.manifest-names must name at least one file"));
            }
            settings.manifest_names = names;
        }

        debug!("Addon settings: {:?}", settings);
        Ok(settings)
    }
}

/// Discover configuration files in order of precedence
fn discover_config_files() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Ok(env_path) = env::var("ADDONMGR_CONFIG") {
        paths.push(PathBuf::from(env_path));
    }
    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("addonmgr").join("config.toml"));
    }
    if let Some(home_dir) = dirs::home_dir() {
        paths.push(home_dir.join(".addonmgr.toml"));
    }
    paths.push(PathBuf::from("./.addonmgr.toml"));

    debug!("Config discovery paths: {:?}", paths);
    paths
}

fn expand_home(value: &str) -> PathBuf {
    match (value.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(value),
    }
}

/// Parse TOML content to string-based configuration
fn parse_toml_config(content: &str) -> Result<Configuration> {
    let toml_value: Value = content.parse().context("Failed to parse TOML content")?;

    let mut config = Configuration::new();
    if let Value::Table(table) = toml_value {
        flatten_toml_table(&table, String::new(), &mut config);
    }

    debug!("Parsed configuration: {:?}", config);
    Ok(config)
}

/// Flatten nested tables into `section.subsection` names
///
/// Top-level scalars land in the `base` section.
fn flatten_toml_table(table: &toml::Table, prefix: String, config: &mut Configuration) {
    for (key, value) in table {
        match value {
            Value::Table(subtable) => {
                let section_name = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", prefix, key)
                };
                let section = config.entry(section_name.clone()).or_default();
                for (subkey, subvalue) in subtable {
                    if !matches!(subvalue, Value::Table(_)) {
                        section.insert(subkey.clone(), toml_value_to_string(subvalue));
                    }
                }
                let nested: toml::Table = subtable
                    .iter()
                    .filter(|(_, v)| matches!(v, Value::Table(_)))
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect();
                if !nested.is_empty() {
                    flatten_toml_table(&nested, section_name, config);
                }
            }
            _ => {
                let section = if prefix.is_empty() { "base".to_string() } else { prefix.clone() };
                config
                    .entry(section)
                    .or_default()
                    .insert(key.clone(), toml_value_to_string(value));
            }
        }
    }
}

/// Convert TOML Value to string representation
fn toml_value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Integer(i) => i.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Boolean(b) => b.to_string(),
        Value::Array(items) => items
            .iter()
            .map(toml_value_to_string)
            .collect::<Vec<_>>()
            .join(","),
        other => other.to_string(),
    }
}
