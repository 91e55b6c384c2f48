//! Application initialization and configuration

use std::str::FromStr;
use std::sync::Arc;
use anyhow::{Context, Result};
use log::{debug, LevelFilter};
use crate::addon::{AddonManager, AddonRegistry, FileBasedDiscovery, HookCatalog, JsonFileActivationStore};
use crate::config::{AddonSettings, ConfigManager};
use crate::{cli, display, logging};

pub fn load_configuration(args: &cli::Args) -> Result<ConfigManager> {
    match &args.config_file {
        Some(config_file) => {
            debug!("Loading configuration from explicit file: {}", config_file.display());
            ConfigManager::load_from_file(config_file.clone())
        }
        None => ConfigManager::load(),
    }
}

/// Logging configuration: CLI flags first, then `[base]` settings, then defaults
pub fn configure_logging(args: &cli::Args, config: &ConfigManager) -> Result<logging::LogConfig> {
    let console_level = if args.debug {
        LevelFilter::Trace
    } else if args.verbose {
        LevelFilter::Debug
    } else if args.quiet {
        LevelFilter::Error
    } else {
        config
            .get_log_level("base", "console-level")
            .context("Invalid base.console-level in configuration")?
            .unwrap_or(LevelFilter::Info)
    };

    let format = match args.log_format.as_deref().or_else(|| config.get_value("base", "log-format").map(String::as_str)) {
        Some(format) => logging::LogFormat::from_str(format).map_err(|e| anyhow::anyhow!(e))?,
        None => logging::LogFormat::Text,
    };

    let log_file = args.log_file.clone().or_else(|| config.get_path("base", "log-file"));
    let file_level = match &args.log_file_level {
        Some(level) => Some(logging::parse_log_level(level)?),
        None => config
            .get_log_level("base", "file-log-level")
            .context("Invalid base.file-log-level in configuration")?,
    };

    let destination = match log_file {
        Some(path) => logging::LogDestination::Both(path),
        None => logging::LogDestination::Console,
    };

    Ok(logging::LogConfig {
        console_level,
        file_level,
        format,
        destination,
    })
}

/// Create a ColourManager from CLI arguments and the `base.color` setting
pub fn create_colour_manager(args: &cli::Args, config: &ConfigManager) -> display::ColourManager {
    let configured = config.get_bool("base", "color").ok().flatten();
    display::ColourManager::from_args(args.no_color, configured)
}

/// Addon settings with `--addons-dir` and `--store` applied over the configuration
pub fn resolve_addon_settings(args: &cli::Args, config: &ConfigManager) -> Result<AddonSettings> {
    let mut settings = config.addon_settings()?;
    if let Some(dir) = &args.addons_dir {
        settings.directory = dir.clone();
    }
    if let Some(store) = &args.store {
        settings.store = store.clone();
    }
    Ok(settings)
}

/// Discover addons and open the activation store
pub fn build_manager(settings: &AddonSettings, catalog: &HookCatalog) -> Result<AddonManager> {
    let discovery = FileBasedDiscovery::new(&settings.directory)
        .with_context(|| format!("Cannot use addon directory {}", settings.directory.display()))?
        .with_manifest_names(settings.manifest_names.clone());

    let registry = AddonRegistry::discover(&discovery, catalog).context("Addon discovery failed")?;

    let store = JsonFileActivationStore::open(&settings.store)
        .with_context(|| format!("Cannot open activation store {}", settings.store.display()))?;

    Ok(AddonManager::new(Arc::new(registry), Arc::new(store)))
}
