// Logging for addonmgr
//
// A small logger behind the `log` facade:
// - text or JSON lines
// - console (stderr), a log file, or both
// - separate level thresholds for console and file
//
// ```
// let config = LogConfig {
//     console_level: LevelFilter::Info,
//     file_level: Some(LevelFilter::Debug),
//     format: LogFormat::Json,
//     destination: LogDestination::Both(PathBuf::from("addonmgr.log")),
// };
// init_logger(config)?;
// log::info!("Activated addon 'blog'");
// ```

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use anyhow::{Context, Result};
use chrono::Local;
use log::{Level, LevelFilter};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Log output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => Err(format!("Invalid log format: {}. Valid options: text, json", s)),
        }
    }
}

/// Log destination options
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogDestination {
    Console,
    File(PathBuf),
    Both(PathBuf),
}

impl LogDestination {
    fn file_path(&self) -> Option<&Path> {
        match self {
            LogDestination::Console => None,
            LogDestination::File(path) | LogDestination::Both(path) => Some(path),
        }
    }

    fn has_console(&self) -> bool {
        !matches!(self, LogDestination::File(_))
    }
}

/// One JSON log line
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonLogEntry {
    pub timestamp: String,
    pub level: String,
    pub target: String,
    pub message: String,
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub console_level: LevelFilter,
    pub file_level: Option<LevelFilter>,
    pub format: LogFormat,
    pub destination: LogDestination,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            console_level: LevelFilter::Info,
            file_level: None,
            format: LogFormat::Text,
            destination: LogDestination::Console,
        }
    }
}

impl LogConfig {
    /// Most verbose level any destination wants
    pub fn max_level(&self) -> LevelFilter {
        let console = if self.destination.has_console() {
            self.console_level
        } else {
            LevelFilter::Off
        };
        match (self.destination.file_path(), self.file_level) {
            (Some(_), Some(file_level)) => console.max(file_level),
            (Some(_), None) => console.max(self.console_level),
            (None, _) => console,
        }
    }

    fn file_threshold(&self) -> LevelFilter {
        self.file_level.unwrap_or(self.console_level)
    }
}

/// Logger writing formatted records to stderr and/or an append-only file
pub struct AddonLogger {
    config: LogConfig,
    file: Option<Mutex<File>>,
}

impl AddonLogger {
    /// Build the logger, opening the log file if one is configured
    pub fn new(config: LogConfig) -> Result<Self> {
        let file = match config.destination.file_path() {
            Some(path) => {
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .with_context(|| format!("Failed to open log file: {}", path.display()))?;
                Some(Mutex::new(file))
            }
            None => None,
        };
        Ok(Self { config, file })
    }

    fn format_timestamp() -> String {
        Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
    }

    fn format_text(&self, level: Level, target: &str, message: &str) -> String {
        format!(
            "{} [{:<5}] {}: {}",
            Self::format_timestamp(),
            level.as_str(),
            target,
            message
        )
    }

    fn format_json(&self, level: Level, target: &str, message: &str) -> Result<String> {
        let entry = JsonLogEntry {
            timestamp: Self::format_timestamp(),
            level: level.as_str().to_string(),
            target: target.to_string(),
            message: message.to_string(),
        };
        serde_json::to_string(&entry).context("Failed to serialize log entry")
    }

    fn format(&self, record: &log::Record) -> String {
        let message = record.args().to_string();
        let target = record.target();
        match self.config.format {
            LogFormat::Text => self.format_text(record.level(), target, &message),
            LogFormat::Json => self
                .format_json(record.level(), target, &message)
                .unwrap_or_else(|_| self.format_text(record.level(), target, &message)),
        }
    }

    fn console_wants(&self, level: Level) -> bool {
        self.config.destination.has_console() && level <= self.config.console_level
    }

    fn file_wants(&self, level: Level) -> bool {
        self.file.is_some() && level <= self.config.file_threshold()
    }
}

impl log::Log for AddonLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        self.console_wants(metadata.level()) || self.file_wants(metadata.level())
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = self.format(record);

        if self.file_wants(record.level()) {
            if let Some(file) = &self.file {
                if let Err(e) = writeln!(file.lock(), "{}", line) {
                    eprintln!("File logging error: {}", e);
                }
            }
        }
        if self.console_wants(record.level()) {
            let _ = writeln!(io::stderr(), "{}", line);
        }
    }

    fn flush(&self) {
        if let Some(file) = &self.file {
            let _ = file.lock().flush();
        }
        let _ = io::stderr().flush();
    }
}

/// Install the global logger
pub fn init_logger(config: LogConfig) -> Result<()> {
    let max_level = config.max_level();
    let logger = AddonLogger::new(config)?;

    log::set_boxed_logger(Box::new(logger)).context("Failed to set global logger")?;
    log::set_max_level(max_level);
    Ok(())
}

/// Convert string to LevelFilter
pub fn parse_log_level(level_str: &str) -> Result<LevelFilter> {
    match level_str.to_lowercase().as_str() {
        "error" => Ok(LevelFilter::Error),
        "warn" => Ok(LevelFilter::Warn),
        "info" => Ok(LevelFilter::Info),
        "debug" => Ok(LevelFilter::Debug),
        "trace" => Ok(LevelFilter::Trace),
        "off" => Ok(LevelFilter::Off),
        _ => Err(anyhow::anyhow!(
            "Invalid log level: {}. Valid levels: error, warn, info, debug, trace, off",
            level_str
        )),
    }
}
