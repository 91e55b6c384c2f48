use clap::{Parser, Subcommand};
use anyhow::Result;
use std::path::PathBuf;
use log::debug;

/// Addon lifecycle manager
#[derive(Parser, Debug)]
#[command(name = "addonmgr")]
#[command(about = "Discover addons, resolve their dependencies, and install, activate, update or remove them")]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Verbose output (debug level logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Quiet output (error level logging only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Debug output (trace level logging)
    #[arg(long, global = true)]
    pub debug: bool,

    /// Log format: text or json
    #[arg(long, value_name = "FORMAT", global = true)]
    pub log_format: Option<String>,

    /// Log file path for file output
    #[arg(long, value_name = "FILE", global = true)]
    pub log_file: Option<PathBuf>,

    /// Log level for file output (independent of console level)
    #[arg(long, value_name = "LEVEL", global = true)]
    pub log_file_level: Option<String>,

    /// Configuration file path
    #[arg(long, value_name = "FILE", global = true)]
    pub config_file: Option<PathBuf>,

    /// Directory scanned for addon manifests
    #[arg(long, value_name = "DIR", global = true)]
    pub addons_dir: Option<PathBuf>,

    /// Activation store file
    #[arg(long, value_name = "FILE", global = true)]
    pub store: Option<PathBuf>,

    /// Disable coloured output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// List discovered addons and their state
    List,
    /// Show one addon in detail
    Status { id: String },
    /// Install an addon
    Install { id: String },
    /// Uninstall an inactive addon
    Uninstall { id: String },
    /// Activate an installed addon
    Activate { id: String },
    /// Deactivate an active addon
    Deactivate { id: String },
    /// Update an installed addon to the discovered version
    Update { id: String },
    /// Register and boot every active addon
    Boot,
}

impl Command {
    /// Addon id the command targets, if any
    pub fn target(&self) -> Option<&str> {
        match self {
            Command::List | Command::Boot => None,
            Command::Status { id }
            | Command::Install { id }
            | Command::Uninstall { id }
            | Command::Activate { id }
            | Command::Deactivate { id }
            | Command::Update { id } => Some(id),
        }
    }
}

/// Parse command line arguments
pub fn parse_args() -> Args {
    Args::parse()
}

/// Validate CLI argument combinations
pub fn validate_args(args: &Args) -> Result<()> {
    debug!("Validating CLI argument combinations");

    let log_flags_count = [args.verbose, args.quiet, args.debug]
        .iter()
        .filter(|&&flag| flag)
        .count();

    if log_flags_count > 1 {
        return Err(anyhow::anyhow!(
            "Conflicting log level flags: only one of --verbose, --quiet, or --debug may be specified"
        ));
    }

    if let Some(ref format) = args.log_format {
        match format.to_lowercase().as_str() {
            "text" | "json" => {}
            _ => {
                return Err(anyhow::anyhow!(
                    "Invalid log format '{}'. Valid options: text, json",
                    format
                ))
            }
        }
    }

    if let Some(ref level) = args.log_file_level {
        crate::logging::parse_log_level(level)
            .map_err(|_| anyhow::anyhow!("Invalid log file level '{}'. Valid levels: error, warn, info, debug, trace", level))?;
    }

    if args.log_file_level.is_some() && args.log_file.is_none() {
        return Err(anyhow::anyhow!("--log-file-level requires --log-file to be specified"));
    }

    if let Some(id) = args.command.target() {
        if id.trim().is_empty() {
            return Err(anyhow::anyhow!("Addon id must not be empty"));
        }
    }

    Ok(())
}
