use std::io;
use std::process;
use anyhow::Result;
use log::{debug, error};
use addonmgr::addon::{AddonError, HookCatalog};
use addonmgr::{app, cli, logging};

fn main() {
    if let Err(e) = run() {
        // Rejected lifecycle operations are user errors and were already logged
        // at warn level; anything else is reported as an application error
        match e.downcast_ref::<AddonError>() {
            Some(addon_error) if addon_error.is_dependency_error() || addon_error.is_lifecycle_error() => {
                eprintln!("{}", e);
            }
            _ => {
                error!("Application error: {:#}", e);
                eprintln!("Error: {:#}", e);
            }
        }
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let args = cli::parse_args();
    cli::validate_args(&args)?;

    let config_manager = app::load_configuration(&args)?;
    let log_config = app::configure_logging(&args, &config_manager)?;
    logging::init_logger(log_config)?;
    debug!("Parsed CLI arguments: {:?}", args);

    let settings = app::resolve_addon_settings(&args, &config_manager)?;
    let manager = app::build_manager(&settings, &HookCatalog::with_logging_fallback())?;
    let colours = app::create_colour_manager(&args, &config_manager);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    app::run_command(&args.command, &manager, &colours, &mut out)
}
