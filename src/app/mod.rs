//! Application orchestration module

pub mod initialization;
pub mod execution;

pub use initialization::{
    load_configuration,
    configure_logging,
    create_colour_manager,
    resolve_addon_settings,
    build_manager,
};
pub use execution::run_command;
