//! Command execution against the addon manager

use std::io::Write;
use anyhow::Result;
use log::debug;
use crate::addon::{AddonManager, Outcome};
use crate::cli::Command;
use crate::display::{self, ColourManager};

/// Run one CLI command, writing user-facing output to `out`
pub fn run_command(command: &Command, manager: &AddonManager, colours: &ColourManager, out: &mut dyn Write) -> Result<()> {
    debug!("Executing command: {:?}", command);

    match command {
        Command::List => {
            let statuses = manager.statuses()?;
            write!(out, "{}", display::format_status_table(&statuses, colours))?;
        }
        Command::Status { id } => {
            let state = manager.state(id)?;
            let record = manager.store().get(id)?;
            let descriptor = manager
                .registry()
                .get(id)
                .ok_or_else(|| anyhow::anyhow!("Addon '{}' vanished from the registry", id))?;

            writeln!(out, "{} ({})", colours.highlight(descriptor.id()), descriptor.name())?;
            writeln!(out, "  state:     {}", colours.state(state))?;
            writeln!(out, "  available: {}", descriptor.version())?;
            if let Some(record) = record {
                writeln!(out, "  installed: {} at {}", record.installed_version, record.installed_at.format("%Y-%m-%d %H:%M:%S"))?;
            }
            if !descriptor.dependencies().is_empty() {
                let deps: Vec<String> = descriptor
                    .dependencies()
                    .iter()
                    .map(|d| format!("{} {}", d.id, d.constraint))
                    .collect();
                writeln!(out, "  requires:  {}", deps.join(", "))?;
            }
        }
        Command::Install { id } => report(out, colours, id, "installed", manager.install(id)?)?,
        Command::Uninstall { id } => report(out, colours, id, "uninstalled", manager.uninstall(id)?)?,
        Command::Activate { id } => report(out, colours, id, "activated", manager.activate(id)?)?,
        Command::Deactivate { id } => report(out, colours, id, "deactivated", manager.deactivate(id)?)?,
        Command::Update { id } => report(out, colours, id, "updated", manager.update(id)?)?,
        Command::Boot => {
            let booted = manager.start()?;
            if booted.is_empty() {
                writeln!(out, "No active addons to boot")?;
            } else {
                writeln!(out, "{} {}", colours.success("Booted"), booted.join(", "))?;
            }
        }
    }
    Ok(())
}

fn report(out: &mut dyn Write, colours: &ColourManager, id: &str, verb: &str, outcome: Outcome) -> Result<()> {
    match outcome {
        Outcome::Applied => writeln!(out, "{} {}", colours.success(&capitalise(verb)), colours.highlight(id))?,
        Outcome::Unchanged => writeln!(out, "{} {}", colours.dim("Nothing to do:"), id)?,
    }
    Ok(())
}

fn capitalise(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
