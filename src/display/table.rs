//! Tabular output for addon listings

use prettytable::{format, Cell, Row, Table};
use crate::addon::AddonStatus;
use crate::display::ColourManager;

/// Format a compact table with headers and rows using the prettytable clean format
pub fn format_compact_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_CLEAN);
    table.set_titles(Row::new(headers.iter().map(|h| Cell::new(h)).collect()));

    for row in rows {
        table.add_row(Row::new(row.iter().map(|cell| Cell::new(cell)).collect()));
    }

    let mut result = String::new();
    for line in table.to_string().lines() {
        result.push_str("  ");
        result.push_str(line.trim_end());
        result.push('\n');
    }
    result
}

/// Table of every discovered addon for `addonmgr list`
pub fn format_status_table(statuses: &[AddonStatus], colours: &ColourManager) -> String {
    if statuses.is_empty() {
        return "No addons discovered.\n".to_string();
    }

    let rows: Vec<Vec<String>> = statuses
        .iter()
        .map(|s| {
            vec![
                s.id.clone(),
                s.name.clone(),
                s.available_version.clone(),
                s.installed_version.clone().unwrap_or_else(|| "-".to_string()),
                colours.state(s.state).to_string(),
            ]
        })
        .collect();

    format_compact_table(&["ID", "NAME", "AVAILABLE", "INSTALLED", "STATE"], &rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::addon::AddonState;

    fn status(id: &str, installed: Option<&str>, state: AddonState) -> AddonStatus {
        AddonStatus {
            id: id.to_string(),
            name: id.to_uppercase(),
            available_version: "1.1.0".to_string(),
            installed_version: installed.map(str::to_string),
            state,
        }
    }

    #[test]
    fn test_status_table_contents() {
        let colours = ColourManager::with_colours(false);
        let output = format_status_table(
            &[
                status("blog", Some("1.0.0"), AddonState::Active),
                status("shop", None, AddonState::Discovered),
            ],
            &colours,
        );

        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("ID") && lines[0].contains("STATE"));
        assert!(lines[1].contains("blog") && lines[1].contains("1.0.0") && lines[1].contains("active"));
        assert!(lines[2].contains("shop") && lines[2].contains("-") && lines[2].contains("discovered"));
        assert!(lines.iter().all(|l| l.starts_with("  ")));
    }

    #[test]
    fn test_empty_listing() {
        let output = format_status_table(&[], &ColourManager::with_colours(false));
        assert_eq!(output, "No addons discovered.\n");
    }
}
