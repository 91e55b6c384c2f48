//! Colour handling for CLI output
//!
//! Honours `NO_COLOR` and `--no-color`; when disabled every helper returns
//! the text unchanged.

use std::env;
use colored::{ColoredString, Colorize};
use crate::addon::AddonState;

/// Applies the CLI colour scheme, or nothing when colours are off
#[derive(Debug, Clone, Copy)]
pub struct ColourManager {
    enabled: bool,
}

impl ColourManager {
    /// Colours on unless `NO_COLOR` is set
    pub fn new() -> Self {
        Self::with_colours(env::var_os("NO_COLOR").is_none())
    }

    /// Explicit colour control
    pub fn with_colours(enabled: bool) -> Self {
        Self { enabled }
    }

    /// `--no-color` beats the config file, which beats the environment
    pub fn from_args(no_color_flag: bool, configured: Option<bool>) -> Self {
        if no_color_flag {
            return Self::with_colours(false);
        }
        match configured {
            Some(enabled) => Self::with_colours(enabled),
            None => Self::new(),
        }
    }

    pub fn colours_enabled(&self) -> bool {
        self.enabled
    }

    pub fn error(&self, text: &str) -> ColoredString {
        self.paint(text, |t| t.red().bold())
    }

    pub fn warning(&self, text: &str) -> ColoredString {
        self.paint(text, |t| t.yellow())
    }

    pub fn success(&self, text: &str) -> ColoredString {
        self.paint(text, |t| t.green())
    }

    pub fn highlight(&self, text: &str) -> ColoredString {
        self.paint(text, |t| t.cyan().bold())
    }

    pub fn dim(&self, text: &str) -> ColoredString {
        self.paint(text, |t| t.bright_black())
    }

    /// Lifecycle state label: active green, installed yellow, discovered dim
    pub fn state(&self, state: AddonState) -> ColoredString {
        let label = state.to_string();
        match state {
            AddonState::Active => self.success(&label),
            AddonState::Installed => self.warning(&label),
            AddonState::Discovered => self.dim(&label),
        }
    }

    fn paint<F>(&self, text: &str, style: F) -> ColoredString
    where
        F: FnOnce(&str) -> ColoredString,
    {
        if self.enabled {
            style(text)
        } else {
            text.normal()
        }
    }
}

impl Default for ColourManager {
    fn default() -> Self {
        Self::new()
    }
}
