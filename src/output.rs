//! # Output Configuration
//!
//! Controls how the CLI renders lifecycle events and errors on stderr.
//!
//! ## Respecting User Preferences
//!
//! The module respects the following environment variables and flags:
//! - `--color=never|always|auto` - CLI flag for color control
//! - `NO_COLOR` - Disables colors when set (per https://no-color.org/)
//! - `CLICOLOR=0` - Disables colors
//! - `CLICOLOR_FORCE=1` - Forces colors even in non-TTY
//! - `TERM=dumb` - Disables colors for dumb terminals
//!
//! ## Format
//!
//! Info events print as `> message` in cyan, warnings as `! message` in
//! magenta, and a fatal error as `! message` in red. Messages refer to
//! library options as `options.force`; on the command line that becomes
//! `--force`.

use std::env;

use console::Color;

use crate::events::{Event, Level, Listener};

/// Output configuration for controlling colors.
#[derive(Debug, Clone)]
pub struct OutputConfig {
    /// Whether colors should be used in output.
    pub use_color: bool,
}

impl OutputConfig {
    /// Create an output configuration from environment and CLI flag.
    ///
    /// # Behavior
    /// - `--color=always`: Force colors on (overrides NO_COLOR)
    /// - `--color=never`: Force colors off
    /// - `--color=auto`: Detect based on environment
    pub fn from_env_and_flag(color_flag: &str) -> Self {
        let use_color = match color_flag.to_lowercase().as_str() {
            "always" => true,
            "never" => false,
            _ => Self::detect_color_support(),
        };

        Self { use_color }
    }

    /// Detect whether color output is supported based on environment.
    fn detect_color_support() -> bool {
        // The presence of the variable (even if empty) disables colors
        if env::var_os("NO_COLOR").is_some() {
            return false;
        }

        if env::var("CLICOLOR").is_ok_and(|v| v == "0") {
            return false;
        }

        if env::var("CLICOLOR_FORCE").is_ok_and(|v| v != "0" && !v.is_empty()) {
            return true;
        }

        if env::var("TERM").is_ok_and(|v| v == "dumb") {
            return false;
        }

        // Everything is written to stderr
        console::Term::stderr().features().colors_supported()
    }

    #[cfg(test)]
    pub fn with_color() -> Self {
        Self { use_color: true }
    }

    #[cfg(test)]
    pub fn without_color() -> Self {
        Self { use_color: false }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self::from_env_and_flag("auto")
    }
}

fn paint(config: &OutputConfig, text: String, color: Color) -> String {
    if config.use_color {
        console::style(text).fg(color).force_styling(true).to_string()
    } else {
        text
    }
}

fn cli_wording(message: &str) -> String {
    message.replace("options.", "--")
}

/// Render an event as a single console line.
pub fn render_event(config: &OutputConfig, event: &Event) -> String {
    let message = cli_wording(&event.message);
    match event.level {
        Level::Info => paint(config, format!("> {}", message), Color::Cyan),
        Level::Warn => paint(config, format!("! {}", message), Color::Magenta),
    }
}

/// Render a fatal error as a single console line.
pub fn render_error(config: &OutputConfig, message: &str) -> String {
    paint(config, format!("! {}", cli_wording(message)), Color::Red)
}

/// Prints every event to stderr.
#[derive(Debug, Clone)]
pub struct ConsoleListener {
    config: OutputConfig,
}

impl ConsoleListener {
    pub fn new(config: OutputConfig) -> Self {
        Self { config }
    }
}

impl Listener for ConsoleListener {
    fn on_event(&self, event: &Event) {
        eprintln!("{}", render_event(&self.config, event));
    }
}
