//! # Terminal Output
//!
//! Controls how the CLI reports builds: whether status lines carry emoji and
//! colors, decided from the `--color` flag and the environment.
//!
//! In `auto` mode the usual conventions are honored:
//! - `NO_COLOR` disables colors when set (per https://no-color.org/)
//! - `CLICOLOR=0` disables colors, `CLICOLOR_FORCE=1` forces them
//! - `TERM=dumb` disables colors
//!
//! ```rust,ignore
//! use packweave::output::{emoji, OutputConfig};
//!
//! let out = OutputConfig::from_env_and_flag("auto");
//! println!("{} Bundling...", emoji(&out, "📦", "[BUILD]"));
//! ```

use std::env;

use console::style;

/// Output configuration for controlling colors and emojis.
#[derive(Debug, Clone)]
pub struct OutputConfig {
    /// Whether colors and emojis should be used in output.
    pub use_color: bool,
}

/// Kind of status line, which picks its color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    Warning,
    Failure,
    Info,
}

impl OutputConfig {
    /// Create an output configuration from the `--color` flag value
    /// ("always", "never" or "auto").
    pub fn from_env_and_flag(color_flag: &str) -> Self {
        let use_color = match color_flag.to_lowercase().as_str() {
            "always" => true,
            "never" => false,
            _ => Self::detect_color_support(),
        };

        Self { use_color }
    }

    fn detect_color_support() -> bool {
        // Presence alone disables colors, even when empty
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

        console::Term::stdout().features().colors_supported()
    }

    /// Format a status line: emoji or plain tag, then the colored message.
    pub fn status(&self, status: Status, message: &str) -> String {
        let (icon, tag) = match status {
            Status::Success => ("✅", "[OK]"),
            Status::Warning => ("⚠️", "[WARN]"),
            Status::Failure => ("❌", "[ERR]"),
            Status::Info => ("📦", "[BUILD]"),
        };
        let prefix = emoji(self, icon, tag);
        if !self.use_color {
            return format!("{} {}", prefix, message);
        }
        let message = match status {
            Status::Success => style(message).green(),
            Status::Warning => style(message).yellow(),
            Status::Failure => style(message).red().bold(),
            Status::Info => style(message).cyan(),
        }
        .force_styling(true);
        format!("{} {}", prefix, message)
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

/// The emoji when colors are enabled, the plain text otherwise.
pub fn emoji<'a>(config: &OutputConfig, emoji_str: &'a str, plain: &'a str) -> &'a str {
    if config.use_color {
        emoji_str
    } else {
        plain
    }
}
