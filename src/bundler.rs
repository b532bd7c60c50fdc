//! # External Bundler Interface
//!
//! packweave never bundles anything itself. A [`Bundler`] receives the
//! composed configuration and reports what happened as [`BundleStats`].
//!
//! [`CommandBundler`] is the implementation used by the CLI: it writes the
//! configuration to a JSON file, runs the configured command, and reads the
//! JSON stats the command prints on stdout.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use log::debug;
use serde::Deserialize;

use crate::defaults::BUNDLER_CONFIG_FILE;
use crate::error::{Error, Result};
use crate::fragment::ComposedConfig;
use crate::settings::BundlerSettings;

/// Placeholder in bundler arguments replaced by the config file path.
pub const CONFIG_PLACEHOLDER: &str = "{config}";

/// Outcome of one bundler run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BundleStats {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl BundleStats {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Something that can turn a composed configuration into a bundle
pub trait Bundler: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &str;

    /// Run one build. Compile errors belong in the returned stats; `Err` is
    /// reserved for failures to run the bundler at all.
    fn run(&self, config: &ComposedConfig) -> Result<BundleStats>;
}

/// Runs an external bundler command
#[derive(Debug, Clone)]
pub struct CommandBundler {
    command: String,
    args: Vec<String>,
    config_path: PathBuf,
}

/// Stats as printed by the bundler; messages may be strings or objects.
#[derive(Debug, Default, Deserialize)]
struct RawStats {
    #[serde(default)]
    errors: Vec<serde_json::Value>,
    #[serde(default)]
    warnings: Vec<serde_json::Value>,
}

impl CommandBundler {
    pub fn new(command: impl Into<String>, args: Vec<String>, work_dir: &Path) -> Self {
        Self {
            command: command.into(),
            args,
            config_path: work_dir.join(BUNDLER_CONFIG_FILE),
        }
    }

    pub fn from_settings(settings: &BundlerSettings, work_dir: &Path) -> Self {
        Self::new(settings.command.clone(), settings.args.clone(), work_dir)
    }

    /// Where the composed configuration is written before each run.
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    fn expanded_args(&self) -> Vec<String> {
        let config = self.config_path.to_string_lossy();
        self.args
            .iter()
            .map(|arg| arg.replace(CONFIG_PLACEHOLDER, &config))
            .collect()
    }

    fn write_config(&self, config: &ComposedConfig) -> Result<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.config_path, config.to_json_pretty()?)?;
        Ok(())
    }

    /// Stderr lines of a failed run, or the exit status when stderr is empty.
    fn failure_messages(&self, output: &Output) -> Vec<String> {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let mut errors: Vec<String> = stderr
            .lines()
            .map(str::trim_end)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();
        if errors.is_empty() {
            errors.push(format!("{} exited with {}", self.command, output.status));
        }
        errors
    }
}

impl Bundler for CommandBundler {
    fn name(&self) -> &str {
        &self.command
    }

    fn run(&self, config: &ComposedConfig) -> Result<BundleStats> {
        self.write_config(config)?;
        let args = self.expanded_args();
        debug!("Running bundler: {} {}", self.command, args.join(" "));

        let output = Command::new(&self.command)
            .args(&args)
            .output()
            .map_err(|err| Error::Bundler {
                command: self.command.clone(),
                message: format!("failed to start: {}", err),
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        match parse_stats(&stdout) {
            // A non-zero exit is a failed build even when the stats look clean.
            Some(mut stats) => {
                if !output.status.success() && !stats.has_errors() {
                    stats.errors = self.failure_messages(&output);
                }
                Ok(stats)
            }
            None if output.status.success() => {
                debug!("Bundler printed no stats; treating the run as clean");
                Ok(BundleStats::default())
            }
            None => Err(Error::Build {
                errors: self.failure_messages(&output),
            }),
        }
    }
}

/// Parse bundler stats JSON, accepting string or `{message}` entries.
pub fn parse_stats(text: &str) -> Option<BundleStats> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    let raw: RawStats = serde_json::from_str(trimmed).ok()?;
    Some(BundleStats {
        errors: raw.errors.iter().map(message_of).collect(),
        warnings: raw.warnings.iter().map(message_of).collect(),
    })
}

fn message_of(entry: &serde_json::Value) -> String {
    match entry {
        serde_json::Value::String(message) => message.clone(),
        serde_json::Value::Object(map) => match map.get("message") {
            Some(serde_json::Value::String(message)) => message.clone(),
            _ => entry.to_string(),
        },
        other => other.to_string(),
    }
}
