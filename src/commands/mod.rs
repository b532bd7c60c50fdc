//! # CLI Command Implementations
//!
//! This module contains the implementation for each subcommand of the
//! `packweave` command-line tool. Each subcommand is defined in its own file.
//!
//! Each command module contains:
//! - An `Args` struct that defines the command-specific arguments and options,
//!   derived using `clap`.
//! - An `execute` function that takes the parsed `Args` and performs the
//!   command's logic by calling into the `packweave` library.
//!
//! Both commands describe a build the same way, so the request flags live in
//! [`RequestArgs`] and are flattened into each command.

pub mod build;
pub mod config;

use anyhow::{Context, Result};
use clap::{ArgAction, Args};
use std::path::PathBuf;

use packweave::defaults::SETTINGS_FILE;
use packweave::phases::orchestrator;
use packweave::request::{BuildRequest, MinimizerOptions, OutputPaths};
use packweave::settings::{self, Settings};

/// Flags describing one build request
#[derive(Args, Debug, Clone)]
pub struct RequestArgs {
    /// Entry point(s) of the bundle
    #[arg(short, long, value_name = "ENTRY", num_args = 1..)]
    pub main: Vec<String>,

    /// Bundle file path (defaults to main.min.js in the cache directory)
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// URL prefix the bundle is served under
    #[arg(long, value_name = "URL")]
    pub public_path: Option<String>,

    /// Directory a relative --output is resolved against
    #[arg(long, value_name = "DIR")]
    pub local_path: Option<PathBuf>,

    /// Extra configuration fragment (JSON), merged in the order given
    #[arg(short = 'c', long = "config", value_name = "FRAGMENT")]
    pub configs: Vec<PathBuf>,

    /// Minify the bundle
    #[arg(long)]
    pub optimize: bool,

    /// Keep rebuilding on source changes
    #[arg(short, long)]
    pub watch: bool,

    /// Mangle names when minifying
    #[arg(long, value_name = "BOOL", default_value_t = true, action = ArgAction::Set)]
    pub uglify_mangle: bool,

    /// Pretty-print minified output
    #[arg(long, value_name = "BOOL", default_value_t = false, action = ArgAction::Set)]
    pub uglify_beautify: bool,

    /// Record per-module build timings
    #[arg(long)]
    pub profile: bool,

    /// Write a stats file next to the bundle
    #[arg(long)]
    pub stats: bool,

    /// Path to the settings file
    #[arg(short, long, value_name = "FILE", env = "PACKWEAVE_SETTINGS")]
    pub settings: Option<PathBuf>,

    /// Cache directory (overrides the settings file).
    ///
    /// If not provided, it defaults to the system's cache directory
    /// (e.g., `~/.cache/packweave` on Linux).
    #[arg(long, value_name = "DIR", env = "PACKWEAVE_CACHE")]
    pub cache_dir: Option<PathBuf>,
}

impl RequestArgs {
    /// Load the settings file named by `--settings`, or `.packweave.yaml` in
    /// the current directory when it exists.
    pub fn load_settings(&self) -> Result<Settings> {
        let mut loaded = match &self.settings {
            Some(path) => {
                if !path.exists() {
                    anyhow::bail!("Settings file not found: {}", path.display());
                }
                settings::from_file(path)?
            }
            None => {
                let default_path = PathBuf::from(SETTINGS_FILE);
                if default_path.exists() {
                    settings::from_file(&default_path)?
                } else {
                    let cwd = std::env::current_dir()
                        .context("Failed to get current directory")?;
                    Settings::default().resolve_relative_to(&cwd)
                }
            }
        };

        if let Some(cache_dir) = &self.cache_dir {
            loaded.cache_dir = Some(cache_dir.clone());
        }
        Ok(loaded)
    }

    /// Turn the flags into a library build request.
    pub fn to_request(&self) -> Result<BuildRequest> {
        let configs = orchestrator::load_fragment_files(&self.configs)?;
        Ok(BuildRequest {
            main: (!self.main.is_empty()).then(|| self.main.clone()),
            output: self.output.clone(),
            paths: OutputPaths {
                local: self.local_path.clone(),
                public: self.public_path.clone(),
            },
            configs,
            optimize: self.optimize,
            watch: self.watch,
            minimizer: MinimizerOptions {
                mangle: self.uglify_mangle,
                beautify: self.uglify_beautify,
            },
            profile: self.profile,
            stats: self.stats,
        })
    }
}
