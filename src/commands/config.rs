//! # Config Command Implementation
//!
//! Composes the bundler configuration for a request and prints it as JSON
//! without running the bundler. Useful for checking which package overrides
//! and fragments ended up in the final configuration.
//!
//! This command is read-only unless `--write` is given.

use anyhow::{Context, Result};
use clap::Args;
use std::fs;
use std::path::PathBuf;

use packweave::output::{OutputConfig, Status};
use packweave::phases::orchestrator;
use packweave::registry::ConfigRegistry;

use super::RequestArgs;

/// Print the composed bundler configuration
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(flatten)]
    pub request: RequestArgs,

    /// Write the configuration to a file instead of stdout
    #[arg(long, value_name = "FILE")]
    pub write: Option<PathBuf>,

    /// List the layers that were merged, in order
    #[arg(long)]
    pub sources: bool,
}

/// Execute the `config` command.
pub fn execute(args: ConfigArgs, color_flag: &str) -> Result<()> {
    let out = OutputConfig::from_env_and_flag(color_flag);
    let settings = args.request.load_settings()?;
    let request = args.request.to_request()?;

    let config = orchestrator::prepare(&request, &settings, &ConfigRegistry::new())?;
    let json = config.to_json_pretty()?;

    match &args.write {
        Some(path) => {
            fs::write(path, &json)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!(
                "{}",
                out.status(
                    Status::Success,
                    &format!("Configuration written to {}", path.display())
                )
            );
        }
        None => println!("{}", json),
    }

    if args.sources {
        let layers: Vec<String> = config.sources().iter().map(|s| s.to_string()).collect();
        eprintln!("Layers: {}", layers.join(" -> "));
    }
    Ok(())
}
