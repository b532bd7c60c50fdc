//! Build command implementation
//!
//! The build command runs the whole pipeline:
//! 1. Load settings and turn the flags into a build request
//! 2. Discover package aliases and overrides
//! 3. Compose the bundler configuration
//! 4. Run the bundler once, or keep rebuilding with `--watch`

use anyhow::Result;
use clap::Args;
use indicatif::HumanBytes;
use std::sync::Arc;

use packweave::bundler::CommandBundler;
use packweave::output::{OutputConfig, Status};
use packweave::phases::orchestrator::{self, BuildSummary, Outcome};
use packweave::registry::ConfigRegistry;
use packweave::watch::BuildEvent;

use super::RequestArgs;

/// Arguments for the build command
#[derive(Args, Debug)]
pub struct BuildArgs {
    #[command(flatten)]
    pub request: RequestArgs,

    /// Suppress all output except errors
    #[arg(short, long)]
    pub quiet: bool,
}

/// Execute the build command
pub fn execute(args: BuildArgs, color_flag: &str) -> Result<()> {
    let out = OutputConfig::from_env_and_flag(color_flag);
    let settings = args.request.load_settings()?;
    let request = args.request.to_request()?;
    let registry = ConfigRegistry::new();
    let bundler = Arc::new(CommandBundler::from_settings(
        &settings.bundler,
        &settings.cache_dir(),
    ));

    if !args.quiet {
        println!(
            "{}",
            out.status(
                Status::Info,
                &format!("Bundling with {}", settings.bundler.command)
            )
        );
    }

    match orchestrator::execute(&request, &settings, &registry, bundler) {
        Ok(Outcome::Built(summary)) => {
            if !args.quiet {
                report_summary(&out, &summary);
            }
            Ok(())
        }
        Ok(Outcome::Watching(session)) => {
            if !args.quiet {
                println!(
                    "{}",
                    out.status(Status::Info, "Watching for changes (Ctrl-C to stop)")
                );
            }
            session.for_each(|event| report_event(&out, &event, args.quiet));
            Ok(())
        }
        Err(e) => {
            if !args.quiet {
                println!("{}", out.status(Status::Failure, "Build failed"));
            }
            Err(e.into())
        }
    }
}

fn report_summary(out: &OutputConfig, summary: &BuildSummary) {
    let size = summary
        .size
        .map(|bytes| format!(" ({})", HumanBytes(bytes)))
        .unwrap_or_default();
    println!(
        "{}",
        out.status(
            Status::Success,
            &format!(
                "Built{} in {:.2}s",
                size,
                summary.elapsed.as_secs_f64()
            )
        )
    );
    if let Some(output) = &summary.output {
        println!("   Written to: {}", output.display());
    }
    if !summary.warnings.is_empty() {
        println!(
            "{}",
            out.status(
                Status::Warning,
                &format!("{} warning(s)", summary.warnings.len())
            )
        );
        for warning in &summary.warnings {
            println!("   {}", warning);
        }
    }
}

/// Watch-mode failures are reported and the session keeps running.
fn report_event(out: &OutputConfig, event: &BuildEvent, quiet: bool) {
    match &event.result {
        Ok(summary) => {
            if !quiet {
                if event.sequence > 0 {
                    println!("{}", out.status(Status::Info, &format!("Rebuild #{}", event.sequence)));
                }
                report_summary(out, summary);
            }
        }
        Err(e) => {
            eprintln!("{}", out.status(Status::Failure, &e.to_string()));
        }
    }
}
