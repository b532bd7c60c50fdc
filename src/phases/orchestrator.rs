//! Orchestrator for the complete build operation
//!
//! This module coordinates all phases to provide a clean API for a build:
//! validate the request, discover package fragments, compose the
//! configuration, then hand it to the bundler once or as a watch session.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use indicatif::HumanBytes;
use log::{error, info, warn};

use super::composite::Composer;
use super::discovery;
use crate::bundler::Bundler;
use crate::defaults;
use crate::error::{Error, Result};
use crate::fragment::{ComposedConfig, Fragment, FragmentSource};
use crate::registry::ConfigRegistry;
use crate::request::BuildRequest;
use crate::settings::Settings;
use crate::watch::WatchSession;

/// What a successful build produced
#[derive(Debug, Clone, PartialEq)]
pub struct BuildSummary {
    /// Bundle path named by the configuration
    pub output: Option<PathBuf>,
    /// Bundle size in bytes, if the file exists
    pub size: Option<u64>,
    pub elapsed: Duration,
    /// Warnings reported by the bundler
    pub warnings: Vec<String>,
}

/// Result of [`execute`]
pub enum Outcome {
    /// A single build finished
    Built(BuildSummary),
    /// A watch session is running
    Watching(WatchSession),
}

/// Execute the complete build operation
///
/// 1. Validate the request (no I/O happens for an invalid request)
/// 2. Discover package aliases and overrides
/// 3. Compose the configuration
/// 4. Build once, or start a watch session when `request.watch` is set
pub fn execute(
    request: &BuildRequest,
    settings: &Settings,
    registry: &ConfigRegistry,
    bundler: Arc<dyn Bundler>,
) -> Result<Outcome> {
    let config = prepare(request, settings, registry)?;

    if request.watch {
        let paths = watch_paths(request, settings);
        let mut ignore = ignore_paths(&config);
        ignore.push(settings.cache_dir());
        let debounce = Duration::from_millis(settings.watch.debounce_ms);
        WatchSession::start(bundler, config, &paths, &ignore, debounce).map(Outcome::Watching)
    } else {
        build(bundler.as_ref(), &config).map(Outcome::Built)
    }
}

/// Run Phases 1-2 and return the composed configuration.
pub fn prepare(
    request: &BuildRequest,
    settings: &Settings,
    registry: &ConfigRegistry,
) -> Result<ComposedConfig> {
    let entries = request.entries()?;
    info!("Composing configuration for: {}", entries.join(", "));

    let mut request = request.clone();
    if !settings.configs.is_empty() {
        let mut configs = load_fragment_files(&settings.configs)?;
        configs.append(&mut request.configs);
        request.configs = configs;
    }

    let resolved = discovery::execute(
        &settings.packages,
        &settings.dependency_root(),
        request.watch,
    )?;
    Composer::new(settings, registry).compose(&request, &resolved)
}

/// Start a watch session over `watch_paths` with the default debounce.
///
/// Writes into the bundle's output directory never trigger a rebuild.
pub fn watch(
    bundler: Arc<dyn Bundler>,
    config: ComposedConfig,
    watch_paths: &[PathBuf],
) -> Result<WatchSession> {
    let debounce = Duration::from_millis(defaults::default_debounce_ms());
    let ignore = ignore_paths(&config);
    WatchSession::start(bundler, config, watch_paths, &ignore, debounce)
}

/// Submit a configuration to the bundler once.
///
/// Compile errors are aggregated into one `Error::Build`; warnings are logged
/// and never fail the build.
pub fn build(bundler: &dyn Bundler, config: &ComposedConfig) -> Result<BuildSummary> {
    let start = Instant::now();
    info!("Bundling with {}...", bundler.name());

    let stats = bundler.run(config).inspect_err(|err| {
        error!("Bundler error: {}", err);
    })?;

    for warning in &stats.warnings {
        warn!("Bundler warning: {}", warning);
    }
    if stats.has_errors() {
        error!("Bundler errors:\n{}", stats.errors.join("\n"));
        return Err(Error::Build {
            errors: stats.errors,
        });
    }

    let output = output_file(config);
    let size = output
        .as_deref()
        .and_then(|path| fs::metadata(path).ok())
        .map(|metadata| metadata.len());
    let elapsed = start.elapsed();

    info!(
        "Build complete ({}) in {}ms. Written to: {}",
        size.map(|bytes| HumanBytes(bytes).to_string())
            .unwrap_or_else(|| "size unknown".to_string()),
        elapsed.as_millis(),
        output
            .as_deref()
            .map(|path| path.display().to_string())
            .unwrap_or_else(|| "(unspecified)".to_string())
    );

    Ok(BuildSummary {
        output,
        size,
        elapsed,
        warnings: stats.warnings,
    })
}

/// The bundle path named by `output.path` and `output.filename`.
pub fn output_file(config: &ComposedConfig) -> Option<PathBuf> {
    let dir = config.get("output.path")?.as_str()?;
    let filename = config.get("output.filename")?.as_str()?;
    Some(Path::new(dir).join(filename))
}

/// Directories a watch session must not react to: the bundle output directory.
pub fn ignore_paths(config: &ComposedConfig) -> Vec<PathBuf> {
    output_file(config)
        .and_then(|out| out.parent().map(Path::to_path_buf))
        .into_iter()
        .collect()
}

/// Load fragment files in order.
pub fn load_fragment_files(paths: &[PathBuf]) -> Result<Vec<Fragment>> {
    paths
        .iter()
        .map(|path| Fragment::from_json_file(FragmentSource::Caller, path))
        .collect()
}

/// Directories whose changes trigger a rebuild: package roots, extra module
/// directories and the directories of entry files that exist on disk.
pub fn watch_paths(request: &BuildRequest, settings: &Settings) -> Vec<PathBuf> {
    let entry_dirs = request
        .main
        .iter()
        .flatten()
        .map(|entry| settings.project_root.join(entry))
        .filter(|path| path.is_file())
        .filter_map(|path| path.parent().map(Path::to_path_buf));

    let mut paths: Vec<PathBuf> = Vec::new();
    for path in settings
        .packages
        .iter()
        .map(|pkg| pkg.path.clone())
        .chain(settings.module_dirs.iter().cloned())
        .chain(entry_dirs)
    {
        let path = path_clean::clean(path);
        if path.exists() && !paths.contains(&path) {
            paths.push(path);
        }
    }
    paths
}
