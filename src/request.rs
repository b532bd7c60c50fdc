//! Build requests
//!
//! A `BuildRequest` is everything a caller decides for one build: the entry
//! points, where the bundle goes, extra fragments and the optimize/watch
//! switches. Validation happens before any file is touched.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::fragment::Fragment;

/// Output directory and public URL split
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputPaths {
    /// Directory a relative output path is resolved against
    pub local: Option<PathBuf>,
    /// URL prefix the bundle is served under
    pub public: Option<String>,
}

/// Minimizer switches used when optimizing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MinimizerOptions {
    pub mangle: bool,
    pub beautify: bool,
}

impl Default for MinimizerOptions {
    fn default() -> Self {
        Self {
            mangle: true,
            beautify: false,
        }
    }
}

/// One build or watch invocation
#[derive(Debug, Clone, Default)]
pub struct BuildRequest {
    /// Entry points; required and non-empty.
    pub main: Option<Vec<String>>,
    /// Bundle file path; defaults to the settings' cache location.
    pub output: Option<PathBuf>,
    pub paths: OutputPaths,
    /// Caller overrides, merged after the optimizer fragment.
    pub configs: Vec<Fragment>,
    /// Include the minimizer fragment.
    pub optimize: bool,
    /// Run as a watch session instead of a single build.
    pub watch: bool,
    pub minimizer: MinimizerOptions,
    /// Ask the bundler to record per-module timings.
    pub profile: bool,
    /// Emit a stats sidecar next to the bundle.
    pub stats: bool,
}

impl BuildRequest {
    pub fn new<I, S>(main: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            main: Some(main.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    /// The entry points, or `MissingEntryPoint` when there are none.
    pub fn entries(&self) -> Result<&[String]> {
        match self.main.as_deref() {
            Some(entries) if !entries.is_empty() => Ok(entries),
            _ => Err(Error::MissingEntryPoint),
        }
    }

    /// Absolute bundle path.
    ///
    /// A relative output is resolved against `paths.local` when set, then
    /// against `project_root`.
    pub fn output_path(&self, default_output: &Path, project_root: &Path) -> PathBuf {
        let output = self
            .output
            .clone()
            .unwrap_or_else(|| default_output.to_path_buf());
        let output = match (&self.paths.local, output.is_absolute()) {
            (Some(local), false) => local.join(output),
            _ => output,
        };
        if output.is_absolute() {
            path_clean::clean(output)
        } else {
            path_clean::clean(project_root.join(output))
        }
    }
}
