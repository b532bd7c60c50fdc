//! # Settings File Schema and Parsing
//!
//! This module defines the data structures that represent the `.packweave.yaml`
//! settings file and the logic for loading it. Settings describe the project
//! around a build: where dependencies live, which pseudo-packages exist, the
//! loader rules and polyfills of the base configuration, extra fragment files
//! and how to invoke the external bundler.
//!
//! ## Example
//!
//! ```yaml
//! project_root: .
//! packages:
//!   - manifest: components/package.json
//!     path: components
//! polyfills: [babel-polyfill]
//! module_dirs: [lib]
//! configs: [bundler/extra.json]
//! bundler:
//!   command: webpack
//!   args: ["--config", "{config}", "--json"]
//! watch:
//!   debounce_ms: 250
//! ```
//!
//! Relative paths are resolved against the directory containing the settings
//! file, so a project can be built from any working directory.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::defaults;
use crate::error::{Error, Result};
use crate::fragment::ConfigValue;
use crate::phases::PackageDescriptor;

/// Top-level settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Project root, used as the bundler context.
    #[serde(default = "default_project_root")]
    pub project_root: PathBuf,
    /// Top-level dependency directory. Defaults to `<project_root>/node_modules`.
    #[serde(default)]
    pub dependency_root: Option<PathBuf>,
    /// Cache directory for the default output and the bundler config file.
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,
    /// Pseudo-packages contributing aliases and overrides.
    #[serde(default)]
    pub packages: Vec<PackageDescriptor>,
    /// Entries prepended to the entry list of every build.
    #[serde(default = "defaults::default_polyfills")]
    pub polyfills: Vec<String>,
    /// Extra module search directories.
    #[serde(default)]
    pub module_dirs: Vec<PathBuf>,
    /// Loader rules of the base configuration.
    #[serde(default = "defaults::default_rules")]
    pub rules: Vec<ConfigValue>,
    /// Node polyfill switches.
    #[serde(default = "defaults::default_node")]
    pub node: IndexMap<String, bool>,
    /// Fragment files merged as caller overrides.
    #[serde(default)]
    pub configs: Vec<PathBuf>,
    #[serde(default)]
    pub bundler: BundlerSettings,
    #[serde(default)]
    pub watch: WatchSettings,
}

/// How to invoke the external bundler
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BundlerSettings {
    /// Executable to run.
    #[serde(default = "defaults::default_bundler_command")]
    pub command: String,
    /// Arguments; `{config}` is replaced with the composed config file path.
    #[serde(default = "defaults::default_bundler_args")]
    pub args: Vec<String>,
}

impl Default for BundlerSettings {
    fn default() -> Self {
        Self {
            command: defaults::default_bundler_command(),
            args: defaults::default_bundler_args(),
        }
    }
}

/// Watch mode settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WatchSettings {
    /// Quiet period before a batch of changes triggers a rebuild.
    #[serde(default = "defaults::default_debounce_ms")]
    pub debounce_ms: u64,
}

impl Default for WatchSettings {
    fn default() -> Self {
        Self {
            debounce_ms: defaults::default_debounce_ms(),
        }
    }
}

fn default_project_root() -> PathBuf {
    PathBuf::from(".")
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            project_root: default_project_root(),
            dependency_root: None,
            cache_dir: None,
            packages: Vec::new(),
            polyfills: defaults::default_polyfills(),
            module_dirs: Vec::new(),
            rules: defaults::default_rules(),
            node: defaults::default_node(),
            configs: Vec::new(),
            bundler: BundlerSettings::default(),
            watch: WatchSettings::default(),
        }
    }
}

impl Settings {
    /// Top-level dependency directory.
    pub fn dependency_root(&self) -> PathBuf {
        self.dependency_root
            .clone()
            .unwrap_or_else(|| self.project_root.join(defaults::DEPENDENCY_DIR))
    }

    /// Cache directory, falling back to the platform cache.
    pub fn cache_dir(&self) -> PathBuf {
        self.cache_dir
            .clone()
            .unwrap_or_else(defaults::default_cache_root)
    }

    /// Output file used when a build request does not name one.
    pub fn default_output(&self) -> PathBuf {
        defaults::default_output(&self.cache_dir())
    }

    /// Make every relative path absolute against `base_dir`.
    pub fn resolve_relative_to(mut self, base_dir: &Path) -> Self {
        let absolutize = |path: &Path| -> PathBuf {
            if path.is_absolute() {
                path.to_path_buf()
            } else {
                path_clean::clean(base_dir.join(path))
            }
        };

        self.project_root = absolutize(&self.project_root);
        self.dependency_root = self.dependency_root.as_deref().map(absolutize);
        self.cache_dir = self.cache_dir.as_deref().map(absolutize);
        self.module_dirs = self.module_dirs.iter().map(|p| absolutize(p)).collect();
        self.configs = self.configs.iter().map(|p| absolutize(p)).collect();
        self.packages = self
            .packages
            .iter()
            .map(|pkg| PackageDescriptor {
                manifest: absolutize(&pkg.manifest),
                path: absolutize(&pkg.path),
            })
            .collect();
        self
    }
}

/// Parse settings from YAML text.
///
/// An empty document yields the default settings.
pub fn parse(yaml_content: &str) -> Result<Settings> {
    if yaml_content.trim().is_empty() {
        return Ok(Settings::default());
    }

    serde_yaml::from_str::<Settings>(yaml_content).map_err(|err| {
        let message = err.to_string();
        let hint = if message.contains("unknown field") {
            Some("Check the field name against the documented settings keys".to_string())
        } else if message.contains("invalid type") {
            Some("Paths and commands are strings; packages is a list of {manifest, path}".to_string())
        } else {
            None
        };
        Error::SettingsParse { message, hint }
    })
}

/// Load settings from a file, resolving relative paths against its directory.
pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Settings> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(Error::Io)?;
    let settings = parse(&content)?;

    let base_dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir()?,
    };
    let base_dir = if base_dir.is_absolute() {
        base_dir
    } else {
        std::env::current_dir()?.join(base_dir)
    };
    Ok(settings.resolve_relative_to(&base_dir))
}
