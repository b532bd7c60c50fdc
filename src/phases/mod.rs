//! Implementation of the phases of a packweave build.
//!
//! ## Overview
//!
//! A build runs in three phases:
//! 1. Discovery - Read every pseudo-package manifest (in parallel) and derive
//!    alias and override fragments from them
//! 2. Composition - Merge the base configuration with every fragment in a
//!    fixed precedence order
//! 3. Orchestration - Submit the composed configuration to the external
//!    bundler, once or as a watch session
//!
//! Each phase depends only on the previous phases and the foundation layers
//! (`fragment`, `merge`, `settings`).

use std::path::PathBuf;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::fragment::{ConfigValue, Fragment};

// Phase modules
pub mod composite;
pub mod discovery;
pub mod orchestrator;

pub use composite as phase2;
pub use discovery as phase1;
pub use orchestrator as phase3;

pub use discovery::{
    discover_aliases, discover_overrides, discover_symlink_aliases, load_manifests,
};

/// Where a pseudo-package's manifest and root directory live
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PackageDescriptor {
    /// Path to the package's JSON manifest
    pub manifest: PathBuf,
    /// Package root directory the alias points at
    pub path: PathBuf,
}

impl PackageDescriptor {
    pub fn new(manifest: impl Into<PathBuf>, path: impl Into<PathBuf>) -> Self {
        Self {
            manifest: manifest.into(),
            path: path.into(),
        }
    }
}

/// A parsed package manifest
#[derive(Debug, Clone, PartialEq)]
pub struct PackageManifest {
    /// Declared package name
    pub name: String,
    /// Package root directory
    pub root: PathBuf,
    /// File the manifest was read from
    pub manifest_path: PathBuf,
    /// The `packweave.overrides` block, if declared
    pub overrides: Option<ConfigValue>,
}

/// Manifests keyed by package name, in discovery order
pub type ManifestMap = IndexMap<String, PackageManifest>;

/// Fragments derived from installed packages, grouped by role
#[derive(Debug, Clone, Default)]
pub struct ResolvedFragments {
    /// Aliases for symlinked package roots (development flows only)
    pub symlink_aliases: Vec<Fragment>,
    /// One name-to-root alias per package
    pub aliases: Vec<Fragment>,
    /// One fragment per dependency declared in an override block
    pub overrides: Vec<Fragment>,
}
