//! Shared test utilities for integration and E2E tests.
//!
//! This module provides fixtures and settings snippets to reduce duplication
//! across test files.
//!
//! ## Usage
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! #[cfg_attr(not(feature = "integration-tests"), ignore)]
//! fn test_example() {
//!     let fixture = TestFixture::new().with_settings(settings::FAKE_BUNDLER);
//!     fixture.command().arg("config").arg("--main").arg("./a.js").assert().success();
//! }
//! ```

use assert_fs::prelude::*;
use std::path::{Path, PathBuf};

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    #[allow(unused_imports)]
    pub use assert_cmd::cargo::cargo_bin_cmd;
    pub use assert_fs::prelude::*;
    #[allow(unused_imports)]
    pub use assert_fs::TempDir;
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::settings;
    pub use super::TestFixture;
}

/// Settings file snippets.
#[allow(dead_code)]
pub mod settings {
    /// Bundler that copies the composed config to `seen-config.json` and
    /// reports a clean build.
    pub const FAKE_BUNDLER: &str = r#"
cache_dir: cache
polyfills: []
bundler:
  command: sh
  args: ["-c", "cp \"$0\" seen-config.json && printf '{\"errors\":[],\"warnings\":[\"big bundle\"]}'", "{config}"]
"#;

    /// Bundler that reports two compile errors.
    pub const FAILING_BUNDLER: &str = r#"
cache_dir: cache
bundler:
  command: sh
  args: ["-c", "printf '{\"errors\":[\"Module not found: ./a\",{\"message\":\"Unexpected token\"}]}'"]
"#;

    /// Settings with an unknown key.
    pub const UNKNOWN_FIELD: &str = "cache_dri: cache\n";
}

/// A temporary project directory with optional settings and packages.
pub struct TestFixture {
    temp_dir: assert_fs::TempDir,
}

#[allow(dead_code)]
impl TestFixture {
    /// Create a new test fixture with an empty temporary directory.
    pub fn new() -> Self {
        Self {
            temp_dir: assert_fs::TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Write `.packweave.yaml` with the given content.
    pub fn with_settings(self, content: &str) -> Self {
        self.temp_dir
            .child(".packweave.yaml")
            .write_str(content)
            .expect("Failed to write settings file");
        self
    }

    /// Add a file with the given path and content.
    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.temp_dir
            .child(path)
            .write_str(content)
            .expect("Failed to write file");
        self
    }

    /// Add a package under `packages/<dir>` with a manifest body.
    pub fn with_package(self, dir: &str, manifest: serde_json::Value) -> Self {
        self.temp_dir
            .child(format!("packages/{}/package.json", dir))
            .write_str(&manifest.to_string())
            .expect("Failed to write manifest");
        self
    }

    /// Get the path to the temporary directory.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn settings_path(&self) -> PathBuf {
        self.temp_dir.path().join(".packweave.yaml")
    }

    /// Read and parse a JSON file written into the fixture.
    pub fn read_json(&self, path: &str) -> serde_json::Value {
        let text = std::fs::read_to_string(self.path().join(path)).expect("Failed to read JSON");
        serde_json::from_str(&text).expect("Invalid JSON")
    }

    /// Create a command running in this fixture's directory.
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("packweave");
        cmd.current_dir(self.path())
            .env_remove("PACKWEAVE_SETTINGS")
            .env_remove("PACKWEAVE_CACHE")
            .env_remove("RUST_LOG");
        cmd
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_with_settings() {
        let fixture = TestFixture::new().with_settings(settings::FAKE_BUNDLER);
        assert!(fixture.settings_path().exists());
    }

    #[test]
    fn test_settings_snippets_are_valid_yaml() {
        for snippet in [
            settings::FAKE_BUNDLER,
            settings::FAILING_BUNDLER,
            settings::UNKNOWN_FIELD,
        ] {
            assert!(serde_yaml::from_str::<serde_yaml::Value>(snippet).is_ok());
        }
    }
}
