//! Default values for packweave settings.
//!
//! This module provides centralized default values used across the settings
//! loader and the commands, ensuring consistency and avoiding duplication.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde_json::json;

use crate::fragment::ConfigValue;

/// Default settings file name, looked up in the current directory.
pub const SETTINGS_FILE: &str = ".packweave.yaml";

/// Manifest key under which packages declare bundler overrides.
pub const VENDOR_NAMESPACE: &str = "packweave";

/// Key inside [`VENDOR_NAMESPACE`] holding per-dependency fragments.
pub const OVERRIDES_KEY: &str = "overrides";

/// Conventional dependency directory name.
pub const DEPENDENCY_DIR: &str = "node_modules";

/// File name the composed configuration is written to for the bundler.
pub const BUNDLER_CONFIG_FILE: &str = "bundler.config.json";

/// Returns the default cache root directory.
///
/// Uses the platform-appropriate cache directory:
/// - Linux: `~/.cache/packweave` (XDG Base Directory)
/// - macOS: `~/Library/Caches/packweave`
/// - Windows: `{FOLDERID_LocalAppData}\packweave`
///
/// Falls back to `.packweave-cache` in the current directory if the
/// platform cache directory cannot be determined.
///
/// This can be overridden by the `cache_dir` setting or the
/// `PACKWEAVE_CACHE` environment variable.
pub fn default_cache_root() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from(".packweave-cache"))
        .join("packweave")
}

/// Default bundle location inside a cache directory.
pub fn default_output(cache_dir: &Path) -> PathBuf {
    cache_dir.join("main.min.js")
}

/// Entries prepended to every build's entry list.
pub fn default_polyfills() -> Vec<String> {
    vec!["babel-polyfill".to_string()]
}

/// The JavaScript loader rule applied when settings do not declare rules.
pub fn default_rules() -> Vec<ConfigValue> {
    vec![ConfigValue::from(json!({
        "test": "\\.js$",
        "exclude": [
            "node_modules/angular/",
            "node_modules/angular-material/",
            "node_modules/lodash/"
        ],
        "use": {
            "loader": "babel-loader",
            "options": {
                "presets": ["babel-preset-env"],
                "plugins": [
                    "babel-plugin-angularjs-annotate",
                    ["babel-plugin-transform-object-rest-spread", {"useBuiltIns": true}]
                ]
            }
        }
    }))]
}

/// Node polyfill switches; all disabled by default.
pub fn default_node() -> IndexMap<String, bool> {
    ["base64-js", "Buffer", "crypto", "ieee754", "process", "setImmediate"]
        .into_iter()
        .map(|name| (name.to_string(), false))
        .collect()
}

pub fn default_bundler_command() -> String {
    "webpack".to_string()
}

pub fn default_bundler_args() -> Vec<String> {
    vec![
        "--config".to_string(),
        "{config}".to_string(),
        "--json".to_string(),
    ]
}

pub fn default_debounce_ms() -> u64 {
    300
}
