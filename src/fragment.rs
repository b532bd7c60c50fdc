//! # Configuration Values and Fragments
//!
//! Bundler configurations are arbitrary nested documents. This module models
//! them with a recursively-defined tagged value so the merge logic can match
//! on the shape of each key instead of inspecting it at runtime.
//!
//! ## Key Components
//!
//! - **`ConfigValue`**: scalar, list or map. Maps keep insertion order, which
//!   matters for reproducible output and for override discovery order.
//! - **`Fragment`**: a partial configuration contributed by one source. A
//!   fragment is always a map at its root; anything else is rejected with
//!   `Error::InvalidFragment`.
//! - **`FragmentSource`**: which layer a fragment came from, used in logs.
//! - **`ComposedConfig`**: the fully merged configuration handed to the
//!   bundler.

use std::fmt;
use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::merge::{parse_path, PathSegment};

/// Ordered map of configuration keys.
pub type ConfigMap = IndexMap<String, ConfigValue>;

/// A configuration value of any shape
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    #[default]
    Null,
    Bool(bool),
    Number(serde_json::Number),
    String(String),
    List(Vec<ConfigValue>),
    Map(ConfigMap),
}

impl ConfigValue {
    /// Parse a JSON document into a value.
    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Name of this value's shape, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            ConfigValue::Null => "null",
            ConfigValue::Bool(_) => "boolean",
            ConfigValue::Number(_) => "number",
            ConfigValue::String(_) => "string",
            ConfigValue::List(_) => "list",
            ConfigValue::Map(_) => "map",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConfigValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ConfigValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&Vec<ConfigValue>> {
        match self {
            ConfigValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&ConfigMap> {
        match self {
            ConfigValue::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_map_mut(&mut self) -> Option<&mut ConfigMap> {
        match self {
            ConfigValue::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn is_map(&self) -> bool {
        matches!(self, ConfigValue::Map(_))
    }

    /// Look up a nested value by path segments.
    pub fn get_segments(&self, path: &[PathSegment]) -> Option<&ConfigValue> {
        let mut current = self;
        for segment in path {
            current = match (segment, current) {
                (PathSegment::Key(key), ConfigValue::Map(map)) => map.get(key)?,
                (PathSegment::Index(idx), ConfigValue::List(items)) => items.get(*idx)?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Look up a nested value by a path expression such as `resolve.alias.foo`
    /// or `entry.main[0]`.
    pub fn get_path(&self, path: &str) -> Option<&ConfigValue> {
        self.get_segments(&parse_path(path))
    }
}

impl From<serde_json::Value> for ConfigValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => ConfigValue::Null,
            serde_json::Value::Bool(b) => ConfigValue::Bool(b),
            serde_json::Value::Number(n) => ConfigValue::Number(n),
            serde_json::Value::String(s) => ConfigValue::String(s),
            serde_json::Value::Array(items) => {
                ConfigValue::List(items.into_iter().map(ConfigValue::from).collect())
            }
            serde_json::Value::Object(map) => ConfigValue::Map(
                map.into_iter()
                    .map(|(key, value)| (key, ConfigValue::from(value)))
                    .collect(),
            ),
        }
    }
}

impl From<ConfigValue> for serde_json::Value {
    fn from(value: ConfigValue) -> Self {
        match value {
            ConfigValue::Null => serde_json::Value::Null,
            ConfigValue::Bool(b) => serde_json::Value::Bool(b),
            ConfigValue::Number(n) => serde_json::Value::Number(n),
            ConfigValue::String(s) => serde_json::Value::String(s),
            ConfigValue::List(items) => {
                serde_json::Value::Array(items.into_iter().map(serde_json::Value::from).collect())
            }
            ConfigValue::Map(map) => serde_json::Value::Object(
                map.into_iter()
                    .map(|(key, value)| (key, serde_json::Value::from(value)))
                    .collect(),
            ),
        }
    }
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        ConfigValue::String(value.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(value: String) -> Self {
        ConfigValue::String(value)
    }
}

impl From<&Path> for ConfigValue {
    fn from(value: &Path) -> Self {
        ConfigValue::String(value.to_string_lossy().into_owned())
    }
}

impl From<bool> for ConfigValue {
    fn from(value: bool) -> Self {
        ConfigValue::Bool(value)
    }
}

impl<T: Into<ConfigValue>> From<Vec<T>> for ConfigValue {
    fn from(items: Vec<T>) -> Self {
        ConfigValue::List(items.into_iter().map(Into::into).collect())
    }
}

impl From<ConfigMap> for ConfigValue {
    fn from(map: ConfigMap) -> Self {
        ConfigValue::Map(map)
    }
}

/// The layer a fragment was contributed by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FragmentSource {
    /// The base configuration built from the request and settings
    Base,
    /// Aliases for packages whose root is a development symlink
    SymlinkAlias,
    /// Minimizer settings, present only when optimizing
    Optimizer,
    /// Fragments supplied by the caller for this build
    Caller,
    /// Name-to-root alias for a discovered package
    PackageAlias,
    /// Override block declared in a package manifest
    PackageOverride,
    /// Fragments registered process-wide
    Registry,
    /// Trailing fragments that pin symlink and module resolution
    Tail,
}

impl fmt::Display for FragmentSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FragmentSource::Base => "base",
            FragmentSource::SymlinkAlias => "symlink-alias",
            FragmentSource::Optimizer => "optimizer",
            FragmentSource::Caller => "caller",
            FragmentSource::PackageAlias => "package-alias",
            FragmentSource::PackageOverride => "package-override",
            FragmentSource::Registry => "registry",
            FragmentSource::Tail => "tail",
        };
        f.write_str(name)
    }
}

/// A partial configuration contributed by one source.
///
/// Fragments are never modified by merging: everything taken from a fragment
/// is cloned into the result.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    source: FragmentSource,
    entries: ConfigMap,
}

impl Fragment {
    /// Create an empty fragment.
    pub fn new(source: FragmentSource) -> Self {
        Self {
            source,
            entries: ConfigMap::new(),
        }
    }

    /// Create a fragment from already-built entries.
    pub fn from_entries(source: FragmentSource, entries: ConfigMap) -> Self {
        Self { source, entries }
    }

    /// Create a fragment from a value, which must be a map.
    pub fn from_value(source: FragmentSource, value: ConfigValue) -> Result<Self> {
        match value {
            ConfigValue::Map(entries) => Ok(Self { source, entries }),
            other => Err(Error::InvalidFragment {
                message: format!("expected a map at the root of a {source} fragment, found {}", other.kind()),
            }),
        }
    }

    /// Create a fragment from a `serde_json` value.
    pub fn from_json(source: FragmentSource, value: serde_json::Value) -> Result<Self> {
        Self::from_value(source, value.into())
    }

    /// Parse a fragment from JSON text.
    pub fn from_json_str(source: FragmentSource, text: &str) -> Result<Self> {
        let value: ConfigValue =
            serde_json::from_str(text).map_err(|err| Error::InvalidFragment {
                message: format!("fragment is not valid JSON: {}", err),
            })?;
        Self::from_value(source, value)
    }

    /// Read and parse a fragment file.
    pub fn from_json_file(source: FragmentSource, path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(source, &text).map_err(|err| match err {
            Error::InvalidFragment { message } => Error::InvalidFragment {
                message: format!("{}: {}", path.display(), message),
            },
            other => other,
        })
    }

    pub fn source(&self) -> FragmentSource {
        self.source
    }

    /// Relabel the fragment, e.g. when it enters the registry.
    pub fn with_source(mut self, source: FragmentSource) -> Self {
        self.source = source;
        self
    }

    pub fn entries(&self) -> &ConfigMap {
        &self.entries
    }

    pub(crate) fn entries_mut(&mut self) -> &mut ConfigMap {
        &mut self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up a nested value by path expression.
    pub fn get(&self, path: &str) -> Option<&ConfigValue> {
        let segments = parse_path(path);
        let (first, rest) = segments.split_first()?;
        match first {
            PathSegment::Key(key) => self.entries.get(key)?.get_segments(rest),
            PathSegment::Index(_) => None,
        }
    }

    /// Set a nested value, creating intermediate maps as needed.
    ///
    /// Fails if the path runs through an existing non-map value.
    pub fn set(&mut self, path: &str, value: impl Into<ConfigValue>) -> Result<()> {
        let segments = parse_path(path);
        let Some((PathSegment::Key(last), parents)) = segments.split_last() else {
            return Err(Error::InvalidFragment {
                message: format!("cannot set value at path '{}'", path),
            });
        };

        let mut current = &mut self.entries;
        for segment in parents {
            let PathSegment::Key(key) = segment else {
                return Err(Error::InvalidFragment {
                    message: format!("list indices are not supported when setting '{}'", path),
                });
            };
            current = current
                .entry(key.clone())
                .or_insert_with(|| ConfigValue::Map(ConfigMap::new()))
                .as_map_mut()
                .ok_or_else(|| Error::InvalidFragment {
                    message: format!("expected a map at '{}' while setting '{}'", key, path),
                })?;
        }
        current.insert(last.clone(), value.into());
        Ok(())
    }

    /// Builder-style variant of [`Fragment::set`].
    pub fn with(mut self, path: &str, value: impl Into<ConfigValue>) -> Result<Self> {
        self.set(path, value)?;
        Ok(self)
    }

    pub fn into_entries(self) -> ConfigMap {
        self.entries
    }
}

/// The final configuration submitted to the bundler
#[derive(Debug, Clone, PartialEq)]
pub struct ComposedConfig {
    root: ConfigMap,
    sources: Vec<FragmentSource>,
}

impl ComposedConfig {
    pub(crate) fn new(root: ConfigMap, sources: Vec<FragmentSource>) -> Self {
        Self { root, sources }
    }

    /// Look up a nested value by path expression.
    pub fn get(&self, path: &str) -> Option<&ConfigValue> {
        let segments = parse_path(path);
        let (first, rest) = segments.split_first()?;
        match first {
            PathSegment::Key(key) => self.root.get(key)?.get_segments(rest),
            PathSegment::Index(_) => None,
        }
    }

    pub fn root(&self) -> &ConfigMap {
        &self.root
    }

    /// Sources of the fragments merged into this configuration, in order.
    pub fn sources(&self) -> &[FragmentSource] {
        &self.sources
    }

    pub fn to_json_value(&self) -> serde_json::Value {
        ConfigValue::Map(self.root.clone()).into()
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.root)?)
    }
}
