//! Phase 2: Configuration Composition
//!
//! This phase builds the base configuration for a request and merges every
//! fragment onto it. The merge itself lives in [`crate::merge`]; this module
//! owns the precedence order, which is fixed:
//!
//! 1. base configuration
//! 2. package aliases
//! 3. symlink aliases (watch sessions only)
//! 4. minimizer configuration (only when optimizing)
//! 5. caller fragments
//! 6. package manifest overrides
//! 7. registry fragments
//! 8. `resolve.symlinks = false`
//! 9. `resolve.modules = [<dependency root>]`
//!
//! A symlink alias shares its name with the package alias of the same
//! package, so it comes right after the package aliases and points the name
//! at the link target. Caller fragments outrank both.
//!
//! The two tail fragments always come last so module resolution falls back to
//! the conventional dependency directory and symlinks are handled the same way
//! whatever earlier fragments configured.

use std::path::Path;

use log::{debug, info};
use serde_json::json;

use super::ResolvedFragments;
use crate::error::Result;
use crate::fragment::{ComposedConfig, ConfigMap, ConfigValue, Fragment, FragmentSource};
use crate::merge;
use crate::registry::ConfigRegistry;
use crate::request::{BuildRequest, MinimizerOptions};
use crate::settings::Settings;

/// File name of the stats sidecar written by the stats plugin.
pub const STATS_FILE: &str = "bundle-stats.json";

/// Composes configurations for one settings/registry pair
pub struct Composer<'a> {
    settings: &'a Settings,
    registry: &'a ConfigRegistry,
}

impl<'a> Composer<'a> {
    pub fn new(settings: &'a Settings, registry: &'a ConfigRegistry) -> Self {
        Self { settings, registry }
    }

    /// Executes Phase 2: merge every layer for `request` in precedence order.
    pub fn compose(
        &self,
        request: &BuildRequest,
        resolved: &ResolvedFragments,
    ) -> Result<ComposedConfig> {
        let base = self.base_fragment(request)?;
        let optimizer = request
            .optimize
            .then(|| minimizer_fragment(&request.minimizer));
        let symlinks: &[Fragment] = if request.watch {
            &resolved.symlink_aliases
        } else {
            &[]
        };
        let registered = self.registry.snapshot()?;
        let dependency_root = self.settings.dependency_root();

        let layers = layer_fragments(
            &resolved.aliases,
            symlinks,
            optimizer,
            &request.configs,
            &resolved.overrides,
            &registered,
            &dependency_root,
        );

        info!(
            "Composing configuration from {} fragments ({} caller, {} package, {} registered)",
            layers.len() + 1,
            request.configs.len(),
            resolved.aliases.len() + resolved.overrides.len(),
            registered.len()
        );
        Ok(merge::merge(&base, &layers))
    }

    /// The base configuration for a request.
    pub fn base_fragment(&self, request: &BuildRequest) -> Result<Fragment> {
        let settings = self.settings;
        let entries = request.entries()?;
        let output = request.output_path(&settings.default_output(), &settings.project_root);

        let entry: Vec<ConfigValue> = settings
            .polyfills
            .iter()
            .chain(entries.iter())
            .map(|e| ConfigValue::from(e.as_str()))
            .collect();

        let mut output_block = ConfigMap::new();
        output_block.insert(
            "path".to_string(),
            ConfigValue::from(output.parent().unwrap_or_else(|| Path::new("/"))),
        );
        output_block.insert(
            "filename".to_string(),
            output
                .file_name()
                .map(|name| ConfigValue::from(name.to_string_lossy().into_owned()))
                .unwrap_or(ConfigValue::Null),
        );
        if let Some(public) = &request.paths.public {
            output_block.insert("publicPath".to_string(), ConfigValue::from(public.as_str()));
        }

        let modules: Vec<ConfigValue> = std::iter::once(settings.dependency_root())
            .chain(settings.module_dirs.iter().cloned())
            .map(|dir| ConfigValue::from(dir.as_path()))
            .collect();

        let mut plugins = Vec::new();
        if request.stats {
            plugins.push(ConfigValue::from(json!({
                "name": "stats",
                "options": {"filename": STATS_FILE, "chunkModules": true}
            })));
        }

        let node: ConfigMap = settings
            .node
            .iter()
            .map(|(name, enabled)| (name.clone(), ConfigValue::Bool(*enabled)))
            .collect();

        let mut base = ConfigMap::new();
        base.insert(
            "context".to_string(),
            ConfigValue::from(settings.project_root.as_path()),
        );
        base.insert(
            "entry".to_string(),
            ConfigValue::Map(ConfigMap::from_iter([(
                "main".to_string(),
                ConfigValue::List(entry),
            )])),
        );
        base.insert("output".to_string(), ConfigValue::Map(output_block));
        base.insert(
            "resolve".to_string(),
            ConfigValue::Map(ConfigMap::from_iter([
                ("modules".to_string(), ConfigValue::List(modules)),
                ("alias".to_string(), ConfigValue::Map(ConfigMap::new())),
            ])),
        );
        base.insert(
            "module".to_string(),
            ConfigValue::Map(ConfigMap::from_iter([(
                "rules".to_string(),
                ConfigValue::List(settings.rules.clone()),
            )])),
        );
        base.insert("plugins".to_string(), ConfigValue::List(plugins));
        base.insert("profile".to_string(), ConfigValue::Bool(request.profile));
        base.insert("node".to_string(), ConfigValue::Map(node));

        debug!("Base configuration targets {}", output.display());
        Ok(Fragment::from_entries(FragmentSource::Base, base))
    }
}

/// Order every non-base layer by precedence, tails last.
pub fn layer_fragments(
    package_aliases: &[Fragment],
    symlink_aliases: &[Fragment],
    optimizer: Option<Fragment>,
    caller: &[Fragment],
    package_overrides: &[Fragment],
    registered: &[Fragment],
    dependency_root: &Path,
) -> Vec<Fragment> {
    let mut layers = Vec::new();
    layers.extend(package_aliases.iter().cloned());
    layers.extend(symlink_aliases.iter().cloned());
    layers.extend(optimizer);
    layers.extend(caller.iter().cloned());
    layers.extend(package_overrides.iter().cloned());
    layers.extend(registered.iter().cloned());
    layers.extend(tail_fragments(dependency_root));
    layers
}

/// Fragment enabling the minimizer.
pub fn minimizer_fragment(options: &MinimizerOptions) -> Fragment {
    let entries = json!({
        "optimization": {
            "minimize": true,
            "minimizer": [{
                "name": "uglify",
                "options": {"mangle": options.mangle, "beautify": options.beautify}
            }]
        }
    });
    match ConfigValue::from(entries) {
        ConfigValue::Map(map) => Fragment::from_entries(FragmentSource::Optimizer, map),
        _ => Fragment::new(FragmentSource::Optimizer),
    }
}

/// The two trailing fragments: symlinks off, then the default module path.
pub fn tail_fragments(dependency_root: &Path) -> [Fragment; 2] {
    let symlinks = ConfigMap::from_iter([(
        "resolve".to_string(),
        ConfigValue::Map(ConfigMap::from_iter([(
            "symlinks".to_string(),
            ConfigValue::Bool(false),
        )])),
    )]);
    let modules = ConfigMap::from_iter([(
        "resolve".to_string(),
        ConfigValue::Map(ConfigMap::from_iter([(
            "modules".to_string(),
            ConfigValue::List(vec![ConfigValue::from(dependency_root)]),
        )])),
    )]);
    [
        Fragment::from_entries(FragmentSource::Tail, symlinks),
        Fragment::from_entries(FragmentSource::Tail, modules),
    ]
}
