//! Phase 1: Package Discovery
//!
//! This is the first phase of a packweave build. It turns the configured
//! pseudo-packages into configuration fragments.
//!
//! ## Process
//!
//! 1.  **Manifest Loading (`load_manifests`)**: Every package manifest is read
//!     and parsed as JSON. Reads are independent and run in parallel, but the
//!     result keeps the input order so merge precedence is reproducible. The
//!     first unreadable or malformed manifest aborts the whole batch: a
//!     skipped package would silently break module resolution later.
//!
//! 2.  **Aliases (`discover_aliases`)**: Each manifest yields one fragment
//!     mapping the declared package name to the package root.
//!
//! 3.  **Overrides (`discover_overrides`)**: Manifests may declare a
//!     `packweave.overrides` block with one fragment per dependency. Alias
//!     paths in those fragments are relative to the dependency's own root and
//!     are rewritten to absolute paths under the top-level dependency
//!     directory.
//!
//! 4.  **Symlink Aliases (`discover_symlink_aliases`)**: For development
//!     flows, packages whose root is a symbolic link get an extra alias to the
//!     link target.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use rayon::prelude::*;

use super::{ManifestMap, PackageDescriptor, PackageManifest, ResolvedFragments};
use crate::defaults::{OVERRIDES_KEY, VENDOR_NAMESPACE};
use crate::error::{Error, Result};
use crate::fragment::{ConfigMap, ConfigValue, Fragment, FragmentSource};

/// Executes Phase 1 of the pipeline.
///
/// Reads each manifest once and derives aliases, overrides and, when
/// `include_symlinks` is set, symlink aliases from the same parse.
pub fn execute(
    packages: &[PackageDescriptor],
    dependency_root: &Path,
    include_symlinks: bool,
) -> Result<ResolvedFragments> {
    let manifests = load_manifests(packages)?;

    let aliases = manifests.iter().map(alias_fragment).collect::<Vec<_>>();
    let symlink_aliases = if include_symlinks {
        discover_symlink_aliases(&manifests)?
    } else {
        Vec::new()
    };
    let overrides = discover_overrides(&index_by_name(manifests), dependency_root)?;

    info!(
        "Discovered {} package aliases and {} package overrides",
        aliases.len(),
        overrides.len()
    );

    Ok(ResolvedFragments {
        symlink_aliases,
        aliases,
        overrides,
    })
}

/// Read and parse every package manifest, preserving input order.
pub fn load_manifests(packages: &[PackageDescriptor]) -> Result<Vec<PackageManifest>> {
    packages.par_iter().map(read_manifest).collect()
}

/// Produce one alias fragment per package, in input order.
pub fn discover_aliases(packages: &[PackageDescriptor]) -> Result<Vec<Fragment>> {
    let manifests = load_manifests(packages)?;
    Ok(manifests.iter().map(alias_fragment).collect())
}

/// Produce one fragment per dependency declared in a manifest override block.
///
/// Fragments come out in manifest order, then in the block's key order. Alias
/// values are resolved against `<dependency_root>/<dependency>`.
pub fn discover_overrides(manifests: &ManifestMap, dependency_root: &Path) -> Result<Vec<Fragment>> {
    let mut fragments = Vec::new();

    for manifest in manifests.values() {
        let Some(block) = &manifest.overrides else {
            continue;
        };

        let entries = block.as_map().ok_or_else(|| Error::InvalidFragment {
            message: format!(
                "{}: `{}.{}` must map dependency names to fragments, found {}",
                manifest.manifest_path.display(),
                VENDOR_NAMESPACE,
                OVERRIDES_KEY,
                block.kind()
            ),
        })?;

        for (dependency, value) in entries {
            let mut fragment = Fragment::from_value(FragmentSource::PackageOverride, value.clone())
                .map_err(|err| Error::InvalidFragment {
                    message: format!(
                        "{}: override for '{}': {}",
                        manifest.manifest_path.display(),
                        dependency,
                        err
                    ),
                })?;
            rewrite_alias_paths(&mut fragment, &dependency_root.join(dependency));
            debug!(
                "Override for '{}' declared by '{}'",
                dependency, manifest.name
            );
            fragments.push(fragment);
        }
    }

    Ok(fragments)
}

/// Alias fragments for packages whose root directory is a symbolic link.
pub fn discover_symlink_aliases(manifests: &[PackageManifest]) -> Result<Vec<Fragment>> {
    let mut fragments = Vec::new();
    for manifest in manifests {
        let is_symlink = match fs::symlink_metadata(&manifest.root) {
            Ok(metadata) => metadata.file_type().is_symlink(),
            Err(_) => false,
        };
        if !is_symlink {
            continue;
        }

        let target = fs::canonicalize(&manifest.root)?;
        debug!(
            "Package '{}' is a symlink to {}",
            manifest.name,
            target.display()
        );
        fragments.push(alias_entry(
            FragmentSource::SymlinkAlias,
            &manifest.name,
            &target,
        ));
    }
    Ok(fragments)
}

/// Key manifests by package name, keeping the first position of each name.
pub fn index_by_name(manifests: Vec<PackageManifest>) -> ManifestMap {
    let mut map = ManifestMap::with_capacity(manifests.len());
    for manifest in manifests {
        if let Some(previous) = map.get(&manifest.name) {
            warn!(
                "Package '{}' declared twice ({} and {}); the later manifest wins",
                manifest.name,
                previous.manifest_path.display(),
                manifest.manifest_path.display()
            );
        }
        map.insert(manifest.name.clone(), manifest);
    }
    map
}

fn read_manifest(package: &PackageDescriptor) -> Result<PackageManifest> {
    let path = &package.manifest;
    let text = fs::read_to_string(path).map_err(|source| Error::ManifestRead {
        path: path.clone(),
        source,
    })?;
    let value: ConfigValue = serde_json::from_str(&text).map_err(|err| Error::ManifestParse {
        path: path.clone(),
        message: err.to_string(),
    })?;

    let Some(root) = value.as_map() else {
        return Err(Error::ManifestParse {
            path: path.clone(),
            message: format!("expected a JSON object, found {}", value.kind()),
        });
    };
    let name = root
        .get("name")
        .and_then(ConfigValue::as_str)
        .ok_or_else(|| Error::ManifestParse {
            path: path.clone(),
            message: "missing string `name` field".to_string(),
        })?
        .to_string();
    let overrides = root
        .get(VENDOR_NAMESPACE)
        .and_then(ConfigValue::as_map)
        .and_then(|namespace| namespace.get(OVERRIDES_KEY))
        .cloned();

    Ok(PackageManifest {
        name,
        root: package.path.clone(),
        manifest_path: path.clone(),
        overrides,
    })
}

fn alias_fragment(manifest: &PackageManifest) -> Fragment {
    alias_entry(FragmentSource::PackageAlias, &manifest.name, &manifest.root)
}

// Built by hand: package names may contain dots, which path expressions split on.
fn alias_entry(source: FragmentSource, name: &str, path: &Path) -> Fragment {
    let mut alias = ConfigMap::new();
    alias.insert(name.to_string(), ConfigValue::from(path));
    let mut resolve = ConfigMap::new();
    resolve.insert("alias".to_string(), ConfigValue::Map(alias));
    let mut entries = ConfigMap::new();
    entries.insert("resolve".to_string(), ConfigValue::Map(resolve));
    Fragment::from_entries(source, entries)
}

/// Rewrite `resolve.alias` values relative to `package_root`.
///
/// Fragments without `resolve`, or whose `resolve` or `alias` is not a map,
/// are left as they are.
fn rewrite_alias_paths(fragment: &mut Fragment, package_root: &Path) {
    let Some(alias) = fragment
        .entries_mut()
        .get_mut("resolve")
        .and_then(ConfigValue::as_map_mut)
        .and_then(|resolve| resolve.get_mut("alias"))
        .and_then(ConfigValue::as_map_mut)
    else {
        return;
    };

    for value in alias.values_mut() {
        match value {
            ConfigValue::String(target) => *target = resolve_against(package_root, target),
            ConfigValue::List(targets) => {
                for item in targets.iter_mut() {
                    if let ConfigValue::String(target) = item {
                        *target = resolve_against(package_root, target);
                    }
                }
            }
            _ => {}
        }
    }
}

fn resolve_against(root: &Path, target: &str) -> String {
    let resolved: PathBuf = path_clean::clean(root.join(target));
    resolved.to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn write_manifest(dir: &Path, name: &str, body: serde_json::Value) -> PackageDescriptor {
        let root = dir.join(name);
        fs::create_dir_all(&root).unwrap();
        let manifest = root.join("package.json");
        fs::write(&manifest, serde_json::to_string_pretty(&body).unwrap()).unwrap();
        PackageDescriptor::new(manifest, root)
    }

    fn manifest_with_overrides(name: &str, overrides: serde_json::Value) -> PackageManifest {
        PackageManifest {
            name: name.to_string(),
            root: PathBuf::from("/app").join(name),
            manifest_path: PathBuf::from("/app").join(name).join("package.json"),
            overrides: Some(overrides.into()),
        }
    }

    mod alias_tests {
        use super::*;

        #[test]
        fn test_alias_maps_name_to_root() {
            let temp = TempDir::new().unwrap();
            let pkg = write_manifest(temp.path(), "components", json!({"name": "my-components"}));

            let aliases = discover_aliases(std::slice::from_ref(&pkg)).unwrap();

            assert_eq!(aliases.len(), 1);
            assert_eq!(aliases[0].source(), FragmentSource::PackageAlias);
            let alias = aliases[0].entries()["resolve"].get_path("alias").unwrap();
            assert_eq!(
                alias.as_map().unwrap().get("my-components"),
                Some(&ConfigValue::from(pkg.path.as_path()))
            );
        }

        #[test]
        fn test_aliases_preserve_input_order() {
            let temp = TempDir::new().unwrap();
            let packages: Vec<_> = (0..40)
                .map(|i| {
                    let name = format!("pkg-{:02}", i);
                    write_manifest(temp.path(), &name, json!({ "name": &name }))
                })
                .collect();

            let aliases = discover_aliases(&packages).unwrap();

            let names: Vec<String> = aliases
                .iter()
                .map(|f| {
                    let alias = f.entries()["resolve"].get_path("alias").unwrap();
                    alias.as_map().unwrap().keys().next().unwrap().clone()
                })
                .collect();
            let expected: Vec<String> = (0..40).map(|i| format!("pkg-{:02}", i)).collect();
            assert_eq!(names, expected);
        }

        #[test]
        fn test_dotted_package_name_kept_whole() {
            let temp = TempDir::new().unwrap();
            let pkg = write_manifest(temp.path(), "dotted", json!({"name": "lodash.merge"}));

            let aliases = discover_aliases(&[pkg]).unwrap();
            let alias = aliases[0].entries()["resolve"].get_path("alias").unwrap();
            assert!(alias.as_map().unwrap().contains_key("lodash.merge"));
        }

        #[test]
        fn test_missing_manifest_aborts_batch() {
            let temp = TempDir::new().unwrap();
            let good = write_manifest(temp.path(), "good", json!({"name": "good"}));
            let missing = PackageDescriptor::new(temp.path().join("gone/package.json"), temp.path().join("gone"));
            let also_good = write_manifest(temp.path(), "also-good", json!({"name": "also-good"}));

            let result = discover_aliases(&[good, missing, also_good]);

            match result {
                Err(Error::ManifestRead { path, .. }) => {
                    assert!(path.ends_with("gone/package.json"));
                }
                other => panic!("expected ManifestRead, got {other:?}"),
            }
        }

        #[test]
        fn test_malformed_manifest_is_parse_error() {
            let temp = TempDir::new().unwrap();
            let root = temp.path().join("broken");
            fs::create_dir_all(&root).unwrap();
            fs::write(root.join("package.json"), "{ not json").unwrap();
            let pkg = PackageDescriptor::new(root.join("package.json"), root);

            assert!(matches!(
                discover_aliases(&[pkg]),
                Err(Error::ManifestParse { .. })
            ));
        }

        #[test]
        fn test_manifest_without_name_is_parse_error() {
            let temp = TempDir::new().unwrap();
            let pkg = write_manifest(temp.path(), "nameless", json!({"version": "1.0.0"}));

            match discover_aliases(&[pkg]) {
                Err(Error::ManifestParse { message, .. }) => assert!(message.contains("name")),
                other => panic!("expected ManifestParse, got {other:?}"),
            }
        }
    }

    mod override_tests {
        use super::*;

        #[test]
        fn test_relative_alias_rewritten_under_dependency_root() {
            let mut manifests = ManifestMap::new();
            manifests.insert(
                "app".to_string(),
                manifest_with_overrides(
                    "app",
                    json!({"pkg-a": {"resolve": {"alias": {"widget": "./src/widget"}}}}),
                ),
            );

            let fragments = discover_overrides(&manifests, Path::new("/deps")).unwrap();

            assert_eq!(fragments.len(), 1);
            assert_eq!(fragments[0].source(), FragmentSource::PackageOverride);
            assert_eq!(
                fragments[0].get("resolve.alias.widget"),
                Some(&ConfigValue::from("/deps/pkg-a/src/widget"))
            );
        }

        #[test]
        fn test_absolute_and_non_string_aliases() {
            let mut manifests = ManifestMap::new();
            manifests.insert(
                "app".to_string(),
                manifest_with_overrides(
                    "app",
                    json!({"pkg-a": {"resolve": {"alias": {
                        "abs": "/opt/shared",
                        "off": false,
                        "many": ["./a", "../b", 3]
                    }}}}),
                ),
            );

            let fragments = discover_overrides(&manifests, Path::new("/deps")).unwrap();
            let fragment = &fragments[0];

            assert_eq!(fragment.get("resolve.alias.abs"), Some(&ConfigValue::from("/opt/shared")));
            assert_eq!(fragment.get("resolve.alias.off"), Some(&ConfigValue::Bool(false)));
            assert_eq!(
                fragment.get("resolve.alias.many[0]"),
                Some(&ConfigValue::from("/deps/pkg-a/a"))
            );
            assert_eq!(
                fragment.get("resolve.alias.many[1]"),
                Some(&ConfigValue::from("/deps/b"))
            );
            assert_eq!(
                fragment.get("resolve.alias.many[2]"),
                Some(&ConfigValue::from(json!(3)))
            );
        }

        #[test]
        fn test_fragment_without_resolve_passes_through() {
            let mut manifests = ManifestMap::new();
            manifests.insert(
                "app".to_string(),
                manifest_with_overrides(
                    "app",
                    json!({
                        "pkg-a": {"module": {"rules": [{"test": "\\.css$"}]}},
                        "pkg-b": {"resolve": "not-a-map"}
                    }),
                ),
            );

            let fragments = discover_overrides(&manifests, Path::new("/deps")).unwrap();

            assert_eq!(fragments.len(), 2);
            assert!(fragments[0].get("resolve").is_none());
            assert_eq!(fragments[1].get("resolve"), Some(&ConfigValue::from("not-a-map")));
        }

        #[test]
        fn test_override_order_outer_then_inner() {
            let mut manifests = ManifestMap::new();
            manifests.insert(
                "first".to_string(),
                manifest_with_overrides("first", json!({"z-dep": {"profile": true}, "a-dep": {"profile": false}})),
            );
            manifests.insert(
                "plain".to_string(),
                PackageManifest {
                    name: "plain".to_string(),
                    root: PathBuf::from("/app/plain"),
                    manifest_path: PathBuf::from("/app/plain/package.json"),
                    overrides: None,
                },
            );
            manifests.insert(
                "second".to_string(),
                manifest_with_overrides("second", json!({"m-dep": {"devtool": "source-map"}})),
            );

            let fragments = discover_overrides(&manifests, Path::new("/deps")).unwrap();

            assert_eq!(fragments.len(), 3);
            assert_eq!(fragments[0].get("profile"), Some(&ConfigValue::Bool(true)));
            assert_eq!(fragments[1].get("profile"), Some(&ConfigValue::Bool(false)));
            assert_eq!(fragments[2].get("devtool"), Some(&ConfigValue::from("source-map")));
        }

        #[test]
        fn test_non_map_override_entry_is_invalid() {
            let mut manifests = ManifestMap::new();
            manifests.insert(
                "app".to_string(),
                manifest_with_overrides("app", json!({"pkg-a": ["not", "a", "fragment"]})),
            );

            let result = discover_overrides(&manifests, Path::new("/deps"));
            match result {
                Err(Error::InvalidFragment { message }) => assert!(message.contains("pkg-a")),
                other => panic!("expected InvalidFragment, got {other:?}"),
            }
        }

        #[test]
        fn test_non_map_override_block_is_invalid() {
            let mut manifests = ManifestMap::new();
            manifests.insert("app".to_string(), manifest_with_overrides("app", json!("nope")));

            assert!(matches!(
                discover_overrides(&manifests, Path::new("/deps")),
                Err(Error::InvalidFragment { .. })
            ));
        }

        #[test]
        fn test_overrides_read_from_manifest_file() {
            let temp = TempDir::new().unwrap();
            let pkg = write_manifest(
                temp.path(),
                "app",
                json!({
                    "name": "app",
                    "packweave": {"overrides": {"pkg-a": {"resolve": {"alias": {"widget": "./src/widget"}}}}}
                }),
            );

            let resolved = execute(&[pkg], Path::new("/deps"), false).unwrap();

            assert_eq!(resolved.aliases.len(), 1);
            assert_eq!(resolved.overrides.len(), 1);
            assert!(resolved.symlink_aliases.is_empty());
            assert_eq!(
                resolved.overrides[0].get("resolve.alias.widget"),
                Some(&ConfigValue::from("/deps/pkg-a/src/widget"))
            );
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_package_gets_target_alias() {
        let temp = TempDir::new().unwrap();
        let real = write_manifest(temp.path(), "real", json!({"name": "linked"}));
        let link = temp.path().join("link");
        std::os::unix::fs::symlink(&real.path, &link).unwrap();
        let linked = PackageDescriptor::new(real.manifest.clone(), link);

        let resolved = execute(&[linked], Path::new("/deps"), true).unwrap();

        assert_eq!(resolved.symlink_aliases.len(), 1);
        let target = fs::canonicalize(&real.path).unwrap();
        let alias = resolved.symlink_aliases[0].entries()["resolve"]
            .get_path("alias")
            .unwrap();
        assert_eq!(
            alias.as_map().unwrap().get("linked"),
            Some(&ConfigValue::from(target.as_path()))
        );
    }

    #[test]
    fn test_index_by_name_later_manifest_wins() {
        let first = PackageManifest {
            name: "dup".to_string(),
            root: PathBuf::from("/a"),
            manifest_path: PathBuf::from("/a/package.json"),
            overrides: None,
        };
        let second = PackageManifest {
            root: PathBuf::from("/b"),
            manifest_path: PathBuf::from("/b/package.json"),
            ..first.clone()
        };

        let map = index_by_name(vec![first, second]);

        assert_eq!(map.len(), 1);
        assert_eq!(map["dup"].root, PathBuf::from("/b"));
    }
}
