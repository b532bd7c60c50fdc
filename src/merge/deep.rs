//! Recursive merge of configuration values
//!
//! Merging never mutates its inputs: the base is cloned once and every value
//! taken from a fragment is cloned into the result, so the composed
//! configuration shares no storage with the fragments it came from.

use log::debug;

use crate::fragment::{ComposedConfig, ConfigMap, ConfigValue, Fragment};

/// Recursively merge a source value into a target value
///
/// - Maps: recursively merge keys, source values winning on conflicting scalars
/// - Lists: source items are appended after the target's items
/// - Anything else, including mismatched shapes: source replaces target
pub fn merge_values(target: &mut ConfigValue, source: &ConfigValue) {
    match target {
        ConfigValue::Map(target_map) => {
            if let ConfigValue::Map(source_map) = source {
                merge_maps(target_map, source_map);
            } else {
                *target = source.clone();
            }
        }
        ConfigValue::List(target_list) => {
            if let ConfigValue::List(source_list) = source {
                target_list.extend(source_list.iter().cloned());
            } else {
                *target = source.clone();
            }
        }
        _ => *target = source.clone(),
    }
}

/// Merge every key of `source` into `target` using [`merge_values`].
///
/// Keys new to the target are appended, so the target keeps its own key order
/// followed by the source's new keys.
pub fn merge_maps(target: &mut ConfigMap, source: &ConfigMap) {
    for (key, value) in source {
        match target.get_mut(key) {
            Some(existing) => merge_values(existing, value),
            None => {
                target.insert(key.clone(), value.clone());
            }
        }
    }
}

/// Merge fragments onto a base, in argument order.
///
/// This is a pure function: precedence is entirely determined by the order
/// of `fragments`, later ones winning on conflicting scalars.
pub fn merge(base: &Fragment, fragments: &[Fragment]) -> ComposedConfig {
    let mut root = base.entries().clone();
    let mut sources = Vec::with_capacity(fragments.len() + 1);
    sources.push(base.source());

    for fragment in fragments {
        debug!(
            "Merging {} fragment ({} top-level keys)",
            fragment.source(),
            fragment.entries().len()
        );
        merge_maps(&mut root, fragment.entries());
        sources.push(fragment.source());
    }

    ComposedConfig::new(root, sources)
}
