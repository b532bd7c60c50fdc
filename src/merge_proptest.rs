//! Property-based tests for fragment merging.
//!
//! These tests use proptest to generate random configuration trees and verify
//! that the merge rules hold for all of them.

#[cfg(test)]
mod proptest_tests {
    use crate::fragment::{ConfigMap, ConfigValue, Fragment, FragmentSource};
    use crate::merge::{merge, merge_values};
    use proptest::prelude::*;

    fn scalar() -> impl Strategy<Value = ConfigValue> {
        prop_oneof![
            Just(ConfigValue::Null),
            any::<bool>().prop_map(ConfigValue::Bool),
            any::<i32>().prop_map(|n| ConfigValue::Number(n.into())),
            "[a-z./-]{0,12}".prop_map(ConfigValue::String),
        ]
    }

    fn value() -> impl Strategy<Value = ConfigValue> {
        scalar().prop_recursive(3, 24, 4, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..4).prop_map(ConfigValue::List),
                prop::collection::vec(("[a-e]", inner), 0..4)
                    .prop_map(|pairs| ConfigValue::Map(pairs.into_iter().collect())),
            ]
        })
    }

    fn config_map() -> impl Strategy<Value = ConfigMap> {
        prop::collection::vec(("[a-e]", value()), 0..5)
            .prop_map(|pairs| pairs.into_iter().collect())
    }

    fn fragment(entries: ConfigMap) -> Fragment {
        Fragment::from_entries(FragmentSource::Caller, entries)
    }

    // ============================================================================
    // merge property tests
    // ============================================================================

    proptest! {
        /// Property: merging with no fragments reproduces the base
        #[test]
        fn merge_without_fragments_is_identity(base in config_map()) {
            let composed = merge(&fragment(base.clone()), &[]);
            prop_assert_eq!(composed.root(), &base);
        }

        /// Property: merging never mutates the inputs
        #[test]
        fn merge_leaves_inputs_untouched(base in config_map(), a in config_map(), b in config_map()) {
            let base_fragment = fragment(base.clone());
            let layers = vec![fragment(a.clone()), fragment(b.clone())];
            let _ = merge(&base_fragment, &layers);
            prop_assert_eq!(base_fragment.entries(), &base);
            prop_assert_eq!(layers[0].entries(), &a);
            prop_assert_eq!(layers[1].entries(), &b);
        }

        /// Property: keys absent from every fragment keep the base value
        #[test]
        fn merge_preserves_untouched_keys(base in config_map(), layer in config_map()) {
            let composed = merge(&fragment(base.clone()), &[fragment(layer.clone())]);
            for (key, value) in &base {
                if !layer.contains_key(key) {
                    prop_assert_eq!(composed.root().get(key), Some(value));
                }
            }
        }

        /// Property: every key of every input appears in the result
        #[test]
        fn merge_keeps_every_key(base in config_map(), a in config_map(), b in config_map()) {
            let composed = merge(&fragment(base.clone()), &[fragment(a.clone()), fragment(b.clone())]);
            for key in base.keys().chain(a.keys()).chain(b.keys()) {
                prop_assert!(composed.root().contains_key(key), "missing key {}", key);
            }
        }

        /// Property: merging two lists yields a list as long as both together
        #[test]
        fn list_merge_accumulates(
            first in prop::collection::vec(scalar(), 0..6),
            second in prop::collection::vec(scalar(), 0..6),
        ) {
            let mut target = ConfigValue::List(first.clone());
            merge_values(&mut target, &ConfigValue::List(second.clone()));
            let merged = target.as_list().cloned().unwrap_or_default();
            prop_assert_eq!(merged.len(), first.len() + second.len());
            prop_assert_eq!(&merged[..first.len()], &first[..]);
            prop_assert_eq!(&merged[first.len()..], &second[..]);
        }

        /// Property: the later of two scalars always wins
        #[test]
        fn later_scalar_wins(first in scalar(), second in scalar()) {
            let base = fragment(ConfigMap::from_iter([("devtool".to_string(), first)]));
            let layer = fragment(ConfigMap::from_iter([("devtool".to_string(), second.clone())]));
            let composed = merge(&base, &[layer]);
            prop_assert_eq!(composed.root().get("devtool"), Some(&second));
        }

        /// Property: merging is deterministic (same inputs = same output)
        #[test]
        fn merge_is_deterministic(base in config_map(), a in config_map()) {
            let first = merge(&fragment(base.clone()), &[fragment(a.clone())]);
            let second = merge(&fragment(base), &[fragment(a)]);
            prop_assert_eq!(first.root(), second.root());
        }
    }
}
