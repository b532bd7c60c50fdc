//! Process-wide fragment registry
//!
//! Any part of a hosting application may register fragments that should apply
//! to every build it runs. The registry is an explicit object: create one at
//! startup, hand it to the composer, and clear it when a fresh slate is needed.
//! Cloning a `ConfigRegistry` yields another handle to the same list.

use std::sync::{Arc, RwLock};

use log::debug;

use crate::error::{Error, Result};
use crate::fragment::{Fragment, FragmentSource};

/// Shared, thread-safe list of registered fragments
#[derive(Debug, Clone, Default)]
pub struct ConfigRegistry {
    fragments: Arc<RwLock<Vec<Fragment>>>,
}

impl ConfigRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a fragment. Registered fragments are merged in registration order.
    pub fn register(&self, fragment: Fragment) -> Result<()> {
        let mut fragments = self.fragments.write().map_err(|_| Error::LockPoisoned {
            context: "config registry".to_string(),
        })?;
        fragments.push(fragment.with_source(FragmentSource::Registry));
        debug!("Registered fragment #{}", fragments.len());
        Ok(())
    }

    /// Copy of the registered fragments, in registration order.
    pub fn snapshot(&self) -> Result<Vec<Fragment>> {
        let fragments = self.fragments.read().map_err(|_| Error::LockPoisoned {
            context: "config registry".to_string(),
        })?;
        Ok(fragments.clone())
    }

    /// Remove every registered fragment.
    pub fn clear(&self) -> Result<()> {
        let mut fragments = self.fragments.write().map_err(|_| Error::LockPoisoned {
            context: "config registry".to_string(),
        })?;
        fragments.clear();
        Ok(())
    }

    pub fn len(&self) -> Result<usize> {
        let fragments = self.fragments.read().map_err(|_| Error::LockPoisoned {
            context: "config registry".to_string(),
        })?;
        Ok(fragments.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::thread;

    fn fragment(value: serde_json::Value) -> Fragment {
        Fragment::from_json(FragmentSource::Caller, value).unwrap()
    }

    #[test]
    fn test_register_relabels_and_keeps_order() {
        let registry = ConfigRegistry::new();
        registry.register(fragment(json!({"devtool": "a"}))).unwrap();
        registry.register(fragment(json!({"devtool": "b"}))).unwrap();

        let snapshot = registry.snapshot().unwrap();
        assert_eq!(snapshot.len(), 2);
        assert!(snapshot.iter().all(|f| f.source() == FragmentSource::Registry));
        assert_eq!(snapshot[1].get("devtool").and_then(|v| v.as_str()), Some("b"));
    }

    #[test]
    fn test_clear_empties_registry() {
        let registry = ConfigRegistry::new();
        registry.register(fragment(json!({}))).unwrap();
        assert!(!registry.is_empty().unwrap());

        registry.clear().unwrap();
        assert!(registry.is_empty().unwrap());
    }

    #[test]
    fn test_clones_share_state() {
        let registry = ConfigRegistry::new();
        let handle = registry.clone();
        handle.register(fragment(json!({"profile": true}))).unwrap();
        assert_eq!(registry.len().unwrap(), 1);
    }

    #[test]
    fn test_concurrent_registration() {
        let registry = ConfigRegistry::new();
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let registry = registry.clone();
                thread::spawn(move || {
                    registry.register(fragment(json!({ "id": i }))).unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(registry.len().unwrap(), 8);
    }
}
