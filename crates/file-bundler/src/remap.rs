//! Key remapping: explicit overrides, then a uniform prefix
//!
//! Both operations build a fresh [`Bundle`] rather than renaming in place, and
//! both refuse to let two entries land on the same key.

use std::collections::BTreeMap;

use log::debug;

use crate::{
    bundle::Bundle,
    error::{BundleError, Result},
    key::{Separator, join},
};

/// Rename keys according to `mapping` (old key to new key).
///
/// Old keys missing from the bundle are ignored. Renaming a key onto another
/// key that is itself renamed away is allowed, so swaps work.
pub fn remap(bundle: Bundle, mapping: &BTreeMap<String, String>) -> Result<Bundle> {
    if mapping.is_empty() {
        return Ok(bundle);
    }

    for old_key in mapping.keys().filter(|key| !bundle.contains_key(key)) {
        debug!("Remap source {old_key} is not in the bundle, ignoring");
    }

    rebuild(bundle, |key| mapping.get(key).cloned())
}

/// Join `prefix` in front of every key. An empty prefix is a no-op.
///
/// Not idempotent: prefixing twice nests the prefix twice.
pub fn prefix(bundle: Bundle, prefix: &str, separator: Separator) -> Result<Bundle> {
    if prefix.is_empty() {
        return Ok(bundle);
    }
    rebuild(bundle, |key| Some(join(prefix, key, separator)))
}

fn rebuild(bundle: Bundle, rename: impl Fn(&str) -> Option<String>) -> Result<Bundle> {
    let mut remapped = Bundle::new();
    for (key, value) in bundle {
        let new_key = rename(&key).unwrap_or(key);
        if remapped.contains_key(&new_key) {
            return Err(BundleError::KeyCollision { key: new_key });
        }
        remapped.insert(new_key, value);
    }
    Ok(remapped)
}
