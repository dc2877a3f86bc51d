//! The key to encoded-value mapping shared by every bundling stage

use std::collections::{BTreeMap, btree_map};

/// Mapping from bundle keys to encoded file contents.
///
/// Entries are kept sorted by key so that everything downstream, generated
/// source included, is reproducible regardless of filesystem iteration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bundle {
    entries: BTreeMap<String, Vec<u8>>,
}

impl Bundle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Raw encoded value stored under `key`
    pub fn get(&self, key: &str) -> Option<&[u8]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    /// Encoded value stored under `key`, if it is valid UTF-8
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(|value| std::str::from_utf8(value).ok())
    }

    /// Insert a value, returning the previous value stored under the key
    pub fn insert(&mut self, key: impl Into<String>, value: Vec<u8>) -> Option<Vec<u8>> {
        self.entries.insert(key.into(), value)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[u8])> {
        self.entries
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_slice()))
    }

    /// Whether every value can be emitted as a string literal
    pub fn is_text(&self) -> bool {
        self.entries
            .values()
            .all(|value| std::str::from_utf8(value).is_ok())
    }

    /// Total size of all encoded values in bytes
    pub fn encoded_size(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }
}

impl IntoIterator for Bundle {
    type Item = (String, Vec<u8>);
    type IntoIter = btree_map::IntoIter<String, Vec<u8>>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<K: Into<String>> FromIterator<(K, Vec<u8>)> for Bundle {
    fn from_iter<I: IntoIterator<Item = (K, Vec<u8>)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(key, value)| (key.into(), value))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iteration_is_sorted_by_key() {
        let mut bundle = Bundle::new();
        bundle.insert("usage.txt", b"usage".to_vec());
        bundle.insert("bacon.json", b"{}".to_vec());
        bundle.insert("assets/logo.svg", b"<svg/>".to_vec());

        let keys: Vec<&str> = bundle.keys().collect();
        assert_eq!(keys, vec!["assets/logo.svg", "bacon.json", "usage.txt"]);
    }

    #[test]
    fn test_text_detection() {
        let mut bundle: Bundle = [("a", b"plain".to_vec())].into_iter().collect();
        assert!(bundle.is_text());
        assert_eq!(bundle.get_str("a"), Some("plain"));

        bundle.insert("b", vec![0x1f, 0x8b, 0xff]);
        assert!(!bundle.is_text());
        assert_eq!(bundle.get_str("b"), None);
        assert_eq!(bundle.get("b"), Some(&[0x1f, 0x8b, 0xff][..]));
        assert_eq!(bundle.encoded_size(), 8);
    }
}
