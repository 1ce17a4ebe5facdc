//! The `meta` multi-valued string map carried on every [`crate::Record`].
//!
//! Serialized as a plain JSON object (`{"site_id": ["a"], ...}`), but kept
//! internally as an ordered list of `(key, values)` pairs rather than a
//! `BTreeMap` / `HashMap`: round-tripping must preserve both key order and
//! the order of values within a key, and neither standard map type does
//! that.

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Meta(Vec<(String, Vec<String>)>);

impl Meta {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Insert (or replace) the value list for `key`. Returns `self` so
    /// callers can chain, e.g. `Meta::new().insert("site_id", vec!["A".into()])`.
    pub fn insert(mut self, key: impl Into<String>, values: Vec<String>) -> Self {
        let key = key.into();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = values,
            None => self.0.push((key, values)),
        }
        self
    }

    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_slice())
    }

    /// Convenience used by [`crate::Record::site_id`]: the first value at
    /// `key`, or `""` if the key is absent or empty.
    pub fn first(&self, key: &str) -> &str {
        self.get(key).and_then(|v| v.first()).map_or("", |s| s)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(k, _)| k.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl Serialize for Meta {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (k, v) in &self.0 {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Meta {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct MetaVisitor;

        impl<'de> Visitor<'de> for MetaVisitor {
            type Value = Meta;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a JSON object mapping string keys to arrays of strings")
            }

            fn visit_map<M: MapAccess<'de>>(self, mut access: M) -> Result<Meta, M::Error> {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((k, v)) = access.next_entry::<String, Vec<String>>()? {
                    entries.push((k, v));
                }
                Ok(Meta(entries))
            }
        }

        deserializer.deserialize_map(MetaVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_preserves_key_order() {
        let meta = Meta::new()
            .insert("b", vec!["2".into()])
            .insert("a", vec!["1".into()]);
        assert_eq!(meta.keys().collect::<Vec<_>>(), vec!["b", "a"]);
    }

    #[test]
    fn insert_replaces_existing_key_in_place() {
        let meta = Meta::new()
            .insert("a", vec!["1".into()])
            .insert("b", vec!["2".into()])
            .insert("a", vec!["3".into()]);
        assert_eq!(meta.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(meta.get("a"), Some(&["3".to_string()][..]));
    }

    #[test]
    fn json_round_trip_preserves_order() {
        let meta = Meta::new()
            .insert("group_id", vec!["group_1".into()])
            .insert("site_id", vec!["site_A".into()])
            .insert("nodes", vec!["node1".into(), "node2".into()]);
        let json = serde_json::to_string(&meta).unwrap();
        let back: Meta = serde_json::from_str(&json).unwrap();
        assert_eq!(meta, back);
        assert_eq!(back.keys().collect::<Vec<_>>(), vec!["group_id", "site_id", "nodes"]);
    }

    #[test]
    fn first_defaults_to_empty_string() {
        let meta = Meta::new();
        assert_eq!(meta.first("site_id"), "");
    }
}
