//! Config cache (spec.md §4.1): a concurrent local mirror of the config
//! store tree, with typed getters so callers don't hand-parse bytes.

use bytes::Bytes;
use dashmap::DashMap;
use serde::de::DeserializeOwned;
use std::str::FromStr;

/// Concurrent local mirror of the config tree, keyed by full path.
/// `DashMap`'s per-shard locking gives lock-free reads across unrelated
/// paths and a single-writer-per-shard story for the watch task
/// (same pattern the teacher uses for its validator cache in
/// `services/filter_validation.rs`).
#[derive(Debug, Default)]
pub struct ConfigCache {
    entries: DashMap<String, Bytes>,
}

impl ConfigCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, path: impl Into<String>, value: Bytes) {
        self.entries.insert(path.into(), value);
    }

    pub fn remove(&self, path: &str) {
        self.entries.remove(path);
    }

    pub fn get_raw(&self, path: &str) -> Option<Bytes> {
        self.entries.get(path).map(|entry| entry.value().clone())
    }

    pub fn get_string(&self, path: &str) -> Option<String> {
        self.get_raw(path).and_then(|bytes| String::from_utf8(bytes.to_vec()).ok())
    }

    pub fn get_parsed<T: FromStr>(&self, path: &str) -> Option<T> {
        self.get_string(path).and_then(|s| s.trim().parse().ok())
    }

    pub fn get_int(&self, path: &str) -> Option<i64> {
        self.get_parsed(path)
    }

    pub fn get_bool(&self, path: &str) -> Option<bool> {
        self.get_parsed(path)
    }

    /// Comma-separated list leaf, e.g. `writeMethods = "POST,PUT,DELETE"`.
    pub fn get_csv(&self, path: &str) -> Option<Vec<String>> {
        self.get_string(path).map(|raw| {
            raw.split(',').map(str::trim).filter(|s| !s.is_empty()).map(str::to_string).collect()
        })
    }

    /// Nested subtree read as one JSON blob (e.g. `filterConfig`), rather
    /// than walking individual grandchild paths — a reasonable
    /// implementation choice for leaves the spec models as structured data,
    /// recorded in DESIGN.md.
    pub fn get_json<T: DeserializeOwned>(&self, path: &str) -> Option<T> {
        self.get_raw(path).and_then(|bytes| serde_json::from_slice(&bytes).ok())
    }

    /// All paths directly under `prefix` (one level deep), used to discover
    /// the set of declared endpoint names (spec.md §4.2).
    pub fn child_names(&self, prefix: &str) -> Vec<String> {
        let prefix = if prefix.ends_with('/') { prefix.to_string() } else { format!("{prefix}/") };
        let mut names: Vec<String> = self
            .entries
            .iter()
            .filter_map(|entry| {
                let rest = entry.key().strip_prefix(&prefix)?;
                rest.split('/').next().map(str::to_string)
            })
            .collect();
        names.sort();
        names.dedup();
        names
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_getters_round_trip() {
        let cache = ConfigCache::new();
        cache.put("endpoints/widgets/path", Bytes::from_static(b"/widgets"));
        cache.put("endpoints/widgets/timeoutMs", Bytes::from_static(b"250"));
        cache.put("endpoints/widgets/enabled", Bytes::from_static(b"true"));
        cache.put("endpoints/widgets/writeMethods", Bytes::from_static(b"POST, PUT"));

        assert_eq!(cache.get_string("endpoints/widgets/path").as_deref(), Some("/widgets"));
        assert_eq!(cache.get_int("endpoints/widgets/timeoutMs"), Some(250));
        assert_eq!(cache.get_bool("endpoints/widgets/enabled"), Some(true));
        assert_eq!(
            cache.get_csv("endpoints/widgets/writeMethods"),
            Some(vec!["POST".to_string(), "PUT".to_string()])
        );
    }

    #[test]
    fn child_names_are_one_level_deep() {
        let cache = ConfigCache::new();
        cache.put("endpoints/widgets/path", Bytes::from_static(b"/widgets"));
        cache.put("endpoints/gadgets/path", Bytes::from_static(b"/gadgets"));

        let names = cache.child_names("endpoints");
        assert_eq!(names, vec!["gadgets".to_string(), "widgets".to_string()]);
    }

    #[test]
    fn missing_leaf_is_none() {
        let cache = ConfigCache::new();
        assert_eq!(cache.get_string("nope"), None);
    }
}
