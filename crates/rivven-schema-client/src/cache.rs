//! Client-side resolution cache
//!
//! Three independent key spaces, filled on read-miss only:
//! - schema ID -> entry
//! - subject -> latest entry
//! - (subject, version) -> entry
//!
//! Entries are never evicted or invalidated; a cached "latest" goes stale
//! when a newer version is registered. Disabling the cache drops every key
//! space, and a disabled key space is `None` so a late populate is a no-op.

use crate::types::{Schema, SchemaId};
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

type KeySpace<K> = RwLock<Option<HashMap<K, Schema>>>;

/// Entry counts per key space
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub enabled: bool,
    pub by_id: usize,
    pub latest: usize,
    pub by_version: usize,
}

impl CacheStats {
    pub fn total(&self) -> usize {
        self.by_id + self.latest + self.by_version
    }
}

/// Three-key-space lookup cache for resolved schemas
pub struct ResolutionCache {
    by_id: KeySpace<SchemaId>,
    latest: KeySpace<String>,
    by_version: KeySpace<(String, u32)>,
}

impl Default for ResolutionCache {
    fn default() -> Self {
        Self::new(true)
    }
}

impl std::fmt::Debug for ResolutionCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolutionCache")
            .field("stats", &self.stats())
            .finish()
    }
}

fn space<K>(enabled: bool) -> KeySpace<K> {
    RwLock::new(enabled.then(HashMap::new))
}

fn lookup<K, Q>(space: &KeySpace<K>, key: &Q) -> Option<Schema>
where
    K: std::borrow::Borrow<Q> + std::hash::Hash + Eq,
    Q: std::hash::Hash + Eq + ?Sized,
{
    space.read().as_ref().and_then(|map| map.get(key).cloned())
}

fn populate<K: std::hash::Hash + Eq>(space: &KeySpace<K>, key: K, schema: Schema) {
    if let Some(map) = space.write().as_mut() {
        map.insert(key, schema);
    }
}

impl ResolutionCache {
    pub fn new(enabled: bool) -> Self {
        Self {
            by_id: space(enabled),
            latest: space(enabled),
            by_version: space(enabled),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.by_id.read().is_some()
    }

    /// Turn caching on or off
    ///
    /// Disabling clears all key spaces. Enabling an enabled cache keeps its
    /// contents.
    pub fn set_enabled(&self, enabled: bool) {
        // Fixed lock order: by_id, latest, by_version
        let mut by_id = self.by_id.write();
        let mut latest = self.latest.write();
        let mut by_version = self.by_version.write();

        if enabled {
            by_id.get_or_insert_with(HashMap::new);
            latest.get_or_insert_with(HashMap::new);
            by_version.get_or_insert_with(HashMap::new);
        } else {
            *by_id = None;
            *latest = None;
            *by_version = None;
        }
        debug!(enabled, "Resolution cache toggled");
    }

    pub fn get_by_id(&self, id: SchemaId) -> Option<Schema> {
        lookup(&self.by_id, &id)
    }

    pub fn put_by_id(&self, schema: Schema) {
        populate(&self.by_id, schema.id(), schema);
    }

    pub fn get_latest(&self, subject: &str) -> Option<Schema> {
        lookup(&self.latest, subject)
    }

    pub fn put_latest(&self, subject: &str, schema: Schema) {
        populate(&self.latest, subject.to_string(), schema);
    }

    pub fn get_version(&self, subject: &str, version: u32) -> Option<Schema> {
        lookup(&self.by_version, &(subject.to_string(), version))
    }

    pub fn put_version(&self, subject: &str, version: u32, schema: Schema) {
        populate(&self.by_version, (subject.to_string(), version), schema);
    }

    pub fn stats(&self) -> CacheStats {
        let by_id = self.by_id.read();
        let latest = self.latest.read();
        let by_version = self.by_version.read();
        CacheStats {
            enabled: by_id.is_some(),
            by_id: by_id.as_ref().map_or(0, HashMap::len),
            latest: latest.as_ref().map_or(0, HashMap::len),
            by_version: by_version.as_ref().map_or(0, HashMap::len),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SchemaType;

    fn entry(id: u32, subject: &str, version: u32) -> Schema {
        Schema::new(SchemaId::new(id), subject, version, SchemaType::Avro, r#""int""#)
    }

    #[test]
    fn test_key_spaces_are_independent() {
        let cache = ResolutionCache::default();
        cache.put_by_id(entry(1, "s", 1));

        assert!(cache.get_by_id(SchemaId::new(1)).is_some());
        assert!(cache.get_latest("s").is_none());
        assert!(cache.get_version("s", 1).is_none());

        cache.put_latest("s", entry(1, "s", 1));
        cache.put_version("s", 1, entry(1, "s", 1));
        assert_eq!(
            cache.stats(),
            CacheStats {
                enabled: true,
                by_id: 1,
                latest: 1,
                by_version: 1
            }
        );
    }

    #[test]
    fn test_disable_clears_and_blocks_population() {
        let cache = ResolutionCache::default();
        cache.put_by_id(entry(1, "s", 1));
        cache.put_latest("s", entry(1, "s", 1));

        cache.set_enabled(false);
        assert!(!cache.is_enabled());
        assert_eq!(cache.stats().total(), 0);

        cache.put_by_id(entry(2, "s", 2));
        assert!(cache.get_by_id(SchemaId::new(2)).is_none());

        cache.set_enabled(true);
        assert!(cache.is_enabled());
        assert_eq!(cache.stats().total(), 0);
    }

    #[test]
    fn test_version_lookup_is_keyed_by_subject_and_version() {
        let cache = ResolutionCache::default();
        cache.put_version("a", 1, entry(1, "a", 1));
        cache.put_version("b", 1, entry(2, "b", 1));

        assert_eq!(cache.get_version("a", 1).unwrap().id(), SchemaId::new(1));
        assert_eq!(cache.get_version("b", 1).unwrap().id(), SchemaId::new(2));
        assert!(cache.get_version("a", 2).is_none());
        assert!(cache.get_version("c", 1).is_none());

        cache.set_enabled(false);
        cache.put_version("a", 1, entry(1, "a", 1));
        assert!(cache.get_version("a", 1).is_none());
    }

    #[test]
    fn test_enable_twice_keeps_contents() {
        let cache = ResolutionCache::new(true);
        cache.put_version("s", 3, entry(7, "s", 3));
        cache.set_enabled(true);
        assert_eq!(cache.get_version("s", 3).unwrap().id(), SchemaId::new(7));
    }

    #[test]
    fn test_cached_copy_shares_codec() {
        let cache = ResolutionCache::default();
        let original = entry(1, "s", 1);
        cache.put_by_id(original.clone());
        let cached = cache.get_by_id(SchemaId::new(1)).unwrap();
        assert!(cached.shares_codec_with(&original));
    }
}
