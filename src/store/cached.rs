//! Cached snapshot over a persistence engine
//!
//! The snapshot is trusted only while the dirty flag is clear. The flag is
//! set on construction and after every successful persist, so the first
//! read after a write reconciles with the file on disk.

use std::sync::{Mutex, MutexGuard};

use super::errors::StoreResult;
use crate::codec::{Codec, JsonCodec};
use crate::observability::{log_event_with_fields, Event};
use crate::persist::TextFile;

#[derive(Debug)]
struct CacheState<T> {
    snapshot: Option<T>,
    dirty: bool,
    /// Bumped by every successful persist
    generation: u64,
}

impl<T> CacheState<T> {
    /// Install a snapshot read when the generation was `read_at`.
    ///
    /// Stays dirty if a persist landed since; that write may be newer than
    /// what was read.
    fn install(&mut self, snapshot: Option<T>, read_at: u64) {
        self.snapshot = snapshot;
        self.dirty = self.generation != read_at;
    }

    fn record_persist(&mut self) {
        self.dirty = true;
        self.generation += 1;
    }
}

/// One in-memory snapshot of a collection, lazily loaded from its engine.
///
/// The cache lock is never held across an engine call, so concurrent
/// operations can each persist and have their writes coalesced.
pub struct CachedStore<T, C = JsonCodec<T>> {
    engine: TextFile,
    codec: C,
    cache: Mutex<CacheState<T>>,
}

impl<T, C> CachedStore<T, C>
where
    C: Codec<T>,
{
    /// Wrap `engine`; the first `load` reads from disk.
    pub fn new(engine: TextFile, codec: C) -> Self {
        Self {
            engine,
            codec,
            cache: Mutex::new(CacheState {
                snapshot: None,
                dirty: true,
                generation: 0,
            }),
        }
    }

    /// The owned persistence engine
    pub fn engine(&self) -> &TextFile {
        &self.engine
    }

    /// Whether the snapshot must be reloaded before use
    pub fn is_dirty(&self) -> bool {
        self.lock_cache().dirty
    }

    /// Force the next `load` to read from disk
    pub fn mark_dirty(&self) {
        self.lock_cache().dirty = true;
    }

    fn lock_cache(&self) -> MutexGuard<'_, CacheState<T>> {
        self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Reload the snapshot if dirty.
    ///
    /// An absent file leaves the snapshot unset. Decode failures propagate
    /// and keep the dirty flag set.
    pub async fn load(&self) -> StoreResult<()> {
        let generation = {
            let cache = self.lock_cache();
            if !cache.dirty {
                return Ok(());
            }
            cache.generation
        };

        let snapshot = match self.engine.read().await {
            Some(payload) => match self.codec.decode(&payload) {
                Ok(value) => Some(value),
                Err(e) => {
                    log_event_with_fields(
                        Event::StoreDecodeFailed,
                        &[
                            ("path", &self.engine.path().display().to_string()),
                            ("reason", &e.to_string()),
                        ],
                    );
                    return Err(e.into());
                }
            },
            None => None,
        };

        let present = snapshot.is_some();
        self.lock_cache().install(snapshot, generation);

        log_event_with_fields(
            Event::StoreLoad,
            &[
                ("path", &self.engine.path().display().to_string()),
                ("present", if present { "true" } else { "false" }),
            ],
        );
        Ok(())
    }

    /// Encode and write the snapshot; no-op when no snapshot is set.
    ///
    /// Marks the cache dirty once the write lands.
    pub async fn persist(&self) -> StoreResult<()> {
        let payload = {
            let cache = self.lock_cache();
            match &cache.snapshot {
                Some(snapshot) => self.codec.encode(snapshot)?,
                None => return Ok(()),
            }
        };

        self.engine.write(payload).await?;

        self.lock_cache().record_persist();
        Ok(())
    }

    /// Run `f` against the snapshot without suspending.
    pub fn with_snapshot<R>(&self, f: impl FnOnce(&mut Option<T>) -> R) -> R {
        let mut cache = self.lock_cache();
        f(&mut cache.snapshot)
    }

    /// Copy of the current snapshot
    pub fn snapshot(&self) -> Option<T>
    where
        T: Clone,
    {
        self.lock_cache().snapshot.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::JsonCodec;
    use std::fs;
    use tempfile::TempDir;

    fn store_in(temp_dir: &TempDir) -> CachedStore<Vec<String>> {
        let engine = TextFile::new(temp_dir.path().join("db.json")).unwrap();
        CachedStore::new(engine, JsonCodec::compact())
    }

    #[test]
    fn test_new_store_is_dirty() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir);

        assert!(store.is_dirty());
        assert!(store.snapshot().is_none());
    }

    #[tokio::test]
    async fn test_load_missing_file_leaves_snapshot_unset() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir);

        store.load().await.unwrap();

        assert!(!store.is_dirty());
        assert!(store.snapshot().is_none());
    }

    #[tokio::test]
    async fn test_load_is_noop_when_clean() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir);

        store.load().await.unwrap();
        fs::write(store.engine().path(), r#"["external"]"#).unwrap();
        store.load().await.unwrap();

        assert!(store.snapshot().is_none());
        assert_eq!(store.engine().metrics().snapshot().reads, 1);
    }

    #[tokio::test]
    async fn test_persist_without_snapshot_writes_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir);

        store.load().await.unwrap();
        store.persist().await.unwrap();

        assert_eq!(store.engine().metrics().write_attempts(), 0);
        assert!(!store.engine().path().exists());
    }

    #[tokio::test]
    async fn test_empty_snapshot_is_persisted() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir);

        store.load().await.unwrap();
        store.with_snapshot(|s| *s = Some(Vec::new()));
        store.persist().await.unwrap();

        assert_eq!(fs::read_to_string(store.engine().path()).unwrap(), "[]");
    }

    #[tokio::test]
    async fn test_persist_marks_dirty_and_reload_sees_external_change() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir);

        store.load().await.unwrap();
        store.with_snapshot(|s| *s = Some(vec!["a".to_string()]));
        store.persist().await.unwrap();
        assert!(store.is_dirty());

        // Out-of-band edit after our write
        fs::write(store.engine().path(), r#"["a","b"]"#).unwrap();
        store.load().await.unwrap();

        assert_eq!(store.snapshot(), Some(vec!["a".to_string(), "b".to_string()]));
        assert!(!store.is_dirty());
    }

    #[test]
    fn test_install_after_concurrent_persist_stays_dirty() {
        let mut cache = CacheState::<Vec<String>> {
            snapshot: None,
            dirty: true,
            generation: 0,
        };

        // Read started at generation 0, then a persist landed
        let read_at = cache.generation;
        cache.record_persist();
        cache.install(Some(Vec::new()), read_at);
        assert!(cache.dirty);

        let read_at = cache.generation;
        cache.install(Some(Vec::new()), read_at);
        assert!(!cache.dirty);
    }

    #[tokio::test]
    async fn test_load_overlapping_persist_ends_dirty() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir);
        store.load().await.unwrap();
        store.with_snapshot(|s| *s = Some(vec!["a".to_string()]));
        store.mark_dirty();

        // Either may finish first; the pre-write read must not be trusted
        let (persisted, loaded) = tokio::join!(store.persist(), store.load());
        persisted.unwrap();
        loaded.unwrap();

        assert!(store.is_dirty());
        store.load().await.unwrap();
        assert_eq!(store.snapshot(), Some(vec!["a".to_string()]));
    }

    #[tokio::test]
    async fn test_decode_error_propagates_and_stays_dirty() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir);
        fs::write(store.engine().path(), "{ not json").unwrap();

        let err = store.load().await.unwrap_err();

        assert_eq!(err.code(), "DOCSTORE_CODEC_DECODE_FAILED");
        assert!(store.is_dirty());
    }

    #[tokio::test]
    async fn test_failed_persist_leaves_dirty_flag() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir);

        store.load().await.unwrap();
        fs::create_dir(store.engine().path()).unwrap();
        store.with_snapshot(|s| *s = Some(vec!["x".to_string()]));

        let err = store.persist().await.unwrap_err();

        assert_eq!(err.code(), "DOCSTORE_PERSIST_RENAME_FAILED");
        assert!(!store.is_dirty());
    }
}
