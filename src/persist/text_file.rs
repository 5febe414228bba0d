//! Atomic, coalescing text file engine
//!
//! Writes never touch the backing file directly:
//! 1. Write payload to `.<name>.tmp` beside the target
//! 2. fsync the temp file
//! 3. Rename temp onto target (atomic within one directory)
//! 4. fsync the parent directory (best effort)
//!
//! A crash at any point leaves the target holding either the previous
//! complete payload or the new one.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::oneshot;

use super::errors::{PersistError, PersistResult};
use super::state::{Submission, WriteBatch, WriteState};
use crate::crash_point::{maybe_crash, points};
use crate::observability::{log_event_with_fields, Event, PersistMetrics};

/// Engine options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PersistOptions {
    /// fsync the temp file before rename and the directory after it
    pub fsync: bool,
}

impl Default for PersistOptions {
    fn default() -> Self {
        Self { fsync: true }
    }
}

/// Sibling temp file for `path`: same directory, `.<basename>.tmp`
pub fn temp_path_for(path: &Path) -> PersistResult<PathBuf> {
    let name = path
        .file_name()
        .ok_or_else(|| PersistError::InvalidPath(path.display().to_string()))?;

    let mut temp_name = std::ffi::OsString::from(".");
    temp_name.push(name);
    temp_name.push(".tmp");

    Ok(path.with_file_name(temp_name))
}

/// Persistence engine bound to one backing file.
///
/// Any number of tasks may call [`TextFile::write`] concurrently. At most one
/// physical write runs at a time; requests arriving meanwhile collapse into
/// a single queued write of the most recent payload.
#[derive(Debug)]
pub struct TextFile {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    path: PathBuf,
    temp_path: PathBuf,
    options: PersistOptions,
    state: Mutex<WriteState>,
    metrics: PersistMetrics,
}

impl TextFile {
    /// Create an engine for `path` with default options.
    ///
    /// # Errors
    ///
    /// `InvalidPath` if `path` has no file name component.
    pub fn new(path: impl Into<PathBuf>) -> PersistResult<Self> {
        Self::with_options(path, PersistOptions::default())
    }

    /// Create an engine for `path`.
    pub fn with_options(path: impl Into<PathBuf>, options: PersistOptions) -> PersistResult<Self> {
        let path = path.into();
        let temp_path = temp_path_for(&path)?;

        Ok(Self {
            inner: Arc::new(Inner {
                path,
                temp_path,
                options,
                state: Mutex::new(WriteState::Idle),
                metrics: PersistMetrics::new(),
            }),
        })
    }

    /// Backing file path
    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    /// Temp file path used during writes
    pub fn temp_path(&self) -> &Path {
        &self.inner.temp_path
    }

    /// Engine counters
    pub fn metrics(&self) -> &PersistMetrics {
        &self.inner.metrics
    }

    /// Whether no physical write is in flight
    pub fn is_idle(&self) -> bool {
        self.inner.lock_state().is_idle()
    }

    /// Read the backing file.
    ///
    /// Missing, unreadable, or empty files are all `None`.
    pub async fn read(&self) -> Option<String> {
        let path = &self.inner.path;
        let content = match fs::read_to_string(path).await {
            Ok(content) => Some(content).filter(|c| !c.is_empty()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => {
                log_event_with_fields(
                    Event::PersistReadFailed,
                    &[
                        ("path", &path.display().to_string()),
                        ("reason", &e.to_string()),
                    ],
                );
                None
            }
        };

        self.inner.metrics.record_read(content.is_none());
        log_event_with_fields(
            Event::PersistRead,
            &[
                ("path", &path.display().to_string()),
                ("present", if content.is_some() { "true" } else { "false" }),
            ],
        );
        content
    }

    /// Persist `payload` as the new content of the backing file.
    ///
    /// Resolves once `payload`, or a later payload that superseded it while
    /// queued, has been renamed into place. A failed physical write rejects
    /// every caller coalesced into it.
    ///
    /// Dropping the returned future does not cancel the physical write.
    pub async fn write(&self, payload: impl Into<String>) -> PersistResult<()> {
        let (tx, rx) = oneshot::channel();

        let submission = self.inner.lock_state().submit(payload.into(), tx);
        match submission {
            Submission::Start(batch) => {
                let inner = Arc::clone(&self.inner);
                tokio::spawn(inner.drive(batch));
            }
            Submission::Queued { superseded, waiters } => {
                if superseded {
                    self.inner.metrics.record_coalesced();
                    log_event_with_fields(
                        Event::PersistWriteCoalesced,
                        &[
                            ("path", &self.inner.path.display().to_string()),
                            ("waiters", &waiters.to_string()),
                        ],
                    );
                }
            }
        }

        match rx.await {
            Ok(result) => result,
            Err(_) => Err(PersistError::Interrupted),
        }
    }
}

impl Inner {
    fn lock_state(&self) -> MutexGuard<'_, WriteState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Write batches until nothing is queued, then return to idle.
    async fn drive(self: Arc<Self>, first: WriteBatch) {
        let mut batch = first;
        loop {
            let result = self.write_atomic(batch.payload()).await;
            batch.resolve(&result);

            let next = self.lock_state().complete();
            match next {
                Some(next) => batch = next,
                None => break,
            }
        }
    }

    async fn write_atomic(&self, payload: &str) -> PersistResult<()> {
        let path = self.path.display().to_string();
        log_event_with_fields(
            Event::PersistWriteBegin,
            &[("bytes", &payload.len().to_string()), ("path", &path)],
        );

        match self.write_and_rename(payload).await {
            Ok(()) => {
                self.metrics.record_write(payload.len() as u64);
                log_event_with_fields(
                    Event::PersistWriteComplete,
                    &[("bytes", &payload.len().to_string()), ("path", &path)],
                );
                Ok(())
            }
            Err(e) => {
                self.metrics.record_failed_write();
                log_event_with_fields(
                    Event::PersistWriteFailed,
                    &[
                        ("code", e.code()),
                        ("path", &path),
                        ("reason", &e.to_string()),
                    ],
                );
                Err(e)
            }
        }
    }

    async fn write_and_rename(&self, payload: &str) -> PersistResult<()> {
        let dir = parent_dir(&self.path);
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| PersistError::create_dir(&dir, e))?;

        maybe_crash(points::PERSIST_BEFORE_TEMP_WRITE);

        let mut file = fs::File::create(&self.temp_path)
            .await
            .map_err(|e| PersistError::temp_write(&self.temp_path, e))?;
        file.write_all(payload.as_bytes())
            .await
            .map_err(|e| PersistError::temp_write(&self.temp_path, e))?;
        file.flush()
            .await
            .map_err(|e| PersistError::temp_write(&self.temp_path, e))?;

        if self.options.fsync {
            file.sync_all()
                .await
                .map_err(|e| PersistError::sync(&self.temp_path, e))?;
        }
        drop(file);

        maybe_crash(points::PERSIST_AFTER_TEMP_WRITE);

        fs::rename(&self.temp_path, &self.path)
            .await
            .map_err(|e| PersistError::rename(&self.temp_path, &self.path, e))?;

        // Make the rename itself durable
        if self.options.fsync {
            if let Err(e) = sync_dir(&dir).await {
                log_event_with_fields(
                    Event::PersistDirSyncFailed,
                    &[
                        ("path", &dir.display().to_string()),
                        ("reason", &e.to_string()),
                    ],
                );
            }
        }

        maybe_crash(points::PERSIST_AFTER_RENAME);

        Ok(())
    }
}

/// fsync a directory so a rename inside it survives a crash
async fn sync_dir(dir: &Path) -> io::Result<()> {
    fs::File::open(dir).await?.sync_all().await
}

/// Directory holding `path`; `.` for bare file names.
fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs as std_fs;
    use tempfile::TempDir;

    fn engine_in(temp_dir: &TempDir) -> TextFile {
        TextFile::new(temp_dir.path().join("db.json")).unwrap()
    }

    #[test]
    fn test_temp_path_is_hidden_sibling() {
        let temp = temp_path_for(Path::new("/data/users.json")).unwrap();
        assert_eq!(temp, Path::new("/data/.users.json.tmp"));

        let bare = temp_path_for(Path::new("users.json")).unwrap();
        assert_eq!(bare, Path::new(".users.json.tmp"));
    }

    #[test]
    fn test_path_without_file_name_rejected() {
        let result = TextFile::new("/");
        assert!(matches!(result, Err(PersistError::InvalidPath(_))));
    }

    #[test]
    fn test_parent_dir_of_bare_name() {
        assert_eq!(parent_dir(Path::new("db.json")), PathBuf::from("."));
        assert_eq!(parent_dir(Path::new("/a/db.json")), PathBuf::from("/a"));
    }

    #[tokio::test]
    async fn test_sync_dir_reports_failure() {
        let temp_dir = TempDir::new().unwrap();

        assert!(sync_dir(temp_dir.path()).await.is_ok());
        let err = sync_dir(&temp_dir.path().join("gone")).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_read_missing_file_is_absent() {
        let temp_dir = TempDir::new().unwrap();
        let engine = engine_in(&temp_dir);

        assert!(engine.read().await.is_none());
        assert_eq!(engine.metrics().snapshot().absent_reads, 1);
    }

    #[tokio::test]
    async fn test_read_empty_file_is_absent() {
        let temp_dir = TempDir::new().unwrap();
        let engine = engine_in(&temp_dir);
        std_fs::write(engine.path(), "").unwrap();

        assert!(engine.read().await.is_none());
    }

    #[tokio::test]
    async fn test_read_directory_is_absent() {
        let temp_dir = TempDir::new().unwrap();
        let engine = engine_in(&temp_dir);
        std_fs::create_dir(engine.path()).unwrap();

        assert!(engine.read().await.is_none());
    }

    #[tokio::test]
    async fn test_write_then_read() {
        let temp_dir = TempDir::new().unwrap();
        let engine = engine_in(&temp_dir);

        engine.write("[1,2,3]").await.unwrap();

        assert_eq!(engine.read().await.as_deref(), Some("[1,2,3]"));
        assert!(!engine.temp_path().exists());
        assert!(engine.is_idle());
    }

    #[tokio::test]
    async fn test_write_creates_parent_directories() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("deeper").join("db.json");
        let engine = TextFile::new(&path).unwrap();

        engine.write("[]").await.unwrap();

        assert_eq!(std_fs::read_to_string(&path).unwrap(), "[]");
    }

    #[tokio::test]
    async fn test_stale_temp_file_is_ignored_and_overwritten() {
        let temp_dir = TempDir::new().unwrap();
        let engine = engine_in(&temp_dir);

        engine.write("old").await.unwrap();
        std_fs::write(engine.temp_path(), "partial garb").unwrap();

        assert_eq!(engine.read().await.as_deref(), Some("old"));

        engine.write("new").await.unwrap();
        assert_eq!(engine.read().await.as_deref(), Some("new"));
        assert!(!engine.temp_path().exists());
    }

    #[tokio::test]
    async fn test_sequential_writes_each_land() {
        let temp_dir = TempDir::new().unwrap();
        let engine = engine_in(&temp_dir);

        engine.write("a").await.unwrap();
        engine.write("b").await.unwrap();

        let s = engine.metrics().snapshot();
        assert_eq!(s.physical_writes, 2);
        assert_eq!(s.coalesced_writes, 0);
        assert_eq!(s.bytes_written, 2);
    }

    #[tokio::test]
    async fn test_concurrent_writes_coalesce_to_latest() {
        let temp_dir = TempDir::new().unwrap();
        let engine = engine_in(&temp_dir);

        let (r1, r2, r3) = tokio::join!(engine.write("w1"), engine.write("w2"), engine.write("w3"));
        r1.unwrap();
        r2.unwrap();
        r3.unwrap();

        let s = engine.metrics().snapshot();
        assert_eq!(s.physical_writes, 2);
        assert_eq!(s.coalesced_writes, 1);
        assert_eq!(engine.read().await.as_deref(), Some("w3"));
    }

    #[tokio::test]
    async fn test_failed_rename_rejects_and_preserves_target() {
        let temp_dir = TempDir::new().unwrap();
        let engine = engine_in(&temp_dir);

        // A directory at the target path makes the rename fail
        std_fs::create_dir(engine.path()).unwrap();

        let err = engine.write("data").await.unwrap_err();
        assert_eq!(err.code(), "DOCSTORE_PERSIST_RENAME_FAILED");
        assert!(engine.path().is_dir());
        assert_eq!(engine.metrics().snapshot().failed_writes, 1);

        // Later writes are still attempted
        std_fs::remove_dir(engine.path()).unwrap();
        engine.write("data").await.unwrap();
        assert_eq!(engine.read().await.as_deref(), Some("data"));
    }

    #[tokio::test]
    async fn test_fsync_disabled_still_writes() {
        let temp_dir = TempDir::new().unwrap();
        let engine = TextFile::with_options(
            temp_dir.path().join("db.json"),
            PersistOptions { fsync: false },
        )
        .unwrap();

        engine.write("fast").await.unwrap();
        assert_eq!(engine.read().await.as_deref(), Some("fast"));
    }
}
