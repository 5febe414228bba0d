//! Observable events
//!
//! Every log line emitted by docstore names one of these events.

use std::fmt;

/// Observable events in docstore
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Configuration
    /// Configuration loaded
    ConfigLoaded,

    // Persistence engine
    /// Backing file read (present or absent)
    PersistRead,
    /// Backing file could not be read; treated as absent
    PersistReadFailed,
    /// Physical write started
    PersistWriteBegin,
    /// Physical write renamed into place
    PersistWriteComplete,
    /// Physical write failed
    PersistWriteFailed,
    /// A queued payload was replaced by a newer one
    PersistWriteCoalesced,
    /// Directory fsync after rename failed; the write itself succeeded
    PersistDirSyncFailed,

    // Cached store
    /// Snapshot reloaded from storage
    StoreLoad,
    /// Backing file content could not be decoded
    StoreDecodeFailed,

    // Collection
    /// Document created
    DocumentCreated,
    /// Document updated
    DocumentUpdated,
    /// Document deleted
    DocumentDeleted,
    /// Operation rejected before any I/O
    OperationRejected,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",

            Event::PersistRead => "PERSIST_READ",
            Event::PersistReadFailed => "PERSIST_READ_FAILED",
            Event::PersistWriteBegin => "PERSIST_WRITE_BEGIN",
            Event::PersistWriteComplete => "PERSIST_WRITE_COMPLETE",
            Event::PersistWriteFailed => "PERSIST_WRITE_FAILED",
            Event::PersistWriteCoalesced => "PERSIST_WRITE_COALESCED",
            Event::PersistDirSyncFailed => "PERSIST_DIR_SYNC_FAILED",

            Event::StoreLoad => "STORE_LOAD",
            Event::StoreDecodeFailed => "STORE_DECODE_FAILED",

            Event::DocumentCreated => "DOCUMENT_CREATED",
            Event::DocumentUpdated => "DOCUMENT_UPDATED",
            Event::DocumentDeleted => "DOCUMENT_DELETED",
            Event::OperationRejected => "OPERATION_REJECTED",
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
