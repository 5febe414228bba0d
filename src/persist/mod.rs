//! Persistence engine
//!
//! Owns one backing file and guarantees:
//!
//! - Atomic replacement (temp file + rename, never an in-place write)
//! - At most one physical write in flight
//! - Concurrent requests coalesce: only the latest queued payload is written,
//!   and every caller it superseded is resolved with its outcome
//! - Best-effort reads: missing, unreadable, or empty files read as absent
//!
//! The engine knows nothing about documents; it moves opaque text payloads.

mod errors;
mod state;
mod text_file;

pub use errors::{PersistError, PersistResult};
pub use state::{Submission, WriteBatch, WriteState};
pub use text_file::{temp_path_for, PersistOptions, TextFile};
