//! Crash point injection for testing durability
//!
//! When `DOCSTORE_CRASH_POINT` names a point that execution reaches, the
//! process terminates immediately via `std::process::abort()`: no cleanup,
//! no unwinding, no catching.
//!
//! ```bash
//! DOCSTORE_CRASH_POINT=persist_after_temp_write docstore --file users.json create --data '{}'
//! ```

use std::sync::OnceLock;

/// Environment variable holding the active crash point
pub const CRASH_POINT_ENV: &str = "DOCSTORE_CRASH_POINT";

static CRASH_POINT: OnceLock<Option<String>> = OnceLock::new();

#[inline]
fn get_crash_point() -> Option<&'static str> {
    CRASH_POINT
        .get_or_init(|| std::env::var(CRASH_POINT_ENV).ok())
        .as_deref()
}

/// Returns true if `DOCSTORE_CRASH_POINT` equals the given name.
#[inline]
pub fn crash_point_enabled(name: &str) -> bool {
    get_crash_point().map(|p| p == name).unwrap_or(false)
}

/// Abort the process if the named crash point is enabled.
///
/// No-op when `DOCSTORE_CRASH_POINT` is unset or names another point.
#[inline]
pub fn maybe_crash(name: &str) {
    if crash_point_enabled(name) {
        eprintln!("[CRASH] Triggering crash at point: {}", name);
        std::process::abort();
    }
}

/// All defined crash point names
pub mod points {
    /// Before the temp file is created
    pub const PERSIST_BEFORE_TEMP_WRITE: &str = "persist_before_temp_write";
    /// Temp file written and synced, rename not yet performed
    pub const PERSIST_AFTER_TEMP_WRITE: &str = "persist_after_temp_write";
    /// Rename performed
    pub const PERSIST_AFTER_RENAME: &str = "persist_after_rename";

    /// Get all crash point names
    pub fn all() -> &'static [&'static str] {
        &[
            PERSIST_BEFORE_TEMP_WRITE,
            PERSIST_AFTER_TEMP_WRITE,
            PERSIST_AFTER_RENAME,
        ]
    }
}
