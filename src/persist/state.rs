//! Write coalescing state machine
//!
//! ```text
//!   Idle --submit--> Writing { pending: None }
//!   Writing { None } --submit--> Writing { Some(batch) }
//!   Writing { Some(batch) } --submit--> Writing { Some(batch') }   payload replaced, waiters kept
//!   Writing { Some(batch) } --complete--> Writing { None }          batch handed to the driver
//!   Writing { None } --complete--> Idle
//! ```
//!
//! At most one physical write is in flight and at most one payload waits
//! behind it. Nothing here performs I/O.

use tokio::sync::oneshot;

use super::errors::PersistResult;

/// Completion channel for one `write` caller
pub(crate) type Waiter = oneshot::Sender<PersistResult<()>>;

/// A payload bound for disk plus every caller resolved by its outcome.
#[derive(Debug)]
pub struct WriteBatch {
    payload: String,
    waiters: Vec<Waiter>,
}

impl WriteBatch {
    pub(crate) fn new(payload: String, waiter: Waiter) -> Self {
        Self {
            payload,
            waiters: vec![waiter],
        }
    }

    /// The payload that will be written
    pub fn payload(&self) -> &str {
        &self.payload
    }

    /// Number of callers waiting on this batch
    pub fn waiter_count(&self) -> usize {
        self.waiters.len()
    }

    /// Replace the payload; the previous payload's callers stay attached.
    fn supersede(&mut self, payload: String, waiter: Waiter) {
        self.payload = payload;
        self.waiters.push(waiter);
    }

    /// Deliver the outcome of the physical write to every waiter.
    ///
    /// Waiters that stopped listening are skipped.
    pub(crate) fn resolve(self, result: &PersistResult<()>) {
        for waiter in self.waiters {
            let _ = waiter.send(result.clone());
        }
    }
}

/// What `submit` decided for a write request
#[derive(Debug)]
pub enum Submission {
    /// Engine was idle; the caller must start a driver for this batch.
    Start(WriteBatch),
    /// Request queued behind the in-flight write.
    Queued {
        /// True when an older queued payload was discarded.
        superseded: bool,
        /// Callers now waiting on the queued batch.
        waiters: usize,
    },
}

/// Engine write state
#[derive(Debug, Default)]
pub enum WriteState {
    /// No write in flight
    #[default]
    Idle,
    /// A physical write is in flight
    Writing {
        /// Latest payload requested since the in-flight write began
        pending: Option<WriteBatch>,
    },
}

impl WriteState {
    /// Register a write request.
    pub(crate) fn submit(&mut self, payload: String, waiter: Waiter) -> Submission {
        match self {
            WriteState::Idle => {
                *self = WriteState::Writing { pending: None };
                Submission::Start(WriteBatch::new(payload, waiter))
            }
            WriteState::Writing { pending } => match pending {
                Some(batch) => {
                    batch.supersede(payload, waiter);
                    Submission::Queued {
                        superseded: true,
                        waiters: batch.waiter_count(),
                    }
                }
                None => {
                    *pending = Some(WriteBatch::new(payload, waiter));
                    Submission::Queued {
                        superseded: false,
                        waiters: 1,
                    }
                }
            },
        }
    }

    /// The in-flight write finished. Returns the next batch to write, or
    /// moves to `Idle` when nothing is queued.
    pub(crate) fn complete(&mut self) -> Option<WriteBatch> {
        let next = match self {
            WriteState::Writing { pending } => pending.take(),
            WriteState::Idle => None,
        };
        if next.is_none() {
            *self = WriteState::Idle;
        }
        next
    }

    /// Whether no write is in flight
    pub fn is_idle(&self) -> bool {
        matches!(self, WriteState::Idle)
    }
}
