//! docstore - a minimal embedded document store
//!
//! Collections of JSON documents, each persisted as one file. Writes go
//! through a temp file and rename; concurrent writes to the same file
//! coalesce so only the latest payload lands.
//!
//! ```ignore
//! use docstore::collection::{Collection, Document, Filter};
//!
//! let users: Collection = Collection::open("users.json")?;
//! let ann = users.create(Document::new().with("email", "ann@example.com")).await?;
//! let found = users.find_one(&Filter::eq("email", "ann@example.com")).await?;
//! ```

pub mod cli;
pub mod codec;
pub mod collection;
pub mod config;
pub mod crash_point;
pub mod observability;
pub mod persist;
pub mod store;
