//! Document collections
//!
//! A query API over a single JSON file: `find`, `find_one`,
//! `find_by_id`, `find_by_id_and_update`, `find_by_id_and_delete` and
//! `create`. Lookups that match nothing return `Ok(None)`.

mod errors;
mod filter;
mod model;
mod ops;

pub use errors::{CollectionError, CollectionResult};
pub use filter::{Filter, OR_OPERATOR};
pub use model::{Document, Model, ID_FIELD};
pub use ops::Collection;
