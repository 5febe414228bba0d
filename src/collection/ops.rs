//! Collection operations
//!
//! Every operation loads the snapshot first. Mutations edit the snapshot
//! under the cache lock, then persist; the lock is released before the
//! write so concurrent mutations coalesce in the engine.

use std::path::PathBuf;

use serde_json::{Map, Value};
use uuid::Uuid;

use super::errors::{CollectionError, CollectionResult};
use super::filter::Filter;
use super::model::{merge_fields, to_object, Document, Model, ID_FIELD};
use crate::codec::{Codec, JsonCodec};
use crate::config::StoreConfig;
use crate::observability::{log_event_with_fields, Event};
use crate::persist::TextFile;
use crate::store::CachedStore;

/// A collection of `T` documents persisted as one JSON array.
pub struct Collection<T: Model = Document, C = JsonCodec<Vec<T>>> {
    store: CachedStore<Vec<T>, C>,
}

impl<T: Model> Collection<T> {
    /// Open `path` with default options and pretty JSON
    pub fn open(path: impl Into<PathBuf>) -> CollectionResult<Self> {
        let engine = TextFile::new(path).map_err(CollectionError::Io)?;
        Ok(Self::new(CachedStore::new(engine, JsonCodec::pretty())))
    }

    /// Open the collection `config` describes. Also applies its log level.
    pub fn from_config(config: &StoreConfig) -> CollectionResult<Self> {
        config
            .validate()
            .and_then(|_| config.apply_logging())
            .map_err(|e| CollectionError::InvalidArgument(e.to_string()))?;

        let engine = TextFile::with_options(config.resolved_path(), config.persist_options())
            .map_err(CollectionError::Io)?;
        let codec = if config.pretty {
            JsonCodec::pretty()
        } else {
            JsonCodec::compact()
        };
        Ok(Self::new(CachedStore::new(engine, codec)))
    }
}

impl<T, C> Collection<T, C>
where
    T: Model,
    C: Codec<Vec<T>>,
{
    pub fn new(store: CachedStore<Vec<T>, C>) -> Self {
        Self { store }
    }

    /// The underlying cached store
    pub fn store(&self) -> &CachedStore<Vec<T>, C> {
        &self.store
    }

    /// The persistence engine
    pub fn engine(&self) -> &TextFile {
        self.store.engine()
    }

    fn path_field(&self) -> String {
        self.engine().path().display().to_string()
    }

    fn reject(&self, operation: &str, reason: String) -> CollectionError {
        log_event_with_fields(
            Event::OperationRejected,
            &[
                ("operation", operation),
                ("path", &self.path_field()),
                ("reason", &reason),
            ],
        );
        CollectionError::InvalidArgument(reason)
    }

    /// All documents in insertion order
    pub async fn find(&self) -> CollectionResult<Vec<T>> {
        self.store.load().await?;
        Ok(self.store.with_snapshot(|docs| docs.clone().unwrap_or_default()))
    }

    /// First document matching `filter`, see [`Filter::position`]
    pub async fn find_one(&self, filter: &Filter) -> CollectionResult<Option<T>> {
        self.store.load().await?;
        self.store.with_snapshot(|docs| {
            let docs = docs.as_deref().unwrap_or_default();
            Ok(filter.position(docs)?.map(|index| docs[index].clone()))
        })
    }

    pub async fn find_by_id(&self, id: &str) -> CollectionResult<Option<T>> {
        self.find_one(&Filter::id(id)).await
    }

    /// Overwrite the fields in `partial` on the document with `id`.
    ///
    /// Fields the document lacks are added. `partial` may repeat the
    /// identifier but not change it. Returns `None` without writing when no
    /// document has `id`.
    pub async fn find_by_id_and_update(
        &self,
        id: &str,
        partial: Map<String, Value>,
    ) -> CollectionResult<Option<T>> {
        if let Some(new_id) = partial.get(ID_FIELD) {
            if new_id.as_str() != Some(id) {
                return Err(self.reject("update", format!("{} cannot be changed", ID_FIELD)));
            }
        }

        self.store.load().await?;

        let updated = self.store.with_snapshot(|docs| {
            let Some(doc) = docs
                .as_mut()
                .and_then(|docs| docs.iter_mut().find(|doc| doc.id() == Some(id)))
            else {
                return Ok(None);
            };
            let merged = merge_fields(&*doc, &partial)?;
            *doc = merged.clone();
            Ok::<_, CollectionError>(Some(merged))
        });

        let updated = match updated {
            Ok(Some(doc)) => doc,
            Ok(None) => return Ok(None),
            Err(CollectionError::InvalidArgument(reason)) => return Err(self.reject("update", reason)),
            Err(e) => return Err(e),
        };

        self.store.persist().await?;
        log_event_with_fields(
            Event::DocumentUpdated,
            &[("id", id), ("path", &self.path_field())],
        );
        Ok(Some(updated))
    }

    /// Remove and return the document with `id`. No write on a miss.
    pub async fn find_by_id_and_delete(&self, id: &str) -> CollectionResult<Option<T>> {
        self.store.load().await?;

        let removed = self.store.with_snapshot(|docs| {
            let docs = docs.as_mut()?;
            let index = docs.iter().position(|doc| doc.id() == Some(id))?;
            Some(docs.remove(index))
        });

        let Some(removed) = removed else {
            return Ok(None);
        };

        self.store.persist().await?;
        log_event_with_fields(
            Event::DocumentDeleted,
            &[("id", id), ("path", &self.path_field())],
        );
        Ok(Some(removed))
    }

    /// Assign a fresh UUID v4 to `value`, append it, and persist.
    ///
    /// Fails before any I/O if `value` already has an identifier.
    pub async fn create(&self, mut value: T) -> CollectionResult<T> {
        if let Some(existing) = value.id() {
            let reason = format!("{} is assigned by the store, got '{}'", ID_FIELD, existing);
            return Err(self.reject("create", reason));
        }
        // Catches an `_id` the model serializes from somewhere other than `id()`
        let serialized_id = to_object(&value)?
            .get(ID_FIELD)
            .is_some_and(|id| !id.is_null());
        if serialized_id {
            let reason = format!("{} is assigned by the store", ID_FIELD);
            return Err(self.reject("create", reason));
        }

        self.store.load().await?;

        let id = Uuid::new_v4().to_string();
        value.set_id(id.clone());
        self.store
            .with_snapshot(|docs| docs.get_or_insert_with(Vec::new).push(value.clone()));

        self.store.persist().await?;
        log_event_with_fields(
            Event::DocumentCreated,
            &[("id", &id), ("path", &self.path_field())],
        );
        Ok(value)
    }
}
