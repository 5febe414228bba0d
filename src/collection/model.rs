//! Document model
//!
//! A collection stores any serde type that exposes its identifier through
//! [`Model`]. The identifier is serialized as `_id` and is only ever
//! assigned by the store.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::errors::{CollectionError, CollectionResult};

/// Field name the identifier is stored under
pub const ID_FIELD: &str = "_id";

/// A record that can live in a collection.
///
/// Implementations must serialize to a JSON object with the identifier
/// under [`ID_FIELD`], omitted or null when unset.
pub trait Model: Serialize + DeserializeOwned + Clone {
    /// The store-assigned identifier, if any
    fn id(&self) -> Option<&str>;

    /// Assign the identifier
    fn set_id(&mut self, id: String);
}

/// Schemaless document: an identifier plus arbitrary top-level fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Document {
    /// Empty document without an identifier
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a JSON object. `_id`, if present, must be a string.
    pub fn from_value(value: Value) -> CollectionResult<Self> {
        match value {
            Value::Object(_) => serde_json::from_value(value)
                .map_err(|e| CollectionError::InvalidArgument(format!("invalid document: {}", e))),
            other => Err(CollectionError::InvalidArgument(format!(
                "document must be a JSON object, got {}",
                json_type_name(&other)
            ))),
        }
    }

    /// Add or replace a field, builder style
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(field, value);
        self
    }

    /// Add or replace a field. Returns the previous value.
    ///
    /// `_id` is routed to the identifier: a string sets it and `null` clears
    /// it. Any other `_id` value is kept as a field in place of the
    /// identifier, so at most one `_id` is ever serialized.
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        let field = field.into();
        let value = value.into();
        if field != ID_FIELD {
            return self.fields.insert(field, value);
        }

        let stale = self.fields.remove(ID_FIELD);
        let previous = self.id.take().map(Value::String).or(stale);
        match value {
            Value::String(id) => self.id = Some(id),
            Value::Null => {}
            other => {
                self.fields.insert(field, other);
            }
        }
        previous
    }

    /// Field value by name. The identifier is read through [`Model::id`].
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }
}

impl Model for Document {
    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn set_id(&mut self, id: String) {
        self.fields.remove(ID_FIELD);
        self.id = Some(id);
    }
}

pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Serialize a model into its top-level JSON object.
pub(crate) fn to_object<T: Model>(doc: &T) -> CollectionResult<Map<String, Value>> {
    match serde_json::to_value(doc) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(CollectionError::Model(format!(
            "model serialized to {} instead of an object",
            json_type_name(&other)
        ))),
        Err(e) => Err(CollectionError::Model(e.to_string())),
    }
}

/// Overwrite `partial`'s fields onto `doc`, returning the merged model.
///
/// `doc` itself is left untouched if the result does not deserialize.
pub(crate) fn merge_fields<T: Model>(doc: &T, partial: &Map<String, Value>) -> CollectionResult<T> {
    let mut object = to_object(doc)?;
    for (field, value) in partial {
        object.insert(field.clone(), value.clone());
    }
    serde_json::from_value(Value::Object(object))
        .map_err(|e| CollectionError::InvalidArgument(format!("update does not fit the model: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct User {
        #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        name: String,
        age: u32,
    }

    impl Model for User {
        fn id(&self) -> Option<&str> {
            self.id.as_deref()
        }

        fn set_id(&mut self, id: String) {
            self.id = Some(id);
        }
    }

    #[test]
    fn test_document_serializes_id_first_and_flat() {
        let doc = Document::new().with("name", "test");
        let mut with_id = doc.clone();
        with_id.set_id("abc".into());

        assert_eq!(serde_json::to_value(&doc).unwrap(), json!({"name": "test"}));
        assert_eq!(
            serde_json::to_string(&with_id).unwrap(),
            r#"{"_id":"abc","name":"test"}"#
        );
    }

    #[test]
    fn test_document_from_value() {
        let doc = Document::from_value(json!({"_id": "x1", "email": "a@b.c"})).unwrap();

        assert_eq!(doc.id(), Some("x1"));
        assert_eq!(doc.get("email"), Some(&json!("a@b.c")));
        assert!(doc.get("_id").is_none());
    }

    #[test]
    fn test_insert_id_sets_identifier() {
        let mut doc = Document::new().with("_id", "x1");
        assert_eq!(doc.id(), Some("x1"));
        assert!(doc.fields.is_empty());

        assert_eq!(doc.insert("_id", Value::Null), Some(json!("x1")));
        assert_eq!(doc.id(), None);
        assert_eq!(serde_json::to_value(&doc).unwrap(), json!({}));
    }

    #[test]
    fn test_non_string_id_replaces_identifier() {
        let doc = Document::new().with("_id", "x1").with("_id", 7);

        assert_eq!(doc.id(), None);
        assert_eq!(serde_json::to_string(&doc).unwrap(), r#"{"_id":7}"#);
    }

    #[test]
    fn test_set_id_drops_stray_id_field() {
        let mut doc = Document::new().with("name", "a");
        doc.fields.insert("_id".into(), Value::Null);

        doc.set_id("x1".into());

        assert_eq!(
            serde_json::to_string(&doc).unwrap(),
            r#"{"_id":"x1","name":"a"}"#
        );
    }

    #[test]
    fn test_document_from_non_object_rejected() {
        let err = Document::from_value(json!([1, 2])).unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn test_merge_adds_and_overwrites_fields() {
        let doc = Document::from_value(json!({"_id": "1", "name": "a", "age": 3})).unwrap();
        let partial = json!({"name": "b", "city": "Oslo"});

        let merged = merge_fields(&doc, partial.as_object().unwrap()).unwrap();

        assert_eq!(
            serde_json::to_value(&merged).unwrap(),
            json!({"_id": "1", "name": "b", "age": 3, "city": "Oslo"})
        );
    }

    #[test]
    fn test_merge_type_mismatch_rejected() {
        let user = User {
            id: Some("1".into()),
            name: "a".into(),
            age: 3,
        };
        let partial = json!({"age": "old"});

        let err = merge_fields(&user, partial.as_object().unwrap()).unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn test_to_object_of_typed_model() {
        let user = User {
            id: None,
            name: "a".into(),
            age: 3,
        };

        let object = to_object(&user).unwrap();
        assert_eq!(object.get("age"), Some(&json!(3)));
        assert!(!object.contains_key(ID_FIELD));
    }
}
