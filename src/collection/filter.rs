//! Query filters
//!
//! A filter is either a set of top-level field equalities, all of which must
//! hold, or an ordered list of alternatives (`$or`). Matching is exact JSON
//! equality on top-level fields; a field missing from the document never
//! matches.

use serde_json::{Map, Value};

use super::errors::{CollectionError, CollectionResult};
use super::model::{json_type_name, to_object, Model, ID_FIELD};

/// Operator key for alternatives
pub const OR_OPERATOR: &str = "$or";

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Every field must equal the given value
    Fields(Map<String, Value>),
    /// Alternatives, tried in order
    Or(Vec<Filter>),
}

impl Default for Filter {
    fn default() -> Self {
        Filter::Fields(Map::new())
    }
}

impl Filter {
    /// Filter that matches every document
    pub fn all() -> Self {
        Self::default()
    }

    /// Single field equality
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::all().and(field, value)
    }

    /// Identifier equality
    pub fn id(id: impl Into<String>) -> Self {
        Filter::eq(ID_FIELD, id.into())
    }

    /// Alternatives, tried in the given order
    pub fn or(alternatives: impl IntoIterator<Item = Filter>) -> Self {
        Filter::Or(alternatives.into_iter().collect())
    }

    /// Add a field equality. On `Or` the equality is added to every
    /// alternative.
    pub fn and(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        match self {
            Filter::Fields(mut fields) => {
                fields.insert(field.into(), value.into());
                Filter::Fields(fields)
            }
            Filter::Or(alternatives) => {
                let field = field.into();
                let value = value.into();
                Filter::Or(
                    alternatives
                        .into_iter()
                        .map(|alt| alt.and(field.clone(), value.clone()))
                        .collect(),
                )
            }
        }
    }

    /// Parse a JSON filter object.
    ///
    /// `{"$or": [...]}` becomes alternatives; anything else is a set of
    /// field equalities. `$or` cannot be mixed with plain fields.
    pub fn from_value(value: Value) -> CollectionResult<Self> {
        let object = match value {
            Value::Object(object) => object,
            other => {
                return Err(CollectionError::InvalidArgument(format!(
                    "filter must be a JSON object, got {}",
                    json_type_name(&other)
                )))
            }
        };

        let Some(alternatives) = object.get(OR_OPERATOR) else {
            return Ok(Filter::Fields(object));
        };

        if object.len() > 1 {
            return Err(CollectionError::InvalidArgument(format!(
                "{} cannot be combined with field equalities",
                OR_OPERATOR
            )));
        }

        match alternatives {
            Value::Array(items) => items
                .iter()
                .cloned()
                .map(Filter::from_value)
                .collect::<CollectionResult<Vec<_>>>()
                .map(Filter::Or),
            other => Err(CollectionError::InvalidArgument(format!(
                "{} expects an array, got {}",
                OR_OPERATOR,
                json_type_name(other)
            ))),
        }
    }

    /// Whether a document object satisfies this filter
    pub fn matches(&self, doc: &Map<String, Value>) -> bool {
        match self {
            Filter::Fields(fields) => fields
                .iter()
                .all(|(field, expected)| doc.get(field) == Some(expected)),
            Filter::Or(alternatives) => alternatives.iter().any(|alt| alt.matches(doc)),
        }
    }

    /// Index of the document `find_one` should return.
    ///
    /// Alternatives are tried in order; each scans the whole collection
    /// before the next is tried, so an earlier alternative wins even if a
    /// later one matches an earlier document.
    pub fn position<T: Model>(&self, docs: &[T]) -> CollectionResult<Option<usize>> {
        let objects = docs
            .iter()
            .map(to_object)
            .collect::<CollectionResult<Vec<_>>>()?;
        Ok(self.position_in(&objects))
    }

    fn position_in(&self, objects: &[Map<String, Value>]) -> Option<usize> {
        match self {
            Filter::Fields(_) => objects.iter().position(|doc| self.matches(doc)),
            Filter::Or(alternatives) => alternatives.iter().find_map(|alt| alt.position_in(objects)),
        }
    }
}
