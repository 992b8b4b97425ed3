//! The per-call resource-data handle.
//!
//! A [`ResourceData`] is the opaque store the host exchanges with the
//! provider: the entity id plus the current/desired attribute values,
//! alongside the prior state used for change detection. Values are typed
//! at the boundary - every getter names the attribute and the expected
//! type on failure, and [`ResourceData::set`] rejects attributes the
//! schema does not declare or values of the wrong shape.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value;
use thiserror::Error;

use crate::schema::{AttrType, ResourceSchema};

// ════════════════════════════════════════════════════════════════════════════════
// Errors
// ════════════════════════════════════════════════════════════════════════════════

/// Failure reading or writing a single attribute.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    /// The attribute is not declared in the resource schema.
    #[error("attribute `{attr}` is not part of the `{resource}` schema")]
    UnknownAttribute {
        resource: &'static str,
        attr: String,
    },

    /// The stored or supplied value has the wrong shape.
    #[error("attribute `{attr}` expected {expected}, found {found}")]
    TypeMismatch {
        attr: String,
        expected: AttrType,
        found: &'static str,
    },
}

/// Describe a JSON value's shape for error messages.
fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(items) => {
            if items.iter().all(Value::is_string) {
                "array"
            } else {
                "array with non-string elements"
            }
        }
        Value::Object(entries) => {
            if entries.values().all(Value::is_string) {
                "object"
            } else {
                "object with non-string values"
            }
        }
    }
}

/// Field-write failures collected during a state write-back.
///
/// The Read path reports every attribute it could not persist, not just
/// the first one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
    errors: Vec<StateError>,
}

impl FieldErrors {
    /// Start an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome of one field write.
    pub fn record(&mut self, result: Result<(), StateError>) {
        if let Err(err) = result {
            self.errors.push(err);
        }
    }

    /// Whether no write has failed so far.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// The collected failures.
    pub fn errors(&self) -> &[StateError] {
        &self.errors
    }

    /// Succeed if nothing was recorded, otherwise yield the collection.
    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ");
        write!(f, "{} attribute(s): {}", self.errors.len(), joined)
    }
}

impl std::error::Error for FieldErrors {}

// ════════════════════════════════════════════════════════════════════════════════
// Resource Data
// ════════════════════════════════════════════════════════════════════════════════

/// The opaque per-call attribute store for one resource instance.
#[derive(Debug, Clone)]
pub struct ResourceData {
    schema: &'static ResourceSchema,
    id: Option<String>,
    values: BTreeMap<String, Value>,
    prior: BTreeMap<String, Value>,
}

impl ResourceData {
    /// Create an empty handle bound to a schema.
    pub fn new(schema: &'static ResourceSchema) -> Self {
        Self {
            schema,
            id: None,
            values: BTreeMap::new(),
            prior: BTreeMap::new(),
        }
    }

    /// The schema this handle is bound to.
    pub fn schema(&self) -> &'static ResourceSchema {
        self.schema
    }

    /// The assigned entity id, if any.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Assign the entity id.
    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = Some(id.into());
    }

    /// Clear the entity id, signalling the entity no longer exists.
    pub fn clear_id(&mut self) {
        self.id = None;
    }

    /// Raw value access; `None` when the attribute was never written.
    pub fn raw(&self, attr: &str) -> Option<&Value> {
        self.values.get(attr)
    }

    /// Whether the attribute holds a non-null value.
    pub fn is_set(&self, attr: &str) -> bool {
        matches!(self.values.get(attr), Some(value) if !value.is_null())
    }

    /// Write one attribute, checking it against the schema. Null always
    /// passes the shape check and reads back as absent.
    pub fn set(&mut self, attr: &str, value: impl Into<Value>) -> Result<(), StateError> {
        let value = value.into();
        let spec = self
            .schema
            .attr(attr)
            .ok_or_else(|| StateError::UnknownAttribute {
                resource: self.schema.resource(),
                attr: attr.to_string(),
            })?;
        if !value.is_null() && !spec.attr_type().matches(&value) {
            return Err(StateError::TypeMismatch {
                attr: attr.to_string(),
                expected: spec.attr_type(),
                found: value_kind(&value),
            });
        }
        self.values.insert(attr.to_string(), value);
        Ok(())
    }

    /// Whether the desired value differs from the prior state.
    pub fn has_change(&self, attr: &str) -> bool {
        let current = self.values.get(attr).cloned().unwrap_or(Value::Null);
        let previous = self.prior.get(attr).cloned().unwrap_or(Value::Null);
        current != previous
    }

    /// Mark the handle clean: the current values become the prior state.
    /// Called after a successful Read reconciles against server truth.
    pub fn sync_prior(&mut self) {
        self.prior = self.values.clone();
    }

    fn typed<T>(
        &self,
        attr: &str,
        expected: AttrType,
        convert: impl Fn(&Value) -> Option<T>,
    ) -> Result<Option<T>, StateError> {
        if self.schema.attr(attr).is_none() {
            return Err(StateError::UnknownAttribute {
                resource: self.schema.resource(),
                attr: attr.to_string(),
            });
        }
        match self.values.get(attr) {
            None => Ok(None),
            Some(Value::Null) => Ok(None),
            Some(value) => convert(value).map(Some).ok_or_else(|| StateError::TypeMismatch {
                attr: attr.to_string(),
                expected,
                found: value_kind(value),
            }),
        }
    }

    /// Read a string attribute.
    pub fn get_string(&self, attr: &str) -> Result<Option<String>, StateError> {
        self.typed(attr, AttrType::String, |v| v.as_str().map(str::to_string))
    }

    /// Read a 64-bit integer attribute.
    pub fn get_i64(&self, attr: &str) -> Result<Option<i64>, StateError> {
        self.typed(attr, AttrType::Int, Value::as_i64)
    }

    /// Read a float attribute; integer values widen losslessly.
    pub fn get_f64(&self, attr: &str) -> Result<Option<f64>, StateError> {
        self.typed(attr, AttrType::Float, Value::as_f64)
    }

    /// Read a boolean attribute.
    pub fn get_bool(&self, attr: &str) -> Result<Option<bool>, StateError> {
        self.typed(attr, AttrType::Bool, Value::as_bool)
    }

    /// Read a list-of-strings attribute.
    pub fn get_string_list(&self, attr: &str) -> Result<Option<Vec<String>>, StateError> {
        self.typed(attr, AttrType::StringList, |v| {
            v.as_array()?
                .iter()
                .map(|item| item.as_str().map(str::to_string))
                .collect::<Option<Vec<_>>>()
        })
    }

    /// Read a string-keyed map attribute.
    pub fn get_string_map(&self, attr: &str) -> Result<Option<BTreeMap<String, String>>, StateError> {
        self.typed(attr, AttrType::StringMap, |v| {
            v.as_object()?
                .iter()
                .map(|(k, item)| item.as_str().map(|s| (k.clone(), s.to_string())))
                .collect::<Option<BTreeMap<_, _>>>()
        })
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Value Helpers
// ════════════════════════════════════════════════════════════════════════════════

/// Lift an optional value into JSON, mapping `None` to null.
pub fn opt_value<T: Into<Value>>(value: Option<T>) -> Value {
    value.map(Into::into).unwrap_or(Value::Null)
}

/// Build a JSON array of strings.
pub fn string_list_value<I, S>(items: I) -> Value
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    Value::Array(items.into_iter().map(|s| Value::String(s.into())).collect())
}

/// Build a JSON object with string values.
pub fn string_map_value(map: &BTreeMap<String, String>) -> Value {
    Value::Object(
        map.iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect(),
    )
}
