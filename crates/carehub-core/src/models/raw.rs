//! Permissive representation of documents fetched from the remote store.
//!
//! This is the first stage of ingestion: anything the store hands us is
//! accepted here as long as it has an id. Validation happens later in
//! [`crate::ingest`].

use std::collections::BTreeMap;

use chrono::{DateTime, TimeZone, Utc};
use thiserror::Error;

/// Raw document envelope errors.
#[derive(Error, Debug)]
pub enum RawDocumentError {
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Invalid document envelope: {0}")]
    InvalidEnvelope(String),
}

pub type RawDocumentResult<T> = Result<T, RawDocumentError>;

/// A loosely-typed field value.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    /// Native store timestamp
    Timestamp(DateTime<Utc>),
    Array(Vec<RawValue>),
    Map(BTreeMap<String, RawValue>),
}

impl RawValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            RawValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            RawValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            RawValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            RawValue::Timestamp(ts) => Some(*ts),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, RawValue::Null)
    }

    /// Recognize the serialized form of a native timestamp.
    ///
    /// The store serializes timestamps as `{seconds, nanoseconds}`; the admin
    /// SDK uses underscore-prefixed keys.
    fn timestamp_from_object(
        map: &serde_json::Map<String, serde_json::Value>,
    ) -> Option<DateTime<Utc>> {
        if map.len() != 2 {
            return None;
        }
        let (secs, nanos) = match (map.get("seconds"), map.get("nanoseconds")) {
            (Some(s), Some(n)) => (s, n),
            _ => (map.get("_seconds")?, map.get("_nanoseconds")?),
        };
        let secs = secs.as_i64()?;
        let nanos = u32::try_from(nanos.as_u64()?).ok()?;
        Utc.timestamp_opt(secs, nanos).single()
    }
}

impl From<serde_json::Value> for RawValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => RawValue::Null,
            serde_json::Value::Bool(b) => RawValue::Bool(b),
            serde_json::Value::Number(n) => {
                n.as_f64().map(RawValue::Number).unwrap_or(RawValue::Null)
            }
            serde_json::Value::String(s) => RawValue::String(s),
            serde_json::Value::Array(items) => {
                RawValue::Array(items.into_iter().map(RawValue::from).collect())
            }
            serde_json::Value::Object(map) => match Self::timestamp_from_object(&map) {
                Some(ts) => RawValue::Timestamp(ts),
                None => RawValue::Map(
                    map.into_iter()
                        .map(|(k, v)| (k, RawValue::from(v)))
                        .collect(),
                ),
            },
        }
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        RawValue::String(s.to_string())
    }
}

impl From<String> for RawValue {
    fn from(s: String) -> Self {
        RawValue::String(s)
    }
}

impl From<f64> for RawValue {
    fn from(n: f64) -> Self {
        RawValue::Number(n)
    }
}

impl From<bool> for RawValue {
    fn from(b: bool) -> Self {
        RawValue::Bool(b)
    }
}

impl From<DateTime<Utc>> for RawValue {
    fn from(ts: DateTime<Utc>) -> Self {
        RawValue::Timestamp(ts)
    }
}

/// A document as returned by the store: its id plus an untyped field map.
#[derive(Debug, Clone, PartialEq)]
pub struct RawDocument {
    /// Store-assigned document id
    pub id: String,
    /// Field name → value
    pub fields: BTreeMap<String, RawValue>,
}

impl RawDocument {
    /// Create an empty document.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Builder-style field setter.
    pub fn with_field(mut self, key: &str, value: impl Into<RawValue>) -> Self {
        self.fields.insert(key.to_string(), value.into());
        self
    }

    /// Get a field by exact name.
    pub fn get(&self, key: &str) -> Option<&RawValue> {
        self.fields.get(key)
    }

    /// Get the first present, non-null field among `keys`.
    pub fn get_any(&self, keys: &[&str]) -> Option<&RawValue> {
        keys.iter()
            .filter_map(|k| self.fields.get(*k))
            .find(|v| !v.is_null())
    }

    /// Build a document from a JSON envelope.
    ///
    /// Accepts `{"id": "...", "data": {...}}` or a flat object with `id`
    /// beside the fields.
    pub fn from_json_value(value: serde_json::Value) -> RawDocumentResult<Self> {
        let mut object = match value {
            serde_json::Value::Object(map) => map,
            other => {
                return Err(RawDocumentError::InvalidEnvelope(format!(
                    "expected object, got {}",
                    json_kind(&other)
                )))
            }
        };

        let id = match object.remove("id") {
            Some(serde_json::Value::String(id)) if !id.is_empty() => id,
            _ => {
                return Err(RawDocumentError::InvalidEnvelope(
                    "missing string id".into(),
                ))
            }
        };

        let data = match object.remove("data") {
            Some(serde_json::Value::Object(data)) => data,
            Some(other) => {
                return Err(RawDocumentError::InvalidEnvelope(format!(
                    "data must be an object, got {}",
                    json_kind(&other)
                )))
            }
            None => object,
        };

        Ok(Self {
            id,
            fields: data
                .into_iter()
                .map(|(k, v)| (k, RawValue::from(v)))
                .collect(),
        })
    }

    /// Parse a JSON array of document envelopes.
    ///
    /// Elements without a usable envelope are skipped so one bad element
    /// does not lose the rest of the snapshot.
    pub fn parse_batch(json: &str) -> RawDocumentResult<Vec<Self>> {
        let values: Vec<serde_json::Value> = serde_json::from_str(json)?;
        let mut documents = Vec::with_capacity(values.len());

        for (index, value) in values.into_iter().enumerate() {
            match Self::from_json_value(value) {
                Ok(doc) => documents.push(doc),
                Err(e) => tracing::warn!(index, error = %e, "Skipping malformed document envelope"),
            }
        }

        Ok(documents)
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
