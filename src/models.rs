use super::{config::Config, db_ops::DocumentStore};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use std::{collections::BTreeMap, sync::Arc};
use uuid::Uuid;

/// Field under which the store keeps a document's identifier.
pub const ID_FIELD: &str = "_id";

/// Fields the store maintains as timestamps.
pub const TIMESTAMP_FIELDS: [&str; 2] = ["created_at", "updated_at"];

/// A single value inside a stored document. Identifiers and timestamps get
/// their own variants because the store hands them back as such, and the
/// normalizer has to tell them apart from plain text.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
    Id(Uuid),
    Timestamp(DateTime<Utc>),
}

impl Value {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::Text(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => Value::Map(document_from_json(map)),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => s.serialize_unit(),
            Value::Bool(b) => s.serialize_bool(*b),
            Value::Int(i) => s.serialize_i64(*i),
            Value::Float(f) => s.serialize_f64(*f),
            Value::Text(t) => s.serialize_str(t),
            Value::List(items) => items.serialize(s),
            Value::Map(map) => map.serialize(s),
            Value::Id(id) => s.serialize_str(&id.to_string()),
            Value::Timestamp(ts) => s.serialize_str(&ts.to_rfc3339()),
        }
    }
}

/// A record as the store sees it: field name to value.
pub type Document = BTreeMap<String, Value>;

pub fn document_from_json(
    map: serde_json::Map<String, serde_json::Value>,
) -> Document {
    map.into_iter().map(|(k, v)| (k, Value::from(v))).collect()
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ValueType {
    Bool,
    Int,
    Float,
    Text,
    TextList,
}

impl ValueType {
    fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (ValueType::Bool, Value::Bool(_)) => true,
            (ValueType::Int, Value::Int(_)) => true,
            (ValueType::Float, Value::Int(_) | Value::Float(_)) => true,
            (ValueType::Text, Value::Text(_)) => true,
            (ValueType::TextList, Value::List(items)) => {
                items.iter().all(|i| matches!(i, Value::Text(_)))
            }
            _ => false,
        }
    }
}

#[derive(Debug)]
pub struct FieldSpec {
    pub name: &'static str,
    pub value_type: ValueType,
    pub required: bool,
    /// Numeric fields that may never go below zero.
    pub non_negative: bool,
}

const fn field(
    name: &'static str,
    value_type: ValueType,
    required: bool,
    non_negative: bool,
) -> FieldSpec {
    FieldSpec {
        name,
        value_type,
        required,
        non_negative,
    }
}

const PROPERTY_FIELDS: &[FieldSpec] = &[
    field("title", ValueType::Text, true, false),
    field("type", ValueType::Text, true, false),
    field("location", ValueType::Text, true, false),
    field("price", ValueType::Float, true, true),
    field("bedrooms", ValueType::Int, false, true),
    field("bathrooms", ValueType::Int, false, true),
    field("building_area_sqm", ValueType::Float, false, true),
    field("land_area_sqm", ValueType::Float, false, true),
    field("images", ValueType::TextList, false, false),
    field("description", ValueType::Text, false, false),
    field("featured", ValueType::Bool, false, false),
];

/// Every kind of record the service persists. Each kind owns one collection
/// in the store, and a fixed field contract that documents must satisfy
/// before they are inserted.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RecordKind {
    Property,
}

impl RecordKind {
    pub fn collection(&self) -> &'static str {
        match self {
            RecordKind::Property => "property",
        }
    }
    pub fn fields(&self) -> &'static [FieldSpec] {
        match self {
            RecordKind::Property => PROPERTY_FIELDS,
        }
    }
    /// Returns a user-facing message describing the first field that breaks
    /// the contract.
    pub fn check(&self, doc: &Document) -> Result<(), String> {
        for spec in self.fields() {
            let value = match doc.get(spec.name) {
                None | Some(Value::Null) => {
                    if spec.required {
                        return Err(format!("field `{}` is required", spec.name));
                    }
                    continue;
                }
                Some(v) => v,
            };
            if !spec.value_type.accepts(value) {
                return Err(format!(
                    "field `{}` must be of type {:?}",
                    spec.name, spec.value_type
                ));
            }
            if spec.non_negative && value.as_f64().map_or(false, |n| n < 0.0)
            {
                return Err(format!("field `{}` must be >= 0", spec.name));
            }
        }
        Ok(())
    }
}

/// Request body for creating a property listing.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct PropertyCreate {
    pub title: String,
    pub r#type: String,
    pub location: String,
    pub price: f64,
    #[serde(default)]
    pub bedrooms: Option<i64>,
    #[serde(default)]
    pub bathrooms: Option<i64>,
    #[serde(default)]
    pub building_area_sqm: Option<f64>,
    #[serde(default)]
    pub land_area_sqm: Option<f64>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub featured: bool,
}

#[derive(Clone)]
pub struct AppState {
    /// `None` when no database was configured, or it could not be reached
    /// on startup.
    pub store: Option<Arc<dyn DocumentStore>>,
    pub config: Arc<Config>,
}
