//! Shapes stored documents for the response: the store's `_id` becomes a
//! string `id`, and store timestamps become ISO-8601 text.
use super::models::{Document, Value, ID_FIELD, TIMESTAMP_FIELDS};

fn id_string(id: Value) -> String {
    match id {
        Value::Id(id) => id.to_string(),
        Value::Text(s) => s,
        Value::Int(i) => i.to_string(),
        other => serde_json::to_string(&other).unwrap_or_default(),
    }
}

/// Never fails. Anything in a timestamp field that isn't actually a
/// timestamp is left alone, so running this twice is a no-op.
pub fn normalize(mut doc: Document) -> Document {
    if let Some(id) = doc.remove(ID_FIELD) {
        doc.insert("id".to_string(), Value::Text(id_string(id)));
    }
    for field in TIMESTAMP_FIELDS {
        if let Some(Value::Timestamp(ts)) = doc.get(field) {
            let iso = ts.to_rfc3339();
            doc.insert(field.to_string(), Value::Text(iso));
        }
    }
    doc
}

pub fn normalize_all(docs: Vec<Document>) -> Vec<Document> {
    docs.into_iter().map(normalize).collect()
}
