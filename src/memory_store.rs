//! In-process [`DocumentStore`] for router tests. Filters are evaluated
//! directly against the documents instead of being compiled to SQL.
use super::{
    db_ops::{strip_store_fields, DocumentStore},
    filter::models::{Clause, Filter},
    models::{Document, RecordKind, Value, ID_FIELD},
};
use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Mutex;
use uuid::Uuid;

#[derive(Default)]
pub struct MemoryStore {
    docs: Mutex<Vec<(RecordKind, Document)>>,
}

fn equals(left: &Value, right: &Value) -> bool {
    match (left.as_f64(), right.as_f64()) {
        (Some(l), Some(r)) => l == r,
        _ => left == right,
    }
}

fn contains(haystack: Option<&Value>, needle: &str) -> bool {
    match haystack {
        Some(Value::Text(h)) => {
            h.to_lowercase().contains(&needle.to_lowercase())
        }
        _ => false,
    }
}

pub fn clause_matches(clause: &Clause, doc: &Document) -> bool {
    match clause {
        Clause::Equals { field, value } => doc
            .get(field.as_str())
            .map_or(false, |v| equals(v, value)),
        Clause::Range { field, min, max } => {
            match doc.get(field.as_str()).and_then(Value::as_f64) {
                Some(n) => {
                    min.map_or(true, |min| n >= min)
                        && max.map_or(true, |max| n <= max)
                }
                None => false,
            }
        }
        Clause::Contains { field, needle } => {
            contains(doc.get(field.as_str()), needle)
        }
        Clause::Or(clauses) => clauses.iter().any(|c| clause_matches(c, doc)),
    }
}

pub fn filter_matches(filter: &Filter, doc: &Document) -> bool {
    filter.clauses.iter().all(|c| clause_matches(c, doc))
}

#[async_trait]
impl DocumentStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn insert(&self, kind: RecordKind, doc: Document) -> Result<Uuid> {
        let id = Uuid::new_v4();
        let now = Utc::now();
        let mut doc = strip_store_fields(doc);
        doc.insert(ID_FIELD.to_string(), Value::Id(id));
        doc.insert("created_at".to_string(), Value::Timestamp(now));
        doc.insert("updated_at".to_string(), Value::Timestamp(now));
        self.docs
            .lock()
            .map_err(|_| anyhow::anyhow!("memory store poisoned"))?
            .push((kind, doc));
        Ok(id)
    }

    async fn find(
        &self,
        kind: RecordKind,
        filter: &Filter,
        limit: i64,
    ) -> Result<Vec<Document>> {
        let docs = self
            .docs
            .lock()
            .map_err(|_| anyhow::anyhow!("memory store poisoned"))?;
        Ok(docs
            .iter()
            .rev()
            .filter(|(k, doc)| *k == kind && filter_matches(filter, doc))
            .take(usize::try_from(limit).unwrap_or(0))
            .map(|(_, doc)| doc.clone())
            .collect())
    }

    async fn find_one(
        &self,
        kind: RecordKind,
        id: Uuid,
    ) -> Result<Option<Document>> {
        let docs = self
            .docs
            .lock()
            .map_err(|_| anyhow::anyhow!("memory store poisoned"))?;
        Ok(docs
            .iter()
            .find(|(k, doc)| {
                *k == kind && doc.get(ID_FIELD) == Some(&Value::Id(id))
            })
            .map(|(_, doc)| doc.clone()))
    }

    async fn list_collections(&self, limit: usize) -> Result<Vec<String>> {
        let docs = self
            .docs
            .lock()
            .map_err(|_| anyhow::anyhow!("memory store poisoned"))?;
        let mut names: Vec<String> = docs
            .iter()
            .map(|(k, _)| k.collection().to_string())
            .collect();
        names.sort();
        names.dedup();
        names.truncate(limit);
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::models::SearchParams;
    use serde_json::json;

    fn listing(value: serde_json::Value) -> Document {
        match value {
            serde_json::Value::Object(map) => {
                crate::models::document_from_json(map)
            }
            _ => panic!("not an object"),
        }
    }

    fn villa() -> Document {
        listing(json!({
            "title": "Sunny Villa",
            "type": "house",
            "location": "Ubud, Bali",
            "price": 300.0,
            "bedrooms": 3,
            "featured": true
        }))
    }

    fn matches(params: SearchParams) -> bool {
        filter_matches(&Filter::build(&params), &villa())
    }

    #[test]
    fn test_price_bounds_are_inclusive() {
        assert!(matches(SearchParams {
            min_price: Some(300.0),
            max_price: Some(300.0),
            ..Default::default()
        }));
        assert!(!matches(SearchParams {
            min_price: Some(300.5),
            ..Default::default()
        }));
    }

    #[test]
    fn test_type_is_case_sensitive() {
        assert!(matches(SearchParams {
            r#type: Some("house".into()),
            ..Default::default()
        }));
        assert!(!matches(SearchParams {
            r#type: Some("House".into()),
            ..Default::default()
        }));
    }

    #[test]
    fn test_location_and_q_ignore_case() {
        assert!(matches(SearchParams {
            location: Some("BALI".into()),
            ..Default::default()
        }));
        assert!(matches(SearchParams {
            q: Some("sunny".into()),
            ..Default::default()
        }));
        assert!(matches(SearchParams {
            q: Some("HOU".into()),
            ..Default::default()
        }));
    }

    #[test]
    fn test_q_narrows_other_clauses() {
        assert!(!matches(SearchParams {
            q: Some("bali".into()),
            bedrooms: Some(2),
            ..Default::default()
        }));
    }

    #[test]
    fn test_int_matches_float_value() {
        let doc = listing(json!({"bedrooms": 3.0}));
        let filter = Filter::build(&SearchParams {
            bedrooms: Some(3),
            ..Default::default()
        });
        assert!(filter_matches(&filter, &doc));
    }
}
