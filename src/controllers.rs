use super::{
    config::{
        DEFAULT_LIMIT, DIAGNOSTIC_COLLECTIONS_MAX, MAX_LIMIT, MIN_LIMIT,
    },
    db_ops::DocumentStore,
    errors::ServerError,
    filter::models::{Filter, SearchParams},
    models::{document_from_json, AppState, Document, PropertyCreate, RecordKind},
    normalize,
};
use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value as JsonValue};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Serialize)]
pub struct Message {
    message: &'static str,
}

pub async fn root() -> Json<Message> {
    Json(Message {
        message: "Hello from the property listing backend!",
    })
}

pub async fn hello() -> Json<Message> {
    Json(Message {
        message: "Hello from the backend API!",
    })
}

fn truncate(msg: &str, max: usize) -> String {
    msg.chars().take(max).collect()
}

/// Reports whether the store is configured and answering. Always 200;
/// failures show up in the body.
pub async fn test_database(
    State(AppState { store, config }): State<AppState>,
) -> Json<JsonValue> {
    let (database, database_name, connection_status, collections) =
        match &store {
            Some(store) => {
                match store.list_collections(DIAGNOSTIC_COLLECTIONS_MAX).await
                {
                    Ok(collections) => (
                        "✅ Connected & Working".to_string(),
                        store.name().to_string(),
                        "Connected",
                        collections,
                    ),
                    Err(e) => (
                        format!(
                            "⚠️  Connected but Error: {}",
                            truncate(&e.to_string(), 50)
                        ),
                        store.name().to_string(),
                        "Connected",
                        vec![],
                    ),
                }
            }
            None => (
                "❌ Not Available".to_string(),
                "❌ Not Set".to_string(),
                "Not Connected",
                vec![],
            ),
        };

    let url_status = if config.database_url.is_some() {
        "✅ Set"
    } else {
        "❌ Not Set"
    };
    let database_name = match (&store, &config.database_name) {
        (None, Some(_)) => "✅ Set".to_string(),
        _ => database_name,
    };

    Json(json!({
        "backend": "✅ Running",
        "database": database,
        "database_url": url_status,
        "database_name": database_name,
        "connection_status": connection_status,
        "collections": collections,
    }))
}

fn require_store(
    store: Option<Arc<dyn DocumentStore>>,
) -> Result<Arc<dyn DocumentStore>, ServerError> {
    store.ok_or(ServerError::Unavailable)
}

/// `limit` is rejected when out of range, never clamped.
pub fn validate_limit(limit: Option<i64>) -> Result<i64, ServerError> {
    match limit {
        None => Ok(DEFAULT_LIMIT),
        Some(l) if (MIN_LIMIT..=MAX_LIMIT).contains(&l) => Ok(l),
        Some(l) => Err(ServerError::BadRequest(format!(
            "limit must be between {MIN_LIMIT} and {MAX_LIMIT}, got {l}"
        ))),
    }
}

pub async fn add_property(
    State(AppState { store, .. }): State<AppState>,
    Json(payload): Json<PropertyCreate>,
) -> Result<Json<JsonValue>, ServerError> {
    let store = require_store(store)?;
    let doc = match serde_json::to_value(&payload)? {
        JsonValue::Object(map) => document_from_json(map),
        _ => Document::new(),
    };
    let kind = RecordKind::Property;
    kind.check(&doc).map_err(ServerError::BadRequest)?;

    let id = store.insert(kind, doc).await?;
    tracing::info!(%id, collection = kind.collection(), "created document");

    Ok(Json(json!({ "id": id.to_string(), "status": "created" })))
}

#[derive(Serialize)]
pub struct Items {
    items: Vec<Document>,
}

pub async fn list_properties(
    State(AppState { store, .. }): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Items>, ServerError> {
    let limit = validate_limit(params.limit)?;
    let store = require_store(store)?;
    let filter = Filter::build(&params);
    tracing::debug!(?filter, limit, "listing properties");

    let docs = store.find(RecordKind::Property, &filter, limit).await?;

    Ok(Json(Items {
        items: normalize::normalize_all(docs),
    }))
}

pub async fn get_property(
    State(AppState { store, .. }): State<AppState>,
    Path(property_id): Path<String>,
) -> Result<Json<Document>, ServerError> {
    let store = require_store(store)?;
    let id = Uuid::parse_str(&property_id)
        .map_err(|_| ServerError::BadRequest("Invalid property id".into()))?;
    let doc = store
        .find_one(RecordKind::Property, id)
        .await?
        .ok_or_else(|| ServerError::NotFound("Property not found".into()))?;

    Ok(Json(normalize::normalize(doc)))
}
