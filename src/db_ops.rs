use super::{
    config::Config,
    filter::{db_ops::push_filter, models::Filter},
    models::{
        document_from_json, Document, RecordKind, Value, ID_FIELD,
        TIMESTAMP_FIELDS,
    },
};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::{StreamExt, TryStreamExt};
use sqlx::{
    postgres::{PgConnectOptions, PgPoolOptions, PgRow},
    query, query_scalar, PgPool, QueryBuilder, Row,
};
use std::str::FromStr;
use uuid::Uuid;

/// Where documents live. Each [`RecordKind`] maps onto one collection. The
/// store assigns `_id` on insert and maintains `created_at` / `updated_at`.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Name of the underlying database, for diagnostics.
    fn name(&self) -> &str;
    async fn insert(&self, kind: RecordKind, doc: Document) -> Result<Uuid>;
    async fn find(
        &self,
        kind: RecordKind,
        filter: &Filter,
        limit: i64,
    ) -> Result<Vec<Document>>;
    async fn find_one(
        &self,
        kind: RecordKind,
        id: Uuid,
    ) -> Result<Option<Document>>;
    async fn list_collections(&self, limit: usize) -> Result<Vec<String>>;
}

/// Drop anything the store owns, so callers can't smuggle in their own ids
/// or timestamps.
pub fn strip_store_fields(mut doc: Document) -> Document {
    doc.remove(ID_FIELD);
    for field in TIMESTAMP_FIELDS {
        doc.remove(field);
    }
    doc
}

const SCHEMA: &str = "
create table if not exists document (
    id uuid primary key,
    collection text not null,
    body jsonb not null,
    created_at timestamptz not null default now(),
    updated_at timestamptz not null default now()
)";

const INDEX: &str = "
create index if not exists document_collection_created_at
    on document (collection, created_at desc)";

pub struct PgStore {
    pool: PgPool,
    name: String,
}

impl PgStore {
    /// Requires `config.database_url`. `config.database_name`, when set,
    /// overrides the database named in the URL.
    pub async fn connect(config: &Config) -> Result<Self> {
        let url = config
            .database_url
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("DATABASE_URL is not set"))?;
        let mut options = PgConnectOptions::from_str(url)?;
        if let Some(name) = &config.database_name {
            options = options.database(name);
        }
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await?;

        query(SCHEMA).execute(&pool).await?;
        query(INDEX).execute(&pool).await?;

        let name: String = query_scalar("select current_database()")
            .fetch_one(&pool)
            .await?;

        Ok(Self { pool, name })
    }
}

fn document_from_row(row: &PgRow) -> Result<Document, sqlx::Error> {
    let id: Uuid = row.try_get("id")?;
    let body: serde_json::Value = row.try_get("body")?;
    let mut doc = match body {
        serde_json::Value::Object(map) => document_from_json(map),
        _ => Document::new(),
    };
    doc.insert(ID_FIELD.to_string(), Value::Id(id));
    for field in TIMESTAMP_FIELDS {
        let ts: Option<DateTime<Utc>> = row.try_get(field)?;
        if let Some(ts) = ts {
            doc.insert(field.to_string(), Value::Timestamp(ts));
        }
    }
    Ok(doc)
}

#[async_trait]
impl DocumentStore for PgStore {
    fn name(&self) -> &str {
        &self.name
    }

    async fn insert(&self, kind: RecordKind, doc: Document) -> Result<Uuid> {
        let id = Uuid::new_v4();
        let body = serde_json::to_value(strip_store_fields(doc))?;
        query("insert into document (id, collection, body) values ($1, $2, $3)")
            .bind(id)
            .bind(kind.collection())
            .bind(body)
            .execute(&self.pool)
            .await?;

        Ok(id)
    }

    async fn find(
        &self,
        kind: RecordKind,
        filter: &Filter,
        limit: i64,
    ) -> Result<Vec<Document>> {
        let mut qb = QueryBuilder::new(
            "select id, body, created_at, updated_at from document
            where collection = ",
        );
        qb.push_bind(kind.collection());
        qb.push(" and ");
        push_filter(&mut qb, filter);
        qb.push(" order by created_at desc, id limit ");
        qb.push_bind(limit);

        let docs = qb
            .build()
            .fetch(&self.pool)
            .map(|row| document_from_row(&row?))
            .try_collect::<Vec<_>>()
            .await?;

        Ok(docs)
    }

    async fn find_one(
        &self,
        kind: RecordKind,
        id: Uuid,
    ) -> Result<Option<Document>> {
        let row = query(
            "select id, body, created_at, updated_at from document
            where collection = $1 and id = $2",
        )
        .bind(kind.collection())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(document_from_row).transpose()?)
    }

    async fn list_collections(&self, limit: usize) -> Result<Vec<String>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        Ok(query_scalar::<_, String>(
            "select distinct collection from document
            order by collection
            limit $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?)
    }
}
