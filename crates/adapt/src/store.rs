// crates/adapt/src/store.rs
//! Remote persistence port for the singleton config row.
//! - `RemoteStore` is the seam; `PostgrestStore` is the production adapter.
//! - `upsert` implements "PATCH the existing row, otherwise POST a new one".

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use std::fmt;
use thiserror::Error;

// ─────────────────────────────────────────────────────────────────────────────
// Row model
// ─────────────────────────────────────────────────────────────────────────────

/// Primary key of a config row. PostgREST tables use either serial or text ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RowId {
    Int(i64),
    Text(String),
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowId::Int(n) => write!(f, "{n}"),
            RowId::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigRow {
    pub id: RowId,
    #[serde(default)]
    pub data: Json,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Port
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {0}")]
    Status(u16),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("store returned no row")]
    EmptyResponse,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// First row of the table, if any.
    async fn fetch(&self) -> Result<Option<ConfigRow>, StoreError>;

    async fn insert(&self, data: Json) -> Result<ConfigRow, StoreError>;

    async fn update(
        &self,
        id: RowId,
        data: Json,
        updated_at: DateTime<Utc>,
    ) -> Result<ConfigRow, StoreError>;
}

/// Write `data` to the singleton row, creating it when the table is empty.
#[tracing::instrument(skip_all)]
pub async fn upsert(store: &dyn RemoteStore, data: Json) -> Result<ConfigRow, StoreError> {
    match store.fetch().await? {
        Some(existing) => store.update(existing.id, data, Utc::now()).await,
        None => store.insert(data).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::*;
    use serde_json::json;

    fn row(id: RowId, data: Json) -> ConfigRow {
        ConfigRow {
            id,
            data,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn row_ids_accept_numbers_and_strings() {
        let a: ConfigRow = serde_json::from_value(json!({ "id": 7, "data": {} })).unwrap();
        let b: ConfigRow =
            serde_json::from_value(json!({ "id": "9f0c", "data": null })).unwrap();
        assert_eq!(a.id, RowId::Int(7));
        assert_eq!(b.id.to_string(), "9f0c");
        assert!(b.data.is_null());
    }

    #[test]
    fn row_timestamps_parse_postgres_format() {
        let r: ConfigRow = serde_json::from_value(json!({
            "id": 1,
            "data": {},
            "created_at": "2024-03-01T10:00:00+00:00",
            "updated_at": "2024-03-02T10:00:00.123456+00:00"
        }))
        .unwrap();
        assert!(r.created_at.unwrap() < r.updated_at.unwrap());
    }

    #[tokio::test]
    async fn upsert_patches_existing_row() {
        let mut mock = MockRemoteStore::new();
        mock.expect_fetch()
            .times(1)
            .returning(|| Ok(Some(row(RowId::Int(3), json!({ "old": true })))));
        mock.expect_update()
            .with(eq(RowId::Int(3)), eq(json!({ "new": true })), always())
            .times(1)
            .returning(|id, data, _| Ok(row(id, data)));
        mock.expect_insert().never();

        let saved = upsert(&mock, json!({ "new": true })).await.unwrap();
        assert_eq!(saved.id, RowId::Int(3));
    }

    #[tokio::test]
    async fn upsert_inserts_when_table_empty() {
        let mut mock = MockRemoteStore::new();
        mock.expect_fetch().times(1).returning(|| Ok(None));
        mock.expect_insert()
            .times(1)
            .returning(|data| Ok(row(RowId::Int(1), data)));
        mock.expect_update().never();

        let saved = upsert(&mock, json!({ "a": 1 })).await.unwrap();
        assert_eq!(saved.data, json!({ "a": 1 }));
    }

    #[tokio::test]
    async fn upsert_stops_on_fetch_failure() {
        let mut mock = MockRemoteStore::new();
        mock.expect_fetch()
            .times(1)
            .returning(|| Err(StoreError::Status(503)));
        mock.expect_insert().never();
        mock.expect_update().never();

        let err = upsert(&mock, json!({})).await.unwrap_err();
        assert!(matches!(err, StoreError::Status(503)));
    }
}
