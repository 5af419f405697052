// crates/adapt/src/postgrest.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{header, Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::{json, Value as Json};
use std::time::Duration;
use url::Url;

use crate::store::{ConfigRow, RemoteStore, RowId, StoreError};

const TABLE: &str = "config";
const RETURN_REPRESENTATION: &str = "return=representation";

/// `RemoteStore` backed by a PostgREST `config` table.
#[derive(Debug, Clone)]
pub struct PostgrestStore {
    client: Client,
    table_url: String,
}

impl PostgrestStore {
    pub fn new(base: &Url, timeout: Duration) -> Result<Self, StoreError> {
        let client = Client::builder()
            .user_agent(concat!("archive/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            table_url: format!("{}/{TABLE}", base.as_str().trim_end_matches('/')),
        })
    }

    fn prefer(req: RequestBuilder) -> RequestBuilder {
        req.header(header::ACCEPT, "application/json")
            .header("Prefer", RETURN_REPRESENTATION)
    }

    async fn rows<T: DeserializeOwned>(response: Response) -> Result<Vec<T>, StoreError> {
        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::Status(status.as_u16()));
        }
        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }

    async fn single(response: Response) -> Result<ConfigRow, StoreError> {
        Self::rows(response)
            .await?
            .into_iter()
            .next()
            .ok_or(StoreError::EmptyResponse)
    }
}

#[async_trait]
impl RemoteStore for PostgrestStore {
    #[tracing::instrument(skip_all)]
    async fn fetch(&self) -> Result<Option<ConfigRow>, StoreError> {
        let req = self.client.get(&self.table_url).query(&[("limit", "1")]);
        let response = Self::prefer(req).send().await?;
        Ok(Self::rows(response).await?.into_iter().next())
    }

    #[tracing::instrument(skip_all)]
    async fn insert(&self, data: Json) -> Result<ConfigRow, StoreError> {
        let req = self.client.post(&self.table_url).json(&json!({ "data": data }));
        Self::single(Self::prefer(req).send().await?).await
    }

    #[tracing::instrument(skip_all, fields(%id))]
    async fn update(
        &self,
        id: RowId,
        data: Json,
        updated_at: DateTime<Utc>,
    ) -> Result<ConfigRow, StoreError> {
        let req = self
            .client
            .patch(&self.table_url)
            .query(&[("id", format!("eq.{id}"))])
            .json(&json!({ "data": data, "updated_at": updated_at.to_rfc3339() }));
        Self::single(Self::prefer(req).send().await?).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        extract::{Query, State},
        http::{HeaderMap, StatusCode},
        routing::get,
        Json as AxumJson, Router,
    };
    use parking_lot::Mutex;
    use std::{collections::HashMap, sync::Arc};

    /// In-memory stand-in for a PostgREST table.
    #[derive(Clone, Default)]
    struct Table {
        rows: Arc<Mutex<Vec<Json>>>,
        fail: bool,
    }

    fn wants_representation(headers: &HeaderMap) -> bool {
        headers
            .get("prefer")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v == RETURN_REPRESENTATION)
    }

    async fn list(
        State(t): State<Table>,
        Query(q): Query<HashMap<String, String>>,
    ) -> Result<AxumJson<Vec<Json>>, StatusCode> {
        if t.fail {
            return Err(StatusCode::SERVICE_UNAVAILABLE);
        }
        let limit = q
            .get("limit")
            .and_then(|l| l.parse().ok())
            .unwrap_or(usize::MAX);
        Ok(AxumJson(t.rows.lock().iter().take(limit).cloned().collect()))
    }

    async fn create(
        State(t): State<Table>,
        headers: HeaderMap,
        AxumJson(body): AxumJson<Json>,
    ) -> Result<AxumJson<Vec<Json>>, StatusCode> {
        if !wants_representation(&headers) {
            return Err(StatusCode::BAD_REQUEST);
        }
        let mut rows = t.rows.lock();
        let row = json!({
            "id": rows.len() as i64 + 1,
            "data": body["data"].clone(),
            "created_at": "2024-01-01T00:00:00+00:00",
            "updated_at": "2024-01-01T00:00:00+00:00",
        });
        rows.push(row.clone());
        Ok(AxumJson(vec![row]))
    }

    async fn modify(
        State(t): State<Table>,
        Query(q): Query<HashMap<String, String>>,
        AxumJson(body): AxumJson<Json>,
    ) -> AxumJson<Vec<Json>> {
        let id = q.get("id").and_then(|f| f.strip_prefix("eq.")).unwrap_or("");
        let mut rows = t.rows.lock();
        let mut changed = Vec::new();
        for row in rows.iter_mut().filter(|r| r["id"].to_string() == id) {
            row["data"] = body["data"].clone();
            row["updated_at"] = body["updated_at"].clone();
            changed.push(row.clone());
        }
        AxumJson(changed)
    }

    async fn serve(table: Table) -> PostgrestStore {
        let app = Router::new()
            .route("/rest/config", get(list).post(create).patch(modify))
            .with_state(table);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let base = Url::parse(&format!("http://{addr}/rest/")).unwrap();
        PostgrestStore::new(&base, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn table_url_ignores_trailing_slash() {
        let a = Url::parse("http://localhost:3000").unwrap();
        let b = Url::parse("http://localhost:3000/api/").unwrap();
        let t = Duration::from_secs(1);
        assert_eq!(
            PostgrestStore::new(&a, t).unwrap().table_url,
            "http://localhost:3000/config"
        );
        assert_eq!(
            PostgrestStore::new(&b, t).unwrap().table_url,
            "http://localhost:3000/api/config"
        );
    }

    #[tokio::test]
    async fn empty_table_fetches_none() {
        let store = serve(Table::default()).await;
        assert!(store.fetch().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn insert_then_update_round_trip() {
        let table = Table::default();
        let store = serve(table.clone()).await;

        let created = store.insert(json!({ "heroTitle": "One" })).await.unwrap();
        assert_eq!(created.id, RowId::Int(1));

        let fetched = store.fetch().await.unwrap().unwrap();
        assert_eq!(fetched.data["heroTitle"], "One");

        let updated = store
            .update(fetched.id, json!({ "heroTitle": "Two" }), Utc::now())
            .await
            .unwrap();
        assert_eq!(updated.data["heroTitle"], "Two");
        assert!(updated.updated_at.unwrap() > created.updated_at.unwrap());
        assert_eq!(table.rows.lock().len(), 1);
    }

    #[tokio::test]
    async fn upsert_goes_through_http() {
        let table = Table::default();
        let store = serve(table.clone()).await;

        crate::store::upsert(&store, json!({ "v": 1 })).await.unwrap();
        crate::store::upsert(&store, json!({ "v": 2 })).await.unwrap();

        let rows = table.rows.lock();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["data"]["v"], 2);
    }

    #[tokio::test]
    async fn update_of_missing_row_is_empty_response() {
        let store = serve(Table::default()).await;
        let err = store
            .update(RowId::Int(42), json!({}), Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::EmptyResponse));
    }

    #[tokio::test]
    async fn server_errors_surface_as_status() {
        let store = serve(Table {
            fail: true,
            ..Default::default()
        })
        .await;
        let err = store.fetch().await.unwrap_err();
        assert!(matches!(err, StoreError::Status(503)));
    }

    #[tokio::test]
    async fn unreachable_host_is_http_error() {
        let base = Url::parse("http://127.0.0.1:1/").unwrap();
        let store = PostgrestStore::new(&base, Duration::from_millis(500)).unwrap();
        assert!(matches!(store.fetch().await, Err(StoreError::Http(_))));
    }
}
