//! [`RecordStore`] over the backend's PostgREST endpoint.
//!
//! Lists are read with `select=*` ordered by `created_at.desc`. Writes ask for the stored
//! representation back.

use super::RecordStore;
use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::record::{Fields, Record, RecordId};
use crate::schema::EntityType;
use crate::{PhrError, PhrResult};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{RequestBuilder, Response, Url};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

const APIKEY_HEADER: &str = "apikey";
const PREFER_HEADER: &str = "Prefer";
const RETURN_REPRESENTATION: &str = "return=representation";

/// Error body returned by the backend's REST layer.
#[derive(Debug, Deserialize)]
struct BackendError {
    code: Option<String>,
    message: Option<String>,
}

/// [`RecordStore`] over the hosted backend's REST interface.
///
/// Every request carries the publishable key as both `apikey` and bearer token. Rows are
/// addressed with `id=eq.<id>` filters and writes ask for the affected rows back so a
/// missing row can be told apart from a successful no-op.
pub struct RestStore {
    client: reqwest::Client,
    collections: HashMap<EntityType, Url>,
    timeout: Duration,
}

impl RestStore {
    /// Build a store client from connection settings.
    ///
    /// # Errors
    ///
    /// Returns `PhrError::InvalidConfig` if the key cannot be sent as a header, a collection
    /// URL cannot be formed, or the HTTP client fails to initialise.
    pub fn new(cfg: &StoreConfig) -> PhrResult<Self> {
        let key = cfg.publishable_key();
        let mut headers = HeaderMap::new();
        headers.insert(
            APIKEY_HEADER,
            HeaderValue::from_str(key)
                .map_err(|e| PhrError::InvalidConfig(format!("invalid publishable key: {e}")))?,
        );
        let mut bearer = HeaderValue::from_str(&format!("Bearer {key}"))
            .map_err(|e| PhrError::InvalidConfig(format!("invalid publishable key: {e}")))?;
        bearer.set_sensitive(true);
        headers.insert(AUTHORIZATION, bearer);

        let client = reqwest::Client::builder()
            .timeout(cfg.request_timeout())
            .default_headers(headers)
            .build()
            .map_err(|e| PhrError::InvalidConfig(format!("failed to build HTTP client: {e}")))?;

        let mut collections = HashMap::new();
        for entity in EntityType::ALL {
            collections.insert(entity, cfg.collection_url(entity.collection())?);
        }

        tracing::debug!(base_url = %cfg.base_url(), "initialised REST record store");

        Ok(Self {
            client,
            collections,
            timeout: cfg.request_timeout(),
        })
    }

    fn url(&self, entity: EntityType) -> StoreResult<Url> {
        self.collections
            .get(&entity)
            .cloned()
            .ok_or_else(|| StoreError::Decode(format!("no endpoint for {entity}")))
    }

    fn id_filter(id: &RecordId) -> (&'static str, String) {
        ("id", format!("eq.{id}"))
    }

    async fn send(&self, entity: EntityType, request: RequestBuilder) -> StoreResult<Response> {
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                StoreError::Timeout {
                    collection: entity.collection(),
                    limit: self.timeout,
                }
            } else {
                StoreError::Transport(e)
            }
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let (code, message) = match serde_json::from_str::<BackendError>(&body) {
            Ok(err) => (err.code, err.message.unwrap_or_else(|| body.clone())),
            Err(_) => (None, body),
        };
        tracing::warn!(
            collection = entity.collection(),
            status = status.as_u16(),
            code = code.as_deref().unwrap_or(""),
            "store rejected request"
        );
        Err(StoreError::Rejected {
            status: status.as_u16(),
            code,
            message,
        })
    }

    async fn rows(response: Response) -> StoreResult<Vec<Record>> {
        response
            .json::<Vec<Record>>()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))
    }
}

#[async_trait]
impl RecordStore for RestStore {
    async fn list(&self, entity: EntityType) -> StoreResult<Vec<Record>> {
        let request = self
            .client
            .get(self.url(entity)?)
            .query(&[("select", "*"), ("order", "created_at.desc")]);
        let response = self.send(entity, request).await?;
        Self::rows(response).await
    }

    async fn get(&self, entity: EntityType, id: &RecordId) -> StoreResult<Record> {
        let request = self
            .client
            .get(self.url(entity)?)
            .query(&[("select", "*")])
            .query(&[Self::id_filter(id)]);
        let response = self.send(entity, request).await?;
        Self::rows(response)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::NotFound {
                collection: entity.collection(),
                id: id.clone(),
            })
    }

    async fn insert(&self, entity: EntityType, fields: Fields) -> StoreResult<Record> {
        let request = self
            .client
            .post(self.url(entity)?)
            .header(PREFER_HEADER, RETURN_REPRESENTATION)
            .json(&fields);
        let response = self.send(entity, request).await?;
        Self::rows(response)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::Decode("insert returned no rows".into()))
    }

    async fn update(&self, entity: EntityType, id: &RecordId, fields: Fields) -> StoreResult<()> {
        let request = self
            .client
            .patch(self.url(entity)?)
            .query(&[Self::id_filter(id)])
            .header(PREFER_HEADER, RETURN_REPRESENTATION)
            .json(&fields);
        let response = self.send(entity, request).await?;
        if Self::rows(response).await?.is_empty() {
            return Err(StoreError::NotFound {
                collection: entity.collection(),
                id: id.clone(),
            });
        }
        Ok(())
    }

    async fn delete(&self, entity: EntityType, id: &RecordId) -> StoreResult<()> {
        let request = self
            .client
            .delete(self.url(entity)?)
            .query(&[Self::id_filter(id)])
            .header(PREFER_HEADER, RETURN_REPRESENTATION);
        let response = self.send(entity, request).await?;
        if Self::rows(response).await?.is_empty() {
            return Err(StoreError::NotFound {
                collection: entity.collection(),
                id: id.clone(),
            });
        }
        Ok(())
    }

    async fn list_where(
        &self,
        entity: EntityType,
        field: &str,
        value: &str,
    ) -> StoreResult<Vec<Record>> {
        let request = self
            .client
            .get(self.url(entity)?)
            .query(&[("select", "*"), ("order", "created_at.desc")])
            .query(&[(field, format!("eq.{value}"))]);
        let response = self.send(entity, request).await?;
        Self::rows(response).await
    }

    async fn delete_where(
        &self,
        entity: EntityType,
        field: &str,
        value: &str,
    ) -> StoreResult<usize> {
        let request = self
            .client
            .delete(self.url(entity)?)
            .query(&[(field, format!("eq.{value}"))])
            .header(PREFER_HEADER, RETURN_REPRESENTATION);
        let response = self.send(entity, request).await?;
        Ok(Self::rows(response).await?.len())
    }

    async fn first(&self, entity: EntityType) -> StoreResult<Option<Record>> {
        let request = self.client.get(self.url(entity)?).query(&[
            ("select", "*"),
            ("order", "created_at.asc"),
            ("limit", "1"),
        ]);
        let response = self.send(entity, request).await?;
        Ok(Self::rows(response).await?.into_iter().next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Query;
    use axum::http::{HeaderMap as AxumHeaders, StatusCode};
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::{json, Value};

    async fn spawn_stub(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind stub listener");
        let addr = listener.local_addr().expect("stub address");
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("stub server");
        });
        format!("http://{addr}")
    }

    fn store_for(base: &str) -> RestStore {
        let cfg = StoreConfig::new(base, "pk_test", Duration::from_secs(5)).expect("config");
        RestStore::new(&cfg).expect("store")
    }

    async fn list_medications(
        headers: AxumHeaders,
        Query(params): Query<HashMap<String, String>>,
    ) -> (StatusCode, Json<Value>) {
        let authorised = headers.get("apikey").and_then(|v| v.to_str().ok()) == Some("pk_test")
            && headers.get("authorization").and_then(|v| v.to_str().ok())
                == Some("Bearer pk_test");
        if !authorised {
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({"code": "PGRST301", "message": "missing key"})),
            );
        }

        if params.get("id").map(String::as_str) == Some("eq.404") {
            return (StatusCode::OK, Json(json!([])));
        }

        if params.get("order").map(String::as_str) == Some("created_at.desc") {
            return (
                StatusCode::OK,
                Json(json!([
                    {"id": 2, "created_at": "2024-02-02T00:00:00Z", "name": "Ibuprofen"},
                    {"id": 1, "created_at": "2024-01-01T00:00:00Z", "name": "Aspirin"}
                ])),
            );
        }

        (StatusCode::BAD_REQUEST, Json(json!({"message": "bad query"})))
    }

    async fn reject_insert() -> (StatusCode, Json<Value>) {
        (
            StatusCode::CONFLICT,
            Json(json!({"code": "23505", "message": "duplicate key value"})),
        )
    }

    async fn drugs_for_parent(
        Query(params): Query<HashMap<String, String>>,
    ) -> (StatusCode, Json<Value>) {
        if params.get("social_history_id").map(String::as_str) != Some("eq.sh-1") {
            return (StatusCode::BAD_REQUEST, Json(json!({"message": "missing filter"})));
        }
        (
            StatusCode::OK,
            Json(json!([
                {"id": "d1", "created_at": "2024-01-01T00:00:00Z", "social_history_id": "sh-1", "drug_type": "cannabis"},
                {"id": "d2", "created_at": "2024-01-02T00:00:00Z", "social_history_id": "sh-1", "drug_type": "other"}
            ])),
        )
    }

    fn stub_router() -> Router {
        Router::new()
            .route(
                "/rest/v1/medications",
                get(list_medications)
                    .post(reject_insert)
                    .patch(|| async { Json(json!([])) }),
            )
            .route(
                "/rest/v1/recreational_drugs",
                get(drugs_for_parent).delete(drugs_for_parent),
            )
    }

    #[tokio::test]
    async fn test_list_sends_key_and_decodes_rows() {
        let base = spawn_stub(stub_router()).await;
        let store = store_for(&base);

        let rows = store.list(EntityType::Medications).await.expect("list");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id.as_str(), "2");
        assert_eq!(rows[0].text("name"), Some("Ibuprofen"));
    }

    #[tokio::test]
    async fn test_get_missing_row_is_not_found() {
        let base = spawn_stub(stub_router()).await;
        let store = store_for(&base);

        let err = store
            .get(EntityType::Medications, &RecordId::new("404"))
            .await
            .expect_err("missing row");
        assert!(matches!(err, StoreError::NotFound { collection: "medications", .. }));
    }

    #[tokio::test]
    async fn test_rejected_insert_carries_backend_code() {
        let base = spawn_stub(stub_router()).await;
        let store = store_for(&base);

        let err = store
            .insert(EntityType::Medications, Fields::new())
            .await
            .expect_err("insert should be rejected");
        match err {
            StoreError::Rejected {
                status,
                code,
                message,
            } => {
                assert_eq!(status, 409);
                assert_eq!(code.as_deref(), Some("23505"));
                assert_eq!(message, "duplicate key value");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_update_with_no_affected_rows_is_not_found() {
        let base = spawn_stub(stub_router()).await;
        let store = store_for(&base);

        let err = store
            .update(EntityType::Medications, &RecordId::new("9"), Fields::new())
            .await
            .expect_err("no rows updated");
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_child_rows_are_filtered_by_parent_column() {
        let base = spawn_stub(stub_router()).await;
        let store = store_for(&base);

        let rows = store
            .list_where(EntityType::RecreationalDrugs, "social_history_id", "sh-1")
            .await
            .expect("filtered list");
        assert_eq!(rows.len(), 2);

        let removed = store
            .delete_where(EntityType::RecreationalDrugs, "social_history_id", "sh-1")
            .await
            .expect("filtered delete");
        assert_eq!(removed, 2);
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_transport_error() {
        let store = store_for("http://127.0.0.1:9");
        let err = store
            .list(EntityType::Allergies)
            .await
            .expect_err("nothing listening");
        assert!(matches!(err, StoreError::Transport(_)));
    }
}
