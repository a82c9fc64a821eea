//! Firestore-backed document store (REST v1).
//!
//! Each logical operation maps to one REST call (or one call per page for
//! listing):
//!
//! | operation        | request                                                        |
//! |------------------|----------------------------------------------------------------|
//! | `get`            | `GET    {collection}/{key}` (404 = absent)                      |
//! | `list_all`       | `GET    {collection}?pageSize=..&pageToken=..`                  |
//! | `put` (Replace)  | `PATCH  {collection}/{key}` without a mask                      |
//! | `put` (Merge)    | `PATCH  {collection}/{key}?updateMask.fieldPaths=..` per field  |
//! | `delete`         | `DELETE {collection}/{key}`                                     |
//!
//! Firestore creates the document on `PATCH` when it does not exist, which
//! gives both write modes upsert semantics.

pub mod codec;
pub mod config;

pub use config::FirestoreConfig;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, StatusCode, Url};
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};
use tracing::instrument;

use crate::document_store::r#trait::{Document, DocumentStore, Fields, StoreError, WriteMode};

const MAX_KEY_BYTES: usize = 1500;

/// Firestore collection accessed over HTTPS.
#[derive(Debug, Clone)]
pub struct FirestoreDocumentStore {
    client: reqwest::Client,
    config: FirestoreConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListDocumentsResponse {
    #[serde(default)]
    documents: Vec<JsonValue>,
    next_page_token: Option<String>,
}

impl FirestoreDocumentStore {
    pub fn new(config: FirestoreConfig) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| StoreError::Transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &FirestoreConfig {
        &self.config
    }

    fn collection_url(&self) -> Result<Url, StoreError> {
        let mut url = Url::parse(&self.config.documents_root())
            .map_err(|e| StoreError::Transport(format!("invalid Firestore URL: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| StoreError::Transport("Firestore URL cannot carry a path".to_string()))?
            .push(&self.config.collection);
        Ok(url)
    }

    fn document_url(&self, key: &str) -> Result<Url, StoreError> {
        validate_key(key)?;
        let mut url = self.collection_url()?;
        url.path_segments_mut()
            .map_err(|_| StoreError::Transport("Firestore URL cannot carry a path".to_string()))?
            .push(key);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let mut req = self.client.request(method, url);
        if let Some(key) = &self.config.api_key {
            req = req.query(&[("key", key)]);
        }
        if let Some(token) = &self.config.bearer_token {
            req = req.bearer_auth(token);
        }
        req
    }
}

#[async_trait]
impl DocumentStore for FirestoreDocumentStore {
    #[instrument(skip(self), fields(collection = %self.config.collection), err)]
    async fn get(&self, key: &str) -> Result<Option<Document>, StoreError> {
        let url = self.document_url(key)?;
        let resp = self
            .request(Method::GET, url)
            .send()
            .await
            .map_err(|e| map_reqwest_error("get", e))?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let resp = ensure_success(resp).await?;
        let body: JsonValue = resp.json().await.map_err(|e| map_reqwest_error("get", e))?;
        codec::decode_document(&body).map(Some)
    }

    #[instrument(skip(self), fields(collection = %self.config.collection), err)]
    async fn list_all(&self) -> Result<Vec<Document>, StoreError> {
        let url = self.collection_url()?;
        let page_size = self.config.page_size.to_string();
        let mut page_token: Option<String> = None;
        let mut out = Vec::new();

        loop {
            let mut req = self
                .request(Method::GET, url.clone())
                .query(&[("pageSize", page_size.as_str())]);
            if let Some(token) = &page_token {
                req = req.query(&[("pageToken", token.as_str())]);
            }

            let resp = req.send().await.map_err(|e| map_reqwest_error("list", e))?;
            let resp = ensure_success(resp).await?;
            let page: ListDocumentsResponse =
                resp.json().await.map_err(|e| map_reqwest_error("list", e))?;

            for resource in &page.documents {
                match codec::decode_document(resource) {
                    Ok(doc) => out.push(doc),
                    Err(err) => tracing::warn!("skipping undecodable document: {err}"),
                }
            }

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        tracing::debug!(count = out.len(), "listed documents");
        Ok(out)
    }

    #[instrument(skip(self, values), fields(collection = %self.config.collection, mode = ?mode), err)]
    async fn put(&self, key: &str, values: Fields, mode: WriteMode) -> Result<(), StoreError> {
        if mode == WriteMode::Merge && values.is_empty() {
            return Ok(());
        }

        let url = self.document_url(key)?;
        let mut req = self.request(Method::PATCH, url);
        if mode == WriteMode::Merge {
            for name in values.keys() {
                req = req.query(&[("updateMask.fieldPaths", codec::field_path(name))]);
            }
        }

        let resp = req
            .json(&json!({ "fields": codec::encode_fields(&values) }))
            .send()
            .await
            .map_err(|e| map_reqwest_error("put", e))?;
        ensure_success(resp).await?;
        Ok(())
    }

    #[instrument(skip(self), fields(collection = %self.config.collection), err)]
    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let url = self.document_url(key)?;
        let resp = self
            .request(Method::DELETE, url)
            .send()
            .await
            .map_err(|e| map_reqwest_error("delete", e))?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }
        ensure_success(resp).await?;
        Ok(())
    }
}

/// Firestore document id rules.
fn validate_key(key: &str) -> Result<(), StoreError> {
    if key.is_empty() || key == "." || key == ".." {
        return Err(StoreError::InvalidKey(format!("{key:?} is not a valid document id")));
    }
    if key.contains('/') {
        return Err(StoreError::InvalidKey(format!("{key:?} contains '/'")));
    }
    if key.len() > MAX_KEY_BYTES {
        return Err(StoreError::InvalidKey(format!(
            "document id exceeds {MAX_KEY_BYTES} bytes"
        )));
    }
    if key.len() >= 4 && key.starts_with("__") && key.ends_with("__") {
        return Err(StoreError::InvalidKey(format!("{key:?} is reserved")));
    }
    Ok(())
}

async fn ensure_success(resp: Response) -> Result<Response, StoreError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let body = resp.text().await.unwrap_or_default();
    // Google APIs wrap failures as {"error": {"code", "message", "status"}}.
    let message = serde_json::from_str::<JsonValue>(&body)
        .ok()
        .and_then(|v| v.pointer("/error/message").and_then(JsonValue::as_str).map(str::to_string))
        .unwrap_or(body);

    Err(StoreError::Status {
        status: status.as_u16(),
        message,
    })
}

fn map_reqwest_error(operation: &str, err: reqwest::Error) -> StoreError {
    StoreError::Transport(format!("{operation}: {err}"))
}
