//! Document store access.
//!
//! The dashboard keeps all order documents in one hosted collection.
//! [`DocumentStore`] is the seam the rest of the crate talks through:
//! [`RemoteStore`] is the production HTTP client, [`MemoryStore`] backs
//! tests and local development. Calls are fire-and-confirm: no retries,
//! no batching, no transactions.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

use crate::config::Config;
use crate::error::{Error, Result};

/// Default timeout for store requests (30 seconds).
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// A stored document: opaque id plus its JSON field map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDocument {
    pub id: String,
    pub fields: Value,
}

/// Asynchronous CRUD over named collections of `(id, fields)` documents.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch every document in the collection, in store order.
    async fn list_all(&self, collection: &str) -> Result<Vec<RawDocument>>;
    /// Append a document; the store assigns and returns the id.
    async fn create(&self, collection: &str, fields: Value) -> Result<String>;
    /// Merge the given fields into an existing document.
    async fn update(&self, collection: &str, id: &str, fields: Value) -> Result<()>;
    /// Delete by id. Deleting an absent document is not an error.
    async fn delete(&self, collection: &str, id: &str) -> Result<()>;
}

// ---------------------------------------------------------------------------
// URL normalisation and error mapping
// ---------------------------------------------------------------------------

/// Normalise the store base URL:
/// - strip trailing slashes
/// - ensure a scheme is present (https, or http for localhost)
pub fn normalize_base_url(url: &str) -> String {
    let mut url = url.trim().to_string();

    if !url.starts_with("http://") && !url.starts_with("https://") {
        if url.starts_with("localhost") || url.starts_with("127.0.0.1") {
            url = format!("http://{url}");
        } else {
            url = format!("https://{url}");
        }
    }

    while url.ends_with('/') {
        url.pop();
    }

    url
}

/// Convert a `reqwest::Error` into a user-friendly message.
fn friendly_error(url: &str, err: &reqwest::Error) -> String {
    if err.is_connect() {
        return format!("Cannot reach the document store at {url}");
    }
    if err.is_timeout() {
        return format!("Connection to {url} timed out");
    }
    if err.is_builder() {
        return format!("Invalid store URL: {url}");
    }
    format!("Network error communicating with {url}: {err}")
}

/// Convert an HTTP status code into a user-friendly message.
fn status_error(status: StatusCode) -> String {
    match status.as_u16() {
        401 => "API key is invalid or expired".to_string(),
        403 => "Not authorized for this collection".to_string(),
        404 => "Document or collection not found".to_string(),
        s if s >= 500 => format!("Document store server error (HTTP {s})"),
        s => format!("Unexpected response from document store (HTTP {s})"),
    }
}

// ---------------------------------------------------------------------------
// Remote store
// ---------------------------------------------------------------------------

/// HTTP client for the hosted document store.
pub struct RemoteStore {
    client: Client,
    base_url: String,
    api_key: String,
}

impl RemoteStore {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| Error::Config(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: normalize_base_url(&config.store_url),
            api_key: config.api_key.clone(),
        })
    }

    fn collection_url(&self, collection: &str) -> String {
        format!("{}/api/collections/{collection}/documents", self.base_url)
    }

    async fn send(&self, req: reqwest::RequestBuilder) -> Result<Value> {
        let resp = req
            .header("X-Api-Key", &self.api_key)
            .send()
            .await
            .map_err(|e| Error::StoreIo(friendly_error(&self.base_url, &e)))?;

        let status = resp.status();
        if !status.is_success() {
            let body_text = resp.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<Value>(&body_text)
                .ok()
                .and_then(|json| {
                    json.get("error")
                        .or_else(|| json.get("message"))
                        .and_then(Value::as_str)
                        .map(|s| s.to_string())
                })
                .unwrap_or_else(|| status_error(status));
            return Err(Error::StoreIo(format!("{detail} (HTTP {})", status.as_u16())));
        }

        let body_text = resp.text().await.unwrap_or_default();
        if body_text.is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&body_text)
            .map_err(|e| Error::StoreIo(format!("invalid JSON from document store: {e}")))
    }
}

#[async_trait]
impl DocumentStore for RemoteStore {
    async fn list_all(&self, collection: &str) -> Result<Vec<RawDocument>> {
        let body = self.send(self.client.get(self.collection_url(collection))).await?;
        // Either a bare array or `{ "documents": [...] }`.
        let documents = body
            .get("documents")
            .cloned()
            .or_else(|| body.as_array().map(|_| body.clone()))
            .unwrap_or(Value::Null);
        let parsed: Vec<RawDocument> = serde_json::from_value(documents)
            .map_err(|e| Error::StoreIo(format!("unexpected document list shape: {e}")))?;
        debug!(collection, count = parsed.len(), "listed documents");
        Ok(parsed)
    }

    async fn create(&self, collection: &str, fields: Value) -> Result<String> {
        let body = self
            .send(self.client.post(self.collection_url(collection)).json(&fields))
            .await?;
        body.get("id")
            .and_then(Value::as_str)
            .map(|s| s.to_string())
            .ok_or_else(|| Error::StoreIo("create response is missing the document id".into()))
    }

    async fn update(&self, collection: &str, id: &str, fields: Value) -> Result<()> {
        let url = format!("{}/{id}", self.collection_url(collection));
        self.send(self.client.patch(url).json(&fields)).await?;
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<()> {
        let url = format!("{}/{id}", self.collection_url(collection));
        self.send(self.client.delete(url)).await?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

/// Insertion-ordered in-memory store for tests and development.
#[derive(Default)]
pub struct MemoryStore {
    collections: Mutex<HashMap<String, Vec<RawDocument>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a collection with pre-built documents (ids preserved).
    pub fn seed(&self, collection: &str, documents: Vec<RawDocument>) {
        let mut collections = self.collections.lock().unwrap();
        collections.insert(collection.to_string(), documents);
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn list_all(&self, collection: &str) -> Result<Vec<RawDocument>> {
        let collections = self.collections.lock().unwrap();
        Ok(collections.get(collection).cloned().unwrap_or_default())
    }

    async fn create(&self, collection: &str, fields: Value) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        let mut collections = self.collections.lock().unwrap();
        collections
            .entry(collection.to_string())
            .or_default()
            .push(RawDocument {
                id: id.clone(),
                fields,
            });
        Ok(id)
    }

    async fn update(&self, collection: &str, id: &str, fields: Value) -> Result<()> {
        let mut collections = self.collections.lock().unwrap();
        let documents = collections
            .get_mut(collection)
            .ok_or_else(|| Error::StoreIo(format!("unknown collection {collection}")))?;
        let doc = documents
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or_else(|| Error::StoreIo(format!("document {id} not found")))?;

        match (doc.fields.as_object_mut(), fields.as_object()) {
            (Some(existing), Some(partial)) => {
                for (k, v) in partial {
                    existing.insert(k.clone(), v.clone());
                }
            }
            _ => doc.fields = fields,
        }
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<()> {
        let mut collections = self.collections.lock().unwrap();
        if let Some(documents) = collections.get_mut(collection) {
            documents.retain(|d| d.id != id);
        }
        Ok(())
    }
}
