//! REST wire client for the search engine.
//!
//! Index management uses the document-index REST routes; bulk writes use
//! the NDJSON `_bulk` endpoint with one action line per document.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use graphsync_types::Record;

use crate::backend::{BulkAction, BulkOp, BulkOutcome, FailedItem, SearchBackend};
use crate::error::SearchError;

/// Connection settings for the search engine REST endpoint.
#[derive(Debug, Clone)]
pub struct HttpSearchConfig {
    /// Base URL, e.g. `http://localhost:9200`.
    pub base_url: String,

    pub username: Option<String>,
    pub password: Option<String>,

    /// Verify TLS certificates when connecting over https.
    pub verify_certs: bool,

    /// Request timeout.
    pub timeout: Duration,
}

impl HttpSearchConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            username: None,
            password: None,
            verify_certs: true,
            timeout: Duration::from_secs(300),
        }
    }

    pub fn with_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    pub fn with_verify_certs(mut self, verify: bool) -> Self {
        self.verify_certs = verify;
        self
    }
}

/// Reqwest-backed search backend.
pub struct HttpSearchClient {
    client: reqwest::Client,
    config: HttpSearchConfig,
}

impl HttpSearchClient {
    pub fn new(config: HttpSearchConfig) -> Result<Self, SearchError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .danger_accept_invalid_certs(!config.verify_certs)
            .build()?;
        Ok(Self { client, config })
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    fn authed(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if let (Some(user), Some(pass)) = (&self.config.username, &self.config.password) {
            builder.basic_auth(user, Some(pass))
        } else {
            builder
        }
    }

    async fn expect_success(
        &self,
        response: reqwest::Response,
        context: &str,
    ) -> Result<reqwest::Response, SearchError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(SearchError::Backend(format!(
                "{context}: HTTP {status}: {body}"
            )))
        }
    }
}

#[derive(Deserialize)]
struct GetResponse {
    #[serde(rename = "_source")]
    source: Option<Record>,
}

#[derive(Deserialize)]
struct BulkResponse {
    #[serde(default)]
    errors: bool,
    #[serde(default)]
    items: Vec<BulkItem>,
}

#[derive(Deserialize)]
struct BulkItem {
    #[serde(alias = "index", alias = "update")]
    result: Option<BulkItemResult>,
}

#[derive(Deserialize)]
struct BulkItemResult {
    #[serde(rename = "_id", default)]
    id: String,
    #[serde(default)]
    status: u16,
    error: Option<BulkItemError>,
}

#[derive(Deserialize)]
struct BulkItemError {
    #[serde(default)]
    reason: String,
}

/// Render bulk actions as an NDJSON request body.
fn ndjson_body(index: &str, actions: &[BulkAction]) -> Result<String, SearchError> {
    let mut body = String::new();
    for action in actions {
        let header = match action.op {
            BulkOp::Index => json!({ "index": { "_index": index, "_id": action.id } }),
            BulkOp::Update => json!({ "update": { "_index": index, "_id": action.id } }),
        };
        body.push_str(&serde_json::to_string(&header)?);
        body.push('\n');
        let line = match action.op {
            BulkOp::Index => serde_json::to_string(&action.body)?,
            BulkOp::Update => serde_json::to_string(&json!({ "doc": action.body }))?,
        };
        body.push_str(&line);
        body.push('\n');
    }
    Ok(body)
}

#[async_trait]
impl SearchBackend for HttpSearchClient {
    async fn exists(&self, index: &str) -> Result<bool, SearchError> {
        let response = self.authed(self.client.head(self.url(index))).send().await?;
        match response.status().as_u16() {
            200 => Ok(true),
            404 => Ok(false),
            status => Err(SearchError::Backend(format!(
                "exists({index}): HTTP {status}"
            ))),
        }
    }

    async fn delete_index(&self, index: &str) -> Result<(), SearchError> {
        let response = self
            .authed(self.client.delete(self.url(index)))
            .send()
            .await?;
        if response.status().as_u16() == 404 {
            return Ok(());
        }
        self.expect_success(response, &format!("delete({index})"))
            .await?;
        Ok(())
    }

    async fn create_index(&self, index: &str, mapping: Option<&Value>) -> Result<(), SearchError> {
        let mut builder = self.authed(self.client.put(self.url(index)));
        if let Some(mapping) = mapping {
            builder = builder.json(mapping);
        }
        let response = builder.send().await?;
        self.expect_success(response, &format!("create({index})"))
            .await?;
        Ok(())
    }

    async fn get(&self, index: &str, id: &str) -> Result<Option<Record>, SearchError> {
        let response = self
            .authed(self.client.get(self.url(&format!("{index}/_doc/{id}"))))
            .send()
            .await?;
        if response.status().as_u16() == 404 {
            return Ok(None);
        }
        let response = self
            .expect_success(response, &format!("get({index}/{id})"))
            .await?;
        let body: GetResponse = response.json().await?;
        Ok(body.source)
    }

    async fn index_document(&self, index: &str, id: &str, doc: &Record) -> Result<(), SearchError> {
        let response = self
            .authed(self.client.put(self.url(&format!("{index}/_doc/{id}"))))
            .json(doc)
            .send()
            .await?;
        self.expect_success(response, &format!("index({index}/{id})"))
            .await?;
        Ok(())
    }

    async fn bulk(
        &self,
        index: &str,
        actions: &[BulkAction],
        refresh: bool,
    ) -> Result<BulkOutcome, SearchError> {
        let body = ndjson_body(index, actions)?;
        let refresh = if refresh { "true" } else { "false" };
        let response = self
            .authed(self.client.post(self.url(&format!("_bulk?refresh={refresh}"))))
            .header("Content-Type", "application/x-ndjson")
            .body(body)
            .send()
            .await?;
        let response = self.expect_success(response, "bulk").await?;
        let parsed: BulkResponse = response.json().await?;

        let mut outcome = BulkOutcome::default();
        for item in parsed.items {
            let Some(result) = item.result else { continue };
            match result.error {
                Some(error) => outcome.failed.push(FailedItem {
                    id: result.id,
                    status: result.status,
                    reason: error.reason,
                }),
                None => outcome.succeeded += 1,
            }
        }
        debug!(
            succeeded = outcome.succeeded,
            failed = outcome.failed.len(),
            had_errors = parsed.errors,
            "Bulk request completed"
        );
        Ok(outcome)
    }

    async fn refresh(&self, index: &str) -> Result<(), SearchError> {
        let response = self
            .authed(self.client.post(self.url(&format!("{index}/_refresh"))))
            .send()
            .await?;
        self.expect_success(response, &format!("refresh({index})"))
            .await?;
        Ok(())
    }
}
