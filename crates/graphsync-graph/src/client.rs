//! HTTP wire client for the graph database.
//!
//! Speaks the transactional HTTP endpoint: one statement per request,
//! committed immediately. Both query guards run on every execution, before
//! any request is built. Result rows are zipped with the returned column
//! names into loosely typed records.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use graphsync_types::Record;

use crate::error::GraphError;
use crate::guard::{check_pagination_params, check_read_only};
use crate::GraphSource;

/// Connection settings for the graph database HTTP endpoint.
#[derive(Debug, Clone)]
pub struct HttpGraphConfig {
    /// Base URL, e.g. `http://localhost:7474`.
    pub base_url: String,

    /// Path of the transaction-commit endpoint under the base URL.
    pub tx_endpoint: String,

    pub username: Option<String>,
    pub password: Option<String>,

    /// Request timeout.
    pub timeout: Duration,
}

impl HttpGraphConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            tx_endpoint: "db/neo4j/tx/commit".to_string(),
            username: None,
            password: None,
            timeout: Duration::from_secs(300),
        }
    }

    pub fn with_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }
}

/// Reqwest-backed graph source.
pub struct HttpGraphClient {
    client: reqwest::Client,
    config: HttpGraphConfig,
}

#[derive(Serialize)]
struct TxRequest<'a> {
    statements: Vec<TxStatement<'a>>,
}

#[derive(Serialize)]
struct TxStatement<'a> {
    statement: &'a str,
    parameters: &'a Map<String, Value>,
}

#[derive(Deserialize)]
struct TxResponse {
    #[serde(default)]
    results: Vec<TxResult>,
    #[serde(default)]
    errors: Vec<TxError>,
}

#[derive(Deserialize)]
struct TxResult {
    columns: Vec<String>,
    data: Vec<TxRow>,
}

#[derive(Deserialize)]
struct TxRow {
    row: Vec<Value>,
}

#[derive(Deserialize)]
struct TxError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

impl HttpGraphClient {
    pub fn new(config: HttpGraphConfig) -> Result<Self, GraphError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;
        Ok(Self { client, config })
    }

    fn tx_url(&self) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.tx_endpoint.trim_start_matches('/')
        )
    }
}

#[async_trait]
impl GraphSource for HttpGraphClient {
    async fn execute(
        &self,
        query: &str,
        params: &Map<String, Value>,
    ) -> Result<Vec<Record>, GraphError> {
        // Every execution is guarded, not just paginated ones.
        check_read_only(query)?;
        check_pagination_params(query)?;

        let request = TxRequest {
            statements: vec![TxStatement {
                statement: query,
                parameters: params,
            }],
        };

        let mut builder = self.client.post(self.tx_url()).json(&request);
        if let (Some(user), Some(pass)) = (&self.config.username, &self.config.password) {
            builder = builder.basic_auth(user, Some(pass));
        }

        let response = builder.send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GraphError::Backend(format!("HTTP {status}: {body}")));
        }

        let body: TxResponse = response.json().await?;
        if !body.errors.is_empty() {
            let joined = body
                .errors
                .iter()
                .map(|e| format!("{}: {}", e.code, e.message))
                .collect::<Vec<_>>()
                .join("; ");
            return Err(GraphError::Backend(joined));
        }

        let result = body
            .results
            .into_iter()
            .next()
            .ok_or_else(|| GraphError::Backend("response carried no result set".to_string()))?;

        let records = rows_to_records(&result.columns, result.data);
        debug!(records = records.len(), "Graph query returned records");
        Ok(records)
    }
}

/// Zip result rows with their column names into records.
fn rows_to_records(columns: &[String], rows: Vec<TxRow>) -> Vec<Record> {
    rows.into_iter()
        .map(|row| {
            columns
                .iter()
                .cloned()
                .zip(row.row)
                .collect::<Record>()
        })
        .collect()
}
