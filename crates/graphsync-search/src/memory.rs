//! In-memory search backend.
//!
//! Implements the full [`SearchBackend`] contract over nested maps, with
//! scriptable whole-batch and per-document failures so retry and
//! partial-failure behavior can be tested.
//! Used by tests across the workspace and by nothing in production.

use std::collections::{BTreeMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use graphsync_types::Record;

use crate::backend::{BulkAction, BulkOp, BulkOutcome, FailedItem, SearchBackend};
use crate::error::SearchError;

#[derive(Default)]
struct State {
    indices: BTreeMap<String, BTreeMap<String, Record>>,
    scripted_failures: VecDeque<String>,
    scripted_item_failures: BTreeMap<String, (u16, String)>,
    bulk_calls: usize,
    refreshes: BTreeMap<String, usize>,
}

/// Map-backed search backend for tests and dry runs.
#[derive(Default)]
pub struct InMemoryBackend {
    state: Mutex<State>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the next bulk call to fail as a whole batch.
    ///
    /// Each queued reason consumes exactly one bulk call.
    pub fn fail_next_bulk(&self, reason: impl Into<String>) {
        self.state
            .lock()
            .unwrap()
            .scripted_failures
            .push_back(reason.into());
    }

    /// Script a per-document failure inside an otherwise accepted bulk
    /// response. Consumed by the next bulk action carrying `id`.
    pub fn fail_item(&self, id: impl Into<String>, status: u16, reason: impl Into<String>) {
        self.state
            .lock()
            .unwrap()
            .scripted_item_failures
            .insert(id.into(), (status, reason.into()));
    }

    /// Current source of a stored document.
    pub fn document(&self, index: &str, id: &str) -> Option<Record> {
        self.state
            .lock()
            .unwrap()
            .indices
            .get(index)
            .and_then(|docs| docs.get(id))
            .cloned()
    }

    /// Number of documents in an index.
    pub fn count(&self, index: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .indices
            .get(index)
            .map(|docs| docs.len())
            .unwrap_or(0)
    }

    /// Total bulk calls observed, including failed ones.
    pub fn bulk_calls(&self) -> usize {
        self.state.lock().unwrap().bulk_calls
    }

    /// Refresh calls observed for an index.
    pub fn refresh_count(&self, index: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .refreshes
            .get(index)
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait]
impl SearchBackend for InMemoryBackend {
    async fn exists(&self, index: &str) -> Result<bool, SearchError> {
        Ok(self.state.lock().unwrap().indices.contains_key(index))
    }

    async fn delete_index(&self, index: &str) -> Result<(), SearchError> {
        self.state.lock().unwrap().indices.remove(index);
        Ok(())
    }

    async fn create_index(&self, index: &str, _mapping: Option<&Value>) -> Result<(), SearchError> {
        self.state
            .lock()
            .unwrap()
            .indices
            .entry(index.to_string())
            .or_default();
        Ok(())
    }

    async fn get(&self, index: &str, id: &str) -> Result<Option<Record>, SearchError> {
        Ok(self.document(index, id))
    }

    async fn index_document(&self, index: &str, id: &str, doc: &Record) -> Result<(), SearchError> {
        self.state
            .lock()
            .unwrap()
            .indices
            .entry(index.to_string())
            .or_default()
            .insert(id.to_string(), doc.clone());
        Ok(())
    }

    async fn bulk(
        &self,
        index: &str,
        actions: &[BulkAction],
        _refresh: bool,
    ) -> Result<BulkOutcome, SearchError> {
        let mut state = self.state.lock().unwrap();
        state.bulk_calls += 1;
        if let Some(reason) = state.scripted_failures.pop_front() {
            return Err(SearchError::Backend(reason));
        }

        let mut outcome = BulkOutcome::default();
        let mut item_failures = std::mem::take(&mut state.scripted_item_failures);
        let docs = state.indices.entry(index.to_string()).or_default();
        for action in actions {
            if let Some((status, reason)) = item_failures.remove(&action.id) {
                outcome.failed.push(FailedItem {
                    id: action.id.clone(),
                    status,
                    reason,
                });
                continue;
            }
            match action.op {
                BulkOp::Index => {
                    docs.insert(action.id.clone(), action.body.clone());
                    outcome.succeeded += 1;
                }
                BulkOp::Update => match docs.get_mut(&action.id) {
                    Some(existing) => {
                        for (key, value) in &action.body {
                            existing.insert(key.clone(), value.clone());
                        }
                        outcome.succeeded += 1;
                    }
                    None => outcome.failed.push(FailedItem {
                        id: action.id.clone(),
                        status: 404,
                        reason: "document missing".to_string(),
                    }),
                },
            }
        }
        // Unconsumed scripted failures stay armed for later calls.
        state.scripted_item_failures = item_failures;
        Ok(outcome)
    }

    async fn refresh(&self, index: &str) -> Result<(), SearchError> {
        *self
            .state
            .lock()
            .unwrap()
            .refreshes
            .entry(index.to_string())
            .or_default() += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        value.as_object().unwrap().clone()
    }

    #[tokio::test]
    async fn test_index_and_get() {
        let backend = InMemoryBackend::new();
        backend
            .index_document("products", "a-1", &record(json!({ "stock": 5 })))
            .await
            .unwrap();
        assert!(backend.exists("products").await.unwrap());
        let doc = backend.get("products", "a-1").await.unwrap().unwrap();
        assert_eq!(doc["stock"], json!(5));
        assert!(backend.get("products", "a-2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_bulk_update_merges_and_flags_missing() {
        let backend = InMemoryBackend::new();
        backend
            .index_document("products", "a-1", &record(json!({ "stock": 5, "vendor": "acme" })))
            .await
            .unwrap();

        let outcome = backend
            .bulk(
                "products",
                &[
                    BulkAction::update("a-1", record(json!({ "stock": 9 }))),
                    BulkAction::update("ghost", record(json!({ "stock": 1 }))),
                ],
                false,
            )
            .await
            .unwrap();

        assert_eq!(outcome.succeeded, 1);
        assert_eq!(outcome.failed.len(), 1);
        assert!(outcome.failed[0].is_missing());

        let doc = backend.document("products", "a-1").unwrap();
        assert_eq!(doc["stock"], json!(9));
        assert_eq!(doc["vendor"], json!("acme"));
    }

    #[tokio::test]
    async fn test_scripted_failure_consumes_one_call() {
        let backend = InMemoryBackend::new();
        backend.fail_next_bulk("boom");

        let actions = vec![BulkAction::index("a-1", record(json!({ "x": 1 })))];
        assert!(backend.bulk("products", &actions, false).await.is_err());
        assert!(backend.bulk("products", &actions, false).await.is_ok());
        assert_eq!(backend.bulk_calls(), 2);
    }

    #[tokio::test]
    async fn test_scripted_item_failure_flags_one_document() {
        let backend = InMemoryBackend::new();
        backend.fail_item("a-2", 400, "mapper_parsing_exception");

        let outcome = backend
            .bulk(
                "products",
                &[
                    BulkAction::index("a-1", record(json!({ "x": 1 }))),
                    BulkAction::index("a-2", record(json!({ "x": 2 }))),
                ],
                false,
            )
            .await
            .unwrap();

        assert_eq!(outcome.succeeded, 1);
        assert_eq!(outcome.failed.len(), 1);
        assert_eq!(outcome.failed[0].status, 400);
        assert!(!outcome.failed[0].is_missing());
        assert!(backend.document("products", "a-2").is_none());
    }

    #[tokio::test]
    async fn test_delete_missing_index_is_ok() {
        let backend = InMemoryBackend::new();
        backend.delete_index("nope").await.unwrap();
        backend.create_index("products", None).await.unwrap();
        backend.delete_index("products").await.unwrap();
        assert!(!backend.exists("products").await.unwrap());
    }

    #[tokio::test]
    async fn test_refresh_counted() {
        let backend = InMemoryBackend::new();
        backend.refresh("products").await.unwrap();
        backend.refresh("products").await.unwrap();
        assert_eq!(backend.refresh_count("products"), 2);
    }
}
