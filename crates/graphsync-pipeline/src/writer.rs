//! Bulk write orchestration.
//!
//! Three write modes, selected by call site: upsert (create-or-replace),
//! merge (read-merge-write), and update (update-existing-only). Every
//! bulk request gets exactly one retry on whole-batch failure; a second
//! failure aborts the owning index. Per-document failures reported inside
//! an accepted bulk response are logged, never fatal.

use tracing::{debug, warn};

use graphsync_search::{BulkAction, BulkOutcome, SearchBackend};
use graphsync_types::{record_id, Record};

use crate::error::PipelineError;

/// Update actions are sent in fixed-size batches to bound request size.
const UPDATE_BATCH_SIZE: usize = 5_000;

/// Counts from one write call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteOutcome {
    /// Documents accepted by the backend.
    pub written: u64,
    /// Records skipped: missing id, empty update body, or update against
    /// a document that does not exist.
    pub skipped: u64,
}

impl WriteOutcome {
    fn absorb(&mut self, other: WriteOutcome) {
        self.written += other.written;
        self.skipped += other.skipped;
    }
}

/// Applies page writes against the search backend.
pub struct Writer<'a> {
    backend: &'a dyn SearchBackend,
    /// Keep the id field inside the document body in addition to using it
    /// as the document identifier.
    keep_id_in_source: bool,
}

impl<'a> Writer<'a> {
    pub fn new(backend: &'a dyn SearchBackend, keep_id_in_source: bool) -> Self {
        Self {
            backend,
            keep_id_in_source,
        }
    }

    /// Create-or-fully-replace every record of a page.
    ///
    /// Records without a usable id are skipped with a warning.
    pub async fn bulk_upsert(
        &self,
        index: &str,
        page: &[Record],
        id_field: &str,
    ) -> Result<WriteOutcome, PipelineError> {
        let mut outcome = WriteOutcome::default();
        let mut actions = Vec::with_capacity(page.len());
        for record in page {
            let Some(id) = record_id(record, id_field) else {
                warn!(index, id_field, "Record missing id field, skipping");
                outcome.skipped += 1;
                continue;
            };
            actions.push(BulkAction::index(id, self.upsert_body(record, id_field)));
        }
        outcome.absorb(self.send_index_actions(index, actions).await?);
        Ok(outcome)
    }

    /// Upsert pre-built documents with explicit ids (about and model
    /// indices build their document sets in memory).
    pub async fn upsert_documents(
        &self,
        index: &str,
        documents: Vec<(String, Record)>,
    ) -> Result<WriteOutcome, PipelineError> {
        let actions = documents
            .into_iter()
            .map(|(id, body)| BulkAction::index(id, body))
            .collect();
        self.send_index_actions(index, actions).await
    }

    /// Read each existing document, overlay the record's fields, and
    /// upsert the merged result. Untouched existing fields survive.
    pub async fn bulk_merge(
        &self,
        index: &str,
        page: &[Record],
        id_field: &str,
    ) -> Result<WriteOutcome, PipelineError> {
        let mut outcome = WriteOutcome::default();
        let mut actions = Vec::with_capacity(page.len());
        for record in page {
            let Some(id) = record_id(record, id_field) else {
                warn!(index, id_field, "Update record missing id field, skipping");
                outcome.skipped += 1;
                continue;
            };
            let mut merged = self.backend.get(index, &id).await?.unwrap_or_default();
            for (key, value) in record {
                merged.insert(key.clone(), value.clone());
            }
            if !self.keep_id_in_source {
                merged.remove(id_field);
            }
            actions.push(BulkAction::index(id, merged));
        }
        outcome.absorb(self.send_index_actions(index, actions).await?);
        Ok(outcome)
    }

    /// Update existing documents only; documents missing from the index
    /// are counted as skipped. The id field never goes into the update
    /// body, and an update with no remaining fields is skipped outright.
    pub async fn bulk_update(
        &self,
        index: &str,
        page: &[Record],
        id_field: &str,
    ) -> Result<WriteOutcome, PipelineError> {
        let mut outcome = WriteOutcome::default();
        let mut actions = Vec::with_capacity(page.len());
        for record in page {
            let Some(id) = record_id(record, id_field) else {
                warn!(index, id_field, "Update record missing id field, skipping");
                outcome.skipped += 1;
                continue;
            };
            let mut body = record.clone();
            body.remove(id_field);
            if body.is_empty() {
                debug!(index, id = %id, "Update carries no fields besides the id, skipping");
                outcome.skipped += 1;
                continue;
            }
            actions.push(BulkAction::update(id, body));
        }

        for batch in actions.chunks(UPDATE_BATCH_SIZE) {
            let bulk = self.send_with_retry(index, batch).await?;
            outcome.written += bulk.succeeded as u64;
            for failed in &bulk.failed {
                if failed.is_missing() {
                    debug!(index, id = %failed.id, "Document not in index, update skipped");
                    outcome.skipped += 1;
                } else {
                    warn!(
                        index,
                        id = %failed.id,
                        status = failed.status,
                        reason = %failed.reason,
                        "Document update failed"
                    );
                }
            }
        }
        Ok(outcome)
    }

    fn upsert_body(&self, record: &Record, id_field: &str) -> Record {
        let mut body = record.clone();
        if !self.keep_id_in_source {
            body.remove(id_field);
        }
        body
    }

    async fn send_index_actions(
        &self,
        index: &str,
        actions: Vec<BulkAction>,
    ) -> Result<WriteOutcome, PipelineError> {
        if actions.is_empty() {
            warn!(index, "No documents to write");
            return Ok(WriteOutcome::default());
        }
        let bulk = self.send_with_retry(index, &actions).await?;
        for failed in &bulk.failed {
            warn!(
                index,
                id = %failed.id,
                status = failed.status,
                reason = %failed.reason,
                "Document write failed"
            );
        }
        Ok(WriteOutcome {
            written: bulk.succeeded as u64,
            skipped: 0,
        })
    }

    /// One retry on whole-batch failure; the second failure propagates
    /// and aborts the owning index.
    async fn send_with_retry(
        &self,
        index: &str,
        actions: &[BulkAction],
    ) -> Result<BulkOutcome, PipelineError> {
        match self.backend.bulk(index, actions, false).await {
            Ok(outcome) => Ok(outcome),
            Err(first) => {
                warn!(index, error = %first, "Bulk write failed, retrying once");
                self.backend
                    .bulk(index, actions, false)
                    .await
                    .map_err(PipelineError::WriteFailure)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    use graphsync_search::InMemoryBackend;

    fn record(value: serde_json::Value) -> Record {
        value.as_object().unwrap().clone()
    }

    fn page(values: &[serde_json::Value]) -> Vec<Record> {
        values.iter().map(|v| record(v.clone())).collect()
    }

    #[tokio::test]
    async fn test_upsert_keeps_id_in_body_by_default() {
        let backend = InMemoryBackend::new();
        let writer = Writer::new(&backend, true);
        let outcome = writer
            .bulk_upsert("products", &page(&[json!({ "id": "a-1", "stock": 5 })]), "id")
            .await
            .unwrap();
        assert_eq!(outcome, WriteOutcome { written: 1, skipped: 0 });
        let doc = backend.document("products", "a-1").unwrap();
        assert_eq!(doc["id"], json!("a-1"));
        assert_eq!(doc["stock"], json!(5));
    }

    #[tokio::test]
    async fn test_upsert_strips_id_when_configured() {
        let backend = InMemoryBackend::new();
        let writer = Writer::new(&backend, false);
        writer
            .bulk_upsert("products", &page(&[json!({ "id": "a-1", "stock": 5 })]), "id")
            .await
            .unwrap();
        let doc = backend.document("products", "a-1").unwrap();
        assert!(doc.get("id").is_none());
        assert_eq!(doc["stock"], json!(5));
    }

    #[tokio::test]
    async fn test_upsert_skips_records_without_id() {
        let backend = InMemoryBackend::new();
        let writer = Writer::new(&backend, true);
        let outcome = writer
            .bulk_upsert(
                "products",
                &page(&[json!({ "id": "a-1" }), json!({ "stock": 2 }), json!({ "id": "" })]),
                "id",
            )
            .await
            .unwrap();
        assert_eq!(outcome, WriteOutcome { written: 1, skipped: 2 });
        assert_eq!(backend.count("products"), 1);
    }

    #[tokio::test]
    async fn test_upsert_is_idempotent() {
        let backend = InMemoryBackend::new();
        let writer = Writer::new(&backend, true);
        let page = page(&[json!({ "id": "a-1", "stock": 5 })]);
        writer.bulk_upsert("products", &page, "id").await.unwrap();
        let first = backend.document("products", "a-1").unwrap();
        writer.bulk_upsert("products", &page, "id").await.unwrap();
        assert_eq!(backend.document("products", "a-1").unwrap(), first);
        assert_eq!(backend.count("products"), 1);
    }

    #[tokio::test]
    async fn test_merge_preserves_untouched_fields() {
        let backend = InMemoryBackend::new();
        let writer = Writer::new(&backend, true);
        writer
            .bulk_upsert(
                "products",
                &page(&[json!({ "id": "a-1", "vendor": "acme", "stock": 5 })]),
                "id",
            )
            .await
            .unwrap();

        writer
            .bulk_merge(
                "products",
                &page(&[json!({ "id": "a-1", "stock": 9, "color": "red" })]),
                "id",
            )
            .await
            .unwrap();

        let doc = backend.document("products", "a-1").unwrap();
        assert_eq!(doc["vendor"], json!("acme"));
        assert_eq!(doc["stock"], json!(9));
        assert_eq!(doc["color"], json!("red"));
    }

    #[tokio::test]
    async fn test_merge_creates_missing_documents() {
        let backend = InMemoryBackend::new();
        let writer = Writer::new(&backend, true);
        let outcome = writer
            .bulk_merge("products", &page(&[json!({ "id": "new", "stock": 1 })]), "id")
            .await
            .unwrap();
        assert_eq!(outcome.written, 1);
        assert!(backend.document("products", "new").is_some());
    }

    #[tokio::test]
    async fn test_update_skips_missing_documents() {
        let backend = InMemoryBackend::new();
        let writer = Writer::new(&backend, true);
        writer
            .bulk_upsert("products", &page(&[json!({ "id": "a-1", "stock": 5 })]), "id")
            .await
            .unwrap();

        let outcome = writer
            .bulk_update(
                "products",
                &page(&[
                    json!({ "id": "a-1", "stock": 7 }),
                    json!({ "id": "ghost", "stock": 1 }),
                ]),
                "id",
            )
            .await
            .unwrap();

        assert_eq!(outcome, WriteOutcome { written: 1, skipped: 1 });
        assert_eq!(backend.document("products", "a-1").unwrap()["stock"], json!(7));
        assert!(backend.document("products", "ghost").is_none());
    }

    #[tokio::test]
    async fn test_update_strips_id_and_skips_empty_bodies() {
        let backend = InMemoryBackend::new();
        let writer = Writer::new(&backend, true);
        writer
            .bulk_upsert("products", &page(&[json!({ "id": "a-1", "stock": 5 })]), "id")
            .await
            .unwrap();

        // A record carrying only the id has nothing left to update.
        let outcome = writer
            .bulk_update("products", &page(&[json!({ "id": "a-1" })]), "id")
            .await
            .unwrap();
        assert_eq!(outcome, WriteOutcome { written: 0, skipped: 1 });
        assert_eq!(backend.bulk_calls(), 1); // only the seeding upsert
    }

    #[tokio::test]
    async fn test_update_batches_bound_request_size() {
        let backend = InMemoryBackend::new();
        let writer = Writer::new(&backend, true);

        let seed: Vec<Record> = (0..UPDATE_BATCH_SIZE + 1)
            .map(|i| record(json!({ "id": format!("id-{i}"), "stock": 0 })))
            .collect();
        writer.bulk_upsert("products", &seed, "id").await.unwrap();

        let updates: Vec<Record> = (0..UPDATE_BATCH_SIZE + 1)
            .map(|i| record(json!({ "id": format!("id-{i}"), "stock": 1 })))
            .collect();
        let outcome = writer.bulk_update("products", &updates, "id").await.unwrap();

        assert_eq!(outcome.written, (UPDATE_BATCH_SIZE + 1) as u64);
        // One seeding call plus two update batches.
        assert_eq!(backend.bulk_calls(), 3);
    }

    #[tokio::test]
    async fn test_rejected_document_does_not_fail_the_batch() {
        let backend = InMemoryBackend::new();
        backend.fail_item("a-2", 400, "mapper_parsing_exception");
        let writer = Writer::new(&backend, true);

        let outcome = writer
            .bulk_upsert(
                "products",
                &page(&[json!({ "id": "a-1" }), json!({ "id": "a-2" })]),
                "id",
            )
            .await
            .unwrap();

        assert_eq!(outcome, WriteOutcome { written: 1, skipped: 0 });
        assert!(backend.document("products", "a-1").is_some());
        assert!(backend.document("products", "a-2").is_none());
        // Accepted batch, so no retry was attempted.
        assert_eq!(backend.bulk_calls(), 1);
    }

    #[tokio::test]
    async fn test_single_failure_is_retried() {
        let backend = InMemoryBackend::new();
        backend.fail_next_bulk("transient");
        let writer = Writer::new(&backend, true);

        let outcome = writer
            .bulk_upsert("products", &page(&[json!({ "id": "a-1" })]), "id")
            .await
            .unwrap();
        assert_eq!(outcome.written, 1);
        assert_eq!(backend.bulk_calls(), 2);
    }

    #[tokio::test]
    async fn test_second_failure_aborts() {
        let backend = InMemoryBackend::new();
        backend.fail_next_bulk("down");
        backend.fail_next_bulk("still down");
        let writer = Writer::new(&backend, true);

        let err = writer
            .bulk_upsert("products", &page(&[json!({ "id": "a-1" })]), "id")
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::WriteFailure(_)));
        // Exactly one retry: two attempts total.
        assert_eq!(backend.bulk_calls(), 2);
        assert_eq!(backend.count("products"), 0);
    }
}
