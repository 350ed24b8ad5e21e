//! Offset/limit pagination cursor.
//!
//! The cursor is an explicit type rather than a generator with a timing
//! side channel: callers draw pages with [`Paginator::next_page`] and read
//! the accumulated source-side timing once the sequence is exhausted.

use std::time::{Duration, Instant};

use serde_json::{Map, Value};
use tracing::debug;

use graphsync_types::Page;

use crate::error::GraphError;
use crate::guard::{check_pagination_params, check_read_only};
use crate::GraphSource;

/// Drives an offset/limit query loop against a graph source.
///
/// Each step merges `{skip, limit}` over the caller-supplied variables
/// (the pagination pair always wins) and yields one page. The sequence
/// ends on an empty page or a page shorter than `page_size`; a non-empty
/// short page is still yielded.
pub struct Paginator<'a> {
    source: &'a dyn GraphSource,
    query: &'a str,
    variables: Map<String, Value>,
    page_size: usize,
    offset: usize,
    finished: bool,
    steps: Vec<Duration>,
    total_records: u64,
}

impl std::fmt::Debug for Paginator<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Paginator")
            .field("query", &self.query)
            .field("variables", &self.variables)
            .field("page_size", &self.page_size)
            .field("offset", &self.offset)
            .field("finished", &self.finished)
            .field("steps", &self.steps)
            .field("total_records", &self.total_records)
            .finish_non_exhaustive()
    }
}

impl<'a> Paginator<'a> {
    /// Validate the query and build a cursor positioned at offset zero.
    ///
    /// Fails before any network call when the query is not read-only or
    /// does not reference both pagination parameters.
    pub fn new(
        source: &'a dyn GraphSource,
        query: &'a str,
        variables: &Map<String, Value>,
        page_size: usize,
    ) -> Result<Self, GraphError> {
        check_read_only(query)?;
        check_pagination_params(query)?;
        Ok(Self {
            source,
            query,
            variables: variables.clone(),
            page_size: page_size.max(1),
            offset: 0,
            finished: false,
            steps: Vec::new(),
            total_records: 0,
        })
    }

    /// Fetch the next page, or `None` once the sequence is exhausted.
    pub async fn next_page(&mut self) -> Result<Option<Page>, GraphError> {
        if self.finished {
            return Ok(None);
        }

        let mut params = self.variables.clone();
        params.insert("skip".to_string(), Value::from(self.offset as u64));
        params.insert("limit".to_string(), Value::from(self.page_size as u64));

        let started = Instant::now();
        let page = self.source.execute(self.query, &params).await?;
        self.steps.push(started.elapsed());

        if page.is_empty() {
            self.finished = true;
            debug!(total = self.total_records, "Pagination exhausted");
            return Ok(None);
        }

        self.total_records += page.len() as u64;
        if page.len() < self.page_size {
            self.finished = true;
        } else {
            self.offset += self.page_size;
        }

        debug!(
            offset = self.offset,
            page_len = page.len(),
            "Fetched page from graph source"
        );
        Ok(Some(page))
    }

    /// Stop drawing pages early (test mode draws a single page).
    pub fn stop(&mut self) {
        self.finished = true;
    }

    /// Records yielded so far.
    pub fn total_records(&self) -> u64 {
        self.total_records
    }

    /// Per-step source execution durations.
    pub fn step_durations(&self) -> &[Duration] {
        &self.steps
    }

    /// Cumulative source-side time, readable only after exhaustion.
    pub fn source_elapsed(&self) -> Option<Duration> {
        self.finished.then(|| self.steps.iter().sum())
    }
}
