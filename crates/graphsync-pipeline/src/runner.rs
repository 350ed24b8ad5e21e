//! Run orchestration.
//!
//! Processes the declared indices strictly in order. Every failure while
//! processing one index is caught at the index boundary, recorded as an
//! `ERROR` statistic, and the run moves on to the next index.

use std::time::Instant;

use tracing::{error, info, warn};

use graphsync_graph::{GraphSource, Paginator};
use graphsync_mapping::{validate_page, Mapping};
use graphsync_model::SchemaModel;
use graphsync_search::SearchBackend;
use graphsync_types::{
    AboutIndex, IndexDefinition, IndexSpec, ModelIndex, QueryDefinition, QueryIndex, RunStats,
    Settings, WriteMode,
};

use crate::about::load_about_documents;
use crate::error::PipelineError;
use crate::model_docs::build_model_documents;
use crate::writer::Writer;

/// How a query's pages are written.
#[derive(Debug, Clone, Copy)]
enum PageWrite {
    Upsert,
    Merge,
    Update,
}

impl From<WriteMode> for PageWrite {
    fn from(mode: WriteMode) -> Self {
        match mode {
            WriteMode::Merge => PageWrite::Merge,
            WriteMode::Update => PageWrite::Update,
        }
    }
}

/// Drives one full synchronization run over an index specification.
pub struct Runner<'a> {
    graph: &'a dyn GraphSource,
    search: &'a dyn SearchBackend,
    settings: &'a Settings,
}

impl<'a> Runner<'a> {
    pub fn new(
        graph: &'a dyn GraphSource,
        search: &'a dyn SearchBackend,
        settings: &'a Settings,
    ) -> Self {
        Self {
            graph,
            search,
            settings,
        }
    }

    /// Process every selected index of the specification in order.
    ///
    /// Index failures are recorded in `stats` and never abort the run;
    /// the caller inspects [`RunStats::has_errors`] for the exit status.
    pub async fn run(&self, spec: &IndexSpec, stats: &mut RunStats) {
        let selection = self.settings.effective_selection();
        if let Some(selected) = &selection {
            for name in selected {
                if !spec.indices.iter().any(|def| def.index_name() == name) {
                    warn!(index = %name, "Selected index is not declared in the specification");
                }
            }
        }

        let mut processed_any = false;
        for definition in &spec.indices {
            let name = definition.index_name();
            if let Some(selected) = &selection {
                if !selected.iter().any(|s| s == name) {
                    continue;
                }
            }
            processed_any = true;

            info!(index = %name, "Processing index");
            let started = Instant::now();
            match self.process_index(definition, stats).await {
                Ok(documents) => {
                    let duration = started.elapsed();
                    info!(index = %name, documents, "Index completed");
                    stats.record_completed(name, documents, duration);
                }
                Err(err) => {
                    let duration = started.elapsed();
                    error!(index = %name, error = %err, "Index failed");
                    stats.record_failed(name, duration);
                }
            }
        }

        if !processed_any {
            warn!("No declared index matched the selection; nothing to do");
        }
    }

    async fn process_index(
        &self,
        definition: &IndexDefinition,
        stats: &mut RunStats,
    ) -> Result<u64, PipelineError> {
        match definition {
            IndexDefinition::Query(index) => self.process_query_index(index, stats).await,
            IndexDefinition::AboutFile(index) => self.process_about_index(index).await,
            IndexDefinition::Model(index) => self.process_model_index(index).await,
        }
    }

    async fn process_query_index(
        &self,
        index: &QueryIndex,
        stats: &mut RunStats,
    ) -> Result<u64, PipelineError> {
        let name = index.index_name.as_str();
        let id_field = index.id_field.as_deref().ok_or_else(|| missing(name, "id_field"))?;
        let raw_mapping = index
            .mapping
            .as_ref()
            .ok_or_else(|| missing(name, "mapping"))?;
        let initial = index
            .initial_query
            .as_ref()
            .ok_or_else(|| missing(name, "initial_query"))?;

        let mapping = Mapping::parse(raw_mapping).map_err(|source| PipelineError::InvalidMapping {
            index: name.to_string(),
            source,
        })?;

        self.prepare_index(name, Some(&mapping.creation_body()))
            .await?;

        let writer = Writer::new(self.search, self.settings.keep_id_in_source);
        let mut total = self
            .run_query(name, id_field, &mapping, initial, PageWrite::Upsert, &writer, stats)
            .await?;

        for update in &index.update_queries {
            total += self
                .run_query(
                    name,
                    id_field,
                    &mapping,
                    &update.query,
                    update.mode.into(),
                    &writer,
                    stats,
                )
                .await?;
        }
        Ok(total)
    }

    /// Page through one query, validating the first page against the
    /// mapping, and refresh the index once the query is drained.
    #[allow(clippy::too_many_arguments)]
    async fn run_query(
        &self,
        index: &str,
        id_field: &str,
        mapping: &Mapping,
        query: &QueryDefinition,
        write: PageWrite,
        writer: &Writer<'_>,
        stats: &mut RunStats,
    ) -> Result<u64, PipelineError> {
        info!(index, query = %query.name, "Running query");
        let mut paginator =
            Paginator::new(self.graph, &query.query, &query.variables, query.page_size)?;

        let mut validated = false;
        let mut written = 0u64;
        while let Some(page) = paginator.next_page().await? {
            if !validated {
                validate_page(&page, mapping).map_err(|fields| PipelineError::UnmappedFields {
                    index: index.to_string(),
                    query: query.name.clone(),
                    fields,
                })?;
                validated = true;
            }

            let outcome = match write {
                PageWrite::Upsert => writer.bulk_upsert(index, &page, id_field).await?,
                PageWrite::Merge => writer.bulk_merge(index, &page, id_field).await?,
                PageWrite::Update => writer.bulk_update(index, &page, id_field).await?,
            };
            written += outcome.written;

            if self.settings.test_mode {
                info!(index, query = %query.name, "Test mode, stopping after one page");
                paginator.stop();
            }
        }

        self.search.refresh(index).await?;
        stats.record_query_timings(index, &query.name, paginator.step_durations().to_vec());
        info!(
            index,
            query = %query.name,
            records = paginator.total_records(),
            written,
            "Query complete"
        );
        Ok(written)
    }

    async fn process_about_index(&self, index: &AboutIndex) -> Result<u64, PipelineError> {
        let name = index.index_name.as_str();
        let path = self
            .settings
            .about_file
            .as_deref()
            .ok_or_else(|| missing(name, "about_file"))?;
        let documents = load_about_documents(path)?;

        self.prepare_index(name, None).await?;
        let writer = Writer::new(self.search, self.settings.keep_id_in_source);
        let outcome = writer.upsert_documents(name, documents).await?;
        self.search.refresh(name).await?;
        Ok(outcome.written)
    }

    async fn process_model_index(&self, index: &ModelIndex) -> Result<u64, PipelineError> {
        let name = index.index_name.as_str();
        let files = self
            .settings
            .model_files
            .as_deref()
            .ok_or_else(|| missing(name, "model_files"))?;
        let model = SchemaModel::load(files)?;
        let documents = build_model_documents(&model);

        self.prepare_index(name, None).await?;
        let writer = Writer::new(self.search, self.settings.keep_id_in_source);
        let outcome = writer.upsert_documents(name, documents).await?;
        self.search.refresh(name).await?;
        Ok(outcome.written)
    }

    /// Clear and/or create the destination index per the run settings.
    async fn prepare_index(
        &self,
        name: &str,
        mapping: Option<&serde_json::Value>,
    ) -> Result<(), PipelineError> {
        if self.settings.clear_existing_indices && self.search.exists(name).await? {
            info!(index = %name, "Clearing existing index");
            self.search.delete_index(name).await?;
        }

        if !self.search.exists(name).await? {
            if self.settings.allow_index_creation {
                info!(index = %name, "Creating index");
                self.search.create_index(name, mapping).await?;
            } else {
                warn!(index = %name, "Index does not exist and index creation is disabled");
            }
        }
        Ok(())
    }
}

fn missing(index: &str, field: &'static str) -> PipelineError {
    PipelineError::MissingRequiredConfig {
        index: index.to_string(),
        field,
    }
}
