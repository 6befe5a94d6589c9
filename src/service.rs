//! The service façade: query operations and refresh over one index store.

use crate::builder::{BuildReport, IndexBuilder};
use crate::error::{QueryError, RefreshError};
use crate::search::{
    ClassMatch, ExampleHit, FullDocument, QueryEngine, SearchHit, SectionEntry, VariantHit,
};
use crate::source::DocumentSource;
use crate::store::IndexStore;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Snapshot of the serving index for status reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexStatus {
    pub generation: u64,
    pub document_count: usize,
    pub section_count: usize,
    pub term_count: usize,
    pub last_rebuild: Option<DateTime<Utc>>,
    pub corpus_digest: u64,
    pub rebuilding: bool,
    pub source: String,
}

/// Query operations and refresh, shared by the MCP server, the CLI and the worker.
pub struct DocsService {
    store: Arc<IndexStore>,
    builder: IndexBuilder,
    engine: QueryEngine,
    source: Arc<dyn DocumentSource>,
}

impl std::fmt::Debug for DocsService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocsService")
            .field("store", &self.store)
            .field("source", &self.source.describe())
            .finish()
    }
}

impl DocsService {
    pub fn new(
        store: Arc<IndexStore>,
        builder: IndexBuilder,
        engine: QueryEngine,
        source: Arc<dyn DocumentSource>,
    ) -> Self {
        Self {
            store,
            builder,
            engine,
            source,
        }
    }

    pub fn store(&self) -> &Arc<IndexStore> {
        &self.store
    }

    pub fn engine(&self) -> &QueryEngine {
        &self.engine
    }

    pub async fn search(
        &self,
        query: &str,
        limit: Option<usize>,
    ) -> Result<Vec<SearchHit>, QueryError> {
        let index = self.store.snapshot().await;
        self.engine.search(&index, query, limit)
    }

    pub async fn lookup_utility_class(&self, class: &str) -> Result<Vec<ClassMatch>, QueryError> {
        let index = self.store.snapshot().await;
        self.engine.utility_class(&index, class)
    }

    pub async fn list_sections(&self) -> Vec<String> {
        let index = self.store.snapshot().await;
        self.engine.list_sections(&index)
    }

    pub async fn browse_section(&self, section: &str) -> Result<Vec<SectionEntry>, QueryError> {
        let index = self.store.snapshot().await;
        self.engine.section_docs(&index, section)
    }

    /// `Ok(None)` is the not-found signal.
    pub async fn fetch_document(&self, slug: &str) -> Result<Option<FullDocument>, QueryError> {
        let index = self.store.snapshot().await;
        self.engine.full_doc(&index, slug)
    }

    pub async fn search_examples(
        &self,
        query: &str,
        limit: Option<usize>,
    ) -> Result<Vec<ExampleHit>, QueryError> {
        let index = self.store.snapshot().await;
        self.engine.examples(&index, query, limit)
    }

    pub async fn search_variant(
        &self,
        variant: &str,
        limit: Option<usize>,
    ) -> Result<Vec<VariantHit>, QueryError> {
        let index = self.store.snapshot().await;
        self.engine.variant(&index, variant, limit)
    }

    pub async fn suggest_sections(&self, section: &str) -> Vec<String> {
        let index = self.store.snapshot().await;
        self.engine.suggest_sections(&index, section)
    }

    pub async fn suggest_documents(&self, slug: &str) -> Vec<String> {
        let index = self.store.snapshot().await;
        self.engine.suggest_documents(&index, slug)
    }

    /// Fetch the latest documents and rebuild the index from them.
    ///
    /// Fails fast with [`RefreshError::InProgress`] when another refresh is
    /// running. Cancelling `cancel` before the commit step aborts with
    /// [`RefreshError::Cancelled`]. On any error the serving index is untouched.
    pub async fn refresh(&self, cancel: &CancellationToken) -> Result<BuildReport, RefreshError> {
        let result = self.refresh_inner(cancel).await;
        match &result {
            Ok(report) => tracing::info!(
                generation = report.generation,
                documents = report.document_count,
                failed = report.failed.len(),
                "Refresh complete"
            ),
            Err(RefreshError::InProgress) => tracing::debug!("Refresh skipped, another is running"),
            Err(e) => tracing::warn!(error = %e, "Refresh failed, keeping the current index"),
        }
        result
    }

    async fn refresh_inner(&self, cancel: &CancellationToken) -> Result<BuildReport, RefreshError> {
        let guard = self
            .store
            .try_begin_rebuild()
            .ok_or(RefreshError::InProgress)?;

        tracing::info!(source = %self.source.describe(), "Refreshing documentation");
        let raw = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(RefreshError::Cancelled),
            fetched = self.source.fetch_latest() => fetched?,
        };

        let generation = guard.next_generation().await;
        let prepared = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(RefreshError::Cancelled),
            prepared = self.builder.prepare(raw, generation) => prepared?,
        };

        if cancel.is_cancelled() {
            return Err(RefreshError::Cancelled);
        }
        Ok(self.builder.commit(&guard, prepared).await?)
    }

    pub async fn status(&self) -> IndexStatus {
        let index = self.store.snapshot().await;
        let meta = index.meta();
        IndexStatus {
            generation: meta.generation,
            document_count: index.len(),
            section_count: index.section_names().count(),
            term_count: index.term_count(),
            last_rebuild: meta.built_at,
            corpus_digest: meta.corpus_digest,
            rebuilding: self.store.is_rebuilding(),
            source: self.source.describe(),
        }
    }
}
