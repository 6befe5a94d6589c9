//! Full index rebuilds from a batch of raw documents.

use crate::document::{NormalizedRecord, ParserConfig, RawDocument, parse};
use crate::error::{BuildFailure, ParseFailure};
use crate::search::{DocIndex, IndexMeta};
use crate::store::RebuildGuard;
use chrono::Utc;
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use xxhash_rust::xxh3::Xxh3;

/// Outcome of a committed rebuild.
#[derive(Debug, Clone, Serialize)]
pub struct BuildReport {
    pub generation: u64,
    /// Documents that parsed successfully, duplicates included.
    pub indexed: usize,
    pub failed: Vec<ParseFailure>,
    #[serde(with = "duration_millis")]
    pub elapsed: Duration,
    /// Documents in the committed index.
    pub document_count: usize,
    pub corpus_digest: u64,
}

mod duration_millis {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(duration.as_millis() as u64)
    }
}

/// A fully built index that has not been committed yet.
#[derive(Debug)]
pub struct PreparedIndex {
    pub index: DocIndex,
    pub indexed: usize,
    pub failed: Vec<ParseFailure>,
    started: Instant,
}

/// Parses batches and produces complete replacement indexes.
#[derive(Debug, Clone, Default)]
pub struct IndexBuilder {
    parser: ParserConfig,
}

impl IndexBuilder {
    pub fn new(parser: ParserConfig) -> Self {
        Self { parser }
    }

    pub fn parser(&self) -> &ParserConfig {
        &self.parser
    }

    /// Parse and index `raw` in isolation, off the async runtime.
    pub async fn prepare(
        &self,
        raw: Vec<RawDocument>,
        generation: u64,
    ) -> Result<PreparedIndex, BuildFailure> {
        let parser = self.parser.clone();
        tokio::task::spawn_blocking(move || prepare_batch(&parser, raw, generation))
            .await
            .map_err(BuildFailure::Prepare)
    }

    /// Commit a prepared index and report on it.
    pub async fn commit(
        &self,
        guard: &RebuildGuard,
        prepared: PreparedIndex,
    ) -> Result<BuildReport, BuildFailure> {
        let PreparedIndex {
            index,
            indexed,
            failed,
            started,
        } = prepared;
        let meta = index.meta();
        let document_count = index.len();

        guard.commit(index).await?;

        let report = BuildReport {
            generation: meta.generation,
            indexed,
            failed,
            elapsed: started.elapsed(),
            document_count,
            corpus_digest: meta.corpus_digest,
        };
        tracing::info!(
            generation = report.generation,
            documents = report.document_count,
            failed = report.failed.len(),
            digest = %format!("{:016x}", report.corpus_digest),
            elapsed = ?report.elapsed,
            "Index rebuilt"
        );
        Ok(report)
    }

    /// Replace the serving index with one built from `raw`.
    ///
    /// Documents missing from `raw` disappear. Parse failures are reported,
    /// never fatal. If committing fails the previous index keeps serving.
    pub async fn rebuild(
        &self,
        guard: &RebuildGuard,
        raw: Vec<RawDocument>,
    ) -> Result<BuildReport, BuildFailure> {
        let generation = guard.next_generation().await;
        let prepared = self.prepare(raw, generation).await?;
        self.commit(guard, prepared).await
    }
}

fn prepare_batch(parser: &ParserConfig, raw: Vec<RawDocument>, generation: u64) -> PreparedIndex {
    let started = Instant::now();
    let built_at = Utc::now();
    let corpus_digest = corpus_digest(&raw);

    let mut records: BTreeMap<String, NormalizedRecord> = BTreeMap::new();
    let mut failed = vec![];
    let mut indexed = 0;

    for document in &raw {
        match parse(document, parser) {
            Ok(mut record) => {
                indexed += 1;
                record.last_updated = Some(built_at);
                if records.insert(record.filepath.clone(), record).is_some() {
                    tracing::warn!(
                        filepath = %document.path,
                        "Duplicate document path, keeping the later one"
                    );
                }
            }
            Err(failure) => {
                tracing::warn!(
                    filepath = %failure.path,
                    reason = %failure.reason,
                    "Skipping unparseable document"
                );
                failed.push(failure);
            }
        }
    }

    tracing::debug!(
        documents = records.len(),
        failed = failed.len(),
        elapsed = ?started.elapsed(),
        "Parsed batch"
    );

    let index = DocIndex::new(
        records.into_values().collect(),
        IndexMeta {
            generation,
            built_at: Some(built_at),
            corpus_digest,
        },
    );

    PreparedIndex {
        index,
        indexed,
        failed,
        started,
    }
}

/// Order-independent xxh3 digest of a raw batch.
pub fn corpus_digest(raw: &[RawDocument]) -> u64 {
    let mut sorted: Vec<&RawDocument> = raw.iter().collect();
    sorted.sort_by(|a, b| a.path.cmp(&b.path).then_with(|| a.content.cmp(&b.content)));

    let mut hasher = Xxh3::new();
    for document in sorted {
        hasher.update(&(document.path.len() as u64).to_le_bytes());
        hasher.update(document.path.as_bytes());
        hasher.update(&(document.content.len() as u64).to_le_bytes());
        hasher.update(document.content.as_bytes());
    }
    hasher.digest()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ParseFailureReason;
    use crate::store::IndexStore;
    use assert2::check;
    use std::sync::Arc;

    fn batch() -> Vec<RawDocument> {
        vec![
            RawDocument::new("layout/flex.mdx", "---\ntitle: flex\n---\nFlex items."),
            RawDocument::new("layout/grid.mdx", "---\ntitle: grid\n---\nGrid layouts."),
            RawDocument::new("broken.mdx", "---\ntitle: broken\n"),
        ]
    }

    #[test]
    fn digest_ignores_batch_order() {
        let mut reversed = batch();
        reversed.reverse();
        check!(corpus_digest(&batch()) == corpus_digest(&reversed));

        let mut changed = batch();
        changed[0].content.push('!');
        check!(corpus_digest(&batch()) != corpus_digest(&changed));
    }

    #[test]
    fn prepare_stamps_records_and_collects_failures() {
        let prepared = prepare_batch(&ParserConfig::default(), batch(), 7);
        check!(prepared.indexed == 2);
        check!(prepared.failed.len() == 1);
        check!(prepared.failed[0].reason == ParseFailureReason::UnterminatedFrontMatter);
        check!(prepared.index.generation() == 7);
        let built_at = prepared.index.meta().built_at;
        check!(built_at.is_some());
        check!(prepared.index.records().iter().all(|r| r.last_updated == built_at));
    }

    #[test]
    fn later_duplicate_wins() {
        let raw = vec![
            RawDocument::new("a.md", "first version"),
            RawDocument::new("a.md", "second version"),
        ];
        let prepared = prepare_batch(&ParserConfig::default(), raw, 1);
        check!(prepared.indexed == 2);
        check!(prepared.index.len() == 1);
        check!(prepared.index.record(0).content == "second version");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn rebuild_commits_and_reports() {
        let store = Arc::new(IndexStore::in_memory());
        let builder = IndexBuilder::default();
        let guard = store.try_begin_rebuild().unwrap();

        let report = builder.rebuild(&guard, batch()).await.unwrap();
        check!(report.generation == 1);
        check!(report.document_count == 2);
        check!(report.failed.len() == 1);
        check!(report.corpus_digest == corpus_digest(&batch()));

        let second = builder.rebuild(&guard, batch()).await.unwrap();
        check!(second.generation == 2);
        drop(guard);
        check!(store.snapshot().await.generation() == 2);
    }

    #[tokio::test]
    async fn panicked_preparation_is_not_reported_as_commit() {
        let join_error = tokio::task::spawn_blocking(|| panic!("parser bug"))
            .await
            .unwrap_err();
        let failure = BuildFailure::Prepare(join_error);
        check!(failure.to_string().starts_with("index preparation task failed"));
        check!(std::error::Error::source(&failure).is_some());
    }
}
