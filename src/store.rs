//! The index handle: the serving snapshot, its persisted form and the rebuild gate.
//!
//! Readers clone the current `Arc<DocIndex>` under a short read lock and query
//! it lock-free. A rebuild builds a complete new index in isolation, persists
//! it (temp file + rename) and only then swaps the pointer, so readers observe
//! either the old index or the new one, never a mix.

use crate::document::{CodeExample, NormalizedRecord};
use crate::error::{BuildFailure, StoreError};
use crate::search::{DocIndex, IndexMeta};
use ahash::AHashMap;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

/// File name of the persisted snapshot inside the data directory.
pub const SNAPSHOT_FILE: &str = "index.bin";

/// Bumped whenever the snapshot layout changes.
pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

/// Full-text projection of a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FullTextRow {
    pub filepath: String,
    pub title: String,
    pub content: String,
    pub section: String,
    pub description: Option<String>,
}

/// Metadata projection of a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataRow {
    pub filepath: String,
    pub title: String,
    pub section: String,
    pub utility_classes: BTreeSet<String>,
    pub code_examples: Vec<CodeExample>,
    pub last_updated: Option<DateTime<Utc>>,
}

/// On-disk form of an index. Projections are joined by filepath on load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Must stay the first field so the version can be read on its own.
    pub format_version: u32,
    pub generation: u64,
    pub last_rebuild: Option<DateTime<Utc>>,
    pub corpus_digest: u64,
    pub full_text: Vec<FullTextRow>,
    pub metadata: Vec<MetadataRow>,
}

impl Snapshot {
    pub fn from_index(index: &DocIndex) -> Self {
        let meta = index.meta();
        let records = index.records();
        Self {
            format_version: SNAPSHOT_FORMAT_VERSION,
            generation: meta.generation,
            last_rebuild: meta.built_at,
            corpus_digest: meta.corpus_digest,
            full_text: records
                .iter()
                .map(|r| FullTextRow {
                    filepath: r.filepath.clone(),
                    title: r.title.clone(),
                    content: r.content.clone(),
                    section: r.section.clone(),
                    description: r.description.clone(),
                })
                .collect(),
            metadata: records
                .iter()
                .map(|r| MetadataRow {
                    filepath: r.filepath.clone(),
                    title: r.title.clone(),
                    section: r.section.clone(),
                    utility_classes: r.utility_classes.clone(),
                    code_examples: r.code_examples.clone(),
                    last_updated: r.last_updated,
                })
                .collect(),
        }
    }

    /// Join both projections back into records and index them.
    pub fn into_index(self) -> Result<DocIndex, StoreError> {
        let mut metadata: AHashMap<String, MetadataRow> = self
            .metadata
            .into_iter()
            .map(|row| (row.filepath.clone(), row))
            .collect();

        let mut records = Vec::with_capacity(self.full_text.len());
        for row in self.full_text {
            let meta = metadata
                .remove(&row.filepath)
                .ok_or_else(|| StoreError::ProjectionMismatch(row.filepath.clone()))?;
            records.push(NormalizedRecord {
                filepath: row.filepath,
                title: row.title,
                section: row.section,
                description: row.description,
                content: row.content,
                utility_classes: meta.utility_classes,
                code_examples: meta.code_examples,
                last_updated: meta.last_updated,
            });
        }

        // Metadata rows without a full-text row
        if let Some(orphan) = metadata.into_keys().min() {
            return Err(StoreError::ProjectionMismatch(orphan));
        }

        Ok(DocIndex::new(
            records,
            IndexMeta {
                generation: self.generation,
                built_at: self.last_rebuild,
                corpus_digest: self.corpus_digest,
            },
        ))
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, StoreError> {
        let (found, _) = postcard::take_from_bytes::<u32>(bytes)?;
        if found != SNAPSHOT_FORMAT_VERSION {
            return Err(StoreError::Version {
                found,
                expected: SNAPSHOT_FORMAT_VERSION,
            });
        }
        Ok(postcard::from_bytes(bytes)?)
    }
}

/// Owner of the serving index.
pub struct IndexStore {
    current: RwLock<Arc<DocIndex>>,
    rebuild_gate: Arc<Mutex<()>>,
    /// Where snapshots are persisted; `None` keeps the store in memory only.
    data_dir: Option<PathBuf>,
}

impl std::fmt::Debug for IndexStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexStore")
            .field("data_dir", &self.data_dir)
            .field("rebuilding", &self.rebuild_gate.try_lock().is_err())
            .finish()
    }
}

impl IndexStore {
    /// An empty store that never touches the filesystem.
    pub fn in_memory() -> Self {
        Self::with_index(DocIndex::empty(), None)
    }

    fn with_index(index: DocIndex, data_dir: Option<PathBuf>) -> Self {
        Self {
            current: RwLock::new(Arc::new(index)),
            rebuild_gate: Arc::new(Mutex::new(())),
            data_dir,
        }
    }

    /// Open the store in `data_dir`, loading the persisted snapshot if there is one.
    ///
    /// A missing snapshot yields an empty index. An unreadable one is an error;
    /// callers decide whether to start empty instead (see [`IndexStore::empty`]).
    pub async fn open(data_dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let data_dir = data_dir.into();
        let path = data_dir.join(SNAPSHOT_FILE);

        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "No persisted index, starting empty");
                return Ok(Self::empty(data_dir));
            }
            Err(source) => return Err(StoreError::Io { path, source }),
        };

        let index = Snapshot::decode(&bytes)?.into_index()?;
        tracing::info!(
            path = %path.display(),
            generation = index.generation(),
            documents = index.len(),
            "Loaded persisted index"
        );
        Ok(Self::with_index(index, Some(data_dir)))
    }

    /// An empty store persisting into `data_dir`.
    pub fn empty(data_dir: impl Into<PathBuf>) -> Self {
        Self::with_index(DocIndex::empty(), Some(data_dir.into()))
    }

    /// The index currently being served.
    pub async fn snapshot(&self) -> Arc<DocIndex> {
        Arc::clone(&*self.current.read().await)
    }

    pub fn data_dir(&self) -> Option<&Path> {
        self.data_dir.as_deref()
    }

    pub fn snapshot_path(&self) -> Option<PathBuf> {
        self.data_dir.as_ref().map(|dir| dir.join(SNAPSHOT_FILE))
    }

    /// Whether a rebuild currently holds the gate.
    pub fn is_rebuilding(&self) -> bool {
        self.rebuild_gate.try_lock().is_err()
    }

    /// Take exclusive rebuild rights, or `None` if another rebuild holds them.
    pub fn try_begin_rebuild(self: &Arc<Self>) -> Option<RebuildGuard> {
        let gate = Arc::clone(&self.rebuild_gate).try_lock_owned().ok()?;
        Some(RebuildGuard {
            store: Arc::clone(self),
            gate: Arc::new(gate),
        })
    }
}

/// Exclusive right to replace the serving index.
///
/// The gate opens once the guard and every commit task it started are gone.
pub struct RebuildGuard {
    store: Arc<IndexStore>,
    gate: Arc<OwnedMutexGuard<()>>,
}

impl RebuildGuard {
    /// Generation number the next committed index should carry.
    pub async fn next_generation(&self) -> u64 {
        self.store.snapshot().await.generation() + 1
    }

    /// Persist `index` and make it the serving index.
    ///
    /// Runs in a spawned task holding the gate, so a caller dropping this
    /// future neither splits the snapshot from the served index nor lets
    /// another rebuild start before the swap lands. On error the previous
    /// index keeps serving.
    pub async fn commit(&self, index: DocIndex) -> Result<Arc<DocIndex>, BuildFailure> {
        let store = Arc::clone(&self.store);
        let gate = Arc::clone(&self.gate);
        tokio::spawn(async move {
            let committed = store.persist_and_swap(index).await;
            drop(gate);
            committed
        })
        .await?
    }
}

impl IndexStore {
    async fn persist_and_swap(&self, index: DocIndex) -> Result<Arc<DocIndex>, BuildFailure> {
        let index = Arc::new(index);

        if let Some(data_dir) = &self.data_dir {
            let encoded = Arc::clone(&index);
            // Serialize in spawn_blocking since it's CPU intensive
            let bytes = tokio::task::spawn_blocking(move || {
                postcard::to_stdvec(&Snapshot::from_index(&encoded))
            })
            .await??;
            write_atomically(data_dir, &bytes).await?;
        }

        *self.current.write().await = Arc::clone(&index);
        tracing::debug!(generation = index.generation(), "Swapped serving index");
        Ok(index)
    }
}

/// Write the snapshot to a temp file, then rename it over the previous one.
async fn write_atomically(data_dir: &Path, bytes: &[u8]) -> Result<(), BuildFailure> {
    let persist = |path: &Path| {
        let path = path.to_path_buf();
        move |source| BuildFailure::Persist { path, source }
    };

    tokio::fs::create_dir_all(data_dir)
        .await
        .map_err(persist(data_dir))?;

    let target = data_dir.join(SNAPSHOT_FILE);
    let temp = data_dir.join(format!("{SNAPSHOT_FILE}.tmp"));

    if let Err(e) = tokio::fs::write(&temp, bytes).await {
        let _ = tokio::fs::remove_file(&temp).await;
        return Err(persist(&temp)(e));
    }
    tokio::fs::rename(&temp, &target)
        .await
        .map_err(persist(&target))?;

    tracing::debug!(path = %target.display(), bytes = bytes.len(), "Persisted index snapshot");
    Ok(())
}
