//! Document sources: where fresh batches of raw documents come from.
//!
//! The index only ever asks a source for "the latest complete batch"; how the
//! batch is obtained (a git checkout, a local directory, memory) is up to the
//! implementation.

mod directory;
mod git;

pub use directory::{DOCUMENT_EXTENSIONS, DirectorySource, read_documents};
pub use git::GitSource;

use crate::document::RawDocument;
use crate::error::FetchError;
use futures::FutureExt;
use futures::future::BoxFuture;
use tokio::sync::RwLock;

/// A provider of complete document batches.
pub trait DocumentSource: Send + Sync {
    /// Fetch the current version of every document.
    fn fetch_latest(&self) -> BoxFuture<'_, Result<Vec<RawDocument>, FetchError>>;

    /// Human-readable description for logs and status output.
    fn describe(&self) -> String;
}

/// A fixed in-memory batch. The batch can be swapped between refreshes.
#[derive(Debug, Default)]
pub struct StaticSource {
    documents: RwLock<Vec<RawDocument>>,
}

impl StaticSource {
    pub fn new(documents: Vec<RawDocument>) -> Self {
        Self {
            documents: RwLock::new(documents),
        }
    }

    /// Replace the batch returned by later fetches.
    pub async fn replace(&self, documents: Vec<RawDocument>) {
        *self.documents.write().await = documents;
    }
}

impl DocumentSource for StaticSource {
    fn fetch_latest(&self) -> BoxFuture<'_, Result<Vec<RawDocument>, FetchError>> {
        async move { Ok(self.documents.read().await.clone()) }.boxed()
    }

    fn describe(&self) -> String {
        "in-memory documents".to_string()
    }
}
