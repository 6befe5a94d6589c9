//! Local directory source.

use super::DocumentSource;
use crate::document::RawDocument;
use crate::error::FetchError;
use futures::FutureExt;
use futures::future::BoxFuture;
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};

/// File extensions treated as documents.
pub const DOCUMENT_EXTENSIONS: &[&str] = &["md", "mdx"];

/// Reads every Markdown/MDX file below a directory.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl DocumentSource for DirectorySource {
    fn fetch_latest(&self) -> BoxFuture<'_, Result<Vec<RawDocument>, FetchError>> {
        let root = self.root.clone();
        async move {
            tokio::task::spawn_blocking(move || read_documents(&root))
                .await
                .map_err(|e| FetchError::Io {
                    path: self.root.clone(),
                    source: std::io::Error::other(e),
                })?
        }
        .boxed()
    }

    fn describe(&self) -> String {
        format!("directory {}", self.root.display())
    }
}

/// Walk `root` and read its documents, sorted by relative path.
///
/// Hidden files and directories are skipped. Paths in the result are relative
/// to `root` and `/`-separated; invalid UTF-8 is replaced rather than rejected.
pub fn read_documents(root: &Path) -> Result<Vec<RawDocument>, FetchError> {
    if !root.is_dir() {
        return Err(FetchError::MissingRoot(root.to_path_buf()));
    }

    let mut files: Vec<(String, PathBuf)> = vec![];
    for entry in WalkBuilder::new(root)
        .standard_filters(false)
        .hidden(true)
        .build()
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(root = %root.display(), error = %e, "Skipping unreadable entry");
                continue;
            }
        };

        if !entry.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }
        let path = entry.path();
        let is_document = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| DOCUMENT_EXTENSIONS.contains(&ext));
        if !is_document {
            continue;
        }

        let Ok(relative) = path.strip_prefix(root) else {
            continue;
        };
        let relative = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        files.push((relative, path.to_path_buf()));
    }

    files.sort_by(|a, b| a.0.cmp(&b.0));

    let mut documents = Vec::with_capacity(files.len());
    for (relative, path) in files {
        let bytes = std::fs::read(&path).map_err(|source| FetchError::Io {
            path: path.clone(),
            source,
        })?;
        let content = match String::from_utf8(bytes) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!(filepath = %relative, "Document is not valid UTF-8, replacing invalid bytes");
                String::from_utf8_lossy(e.as_bytes()).into_owned()
            }
        };
        documents.push(RawDocument::new(relative, content));
    }

    tracing::debug!(root = %root.display(), documents = documents.len(), "Read documents");
    Ok(documents)
}
