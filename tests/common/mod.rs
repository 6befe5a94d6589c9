//! Shared test fixtures and utilities for integration tests.
//!
//! # Test Isolation Strategy
//!
//! Every test gets its own temporary directory holding a small documentation
//! corpus (`docs/`) and a data directory (`data/`) for the persisted index, so
//! tests can run in parallel without sharing state.
//!
//! # Available Fixtures
//!
//! - `corpus`: the sample documents as raw, in-memory documents
//! - `indexed_docs`: a [`DocsFixture`] whose index has already been built

use rstest::fixture;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use utility_docs_mcp::document::RawDocument;
use utility_docs_mcp::source::{DirectorySource, DocumentSource, StaticSource};
use utility_docs_mcp::{DocsService, IndexBuilder, IndexStore, QueryEngine};

pub const SITE_URL: &str = "https://docs.example/docs";

/// The sample corpus: relative path and content.
pub const SAMPLE_DOCS: &[(&str, &str)] = &[
    (
        "layout/flex.mdx",
        r#"---
title: flex
description: Utilities for controlling how flex items both grow and shrink.
---

import { Example } from "@/components/example";

## Basic usage

Use `flex-1` to allow a flex item to grow and shrink as needed.

```html
<div class="flex">
  <div class="flex-none w-14">01</div>
  <div class="flex-1 w-64">02</div>
</div>
```
"#,
    ),
    (
        "layout/display.mdx",
        r#"---
title: display
description: Utilities for controlling the display box type of an element.
---

Use `flex` to create a block-level flex container and `hidden` to remove an element.

```html
<div class="hidden md:block">Visible on medium screens</div>
```
"#,
    ),
    (
        "typography/text-align.mdx",
        r#"---
title: text-align
description: Utilities for controlling the alignment of text.
---

Use `text-center` to center align text.

```html
<p class="text-center">So I started to walk into the water.</p>
<p class="text-left">I won't lie to you, I was terrified.</p>
```
"#,
    ),
    (
        "core-concepts/hover-focus-and-other-states.mdx",
        r#"---
title: Hover, focus, and other states
description: Using utilities to style elements on hover, focus, and more.
---

Every utility class can be applied conditionally by adding a variant to the
beginning of the class name. Use the hover variant to style an element when
the user hovers over it.

```html
<button class="bg-sky-500 hover:bg-sky-700 focus:outline-none">Save changes</button>
```
"#,
    ),
    (
        "dark-mode.mdx",
        r#"---
title: Dark mode
description: Using variants to style your site in dark mode.
---

Tailwind includes a dark variant that lets you style your site differently
when dark mode is enabled.

<div class="bg-white dark:bg-gray-800">Dark ready</div>
"#,
    ),
];

/// The sample corpus as raw documents.
pub fn sample_documents() -> Vec<RawDocument> {
    SAMPLE_DOCS
        .iter()
        .map(|(path, content)| RawDocument::new(*path, *content))
        .collect()
}

/// A temporary directory for test isolation, removed on drop.
#[allow(dead_code)] // Methods used across different integration test crates
pub struct TempWorkspace {
    _temp: TempDir,
    root: PathBuf,
}

#[allow(dead_code)] // Methods used across different integration test crates
impl TempWorkspace {
    /// Creates a new empty temporary workspace.
    pub fn new() -> Self {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let root = temp.path().to_path_buf();
        Self { _temp: temp, root }
    }

    /// Returns the root path of this workspace.
    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Creates a file with the given content within this workspace.
    ///
    /// Parent directories are created automatically if they don't exist.
    pub fn create_file(&self, path: &str, content: &str) {
        let full_path = self.root.join(path);
        if let Some(parent) = full_path.parent() {
            std::fs::create_dir_all(parent).unwrap_or_else(|e| {
                panic!("Failed to create parent directory for '{}': {}", path, e)
            });
        }
        std::fs::write(&full_path, content)
            .unwrap_or_else(|e| panic!("Failed to write file '{}': {}", path, e));
    }

    /// Removes a file within this workspace.
    pub fn remove_file(&self, path: &str) {
        std::fs::remove_file(self.root.join(path))
            .unwrap_or_else(|e| panic!("Failed to remove file '{}': {}", path, e));
    }
}

impl Default for TempWorkspace {
    fn default() -> Self {
        Self::new()
    }
}

/// A documentation corpus on disk plus a service indexing it.
///
/// Documents live under `docs/`, the persisted index under `data/`.
#[allow(dead_code)] // Fields used across different integration test crates
pub struct DocsFixture {
    pub workspace: TempWorkspace,
    pub service: Arc<DocsService>,
}

#[allow(dead_code)] // Methods used across different integration test crates
impl DocsFixture {
    /// Writes the sample corpus and opens an (empty) service over it.
    pub async fn new() -> Self {
        let workspace = TempWorkspace::new();
        for (path, content) in SAMPLE_DOCS {
            workspace.create_file(&format!("docs/{}", path), content);
        }
        let service = open_service(workspace.path()).await;
        Self { workspace, service }
    }

    /// Writes a document into the corpus (visible on the next refresh).
    pub fn write_doc(&self, path: &str, content: &str) {
        self.workspace.create_file(&format!("docs/{}", path), content);
    }

    pub fn remove_doc(&self, path: &str) {
        self.workspace.remove_file(&format!("docs/{}", path));
    }

    pub fn data_dir(&self) -> PathBuf {
        self.workspace.path().join("data")
    }

    /// Opens a second service over the same corpus and data directory.
    pub async fn reopen(&self) -> Arc<DocsService> {
        open_service(self.workspace.path()).await
    }

    pub async fn refresh(&self) -> utility_docs_mcp::BuildReport {
        self.service
            .refresh(&CancellationToken::new())
            .await
            .expect("refresh should succeed")
    }
}

async fn open_service(root: &Path) -> Arc<DocsService> {
    let store = IndexStore::open(root.join("data"))
        .await
        .expect("Failed to open store");
    let source: Arc<dyn DocumentSource> = Arc::new(DirectorySource::new(root.join("docs")));
    Arc::new(DocsService::new(
        Arc::new(store),
        IndexBuilder::default(),
        QueryEngine::new(SITE_URL),
        source,
    ))
}

/// An in-memory service over `documents`, already refreshed once.
#[allow(dead_code)] // Used by some integration test crates
pub async fn static_service(documents: Vec<RawDocument>) -> (Arc<DocsService>, Arc<StaticSource>) {
    let source = Arc::new(StaticSource::new(documents));
    let service = Arc::new(DocsService::new(
        Arc::new(IndexStore::in_memory()),
        IndexBuilder::default(),
        QueryEngine::new(SITE_URL),
        Arc::clone(&source) as Arc<dyn DocumentSource>,
    ));
    service
        .refresh(&CancellationToken::new())
        .await
        .expect("initial refresh should succeed");
    (service, source)
}

#[fixture]
pub fn corpus() -> Vec<RawDocument> {
    sample_documents()
}

/// A fixture with the sample corpus indexed and persisted.
#[fixture]
pub async fn indexed_docs() -> DocsFixture {
    let fixture = DocsFixture::new().await;
    fixture.refresh().await;
    fixture
}
