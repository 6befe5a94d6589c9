//! Full-text search over normalized documentation records.
//!
//! This module provides BM25-ranked search and the structured lookups served
//! to clients, including tokenization, indexing, scoring and snippets.

// Module declarations
pub(crate) mod index;
pub(crate) mod query;
pub(crate) mod scoring;
pub(crate) mod snippet;
pub(crate) mod tokenize;

// Public re-exports (used via lib.rs)
pub use index::{DocId, DocIndex, FIELD_COUNT, Field, IndexMeta, Posting};
pub use query::{
    ClassMatch, EXAMPLES_LIMIT, ExampleHit, FullDocument, LimitRange, MAX_CLASS_LENGTH,
    MAX_QUERY_LENGTH, MAX_SECTION_LENGTH, MAX_SLUG_LENGTH, QueryEngine, SEARCH_LIMIT, SearchHit,
    SectionEntry, VARIANT_LIMIT, VariantHit,
};
pub use scoring::{Bm25, CorpusStats, Scorer, TermMatch};
pub use snippet::SNIPPET_LENGTH;
