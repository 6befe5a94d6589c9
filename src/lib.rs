pub mod builder;
pub mod cli;
pub mod config;
pub mod document;
pub mod error;
pub mod search;
pub mod server;
pub mod service;
pub mod source;
pub mod store;
pub mod tools;
pub mod tracing;
pub mod worker;

pub use builder::{BuildReport, IndexBuilder};
pub use document::{NormalizedRecord, ParserConfig, RawDocument};
pub use search::{DocIndex, QueryEngine};
pub use server::DocsServer;
pub use service::{DocsService, IndexStatus};
pub use store::IndexStore;
