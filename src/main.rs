use anyhow::Context;
use clap::Parser;
use rmcp::{ServiceExt, transport::stdio};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use utility_docs_mcp::cli::{Cli, Commands};
use utility_docs_mcp::config::Settings;
use utility_docs_mcp::tools::{SearchDocsRequest, handle_search_docs};
use utility_docs_mcp::worker::{spawn_initial_build, spawn_refresh_worker};
use utility_docs_mcp::{DocsServer, DocsService, IndexBuilder, IndexStore, QueryEngine};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout carries the MCP protocol
    utility_docs_mcp::tracing::init();

    let cli = Cli::parse();
    let settings = Settings::resolve(&cli.options)?;

    match cli.subcommand() {
        Commands::Serve => serve(settings).await,
        Commands::Index => index(settings).await,
        Commands::Search { query, limit } => search(settings, query, limit).await,
    }
}

/// Open the persisted index, falling back to an empty one if it cannot be loaded.
async fn open_service(settings: &Settings) -> anyhow::Result<Arc<DocsService>> {
    tokio::fs::create_dir_all(&settings.data_dir)
        .await
        .with_context(|| format!("Failed to create data directory {}", settings.data_dir.display()))?;

    let store = match IndexStore::open(&settings.data_dir).await {
        Ok(store) => store,
        Err(e) => {
            tracing::warn!(error = %e, "Persisted index is unusable, starting empty");
            IndexStore::empty(&settings.data_dir)
        }
    };

    Ok(Arc::new(DocsService::new(
        Arc::new(store),
        IndexBuilder::new(settings.parser.clone()),
        QueryEngine::new(settings.site_url.clone()),
        settings.document_source(),
    )))
}

async fn serve(settings: Settings) -> anyhow::Result<()> {
    tracing::info!(
        data_dir = %settings.data_dir.display(),
        "Starting utility-docs-mcp MCP server"
    );

    let docs = open_service(&settings).await?;
    let shutdown = CancellationToken::new();

    if docs.status().await.generation == 0 {
        spawn_initial_build(Arc::clone(&docs), shutdown.clone());
    }
    if let Some(period) = settings.refresh_interval {
        spawn_refresh_worker(Arc::clone(&docs), period, shutdown.clone());
    }

    let server = DocsServer::new(docs, shutdown.clone());
    let service = server.serve(stdio()).await.inspect_err(|e| {
        tracing::error!("Error serving MCP server: {:?}", e);
    })?;

    service.waiting().await?;
    shutdown.cancel();

    Ok(())
}

async fn index(settings: Settings) -> anyhow::Result<()> {
    let docs = open_service(&settings).await?;
    let report = docs
        .refresh(&CancellationToken::new())
        .await
        .context("Failed to rebuild the index")?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

async fn search(settings: Settings, query: String, limit: Option<usize>) -> anyhow::Result<()> {
    let docs = open_service(&settings).await?;
    if docs.status().await.generation == 0 {
        anyhow::bail!("No index in {}; run the `index` subcommand first", settings.data_dir.display());
    }
    let output = handle_search_docs(&docs, SearchDocsRequest { query, limit })
        .await
        .map_err(anyhow::Error::msg)?;
    print!("{}", output);
    Ok(())
}
