use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "utility-docs-mcp", version)]
#[command(about = "Index and search utility-first CSS documentation over MCP", long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub options: Options,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// The subcommand to run; `serve` when none is given.
    pub fn subcommand(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Serve)
    }
}

/// Settings shared by every subcommand. Each falls back to an environment variable,
/// then to the config file, then to a built-in default.
#[derive(Debug, Clone, Default, Args)]
pub struct Options {
    /// TOML config file with [parser] and [source] tables
    #[arg(long, env = "DOCS_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding the index snapshot and the repository checkout
    #[arg(long, env = "DATA_DIR", global = true)]
    pub data_dir: Option<String>,

    /// Git repository to clone the documentation from
    #[arg(long, env = "DOCS_REPO_URL", global = true)]
    pub repo_url: Option<String>,

    /// Branch to check out instead of the repository default
    #[arg(long, env = "DOCS_REPO_BRANCH", global = true)]
    pub branch: Option<String>,

    /// Documentation directory inside the repository
    #[arg(long, env = "DOCS_PATH", global = true)]
    pub docs_path: Option<String>,

    /// Index a local directory instead of a git repository
    #[arg(long, env = "DOCS_LOCAL_DIR", global = true)]
    pub local_dir: Option<String>,

    /// Base URL that document slugs are appended to
    #[arg(long, env = "DOCS_SITE_URL", global = true)]
    pub site_url: Option<String>,

    /// Seconds between background refreshes; 0 disables them
    #[arg(long, env = "DOCS_REFRESH_INTERVAL", global = true)]
    pub refresh_interval: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Commands {
    /// Serve the MCP tools over stdio (default)
    Serve,
    /// Fetch the documentation, rebuild the index and print the report
    Index,
    /// Query the persisted index
    Search {
        query: String,
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
}
