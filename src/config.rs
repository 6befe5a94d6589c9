//! Configuration: an optional TOML file merged under CLI and environment values.

use crate::cli::Options;
use crate::document::classes::{ClassExtractor, DEFAULT_ATTRIBUTE_PATTERN, DEFAULT_TOKEN_PATTERN};
use crate::document::{DEFAULT_ROOT_SECTION, ParserConfig};
use crate::error::Result;
use crate::source::{DirectorySource, DocumentSource, GitSource};
use anyhow::Context;
use serde::Deserialize;
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_REPO_URL: &str = "https://github.com/tailwindlabs/tailwindcss.com.git";
pub const DEFAULT_DOCS_PATH: &str = "src/docs";
pub const DEFAULT_SITE_URL: &str = "https://tailwindcss.com/docs";

/// Name of the checkout directory inside the data directory.
const CHECKOUT_DIR: &str = "repo";
/// Data directory name under the platform's local data directory.
const APP_DIR: &str = "utility-docs-mcp";

/// Contents of the TOML config file. Every key is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub parser: ParserTable,
    pub source: SourceTable,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ParserTable {
    /// Regex whose first capture group is a whitespace-separated class list
    pub class_attribute_pattern: Option<String>,
    /// Regex every class token must match to be kept
    pub class_token_pattern: Option<String>,
    /// Section for documents at the corpus root
    pub root_section: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SourceTable {
    pub data_dir: Option<String>,
    pub repo_url: Option<String>,
    pub branch: Option<String>,
    pub docs_path: Option<String>,
    pub local_dir: Option<String>,
    pub site_url: Option<String>,
    /// Seconds between background refreshes; 0 disables them
    pub refresh_interval: Option<u64>,
}

pub fn load_file(path: &Path) -> Result<FileConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Where documents come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceSettings {
    Git {
        url: String,
        branch: Option<String>,
        docs_path: PathBuf,
    },
    Directory(PathBuf),
}

/// Fully resolved settings for one process.
#[derive(Debug, Clone)]
pub struct Settings {
    pub data_dir: PathBuf,
    pub source: SourceSettings,
    pub site_url: String,
    pub parser: ParserConfig,
    pub refresh_interval: Option<Duration>,
}

impl Settings {
    /// Merge CLI/environment options over the config file (if any) over defaults.
    pub fn resolve(options: &Options) -> Result<Self> {
        let file = match &options.config {
            Some(path) => load_file(Path::new(expand_tilde(&path.to_string_lossy()).as_ref()))?,
            None => FileConfig::default(),
        };
        Self::merge(options, file)
    }

    pub fn merge(options: &Options, file: FileConfig) -> Result<Self> {
        let FileConfig { parser, source } = file;

        let data_dir = match options.data_dir.as_deref().or(source.data_dir.as_deref()) {
            Some(dir) => PathBuf::from(expand_tilde(dir).as_ref()),
            None => default_data_dir(),
        };

        let local_dir = options.local_dir.as_deref().or(source.local_dir.as_deref());
        let source_settings = match local_dir {
            Some(dir) => SourceSettings::Directory(PathBuf::from(expand_tilde(dir).as_ref())),
            None => SourceSettings::Git {
                url: options
                    .repo_url
                    .clone()
                    .or(source.repo_url)
                    .unwrap_or_else(|| DEFAULT_REPO_URL.to_string()),
                branch: options.branch.clone().or(source.branch),
                docs_path: PathBuf::from(
                    options
                        .docs_path
                        .as_deref()
                        .or(source.docs_path.as_deref())
                        .unwrap_or(DEFAULT_DOCS_PATH),
                ),
            },
        };

        let site_url = options
            .site_url
            .clone()
            .or(source.site_url)
            .unwrap_or_else(|| DEFAULT_SITE_URL.to_string());

        let refresh_interval = options
            .refresh_interval
            .or(source.refresh_interval)
            .filter(|&secs| secs > 0)
            .map(Duration::from_secs);

        Ok(Self {
            data_dir,
            source: source_settings,
            site_url,
            parser: parser_config(parser)?,
            refresh_interval,
        })
    }

    /// Where a git source keeps its checkout.
    pub fn checkout_dir(&self) -> PathBuf {
        self.data_dir.join(CHECKOUT_DIR)
    }

    pub fn document_source(&self) -> Arc<dyn DocumentSource> {
        match &self.source {
            SourceSettings::Git {
                url,
                branch,
                docs_path,
            } => Arc::new(GitSource::new(
                url.clone(),
                branch.clone(),
                self.checkout_dir(),
                docs_path.clone(),
            )),
            SourceSettings::Directory(root) => Arc::new(DirectorySource::new(root.clone())),
        }
    }
}

fn parser_config(table: ParserTable) -> Result<ParserConfig> {
    let attribute = table
        .class_attribute_pattern
        .as_deref()
        .unwrap_or(DEFAULT_ATTRIBUTE_PATTERN);
    let token = table
        .class_token_pattern
        .as_deref()
        .unwrap_or(DEFAULT_TOKEN_PATTERN);
    let classes = ClassExtractor::new(attribute, token)
        .context("Invalid class pattern in [parser] config")?;

    let root_section = table
        .root_section
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| DEFAULT_ROOT_SECTION.to_string());

    Ok(ParserConfig {
        classes,
        root_section,
    })
}

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir().map_or_else(|| PathBuf::from("data"), |dir| dir.join(APP_DIR))
}

/// Expands tilde (`~`) in a path to the user's home directory.
///
/// - `~/foo` becomes `/home/user/foo`
/// - `~` becomes `/home/user`
/// - Other paths are returned unchanged
pub fn expand_tilde(path: &str) -> Cow<'_, str> {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return Cow::Owned(home.join(stripped).display().to_string());
        }
    } else if path == "~"
        && let Some(home) = dirs::home_dir()
    {
        return Cow::Owned(home.display().to_string());
    }
    Cow::Borrowed(path)
}
