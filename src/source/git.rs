//! Git checkout source: clone once, fast-forward afterwards.

use super::DocumentSource;
use super::directory::read_documents;
use crate::document::RawDocument;
use crate::error::FetchError;
use futures::FutureExt;
use futures::future::BoxFuture;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Documents from a directory inside a git repository.
#[derive(Debug, Clone)]
pub struct GitSource {
    url: String,
    branch: Option<String>,
    checkout_dir: PathBuf,
    /// Documentation root relative to the repository root.
    docs_path: PathBuf,
}

impl GitSource {
    pub fn new(
        url: impl Into<String>,
        branch: Option<String>,
        checkout_dir: impl Into<PathBuf>,
        docs_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            url: url.into(),
            branch,
            checkout_dir: checkout_dir.into(),
            docs_path: docs_path.into(),
        }
    }

    pub fn checkout_dir(&self) -> &Path {
        &self.checkout_dir
    }

    pub fn docs_root(&self) -> PathBuf {
        self.checkout_dir.join(&self.docs_path)
    }

    /// Where a clone is written before it becomes the checkout.
    fn staging_dir(&self) -> PathBuf {
        let mut name = self
            .checkout_dir
            .file_name()
            .map(OsString::from)
            .unwrap_or_else(|| OsString::from("checkout"));
        name.push(".partial");
        self.checkout_dir.with_file_name(name)
    }

    /// Clone the repository, or fast-forward an existing checkout.
    ///
    /// A clone lands in a staging directory and is renamed into place only
    /// once git succeeds, so an interrupted clone never looks like a checkout.
    pub async fn sync(&self) -> Result<(), FetchError> {
        if self.checkout_dir.join(".git").exists() {
            tracing::info!(checkout = %self.checkout_dir.display(), "Pulling documentation repository");
            return run_git(&["pull".into(), "--ff-only".into()], Some(&self.checkout_dir)).await;
        }

        if let Some(parent) = self.checkout_dir.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| FetchError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }

        let staging = self.staging_dir();
        remove_dir_if_exists(&staging).await?;
        remove_dir_if_exists(&self.checkout_dir).await?;

        let mut args: Vec<OsString> = vec!["clone".into(), "--depth".into(), "1".into()];
        if let Some(branch) = &self.branch {
            args.push("--branch".into());
            args.push(branch.into());
        }
        args.push(self.url.as_str().into());
        args.push(staging.as_os_str().to_owned());

        tracing::info!(url = %self.url, checkout = %self.checkout_dir.display(), "Cloning documentation repository");
        if let Err(e) = run_git(&args, None).await {
            let _ = tokio::fs::remove_dir_all(&staging).await;
            return Err(e);
        }

        tokio::fs::rename(&staging, &self.checkout_dir)
            .await
            .map_err(|source| FetchError::Io {
                path: self.checkout_dir.clone(),
                source,
            })
    }
}

async fn remove_dir_if_exists(path: &Path) -> Result<(), FetchError> {
    match tokio::fs::remove_dir_all(path).await {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(FetchError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
        _ => Ok(()),
    }
}

impl DocumentSource for GitSource {
    fn fetch_latest(&self) -> BoxFuture<'_, Result<Vec<RawDocument>, FetchError>> {
        async move {
            self.sync().await?;
            let root = self.docs_root();
            tokio::task::spawn_blocking(move || read_documents(&root))
                .await
                .map_err(|e| FetchError::Io {
                    path: self.docs_root(),
                    source: std::io::Error::other(e),
                })?
        }
        .boxed()
    }

    fn describe(&self) -> String {
        match &self.branch {
            Some(branch) => format!("git {} ({})", self.url, branch),
            None => format!("git {}", self.url),
        }
    }
}

async fn run_git(args: &[OsString], cwd: Option<&Path>) -> Result<(), FetchError> {
    let command = format!(
        "git {}",
        args.iter()
            .map(|a| a.to_string_lossy())
            .collect::<Vec<_>>()
            .join(" ")
    );

    let mut git = tokio::process::Command::new("git");
    git.args(args).kill_on_drop(true);
    if let Some(cwd) = cwd {
        git.current_dir(cwd);
    }

    let output = git.output().await.map_err(|source| FetchError::Io {
        path: cwd.map_or_else(|| PathBuf::from("git"), Path::to_path_buf),
        source,
    })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        tracing::error!(command = %command, stderr = %stderr, "Git command failed");
        return Err(FetchError::Git { command, stderr });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::{check, let_assert};
    use std::process::Command;
    use tempfile::TempDir;

    fn git_available() -> bool {
        Command::new("git")
            .arg("--version")
            .output()
            .is_ok_and(|o| o.status.success())
    }

    fn git(cwd: &Path, args: &[&str]) {
        let status = Command::new("git")
            .args(["-c", "user.name=docs", "-c", "user.email=docs@example.com"])
            .args(args)
            .current_dir(cwd)
            .output()
            .unwrap()
            .status;
        assert!(status.success(), "git {:?} failed", args);
    }

    fn commit_file(repo: &Path, relative: &str, content: &str) {
        let path = repo.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
        git(repo, &["add", "."]);
        git(repo, &["commit", "-q", "-m", relative]);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn clones_then_fast_forwards() {
        if !git_available() {
            return;
        }
        let upstream = TempDir::new().unwrap();
        git(upstream.path(), &["init", "-q"]);
        commit_file(upstream.path(), "src/docs/flex.mdx", "# Flex");

        let data = TempDir::new().unwrap();
        let url = format!("file://{}", upstream.path().display());
        let source = GitSource::new(url, None, data.path().join("repo"), "src/docs");

        let first = source.fetch_latest().await.unwrap();
        check!(first.len() == 1);
        check!(first[0].path == "flex.mdx");

        commit_file(upstream.path(), "src/docs/layout/grid.mdx", "# Grid");
        let second = source.fetch_latest().await.unwrap();
        let paths: Vec<_> = second.iter().map(|d| d.path.as_str()).collect();
        check!(paths == vec!["flex.mdx", "layout/grid.mdx"]);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn failed_clone_reports_git_error() {
        if !git_available() {
            return;
        }
        let data = TempDir::new().unwrap();
        let missing = data.path().join("no-such-repo");
        let url = format!("file://{}", missing.display());
        let source = GitSource::new(url, None, data.path().join("repo"), "src/docs");

        let_assert!(Err(FetchError::Git { command, .. }) = source.fetch_latest().await);
        check!(command.starts_with("git clone --depth 1"));
        check!(!data.path().join("repo").exists());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn interrupted_clone_leaves_no_checkout() {
        if !git_available() {
            return;
        }
        let upstream = TempDir::new().unwrap();
        git(upstream.path(), &["init", "-q"]);
        for i in 0..200 {
            let path = upstream.path().join(format!("src/docs/page-{i:03}.mdx"));
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, format!("# Page {i}\n\n{}", "text ".repeat(2_000))).unwrap();
        }
        git(upstream.path(), &["add", "."]);
        git(upstream.path(), &["commit", "-q", "-m", "pages"]);

        let data = TempDir::new().unwrap();
        let checkout = data.path().join("repo");
        let url = format!("file://{}", upstream.path().display());
        let source = GitSource::new(url, None, &checkout, "src/docs");

        let interrupted =
            tokio::time::timeout(std::time::Duration::from_millis(5), source.fetch_latest()).await;
        if interrupted.is_err() {
            check!(!checkout.join(".git").exists());
        }

        let documents = source.fetch_latest().await.unwrap();
        check!(documents.len() == 200);
        check!(!data.path().join("repo.partial").exists());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn stale_staging_directory_is_replaced() {
        if !git_available() {
            return;
        }
        let upstream = TempDir::new().unwrap();
        git(upstream.path(), &["init", "-q"]);
        commit_file(upstream.path(), "src/docs/flex.mdx", "# Flex");

        let data = TempDir::new().unwrap();
        std::fs::create_dir_all(data.path().join("repo.partial/.git")).unwrap();
        let url = format!("file://{}", upstream.path().display());
        let source = GitSource::new(url, None, data.path().join("repo"), "src/docs");

        check!(source.fetch_latest().await.unwrap().len() == 1);
        check!(data.path().join("repo/.git").exists());
        check!(!data.path().join("repo.partial").exists());
    }
}
