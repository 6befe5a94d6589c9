//! Index refresh and status reporting.

use crate::builder::BuildReport;
use crate::error::RefreshError;
use crate::service::{DocsService, IndexStatus};
use std::fmt::Write as _;
use tokio_util::sync::CancellationToken;

/// Parse failures listed in a refresh report before truncating.
const FAILURES_SHOWN: usize = 10;

pub async fn handle_refresh_docs(
    service: &DocsService,
    cancel: &CancellationToken,
) -> Result<String, String> {
    match service.refresh(cancel).await {
        Ok(report) => Ok(format_report(&report)),
        Err(RefreshError::InProgress) => Ok(
            "A refresh is already in progress. The current index keeps serving; try again shortly."
                .to_string(),
        ),
        Err(e) => Err(format!("Refresh failed, the previous index is still serving: {}", e)),
    }
}

pub async fn handle_index_status(service: &DocsService) -> Result<String, String> {
    Ok(format_status(&service.status().await))
}

fn format_report(report: &BuildReport) -> String {
    let mut output = format!(
        "Documentation refreshed: generation {} with {} documents ({} ms).\n",
        report.generation,
        report.document_count,
        report.elapsed.as_millis()
    );
    let _ = writeln!(output, "Corpus digest: {:016x}", report.corpus_digest);

    if !report.failed.is_empty() {
        let _ = write!(output, "\n{} document(s) could not be parsed:\n", report.failed.len());
        for failure in report.failed.iter().take(FAILURES_SHOWN) {
            let _ = writeln!(output, "• {}: {}", failure.path, failure.reason);
        }
        if report.failed.len() > FAILURES_SHOWN {
            let _ = writeln!(output, "• ... and {} more", report.failed.len() - FAILURES_SHOWN);
        }
    }

    output
}

fn format_status(status: &IndexStatus) -> String {
    let mut output = String::from("Index status:\n");
    let _ = writeln!(output, "• Generation: {}", status.generation);
    let _ = writeln!(output, "• Documents: {}", status.document_count);
    let _ = writeln!(output, "• Sections: {}", status.section_count);
    let _ = writeln!(output, "• Indexed terms: {}", status.term_count);
    match status.last_rebuild {
        Some(at) => {
            let _ = writeln!(output, "• Last rebuild: {}", at.to_rfc3339());
        }
        None => output.push_str("• Last rebuild: never\n"),
    }
    let _ = writeln!(output, "• Corpus digest: {:016x}", status.corpus_digest);
    let _ = writeln!(output, "• Source: {}", status.source);
    if status.rebuilding {
        output.push_str("• A rebuild is currently running\n");
    }
    output
}
