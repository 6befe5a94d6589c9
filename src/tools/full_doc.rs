//! Whole-document retrieval by filepath or slug.

use crate::search::FullDocument;
use crate::service::DocsService;
use rmcp::schemars;
use serde::Deserialize;
use std::fmt::Write as _;

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct GetFullDocRequest {
    /// Document filepath, slug or final slug segment, e.g. "layout/flex.mdx", "layout/flex" or "flex"
    pub slug: String,
}

pub async fn handle_get_full_doc(
    service: &DocsService,
    request: GetFullDocRequest,
) -> Result<String, String> {
    let document = service
        .fetch_document(&request.slug)
        .await
        .map_err(|e| e.to_string())?;

    match document {
        Some(document) => Ok(format_document(&document)),
        None => {
            let slug = request.slug.trim();
            let mut msg = format!("No documentation found for '{}'.\n\n", slug);
            let suggestions = service.suggest_documents(slug).await;
            if suggestions.is_empty() {
                msg.push_str("Try search_docs to find similar documents.\n");
            } else {
                msg.push_str("Did you mean one of these?\n");
                for suggestion in suggestions {
                    let _ = writeln!(msg, "• `{}`", suggestion);
                }
            }
            Ok(msg)
        }
    }
}

fn format_document(document: &FullDocument) -> String {
    let mut output = format!("# {}\n\n", document.title);
    let _ = writeln!(output, "Section: {}", document.section);
    let _ = writeln!(output, "Source: `{}`", document.filepath);
    let _ = writeln!(output, "URL: {}", document.url);
    if let Some(updated) = document.last_updated {
        let _ = writeln!(output, "Indexed: {}", updated.format("%Y-%m-%d %H:%M UTC"));
    }
    if let Some(description) = &document.description {
        let _ = write!(output, "\n{}\n", description);
    }

    let _ = write!(output, "\n{}\n", document.content);

    if !document.utility_classes.is_empty() {
        let _ = write!(
            output,
            "\n## Utility classes ({})\n\n{}\n",
            document.utility_classes.len(),
            document.utility_classes.join(" ")
        );
    }

    if !document.code_examples.is_empty() {
        let _ = write!(output, "\n## Code examples ({})\n", document.code_examples.len());
        for example in &document.code_examples {
            let _ = write!(
                output,
                "\n```{}\n{}\n```\n",
                example.language.as_deref().unwrap_or(""),
                example.code.trim_end()
            );
        }
    }

    output
}
