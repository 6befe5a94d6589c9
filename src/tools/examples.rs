//! Code example search.

use crate::search::ExampleHit;
use crate::service::DocsService;
use rmcp::schemars;
use serde::Deserialize;
use std::fmt::Write as _;

/// Code examples shown per document before truncating.
const EXAMPLES_PER_DOCUMENT: usize = 3;

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct GetExamplesRequest {
    /// What kind of code example to find, e.g. "grid layout" or "responsive navbar"
    pub query: String,
    /// Maximum number of documents to return (1-10, default: 5)
    #[serde(default)]
    pub limit: Option<usize>,
}

pub async fn handle_get_examples(
    service: &DocsService,
    request: GetExamplesRequest,
) -> Result<String, String> {
    let hits = service
        .search_examples(&request.query, request.limit)
        .await
        .map_err(|e| e.to_string())?;

    if hits.is_empty() {
        return Ok(format!(
            "No code examples found for '{}'.\n\n\
             Try different keywords, or use search_docs for general documentation.\n",
            request.query.trim()
        ));
    }

    Ok(format_hits(&request.query, &hits))
}

fn format_hits(query: &str, hits: &[ExampleHit]) -> String {
    let mut output = format!("Code examples for '{}':\n\n", query.trim());

    for (idx, hit) in hits.iter().enumerate() {
        let _ = writeln!(output, "{}. {} [{}]", idx + 1, hit.title, hit.section);
        let _ = writeln!(output, "   {}", hit.url);

        for example in hit.code_examples.iter().take(EXAMPLES_PER_DOCUMENT) {
            let _ = write!(
                output,
                "\n```{}\n{}\n```\n",
                example.language.as_deref().unwrap_or(""),
                example.code.trim_end()
            );
        }
        let remaining = hit.code_examples.len().saturating_sub(EXAMPLES_PER_DOCUMENT);
        if remaining > 0 {
            let _ = writeln!(
                output,
                "\n({} more; use get_full_doc with `{}` to see them all)",
                remaining, hit.filepath
            );
        }
        output.push('\n');
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::CodeExample;
    use assert2::check;

    #[test]
    fn long_example_lists_are_truncated() {
        let hit = ExampleHit {
            filepath: "layout/grid.mdx".to_string(),
            title: "grid".to_string(),
            section: "Layout".to_string(),
            url: "https://tailwindcss.com/docs/layout/grid".to_string(),
            score: 1.0,
            code_examples: (0..5)
                .map(|i| CodeExample {
                    language: None,
                    code: format!("<div class=\"grid-cols-{}\"></div>", i),
                })
                .collect(),
        };
        let output = format_hits("grid", &[hit]);
        check!(output.matches("```\n").count() == EXAMPLES_PER_DOCUMENT);
        check!(output.contains("(2 more; use get_full_doc with `layout/grid.mdx` to see them all)"));
    }
}
