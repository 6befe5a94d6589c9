//! Full-text documentation search.

use crate::search::SearchHit;
use crate::service::DocsService;
use rmcp::schemars;
use serde::Deserialize;
use std::fmt::Write as _;

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SearchDocsRequest {
    /// Search terms: utility classes, CSS concepts or features (1-200 characters)
    pub query: String,
    /// Maximum number of results to return (1-50, default: 10)
    #[serde(default)]
    pub limit: Option<usize>,
}

/// Rank documents against the query and format the hits.
pub async fn handle_search_docs(
    service: &DocsService,
    request: SearchDocsRequest,
) -> Result<String, String> {
    let hits = service
        .search(&request.query, request.limit)
        .await
        .map_err(|e| e.to_string())?;

    if hits.is_empty() {
        let mut msg = format!("No results found for '{}'.\n\n", request.query.trim());
        msg.push_str("Search tips:\n");
        msg.push_str("• Try a shorter or more general term\n");
        msg.push_str("• Search uses stemming: 'spacing' matches 'space'\n");
        msg.push_str("• For a specific utility class, use get_utility_class instead\n");
        msg.push_str("• For hover, dark or breakpoint variants, use search_by_variant\n");
        return Ok(msg);
    }

    Ok(format_hits(&request.query, &hits))
}

fn format_hits(query: &str, hits: &[SearchHit]) -> String {
    let mut output = format!("Search results for '{}':\n\n", query.trim());
    let max_score = hits.first().map_or(1.0, |hit| hit.score).max(f32::EPSILON);

    for (idx, hit) in hits.iter().enumerate() {
        let relevance = ((hit.score / max_score) * 100.0).round() as u8;
        let _ = writeln!(
            output,
            "{}. {} [{}] - relevance: {}% (score {:.3})",
            idx + 1,
            hit.title,
            hit.section,
            relevance,
            hit.score
        );
        let _ = writeln!(output, "   {}", hit.url);
        if let Some(description) = &hit.description {
            let _ = writeln!(output, "   {}", description);
        }
        if !hit.snippet.is_empty() {
            let _ = writeln!(output, "   > {}", hit.snippet);
        }
        output.push('\n');
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::check;

    fn hit(title: &str, score: f32) -> SearchHit {
        SearchHit {
            filepath: format!("layout/{}.mdx", title),
            title: title.to_string(),
            section: "Layout".to_string(),
            description: None,
            snippet: "Utilities for <mark>flex</mark> items.".to_string(),
            url: format!("https://tailwindcss.com/docs/layout/{}", title),
            score,
        }
    }

    #[test]
    fn relevance_is_relative_to_best_hit() {
        let output = format_hits("flex", &[hit("flex", 4.0), hit("grid", 1.0)]);
        check!(output.contains("1. flex [Layout] - relevance: 100%"));
        check!(output.contains("2. grid [Layout] - relevance: 25%"));
        check!(output.contains("> Utilities for <mark>flex</mark> items."));
    }
}
