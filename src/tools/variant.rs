//! Variant and modifier search.

use crate::search::VariantHit;
use crate::service::DocsService;
use rmcp::schemars;
use serde::Deserialize;
use std::fmt::Write as _;

/// Variant classes shown per document.
const CLASSES_PER_DOCUMENT: usize = 8;

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SearchByVariantRequest {
    /// Variant name, lowercase, e.g. "hover", "dark", "md" or "group". A trailing ':' is accepted.
    pub variant: String,
    /// Maximum number of results to return (1-20, default: 10)
    #[serde(default)]
    pub limit: Option<usize>,
}

pub async fn handle_search_by_variant(
    service: &DocsService,
    request: SearchByVariantRequest,
) -> Result<String, String> {
    let hits = service
        .search_variant(&request.variant, request.limit)
        .await
        .map_err(|e| e.to_string())?;

    if hits.is_empty() {
        let mut msg = format!(
            "No documentation found for variant '{}'.\n\n",
            request.variant.trim()
        );
        msg.push_str("Try common variants like 'hover', 'focus', 'dark', 'sm', 'md', 'lg', 'group' or 'peer'.\n");
        return Ok(msg);
    }

    Ok(format_hits(&request.variant, &hits))
}

fn format_hits(variant: &str, hits: &[VariantHit]) -> String {
    let variant = variant.trim().trim_end_matches(':');
    let mut output = format!("Documentation for the '{}:' variant:\n\n", variant);

    for (idx, hit) in hits.iter().enumerate() {
        let _ = writeln!(
            output,
            "{}. {} [{}] (score {:.3})",
            idx + 1,
            hit.title,
            hit.section,
            hit.score
        );
        let _ = writeln!(output, "   {}", hit.url);
        if !hit.variant_classes.is_empty() {
            let shown = hit
                .variant_classes
                .iter()
                .take(CLASSES_PER_DOCUMENT)
                .map(|c| format!("`{}`", c))
                .collect::<Vec<_>>()
                .join(", ");
            let _ = writeln!(output, "   Usage: {}", shown);
        }
        if !hit.snippet.is_empty() {
            let _ = writeln!(output, "   > {}", hit.snippet);
        }
        output.push('\n');
    }

    output
}
