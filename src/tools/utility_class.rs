//! Exact utility-class lookup.

use crate::search::ClassMatch;
use crate::service::DocsService;
use rmcp::schemars;
use serde::Deserialize;
use std::fmt::Write as _;

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct GetUtilityClassRequest {
    /// Utility class name to look up, e.g. "flex-1", "text-center" or "md:grid-cols-3"
    pub class_name: String,
}

pub async fn handle_get_utility_class(
    service: &DocsService,
    request: GetUtilityClassRequest,
) -> Result<String, String> {
    let matches = service
        .lookup_utility_class(&request.class_name)
        .await
        .map_err(|e| e.to_string())?;

    if matches.is_empty() {
        let class = request.class_name.trim();
        let mut msg = format!("No documentation found for utility class '{}'.\n\n", class);
        msg.push_str("Suggestions:\n");
        msg.push_str("• Verify the spelling; utility classes are lowercase with hyphens\n");
        if let Some((_, base)) = class.rsplit_once(':') {
            let _ = writeln!(msg, "• Drop the variant prefix and look up '{}'", base);
        }
        msg.push_str("• Use search_docs to find related concepts\n");
        return Ok(msg);
    }

    Ok(format_matches(&request.class_name, &matches))
}

fn format_matches(class: &str, matches: &[ClassMatch]) -> String {
    let mut output = format!(
        "Documentation for '{}' ({} document{}):\n\n",
        class.trim(),
        matches.len(),
        if matches.len() == 1 { "" } else { "s" }
    );

    for found in matches {
        let _ = writeln!(output, "## {} [{}]", found.title, found.section);
        let _ = writeln!(output, "{}", found.url);
        if let Some(description) = &found.description {
            let _ = writeln!(output, "{}", description);
        }
        if found.matched_class != class.trim() {
            let _ = writeln!(output, "Matched as: `{}`", found.matched_class);
        }
        if !found.related_classes.is_empty() {
            let related = found
                .related_classes
                .iter()
                .map(|c| format!("`{}`", c))
                .collect::<Vec<_>>()
                .join(", ");
            let _ = writeln!(output, "Related classes: {}", related);
        }
        output.push('\n');
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::check;

    #[test]
    fn case_folded_match_is_called_out() {
        let found = ClassMatch {
            filepath: "typography/text-align.mdx".to_string(),
            title: "text-align".to_string(),
            section: "Typography".to_string(),
            description: Some("Utilities for controlling text alignment.".to_string()),
            url: "https://tailwindcss.com/docs/typography/text-align".to_string(),
            matched_class: "text-Center".to_string(),
            related_classes: vec!["text-left".to_string(), "text-right".to_string()],
        };
        let output = format_matches("text-center", &[found]);
        check!(output.starts_with("Documentation for 'text-center' (1 document):"));
        check!(output.contains("Matched as: `text-Center`"));
        check!(output.contains("Related classes: `text-left`, `text-right`"));
    }
}
