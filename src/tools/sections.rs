//! Section listing and browsing.

use crate::search::SectionEntry;
use crate::service::DocsService;
use rmcp::schemars;
use serde::Deserialize;
use std::fmt::Write as _;

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct GetSectionDocsRequest {
    /// Exact section name, e.g. "Layout" or "Typography". Use list_sections to see them all.
    pub section: String,
}

pub async fn handle_list_sections(service: &DocsService) -> Result<String, String> {
    let sections = service.list_sections().await;
    if sections.is_empty() {
        return Ok(
            "No sections found. The index is empty; run refresh_docs to build it.".to_string(),
        );
    }

    let mut output = format!("{} documentation sections:\n\n", sections.len());
    for section in &sections {
        let _ = writeln!(output, "• {}", section);
    }
    output.push_str("\nUse get_section_docs to list the documents in a section.\n");
    Ok(output)
}

pub async fn handle_get_section_docs(
    service: &DocsService,
    request: GetSectionDocsRequest,
) -> Result<String, String> {
    let entries = service
        .browse_section(&request.section)
        .await
        .map_err(|e| e.to_string())?;

    if entries.is_empty() {
        let section = request.section.trim();
        let mut msg = format!("No documents found in section '{}'.\n\n", section);
        let suggestions = service.suggest_sections(section).await;
        if suggestions.is_empty() {
            msg.push_str("Section names are case-sensitive. Use list_sections to see them all.\n");
        } else {
            msg.push_str("Did you mean one of these?\n");
            for suggestion in suggestions {
                let _ = writeln!(msg, "• {}", suggestion);
            }
        }
        return Ok(msg);
    }

    Ok(format_entries(&request.section, &entries))
}

fn format_entries(section: &str, entries: &[SectionEntry]) -> String {
    let mut output = format!("Documents in '{}':\n\n", section.trim());
    for entry in entries {
        let _ = write!(output, "• {} (`{}`)", entry.title, entry.filepath);
        match &entry.description {
            Some(description) => {
                let _ = writeln!(output, " - {}", description);
            }
            None => output.push('\n'),
        }
        let _ = writeln!(output, "  {}", entry.url);
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::check;

    #[test]
    fn entries_list_title_path_and_description() {
        let entries = vec![
            SectionEntry {
                filepath: "layout/display.mdx".to_string(),
                title: "display".to_string(),
                description: Some("Utilities for the display box type.".to_string()),
                url: "https://tailwindcss.com/docs/layout/display".to_string(),
            },
            SectionEntry {
                filepath: "layout/flex.mdx".to_string(),
                title: "flex".to_string(),
                description: None,
                url: "https://tailwindcss.com/docs/layout/flex".to_string(),
            },
        ];
        let output = format_entries("Layout", &entries);
        check!(output.contains("• display (`layout/display.mdx`) - Utilities for the display box type.\n"));
        check!(output.contains("• flex (`layout/flex.mdx`)\n"));
    }
}
