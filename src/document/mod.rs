//! Document parsing: raw Markdown/MDX text into normalized, indexable records.
//!
//! Parsing is a pure function of the raw bytes and the [`ParserConfig`], so
//! re-parsing an unchanged corpus yields identical records. Timestamps are
//! attached later by the index builder.

pub mod classes;
pub mod frontmatter;
pub(crate) mod markdown;

use crate::error::{ParseFailure, ParseFailureReason};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub use classes::ClassExtractor;
pub use frontmatter::{FrontMatter, Metadata};

/// Section assigned when no rule yields a usable name.
pub const UNCATEGORIZED_SECTION: &str = "Uncategorized";

/// Section assigned to documents at the corpus root by default.
pub const DEFAULT_ROOT_SECTION: &str = "Core";

/// One source file as delivered by a [`DocumentSource`](crate::source::DocumentSource).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDocument {
    /// Path relative to the corpus root, `/`-separated.
    pub path: String,
    pub content: String,
}

impl RawDocument {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }
}

/// A fenced or indented code block.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CodeExample {
    pub language: Option<String>,
    pub code: String,
}

/// The parser's output and the unit of indexing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    pub filepath: String,
    pub title: String,
    pub section: String,
    pub description: Option<String>,
    pub content: String,
    pub utility_classes: BTreeSet<String>,
    pub code_examples: Vec<CodeExample>,
    /// Build time of the index generation holding this record; `None` until indexed.
    pub last_updated: Option<DateTime<Utc>>,
}

impl NormalizedRecord {
    /// Path-derived identifier: the filepath without its extension.
    pub fn slug(&self) -> &str {
        slug_of(&self.filepath)
    }
}

/// Strip the extension from the final path segment.
pub fn slug_of(filepath: &str) -> &str {
    let file_start = filepath.rfind('/').map_or(0, |i| i + 1);
    match filepath[file_start..].rfind('.') {
        Some(dot) if dot > 0 => &filepath[..file_start + dot],
        _ => filepath,
    }
}

/// Parser settings.
#[derive(Debug, Clone)]
pub struct ParserConfig {
    pub classes: ClassExtractor,
    /// Section for documents directly under the corpus root.
    pub root_section: String,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            classes: ClassExtractor::default(),
            root_section: DEFAULT_ROOT_SECTION.to_string(),
        }
    }
}

/// Normalize one raw document.
pub fn parse(raw: &RawDocument, config: &ParserConfig) -> Result<NormalizedRecord, ParseFailure> {
    let fail = |reason| ParseFailure {
        path: raw.path.clone(),
        reason,
    };

    if raw.content.trim().is_empty() {
        return Err(fail(ParseFailureReason::Empty));
    }

    let (front, body) = frontmatter::split_front_matter(&raw.content).map_err(fail)?;
    let (exports, body) = frontmatter::strip_module_statements(body);
    let metadata = Metadata::merge(front, exports);

    let parts = markdown::strip_markup(&body);

    let title = metadata
        .title
        .clone()
        .or(parts.first_heading)
        .unwrap_or_else(|| title_from_path(&raw.path));

    let content = if !parts.text.is_empty() {
        parts.text
    } else if !body.trim().is_empty() {
        // Markup-only bodies still carry searchable text
        let stripped = markdown::normalize_whitespace(&markdown::strip_tags(&body));
        if stripped.is_empty() {
            markdown::normalize_whitespace(&body)
        } else {
            stripped
        }
    } else {
        // Metadata-only document
        metadata.description.clone().unwrap_or_else(|| title.clone())
    };

    Ok(NormalizedRecord {
        filepath: raw.path.clone(),
        section: infer_section(&raw.path, metadata.section.as_deref(), &config.root_section),
        title,
        description: metadata.description,
        utility_classes: config.classes.extract(&body),
        code_examples: parts.code_blocks,
        content,
        last_updated: None,
    })
}

/// Section rules, in order: explicit metadata, top-level directory, root section,
/// then [`UNCATEGORIZED_SECTION`].
fn infer_section(path: &str, explicit: Option<&str>, root_section: &str) -> String {
    let candidate = match explicit {
        Some(section) => section.trim().to_string(),
        None => match path.split_once('/') {
            Some((directory, _)) => title_case(directory),
            None => root_section.trim().to_string(),
        },
    };

    if candidate.is_empty() {
        UNCATEGORIZED_SECTION.to_string()
    } else {
        candidate
    }
}

fn title_from_path(path: &str) -> String {
    let slug = slug_of(path);
    let stem = slug.rsplit('/').next().unwrap_or(slug);
    let title = title_case(stem);
    if title.is_empty() { path.to_string() } else { title }
}

/// `font-size` → `Font Size`.
fn title_case(name: &str) -> String {
    name.split(['-', '_', ' '])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::check;
    use rstest::rstest;

    const FLEX_DOC: &str = r#"---
title: flex
description: Utilities for controlling how flex items both grow and shrink.
---

## Basic usage

Use `flex-1` to allow a flex item to grow and shrink as needed:

```html
<div class="flex">
  <div class="flex-none w-14">01</div>
  <div class="flex-1 w-64">02</div>
</div>
```

### Hover

```html
<div class="hover:flex-1">03</div>
```
"#;

    fn parse_default(path: &str, content: &str) -> Result<NormalizedRecord, ParseFailure> {
        parse(&RawDocument::new(path, content), &ParserConfig::default())
    }

    #[test]
    fn parses_complete_document() {
        let record = parse_default("flex.mdx", FLEX_DOC).unwrap();
        check!(record.filepath == "flex.mdx");
        check!(record.title == "flex");
        check!(record.section == "Core");
        check!(
            record.description.as_deref()
                == Some("Utilities for controlling how flex items both grow and shrink.")
        );
        check!(record.content.contains("Use flex-1 to allow a flex item"));
        check!(record.code_examples.len() == 2);
        check!(record.code_examples[1].code == "<div class=\"hover:flex-1\">03</div>");

        let classes: Vec<_> = record.utility_classes.iter().map(String::as_str).collect();
        check!(classes == vec!["flex", "flex-1", "flex-none", "hover:flex-1", "w-14", "w-64"]);
        check!(record.last_updated.is_none());
    }

    #[test]
    fn parsing_is_deterministic() {
        let first = parse_default("layout/flex.mdx", FLEX_DOC).unwrap();
        let second = parse_default("layout/flex.mdx", FLEX_DOC).unwrap();
        check!(first == second);
    }

    #[rstest]
    #[case("typography/font-size.mdx", None, "Typography")]
    #[case("hover-focus-and-other-states/index.mdx", None, "Hover Focus And Other States")]
    #[case("typography/font-size.mdx", Some("Type"), "Type")]
    #[case("flex.mdx", None, "Core")]
    #[case("flex.mdx", Some("   "), "Uncategorized")]
    fn section_rules(#[case] path: &str, #[case] explicit: Option<&str>, #[case] expected: &str) {
        check!(infer_section(path, explicit, DEFAULT_ROOT_SECTION) == expected);
    }

    #[test]
    fn empty_root_section_falls_back_to_uncategorized() {
        check!(infer_section("flex.mdx", None, "") == UNCATEGORIZED_SECTION);
    }

    #[test]
    fn title_falls_back_to_heading_then_path() {
        let from_heading = parse_default("grid.mdx", "# Grid Template\n\nText.").unwrap();
        check!(from_heading.title == "Grid Template");

        let from_path = parse_default("layout/box-sizing.md", "Only prose here.").unwrap();
        check!(from_path.title == "Box Sizing");
        check!(from_path.section == "Layout");
    }

    #[test]
    fn category_is_used_as_section() {
        let record = parse_default("x/y.mdx", "---\ncategory: Effects\n---\nBody").unwrap();
        check!(record.section == "Effects");
    }

    #[test]
    fn markup_only_body_keeps_text() {
        let record = parse_default("a.mdx", "<div class=\"p-4\">Card body</div>").unwrap();
        check!(record.content.contains("Card body"));
        check!(record.utility_classes.contains("p-4"));
    }

    #[test]
    fn metadata_only_document_uses_description() {
        let record = parse_default("a.mdx", "---\ntitle: A\ndescription: Short.\n---\n").unwrap();
        check!(record.content == "Short.");
    }

    #[test]
    fn mdx_exports_provide_metadata() {
        let text = "export const title = \"text-align\";\nexport const description = \"Align text.\";\n\nBody.";
        let record = parse_default("typography/text-align.mdx", text).unwrap();
        check!(record.title == "text-align");
        check!(record.description.as_deref() == Some("Align text."));
        check!(record.content == "Body.");
    }

    #[rstest]
    #[case("", ParseFailureReason::Empty)]
    #[case("  \n\t", ParseFailureReason::Empty)]
    #[case("---\ntitle: x\n", ParseFailureReason::UnterminatedFrontMatter)]
    fn failures_carry_path_and_reason(#[case] content: &str, #[case] reason: ParseFailureReason) {
        let failure = parse_default("bad.mdx", content).unwrap_err();
        check!(failure.path == "bad.mdx");
        check!(failure.reason == reason);
    }

    #[rstest]
    #[case("flex.mdx", "flex")]
    #[case("typography/font-size.mdx", "typography/font-size")]
    #[case("v3.4/intro.md", "v3.4/intro")]
    #[case("README", "README")]
    #[case(".hidden", ".hidden")]
    fn slugs_drop_extension(#[case] path: &str, #[case] expected: &str) {
        check!(slug_of(path) == expected);
    }
}
