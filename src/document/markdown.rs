//! Markdown body normalization: plain text, first heading and code blocks.

use super::CodeExample;
use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd};
use regex::Regex;
use std::sync::LazyLock;

static HTML_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("html tag pattern is valid"));

/// What the markdown pass extracts from a document body.
#[derive(Debug, Default)]
pub(crate) struct MarkdownParts {
    /// Plain text: prose, inline code and code block contents, one block per line.
    pub text: String,
    /// Text of the first heading, if any.
    pub first_heading: Option<String>,
    /// Code blocks in document order.
    pub code_blocks: Vec<CodeExample>,
}

/// In-progress code block.
struct OpenBlock {
    language: Option<String>,
    code: String,
}

/// Strip markup from `body`.
pub(crate) fn strip_markup(body: &str) -> MarkdownParts {
    let options = Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH;
    let mut parts = MarkdownParts::default();
    let mut text = String::with_capacity(body.len());

    let mut code_block: Option<OpenBlock> = None;
    let mut heading: Option<String> = None;

    for event in Parser::new_ext(body, options) {
        match event {
            Event::Start(Tag::CodeBlock(kind)) => {
                let language = match kind {
                    CodeBlockKind::Fenced(info) => info
                        .split_whitespace()
                        .next()
                        .map(str::to_string)
                        .filter(|lang| !lang.is_empty()),
                    CodeBlockKind::Indented => None,
                };
                code_block = Some(OpenBlock {
                    language,
                    code: String::new(),
                });
            }
            Event::End(TagEnd::CodeBlock) => {
                if let Some(block) = code_block.take() {
                    let code = block.code.trim_end_matches(['\n', '\r']).to_string();
                    if !code.trim().is_empty() {
                        text.push_str(&code);
                        text.push('\n');
                        parts.code_blocks.push(CodeExample {
                            language: block.language,
                            code,
                        });
                    }
                }
            }
            Event::Start(Tag::Heading { .. }) => {
                if parts.first_heading.is_none() {
                    heading = Some(String::new());
                }
            }
            Event::End(TagEnd::Heading(_)) => {
                if let Some(found) = heading.take() {
                    let found = found.trim().to_string();
                    if !found.is_empty() {
                        parts.first_heading = Some(found);
                    }
                }
                text.push('\n');
            }
            Event::Text(chunk) | Event::Code(chunk) => {
                if let Some(block) = code_block.as_mut() {
                    block.code.push_str(&chunk);
                } else {
                    if let Some(h) = heading.as_mut() {
                        h.push_str(&chunk);
                    }
                    text.push_str(&chunk);
                }
            }
            Event::Html(html) | Event::InlineHtml(html) => {
                let inner = strip_tags(&html);
                if !inner.trim().is_empty() {
                    text.push_str(&inner);
                    text.push(' ');
                }
            }
            Event::SoftBreak => text.push(' '),
            Event::HardBreak => text.push('\n'),
            Event::End(end) if ends_block(&end) => text.push('\n'),
            _ => {}
        }
    }

    parts.text = normalize_whitespace(&text);
    parts
}

fn ends_block(end: &TagEnd) -> bool {
    matches!(
        end,
        TagEnd::Paragraph
            | TagEnd::Item
            | TagEnd::TableHead
            | TagEnd::TableRow
            | TagEnd::TableCell
            | TagEnd::HtmlBlock
    )
}

/// Remove HTML/JSX tags, keeping the text between them.
pub(crate) fn strip_tags(html: &str) -> String {
    HTML_TAG.replace_all(html, " ").into_owned()
}

/// Collapse runs of spaces within lines and drop blank lines.
pub(crate) fn normalize_whitespace(text: &str) -> String {
    text.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::check;

    #[test]
    fn keeps_prose_and_inline_code() {
        let parts = strip_markup("# Flex\n\nUse `flex-1` to **grow** an item.\n\n- one\n- two\n");
        check!(parts.text == "Flex\nUse flex-1 to grow an item.\none\ntwo");
        check!(parts.first_heading.as_deref() == Some("Flex"));
    }

    #[test]
    fn extracts_code_blocks_in_order() {
        let body = "Intro\n\n```html\n<div class=\"flex\"></div>\n```\n\n```\nplain\n```\n\n    indented code\n";
        let parts = strip_markup(body);
        check!(parts.code_blocks.len() == 3);
        check!(parts.code_blocks[0].language.as_deref() == Some("html"));
        check!(parts.code_blocks[0].code == "<div class=\"flex\"></div>");
        check!(parts.code_blocks[1].language.is_none());
        check!(parts.code_blocks[1].code == "plain");
        check!(parts.code_blocks[2].language.is_none());
        check!(parts.code_blocks[2].code == "indented code");
        check!(parts.text.contains("<div class=\"flex\"></div>"));
    }

    #[test]
    fn fence_info_keeps_only_language() {
        let parts = strip_markup("```jsx {{ example: true }}\nconst a = 1;\n```\n");
        check!(parts.code_blocks[0].language.as_deref() == Some("jsx"));
    }

    #[test]
    fn blank_code_blocks_are_skipped() {
        let parts = strip_markup("```css\n\n```\n");
        check!(parts.code_blocks.is_empty());
    }

    #[test]
    fn html_keeps_inner_text() {
        let parts = strip_markup("<Figure>\n<p class=\"text-sm\">Hello there</p>\n</Figure>\n");
        check!(parts.text.contains("Hello there"));
        check!(!parts.text.contains("<p"));
    }

    #[test]
    fn first_heading_ignores_later_headings() {
        let parts = strip_markup("Intro\n\n## Basic usage\n\n## Another\n");
        check!(parts.first_heading.as_deref() == Some("Basic usage"));
    }

    #[test]
    fn normalizes_whitespace() {
        check!(normalize_whitespace("  a   b \n\n\n c  ") == "a b\nc");
    }
}
