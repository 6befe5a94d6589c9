//! Front matter and MDX metadata export extraction.

use crate::error::ParseFailureReason;
use regex::Regex;
use serde::{Deserialize, Deserializer};
use std::sync::LazyLock;

/// YAML front matter fields the parser understands. Unknown keys are ignored.
///
/// Every field is optional; absence rules are applied by [`Metadata::merge`]
/// and the parser's fallbacks, never here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FrontMatter {
    #[serde(deserialize_with = "scalar_string")]
    pub title: Option<String>,
    #[serde(deserialize_with = "scalar_string")]
    pub description: Option<String>,
    #[serde(deserialize_with = "scalar_string")]
    pub section: Option<String>,
    #[serde(deserialize_with = "scalar_string")]
    pub category: Option<String>,
}

/// Accepts strings, numbers and booleans; rejects sequences and mappings.
fn scalar_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde_yaml::Value;

    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(Value::Bool(b)) => Ok(Some(b.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected a scalar value, found {:?}",
            other
        ))),
    }
}

/// Metadata declared through `export const <name> = "..."` lines in MDX bodies.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportedMetadata {
    pub title: Option<String>,
    pub description: Option<String>,
    pub section: Option<String>,
    pub category: Option<String>,
}

/// Document metadata after both sources are merged. Blank values count as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    pub title: Option<String>,
    pub description: Option<String>,
    /// Explicit section, from `section` or `category` in either source.
    pub section: Option<String>,
}

impl Metadata {
    /// Front matter wins over MDX exports; `section` wins over `category`.
    pub fn merge(front: FrontMatter, exports: ExportedMetadata) -> Self {
        Self {
            title: non_blank(front.title).or_else(|| non_blank(exports.title)),
            description: non_blank(front.description).or_else(|| non_blank(exports.description)),
            section: non_blank(front.section)
                .or_else(|| non_blank(front.category))
                .or_else(|| non_blank(exports.section))
                .or_else(|| non_blank(exports.category)),
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Splits a leading `---` YAML block off `text`.
///
/// Returns default front matter and the whole text when no block is present.
/// A leading byte-order mark and blank lines before the opening fence are tolerated.
pub(crate) fn split_front_matter(text: &str) -> Result<(FrontMatter, &str), ParseFailureReason> {
    let text = text.trim_start_matches('\u{feff}');

    let mut offset = 0;
    let mut lines = text.split_inclusive('\n');

    // Skip blank lines, then require the opening fence.
    let opening = loop {
        match lines.next() {
            Some(line) if line.trim().is_empty() => offset += line.len(),
            Some(line) => break line,
            None => return Ok((FrontMatter::default(), text)),
        }
    };
    if opening.trim_end() != "---" {
        return Ok((FrontMatter::default(), text));
    }
    offset += opening.len();

    let yaml_start = offset;
    for line in lines {
        let marker = line.trim_end();
        if marker == "---" || marker == "..." {
            let yaml = &text[yaml_start..offset];
            let body = &text[offset + line.len()..];
            return Ok((parse_yaml(yaml)?, body));
        }
        offset += line.len();
    }

    Err(ParseFailureReason::UnterminatedFrontMatter)
}

fn parse_yaml(yaml: &str) -> Result<FrontMatter, ParseFailureReason> {
    if yaml.trim().is_empty() {
        return Ok(FrontMatter::default());
    }
    serde_yaml::from_str(yaml).map_err(|e| ParseFailureReason::InvalidFrontMatter(e.to_string()))
}

static EXPORT_CONST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"^export\s+const\s+(title|description|section|category)\s*=\s*(?:"((?:[^"\\]|\\.)*)"|'((?:[^'\\]|\\.)*)'|`([^`]*)`)\s*;?\s*$"#,
    )
    .expect("metadata export pattern is valid")
});

/// Removes MDX `import`/`export` statements outside code fences.
///
/// Returns the recognized metadata exports and the remaining body. Multi-line
/// statements are skipped until their brackets balance.
pub(crate) fn strip_module_statements(body: &str) -> (ExportedMetadata, String) {
    let mut exports = ExportedMetadata::default();
    let mut kept = String::with_capacity(body.len());
    let mut in_fence = false;
    let mut open_brackets: i32 = 0;

    for line in body.split_inclusive('\n') {
        let trimmed = line.trim();

        if open_brackets > 0 {
            open_brackets += bracket_balance(trimmed);
            continue;
        }

        if trimmed.starts_with("```") || trimmed.starts_with("~~~") {
            in_fence = !in_fence;
        } else if !in_fence && (trimmed.starts_with("import ") || trimmed.starts_with("export ")) {
            if let Some(captures) = EXPORT_CONST.captures(trimmed) {
                let value = captures
                    .get(2)
                    .or_else(|| captures.get(3))
                    .or_else(|| captures.get(4))
                    .map(|m| unescape(m.as_str()));
                match &captures[1] {
                    "title" => exports.title = value,
                    "description" => exports.description = value,
                    "section" => exports.section = value,
                    _ => exports.category = value,
                }
            }
            open_brackets = bracket_balance(trimmed).max(0);
            continue;
        }

        kept.push_str(line);
    }

    (exports, kept)
}

fn bracket_balance(line: &str) -> i32 {
    line.chars().fold(0, |depth, c| match c {
        '(' | '{' | '[' => depth + 1,
        ')' | '}' | ']' => depth - 1,
        _ => depth,
    })
}

fn unescape(value: &str) -> String {
    value
        .replace("\\\"", "\"")
        .replace("\\'", "'")
        .replace("\\\\", "\\")
}
