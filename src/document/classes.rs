//! Utility-class token extraction.
//!
//! Class tokens are found in two passes: an attribute pattern captures class
//! lists (`class="..."`, `className={"..."}`), then every whitespace-separated
//! entry is kept only if it matches the token pattern. Both patterns are
//! configurable since what counts as "class-like" differs between corpora.

use regex::Regex;
use std::collections::BTreeSet;

/// Default attribute pattern. Group 1 holds the raw class list.
pub const DEFAULT_ATTRIBUTE_PATTERN: &str =
    r#"class(?:Name)?\s*=\s*(?:\{\s*)?["'`]([^"'`]+)["'`]"#;

/// Default token pattern: lowercase utility names with variant (`:`), fraction (`/`),
/// arbitrary-value (`[...]`) and important (`!`) syntax.
pub const DEFAULT_TOKEN_PATTERN: &str = r"^!?-?[a-z0-9@\[][a-zA-Z0-9\-:/\[\]._%#@!(),&>=*+]*$";

/// Extracts utility-class tokens from document text.
#[derive(Debug, Clone)]
pub struct ClassExtractor {
    attribute: Regex,
    token: Regex,
}

impl ClassExtractor {
    /// Compile an extractor. The attribute pattern must have at least one capture group.
    pub fn new(attribute_pattern: &str, token_pattern: &str) -> Result<Self, regex::Error> {
        let attribute = Regex::new(attribute_pattern)?;
        if attribute.captures_len() < 2 {
            return Err(regex::Error::Syntax(format!(
                "class attribute pattern '{}' needs a capture group for the class list",
                attribute_pattern
            )));
        }
        Ok(Self {
            attribute,
            token: Regex::new(token_pattern)?,
        })
    }

    pub fn attribute_pattern(&self) -> &str {
        self.attribute.as_str()
    }

    pub fn token_pattern(&self) -> &str {
        self.token.as_str()
    }

    /// Extract the distinct class tokens found in `text`, in sorted order.
    pub fn extract(&self, text: &str) -> BTreeSet<String> {
        let mut classes = BTreeSet::new();

        for captures in self.attribute.captures_iter(text) {
            let Some(list) = captures.get(1) else {
                continue;
            };
            for token in list.as_str().split_whitespace() {
                // Template placeholders and spreads are not classes
                if token.starts_with('{') || token.starts_with("...") || token.starts_with('$') {
                    continue;
                }
                if self.token.is_match(token) {
                    classes.insert(token.to_string());
                }
            }
        }

        classes
    }
}

impl Default for ClassExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_ATTRIBUTE_PATTERN, DEFAULT_TOKEN_PATTERN)
            .expect("default class patterns are valid")
    }
}
