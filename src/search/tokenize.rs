//! Text tokenization and stemming shared by indexing, querying and snippets.

use rust_stemmers::{Algorithm, Stemmer};

/// Minimum token length for indexing. Set to 1 so short utility parts like `x`, `p` or `4` survive.
const MIN_TOKEN_LENGTH: usize = 1;

/// Characters that join parts of a compound word such as `hover:text-center` or `w-1/2`.
pub(crate) const COMPOUND_JOINERS: &[char] = &['-', '_', ':', '/', '.'];

/// Common English stop words to filter out from indexing.
/// These high-frequency words add little value to search relevance.
pub(crate) const STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "for", "from", "has", "he", "in", "is", "it",
    "its", "of", "on", "that", "the", "to", "was", "will", "with",
];

/// Tokenizer with a reusable English stemmer.
pub(crate) struct Tokenizer {
    stemmer: Stemmer,
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self {
            stemmer: Stemmer::create(Algorithm::English),
        }
    }
}

impl Tokenizer {
    /// Tokenizes text into searchable terms.
    ///
    /// Words are split on whitespace and punctuation other than the compound joiners.
    /// - **Compounds**: "hover:text-center" → ["hover:text-center", "hover", "text", "center"]
    /// - **CamelCase**: "className" → ["class", "name", <stem of "classname">]
    ///
    /// Compounds are kept whole (lowercased, unstemmed) so exact class queries
    /// rank documents mentioning that class above documents mentioning its parts.
    pub(crate) fn tokenize(&self, text: &str) -> Vec<String> {
        let mut tokens = vec![];
        for word in words(text) {
            self.word_tokens(&text[word.start..word.end], &mut tokens);
        }
        tokens
    }

    /// Tokens contributed by a single word (as produced by [`words`]).
    pub(crate) fn word_tokens(&self, word: &str, tokens: &mut Vec<String>) {
        let parts: Vec<&str> = word
            .split(COMPOUND_JOINERS)
            .filter(|part| !part.is_empty())
            .collect();

        if parts.len() > 1 {
            tokens.push(word.to_lowercase());
        }

        for part in parts {
            let subwords = split_camel_case(part);
            if subwords.len() > 1 {
                for subword in &subwords {
                    self.index_token(subword, tokens);
                }
            }
            self.index_token(part, tokens);
        }
    }

    /// Add a token using proper stemming algorithm, filtering out stop words.
    fn index_token(&self, token: &str, tokens: &mut Vec<String>) {
        if token.chars().count() < MIN_TOKEN_LENGTH {
            return;
        }

        let lowercase = token.to_lowercase();

        // Skip stop words
        if STOP_WORDS.contains(&lowercase.as_str()) {
            return;
        }

        let stemmed = self.stemmer.stem(&lowercase);
        tokens.push(stemmed.into_owned());
    }

    /// Tokenize a query, dropping duplicate terms while keeping first-seen order.
    pub(crate) fn query_terms(&self, query: &str) -> Vec<String> {
        let mut seen = ahash::AHashSet::new();
        self.tokenize(query)
            .into_iter()
            .filter(|term| seen.insert(term.clone()))
            .collect()
    }
}

/// Byte span of a word inside the tokenized text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct WordSpan {
    pub start: usize,
    pub end: usize,
}

/// Splits text into words: runs of alphanumerics and compound joiners, with
/// leading and trailing joiners trimmed (so "flex." at a sentence end is "flex").
pub(crate) fn words(text: &str) -> Vec<WordSpan> {
    let mut spans = vec![];
    let mut start: Option<usize> = None;

    let is_word_char = |c: char| c.is_alphanumeric() || COMPOUND_JOINERS.contains(&c);

    for (i, c) in text.char_indices() {
        match (start, is_word_char(c)) {
            (None, true) => start = Some(i),
            (Some(s), false) => {
                push_trimmed(text, s, i, &mut spans);
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        push_trimmed(text, s, text.len(), &mut spans);
    }

    spans
}

fn push_trimmed(text: &str, start: usize, end: usize, spans: &mut Vec<WordSpan>) {
    let raw = &text[start..end];
    let trimmed_start = raw.trim_start_matches(COMPOUND_JOINERS);
    let lead = raw.len() - trimmed_start.len();
    let trimmed = trimmed_start.trim_end_matches(COMPOUND_JOINERS);
    if !trimmed.is_empty() {
        spans.push(WordSpan {
            start: start + lead,
            end: start + lead + trimmed.len(),
        });
    }
}

/// Splits on lowercase → uppercase transitions: "backgroundColor" → ["background", "Color"].
fn split_camel_case(part: &str) -> Vec<&str> {
    let mut pieces = vec![];
    let mut piece_start = 0;
    let mut last_lower = false;

    for (i, c) in part.char_indices() {
        if c.is_uppercase() && last_lower {
            pieces.push(&part[piece_start..i]);
            piece_start = i;
        }
        last_lower = c.is_lowercase();
    }
    pieces.push(&part[piece_start..]);
    pieces
}
