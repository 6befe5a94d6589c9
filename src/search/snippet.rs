//! Highlighted excerpts around query matches.

use super::tokenize::{Tokenizer, WordSpan, words};
use ahash::AHashSet;

/// Maximum number of content characters in a snippet, excluding markers.
pub const SNIPPET_LENGTH: usize = 300;

/// Characters of context kept before the first match of the chosen window.
const LEAD: usize = 60;

fn lead(max_chars: usize) -> usize {
    LEAD.min(max_chars / 4)
}

pub const MARK_OPEN: &str = "<mark>";
pub const MARK_CLOSE: &str = "</mark>";
pub const ELLIPSIS: &str = "...";

/// Build a snippet of at most `max_chars` content characters around the densest
/// cluster of words matching `terms`, with matches wrapped in `<mark>` tags.
///
/// Falls back to the head of the content when nothing matches.
pub(crate) fn snippet(
    content: &str,
    terms: &[String],
    tokenizer: &Tokenizer,
    max_chars: usize,
) -> String {
    let terms: AHashSet<&str> = terms.iter().map(String::as_str).collect();
    let mut scratch = vec![];
    let matches: Vec<WordSpan> = words(content)
        .into_iter()
        .filter(|span| {
            scratch.clear();
            tokenizer.word_tokens(&content[span.start..span.end], &mut scratch);
            scratch.iter().any(|token| terms.contains(token.as_str()))
        })
        .collect();

    let Some(anchor) = densest_window(content, &matches, max_chars) else {
        let end = advance_chars(content, 0, max_chars);
        return render(content, 0, trim_to_word(content, 0, end), &[]);
    };

    let mut start = retreat_chars(content, anchor.start, lead(max_chars));
    if start > 0 {
        // Begin at a word boundary when one is close by
        if let Some(space) = content[start..anchor.start].find(char::is_whitespace) {
            start += space + 1;
        }
    }
    let end = advance_chars(content, start, max_chars);
    let end = trim_to_word(content, start, end);

    render(content, start, end, &matches)
}

/// The matched word that starts the window holding the most matches.
fn densest_window(content: &str, matches: &[WordSpan], max_chars: usize) -> Option<WordSpan> {
    let reach = max_chars - lead(max_chars);
    let mut best: Option<(usize, WordSpan)> = None;

    for (i, first) in matches.iter().enumerate() {
        let limit = advance_chars(content, first.start, reach);
        let count = matches[i..].iter().take_while(|m| m.end <= limit).count();
        if best.is_none_or(|(most, _)| count > most) {
            best = Some((count, *first));
        }
    }

    best.map(|(_, span)| span)
}

/// Byte offset `count` characters after `from`, clamped to the end.
fn advance_chars(text: &str, from: usize, count: usize) -> usize {
    text[from..]
        .char_indices()
        .nth(count)
        .map_or(text.len(), |(offset, _)| from + offset)
}

/// Byte offset `count` characters before `from`, clamped to the start.
fn retreat_chars(text: &str, from: usize, count: usize) -> usize {
    if count == 0 {
        return from;
    }
    text[..from]
        .char_indices()
        .rev()
        .nth(count - 1)
        .map_or(0, |(offset, _)| offset)
}

/// Pull `end` back to the last whitespace so a truncated snippet does not cut a word.
fn trim_to_word(text: &str, start: usize, end: usize) -> usize {
    if end >= text.len() || text[end..].starts_with(char::is_whitespace) {
        return end;
    }
    match text[start..end].rfind(char::is_whitespace) {
        Some(space) if space > 0 => start + space,
        _ => end,
    }
}

fn render(content: &str, start: usize, end: usize, matches: &[WordSpan]) -> String {
    let mut out = String::with_capacity(end - start + 2 * ELLIPSIS.len());
    if start > 0 {
        out.push_str(ELLIPSIS);
    }

    let mut cursor = start;
    for span in matches.iter().filter(|m| m.start >= start && m.end <= end) {
        push_flat(&mut out, &content[cursor..span.start]);
        out.push_str(MARK_OPEN);
        push_flat(&mut out, &content[span.start..span.end]);
        out.push_str(MARK_CLOSE);
        cursor = span.end;
    }
    push_flat(&mut out, &content[cursor..end]);

    let trimmed_len = out.trim_end().len();
    out.truncate(trimmed_len);
    if end < content.len() {
        out.push_str(ELLIPSIS);
    }
    out
}

/// Append text with line breaks flattened to spaces.
fn push_flat(out: &mut String, text: &str) {
    out.extend(text.chars().map(|c| if c == '\n' || c == '\r' { ' ' } else { c }));
}
