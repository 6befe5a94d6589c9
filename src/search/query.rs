//! Read-only query operations over a [`DocIndex`] snapshot.
//!
//! Every operation validates its input, runs against one immutable index and
//! returns fully shaped results. Ranked results are ordered by score
//! descending, then by filepath ascending.

use super::index::{DocId, DocIndex};
use super::scoring::{Bm25, Scorer, TermMatch};
use super::snippet::{SNIPPET_LENGTH, snippet};
use super::tokenize::Tokenizer;
use crate::document::{CodeExample, NormalizedRecord};
use crate::error::QueryError;
use chrono::{DateTime, Utc};
use rapidfuzz::distance::jaro_winkler;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

pub const MAX_QUERY_LENGTH: usize = 200;
pub const MAX_CLASS_LENGTH: usize = 100;
pub const MAX_SECTION_LENGTH: usize = 50;
pub const MAX_SLUG_LENGTH: usize = 100;

/// Maximum related classes reported per utility-class match.
const MAX_RELATED_CLASSES: usize = 12;
/// Maximum variant classes reported per variant hit.
const MAX_VARIANT_CLASSES: usize = 20;
/// Maximum "did you mean" suggestions.
const MAX_SUGGESTIONS: usize = 5;
/// Minimum Jaro-Winkler similarity for a suggestion.
const SUGGESTION_THRESHOLD: f64 = 0.7;

/// Score added per class using the variant, log-scaled by class count.
const VARIANT_CLASS_BOOST: f32 = 2.0;
/// Score added when the content names the variant as a state, variant or modifier.
const VARIANT_PHRASE_BONUS: f32 = 1.5;

/// Accepted range and default for a result limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimitRange {
    pub min: usize,
    pub max: usize,
    pub default: usize,
}

pub const SEARCH_LIMIT: LimitRange = LimitRange {
    min: 1,
    max: 50,
    default: 10,
};

pub const EXAMPLES_LIMIT: LimitRange = LimitRange {
    min: 1,
    max: 10,
    default: 5,
};

pub const VARIANT_LIMIT: LimitRange = LimitRange {
    min: 1,
    max: 20,
    default: 10,
};

impl LimitRange {
    /// The default when `limit` is absent; out-of-range values are rejected.
    pub fn resolve(self, limit: Option<usize>) -> Result<usize, QueryError> {
        match limit {
            None => Ok(self.default),
            Some(limit) if (self.min..=self.max).contains(&limit) => Ok(limit),
            Some(limit) => Err(QueryError::invalid(
                "limit",
                format!("must be between {} and {} (got {})", self.min, self.max, limit),
            )),
        }
    }
}

/// A ranked full-text hit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub filepath: String,
    pub title: String,
    pub section: String,
    pub description: Option<String>,
    pub snippet: String,
    pub url: String,
    pub score: f32,
}

/// A document containing a looked-up utility class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassMatch {
    pub filepath: String,
    pub title: String,
    pub section: String,
    pub description: Option<String>,
    pub url: String,
    /// The class as spelled in the document.
    pub matched_class: String,
    /// Other classes of the same family in the document.
    pub related_classes: Vec<String>,
}

/// A document listed when browsing a section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionEntry {
    pub filepath: String,
    pub title: String,
    pub description: Option<String>,
    pub url: String,
}

/// A complete record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FullDocument {
    pub filepath: String,
    pub slug: String,
    pub title: String,
    pub section: String,
    pub description: Option<String>,
    pub content: String,
    pub url: String,
    pub utility_classes: Vec<String>,
    pub code_examples: Vec<CodeExample>,
    pub last_updated: Option<DateTime<Utc>>,
}

/// A ranked document with its code examples.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExampleHit {
    pub filepath: String,
    pub title: String,
    pub section: String,
    pub url: String,
    pub score: f32,
    pub code_examples: Vec<CodeExample>,
}

/// A ranked document discussing a variant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariantHit {
    pub filepath: String,
    pub title: String,
    pub section: String,
    pub description: Option<String>,
    pub snippet: String,
    pub url: String,
    pub score: f32,
    /// Classes in the document that use the variant, stacked or not.
    pub variant_classes: Vec<String>,
}

/// Query operations with a ranking strategy and URL base.
pub struct QueryEngine {
    scorer: Arc<dyn Scorer>,
    tokenizer: Tokenizer,
    site_url: String,
}

impl QueryEngine {
    /// Engine using [`Bm25`] with default parameters.
    pub fn new(site_url: impl Into<String>) -> Self {
        Self::with_scorer(site_url, Arc::new(Bm25::default()))
    }

    pub fn with_scorer(site_url: impl Into<String>, scorer: Arc<dyn Scorer>) -> Self {
        Self {
            scorer,
            tokenizer: Tokenizer::default(),
            site_url: site_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Public URL of a record: `<site_url>/<slug>`.
    pub fn url(&self, record: &NormalizedRecord) -> String {
        format!("{}/{}", self.site_url, record.slug())
    }

    /// Ranked full-text search over title, section, description and content.
    pub fn search(
        &self,
        index: &DocIndex,
        query: &str,
        limit: Option<usize>,
    ) -> Result<Vec<SearchHit>, QueryError> {
        let query = validate_query(query)?;
        let limit = SEARCH_LIMIT.resolve(limit)?;
        let terms = self.tokenizer.query_terms(query);

        let hits = self
            .rank(index, &terms, |_| true)
            .into_iter()
            .take(limit)
            .map(|(doc, score)| {
                let record = index.record(doc);
                SearchHit {
                    filepath: record.filepath.clone(),
                    title: record.title.clone(),
                    section: record.section.clone(),
                    description: record.description.clone(),
                    snippet: snippet(&record.content, &terms, &self.tokenizer, SNIPPET_LENGTH),
                    url: self.url(record),
                    score,
                }
            })
            .collect::<Vec<_>>();

        tracing::debug!(query, results = hits.len(), "search");
        Ok(hits)
    }

    /// Documents containing `class`: exact spelling first, else case-insensitive.
    pub fn utility_class(&self, index: &DocIndex, class: &str) -> Result<Vec<ClassMatch>, QueryError> {
        let class = validate_key("class name", class, MAX_CLASS_LENGTH)?;

        let mut found: BTreeMap<DocId, &str> = BTreeMap::new();
        let exact = index.class_documents(class);
        if exact.is_empty() {
            for spelling in index.class_spellings(class) {
                for doc in index.class_documents(spelling) {
                    found.entry(*doc).or_insert(spelling);
                }
            }
        } else {
            found.extend(exact.iter().map(|doc| (*doc, class)));
        }

        Ok(found
            .into_iter()
            .map(|(doc, matched)| {
                let record = index.record(doc);
                let family = class_family(matched);
                ClassMatch {
                    filepath: record.filepath.clone(),
                    title: record.title.clone(),
                    section: record.section.clone(),
                    description: record.description.clone(),
                    url: self.url(record),
                    matched_class: matched.to_string(),
                    related_classes: record
                        .utility_classes
                        .iter()
                        .filter(|c| c.as_str() != matched && class_family(c) == family)
                        .take(MAX_RELATED_CLASSES)
                        .cloned()
                        .collect(),
                }
            })
            .collect())
    }

    /// Distinct section names, alphabetically.
    pub fn list_sections(&self, index: &DocIndex) -> Vec<String> {
        index.section_names().map(str::to_string).collect()
    }

    /// Documents whose section is exactly `section`, by title then filepath.
    pub fn section_docs(&self, index: &DocIndex, section: &str) -> Result<Vec<SectionEntry>, QueryError> {
        let section = validate_key("section", section, MAX_SECTION_LENGTH)?;
        Ok(index
            .section(section)
            .iter()
            .map(|doc| {
                let record = index.record(*doc);
                SectionEntry {
                    filepath: record.filepath.clone(),
                    title: record.title.clone(),
                    description: record.description.clone(),
                    url: self.url(record),
                }
            })
            .collect())
    }

    /// Look a document up by filepath, slug, or a trailing slug segment that
    /// identifies exactly one document. `None` when nothing (or more than one
    /// document) matches.
    pub fn full_doc(&self, index: &DocIndex, key: &str) -> Result<Option<FullDocument>, QueryError> {
        let key = validate_key("slug", key, MAX_SLUG_LENGTH)?;
        let key = key.trim_matches('/');

        let doc = index.by_filepath(key).or_else(|| index.by_slug(key)).or_else(|| {
            let mut tail = index.by_slug_tail(key);
            match (tail.next(), tail.next()) {
                (Some(doc), None) => Some(doc),
                _ => None,
            }
        });

        Ok(doc.map(|doc| {
            let record = index.record(doc);
            FullDocument {
                filepath: record.filepath.clone(),
                slug: record.slug().to_string(),
                title: record.title.clone(),
                section: record.section.clone(),
                description: record.description.clone(),
                content: record.content.clone(),
                url: self.url(record),
                utility_classes: record.utility_classes.iter().cloned().collect(),
                code_examples: record.code_examples.clone(),
                last_updated: record.last_updated,
            }
        }))
    }

    /// Ranked search restricted to documents with at least one code example.
    pub fn examples(
        &self,
        index: &DocIndex,
        query: &str,
        limit: Option<usize>,
    ) -> Result<Vec<ExampleHit>, QueryError> {
        let query = validate_query(query)?;
        let limit = EXAMPLES_LIMIT.resolve(limit)?;
        let terms = self.tokenizer.query_terms(query);

        Ok(self
            .rank(index, &terms, |doc| !index.record(doc).code_examples.is_empty())
            .into_iter()
            .take(limit)
            .map(|(doc, score)| {
                let record = index.record(doc);
                ExampleHit {
                    filepath: record.filepath.clone(),
                    title: record.title.clone(),
                    section: record.section.clone(),
                    url: self.url(record),
                    score,
                    code_examples: record.code_examples.clone(),
                }
            })
            .collect())
    }

    /// Documents about a variant such as `hover` or `dark`.
    ///
    /// Full-text relevance of the variant name is boosted for documents using
    /// the variant anywhere in a class's variant stack (`hover:` in `md:hover:x`) and for prose naming it as a state, variant or modifier.
    pub fn variant(
        &self,
        index: &DocIndex,
        variant: &str,
        limit: Option<usize>,
    ) -> Result<Vec<VariantHit>, QueryError> {
        let variant = validate_variant(variant)?;
        let limit = VARIANT_LIMIT.resolve(limit)?;
        let terms = self.tokenizer.query_terms(variant);
        let prefix = format!("{variant}:");

        let mut class_counts: BTreeMap<DocId, u32> = BTreeMap::new();
        let classes = index
            .classes_with_prefix("")
            .filter(|(class, _)| uses_variant(class, variant));
        for (_, docs) in classes {
            for doc in docs {
                *class_counts.entry(*doc).or_default() += 1;
            }
        }

        let mut scores: BTreeMap<DocId, f32> = self.rank(index, &terms, |_| true).into_iter().collect();
        for doc in class_counts.keys() {
            scores.entry(*doc).or_insert(0.0);
        }

        let phrases = [
            format!("{variant} state"),
            format!("{variant} variant"),
            format!("{variant} modifier"),
            prefix.clone(),
        ];

        let mut ranked: Vec<(DocId, f32)> = scores
            .into_iter()
            .map(|(doc, mut score)| {
                if let Some(count) = class_counts.get(&doc) {
                    score += VARIANT_CLASS_BOOST * (1.0 + *count as f32).ln();
                }
                let content = index.record(doc).content.to_lowercase();
                if phrases.iter().any(|phrase| content.contains(phrase.as_str())) {
                    score += VARIANT_PHRASE_BONUS;
                }
                (doc, score)
            })
            .collect();
        sort_ranked(&mut ranked);

        let hits = ranked
            .into_iter()
            .take(limit)
            .map(|(doc, score)| {
                let record = index.record(doc);
                VariantHit {
                    filepath: record.filepath.clone(),
                    title: record.title.clone(),
                    section: record.section.clone(),
                    description: record.description.clone(),
                    snippet: snippet(&record.content, &terms, &self.tokenizer, SNIPPET_LENGTH),
                    url: self.url(record),
                    score,
                    variant_classes: record
                        .utility_classes
                        .iter()
                        .filter(|c| uses_variant(c, variant))
                        .take(MAX_VARIANT_CLASSES)
                        .cloned()
                        .collect(),
                }
            })
            .collect::<Vec<_>>();

        tracing::debug!(variant, results = hits.len(), "variant search");
        Ok(hits)
    }

    /// Section names similar to `section`, most similar first.
    pub fn suggest_sections(&self, index: &DocIndex, section: &str) -> Vec<String> {
        let needle = section.trim().to_lowercase();
        suggest(index.section_names(), |name| {
            jaro_winkler::similarity(needle.chars(), name.to_lowercase().chars())
        })
    }

    /// Slugs similar to `key`, most similar first. Slugs ending in `key` come first.
    pub fn suggest_documents(&self, index: &DocIndex, key: &str) -> Vec<String> {
        let key = key.trim().trim_matches('/');
        let mut suggestions: Vec<String> = index
            .by_slug_tail(key)
            .take(MAX_SUGGESTIONS)
            .map(|doc| index.record(doc).slug().to_string())
            .collect();

        let needle = key.to_lowercase();
        let similar = suggest(index.records().iter().map(NormalizedRecord::slug), |slug| {
            let name = slug.rsplit('/').next().unwrap_or(slug);
            jaro_winkler::similarity(needle.chars(), name.to_lowercase().chars())
        });
        for slug in similar {
            if suggestions.len() >= MAX_SUGGESTIONS {
                break;
            }
            if !suggestions.contains(&slug) {
                suggestions.push(slug);
            }
        }
        suggestions
    }

    /// Score every document matching at least one term and accepted by `accept`.
    fn rank(&self, index: &DocIndex, terms: &[String], accept: impl Fn(DocId) -> bool) -> Vec<(DocId, f32)> {
        let mut matches: BTreeMap<DocId, Vec<TermMatch>> = BTreeMap::new();

        for term in terms {
            let postings = index.postings(term);
            let document_frequency = postings.len() as u32;
            for posting in postings.iter().filter(|p| accept(p.doc)) {
                matches.entry(posting.doc).or_default().push(TermMatch {
                    document_frequency,
                    term_frequencies: posting.tf,
                });
            }
        }

        let corpus = index.corpus_stats();
        let mut ranked: Vec<(DocId, f32)> = matches
            .into_iter()
            .map(|(doc, matched)| (doc, self.scorer.score(&matched, index.field_lengths(doc), &corpus)))
            .collect();
        sort_ranked(&mut ranked);
        ranked
    }
}

/// Score descending, then doc id (filepath) ascending.
fn sort_ranked(ranked: &mut [(DocId, f32)]) {
    ranked.sort_by(|(doc_a, a), (doc_b, b)| b.total_cmp(a).then(doc_a.cmp(doc_b)));
}

fn suggest<'a>(candidates: impl Iterator<Item = &'a str>, similarity: impl Fn(&str) -> f64) -> Vec<String> {
    let mut scored: Vec<(f64, &str)> = candidates
        .map(|candidate| (similarity(candidate), candidate))
        .filter(|(score, _)| *score >= SUGGESTION_THRESHOLD)
        .collect();
    scored.sort_by(|(a, name_a), (b, name_b)| b.total_cmp(a).then(name_a.cmp(name_b)));
    scored.dedup_by(|(_, a), (_, b)| a == b);
    scored
        .into_iter()
        .take(MAX_SUGGESTIONS)
        .map(|(_, name)| name.to_string())
        .collect()
}

/// Whether `variant` is one of the `:`-separated variants in front of the base utility.
fn uses_variant(class: &str, variant: &str) -> bool {
    let mut segments: Vec<&str> = class.split(':').collect();
    segments.pop();
    segments.contains(&variant)
}

/// The base utility of a class: variants, `!` and `-` removed, up to the first dash.
/// `hover:-mt-2` → `mt`, `flex-1` → `flex`.
fn class_family(class: &str) -> &str {
    let base = class.rsplit(':').next().unwrap_or(class);
    let base = base.trim_start_matches(['!', '-']);
    base.split('-').next().unwrap_or(base)
}

fn validate_query(query: &str) -> Result<&str, QueryError> {
    let query = query.trim();
    if query.is_empty() {
        return Err(QueryError::invalid("query", "must not be empty"));
    }
    if query.chars().count() > MAX_QUERY_LENGTH {
        return Err(QueryError::invalid(
            "query",
            format!("must be at most {MAX_QUERY_LENGTH} characters"),
        ));
    }
    Ok(query)
}

fn validate_key<'a>(field: &'static str, value: &'a str, max: usize) -> Result<&'a str, QueryError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(QueryError::invalid(field, "must not be empty"));
    }
    if value.chars().count() > max {
        return Err(QueryError::invalid(field, format!("must be at most {max} characters")));
    }
    Ok(value)
}

fn validate_variant(variant: &str) -> Result<&str, QueryError> {
    let trimmed = variant.trim();
    let variant = trimmed.strip_suffix(':').unwrap_or(trimmed);
    let valid = !variant.is_empty()
        && variant
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if !valid {
        return Err(QueryError::invalid(
            "variant",
            "must match ^[a-z0-9-]+$ (optionally followed by ':')",
        ));
    }
    Ok(variant)
}
