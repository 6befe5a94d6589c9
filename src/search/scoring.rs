//! Relevance scoring for ranked retrieval.
//!
//! Scores are computed per document from the postings of each query term, in
//! query-term order and then field order, so documents with identical
//! statistics always receive bit-identical scores.

use super::index::{FIELD_COUNT, Field};

/// Statistics of the whole corpus needed by a scorer.
#[derive(Debug, Clone, Copy)]
pub struct CorpusStats<'a> {
    /// Number of documents in the index.
    pub documents: u32,
    /// Average length (in tokens) of each field across the corpus.
    pub average_lengths: &'a [f32; FIELD_COUNT],
}

/// One query term's occurrences in one document.
#[derive(Debug, Clone, Copy)]
pub struct TermMatch {
    /// Number of documents containing the term.
    pub document_frequency: u32,
    /// Occurrences of the term per field.
    pub term_frequencies: [u32; FIELD_COUNT],
}

/// Ranking strategy over the matched terms of one document.
pub trait Scorer: Send + Sync {
    fn score(
        &self,
        matches: &[TermMatch],
        field_lengths: &[u32; FIELD_COUNT],
        corpus: &CorpusStats<'_>,
    ) -> f32;
}

/// Field weights applied to per-field scores.
pub const FIELD_WEIGHTS: [f32; FIELD_COUNT] = [
    2.0, // title
    1.5, // section
    1.2, // description
    1.0, // content
];

/// Okapi BM25 with per-field length normalization and field weights.
#[derive(Debug, Clone, Copy)]
pub struct Bm25 {
    pub k1: f32,
    pub b: f32,
    pub field_weights: [f32; FIELD_COUNT],
}

impl Default for Bm25 {
    fn default() -> Self {
        Self {
            k1: 1.2,
            b: 0.75,
            field_weights: FIELD_WEIGHTS,
        }
    }
}

impl Bm25 {
    /// Inverse document frequency, kept positive for terms present in most documents.
    pub fn idf(documents: u32, document_frequency: u32) -> f32 {
        let n = documents as f32;
        let df = document_frequency as f32;
        (1.0 + (n - df + 0.5) / (df + 0.5)).ln()
    }

    fn field_score(&self, tf: u32, length: u32, average_length: f32) -> f32 {
        if tf == 0 {
            return 0.0;
        }
        let tf = tf as f32;
        let norm = if average_length > 0.0 {
            1.0 - self.b + self.b * (length as f32 / average_length)
        } else {
            1.0
        };
        tf * (self.k1 + 1.0) / (tf + self.k1 * norm)
    }
}

impl Scorer for Bm25 {
    fn score(
        &self,
        matches: &[TermMatch],
        field_lengths: &[u32; FIELD_COUNT],
        corpus: &CorpusStats<'_>,
    ) -> f32 {
        let mut total = 0.0;
        for term in matches {
            let idf = Self::idf(corpus.documents, term.document_frequency);
            for field in Field::ALL {
                let i = field as usize;
                total += idf
                    * self.field_weights[i]
                    * self.field_score(
                        term.term_frequencies[i],
                        field_lengths[i],
                        corpus.average_lengths[i],
                    );
            }
        }
        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::check;

    const AVERAGES: [f32; FIELD_COUNT] = [2.0, 1.0, 8.0, 100.0];

    fn corpus() -> CorpusStats<'static> {
        CorpusStats {
            documents: 10,
            average_lengths: &AVERAGES,
        }
    }

    fn term(df: u32, tf: [u32; FIELD_COUNT]) -> TermMatch {
        TermMatch {
            document_frequency: df,
            term_frequencies: tf,
        }
    }

    #[test]
    fn rarer_terms_score_higher() {
        check!(Bm25::idf(10, 1) > Bm25::idf(10, 5));
        check!(Bm25::idf(10, 10) > 0.0);
    }

    #[test]
    fn title_match_outweighs_content_match() {
        let bm25 = Bm25::default();
        let lengths = [2, 1, 8, 100];
        let in_title = bm25.score(&[term(2, [1, 0, 0, 0])], &lengths, &corpus());
        let in_content = bm25.score(&[term(2, [0, 0, 0, 1])], &lengths, &corpus());
        check!(in_title > in_content);
    }

    #[test]
    fn shorter_fields_score_higher() {
        let bm25 = Bm25::default();
        let short = bm25.score(&[term(2, [0, 0, 0, 3])], &[2, 1, 8, 50], &corpus());
        let long = bm25.score(&[term(2, [0, 0, 0, 3])], &[2, 1, 8, 400], &corpus());
        check!(short > long);
    }

    #[test]
    fn term_frequency_saturates() {
        let bm25 = Bm25::default();
        let lengths = [2, 1, 8, 100];
        let ten = bm25.score(&[term(2, [0, 0, 0, 10])], &lengths, &corpus());
        let hundred = bm25.score(&[term(2, [0, 0, 0, 100])], &lengths, &corpus());
        check!(hundred > ten);
        check!(hundred < ten * 2.0);
    }

    #[test]
    fn no_matches_scores_zero() {
        let bm25 = Bm25::default();
        check!(bm25.score(&[], &[1, 1, 1, 1], &corpus()) == 0.0);
    }
}
