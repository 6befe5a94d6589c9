//! In-memory inverted index over normalized records.
//!
//! A [`DocIndex`] is immutable once built. Records are stored sorted by
//! filepath and addressed by position ([`DocId`]), so ascending id order is
//! ascending filepath order.

use super::scoring::CorpusStats;
use super::tokenize::Tokenizer;
use crate::document::{NormalizedRecord, slug_of};
use ahash::AHashMap;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fmt::{self, Debug, Formatter};

/// Position of a record in [`DocIndex::records`].
pub type DocId = u32;

/// Number of indexed fields.
pub const FIELD_COUNT: usize = 4;

/// Indexed fields, in scoring order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Title = 0,
    Section = 1,
    Description = 2,
    Content = 3,
}

impl Field {
    pub const ALL: [Field; FIELD_COUNT] = [
        Field::Title,
        Field::Section,
        Field::Description,
        Field::Content,
    ];

    fn text(self, record: &NormalizedRecord) -> &str {
        match self {
            Field::Title => &record.title,
            Field::Section => &record.section,
            Field::Description => record.description.as_deref().unwrap_or_default(),
            Field::Content => &record.content,
        }
    }
}

/// Occurrences of a term in one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Posting {
    pub doc: DocId,
    pub tf: [u32; FIELD_COUNT],
}

/// Identity of an index build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IndexMeta {
    /// Monotonic build counter; 0 for the empty startup index.
    pub generation: u64,
    pub built_at: Option<DateTime<Utc>>,
    /// xxh3 digest of the raw batch the index was built from.
    pub corpus_digest: u64,
}

/// Immutable searchable snapshot of the corpus.
pub struct DocIndex {
    meta: IndexMeta,
    records: Vec<NormalizedRecord>,
    /// Term → postings sorted by doc id.
    postings: AHashMap<String, Vec<Posting>>,
    field_lengths: Vec<[u32; FIELD_COUNT]>,
    average_lengths: [f32; FIELD_COUNT],
    /// Section → doc ids ordered by title, then filepath.
    sections: BTreeMap<String, Vec<DocId>>,
    /// Exact class → doc ids ascending.
    classes: BTreeMap<String, Vec<DocId>>,
    /// Lowercased class → exact spellings, sorted.
    folded_classes: AHashMap<String, Vec<String>>,
    by_filepath: AHashMap<String, DocId>,
    by_slug: AHashMap<String, DocId>,
}

impl Debug for DocIndex {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocIndex")
            .field("generation", &self.meta.generation)
            .field("documents", &self.records.len())
            .field("terms", &self.postings.len())
            .field("sections", &self.sections.len())
            .field("classes", &self.classes.len())
            .finish()
    }
}

impl DocIndex {
    /// The empty index served before the first successful build.
    pub fn empty() -> Self {
        Self::new(vec![], IndexMeta::default())
    }

    /// Index `records`. Duplicate filepaths keep the last record.
    pub fn new(records: Vec<NormalizedRecord>, meta: IndexMeta) -> Self {
        let records: Vec<NormalizedRecord> = records
            .into_iter()
            .map(|record| (record.filepath.clone(), record))
            .collect::<BTreeMap<_, _>>()
            .into_values()
            .collect();

        let tokenizer = Tokenizer::default();
        let mut postings: AHashMap<String, Vec<Posting>> = AHashMap::new();
        let mut field_lengths = Vec::with_capacity(records.len());
        let mut totals = [0u64; FIELD_COUNT];
        let mut sections: BTreeMap<String, Vec<DocId>> = BTreeMap::new();
        let mut classes: BTreeMap<String, Vec<DocId>> = BTreeMap::new();
        let mut by_filepath = AHashMap::with_capacity(records.len());
        let mut by_slug = AHashMap::with_capacity(records.len());

        for (position, record) in records.iter().enumerate() {
            let doc = position as DocId;
            let mut frequencies: AHashMap<String, [u32; FIELD_COUNT]> = AHashMap::new();
            let mut lengths = [0u32; FIELD_COUNT];

            for field in Field::ALL {
                let tokens = tokenizer.tokenize(field.text(record));
                lengths[field as usize] = tokens.len() as u32;
                totals[field as usize] += tokens.len() as u64;
                for token in tokens {
                    frequencies.entry(token).or_default()[field as usize] += 1;
                }
            }

            for (term, tf) in frequencies {
                postings.entry(term).or_default().push(Posting { doc, tf });
            }
            field_lengths.push(lengths);

            sections.entry(record.section.clone()).or_default().push(doc);
            for class in &record.utility_classes {
                classes.entry(class.clone()).or_default().push(doc);
            }
            by_filepath.insert(record.filepath.clone(), doc);
            by_slug.entry(record.slug().to_string()).or_insert(doc);
        }

        for ids in sections.values_mut() {
            ids.sort_by(|a, b| {
                let (a, b) = (&records[*a as usize], &records[*b as usize]);
                a.title.cmp(&b.title).then_with(|| a.filepath.cmp(&b.filepath))
            });
        }

        let mut folded_classes: AHashMap<String, Vec<String>> = AHashMap::new();
        // BTreeMap iteration keeps each spelling list sorted
        for class in classes.keys() {
            folded_classes
                .entry(class.to_lowercase())
                .or_default()
                .push(class.clone());
        }

        let mut average_lengths = [0f32; FIELD_COUNT];
        if !records.is_empty() {
            for (average, total) in average_lengths.iter_mut().zip(totals) {
                *average = total as f32 / records.len() as f32;
            }
        }

        Self {
            meta,
            records,
            postings,
            field_lengths,
            average_lengths,
            sections,
            classes,
            folded_classes,
            by_filepath,
            by_slug,
        }
    }

    pub fn meta(&self) -> IndexMeta {
        self.meta
    }

    pub fn generation(&self) -> u64 {
        self.meta.generation
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All records, sorted by filepath.
    pub fn records(&self) -> &[NormalizedRecord] {
        &self.records
    }

    pub fn record(&self, doc: DocId) -> &NormalizedRecord {
        &self.records[doc as usize]
    }

    /// Number of distinct indexed terms.
    pub fn term_count(&self) -> usize {
        self.postings.len()
    }

    pub fn postings(&self, term: &str) -> &[Posting] {
        self.postings.get(term).map_or(&[], Vec::as_slice)
    }

    pub fn field_lengths(&self, doc: DocId) -> &[u32; FIELD_COUNT] {
        &self.field_lengths[doc as usize]
    }

    pub fn corpus_stats(&self) -> CorpusStats<'_> {
        CorpusStats {
            documents: self.records.len() as u32,
            average_lengths: &self.average_lengths,
        }
    }

    /// Distinct section names, alphabetically.
    pub fn section_names(&self) -> impl Iterator<Item = &str> {
        self.sections.keys().map(String::as_str)
    }

    /// Documents of a section ordered by title, then filepath.
    pub fn section(&self, name: &str) -> &[DocId] {
        self.sections.get(name).map_or(&[], Vec::as_slice)
    }

    /// Documents containing exactly `class`.
    pub fn class_documents(&self, class: &str) -> &[DocId] {
        self.classes.get(class).map_or(&[], Vec::as_slice)
    }

    /// Exact spellings of classes equal to `class` ignoring case.
    pub fn class_spellings(&self, class: &str) -> &[String] {
        self.folded_classes
            .get(&class.to_lowercase())
            .map_or(&[], Vec::as_slice)
    }

    /// Classes starting with `prefix`, in sorted order.
    pub fn classes_with_prefix<'a>(
        &'a self,
        prefix: &'a str,
    ) -> impl Iterator<Item = (&'a str, &'a [DocId])> + 'a {
        self.classes
            .range::<str, _>((std::ops::Bound::Included(prefix), std::ops::Bound::Unbounded))
            .take_while(move |(class, _)| class.starts_with(prefix))
            .map(|(class, docs)| (class.as_str(), docs.as_slice()))
    }

    pub fn by_filepath(&self, filepath: &str) -> Option<DocId> {
        self.by_filepath.get(filepath).copied()
    }

    pub fn by_slug(&self, slug: &str) -> Option<DocId> {
        self.by_slug.get(slug).copied()
    }

    /// Documents whose slug ends with the path segment(s) `tail`, by filepath.
    pub fn by_slug_tail<'a>(&'a self, tail: &'a str) -> impl Iterator<Item = DocId> + 'a {
        self.records
            .iter()
            .enumerate()
            .filter(move |(_, record)| {
                slug_of(&record.filepath)
                    .strip_suffix(tail)
                    .is_some_and(|head| head.ends_with('/'))
            })
            .map(|(position, _)| position as DocId)
    }
}
