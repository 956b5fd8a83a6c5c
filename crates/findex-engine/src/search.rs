//! Immutable search index snapshot.
//!
//! Built from a full record-store scan; queries run the fuzzy matcher
//! over a weighted set of fields and return ranked hits. Mutations to
//! the store never affect an already-built snapshot; the ingestion
//! coordinator swaps in a fresh one after each run.

use crate::fuzzy::Pattern;
use crate::record::{IndexedRecord, MatchSpan, SearchHit};
use findex_core::SearchTuning;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A searchable record field.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SearchField {
    Name,
    Content,
}

impl SearchField {
    fn as_str(self) -> &'static str {
        match self {
            SearchField::Name => "name",
            SearchField::Content => "content",
        }
    }

    fn value<'a>(self, record: &'a IndexedRecord) -> &'a str {
        match self {
            SearchField::Name => &record.name,
            SearchField::Content => &record.content,
        }
    }
}

/// Field weights and the global match threshold.
///
/// Weights need not sum to 1; they are normalized at scoring time.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub fields: Vec<(SearchField, f64)>,
    pub threshold: f64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            fields: vec![(SearchField::Name, 0.3), (SearchField::Content, 0.7)],
            threshold: 0.4,
        }
    }
}

impl From<&SearchTuning> for SearchConfig {
    fn from(tuning: &SearchTuning) -> Self {
        Self {
            fields: vec![
                (SearchField::Name, tuning.name_weight),
                (SearchField::Content, tuning.content_weight),
            ],
            threshold: tuning.threshold,
        }
    }
}

/// An immutable snapshot of the corpus, ready to answer queries.
pub struct SearchIndex {
    records: Vec<IndexedRecord>,
    config: SearchConfig,
}

impl SearchIndex {
    /// Build a snapshot over `records`, which must already be in the
    /// store's reference order (most recently indexed first).
    pub fn build(records: Vec<IndexedRecord>, config: SearchConfig) -> Self {
        Self { records, config }
    }

    /// An empty snapshot (the post-`clear` state).
    pub fn empty(config: SearchConfig) -> Self {
        Self::build(Vec::new(), config)
    }

    /// Number of records in the snapshot.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Execute a query and return hits sorted best-first.
    ///
    /// An empty or whitespace-only query returns no hits. A record is a
    /// candidate when at least one field matches under the threshold;
    /// its score is the normalized-weight sum of field scores, with
    /// unmatched fields contributing the worst score (1.0).
    pub fn query(&self, text: &str) -> Vec<SearchHit> {
        let text = text.trim();
        if text.is_empty() {
            return Vec::new();
        }

        let pattern = Pattern::new(text, self.config.threshold);
        let weight_total: f64 = self.config.fields.iter().map(|(_, w)| w).sum();
        if pattern.is_empty() || weight_total <= 0.0 {
            return Vec::new();
        }

        let mut hits: Vec<SearchHit> = Vec::new();

        for record in &self.records {
            let mut score = 0.0;
            let mut matches = Vec::new();

            for &(field, weight) in &self.config.fields {
                let norm = weight / weight_total;
                match pattern.find_in(field.value(record)) {
                    Some(hit) => {
                        score += norm * hit.score;
                        matches.push(MatchSpan {
                            field: field.as_str().to_string(),
                            matched_text: field.value(record).to_string(),
                            ranges: hit.ranges,
                        });
                    }
                    None => score += norm,
                }
            }

            if !matches.is_empty() {
                hits.push(SearchHit {
                    record: record.clone(),
                    score,
                    matches,
                });
            }
        }

        // Stable sort keeps the snapshot's reference order for ties
        hits.sort_by(|a, b| a.score.partial_cmp(&b.score).unwrap_or(Ordering::Equal));

        hits
    }
}
