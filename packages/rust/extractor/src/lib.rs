//! Obligation extraction: sentence segmentation plus keyword classification.
//!
//! Splits raw document text into sentences and classifies each sentence
//! against every category of a [`Taxonomy`]. A sentence can yield one
//! obligation per matching category; within a category the earliest-listed
//! keyword wins.

pub mod taxonomy;

use rayon::prelude::*;
use tracing::{debug, instrument};

use clausemap_shared::Obligation;
use clausemap_shared::text::split_sentences;

pub use taxonomy::{Category, Taxonomy};

/// Sentences at or below this many characters are treated as fragments
/// (headers, page-break debris) and skipped.
pub const MIN_SENTENCE_CHARS: usize = 10;

// ---------------------------------------------------------------------------
// Extractor
// ---------------------------------------------------------------------------

/// Taxonomy with keywords pre-lowered for case-insensitive matching.
#[derive(Debug, Clone)]
pub struct Extractor {
    taxonomy: Taxonomy,
    /// Per category (same order as the taxonomy): `(lowered, original)` keywords.
    lowered: Vec<Vec<(String, String)>>,
}

impl Extractor {
    /// Prepare an extractor over a read-only taxonomy.
    pub fn new(taxonomy: Taxonomy) -> Self {
        let lowered = taxonomy
            .categories()
            .iter()
            .map(|c| {
                c.keywords
                    .iter()
                    .filter(|k| !k.trim().is_empty())
                    .map(|k| (k.to_lowercase(), k.clone()))
                    .collect()
            })
            .collect();
        Self { taxonomy, lowered }
    }

    /// The taxonomy this extractor classifies against.
    pub fn taxonomy(&self) -> &Taxonomy {
        &self.taxonomy
    }

    /// Extract obligations from one document's text.
    ///
    /// Never fails: empty or unmatched text yields an empty vector.
    #[instrument(skip_all, fields(chars = text.len()))]
    pub fn extract(&self, text: &str) -> Vec<Obligation> {
        let sentences = candidate_sentences(text);
        let mut obligations = Vec::new();

        for sentence in &sentences {
            let lowered_sentence = sentence.to_lowercase();
            for (category, keywords) in self.taxonomy.categories().iter().zip(&self.lowered) {
                let hit = keywords
                    .iter()
                    .find(|(lowered, _)| lowered_sentence.contains(lowered.as_str()));
                if let Some((_, keyword)) = hit {
                    obligations.push(Obligation {
                        text: sentence.clone(),
                        category: category.name.clone(),
                        matched_keyword: keyword.clone(),
                        domain: self.taxonomy.domain_for(&category.name).to_string(),
                    });
                }
            }
        }

        debug!(
            sentences = sentences.len(),
            obligations = obligations.len(),
            "classified sentences"
        );
        obligations
    }

    /// Extract from many documents in parallel; output order matches input order.
    pub fn extract_batch<S: AsRef<str> + Sync>(&self, texts: &[S]) -> Vec<Vec<Obligation>> {
        texts.par_iter().map(|t| self.extract(t.as_ref())).collect()
    }
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new(Taxonomy::builtin())
    }
}

/// Convenience wrapper: classify `text` against `taxonomy`.
pub fn extract(text: &str, taxonomy: &Taxonomy) -> Vec<Obligation> {
    Extractor::new(taxonomy.clone()).extract(text)
}

/// Sentences long enough to classify.
pub fn candidate_sentences(text: &str) -> Vec<String> {
    split_sentences(text)
        .into_iter()
        .filter(|s| s.chars().count() > MIN_SENTENCE_CHARS)
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
