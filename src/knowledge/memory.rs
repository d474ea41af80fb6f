//! In-process lexical similarity index

use super::corpus::Corpus;
use crate::retrieval::{Neighbor, RetrievalError, VectorIndex};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

/// Largest distance the index reports, for a block sharing no terms with the query
pub const MAX_DISTANCE: f64 = 4.0;

static TERM_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\p{L}\p{N}]+").unwrap());

const STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "can", "do", "does", "for", "how", "i", "in", "is", "it", "of", "on",
    "or", "the", "to", "what", "where", "which", "who", "why", "with",
];

/// Distinct lowercase terms of `text`, stop words removed
fn terms(text: &str) -> HashSet<String> {
    TERM_RE
        .find_iter(&text.to_lowercase())
        .map(|m| m.as_str().to_string())
        .filter(|t| !STOP_WORDS.contains(&t.as_str()))
        .collect()
}

struct IndexedDocument {
    id: String,
    text: String,
    terms: HashSet<String>,
}

/// Term-overlap index over a loaded [`Corpus`].
///
/// Distance is `4 * (1 - overlap)`, where overlap is the share of distinct query terms found in
/// the block, so a block containing every query term scores 0.
pub struct MemoryIndex {
    documents: Vec<IndexedDocument>,
}

impl MemoryIndex {
    pub fn new(corpus: &Corpus) -> Self {
        let documents = corpus
            .documents()
            .iter()
            .map(|d| IndexedDocument {
                id: d.id.clone(),
                text: d.text.clone(),
                terms: terms(&d.text),
            })
            .collect();

        Self { documents }
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

#[async_trait]
impl VectorIndex for MemoryIndex {
    fn name(&self) -> &str {
        "memory"
    }

    async fn nearest_neighbors(
        &self,
        query: &str,
        k: usize,
    ) -> Result<Vec<Neighbor>, RetrievalError> {
        let query_terms = terms(query);
        if query_terms.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        let mut scored: Vec<(f64, &IndexedDocument)> = self
            .documents
            .iter()
            .filter_map(|doc| {
                let shared = query_terms.intersection(&doc.terms).count();
                if shared == 0 {
                    return None;
                }
                let overlap = shared as f64 / query_terms.len() as f64;
                Some((MAX_DISTANCE * (1.0 - overlap), doc))
            })
            .collect();

        scored.sort_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.id.cmp(&b.1.id)));
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(score, doc)| Neighbor {
                text: doc.text.clone(),
                score,
                doc_id: doc.id.clone(),
            })
            .collect())
    }

    async fn document_count(&self) -> Option<usize> {
        Some(self.documents.len())
    }
}
