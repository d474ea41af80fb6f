//! Local similarity search adapter

use super::traits::{RetrievalError, VectorIndex};
use crate::evidence::EvidenceItem;
use std::sync::Arc;
use tracing::debug;

/// Turns nearest-neighbour candidates into local evidence sorted by ascending distance
#[derive(Clone)]
pub struct SimilarityScorer {
    index: Arc<dyn VectorIndex>,
    max_distance: Option<f64>,
}

impl SimilarityScorer {
    pub fn new(index: Arc<dyn VectorIndex>) -> Self {
        Self {
            index,
            max_distance: None,
        }
    }

    /// Drop candidates farther than `max_distance`
    pub fn with_max_distance(mut self, max_distance: Option<f64>) -> Self {
        self.max_distance = max_distance;
        self
    }

    pub fn index_name(&self) -> &str {
        self.index.name()
    }

    pub async fn document_count(&self) -> Option<usize> {
        self.index.document_count().await
    }

    /// Search the knowledge index.
    ///
    /// Candidates with blank text, a non-finite distance, or a distance past the floor are
    /// discarded. Equal distances are ordered by document id so repeated calls agree.
    pub async fn search(&self, query: &str, k: usize) -> Result<Vec<EvidenceItem>, RetrievalError> {
        if k == 0 {
            return Ok(Vec::new());
        }

        let neighbors = self.index.nearest_neighbors(query, k).await?;
        let returned = neighbors.len();

        let mut items: Vec<EvidenceItem> = neighbors
            .into_iter()
            .filter(|n| n.score.is_finite() && !n.text.trim().is_empty())
            .filter(|n| self.max_distance.map_or(true, |max| n.score <= max))
            .map(|n| EvidenceItem::local(n.text, n.score, n.doc_id))
            .collect();

        items.sort_by(|a, b| {
            a.score
                .total_cmp(&b.score)
                .then_with(|| a.origin.cmp(&b.origin))
        });
        items.truncate(k);

        debug!(
            "Index {} returned {} candidates, kept {}",
            self.index.name(),
            returned,
            items.len()
        );

        Ok(items)
    }
}
