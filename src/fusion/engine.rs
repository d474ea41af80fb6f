//! Merging local and web evidence into one ranked set

use crate::evidence::{EvidenceItem, EvidenceSet};
use crate::routing::RoutingDecision;
use std::collections::HashSet;
use std::iter;
use tracing::debug;

/// Interleaves, deduplicates and caps evidence from the selected sources
#[derive(Debug, Clone, Copy)]
pub struct ResultFusionEngine {
    max_evidence: usize,
}

impl Default for ResultFusionEngine {
    fn default() -> Self {
        Self::new(crate::DEFAULT_MAX_EVIDENCE)
    }
}

impl ResultFusionEngine {
    pub fn new(max_evidence: usize) -> Self {
        Self { max_evidence }
    }

    pub fn max_evidence(&self) -> usize {
        self.max_evidence
    }

    /// Fuse the sources selected by `routing`.
    ///
    /// Each source is ordered by ascending score (distance or rank), then the two lists are
    /// alternated starting with local. The first occurrence of a normalized text wins; items
    /// with no text are dropped. The cap is applied to the merged list only.
    pub fn fuse(
        &self,
        routing: RoutingDecision,
        local: Vec<EvidenceItem>,
        web: Vec<EvidenceItem>,
    ) -> EvidenceSet {
        let local = if routing.route.uses_local() {
            ranked(local)
        } else {
            Vec::new()
        };
        let web = if routing.route.requires_web() {
            ranked(web)
        } else {
            Vec::new()
        };

        let candidates = local.len() + web.len();
        let mut seen = HashSet::new();
        let mut merged: Vec<EvidenceItem> = interleave(local, web)
            .filter(|item| {
                let key = item.dedup_key();
                !key.is_empty() && seen.insert(key)
            })
            .collect();
        let unique = merged.len();
        merged.truncate(self.max_evidence);

        debug!(
            "Fused {} candidates into {} unique items, kept {} ({})",
            candidates,
            unique,
            merged.len(),
            routing.route
        );

        EvidenceSet::new(routing, merged)
    }
}

fn ranked(mut items: Vec<EvidenceItem>) -> Vec<EvidenceItem> {
    items.sort_by(|a, b| a.score.total_cmp(&b.score));
    items
}

/// Alternate between two lists, starting with `first`, draining whichever outlasts the other
fn interleave(
    first: Vec<EvidenceItem>,
    second: Vec<EvidenceItem>,
) -> impl Iterator<Item = EvidenceItem> {
    let mut first = first.into_iter();
    let mut second = second.into_iter();
    let mut take_first = true;

    iter::from_fn(move || {
        let next = if take_first {
            first.next().or_else(|| second.next())
        } else {
            second.next().or_else(|| first.next())
        };
        take_first = !take_first;
        next
    })
}
