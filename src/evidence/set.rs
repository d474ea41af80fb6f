//! Ranked, deduplicated evidence produced by fusion

use super::types::{EvidenceItem, Provenance, SourceKind};
use crate::routing::RoutingDecision;
use serde::Serialize;
use std::collections::HashSet;

/// Ordered evidence for one query, tagged with the routing decision that produced it.
///
/// Items are kept in rank order and are unique by normalized content. An empty set is a valid
/// outcome meaning no source produced anything usable.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvidenceSet {
    items: Vec<EvidenceItem>,
    routing: RoutingDecision,
}

impl EvidenceSet {
    /// Wrap items that are already ranked and deduplicated
    pub(crate) fn new(routing: RoutingDecision, items: Vec<EvidenceItem>) -> Self {
        Self { items, routing }
    }

    /// An empty set for the given routing
    pub fn empty(routing: RoutingDecision) -> Self {
        Self::new(routing, Vec::new())
    }

    pub fn items(&self) -> &[EvidenceItem] {
        &self.items
    }

    pub fn routing(&self) -> &RoutingDecision {
        &self.routing
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &EvidenceItem> {
        self.items.iter()
    }

    /// Number of items from a given source
    pub fn count_from(&self, source: SourceKind) -> usize {
        self.items.iter().filter(|i| i.source == source).count()
    }

    /// Source references in rank order, without repeats
    pub fn provenance(&self) -> Vec<Provenance> {
        let mut seen = HashSet::new();
        self.items
            .iter()
            .map(EvidenceItem::provenance)
            .filter(|p| seen.insert(p.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::{Route, RoutingDecision};

    fn hybrid() -> RoutingDecision {
        RoutingDecision {
            route: Route::Hybrid,
            best_score: Some(3.0),
            threshold: 2.2,
        }
    }

    #[test]
    fn test_provenance_is_deduplicated_in_order() {
        let set = EvidenceSet::new(
            hybrid(),
            vec![
                EvidenceItem::local("first block", 2.5, "doc_1"),
                EvidenceItem::web("a snippet", 1, "https://a.example"),
                EvidenceItem::web("another snippet", 2, "https://a.example"),
                EvidenceItem::local("second block", 2.9, "doc_2"),
            ],
        );

        let refs: Vec<String> = set.provenance().iter().map(|p| p.to_string()).collect();
        assert_eq!(
            refs,
            vec!["local:doc_1", "web:https://a.example", "local:doc_2"]
        );
        assert_eq!(set.count_from(SourceKind::Web), 2);
    }

    #[test]
    fn test_empty_set() {
        let set = EvidenceSet::empty(hybrid());
        assert!(set.is_empty());
        assert!(set.provenance().is_empty());
        assert_eq!(set.routing().route, Route::Hybrid);
    }
}
