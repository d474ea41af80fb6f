//! Retrieval strategy selection from first-pass local results

use crate::evidence::EvidenceItem;
use crate::query::Query;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Which retrieval sources feed the evidence set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Route {
    LocalOnly,
    WebOnly,
    Hybrid,
}

impl Route {
    /// Whether local evidence is part of the fused set
    pub fn uses_local(self) -> bool {
        matches!(self, Self::LocalOnly | Self::Hybrid)
    }

    /// Whether a web search must be issued
    pub fn requires_web(self) -> bool {
        matches!(self, Self::WebOnly | Self::Hybrid)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LocalOnly => write!(f, "LOCAL_ONLY"),
            Self::WebOnly => write!(f, "WEB_ONLY"),
            Self::Hybrid => write!(f, "HYBRID"),
        }
    }
}

/// A routing decision and the numbers behind it
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoutingDecision {
    pub route: Route,
    /// Smallest local distance, absent when there were no local candidates
    pub best_score: Option<f64>,
    /// Threshold the best score was compared against
    pub threshold: f64,
}

/// Decides between local-only, web-only and hybrid retrieval
#[derive(Debug, Clone, Copy)]
pub struct QueryClassifier {
    threshold: f64,
}

impl Default for QueryClassifier {
    fn default() -> Self {
        Self::new(crate::DEFAULT_SIMILARITY_THRESHOLD)
    }
}

impl QueryClassifier {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Classify a query given the mandatory first-pass local search.
    ///
    /// No candidates routes to the web; a best distance at or under the threshold keeps the
    /// query local; anything else merges both sources.
    pub fn classify(&self, query: &Query, local: &[EvidenceItem]) -> RoutingDecision {
        let decision = if local.is_empty() {
            RoutingDecision {
                route: Route::WebOnly,
                best_score: None,
                threshold: self.threshold,
            }
        } else {
            let best = local
                .iter()
                .map(|item| item.score)
                .fold(f64::INFINITY, f64::min);
            let route = if best <= self.threshold {
                Route::LocalOnly
            } else {
                Route::Hybrid
            };
            RoutingDecision {
                route,
                best_score: Some(best),
                threshold: self.threshold,
            }
        };

        debug!(
            "Query {} routed {} (best={:?}, threshold={})",
            query.id(),
            decision.route,
            decision.best_score,
            decision.threshold
        );

        decision
    }
}
