//! Evidence type definitions

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a piece of evidence came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Local,
    Web,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => write!(f, "local"),
            Self::Web => write!(f, "web"),
        }
    }
}

/// One retrieved fact.
///
/// `score` is lower-is-better for both sources, but the scales differ: local scores are
/// embedding distances, web scores are the provider's 1-based rank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceItem {
    /// Retrieved text
    pub content: String,
    /// Source kind
    pub source: SourceKind,
    /// Distance (local) or rank (web)
    pub score: f64,
    /// Corpus document id or URL
    pub origin: String,
}

impl EvidenceItem {
    /// Create a local knowledge item
    pub fn local(content: impl Into<String>, distance: f64, doc_id: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            source: SourceKind::Local,
            score: distance,
            origin: doc_id.into(),
        }
    }

    /// Create a web snippet item
    pub fn web(content: impl Into<String>, rank: u32, url: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            source: SourceKind::Web,
            score: rank as f64,
            origin: url.into(),
        }
    }

    /// Content key used for deduplication
    pub fn dedup_key(&self) -> String {
        normalize_text(&self.content)
    }

    /// Source reference for this item
    pub fn provenance(&self) -> Provenance {
        Provenance {
            source: self.source,
            reference: self.origin.clone(),
        }
    }
}

/// A source reference justifying an answer
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Provenance {
    /// Source kind
    pub source: SourceKind,
    /// Corpus document id or URL
    pub reference: String,
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.source, self.reference)
    }
}

/// Lowercase and collapse all whitespace runs to single spaces
pub fn normalize_text(text: &str) -> String {
    text.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}
