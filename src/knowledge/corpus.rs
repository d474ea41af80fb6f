//! Curated knowledge corpus loading

use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Separator between knowledge blocks inside a file
pub const BLOCK_SEPARATOR: &str = "---";

/// One curated knowledge block
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Document {
    /// Stable id, `doc_<n>` in load order
    pub id: String,
    /// Trimmed block text
    pub text: String,
}

/// The curated knowledge documents
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    documents: Vec<Document>,
}

impl Corpus {
    /// Build a corpus from raw blocks, dropping those shorter than `min_chars` once trimmed
    pub fn from_blocks<I, S>(blocks: I, min_chars: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let documents = blocks
            .into_iter()
            .map(|b| b.as_ref().trim().to_string())
            .filter(|b| b.chars().count() >= min_chars)
            .enumerate()
            .map(|(i, text)| Document {
                id: format!("doc_{}", i),
                text,
            })
            .collect();

        Self { documents }
    }

    /// Load every `.txt` file in `dir`, in file name order.
    ///
    /// A missing directory yields an empty corpus.
    pub fn load_dir(dir: impl AsRef<Path>, min_chars: usize) -> Result<Self> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            warn!("Knowledge directory {} not found", dir.display());
            return Ok(Self::default());
        }

        let mut files: Vec<_> = fs::read_dir(dir)
            .with_context(|| format!("Failed to read knowledge directory {}", dir.display()))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && p.extension().map_or(false, |ext| ext == "txt"))
            .collect();
        files.sort();

        let mut blocks = Vec::new();
        for file in &files {
            let content = fs::read_to_string(file)
                .with_context(|| format!("Failed to read knowledge file {}", file.display()))?;
            blocks.extend(content.split(BLOCK_SEPARATOR).map(str::to_string));
        }

        let corpus = Self::from_blocks(&blocks, min_chars);
        info!(
            "Loaded {} knowledge blocks from {} files in {}",
            corpus.len(),
            files.len(),
            dir.display()
        );

        Ok(corpus)
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_blocks_filters_short() {
        let corpus = Corpus::from_blocks(
            [
                "  Arthur Morgan is the protagonist.  ",
                "short",
                "",
                "John Marston returns in the epilogue.",
            ],
            20,
        );

        assert_eq!(corpus.len(), 2);
        assert_eq!(corpus.documents()[0].id, "doc_0");
        assert_eq!(corpus.documents()[0].text, "Arthur Morgan is the protagonist.");
        assert_eq!(corpus.documents()[1].id, "doc_1");
    }

    #[test]
    fn test_load_dir_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("b_horses.txt"),
            "The Arabian is the fastest horse.\n---\nHorses bond with the rider over time.",
        )
        .unwrap();
        fs::write(
            dir.path().join("a_story.txt"),
            "Chapter one starts in the snowy mountains.\n---\ntiny",
        )
        .unwrap();
        fs::write(dir.path().join("notes.md"), "Not a knowledge file at all, ignored.").unwrap();

        let corpus = Corpus::load_dir(dir.path(), 20).unwrap();
        let texts: Vec<&str> = corpus.documents().iter().map(|d| d.text.as_str()).collect();

        assert_eq!(
            texts,
            vec![
                "Chapter one starts in the snowy mountains.",
                "The Arabian is the fastest horse.",
                "Horses bond with the rider over time.",
            ]
        );
        assert_eq!(corpus.documents()[2].id, "doc_2");
    }

    #[test]
    fn test_missing_dir_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let corpus = Corpus::load_dir(dir.path().join("missing"), 20).unwrap();
        assert!(corpus.is_empty());
    }
}
