//! Cleanup of repetitive model output

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use tracing::debug;

/// Lines at most this long are only removed when repeated exactly
const MIN_FUZZY_LINE_CHARS: usize = 10;

/// Word-set Jaccard similarity above which a line counts as a repeat
const SIMILARITY_CUTOFF: f64 = 0.8;

/// Returned when cleaning leaves nothing
pub const EMPTY_ANSWER: &str = "No response generated.";

static BLANK_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n\s*\n\s*\n+").unwrap());

/// Jaccard similarity of the lowercase word sets of two lines
fn similarity(a: &str, b: &str) -> f64 {
    let words = |s: &str| -> HashSet<String> {
        s.split_whitespace().map(str::to_lowercase).collect()
    };
    let (a, b) = (words(a), words(b));
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    a.intersection(&b).count() as f64 / a.union(&b).count() as f64
}

/// Drop lines that repeat an earlier line exactly or nearly
fn remove_repetition(text: &str) -> String {
    let mut kept: Vec<&str> = Vec::new();
    let mut seen: Vec<&str> = Vec::new();
    let mut removed = 0;

    for line in text.lines().map(str::trim) {
        if line.is_empty() {
            kept.push(line);
            continue;
        }

        let long = line.chars().count() > MIN_FUZZY_LINE_CHARS;
        let repeated = seen.iter().any(|prev| {
            *prev == line
                || (long
                    && prev.chars().count() > MIN_FUZZY_LINE_CHARS
                    && similarity(line, prev) > SIMILARITY_CUTOFF)
        });

        if repeated {
            removed += 1;
        } else {
            kept.push(line);
            seen.push(line);
        }
    }

    if removed > 0 {
        debug!("Removed {} repeated lines from answer", removed);
    }
    kept.join("\n")
}

/// Remove repeated lines, collapse blank runs and trim
pub fn clean_response(text: &str) -> String {
    let cleaned = remove_repetition(text);
    let cleaned = BLANK_RUNS.replace_all(&cleaned, "\n\n");
    let cleaned = cleaned.trim();

    if cleaned.is_empty() {
        EMPTY_ANSWER.to_string()
    } else {
        cleaned.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_and_near_duplicates_removed() {
        let text = "This is the only mission where you can help John or go back for the money.\n\
                    This is the only mission where you can help John or go back for the money.\n\
                    This is some unique content.\n\
                    this is the only mission where you can help john or go back for the money!";

        assert_eq!(
            clean_response(text),
            "This is the only mission where you can help John or go back for the money.\n\
             This is some unique content."
        );
    }

    #[test]
    fn test_short_lines_only_exact() {
        let text = "- Yes\n- yes\n- Yes";
        assert_eq!(clean_response(text), "- Yes\n- yes");
    }

    #[test]
    fn test_blank_runs_collapse() {
        let text = "\n\n# Horses\n\n\n\nThe Arabian is fastest.\n   \n\n";
        assert_eq!(clean_response(text), "# Horses\n\nThe Arabian is fastest.");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(clean_response("  \n "), EMPTY_ANSWER);
    }

    #[test]
    fn test_similarity() {
        assert_eq!(similarity("a b c", "A B C"), 1.0);
        assert_eq!(similarity("a b", "c d"), 0.0);
        assert_eq!(similarity("", "a"), 0.0);
    }
}
