//! Prompt templates for the reasoning stages

use crate::evidence::EvidenceSet;
use std::fmt::Write;

/// Prompt for the ANALYZE stage
pub fn analysis_prompt(domain: &str, question: &str) -> String {
    format!(
        "You analyze questions about {domain}.\n\n\
         The user has asked: '{question}'\n\n\
         Determine:\n\
         1. What type of information is needed (gameplay mechanics, locations, items, strategies, lore)\n\
         2. How comprehensive the answer should be (brief tip or detailed guide)\n\
         3. Which specific aspects should be researched\n\n\
         Reply with a short plan listing the main topics to focus on, the key details to include \
         and the appropriate level of detail."
    )
}

/// Prompt for the SYNTHESIZE stage.
///
/// Evidence is numbered in fused order and tagged with its source reference.
pub fn synthesis_prompt(
    domain: &str,
    question: &str,
    analysis: &str,
    evidence: &EvidenceSet,
) -> String {
    let mut prompt = format!(
        "You write answers about {domain} for players.\n\n\
         Question: '{question}'\n\n\
         Analysis:\n{}\n\n",
        analysis.trim()
    );

    if evidence.is_empty() {
        prompt.push_str(
            "No evidence was found for this question. Say plainly that you could not find \
             information about it and do not guess.\n",
        );
        return prompt;
    }

    prompt.push_str("Evidence:\n");
    for (i, item) in evidence.iter().enumerate() {
        let _ = writeln!(prompt, "[{}] ({}) {}", i + 1, item.provenance(), item.content.trim());
    }

    prompt.push_str(
        "\nAnswer the question using only the evidence above. If the evidence does not cover \
         the question, say so. Keep it concise, use markdown headings or bullet points where \
         they help, and do not mention the research process, sources or URLs.\n",
    );
    prompt
}
