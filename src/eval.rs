//! Evaluation support: eval-set loading and answer matching.
//!
//! An eval set is a JSON array of question/expected-answer pairs. A
//! generated answer counts as a match when the normalized expected answer
//! appears as a substring of the normalized generated answer —
//! normalization lowercases and strips commas, dollar signs, and
//! whitespace so "$45,687" matches "45687 million".

use serde::Deserialize;
use std::path::Path;

use crate::error::Result;

/// One question/expected-answer pair from an eval set.
#[derive(Debug, Clone, Deserialize)]
pub struct EvalCase {
    pub question: String,
    pub expected_answer: String,
}

/// Load an eval set from a JSON file.
pub fn load_eval_set(path: &Path) -> Result<Vec<EvalCase>> {
    let content = std::fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(|e| {
        crate::error::RagError::InvalidConfiguration(format!(
            "failed to parse eval set {}: {}",
            path.display(),
            e
        ))
    })
}

/// Lowercase and strip commas, dollar signs, and whitespace.
pub fn normalize(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .filter(|c| *c != ',' && *c != '$' && !c.is_whitespace())
        .collect()
}

/// Whether the normalized expected answer occurs in the normalized answer.
pub fn is_match(answer: &str, expected: &str) -> bool {
    normalize(answer).contains(&normalize(expected))
}
