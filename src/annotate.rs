//! Currency-scale annotator for financial report chunks.
//!
//! Quarterly reports mix scales freely: "$900 billion" next to a bare
//! "$500" that the surrounding table implies is in millions. Embedding
//! models treat both as similar tokens, so chunks are rewritten before
//! indexing to carry an explicit unit marker.
//!
//! The bare-dollar rule assumes unqualified figures are reported in
//! millions. That is a heuristic, not an inference — a bare figure could
//! equally be in thousands or billions, and nothing in the text
//! disambiguates it. Downstream consumers must treat the "million USD"
//! marker as best-effort.

use regex::{Captures, Regex};
use std::sync::LazyLock;

// Matches "$<number> billion", optionally already tagged with USD so a
// second pass leaves annotated text untouched.
static BILLION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\$(\d+(?:,\d{3})*(?:\.\d+)?)\s+billion(\s+USD)?").unwrap()
});

// Matches any dollar amount with an optional trailing scale word and
// optional USD tag. Whatever is missing gets filled in.
static DOLLAR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$(\d+(?:,\d{3})*(?:\.\d+)?)(?:\s+((?i:million|billion)))?(?:\s+USD)?").unwrap()
});

/// Rewrite dollar amounts in a chunk to an unambiguous canonical form.
///
/// `$3.2 billion` becomes `$3.2 billion USD`; any remaining bare `$500`
/// becomes `$500 million USD` (assumed reporting scale, see module docs).
/// The billion pass runs first so billion amounts are never re-tagged as
/// millions. Idempotent: annotating already-annotated text is a no-op.
/// Non-dollar content passes through unchanged.
pub fn annotate(chunk: &str) -> String {
    let pass1 = BILLION_RE.replace_all(chunk, |caps: &Captures| {
        format!("${} billion USD", &caps[1])
    });

    DOLLAR_RE
        .replace_all(&pass1, |caps: &Captures| {
            let unit = caps
                .get(2)
                .map(|m| m.as_str().to_lowercase())
                .unwrap_or_else(|| "million".to_string());
            format!("${} {} USD", &caps[1], unit)
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_billion_amount_tagged() {
        assert_eq!(
            annotate("Revenue was $900 billion this year."),
            "Revenue was $900 billion USD this year."
        );
    }

    #[test]
    fn test_bare_dollar_assumed_millions() {
        assert_eq!(
            annotate("Net sales reached $500."),
            "Net sales reached $500 million USD."
        );
    }

    #[test]
    fn test_billion_not_double_annotated() {
        // The generic pass must not append "million USD" to an amount the
        // billion pass already tagged.
        let out = annotate("Cash of $3.2 billion remained.");
        assert_eq!(out, "Cash of $3.2 billion USD remained.");
        assert!(!out.contains("million"));
    }

    #[test]
    fn test_idempotent() {
        let once = annotate("Revenue in Q1 was $500. Revenue in Q3 was $900 billion.");
        let twice = annotate(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_case_insensitive_billion() {
        assert_eq!(annotate("about $12 Billion total"), "about $12 billion USD total");
    }

    #[test]
    fn test_commas_and_decimals() {
        assert_eq!(
            annotate("Operating income of $45,687 grew."),
            "Operating income of $45,687 million USD grew."
        );
        assert_eq!(annotate("roughly $1.5"), "roughly $1.5 million USD");
    }

    #[test]
    fn test_existing_million_gains_usd_only() {
        assert_eq!(
            annotate("a charge of $20 million was recorded"),
            "a charge of $20 million USD was recorded"
        );
    }

    #[test]
    fn test_non_dollar_text_unchanged() {
        let text = "Headcount grew 12% to 45,000 employees in fiscal 2016.";
        assert_eq!(annotate(text), text);
    }

    #[test]
    fn test_multiple_amounts_in_one_chunk() {
        let out = annotate("Q1 revenue $500 versus Q3 revenue $900 billion.");
        assert!(out.contains("$500 million USD"));
        assert!(out.contains("$900 billion USD"));
    }
}
