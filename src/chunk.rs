//! Overlapping word-window chunker.
//!
//! Splits document text on whitespace and emits windows of `chunk_size`
//! consecutive words, each window starting `chunk_size - overlap` words
//! after the previous one. The final window may be shorter. Overlap keeps
//! figures that straddle a window boundary retrievable from both sides.

use std::path::Path;

use crate::config::ChunkingConfig;
use crate::error::{RagError, Result};

/// Split text into overlapping word windows, rejoined with single spaces.
///
/// Consecutive window start offsets advance by `chunk_size - overlap`
/// words. Returns an empty vec for text with no words.
///
/// # Errors
///
/// `InvalidConfiguration` if `chunk_size` is zero or `overlap >= chunk_size`
/// (the advance step would be <= 0 and the loop would never terminate).
pub fn chunk_text(text: &str, chunk_size: usize, overlap: usize) -> Result<Vec<String>> {
    if chunk_size == 0 {
        return Err(RagError::InvalidConfiguration(
            "chunk_size must be > 0".to_string(),
        ));
    }
    if overlap >= chunk_size {
        return Err(RagError::InvalidConfiguration(format!(
            "overlap ({}) must be < chunk_size ({})",
            overlap, chunk_size
        )));
    }

    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return Ok(Vec::new());
    }

    let step = chunk_size - overlap;
    let mut chunks = Vec::new();
    let mut start = 0;

    while start < words.len() {
        let end = (start + chunk_size).min(words.len());
        chunks.push(words[start..end].join(" "));
        start += step;
    }

    Ok(chunks)
}

/// Read a UTF-8 text file in full and chunk it.
///
/// The document is treated as undifferentiated prose; no structural
/// parsing of headers or tables.
pub fn load_and_chunk(path: &Path, config: &ChunkingConfig) -> Result<Vec<String>> {
    let text = std::fs::read_to_string(path)?;
    chunk_text(&text, config.chunk_size, config.overlap)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words_of(s: &str) -> Vec<&str> {
        s.split_whitespace().collect()
    }

    #[test]
    fn test_short_text_single_chunk() {
        let chunks = chunk_text("alpha beta gamma", 10, 2).unwrap();
        assert_eq!(chunks, vec!["alpha beta gamma"]);
    }

    #[test]
    fn test_empty_text_no_chunks() {
        let chunks = chunk_text("", 500, 100).unwrap();
        assert!(chunks.is_empty());
        let chunks = chunk_text("   \n\t  ", 500, 100).unwrap();
        assert!(chunks.is_empty());
    }

    #[test]
    fn test_windows_overlap() {
        // 10 words, chunk_size=4, overlap=2 => starts at 0, 2, 4, 6, 8
        let text = "w0 w1 w2 w3 w4 w5 w6 w7 w8 w9";
        let chunks = chunk_text(text, 4, 2).unwrap();
        assert_eq!(chunks.len(), 5);
        assert_eq!(chunks[0], "w0 w1 w2 w3");
        assert_eq!(chunks[1], "w2 w3 w4 w5");
        assert_eq!(chunks[4], "w8 w9");
    }

    #[test]
    fn test_final_chunk_may_be_short() {
        let text = "a b c d e";
        let chunks = chunk_text(text, 3, 1).unwrap();
        assert_eq!(chunks, vec!["a b c", "c d e", "e"]);
    }

    #[test]
    fn test_invalid_overlap_rejected() {
        let err = chunk_text("a b c", 3, 3).unwrap_err();
        assert!(matches!(err, RagError::InvalidConfiguration(_)));
        let err = chunk_text("a b c", 3, 5).unwrap_err();
        assert!(matches!(err, RagError::InvalidConfiguration(_)));
    }

    #[test]
    fn test_zero_chunk_size_rejected() {
        assert!(chunk_text("a b c", 0, 0).is_err());
    }

    #[test]
    fn test_word_sequence_reconstruction() {
        // Concatenating the first `chunk_size - overlap` words of every
        // non-final chunk, plus the final chunk, reproduces the word
        // sequence exactly.
        let text = (0..137).map(|i| format!("w{}", i)).collect::<Vec<_>>().join(" ");
        let (chunk_size, overlap) = (20, 7);
        let chunks = chunk_text(&text, chunk_size, overlap).unwrap();

        let mut rebuilt: Vec<&str> = Vec::new();
        for chunk in &chunks[..chunks.len() - 1] {
            rebuilt.extend(words_of(chunk).into_iter().take(chunk_size - overlap));
        }
        rebuilt.extend(words_of(chunks.last().unwrap()));

        assert_eq!(rebuilt, words_of(&text));
    }

    #[test]
    fn test_chunk_count_matches_advance_step() {
        // One window per start offset in 0, step, 2*step, ... below the
        // word count, i.e. ceil(words / step) windows.
        for (len, chunk_size, overlap) in
            [(137usize, 20, 7), (500, 500, 100), (501, 500, 100), (9, 4, 2), (2, 4, 2)]
        {
            let text = (0..len).map(|i| format!("w{}", i)).collect::<Vec<_>>().join(" ");
            let chunks = chunk_text(&text, chunk_size, overlap).unwrap();
            let expected = len.div_ceil(chunk_size - overlap);
            assert_eq!(
                chunks.len(),
                expected,
                "len={} chunk_size={} overlap={}",
                len,
                chunk_size,
                overlap
            );
        }
    }

    #[test]
    fn test_text_no_longer_than_step_is_one_chunk() {
        let chunks = chunk_text("a b c", 4, 1).unwrap();
        assert_eq!(chunks.len(), 1);
    }

    #[test]
    fn test_load_and_chunk_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.txt");
        std::fs::write(&path, "Revenue was strong in the third quarter.").unwrap();

        let config = ChunkingConfig {
            chunk_size: 4,
            overlap: 1,
        };
        let chunks = load_and_chunk(&path, &config).unwrap();
        assert_eq!(chunks[0], "Revenue was strong in");
        assert!(chunks.len() > 1);
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let config = ChunkingConfig::default();
        let err = load_and_chunk(Path::new("/nonexistent/report.txt"), &config).unwrap_err();
        assert!(matches!(err, RagError::Io(_)));
    }
}
