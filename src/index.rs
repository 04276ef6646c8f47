//! Exact brute-force vector index over squared Euclidean distance.
//!
//! Owns the full set of embedding vectors plus a parallel ordered list of
//! the chunk texts they were produced from. Built fresh per document load;
//! optionally persisted as two co-located artifacts:
//!
//! - `vectors.bin` — count/dims header followed by little-endian f32 data
//! - `chunks.json` — the parallel chunk text labels
//!
//! The two files must be loaded together; a reload reproduces identical
//! search results for identical queries.

use std::path::Path;

use crate::error::{RagError, Result};

const VECTORS_FILE: &str = "vectors.bin";
const CHUNKS_FILE: &str = "chunks.json";

/// In-memory flat index: parallel vectors and chunk texts.
#[derive(Debug, Default)]
pub struct VectorIndex {
    dims: usize,
    vectors: Vec<Vec<f32>>,
    texts: Vec<String>,
}

impl VectorIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store vectors and their parallel text labels, replacing any prior
    /// contents.
    ///
    /// # Errors
    ///
    /// - `EmptyIndex` if `vectors` is empty (no distance search possible).
    /// - `InvalidConfiguration` if `vectors` and `texts` are not parallel.
    /// - `DimensionMismatch` if the vectors are ragged.
    pub fn build(&mut self, vectors: Vec<Vec<f32>>, texts: Vec<String>) -> Result<()> {
        if vectors.is_empty() {
            return Err(RagError::EmptyIndex);
        }
        if vectors.len() != texts.len() {
            return Err(RagError::InvalidConfiguration(format!(
                "vectors ({}) and texts ({}) must be parallel",
                vectors.len(),
                texts.len()
            )));
        }

        let dims = vectors[0].len();
        for v in &vectors {
            if v.len() != dims {
                return Err(RagError::DimensionMismatch {
                    expected: dims,
                    actual: v.len(),
                });
            }
        }

        self.dims = dims;
        self.vectors = vectors;
        self.texts = texts;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    pub fn dims(&self) -> usize {
        self.dims
    }

    /// The indexed chunk texts, in insertion order.
    pub fn texts(&self) -> &[String] {
        &self.texts
    }

    /// The stored vector at `i`.
    pub fn vector(&self, i: usize) -> &[f32] {
        &self.vectors[i]
    }

    /// Exact k-nearest-neighbor search by squared Euclidean distance.
    ///
    /// Returns up to `min(k, len)` `(index, distance)` pairs in ascending
    /// distance order, ties broken by ascending insertion index.
    ///
    /// # Errors
    ///
    /// - `EmptyIndex` if nothing has been indexed.
    /// - `DimensionMismatch` if the query dimensionality differs from the
    ///   indexed vectors.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<(usize, f32)>> {
        if self.vectors.is_empty() {
            return Err(RagError::EmptyIndex);
        }
        if query.len() != self.dims {
            return Err(RagError::DimensionMismatch {
                expected: self.dims,
                actual: query.len(),
            });
        }

        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(i, v)| (i, squared_l2(query, v)))
            .collect();

        scored.sort_by(|a, b| {
            a.1.partial_cmp(&b.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });
        scored.truncate(k.min(scored.len()));

        Ok(scored)
    }

    /// Persist the index as `vectors.bin` + `chunks.json` under `dir`.
    pub fn save(&self, dir: &Path) -> Result<()> {
        if self.vectors.is_empty() {
            return Err(RagError::EmptyIndex);
        }

        std::fs::create_dir_all(dir)?;

        let mut blob = Vec::with_capacity(16 + self.vectors.len() * self.dims * 4);
        blob.extend_from_slice(&(self.vectors.len() as u64).to_le_bytes());
        blob.extend_from_slice(&(self.dims as u64).to_le_bytes());
        for vector in &self.vectors {
            for &v in vector {
                blob.extend_from_slice(&v.to_le_bytes());
            }
        }
        std::fs::write(dir.join(VECTORS_FILE), blob)?;

        let labels = serde_json::to_string(&self.texts).map_err(|e| {
            RagError::MalformedPersistedIndex(format!("failed to serialize labels: {}", e))
        })?;
        std::fs::write(dir.join(CHUNKS_FILE), labels)?;

        Ok(())
    }

    /// Load a previously saved index from `dir`.
    ///
    /// # Errors
    ///
    /// `MalformedPersistedIndex` if either artifact is missing, the binary
    /// blob is truncated, or the vector count disagrees with the label
    /// count.
    pub fn load(dir: &Path) -> Result<Self> {
        let vectors_path = dir.join(VECTORS_FILE);
        let chunks_path = dir.join(CHUNKS_FILE);

        if !vectors_path.exists() || !chunks_path.exists() {
            return Err(RagError::MalformedPersistedIndex(format!(
                "{} and {} must both be present in {}",
                VECTORS_FILE,
                CHUNKS_FILE,
                dir.display()
            )));
        }

        let blob = std::fs::read(&vectors_path)?;
        if blob.len() < 16 {
            return Err(RagError::MalformedPersistedIndex(
                "vector blob shorter than header".to_string(),
            ));
        }

        let count = u64::from_le_bytes(blob[0..8].try_into().unwrap()) as usize;
        let dims = u64::from_le_bytes(blob[8..16].try_into().unwrap()) as usize;

        // Header values are untrusted; a corrupt file must not wrap the
        // length arithmetic into a value that passes the check below.
        let expected_len = count
            .checked_mul(dims)
            .and_then(|n| n.checked_mul(4))
            .and_then(|n| n.checked_add(16))
            .ok_or_else(|| {
                RagError::MalformedPersistedIndex(format!(
                    "vector count ({}) times dims ({}) overflows",
                    count, dims
                ))
            })?;
        if blob.len() != expected_len {
            return Err(RagError::MalformedPersistedIndex(format!(
                "vector blob is {} bytes, expected {} for {} vectors of {} dims",
                blob.len(),
                expected_len,
                count,
                dims
            )));
        }

        let mut vectors = Vec::with_capacity(count);
        for i in 0..count {
            let start = 16 + i * dims * 4;
            let vector: Vec<f32> = blob[start..start + dims * 4]
                .chunks_exact(4)
                .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
                .collect();
            vectors.push(vector);
        }

        let labels_raw = std::fs::read_to_string(&chunks_path)?;
        let texts: Vec<String> = serde_json::from_str(&labels_raw).map_err(|e| {
            RagError::MalformedPersistedIndex(format!("unreadable label list: {}", e))
        })?;

        if texts.len() != count {
            return Err(RagError::MalformedPersistedIndex(format!(
                "label count ({}) does not match vector count ({})",
                texts.len(),
                count
            )));
        }

        let mut index = Self::new();
        index.build(vectors, texts)?;
        Ok(index)
    }
}

/// Squared Euclidean distance between two equal-length vectors.
fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_index(vectors: Vec<Vec<f32>>) -> VectorIndex {
        let texts = (0..vectors.len()).map(|i| format!("chunk {}", i)).collect();
        let mut index = VectorIndex::new();
        index.build(vectors, texts).unwrap();
        index
    }

    #[test]
    fn test_build_empty_rejected() {
        let mut index = VectorIndex::new();
        let err = index.build(Vec::new(), Vec::new()).unwrap_err();
        assert!(matches!(err, RagError::EmptyIndex));
    }

    #[test]
    fn test_build_non_parallel_rejected() {
        let mut index = VectorIndex::new();
        let err = index
            .build(vec![vec![1.0, 2.0]], vec!["a".to_string(), "b".to_string()])
            .unwrap_err();
        assert!(matches!(err, RagError::InvalidConfiguration(_)));
    }

    #[test]
    fn test_build_ragged_dims_rejected() {
        let mut index = VectorIndex::new();
        let err = index
            .build(
                vec![vec![1.0, 2.0], vec![1.0]],
                vec!["a".to_string(), "b".to_string()],
            )
            .unwrap_err();
        assert!(matches!(
            err,
            RagError::DimensionMismatch {
                expected: 2,
                actual: 1
            }
        ));
    }

    #[test]
    fn test_build_replaces_prior_contents() {
        let mut index = build_index(vec![vec![0.0, 0.0], vec![1.0, 1.0]]);
        index
            .build(vec![vec![5.0, 5.0]], vec!["only".to_string()])
            .unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(index.texts(), ["only".to_string()]);
    }

    #[test]
    fn test_search_before_build_fails() {
        let index = VectorIndex::new();
        let err = index.search(&[1.0, 2.0], 3).unwrap_err();
        assert!(matches!(err, RagError::EmptyIndex));
    }

    #[test]
    fn test_search_dimension_mismatch() {
        let index = build_index(vec![vec![0.0, 0.0]]);
        let err = index.search(&[1.0, 2.0, 3.0], 1).unwrap_err();
        assert!(matches!(
            err,
            RagError::DimensionMismatch {
                expected: 2,
                actual: 3
            }
        ));
    }

    #[test]
    fn test_search_ascending_distance() {
        let index = build_index(vec![
            vec![10.0, 0.0],
            vec![1.0, 0.0],
            vec![5.0, 0.0],
        ]);
        let results = index.search(&[0.0, 0.0], 3).unwrap();
        let order: Vec<usize> = results.iter().map(|(i, _)| *i).collect();
        assert_eq!(order, vec![1, 2, 0]);
        assert!(results.windows(2).all(|w| w[0].1 <= w[1].1));
    }

    #[test]
    fn test_search_returns_min_k_n() {
        let index = build_index(vec![vec![0.0], vec![1.0]]);
        assert_eq!(index.search(&[0.0], 5).unwrap().len(), 2);
        assert_eq!(index.search(&[0.0], 1).unwrap().len(), 1);
    }

    #[test]
    fn test_indexed_vector_is_its_own_nearest_neighbor() {
        let index = build_index(vec![vec![3.0, 4.0], vec![1.0, 1.0], vec![-2.0, 0.5]]);
        let results = index.search(&[1.0, 1.0], 1).unwrap();
        assert_eq!(results[0].0, 1);
        assert_eq!(results[0].1, 0.0);
    }

    #[test]
    fn test_ties_broken_by_insertion_order() {
        // Two vectors equidistant from the query; the earlier-inserted one
        // must rank first.
        let index = build_index(vec![vec![1.0, 0.0], vec![-1.0, 0.0], vec![0.0, 1.0]]);
        let results = index.search(&[0.0, 0.0], 3).unwrap();
        let order: Vec<usize> = results.iter().map(|(i, _)| *i).collect();
        assert_eq!(order, vec![0, 1, 2]);
    }

    #[test]
    fn test_save_load_roundtrip_identical_results() {
        let dir = tempfile::tempdir().unwrap();
        let index = build_index(vec![
            vec![0.25, -1.5, 3.0],
            vec![2.0, 2.0, 2.0],
            vec![-0.001, 0.0, 1.0],
        ]);
        index.save(dir.path()).unwrap();

        let restored = VectorIndex::load(dir.path()).unwrap();
        assert_eq!(restored.len(), index.len());
        assert_eq!(restored.dims(), index.dims());
        assert_eq!(restored.texts(), index.texts());

        let query = [0.1, 0.1, 0.1];
        assert_eq!(
            index.search(&query, 3).unwrap(),
            restored.search(&query, 3).unwrap()
        );
    }

    #[test]
    fn test_load_requires_both_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let index = build_index(vec![vec![1.0, 2.0]]);
        index.save(dir.path()).unwrap();

        std::fs::remove_file(dir.path().join(CHUNKS_FILE)).unwrap();
        let err = VectorIndex::load(dir.path()).unwrap_err();
        assert!(matches!(err, RagError::MalformedPersistedIndex(_)));
    }

    #[test]
    fn test_load_rejects_truncated_blob() {
        let dir = tempfile::tempdir().unwrap();
        let index = build_index(vec![vec![1.0, 2.0], vec![3.0, 4.0]]);
        index.save(dir.path()).unwrap();

        let blob = std::fs::read(dir.path().join(VECTORS_FILE)).unwrap();
        std::fs::write(dir.path().join(VECTORS_FILE), &blob[..blob.len() - 4]).unwrap();

        let err = VectorIndex::load(dir.path()).unwrap_err();
        assert!(matches!(err, RagError::MalformedPersistedIndex(_)));
    }

    #[test]
    fn test_load_rejects_overflowing_header() {
        // A header claiming u64::MAX vectors must fail the length check
        // cleanly instead of wrapping the expected-size arithmetic.
        let dir = tempfile::tempdir().unwrap();
        let mut blob = Vec::new();
        blob.extend_from_slice(&u64::MAX.to_le_bytes());
        blob.extend_from_slice(&2u64.to_le_bytes());
        std::fs::write(dir.path().join(VECTORS_FILE), blob).unwrap();
        std::fs::write(dir.path().join(CHUNKS_FILE), "[]").unwrap();

        let err = VectorIndex::load(dir.path()).unwrap_err();
        assert!(matches!(err, RagError::MalformedPersistedIndex(_)));
    }

    #[test]
    fn test_load_rejects_label_count_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let index = build_index(vec![vec![1.0], vec![2.0]]);
        index.save(dir.path()).unwrap();

        std::fs::write(dir.path().join(CHUNKS_FILE), r#"["only one"]"#).unwrap();
        let err = VectorIndex::load(dir.path()).unwrap_err();
        assert!(matches!(err, RagError::MalformedPersistedIndex(_)));
    }
}
