//! Error taxonomy for the retrieval pipeline.
//!
//! Every failure mode the library can produce is represented here as a
//! distinct variant, so callers can tell a misconfigured chunker apart from
//! a network timeout or a corrupt persisted index. Nothing is swallowed:
//! all variants propagate to the caller of the retriever or agent.

use thiserror::Error;

/// Errors produced by the chunking, embedding, indexing, and retrieval layers.
#[derive(Debug, Error)]
pub enum RagError {
    /// Parameters that would make the pipeline loop forever or produce
    /// empty windows (e.g. `overlap >= chunk_size`).
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A search was attempted before a successful build, or a build was
    /// attempted with zero vectors.
    #[error("vector index is empty; build it before searching")]
    EmptyIndex,

    /// Query vector dimensionality differs from the indexed vectors.
    #[error("dimension mismatch: index has {expected} dims, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// A remote embedding or generation call exceeded its deadline.
    /// Not retried automatically; retry policy belongs to the caller.
    #[error("{service} call timed out after {timeout_secs}s")]
    UpstreamTimeout { service: String, timeout_secs: u64 },

    /// A remote embedding or generation call failed for a reason other
    /// than a timeout (network error, non-success status, bad payload).
    #[error("{service} call failed: {message}")]
    UpstreamFailure { service: String, message: String },

    /// A persisted index could not be loaded: missing companion artifact,
    /// mismatched vector/label counts, or unreadable binary content.
    #[error("malformed persisted index: {0}")]
    MalformedPersistedIndex(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RagError>;
