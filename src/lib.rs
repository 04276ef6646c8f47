//! # finrag
//!
//! Retrieval-augmented question answering over financial reports.
//!
//! finrag retrieves relevant passages from a plain-text financial report
//! and composes a prompt for a language model to answer a natural-language
//! question about it. Two pipelines perform the same steps: a direct
//! retrieve-then-generate flow, and an agent wrapper that records a
//! step-by-step explanation trace.
//!
//! ## Pipeline
//!
//! ```text
//! report.txt ──▶ chunk ──▶ annotate ──▶ embed ──▶ VectorIndex
//!                                                     │
//! question ──▶ embed ──▶ quarter filter ──▶ k-NN search
//!                                                     │
//!                                          top-k chunks ──▶ generate
//! ```
//!
//! Chunks are overlapping word windows; dollar amounts are rewritten with
//! explicit scale markers before indexing; search is exact squared-L2
//! nearest neighbors. Queries naming a fiscal quarter are first narrowed
//! lexically to chunks that also name one (see [`retriever`]).
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`error`] | Error taxonomy |
//! | [`chunk`] | Overlapping word-window chunking |
//! | [`annotate`] | Currency-scale annotation |
//! | [`embedding`] | Embedding provider abstraction (local, OpenAI) |
//! | [`index`] | Brute-force vector index with save/load |
//! | [`retriever`] | Quarter-aware retrieval orchestration |
//! | [`generate`] | Prompt composition and answer generation |
//! | [`agent`] | Traced linear pipeline |
//! | [`eval`] | Eval-set loading and answer matching |

pub mod agent;
pub mod annotate;
pub mod chunk;
pub mod config;
pub mod embedding;
pub mod error;
pub mod eval;
pub mod generate;
pub mod index;
pub mod retriever;
