//! Traced question-answering pipeline.
//!
//! [`FinanceAgent`] runs the same chunk → retrieve → generate steps as the
//! plain pipeline ([`answer_with_rag`]) but records a human-readable trace
//! entry per step. The pipeline is strictly linear — no branching, no
//! planning — and terminates on completion or at the first failure. A
//! failure surfaces the originating error together with whatever trace
//! accumulated before it.

use std::path::PathBuf;
use thiserror::Error;
use tracing::info;

use crate::chunk::load_and_chunk;
use crate::config::ChunkingConfig;
use crate::error::{RagError, Result};
use crate::generate::AnswerGenerator;
use crate::retriever::Retriever;

/// Outcome of one successful agent run.
#[derive(Debug)]
pub struct AgentRun {
    pub question: String,
    pub answer: String,
    pub retrieved_chunks: Vec<String>,
    /// Ordered step descriptions accumulated during the run.
    pub trace: Vec<String>,
}

/// A failed run: the originating error plus the partial trace, kept for
/// diagnostics rather than silently discarded.
#[derive(Debug, Error)]
#[error("agent run failed: {source}")]
pub struct AgentFailure {
    pub trace: Vec<String>,
    #[source]
    pub source: RagError,
}

/// Linear pipeline wrapper: chunk → retrieve → generate, with tracing.
///
/// Dependencies are injected at construction; the retriever and generator
/// are owned for the agent's lifetime.
pub struct FinanceAgent {
    doc_path: PathBuf,
    chunking: ChunkingConfig,
    retriever: Retriever,
    generator: Box<dyn AnswerGenerator>,
    top_k: usize,
}

impl FinanceAgent {
    pub fn new(
        doc_path: PathBuf,
        chunking: ChunkingConfig,
        retriever: Retriever,
        generator: Box<dyn AnswerGenerator>,
        top_k: usize,
    ) -> Self {
        Self {
            doc_path,
            chunking,
            retriever,
            generator,
            top_k,
        }
    }

    /// Run the full pipeline for one question.
    ///
    /// The document is loaded, chunked, and indexed from scratch on every
    /// call; no state survives between questions.
    pub async fn run(&mut self, question: &str) -> std::result::Result<AgentRun, AgentFailure> {
        let mut trace = Vec::new();

        trace.push("Step 1: loading and chunking the document".to_string());
        let chunks = match load_and_chunk(&self.doc_path, &self.chunking) {
            Ok(chunks) => chunks,
            Err(source) => return Err(AgentFailure { trace, source }),
        };
        trace.push(format!("Chunked into {} segments", chunks.len()));
        info!(chunks = chunks.len(), "document chunked");

        trace.push("Step 2: retrieving relevant context".to_string());
        let retrieved = match self.build_and_retrieve(&chunks, question).await {
            Ok(retrieved) => retrieved,
            Err(source) => return Err(AgentFailure { trace, source }),
        };
        trace.push(format!("Retrieved top {} relevant chunks", retrieved.len()));
        info!(retrieved = retrieved.len(), "context retrieved");

        trace.push("Step 3: generating answer from retrieved chunks".to_string());
        let answer = match self.generator.generate(question, &retrieved).await {
            Ok(answer) => answer,
            Err(source) => return Err(AgentFailure { trace, source }),
        };
        trace.push("Answer generated".to_string());

        Ok(AgentRun {
            question: question.to_string(),
            answer,
            retrieved_chunks: retrieved,
            trace,
        })
    }

    async fn build_and_retrieve(
        &mut self,
        chunks: &[String],
        question: &str,
    ) -> Result<Vec<String>> {
        self.retriever.build_index(chunks).await?;
        self.retriever.retrieve(question, self.top_k).await
    }
}

/// The direct retrieve-then-generate pipeline the agent is compared
/// against: same steps, no trace. Assumes the retriever's index is
/// already built.
pub async fn answer_with_rag(
    retriever: &Retriever,
    generator: &dyn AnswerGenerator,
    question: &str,
    k: usize,
) -> Result<String> {
    let retrieved = retriever.retrieve(question, k).await?;
    generator.generate(question, &retrieved).await
}
