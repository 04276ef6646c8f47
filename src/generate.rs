//! Answer generation over retrieved context.
//!
//! Composes a single prompt from the question and the retrieved chunk
//! texts, then hands it to an [`AnswerGenerator`] — an opaque
//! text-completion service. The shipped implementation calls the OpenAI
//! chat completions API; tests inject a deterministic fake.

use async_trait::async_trait;
use std::time::Duration;

use crate::config::GenerationConfig;
use crate::error::{RagError, Result};

/// A capability that turns a question plus retrieved context into a
/// text answer.
#[async_trait]
pub trait AnswerGenerator: Send + Sync {
    async fn generate(&self, question: &str, context: &[String]) -> Result<String>;
}

/// Compose the generation prompt: question plus newline-joined context.
pub fn compose_prompt(question: &str, context: &[String]) -> String {
    format!(
        "You are a financial analyst. Use the context below to answer the question. \
         Be concise and accurate.\n\n\
         Question: {}\n\n\
         Context:\n{}\n\n\
         Answer:",
        question,
        context.join("\n")
    )
}

/// Generator backed by `POST https://api.openai.com/v1/chat/completions`.
pub struct OpenAIGenerator {
    config: GenerationConfig,
    api_key: String,
    client: reqwest::Client,
}

impl OpenAIGenerator {
    /// Create a generator from configuration.
    ///
    /// # Errors
    ///
    /// `InvalidConfiguration` if `OPENAI_API_KEY` is not set.
    pub fn new(config: GenerationConfig) -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY").map_err(|_| {
            RagError::InvalidConfiguration("OPENAI_API_KEY environment variable not set".into())
        })?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| RagError::UpstreamFailure {
                service: "openai completions".to_string(),
                message: e.to_string(),
            })?;

        Ok(Self {
            config,
            api_key,
            client,
        })
    }
}

#[async_trait]
impl AnswerGenerator for OpenAIGenerator {
    async fn generate(&self, question: &str, context: &[String]) -> Result<String> {
        let prompt = compose_prompt(question, context);

        let body = serde_json::json!({
            "model": self.config.model,
            "messages": [{ "role": "user", "content": prompt }],
            "temperature": self.config.temperature,
            "max_tokens": self.config.max_tokens,
        });

        let response = self
            .client
            .post("https://api.openai.com/v1/chat/completions")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| classify(&self.config, e))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(RagError::UpstreamFailure {
                service: "openai completions".to_string(),
                message: format!("HTTP {}: {}", status, body_text),
            });
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| classify(&self.config, e))?;

        json.get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_str())
            .map(|s| s.trim().to_string())
            .ok_or_else(|| RagError::UpstreamFailure {
                service: "openai completions".to_string(),
                message: "response missing choices[0].message.content".to_string(),
            })
    }
}

fn classify(config: &GenerationConfig, e: reqwest::Error) -> RagError {
    if e.is_timeout() {
        RagError::UpstreamTimeout {
            service: "openai completions".to_string(),
            timeout_secs: config.timeout_secs,
        }
    } else {
        RagError::UpstreamFailure {
            service: "openai completions".to_string(),
            message: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_contains_question_and_context() {
        let context = vec!["chunk one".to_string(), "chunk two".to_string()];
        let prompt = compose_prompt("What was revenue?", &context);
        assert!(prompt.contains("Question: What was revenue?"));
        assert!(prompt.contains("chunk one\nchunk two"));
        assert!(prompt.starts_with("You are a financial analyst."));
        assert!(prompt.ends_with("Answer:"));
    }

    #[test]
    fn test_prompt_with_empty_context() {
        let prompt = compose_prompt("Anything?", &[]);
        assert!(prompt.contains("Context:\n\n"));
    }
}
