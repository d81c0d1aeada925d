//! OpenAI-compatible chat completion client.
//!
//! Backs both text-generation capabilities of the research loop: standalone
//! query rewriting for the planner and grounded answer synthesis.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{Document, LlmConfig, Role, Turn};
use crate::domain::ports::{QueryRewriter, Synthesizer};

const REWRITE_INSTRUCTIONS: &str = "You are a query rewriting assistant. Read the conversation \
history below and rewrite the user's latest question into a standalone search query that can \
be fully understood without the conversation. If no rewrite is needed, output the original \
question unchanged. Output only the query.";

const ANSWER_INSTRUCTIONS: &str = "You are a careful research assistant. Answer the user's \
latest question using the retrieved documents below, citing the source of every fact you use \
as (Source: name). If the documents do not contain the answer, say so plainly instead of \
guessing. Small talk may be answered directly.";

/// Chat client speaking the `/chat/completions` protocol.
pub struct OpenAiChatClient {
    config: LlmConfig,
    client: reqwest::Client,
}

impl OpenAiChatClient {
    /// # Errors
    /// Fails if the HTTP client cannot be built.
    pub fn new(config: LlmConfig) -> DomainResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| DomainError::ExecutionFailed(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { config, client })
    }

    fn api_key(&self) -> DomainResult<String> {
        self.config
            .api_key
            .clone()
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .ok_or_else(|| {
                DomainError::ExecutionFailed(
                    "OpenAI API key not set. Set OPENAI_API_KEY env var or configure llm.api_key."
                        .to_string(),
                )
            })
    }

    /// Send one completion request and return the first choice's text.
    async fn complete(&self, messages: Vec<ChatMessage>) -> DomainResult<String> {
        let api_key = self.api_key()?;
        let url = format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'));

        let request_body = ChatRequest {
            model: &self.config.model,
            temperature: self.config.temperature,
            messages,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| DomainError::ExecutionFailed(format!("Chat API request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unable to read response body".to_string());
            return Err(DomainError::ExecutionFailed(format!(
                "Chat API returned {status}: {body}"
            )));
        }

        let result: ChatResponse = response
            .json()
            .await
            .map_err(|e| DomainError::SerializationError(format!("Failed to parse chat response: {e}")))?;

        result
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| DomainError::ExecutionFailed("Chat API returned no content".to_string()))
    }
}

/// Render prior turns as `User: ...` / `Assistant: ...` lines.
fn format_history(history: &[Turn]) -> String {
    history
        .iter()
        .map(|turn| format!("{}: {}", turn.role.label(), turn.content))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render evidence as numbered blocks with their source.
fn format_evidence(evidence: &[Document]) -> String {
    evidence
        .iter()
        .enumerate()
        .map(|(i, doc)| {
            format!(
                "Document {} (Source: {}):\n{}",
                i + 1,
                doc.source().unwrap_or("Unknown"),
                doc.content
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[async_trait]
impl QueryRewriter for OpenAiChatClient {
    async fn rewrite(&self, history: &[Turn], latest: &str) -> DomainResult<String> {
        let system = format!(
            "{REWRITE_INSTRUCTIONS}\n\n[Conversation history]\n{}\n[End of history]",
            format_history(history)
        );
        let messages = vec![
            ChatMessage::system(system),
            ChatMessage::new(Role::User, format!("Latest question: {latest}")),
        ];

        let rewritten = self
            .complete(messages)
            .await
            .map_err(|e| DomainError::RewriteFailed(e.to_string()))?;
        debug!(latest, rewritten = %rewritten, "rewrite completed");
        Ok(rewritten.trim().to_string())
    }
}

#[async_trait]
impl Synthesizer for OpenAiChatClient {
    async fn generate(&self, history: &[Turn], evidence: &[Document]) -> DomainResult<String> {
        let system = format!(
            "{ANSWER_INSTRUCTIONS}\n\n[Retrieved documents]\n{}\n[End of documents]",
            format_evidence(evidence)
        );

        let mut messages = Vec::with_capacity(history.len() + 1);
        messages.push(ChatMessage::system(system));
        messages.extend(
            history
                .iter()
                .map(|turn| ChatMessage::new(turn.role, turn.content.clone())),
        );

        self.complete(messages)
            .await
            .map_err(|e| DomainError::SynthesisFailed(e.to_string()))
    }
}

// -- Chat completion request/response types --

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

impl ChatMessage {
    fn system(content: String) -> Self {
        Self {
            role: "system",
            content,
        }
    }

    fn new(role: Role, content: String) -> Self {
        Self {
            role: role.as_str(),
            content,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}
