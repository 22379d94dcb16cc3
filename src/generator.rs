//! Summary generation against a chat-completions backend.
//!
//! [`SummaryGenerator`] owns the prompt assembly, the cache lookup, the
//! backend call, and the response parsing. It returns
//! `Result<Summary, GenerationError>`; mapping an error to the degraded
//! fallback summary is the orchestrator's decision, so the failure policy
//! stays visible at the call site instead of inside a catch-all.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::cache::SummaryCache;
use crate::config::Config;
use crate::records::PaperContent;
use crate::summary::Summary;

/// Failures on the generation path. None of these abort a file; the
/// orchestrator substitutes a fallback summary instead.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("chat backend request failed: {0}")]
    Backend(String),

    #[error("model response was not a valid summary: {0}")]
    MalformedResponse(String),
}

/// A chat-completions backend that turns one prompt into free text.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn complete(&self, prompt: &str, temperature: f32) -> Result<String, GenerationError>;

    /// Identifier of the underlying model, for logs.
    fn id(&self) -> &str;
}

/// Chat client for OpenAI-compatible REST endpoints (OpenRouter included).
pub struct OpenAiChatBackend {
    client: Client,
    endpoint: String,
    model: String,
}

impl OpenAiChatBackend {
    pub fn new(
        api_key: &str,
        base_url: &str,
        model: &str,
        timeout: Duration,
    ) -> Result<Self, GenerationError> {
        let mut headers = HeaderMap::new();
        let auth = format!("Bearer {}", api_key.trim());
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth)
                .map_err(|err| GenerationError::Backend(format!("invalid api key: {err}")))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .use_rustls_tls()
            .build()
            .map_err(|err| GenerationError::Backend(err.to_string()))?;
        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            model: model.to_string(),
        })
    }
}

#[async_trait]
impl ChatBackend for OpenAiChatBackend {
    async fn complete(&self, prompt: &str, temperature: f32) -> Result<String, GenerationError> {
        let body = ChatRequest {
            model: &self.model,
            temperature,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };
        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|err| GenerationError::Backend(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(GenerationError::Backend(format!(
                "chat request failed ({status}): {body}"
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|err| GenerationError::Backend(err.to_string()))?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| GenerationError::Backend("response contained no choices".to_string()))?;
        Ok(content)
    }

    fn id(&self) -> &str {
        &self.model
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
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
    content: String,
}

/// Cache-aware summary generator.
pub struct SummaryGenerator {
    backend: Arc<dyn ChatBackend>,
    cache: SummaryCache,
    temperature: f32,
    rate_limit_pause: Duration,
}

impl SummaryGenerator {
    pub fn new(config: &Config, backend: Arc<dyn ChatBackend>, cache: SummaryCache) -> Self {
        Self {
            backend,
            cache,
            temperature: config.temperature,
            rate_limit_pause: Duration::from_millis(config.rate_limit_pause_ms),
        }
    }

    /// Produces the summary for one paper.
    ///
    /// A cache hit short-circuits with no model call and no side effects.
    /// On a miss the prompt is built from metadata plus the representative
    /// chunks, the backend is invoked, and the JSON payload (optionally
    /// wrapped in Markdown code fences) is parsed. Only a successful parse
    /// writes through to the cache and pays the rate-limit pause.
    pub async fn summarize(
        &self,
        paper: &PaperContent,
        representative_chunks: &[String],
    ) -> Result<Summary, GenerationError> {
        let key = SummaryCache::key_for(&paper.title);
        if let Some(cached) = self.cache.get(&key).await {
            info!(title = %paper.title, "using cached summary");
            return Ok(cached);
        }

        let prompt = build_prompt(paper, representative_chunks);
        info!(title = %paper.title, model = %self.backend.id(), "generating summary");

        let raw = self.backend.complete(&prompt, self.temperature).await?;
        let payload = strip_code_fences(&raw);
        let summary: Summary = serde_json::from_str(payload)
            .map_err(|err| GenerationError::MalformedResponse(err.to_string()))?;

        self.cache.put(&key, &summary).await;
        if !self.rate_limit_pause.is_zero() {
            debug!(pause_ms = self.rate_limit_pause.as_millis() as u64, "rate-limit pause");
            tokio::time::sleep(self.rate_limit_pause).await;
        }
        Ok(summary)
    }
}

/// Assembles the summarization prompt from paper metadata and the
/// representative excerpts, each labeled by ordinal position.
fn build_prompt(paper: &PaperContent, representative_chunks: &[String]) -> String {
    let chunks_text = representative_chunks
        .iter()
        .enumerate()
        .map(|(index, chunk)| format!("Chunk {}: {}", index + 1, chunk))
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        r#"You are a skilled science communicator creating summaries of research papers that are adaptable for readers with different levels of expertise. Create a summary of the following research paper that is engaging, accurate, and layered in complexity.

Paper Information:
- Title: {title}
- Abstract: {abstract_text}
- Category: {category}

Key Representative Excerpts from the Full Paper:
{chunks_text}

Create an adaptable summary with the following structure:

1. "headline": A compelling, clear title that captures the essence of the research

2. "tldr": A one-sentence summary that anyone can understand

3. "context": Brief background explaining why this research matters in the real world

4. "methodology": A clear explanation of the methods and approach used by the researchers

5. "key_points": 3-5 bullet points highlighting the main findings and implications

6. "accessible_explanation": A 2-3 paragraph explanation that a general audience can understand, using analogies or examples when helpful

7. "significance": The broader impact of this work and why it represents an advance

8. "questions_raised": 2-3 thought-provoking questions this research raises

Format your response as a JSON object with these keys.

Your summary should be:
- Factually accurate (don't add details not present in the paper)
- Engaging for different audience types (general readers, students, researchers)
- Written with clarity and a human touch
- Free of unnecessary jargon, but precise about key concepts

Return ONLY the JSON object, with no additional text."#,
        title = paper.title,
        abstract_text = paper.abstract_text,
        category = paper.category,
        chunks_text = chunks_text,
    )
}

/// Strips an optional Markdown code fence (with or without a language tag)
/// wrapped around the JSON payload.
fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    if let Some((_, rest)) = trimmed.split_once("```json") {
        let inner = rest
            .split_once("```")
            .map(|(inner, _)| inner)
            .unwrap_or(rest);
        return inner.trim();
    }
    if let Some((_, rest)) = trimmed.split_once("```") {
        let inner = rest
            .split_once("```")
            .map(|(inner, _)| inner)
            .unwrap_or(rest);
        return inner.trim();
    }
    trimmed
}
