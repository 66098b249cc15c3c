//! Gemini HTTP client for embeddings and completions.
//!
//! Uses the blocking `reqwest` client (calls already run on the blocking pool).
//! Rate limiting (HTTP 429) and unavailability (HTTP 503) are retried with
//! exponential backoff; every other failure is returned immediately.

use std::thread::sleep;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::blocking::Client as HttpClient;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use super::{CompletionProvider, EmbeddingProvider};
use crate::config::AiConfig;

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    max_attempts: usize,
    min_delay: Duration,
    max_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: usize, min_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            min_delay,
            max_delay: max_delay.max(min_delay),
        }
    }

    /// Delay before retry number `attempt` (1-based), doubling from
    /// `min_delay` and capped at `max_delay`.
    pub fn delay_for_attempt(&self, attempt: usize) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16) as u32;
        let delay = self.min_delay.saturating_mul(1u32 << exponent);
        delay.min(self.max_delay)
    }

    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }
}

/// Outcome of one HTTP attempt.
enum Attempt<T> {
    Done(T),
    Retryable(anyhow::Error),
}

fn is_retryable(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status == StatusCode::SERVICE_UNAVAILABLE
}

pub struct GeminiClient {
    client: HttpClient,
    base_url: String,
    api_key: String,
    embedding_model: String,
    completion_model: String,
    dimensions: usize,
    retry: RetryPolicy,
}

impl GeminiClient {
    pub fn new(config: &AiConfig, dimensions: usize) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .context("GEMINI_API_KEY not set")?;
        let client = HttpClient::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs.max(1)))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            embedding_model: config.embedding_model.clone(),
            completion_model: config.completion_model.clone(),
            dimensions,
            retry: RetryPolicy::new(
                config.max_attempts,
                Duration::from_millis(config.backoff_min_ms),
                Duration::from_millis(config.backoff_max_ms),
            ),
        })
    }

    fn with_retry<T>(&self, op: &str, mut call: impl FnMut() -> Result<Attempt<T>>) -> Result<T> {
        let mut attempt = 0usize;
        loop {
            attempt += 1;
            match call()? {
                Attempt::Done(value) => return Ok(value),
                Attempt::Retryable(err) if attempt < self.retry.max_attempts() => {
                    let delay = self.retry.delay_for_attempt(attempt);
                    tracing::warn!(op, attempt, delay_ms = delay.as_millis() as u64, error = %err, "retrying");
                    sleep(delay);
                }
                Attempt::Retryable(err) => {
                    return Err(err.context(format!("{op} failed after {attempt} attempts")))
                }
            }
        }
    }

    fn post<B: Serialize, R: for<'de> Deserialize<'de>>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<Attempt<R>> {
        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(body)
            .send()
            .with_context(|| format!("request to {url} failed"))?;
        let status = response.status();
        if is_retryable(status) {
            return Ok(Attempt::Retryable(anyhow::anyhow!("HTTP {status}")));
        }
        if !status.is_success() {
            let text = response.text().unwrap_or_default();
            anyhow::bail!("HTTP {status}: {}", text.trim());
        }
        let parsed = response.json::<R>().context("malformed response body")?;
        Ok(Attempt::Done(parsed))
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbedRequest<'a> {
    model: String,
    content: Content<'a>,
    task_type: &'static str,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embedding: EmbeddingValues,
}

#[derive(Deserialize)]
struct EmbeddingValues {
    values: Vec<f32>,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

impl GenerateResponse {
    fn text(self) -> Option<String> {
        let candidate = self.candidates.into_iter().next()?;
        let text: String = candidate
            .content
            .parts
            .into_iter()
            .map(|p| p.text)
            .collect();
        Some(text).filter(|t| !t.trim().is_empty())
    }
}

impl EmbeddingProvider for GeminiClient {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let url = format!("{}/models/{}:embedContent", self.base_url, self.embedding_model);
        let body = EmbedRequest {
            model: format!("models/{}", self.embedding_model),
            content: Content {
                parts: [Part { text }],
            },
            task_type: "RETRIEVAL_DOCUMENT",
        };
        let response: EmbedResponse = self.with_retry("embed", || self.post(&url, &body))?;
        Ok(response.embedding.values)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        &self.embedding_model
    }
}

impl CompletionProvider for GeminiClient {
    fn complete(&self, prompt: &str) -> Result<String> {
        let url = format!(
            "{}/models/{}:generateContent",
            self.base_url, self.completion_model
        );
        let body = GenerateRequest {
            contents: [Content {
                parts: [Part { text: prompt }],
            }],
        };
        let response: GenerateResponse = self.with_retry("complete", || self.post(&url, &body))?;
        response.text().context("completion returned no text")
    }
}
