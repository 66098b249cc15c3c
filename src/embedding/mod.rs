//! Text-to-vector embedding and text completion capabilities.
//!
//! Provides the [`EmbeddingProvider`] and [`CompletionProvider`] traits plus two
//! implementations: a local ONNX model ([`local`]) and the Gemini HTTP API
//! ([`gemini`]). Providers are created from configuration via
//! [`create_provider`] and [`create_completion`].

pub mod gemini;
pub mod local;

use anyhow::Result;
use std::sync::Arc;

use crate::config::NexusConfig;

/// Trait for embedding text into vectors.
///
/// All methods are synchronous; callers in async contexts should use
/// `tokio::task::spawn_blocking`. Implementations handle their own retries;
/// an `Err` is final for that call.
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a single text string into a vector.
    fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Number of dimensions this provider produces.
    fn dimensions(&self) -> usize;

    /// Short identifier for logs and diagnostics.
    fn name(&self) -> &str;
}

/// Trait for free-text completion.
pub trait CompletionProvider: Send + Sync {
    fn complete(&self, prompt: &str) -> Result<String>;
}

/// Create the configured embedding provider.
///
/// Returns an error if the provider cannot be constructed (missing model files,
/// missing API key). Callers run in rule-only mode in that case.
pub fn create_provider(config: &NexusConfig) -> Result<Arc<dyn EmbeddingProvider>> {
    match config.embedding.provider.as_str() {
        "local" => {
            let provider = local::LocalEmbeddingProvider::new(&config.embedding)?;
            Ok(Arc::new(provider))
        }
        "gemini" => {
            let client = gemini::GeminiClient::new(&config.ai, config.embedding.dimensions())?;
            Ok(Arc::new(client))
        }
        other => anyhow::bail!("unknown embedding provider: {other}. Supported: local, gemini"),
    }
}

/// Create a completion provider, if one is configured.
///
/// Only the Gemini client offers completion; without an API key this returns
/// `None` and domain expansion is skipped.
pub fn create_completion(config: &NexusConfig) -> Option<Arc<dyn CompletionProvider>> {
    config.ai.api_key.as_ref()?;
    match gemini::GeminiClient::new(&config.ai, config.embedding.dimensions()) {
        Ok(client) => Some(Arc::new(client)),
        Err(e) => {
            tracing::warn!(error = %e, "completion provider unavailable");
            None
        }
    }
}

/// L2-normalize a vector. Returns the input unchanged if its norm is zero.
pub fn l2_normalize(v: &[f32]) -> Vec<f32> {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        v.iter().map(|x| x / norm).collect()
    } else {
        v.to_vec()
    }
}
