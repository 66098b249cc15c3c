//! Request-facing recommendation service.
//!
//! [`CareerEngine`] wires the catalog, the background-hydrated
//! [`VectorIndex`], the [`HybridRanker`] and the optional completion provider
//! used for domain expansion. It serves immediately after construction; until
//! the index is ready every request is ranked rule-only.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use serde::Serialize;
use tracing::Instrument;
use uuid::Uuid;

use crate::catalog::Catalog;
use crate::config::{NexusConfig, RankingConfig};
use crate::db::{BlobStore, MemoryBlobStore, SqliteBlobStore};
use crate::embedding::{self, CompletionProvider, EmbeddingProvider};
use crate::expansion;
use crate::index::{IndexSettings, IndexState, VectorIndex};
use crate::profile::{EducationLevel, Profile, Recommendation};
use crate::ranker::HybridRanker;

pub const READY_MESSAGE: &str = "System Fully Operational (AI Ready).";
pub const WARMING_MESSAGE: &str =
    "AI functionality is warming up. Basic rule-based matching is active.";

/// Liveness report. `status` is always `"healthy"`: an unready index is a
/// normal degraded mode, not a fault.
#[derive(Debug, Clone, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub ai_ready: bool,
    pub state: IndexState,
    pub message: &'static str,
}

pub struct CareerEngine {
    catalog: Arc<Catalog>,
    index: Arc<VectorIndex>,
    ranker: HybridRanker,
    completion: Option<Arc<dyn CompletionProvider>>,
    expansion_timeout: Duration,
}

impl CareerEngine {
    /// Build the engine and start hydrating the index in the background.
    ///
    /// With no embedding provider the index is permanently unavailable and
    /// the engine runs rule-only. Must be called inside a Tokio runtime.
    pub fn start(
        catalog: Arc<Catalog>,
        provider: Option<Arc<dyn EmbeddingProvider>>,
        store: Arc<dyn BlobStore>,
        settings: IndexSettings,
        completion: Option<Arc<dyn CompletionProvider>>,
        ranking: RankingConfig,
    ) -> Self {
        // Provider calls made on behalf of a request share the index bound.
        let expansion_timeout = settings.embed_timeout;
        let index = match provider {
            Some(provider) => {
                let index = VectorIndex::new(Arc::clone(&catalog), provider, store, settings);
                index.spawn_hydration();
                index
            }
            None => VectorIndex::unavailable(Arc::clone(&catalog), store, settings),
        };

        Self {
            ranker: HybridRanker::new(Arc::clone(&catalog), Arc::clone(&index), ranking),
            catalog,
            index,
            completion,
            expansion_timeout,
        }
    }

    /// Load the catalog, open the cache and construct providers from `config`.
    ///
    /// Only a missing or malformed catalog is fatal. An unusable cache falls
    /// back to an in-memory store; a provider that cannot be built disables
    /// the semantic index.
    pub async fn from_config(config: &NexusConfig) -> Result<Self> {
        let catalog = Arc::new(Catalog::load(config.resolved_catalog_path())?);

        let store: Arc<dyn BlobStore> = match SqliteBlobStore::open(config.resolved_cache_path()) {
            Ok(store) => Arc::new(store),
            Err(e) => {
                tracing::warn!(error = %format!("{e:#}"), "embedding cache unavailable, using in-memory store");
                Arc::new(MemoryBlobStore::new())
            }
        };

        // Providers may build blocking HTTP clients or load model files.
        let cfg = config.clone();
        let (provider, completion) = tokio::task::spawn_blocking(move || {
            let provider = match embedding::create_provider(&cfg) {
                Ok(provider) => Some(provider),
                Err(e) => {
                    tracing::warn!(error = %format!("{e:#}"), "embedding provider unavailable, rule-only matching");
                    None
                }
            };
            (provider, embedding::create_completion(&cfg))
        })
        .await?;

        if let Some(p) = &provider {
            if p.dimensions() != config.embedding.dimensions() {
                tracing::warn!(
                    provider = p.name(),
                    provider_dims = p.dimensions(),
                    configured = config.embedding.dimensions(),
                    "provider width differs from configured dimensions"
                );
            }
        }

        let settings = IndexSettings {
            dimensions: config.embedding.dimensions(),
            cache_key: config.cache_key(),
            embed_timeout: config.embedding.timeout(),
        };

        Ok(Self::start(
            catalog,
            provider,
            store,
            settings,
            completion,
            config.ranking.clone(),
        ))
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn index(&self) -> &Arc<VectorIndex> {
        &self.index
    }

    /// Wait for background hydration to finish (successfully or not).
    /// Safe to call from several tasks at once.
    pub async fn wait_for_index(&self) -> IndexState {
        self.index.wait_settled().await
    }

    /// Recommend occupations for `profile`, expanding an undergraduate's
    /// domain interest through the completion provider when one is configured.
    pub async fn recommend(&self, profile: &Profile) -> Vec<Recommendation> {
        let span = tracing::info_span!("recommend", request_id = %Uuid::now_v7());
        async {
            let keywords = match (&self.completion, profile.education_level, profile.domain()) {
                (Some(completion), EducationLevel::Undergrad, Some(domain)) => {
                    expansion::expand_domain(Arc::clone(completion), domain, self.expansion_timeout)
                        .await
                }
                _ => Vec::new(),
            };
            self.rank(profile, &keywords).await
        }
        .instrument(span)
        .await
    }

    /// Recommend with caller-supplied domain keywords; no expansion is done.
    pub async fn recommend_with_keywords(
        &self,
        profile: &Profile,
        keywords: &[String],
    ) -> Vec<Recommendation> {
        let span = tracing::info_span!("recommend", request_id = %Uuid::now_v7());
        self.rank(profile, keywords).instrument(span).await
    }

    async fn rank(&self, profile: &Profile, keywords: &[String]) -> Vec<Recommendation> {
        let ai_ready = self.index.is_ready();
        let recs = self.ranker.recommend(profile, keywords).await;
        tracing::info!(
            results = recs.len(),
            ai_ready,
            expanded = keywords.len(),
            "recommendation served"
        );
        recs
    }

    pub fn health(&self) -> Health {
        let state = self.index.state();
        let ai_ready = state == IndexState::Ready;
        Health {
            status: "healthy",
            ai_ready,
            state,
            message: if ai_ready { READY_MESSAGE } else { WARMING_MESSAGE },
        }
    }
}
