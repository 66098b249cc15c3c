//! Semantic search over the occupation catalog.
//!
//! [`VectorIndex`] owns one embedding per catalog row. Hydration (load from the
//! blob cache, or compute through the [`EmbeddingProvider`]) runs as a single
//! background task; until it publishes a complete matrix, [`VectorIndex::search`]
//! answers with an empty candidate list and callers fall back to rule-only
//! scoring.
//!
//! # States
//!
//! `Uninitialized → Hydrating → Ready`, or `Hydrating → Failed`. `Failed` is
//! final for the process; hydration is not retried.

pub mod matrix;

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::catalog::Catalog;
use crate::db::BlobStore;
use crate::embedding::EmbeddingProvider;
use crate::error::IndexError;

pub use matrix::{EmbeddingMatrix, SemanticHit};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexState {
    Uninitialized,
    Hydrating,
    Ready,
    Failed,
}

impl IndexState {
    fn from_u8(v: u8) -> Self {
        match v {
            1 => Self::Hydrating,
            2 => Self::Ready,
            3 => Self::Failed,
            _ => Self::Uninitialized,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Hydrating => "hydrating",
            Self::Ready => "ready",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for IndexState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fixed parameters of an index, set at construction.
#[derive(Debug, Clone)]
pub struct IndexSettings {
    /// Vector width; failed rows are replaced by zero vectors of this width.
    pub dimensions: usize,
    /// Blob key the matrix is cached under.
    pub cache_key: String,
    /// Bound on each provider call. A timeout counts as a failure.
    pub embed_timeout: Duration,
}

/// How hydration obtained its matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HydrationReport {
    pub rows: usize,
    pub from_cache: bool,
    /// Rows replaced by a zero vector.
    pub failed_rows: usize,
    pub persisted: bool,
}

pub struct VectorIndex {
    catalog: Arc<Catalog>,
    provider: Option<Arc<dyn EmbeddingProvider>>,
    store: Arc<dyn BlobStore>,
    settings: IndexSettings,
    matrix: OnceLock<EmbeddingMatrix>,
    state: AtomicU8,
    /// Mirrors `state` for tasks waiting on hydration to settle.
    settled: watch::Sender<IndexState>,
}

impl VectorIndex {
    pub fn new(
        catalog: Arc<Catalog>,
        provider: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn BlobStore>,
        settings: IndexSettings,
    ) -> Arc<Self> {
        Arc::new(Self {
            catalog,
            provider: Some(provider),
            store,
            settings,
            matrix: OnceLock::new(),
            state: AtomicU8::new(IndexState::Uninitialized as u8),
            settled: watch::Sender::new(IndexState::Uninitialized),
        })
    }

    /// An index with no provider. It is `Failed` from the start, so every
    /// request runs rule-only.
    pub fn unavailable(
        catalog: Arc<Catalog>,
        store: Arc<dyn BlobStore>,
        settings: IndexSettings,
    ) -> Arc<Self> {
        Arc::new(Self {
            catalog,
            provider: None,
            store,
            settings,
            matrix: OnceLock::new(),
            state: AtomicU8::new(IndexState::Failed as u8),
            settled: watch::Sender::new(IndexState::Failed),
        })
    }

    /// Construct and immediately start background hydration.
    pub fn launch(
        catalog: Arc<Catalog>,
        provider: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn BlobStore>,
        settings: IndexSettings,
    ) -> (Arc<Self>, JoinHandle<()>) {
        let index = Self::new(catalog, provider, store, settings);
        let handle = match index.spawn_hydration() {
            Some(handle) => handle,
            // Unreachable for a fresh index; keep a finished handle for the caller.
            None => tokio::spawn(async {}),
        };
        (index, handle)
    }

    /// Spawn the hydration task. Only the first call spawns; later calls
    /// return `None`.
    pub fn spawn_hydration(self: &Arc<Self>) -> Option<JoinHandle<()>> {
        self.begin().ok()?;
        let worker = {
            let index = Arc::clone(self);
            tokio::spawn(async move { index.run_hydration().await })
        };
        let index = Arc::clone(self);
        Some(tokio::spawn(async move {
            // A panicking worker still settles the index.
            let result = match worker.await {
                Ok(result) => result,
                Err(e) => Err(IndexError::Hydration(format!("hydration task failed: {e}"))),
            };
            index.finish(result);
        }))
    }

    /// Wait until hydration has settled as `Ready` or `Failed`. Any number
    /// of callers may wait at once. Returns immediately if hydration was
    /// never started.
    pub async fn wait_settled(&self) -> IndexState {
        let mut rx = self.settled.subscribe();
        let settled = rx
            .wait_for(|s| *s != IndexState::Hydrating)
            .await
            .map(|s| *s);
        settled.unwrap_or_else(|_| self.state())
    }

    pub fn state(&self) -> IndexState {
        IndexState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn set_state(&self, state: IndexState) {
        self.state.store(state as u8, Ordering::Release);
        self.settled.send_replace(state);
    }

    pub fn is_ready(&self) -> bool {
        self.state() == IndexState::Ready
    }

    pub fn settings(&self) -> &IndexSettings {
        &self.settings
    }

    /// The published matrix, once ready.
    pub fn matrix(&self) -> Option<&EmbeddingMatrix> {
        if self.is_ready() {
            self.matrix.get()
        } else {
            None
        }
    }

    /// Top `top_k` catalog rows for `query`. Empty unless the index is ready
    /// and the query embeds successfully at the matrix width.
    pub async fn search(&self, query: &str, top_k: usize) -> Vec<SemanticHit> {
        let Some(matrix) = self.matrix() else {
            tracing::debug!(state = %self.state(), "index not ready, no semantic candidates");
            return Vec::new();
        };

        let embedding = match self.embed(query.to_string()).await {
            Ok(v) => v,
            Err(e @ IndexError::DimensionMismatch { .. }) => {
                tracing::error!(error = %e, "query vector width does not match the index, no semantic candidates");
                return Vec::new();
            }
            Err(e) => {
                tracing::warn!(error = %e, "query embedding failed, no semantic candidates");
                return Vec::new();
            }
        };

        match matrix.top_k(&embedding, top_k) {
            Ok(hits) => hits,
            Err(e) => {
                tracing::error!(error = %e, "semantic search aborted");
                Vec::new()
            }
        }
    }

    /// Compute the matrix in the foreground, ignoring any cached copy, then
    /// publish and persist it. `on_row` is called after each row with the
    /// number of rows done.
    ///
    /// Used by the offline cache build. Persistence failure is an error here.
    pub async fn rebuild(
        &self,
        on_row: impl FnMut(usize),
    ) -> Result<HydrationReport, IndexError> {
        self.begin()?;
        match self.compute_and_persist(on_row).await {
            Ok((matrix, report)) => {
                self.finish(Ok((matrix, report)));
                Ok(report)
            }
            Err(e) => {
                self.set_state(IndexState::Failed);
                Err(e)
            }
        }
    }

    async fn compute_and_persist(
        &self,
        on_row: impl FnMut(usize),
    ) -> Result<(EmbeddingMatrix, HydrationReport), IndexError> {
        let (matrix, failed_rows) = self.compute(on_row).await?;
        self.persist(&matrix).await?;
        let report = HydrationReport {
            rows: matrix.rows(),
            from_cache: false,
            failed_rows,
            persisted: true,
        };
        Ok((matrix, report))
    }

    fn begin(&self) -> Result<(), IndexError> {
        self.state
            .compare_exchange(
                IndexState::Uninitialized as u8,
                IndexState::Hydrating as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .map_err(|current| {
                IndexError::Hydration(format!(
                    "hydration already started (state: {})",
                    IndexState::from_u8(current)
                ))
            })?;
        self.settled.send_replace(IndexState::Hydrating);
        Ok(())
    }

    /// Publish the outcome. The matrix is written before the state becomes
    /// `Ready`, so a reader that sees `Ready` always sees the full matrix.
    fn finish(&self, result: Result<(EmbeddingMatrix, HydrationReport), IndexError>) {
        match result {
            Ok((matrix, report)) => {
                if self.matrix.set(matrix).is_err() {
                    tracing::error!("embedding matrix already published");
                    self.set_state(IndexState::Failed);
                    return;
                }
                self.set_state(IndexState::Ready);
                tracing::info!(
                    rows = report.rows,
                    from_cache = report.from_cache,
                    failed_rows = report.failed_rows,
                    persisted = report.persisted,
                    "semantic index ready"
                );
            }
            Err(e) => {
                self.set_state(IndexState::Failed);
                tracing::error!(error = %e, "semantic index unavailable, rule-only scoring for this process");
            }
        }
    }

    async fn run_hydration(&self) -> Result<(EmbeddingMatrix, HydrationReport), IndexError> {
        match self.load_cached().await {
            Ok(Some(matrix)) => {
                let report = HydrationReport {
                    rows: matrix.rows(),
                    from_cache: true,
                    failed_rows: 0,
                    persisted: true,
                };
                return Ok((matrix, report));
            }
            Ok(None) => {
                tracing::info!(key = %self.settings.cache_key, "no cached embeddings, computing");
            }
            Err(e) => {
                tracing::warn!(error = %e, "cached embeddings unusable, recomputing");
            }
        }

        let total = self.catalog.len();
        let (matrix, failed_rows) = self
            .compute(|done| {
                if done % 100 == 0 || done == total {
                    tracing::info!(done, total, "embedding catalog");
                }
            })
            .await?;

        let persisted = match self.persist(&matrix).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "embedding cache not saved");
                false
            }
        };

        let report = HydrationReport {
            rows: matrix.rows(),
            from_cache: false,
            failed_rows,
            persisted,
        };
        Ok((matrix, report))
    }

    /// Read and validate the cached matrix. A shape that does not match the
    /// catalog or the configured width is an error (stale cache).
    async fn load_cached(&self) -> Result<Option<EmbeddingMatrix>, IndexError> {
        let store = Arc::clone(&self.store);
        let key = self.settings.cache_key.clone();
        let bytes = tokio::task::spawn_blocking(move || store.load(&key))
            .await
            .map_err(|e| IndexError::CacheLoad(e.to_string()))?
            .map_err(|e| IndexError::CacheLoad(e.to_string()))?;

        let Some(bytes) = bytes else {
            return Ok(None);
        };

        let matrix = EmbeddingMatrix::decode(&bytes)?;
        if matrix.rows() != self.catalog.len() || matrix.dim() != self.settings.dimensions {
            return Err(IndexError::CacheLoad(format!(
                "cached shape {}x{} does not match catalog {}x{}",
                matrix.rows(),
                matrix.dim(),
                self.catalog.len(),
                self.settings.dimensions
            )));
        }
        tracing::info!(rows = matrix.rows(), dim = matrix.dim(), "loaded cached embeddings");
        Ok(Some(matrix))
    }

    /// Embed every catalog row in order into a local buffer. Failed rows become
    /// zero vectors. Returns the matrix and the number of failed rows.
    async fn compute(
        &self,
        mut on_row: impl FnMut(usize),
    ) -> Result<(EmbeddingMatrix, usize), IndexError> {
        let dim = self.settings.dimensions;
        let total = self.catalog.len();
        let mut rows = Vec::with_capacity(total);
        let mut failed = 0usize;

        for (i, occupation) in self.catalog.rows().iter().enumerate() {
            match self.embed(occupation.embedding_text()).await {
                Ok(v) => rows.push(v),
                Err(e) => {
                    tracing::warn!(row = i, code = %occupation.code, error = %e, "row embedding failed, using zero vector");
                    rows.push(vec![0.0; dim]);
                    failed += 1;
                }
            }
            on_row(i + 1);
        }

        if total > 0 && failed == total {
            return Err(IndexError::Hydration(format!(
                "all {total} rows failed to embed"
            )));
        }

        let matrix = EmbeddingMatrix::from_rows(rows, dim)?;
        Ok((matrix, failed))
    }

    async fn persist(&self, matrix: &EmbeddingMatrix) -> Result<(), IndexError> {
        let store = Arc::clone(&self.store);
        let key = self.settings.cache_key.clone();
        let bytes = matrix.encode();
        tokio::task::spawn_blocking(move || store.save(&key, &bytes))
            .await
            .map_err(|e| IndexError::CacheSave(e.to_string()))?
            .map_err(|e| IndexError::CacheSave(e.to_string()))?;
        tracing::info!(key = %self.settings.cache_key, "embedding cache saved");
        Ok(())
    }

    /// One bounded provider call, validated against the configured width.
    async fn embed(&self, text: String) -> Result<Vec<f32>, IndexError> {
        let provider = self
            .provider
            .clone()
            .ok_or_else(|| IndexError::Provider("no embedding provider configured".into()))?;
        let timeout = self.settings.embed_timeout;

        let call = tokio::task::spawn_blocking(move || provider.embed(&text));
        let vector = match tokio::time::timeout(timeout, call).await {
            Err(_) => return Err(IndexError::Timeout(timeout)),
            Ok(Err(join)) => return Err(IndexError::Provider(join.to_string())),
            Ok(Ok(Err(e))) => return Err(IndexError::Provider(format!("{e:#}"))),
            Ok(Ok(Ok(v))) => v,
        };

        if vector.is_empty() {
            return Err(IndexError::EmptyVector);
        }
        if vector.len() != self.settings.dimensions {
            return Err(IndexError::DimensionMismatch {
                expected: self.settings.dimensions,
                actual: vector.len(),
            });
        }
        Ok(vector)
    }
}
