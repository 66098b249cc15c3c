//! Error types for the semantic index.
//!
//! None of these escape a recommendation request: the index logs them and
//! degrades to an empty candidate set or a zero vector.

use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IndexError {
    /// The embedding provider returned an error (after its own retries).
    #[error("embedding provider failed: {0}")]
    Provider(String),
    /// The provider did not answer within the configured bound.
    #[error("embedding call timed out after {0:?}")]
    Timeout(Duration),
    /// The provider answered with an empty vector.
    #[error("embedding provider returned an empty vector")]
    EmptyVector,
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("failed to load cached matrix: {0}")]
    CacheLoad(String),
    #[error("failed to save cached matrix: {0}")]
    CacheSave(String),
    #[error("corrupt matrix blob: {0}")]
    CorruptMatrix(String),
    /// Hydration could not produce a usable matrix.
    #[error("hydration failed: {0}")]
    Hydration(String),
}
