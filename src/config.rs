use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct NexusConfig {
    pub log: LogConfig,
    pub catalog: CatalogConfig,
    pub cache: CacheConfig,
    pub embedding: EmbeddingConfig,
    pub ai: AiConfig,
    pub ranking: RankingConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CatalogConfig {
    /// Tab-separated occupation file (`O*NET-SOC Code`, `Title`, `Description`).
    pub path: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CacheConfig {
    pub db_path: String,
    pub key: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// `"local"` (ONNX all-MiniLM-L6-v2) or `"gemini"`.
    pub provider: String,
    pub model: String,
    /// Vector width. Unset means the provider's native width, see
    /// [`EmbeddingConfig::dimensions`].
    pub dimensions: Option<usize>,
    pub model_dir: String,
    /// Upper bound for a single embed call made by the index.
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AiConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub embedding_model: String,
    pub completion_model: String,
    pub max_attempts: usize,
    pub backoff_min_ms: u64,
    pub backoff_max_ms: u64,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RankingConfig {
    pub semantic_top_k: usize,
    pub semantic_weight: f64,
    pub min_score: f64,
    pub max_results: usize,
    pub domain_bonus: f64,
    pub keyword_weight: f64,
    pub max_reasons: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            path: default_nexus_dir()
                .join("occupations.tsv")
                .to_string_lossy()
                .into_owned(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            db_path: default_nexus_dir()
                .join("cache.db")
                .to_string_lossy()
                .into_owned(),
            key: "occupation-embeddings".into(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "local".into(),
            model: "all-MiniLM-L6-v2".into(),
            dimensions: None,
            model_dir: default_nexus_dir()
                .join("models")
                .to_string_lossy()
                .into_owned(),
            timeout_secs: 30,
        }
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com/v1beta".into(),
            api_key: None,
            embedding_model: "text-embedding-004".into(),
            completion_model: "gemini-1.5-flash".into(),
            max_attempts: 3,
            backoff_min_ms: 2_000,
            backoff_max_ms: 10_000,
            request_timeout_secs: 30,
        }
    }
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            semantic_top_k: 100,
            semantic_weight: 10.0,
            min_score: 2.5,
            max_results: 20,
            domain_bonus: 3.0,
            keyword_weight: 0.5,
            max_reasons: 3,
        }
    }
}

/// Native output width of each provider.
pub const LOCAL_DIMENSIONS: usize = 384;
pub const GEMINI_DIMENSIONS: usize = 768;

impl EmbeddingConfig {
    /// The configured width, or the provider's native width when unset.
    pub fn dimensions(&self) -> usize {
        self.dimensions.unwrap_or(match self.provider.as_str() {
            "gemini" => GEMINI_DIMENSIONS,
            _ => LOCAL_DIMENSIONS,
        })
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

/// Returns `~/.career-nexus/`, falling back to the working directory when no
/// home directory can be resolved.
pub fn default_nexus_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".career-nexus")
}

/// Returns the default config file path: `~/.career-nexus/config.toml`
pub fn default_config_path() -> PathBuf {
    default_nexus_dir().join("config.toml")
}

impl NexusConfig {
    /// Load config from TOML file (if it exists) then apply env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents =
                std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            NexusConfig::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("NEXUS_CATALOG") {
            self.catalog.path = val;
        }
        if let Ok(val) = std::env::var("NEXUS_CACHE_DB") {
            self.cache.db_path = val;
        }
        if let Ok(val) = std::env::var("NEXUS_LOG_LEVEL") {
            self.log.level = val;
        }
        if let Ok(val) = std::env::var("NEXUS_EMBEDDING_PROVIDER") {
            self.embedding.provider = val;
        }
        if let Ok(val) = std::env::var("GEMINI_API_KEY") {
            if !val.trim().is_empty() {
                self.ai.api_key = Some(val);
            }
        }
    }

    pub fn resolved_catalog_path(&self) -> PathBuf {
        expand_tilde(&self.catalog.path)
    }

    pub fn resolved_cache_path(&self) -> PathBuf {
        expand_tilde(&self.cache.db_path)
    }

    /// Blob key for the embedding matrix. Includes the model name so that
    /// switching models never reuses stale vectors.
    pub fn cache_key(&self) -> String {
        let model = match self.embedding.provider.as_str() {
            "gemini" => self.ai.embedding_model.as_str(),
            _ => self.embedding.model.as_str(),
        };
        format!("{}:{}:{}", self.cache.key, self.embedding.provider, model)
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}
