//! CLI `build` command: compute and persist the occupation embedding cache.

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;

use career_nexus::catalog::Catalog;
use career_nexus::config::NexusConfig;
use career_nexus::db::{BlobStore, SqliteBlobStore};
use career_nexus::embedding;
use career_nexus::index::{EmbeddingMatrix, IndexSettings, VectorIndex};

/// Embed every catalog row in the foreground and save the matrix.
///
/// Without `force`, an existing cache whose shape matches the catalog is left
/// alone.
pub async fn build(config: &NexusConfig, force: bool) -> Result<()> {
    let catalog = Arc::new(
        Catalog::load(config.resolved_catalog_path()).context("failed to load catalog")?,
    );
    let store = Arc::new(
        SqliteBlobStore::open(config.resolved_cache_path())
            .context("failed to open cache database")?,
    );
    let key = config.cache_key();
    let dims = config.embedding.dimensions();

    if !force {
        if let Some(bytes) = store.load(&key)? {
            match EmbeddingMatrix::decode(&bytes) {
                Ok(m) if m.rows() == catalog.len() && m.dim() == dims => {
                    println!(
                        "Embedding cache is up to date ({} x {}). Use --force to rebuild.",
                        m.rows(),
                        m.dim()
                    );
                    return Ok(());
                }
                Ok(m) => println!(
                    "Cached matrix is {} x {}, catalog needs {} x {}. Rebuilding...",
                    m.rows(),
                    m.dim(),
                    catalog.len(),
                    dims
                ),
                Err(e) => println!("Cached matrix unreadable ({e}). Rebuilding..."),
            }
        }
    }

    let cfg = config.clone();
    let provider = tokio::task::spawn_blocking(move || embedding::create_provider(&cfg))
        .await?
        .context("failed to create embedding provider")?;

    let total = catalog.len();
    println!(
        "Embedding {total} occupations with provider '{}'...",
        provider.name()
    );

    let index = VectorIndex::new(
        Arc::clone(&catalog),
        provider,
        store,
        IndexSettings {
            dimensions: dims,
            cache_key: key.clone(),
            embed_timeout: config.embedding.timeout(),
        },
    );

    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("  {bar:40.cyan/blue} {pos}/{len} ({eta})")
            .expect("valid template")
            .progress_chars("##-"),
    );

    let report = index.rebuild(|done| pb.set_position(done as u64)).await;
    pb.finish_and_clear();
    let report = report.context("embedding build failed")?;

    if report.failed_rows > 0 {
        println!(
            "WARNING: {} of {total} rows failed to embed and were stored as zero vectors.",
            report.failed_rows
        );
    }
    println!("Saved {} embeddings under key '{key}'.", report.rows);
    Ok(())
}
