//! CLI `status` command: report catalog, cache and provider state.

use anyhow::Result;

use career_nexus::catalog::Catalog;
use career_nexus::config::NexusConfig;
use career_nexus::db::{BlobStore, SqliteBlobStore};
use career_nexus::embedding::local;
use career_nexus::engine::CareerEngine;
use career_nexus::index::EmbeddingMatrix;

use super::format_bytes;

pub async fn status(config: &NexusConfig) -> Result<()> {
    let catalog_path = config.resolved_catalog_path();
    let cache_path = config.resolved_cache_path();
    let key = config.cache_key();

    println!("Career Nexus Status");
    println!("===================");
    println!();

    let catalog_rows = match Catalog::load(&catalog_path) {
        Ok(catalog) => {
            println!("Catalog:           {} ({} occupations)", catalog_path.display(), catalog.len());
            Some(catalog.len())
        }
        Err(e) => {
            println!("Catalog:           unavailable ({e:#})");
            None
        }
    };

    println!();
    println!("Embedding provider:");
    println!("  Provider:        {}", config.embedding.provider);
    println!("  Dimensions:      {}", config.embedding.dimensions());
    match config.embedding.provider.as_str() {
        "local" => {
            let (model, tokenizer) = local::model_paths(&config.embedding);
            let present = model.exists() && tokenizer.exists();
            println!("  Model:           {}", config.embedding.model);
            println!(
                "  Model files:     {}",
                if present { "present" } else { "missing (run `career-nexus model download`)" }
            );
        }
        "gemini" => {
            println!("  Model:           {}", config.ai.embedding_model);
            println!(
                "  API key:         {}",
                if config.ai.api_key.is_some() { "set" } else { "missing (set GEMINI_API_KEY)" }
            );
        }
        other => println!("  WARNING: unknown provider '{other}'"),
    }

    println!();
    println!("Cache:");
    println!("  Database:        {}", cache_path.display());
    let mut cache_valid = false;
    if !cache_path.exists() {
        println!("  Status:          not created yet");
    } else {
        let size = std::fs::metadata(&cache_path).map(|m| m.len()).unwrap_or(0);
        println!("  File size:       {}", format_bytes(size));
        let store = SqliteBlobStore::open(&cache_path)?;
        for blob in store.list()? {
            let marker = if blob.key == key { "*" } else { " " };
            println!(
                "  {marker} {:<40} {:>10}  {}",
                blob.key,
                format_bytes(blob.size),
                blob.updated_at
            );
        }
        match store.load(&key)? {
            None => println!("  Status:          no entry for '{key}'"),
            Some(bytes) => match EmbeddingMatrix::decode(&bytes) {
                Ok(m) => {
                    cache_valid = Some(m.rows()) == catalog_rows
                        && m.dim() == config.embedding.dimensions();
                    let verdict = if cache_valid { "OK" } else { "stale (run `career-nexus build --force`)" };
                    println!("  Status:          {} x {} {verdict}", m.rows(), m.dim());
                }
                Err(e) => println!("  Status:          unreadable ({e})"),
            },
        }
    }

    if catalog_rows.is_some() {
        let engine = CareerEngine::from_config(config).await?;
        // A valid cache hydrates without embedding anything.
        if cache_valid {
            engine.wait_for_index().await;
        }
        let health = engine.health();
        println!();
        println!("Health:            {} ({})", health.message, health.state);
    }

    Ok(())
}
