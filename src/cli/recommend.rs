//! CLI `recommend` command: rank occupations for a profile read from JSON.

use anyhow::{Context, Result};
use std::io::Read;
use std::path::Path;

use career_nexus::config::NexusConfig;
use career_nexus::engine::CareerEngine;
use career_nexus::profile::{Profile, Recommendation};

pub struct RecommendArgs<'a> {
    /// Profile JSON file, or `-` for stdin.
    pub profile: &'a Path,
    pub keywords: &'a [String],
    pub wait: bool,
    pub json: bool,
}

pub async fn recommend(config: &NexusConfig, args: RecommendArgs<'_>) -> Result<()> {
    let profile = read_profile(args.profile)?;
    let engine = CareerEngine::from_config(config).await?;

    if args.wait {
        eprintln!("Waiting for the semantic index...");
        engine.wait_for_index().await;
    }

    let recs = if args.keywords.is_empty() {
        engine.recommend(&profile).await
    } else {
        engine.recommend_with_keywords(&profile, args.keywords).await
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&recs)?);
        return Ok(());
    }

    let health = engine.health();
    println!("{}", health.message);
    println!();
    print_table(&recs);
    Ok(())
}

fn read_profile(path: &Path) -> Result<Profile> {
    let raw = if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read profile from stdin")?;
        buf
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("failed to read profile {}", path.display()))?
    };
    serde_json::from_str(&raw).context("invalid profile JSON")
}

fn print_table(recs: &[Recommendation]) {
    if recs.is_empty() {
        println!("No matching occupations.");
        return;
    }
    for (i, rec) in recs.iter().enumerate() {
        println!("{:>2}. {} ({})  score {:.2}", i + 1, rec.title, rec.code, rec.score);
        println!("    {}", rec.reasoning.join("; "));
    }
}
