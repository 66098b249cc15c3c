mod cli;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use career_nexus::config::{self, NexusConfig};

#[derive(Parser)]
#[command(
    name = "career-nexus",
    version,
    about = "Hybrid occupation recommender: keyword rules blended with semantic search"
)]
struct Cli {
    /// Config file (default: ~/.career-nexus/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Rank occupations for a profile
    Recommend {
        /// Profile JSON file, or `-` for stdin
        #[arg(long)]
        profile: PathBuf,
        /// Pre-expanded domain keywords (skips AI expansion)
        #[arg(long, value_delimiter = ',')]
        keywords: Vec<String>,
        /// Wait for the semantic index before ranking
        #[arg(long)]
        wait: bool,
        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },
    /// Compute and store the occupation embedding cache
    Build {
        /// Rebuild even if the cache is current
        #[arg(long)]
        force: bool,
    },
    /// Show catalog, cache and provider status
    Status,
    /// Manage the local embedding model
    Model {
        #[command(subcommand)]
        action: ModelAction,
    },
}

#[derive(Subcommand)]
enum ModelAction {
    /// Download the embedding model to ~/.career-nexus/models/
    Download,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(config::default_config_path);
    let config = NexusConfig::load_from(&config_path)?;

    // Log to stderr so stdout stays clean for --json output.
    let filter =
        EnvFilter::try_new(&config.log.level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!(path = %config_path.display(), "configuration loaded");

    match cli.command {
        Command::Recommend {
            profile,
            keywords,
            wait,
            json,
        } => {
            let args = cli::recommend::RecommendArgs {
                profile: &profile,
                keywords: &keywords,
                wait,
                json,
            };
            cli::recommend::recommend(&config, args).await?;
        }
        Command::Build { force } => {
            cli::build::build(&config, force).await?;
        }
        Command::Status => {
            cli::status::status(&config).await?;
        }
        Command::Model { action } => match action {
            ModelAction::Download => {
                cli::model_download(&config.embedding).await?;
            }
        },
    }

    Ok(())
}
