//! Glossa CLI
//!
//! Scaffold translation catalogs, validate them, and replay language
//! switches through the translation cache.

use anyhow::Result;
use clap::{Parser, Subcommand};
use glossa_i18n::LanguageCode;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod check;
mod config;
mod project;
mod replay;

use config::GlossaConfig;
use replay::ReplayPlan;

#[derive(Parser)]
#[command(name = "glossa")]
#[command(author, version, about = "Glossa translation cache tooling", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a glossa.toml and starter catalogs
    Init {
        /// Directory to initialize
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Overwrite an existing glossa.toml
        #[arg(long)]
        force: bool,
    },

    /// Dispatch language switches and print the view after each step
    Replay {
        /// Config file or directory containing glossa.toml
        #[arg(short, long, default_value = ".")]
        config: PathBuf,

        /// Key whose translation is printed
        #[arg(short, long, default_value = "hello")]
        key: String,

        /// Issue every switch before waiting for any fetch
        #[arg(long)]
        no_wait: bool,

        /// Languages to switch to, in order
        langs: Vec<String>,
    },

    /// Parse every catalog and report key counts
    Check {
        /// Config file or directory containing glossa.toml
        #[arg(short, long, default_value = ".")]
        config: PathBuf,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_directive = if cli.verbose { "glossa=debug" } else { "glossa=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Init { path, force } => {
            project::init_project(&path, force)?;
            println!("Initialized glossa in {}", path.display());
        }

        Commands::Replay {
            config,
            key,
            no_wait,
            langs,
        } => {
            let config = GlossaConfig::load_from_dir(&config)?;
            let mut langs: Vec<LanguageCode> = langs.into_iter().map(LanguageCode::from).collect();
            if langs.is_empty() {
                langs.extend(config.translations.default_lang.clone());
            }
            info!(steps = langs.len(), dir = %config.catalog_dir().display(), "replaying");

            let plan = ReplayPlan {
                langs,
                key,
                wait_each: !no_wait,
            };
            for line in replay::replay(&config, &plan).await? {
                println!("{line}");
            }
        }

        Commands::Check { config } => {
            let config = GlossaConfig::load_from_dir(&config)?;
            let report = check::check_catalogs(&config).await?;
            for line in &report.lines {
                println!("{line}");
            }
            if report.failures > 0 {
                anyhow::bail!("{} catalog(s) failed to parse", report.failures);
            }
        }
    }

    Ok(())
}
