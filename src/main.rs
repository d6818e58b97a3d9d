//! # Hashnode Newsroom
//!
//! A single-shot batch job that writes a tech blog article with an LLM and
//! publishes it to a Hashnode publication. Meant to be run by a periodic
//! external trigger (e.g. a scheduled CI workflow); every run is independent.
//!
//! ## Usage
//!
//! ```sh
//! MISTRAL_API_KEY=... HASHNODE_API_KEY=... NEWSAPI_API_KEY=... \
//!     hashnode_newsroom --config newsroom.yaml
//! ```
//!
//! ## Architecture
//!
//! The run is strictly sequential:
//! 1. **Configuration**: credentials from the environment, settings from YAML
//! 2. **Probe**: one cheap authenticated call to the generation backend
//! 3. **Source material**: a recent news item, or a random generic topic
//! 4. **Generation**: one chat-completions request
//! 5. **Cover**: validated news image, random local cover, or none
//! 6. **Publish**: one GraphQL mutation against Hashnode
//!
//! Any fatal error ends the run with a non-zero exit status.

use clap::Parser;
use std::process::ExitCode;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod api;
mod cli;
mod config;
mod covers;
mod error;
mod models;
mod outputs;
mod pipeline;
mod prompt;
mod sources;
mod utils;

use api::ChatClient;
use cli::Cli;
use config::{Config, Settings};
use covers::HttpImageProbe;
use error::Result;
use outputs::hashnode::{HashnodeClient, PublishOutcome};
use pipeline::{Pipeline, RunReport};
use sources::newsapi::NewsApiClient;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!(version = env!("CARGO_PKG_VERSION"), "hashnode_newsroom starting up");

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    let result = run(args).await;
    let elapsed = start_time.elapsed();

    match result {
        Ok(report) => {
            let url = match &report.outcome {
                PublishOutcome::Created(post) => post.url.clone(),
                PublishOutcome::Unconfirmed => None,
            };
            info!(
                ?elapsed,
                title = %report.input.title,
                url = url.as_deref().unwrap_or("<not retrieved>"),
                news_grounded = report.material.news().is_some(),
                cover = report.cover.as_ref().map(|c| c.url.as_str()).unwrap_or("<none>"),
                "Execution complete"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(?elapsed, error = %e, exit_code = e.exit_code(), "Run failed");
            ExitCode::from(e.exit_code())
        }
    }
}

/// Resolve configuration, build the backend clients and run the pipeline once.
#[instrument(level = "info", skip_all)]
async fn run(args: Cli) -> Result<RunReport> {
    let settings = Settings::load(args.config.as_deref()).await?;
    let config = Config::resolve(&args, settings, |k| std::env::var(k).ok())?;

    let chat = ChatClient::new(
        config.settings.generation.clone(),
        config.credentials.generation_key.clone(),
    )?;
    let news = match &config.credentials.news_key {
        Some(key) if config.use_news => {
            Some(NewsApiClient::new(config.settings.news.clone(), key.clone())?)
        }
        _ => None,
    };
    let images = HttpImageProbe::new()?;
    let publisher = HashnodeClient::new(
        config.settings.hashnode.clone(),
        config.credentials.hashnode_key.clone(),
    )?;

    let mut rng = rand::rng();
    Pipeline::new(&config, &chat, news.as_ref(), &images, &publisher)
        .run(&mut rng)
        .await
}
