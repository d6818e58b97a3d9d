//! Command-line interface definitions.
//!
//! Secrets are never taken from flags; they are read from the environment by
//! [`crate::config::Config::resolve`]. Every option here can also be set
//! through the environment variable named in its `env` attribute.

use clap::Parser;
use clap::builder::BoolishValueParser;

/// Generate a tech article with an LLM and publish it to Hashnode.
///
/// # Examples
///
/// ```sh
/// # News-grounded article, published immediately
/// hashnode_newsroom --config newsroom.yaml
///
/// # Generic topic, saved as a draft
/// hashnode_newsroom --no-news --draft
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a YAML settings file
    #[arg(short, long, env = "NEWSROOM_CONFIG")]
    pub config: Option<String>,

    /// Skip the news backend and write about a random generic topic
    #[arg(long, env = "NEWSROOM_NO_NEWS", value_parser = BoolishValueParser::new())]
    pub no_news: bool,

    /// Create a draft instead of publishing the post directly
    #[arg(long, env = "NEWSROOM_DRAFT", value_parser = BoolishValueParser::new())]
    pub draft: bool,

    /// Directory of cover images, relative to the workspace
    #[arg(long)]
    pub covers_dir: Option<String>,

    /// Hashnode publication id (overrides the settings file)
    #[arg(long)]
    pub publication_id: Option<String>,
}
