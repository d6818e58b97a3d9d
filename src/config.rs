//! Run configuration: secrets from the environment, everything else from an
//! optional YAML settings file and the command line.
//!
//! [`Config`] is built once in `main` and handed to each component; nothing
//! reads the environment after that.

use crate::cli::Cli;
use crate::error::{BotError, Result};
use crate::sources::topics::DEFAULT_TOPICS;
use crate::models::Tag;
use serde::Deserialize;
use std::path::PathBuf;
use tracing::{info, instrument, warn};

pub const GENERATION_KEY_VAR: &str = "MISTRAL_API_KEY";
pub const HASHNODE_KEY_VAR: &str = "HASHNODE_API_KEY";
pub const NEWS_KEY_VAR: &str = "NEWSAPI_API_KEY";

const DEFAULT_OWNER: &str = "your_username";
const DEFAULT_REPO: &str = "your_repo";
const DEFAULT_BRANCH: &str = "main";

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct GenerationSettings {
    /// Chat-completions endpoint of any OpenAI-compatible provider.
    pub endpoint: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            endpoint: "https://api.mistral.ai/v1/chat/completions".to_string(),
            model: "mistral-tiny".to_string(),
            temperature: 0.7,
            max_tokens: 2500,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct NewsSettings {
    pub endpoint: String,
    pub query: String,
    pub language: String,
    /// `relevancy`, `popularity` or `publishedAt`.
    pub sort_by: String,
    pub page_size: u32,
    /// How far back the search window reaches.
    pub window_days: i64,
}

impl NewsSettings {
    pub const WINDOW_DAYS: std::ops::RangeInclusive<i64> = 1..=365;
    /// NewsAPI caps `pageSize` at 100.
    pub const PAGE_SIZE: std::ops::RangeInclusive<u32> = 1..=100;
}

impl Default for NewsSettings {
    fn default() -> Self {
        Self {
            endpoint: "https://newsapi.org/v2/everything".to_string(),
            query: "technology OR AI OR cybersecurity OR software development".to_string(),
            language: "en".to_string(),
            sort_by: "relevancy".to_string(),
            page_size: 10,
            window_days: 7,
        }
    }
}

/// Which mutation the publisher sends.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PublishMode {
    /// `publishPost`: the post goes live immediately.
    #[default]
    Publish,
    /// `createDraft`: the post waits for manual review.
    Draft,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct HashnodeSettings {
    pub endpoint: String,
    pub publication_id: Option<String>,
    pub tags: Vec<Tag>,
    pub mode: PublishMode,
}

impl Default for HashnodeSettings {
    fn default() -> Self {
        Self {
            endpoint: "https://gql.hashnode.com/".to_string(),
            publication_id: None,
            tags: Vec::new(),
            mode: PublishMode::Publish,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ArticleSettings {
    /// Closing line every published body must contain.
    pub signature: String,
    pub fallback_title_prefix: String,
    /// Generic topics used when no news item is available.
    pub topics: Vec<String>,
}

impl Default for ArticleSettings {
    fn default() -> Self {
        Self {
            signature: "By the Tech News Desk.".to_string(),
            fallback_title_prefix: "Tech News Article from".to_string(),
            topics: DEFAULT_TOPICS.iter().map(|t| t.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct CoverSettings {
    /// Directory of cover images, relative to the workspace root.
    pub dir: String,
    /// Recognised file extensions, lower case, without the dot.
    pub extensions: Vec<String>,
}

impl Default for CoverSettings {
    fn default() -> Self {
        Self {
            dir: "covers".to_string(),
            extensions: ["png", "jpg", "jpeg", "gif", "webp"]
                .iter()
                .map(|e| e.to_string())
                .collect(),
        }
    }
}

/// Non-secret settings, loadable from YAML. Absent fields keep their defaults.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub generation: GenerationSettings,
    pub news: NewsSettings,
    pub hashnode: HashnodeSettings,
    pub article: ArticleSettings,
    pub covers: CoverSettings,
}

impl Settings {
    pub fn from_yaml(text: &str) -> Result<Self> {
        let settings: Self = serde_yaml::from_str(text)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject values the backends cannot use.
    pub fn validate(&self) -> Result<()> {
        if !NewsSettings::WINDOW_DAYS.contains(&self.news.window_days) {
            return Err(BotError::Config(format!(
                "news.window_days must be between {} and {}, got {}",
                NewsSettings::WINDOW_DAYS.start(),
                NewsSettings::WINDOW_DAYS.end(),
                self.news.window_days
            )));
        }
        if !NewsSettings::PAGE_SIZE.contains(&self.news.page_size) {
            return Err(BotError::Config(format!(
                "news.page_size must be between {} and {}, got {}",
                NewsSettings::PAGE_SIZE.start(),
                NewsSettings::PAGE_SIZE.end(),
                self.news.page_size
            )));
        }
        Ok(())
    }

    /// Load settings from `path`, or the defaults when no path is given.
    #[instrument(level = "info")]
    pub async fn load(path: Option<&str>) -> Result<Self> {
        let Some(path) = path else {
            info!("No settings file given; using defaults");
            return Ok(Self::default());
        };
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| BotError::Config(format!("cannot read settings file {path}: {e}")))?;
        let settings = Self::from_yaml(&text)?;
        info!(path, "Loaded settings file");
        Ok(settings)
    }
}

/// Bearer tokens for the three backends.
#[derive(Clone)]
pub struct Credentials {
    pub generation_key: String,
    pub hashnode_key: String,
    /// Only present when the news-grounded mode is active.
    pub news_key: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("generation_key", &preview(&self.generation_key))
            .field("hashnode_key", &preview(&self.hashnode_key))
            .field("news_key", &self.news_key.as_deref().map(preview))
            .finish()
    }
}

/// Where the repository holding the cover images lives, for raw-content URLs.
#[derive(Debug, Clone, PartialEq)]
pub struct RepoLocation {
    pub owner: String,
    pub repo: String,
    pub branch: String,
    /// Local checkout root; the covers directory is resolved against it.
    pub workspace: PathBuf,
}

impl RepoLocation {
    /// Resolve from `GITHUB_REPOSITORY`, `GITHUB_REF` and `GITHUB_WORKSPACE`,
    /// falling back to placeholder defaults.
    pub fn resolve(env: impl Fn(&str) -> Option<String>) -> Self {
        let (owner, repo) = match env("GITHUB_REPOSITORY")
            .as_deref()
            .and_then(|r| r.split_once('/'))
        {
            Some((owner, repo)) if !owner.is_empty() && !repo.is_empty() => {
                (owner.to_string(), repo.to_string())
            }
            _ => {
                warn!(
                    owner = DEFAULT_OWNER,
                    repo = DEFAULT_REPO,
                    "GITHUB_REPOSITORY not found; using default values"
                );
                (DEFAULT_OWNER.to_string(), DEFAULT_REPO.to_string())
            }
        };

        let branch = env("GITHUB_REF")
            .as_deref()
            .and_then(|r| r.strip_prefix("refs/heads/"))
            .filter(|b| !b.is_empty())
            .unwrap_or(DEFAULT_BRANCH)
            .to_string();

        let workspace = env("GITHUB_WORKSPACE")
            .filter(|w| !w.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));

        Self {
            owner,
            repo,
            branch,
            workspace,
        }
    }

    /// `https://raw.githubusercontent.com/{owner}/{repo}/{branch}`
    pub fn raw_base_url(&self) -> String {
        format!(
            "https://raw.githubusercontent.com/{}/{}/{}",
            self.owner, self.repo, self.branch
        )
    }
}

/// Everything a run needs, resolved once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub settings: Settings,
    pub credentials: Credentials,
    pub repo: RepoLocation,
    /// Query the news backend before generating.
    pub use_news: bool,
    /// Explicit publication id; `None` means look it up from the account.
    pub publication_id: Option<String>,
}

impl Config {
    /// Combine settings, command-line overrides and the environment.
    ///
    /// Fails on the first missing credential, before anything touches the
    /// network.
    ///
    /// # Arguments
    ///
    /// * `cli` - Parsed flags; `--covers-dir`, `--draft` and `--publication-id` override `settings`
    /// * `settings` - Loaded (or default) settings file
    /// * `env` - Environment lookup, normally `|k| std::env::var(k).ok()`
    ///
    /// # Returns
    ///
    /// The resolved [`Config`], or `MissingCredential` naming the first
    /// absent or empty key. `NEWSAPI_API_KEY` is only required in news mode.
    pub fn resolve(
        cli: &Cli,
        mut settings: Settings,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let use_news = !cli.no_news;

        let credentials = Credentials {
            generation_key: require(&env, GENERATION_KEY_VAR)?,
            hashnode_key: require(&env, HASHNODE_KEY_VAR)?,
            news_key: if use_news {
                Some(require(&env, NEWS_KEY_VAR)?)
            } else {
                None
            },
        };

        if let Some(dir) = &cli.covers_dir {
            settings.covers.dir = dir.clone();
        }
        if cli.draft {
            settings.hashnode.mode = PublishMode::Draft;
        }

        let publication_id = cli
            .publication_id
            .clone()
            .or_else(|| env("HASHNODE_PUBLICATION_ID"))
            .or_else(|| settings.hashnode.publication_id.clone())
            .filter(|id| !id.trim().is_empty());

        let config = Self {
            settings,
            credentials,
            repo: RepoLocation::resolve(&env),
            use_news,
            publication_id,
        };
        config.log_summary();
        Ok(config)
    }

    fn log_summary(&self) {
        info!(
            generation_key = %preview(&self.credentials.generation_key),
            hashnode_key = %preview(&self.credentials.hashnode_key),
            news_key = %self.credentials.news_key.as_deref().map(preview).unwrap_or_else(|| "<not used>".to_string()),
            "Credentials resolved"
        );
        info!(
            model = %self.settings.generation.model,
            use_news = self.use_news,
            mode = ?self.settings.hashnode.mode,
            publication_id = self.publication_id.as_deref().unwrap_or("<lookup>"),
            raw_base = %self.repo.raw_base_url(),
            "Configuration loaded"
        );
    }
}

fn require(env: &impl Fn(&str) -> Option<String>, var: &'static str) -> Result<String> {
    match env(var) {
        Some(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
        _ => Err(BotError::MissingCredential { var }),
    }
}

/// First few characters of a secret plus its length.
fn preview(val: &str) -> String {
    let head: String = val.chars().take(4).collect();
    format!("{}...({} chars)", head, val.chars().count())
}
