//! Source material for the article: a recent news item, or a generic topic.
//!
//! | Source | Module | Notes |
//! |--------|--------|-------|
//! | NewsAPI.org | [`newsapi`] | Requires `NEWSAPI_API_KEY`; filtered to today's complete items |
//! | Static list | [`topics`] | Fallback when news is disabled or unavailable |
//!
//! News retrieval never fails the run: every error degrades to a topic.

pub mod newsapi;
pub mod topics;

use crate::error::Result;
use crate::models::{NewsItem, SourceMaterial};
use chrono::NaiveDate;
use rand::Rng;
use tracing::{info, instrument, warn};

/// A backend that can search for recent news.
pub trait NewsSource {
    /// Run the configured search and return every article the backend sent.
    async fn search(&self) -> Result<Vec<NewsItem>>;
}

/// Decide what the article is about.
///
/// With a news source, search it and pick an item via
/// [`newsapi::pick_news_item`]. Any failure, an empty result, or no source at
/// all falls back to a random entry of `topics`.
#[instrument(level = "info", skip_all, fields(news_enabled = news.is_some()))]
pub async fn gather<N, R>(
    news: Option<&N>,
    topics: &[String],
    today: NaiveDate,
    rng: &mut R,
) -> SourceMaterial
where
    N: NewsSource,
    R: Rng + ?Sized,
{
    if let Some(source) = news {
        match source.search().await {
            Ok(items) if items.is_empty() => {
                warn!("News backend returned no articles for the current query");
            }
            Ok(items) => {
                if let Some(item) = newsapi::pick_news_item(&items, today, rng) {
                    info!(
                        title = item.title.as_deref().unwrap_or("<untitled>"),
                        url = item.url.as_deref().unwrap_or("<none>"),
                        "Using news item as source material"
                    );
                    return SourceMaterial::News(item);
                }
            }
            Err(e) => {
                warn!(error = %e, "News retrieval failed; falling back to a generic topic");
            }
        }
    }

    let topic = topics::pick_topic(topics, rng);
    info!(%topic, "Using generic topic as source material");
    SourceMaterial::Topic(topic)
}
