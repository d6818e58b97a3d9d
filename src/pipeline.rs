//! The single-shot run: probe → source material → generate → cover → publish.
//!
//! [`Pipeline`] borrows one implementation of each backend trait, so tests
//! can swap any of them for an in-memory fake. Every step runs to completion
//! before the next one starts; the first fatal error ends the run.

use crate::api::ChatBackend;
use crate::config::Config;
use crate::covers::{ImageProbe, select_cover};
use crate::error::Result;
use crate::models::{CoverImage, PostInput, SourceMaterial};
use crate::outputs::hashnode::{PostPublisher, PublishOutcome};
use crate::outputs::post::{build_post_input, prepare_article};
use crate::prompt::build_prompt;
use crate::sources::{NewsSource, gather};
use chrono::Local;
use rand::Rng;
use tracing::{info, instrument};

/// What a successful run did.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub material: SourceMaterial,
    pub cover: Option<CoverImage>,
    pub input: PostInput,
    pub outcome: PublishOutcome,
}

pub struct Pipeline<'a, C, N, P, H> {
    config: &'a Config,
    chat: &'a C,
    news: Option<&'a N>,
    images: &'a P,
    publisher: &'a H,
}

impl<'a, C, N, P, H> Pipeline<'a, C, N, P, H>
where
    C: ChatBackend,
    N: NewsSource,
    P: ImageProbe,
    H: PostPublisher,
{
    pub fn new(
        config: &'a Config,
        chat: &'a C,
        news: Option<&'a N>,
        images: &'a P,
        publisher: &'a H,
    ) -> Self {
        Self {
            config,
            chat,
            news,
            images,
            publisher,
        }
    }

    /// Run every step once, in order.
    ///
    /// Probe, source material, generation, cover, article, publication id,
    /// publish. Source material and cover never fail; any other step that
    /// fails ends the run before the next one starts.
    ///
    /// # Arguments
    ///
    /// * `rng` - Drives the news-item, topic and cover-file choices
    ///
    /// # Returns
    ///
    /// A [`RunReport`] describing what was published, or the first fatal
    /// [`crate::error::BotError`].
    #[instrument(level = "info", skip_all)]
    pub async fn run<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<RunReport> {
        let settings = &self.config.settings;

        self.chat.probe().await?;

        let now = Local::now();
        let news = if self.config.use_news { self.news } else { None };
        let material = gather(news, &settings.article.topics, now.date_naive(), rng).await;

        let prompt = build_prompt(&material, &settings.article.signature);
        let text = self.chat.generate(&prompt).await?;

        let cover = select_cover(
            material.news(),
            self.images,
            &self.config.repo,
            &settings.covers,
            rng,
        )
        .await;

        let article = prepare_article(&text, &settings.article, &Local::now());
        info!(title = %article.title, body_bytes = article.body.len(), "Article prepared");

        let publication_id = match &self.config.publication_id {
            Some(id) => id.clone(),
            None => self.publisher.lookup_publication_id().await?,
        };

        let input = build_post_input(
            &article,
            &publication_id,
            &settings.hashnode.tags,
            cover.as_ref(),
        );
        let outcome = self.publisher.publish(&input).await?;

        Ok(RunReport {
            material,
            cover,
            input,
            outcome,
        })
    }
}
