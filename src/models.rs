//! Data models shared across the pipeline.
//!
//! - [`NewsItem`] / [`NewsSearchResponse`]: NewsAPI.org `v2/everything` payloads
//! - [`SourceMaterial`]: what the article is about
//! - [`ChatRequest`] / [`ChatMessage`]: chat-completions request body
//! - [`PostInput`] and friends: Hashnode mutation input
//! - [`CoverImage`]: a resolved cover URL and where it came from
//!
//! Field names follow the upstream JSON (camelCase) through serde renames.

use serde::{Deserialize, Serialize};

/// The outlet a news item was published by.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct NewsOutlet {
    pub id: Option<String>,
    pub name: Option<String>,
}

/// One article as returned by the news search backend.
///
/// Every field may be `null` upstream, so all of them are optional.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewsItem {
    #[serde(default)]
    pub source: Option<NewsOutlet>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Truncated body excerpt.
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub url_to_image: Option<String>,
    /// ISO 8601 timestamp, e.g. `2025-06-23T10:00:00Z`.
    #[serde(default)]
    pub published_at: Option<String>,
}

impl NewsItem {
    /// True when title, description and content are all present and non-blank.
    pub fn is_complete(&self) -> bool {
        [&self.title, &self.description, &self.content]
            .iter()
            .all(|f| f.as_deref().is_some_and(|s| !s.trim().is_empty()))
    }
}

/// Envelope of a news search response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsSearchResponse {
    pub status: String,
    #[serde(default)]
    pub total_results: Option<u64>,
    #[serde(default)]
    pub articles: Vec<NewsItem>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// What the article will be written about.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceMaterial {
    News(NewsItem),
    Topic(String),
}

impl SourceMaterial {
    pub fn news(&self) -> Option<&NewsItem> {
        match self {
            SourceMaterial::News(item) => Some(item),
            SourceMaterial::Topic(_) => None,
        }
    }
}

/// A role-tagged chat message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Body of a chat-completions request.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

/// A Hashnode tag reference.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Tag {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub slug: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CoverImageOptions {
    #[serde(rename = "coverImageURL")]
    pub cover_image_url: String,
    pub is_cover_attribution_hidden: bool,
}

/// Input object shared by the `publishPost` and `createDraft` mutations.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PostInput {
    pub title: String,
    pub content_markdown: String,
    pub publication_id: String,
    pub tags: Vec<Tag>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_image_options: Option<CoverImageOptions>,
}

/// The post (or draft) the publishing backend reports as created.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct PublishedPost {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

/// Where a cover image URL was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoverOrigin {
    /// The news item's own image, after content-type validation.
    News,
    /// A random file from the local covers directory.
    Folder,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CoverImage {
    pub url: String,
    pub origin: CoverOrigin,
}
