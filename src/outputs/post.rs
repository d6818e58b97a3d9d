//! Turning generated text into a Hashnode post input.
//!
//! - [`split_title`]: pull an H1 heading off the first line
//! - [`ensure_signature`]: append the closing signature once
//! - [`prepare_article`] / [`build_post_input`]: assemble the mutation input

use crate::config::ArticleSettings;
use crate::models::{CoverImage, CoverImageOptions, PostInput, Tag};
use chrono::{DateTime, Local};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info};

/// A single `#`, one or more spaces, then the title.
static H1_HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^# +(\S.*)$").expect("valid heading pattern"));

const FALLBACK_TITLE_FORMAT: &str = "%d %B %Y - %H:%M";

/// Title and markdown body ready for publishing.
#[derive(Debug, Clone, PartialEq)]
pub struct Article {
    pub title: String,
    pub body: String,
}

/// If the first line of `text` is a top-level heading, return the heading
/// text and the remaining body, both trimmed.
pub fn split_title(text: &str) -> Option<(String, String)> {
    let text = text.trim();
    let (first, rest) = text.split_once('\n').unwrap_or((text, ""));
    let caps = H1_HEADING.captures(first.trim())?;
    Some((caps[1].trim().to_string(), rest.trim().to_string()))
}

/// `"{prefix} 23 June 2025 - 14:05"`
pub fn fallback_title(prefix: &str, now: &DateTime<Local>) -> String {
    format!("{} {}", prefix, now.format(FALLBACK_TITLE_FORMAT))
        .trim()
        .to_string()
}

/// Append `signature` unless the body already contains it verbatim.
pub fn ensure_signature(body: &str, signature: &str) -> String {
    if signature.is_empty() || body.contains(signature) {
        return body.to_string();
    }
    if body.is_empty() {
        return signature.to_string();
    }
    format!("{body}\n\n{signature}")
}

/// Extract the title and enforce the signature.
pub fn prepare_article(text: &str, settings: &ArticleSettings, now: &DateTime<Local>) -> Article {
    let (title, body) = match split_title(text) {
        Some((title, body)) => {
            debug!(%title, "Title extracted from H1 heading");
            (title, body)
        }
        None => {
            let title = fallback_title(&settings.fallback_title_prefix, now);
            info!(%title, "No H1 heading on the first line; using a timestamp title");
            (title, text.trim().to_string())
        }
    };
    Article {
        title,
        body: ensure_signature(&body, &settings.signature),
    }
}

/// Mutation input for `article`. Cover options are set only when a cover
/// was resolved.
pub fn build_post_input(
    article: &Article,
    publication_id: &str,
    tags: &[Tag],
    cover: Option<&CoverImage>,
) -> PostInput {
    PostInput {
        title: article.title.clone(),
        content_markdown: article.body.clone(),
        publication_id: publication_id.to_string(),
        tags: tags.to_vec(),
        cover_image_options: cover.map(|c| CoverImageOptions {
            cover_image_url: c.url.clone(),
            is_cover_attribution_hidden: true,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CoverOrigin;
    use chrono::TimeZone;

    const SIG: &str = "By the Tech News Desk.";

    fn now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 6, 23, 14, 5, 0).unwrap()
    }

    fn settings() -> ArticleSettings {
        ArticleSettings {
            signature: SIG.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_split_title_from_heading() {
        let (title, body) = split_title("#   The Future of Rust  \n\nIntro paragraph.\n\nMore.").unwrap();
        assert_eq!(title, "The Future of Rust");
        assert_eq!(body, "Intro paragraph.\n\nMore.");
    }

    #[test]
    fn test_split_title_handles_crlf_and_leading_blank_lines() {
        let (title, body) = split_title("\n\n# Title\r\nBody\r\n").unwrap();
        assert_eq!(title, "Title");
        assert_eq!(body, "Body");
    }

    #[test]
    fn test_split_title_rejects_non_h1() {
        assert!(split_title("## Subheading\nBody").is_none());
        assert!(split_title("#NoSpace\nBody").is_none());
        assert!(split_title("Title: Something\nBody").is_none());
        assert!(split_title("#   \nBody").is_none());
        assert!(split_title("").is_none());
    }

    #[test]
    fn test_heading_only_text() {
        let (title, body) = split_title("# Lonely title").unwrap();
        assert_eq!(title, "Lonely title");
        assert_eq!(body, "");
    }

    #[test]
    fn test_fallback_title_format() {
        assert_eq!(
            fallback_title("Tech News Article from", &now()),
            "Tech News Article from 23 June 2025 - 14:05"
        );
    }

    #[test]
    fn test_ensure_signature_appends_once() {
        let once = ensure_signature("Body text.", SIG);
        assert_eq!(once, format!("Body text.\n\n{SIG}"));
        let twice = ensure_signature(&once, SIG);
        assert_eq!(once, twice);
        assert_eq!(twice.matches(SIG).count(), 1);
    }

    #[test]
    fn test_ensure_signature_keeps_existing() {
        let body = format!("Body.\n\n{SIG}\n\nP.S. thanks");
        assert_eq!(ensure_signature(&body, SIG), body);
    }

    #[test]
    fn test_prepare_article_with_heading() {
        let article = prepare_article("# Great Title\n\nBody.", &settings(), &now());
        assert_eq!(article.title, "Great Title");
        assert_eq!(article.body, format!("Body.\n\n{SIG}"));
        assert!(!article.body.contains("# Great Title"));
    }

    #[test]
    fn test_prepare_article_without_heading_keeps_text() {
        let text = "Just prose with no heading.\nSecond line.";
        let article = prepare_article(text, &settings(), &now());
        assert_eq!(article.title, "Tech News Article from 23 June 2025 - 14:05");
        assert!(article.body.starts_with(text));
        assert!(article.body.ends_with(SIG));
    }

    #[test]
    fn test_build_post_input() {
        let article = Article {
            title: "T".into(),
            body: "B".into(),
        };
        let cover = CoverImage {
            url: "https://raw.githubusercontent.com/o/r/main/covers/a.png".into(),
            origin: CoverOrigin::Folder,
        };
        let input = build_post_input(&article, "pub-1", &[], Some(&cover));
        assert_eq!(input.publication_id, "pub-1");
        assert!(input.tags.is_empty());
        let opts = input.cover_image_options.unwrap();
        assert_eq!(opts.cover_image_url, cover.url);
        assert!(opts.is_cover_attribution_hidden);

        let input = build_post_input(&article, "pub-1", &[], None);
        assert!(input.cover_image_options.is_none());
    }
}
