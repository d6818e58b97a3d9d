//! Instruction text sent to the generation backend.

use crate::models::{NewsItem, SourceMaterial};

const TITLE_RULE: &str = "**The very first line of the output MUST be a compelling, SEO-friendly, and catchy title \
(H1 markdown format, e.g., # Your Awesome Title).** ";

const TITLE_STYLE: &str = "This title must immediately grab the reader's attention, include strong and relevant SEO \
keywords, clearly reflect the core topic of the article, and be concise yet compelling. It should be written in a \
human, emotional, or curiosity-driven way that encourages clicks, even if it uses light, tasteful clickbait, while \
still staying true to the article's content. ";

const NO_PREAMBLE: &str = "Do not include 'Title: ', 'Author: ', or 'Publication Date: ' at the beginning. ";

const TONE: &str = "Optimize the content for SEO by naturally including relevant keywords. \
Avoid formulations that sound 'AI' and adopt a human and engaging tone.";

/// Build the single user instruction for `material`.
///
/// Both variants require an H1 title on the first line and the closing
/// `signature`.
pub fn build_prompt(material: &SourceMaterial, signature: &str) -> String {
    match material {
        SourceMaterial::News(item) => news_prompt(item, signature),
        SourceMaterial::Topic(topic) => topic_prompt(topic, signature),
    }
}

fn news_prompt(item: &NewsItem, signature: &str) -> String {
    let field = |f: &Option<String>| f.as_deref().unwrap_or("").trim().to_string();
    let title = item
        .title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or("Unknown Tech News");

    format!(
        "Write a professional, detailed, and engaging blog post of at least 1500 words in English. \
         The article must be based on the following tech news: \n\n\
         News Title: {title}\n\
         Description: {description}\n\
         Initial Content: {content}\n\
         Source Link: {url}\n\n\
         Develop this topic in depth, adding context, analysis, future implications, and examples if possible. \
         {TITLE_RULE}{TITLE_STYLE}{NO_PREAMBLE}\
         The article must end with the signature '{signature}'. \
         {TONE}",
        description = field(&item.description),
        content = field(&item.content),
        url = field(&item.url),
    )
}

fn topic_prompt(topic: &str, signature: &str) -> String {
    format!(
        "Write a professional, detailed, and engaging blog post of at least 1500 words in English on a current \
         topic related to '{topic}'. \
         {TITLE_RULE}{NO_PREAMBLE}\
         The article must end with the signature '{signature}'. \
         {TONE}"
    )
}
