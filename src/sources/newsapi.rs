//! NewsAPI.org `v2/everything` client.
//!
//! The client itself reports failures as [`BotError`]s; it is
//! [`super::gather`] that turns them into the generic-topic fallback.

use super::NewsSource;
use crate::config::NewsSettings;
use crate::error::{BotError, Result};
use crate::models::{NewsItem, NewsSearchResponse};
use crate::utils::truncate_for_log;
use chrono::{Local, NaiveDate, NaiveDateTime, TimeDelta};
use rand::Rng;
use rand::seq::IndexedRandom;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

const SERVICE: &str = "newsapi";
const TIMEOUT: Duration = Duration::from_secs(30);
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

pub struct NewsApiClient {
    http: reqwest::Client,
    settings: NewsSettings,
    api_key: String,
}

impl std::fmt::Debug for NewsApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewsApiClient")
            .field("endpoint", &self.settings.endpoint)
            .field("query", &self.settings.query)
            .finish()
    }
}

impl NewsApiClient {
    pub fn new(settings: NewsSettings, api_key: String) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(TIMEOUT)
            .build()
            .map_err(|e| BotError::transport(SERVICE, e))?;
        Ok(Self {
            http,
            settings,
            api_key,
        })
    }

    /// Query-string parameters for a search issued at `now`.
    ///
    /// A window that does not fit the calendar falls back to the default one.
    fn query_params(&self, now: NaiveDateTime) -> Vec<(&'static str, String)> {
        let from = TimeDelta::try_days(self.settings.window_days)
            .filter(|window| *window > TimeDelta::zero())
            .and_then(|window| now.checked_sub_signed(window))
            .unwrap_or_else(|| {
                warn!(
                    window_days = self.settings.window_days,
                    "Unusable news window; searching the default one"
                );
                now - TimeDelta::days(NewsSettings::default().window_days)
            });
        vec![
            ("q", self.settings.query.clone()),
            ("language", self.settings.language.clone()),
            ("sortBy", self.settings.sort_by.clone()),
            ("apiKey", self.api_key.clone()),
            ("from", from.format(TIMESTAMP_FORMAT).to_string()),
            ("pageSize", self.settings.page_size.to_string()),
        ]
    }
}

impl NewsSource for NewsApiClient {
    #[instrument(level = "info", skip_all, fields(query = %self.settings.query))]
    async fn search(&self) -> Result<Vec<NewsItem>> {
        let params = self.query_params(Local::now().naive_local());
        info!("Retrieving tech news");

        let resp = self
            .http
            .get(&self.settings.endpoint)
            .query(&params)
            .send()
            .await
            .map_err(|e| BotError::transport(SERVICE, e))?;
        let status = resp.status().as_u16();
        let body = resp
            .text()
            .await
            .map_err(|e| BotError::transport(SERVICE, e))?;

        let articles = interpret_search(status, &body)?;
        info!(count = articles.len(), "News articles retrieved");
        Ok(articles)
    }
}

/// Decode a search response. NewsAPI reports its own errors as
/// `{"status": "error", "code": ..., "message": ...}`, usually with a 4xx.
pub fn interpret_search(status: u16, body: &str) -> Result<Vec<NewsItem>> {
    let parsed: NewsSearchResponse = match serde_json::from_str(body) {
        Ok(parsed) => parsed,
        Err(e) if (200..300).contains(&status) => {
            return Err(BotError::malformed(
                SERVICE,
                format!("{e}; body: {}", truncate_for_log(body, 300)),
            ));
        }
        Err(_) => {
            return Err(BotError::UnexpectedStatus {
                service: SERVICE,
                status,
                body: truncate_for_log(body, 300),
            });
        }
    };

    if parsed.status != "ok" {
        let message = parsed
            .message
            .or(parsed.code)
            .unwrap_or_else(|| "Message not available".to_string());
        return Err(BotError::UnexpectedStatus {
            service: SERVICE,
            status,
            body: message,
        });
    }
    debug!(total_results = ?parsed.total_results, "NewsAPI search ok");
    Ok(parsed.articles)
}

/// True when `item` was published on `today` according to the first 19
/// characters of its `publishedAt`.
pub fn published_on(item: &NewsItem, today: NaiveDate) -> bool {
    item.published_at
        .as_deref()
        .and_then(|ts| ts.get(..19))
        .and_then(|ts| NaiveDateTime::parse_from_str(ts, TIMESTAMP_FORMAT).ok())
        .is_some_and(|dt| dt.date() == today)
}

/// Prefer a complete item published today; otherwise any returned item.
pub fn pick_news_item<R: Rng + ?Sized>(
    items: &[NewsItem],
    today: NaiveDate,
    rng: &mut R,
) -> Option<NewsItem> {
    let fresh: Vec<&NewsItem> = items
        .iter()
        .filter(|a| a.is_complete() && published_on(a, today))
        .collect();

    if let Some(item) = fresh.choose(rng) {
        info!(candidates = fresh.len(), "Picked a complete news item from today");
        return Some((*item).clone());
    }

    let item = items.choose(rng).cloned();
    if item.is_some() {
        info!(
            returned = items.len(),
            "No complete news item from today; using a random recent one"
        );
    }
    item
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::test_http::{response, serve_once};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn item(title: &str, published_at: &str, complete: bool) -> NewsItem {
        NewsItem {
            title: Some(title.to_string()),
            description: Some("desc".to_string()),
            content: complete.then(|| "content".to_string()),
            url: Some(format!("https://news.example/{title}")),
            published_at: Some(published_at.to_string()),
            ..Default::default()
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 23).unwrap()
    }

    #[test]
    fn test_interpret_ok_response() {
        let body = r#"{
            "status": "ok",
            "totalResults": 2,
            "articles": [
                {"title": "A", "description": "d", "content": "c", "url": "https://a", "publishedAt": "2025-06-23T08:00:00Z"},
                {"title": "B", "description": null, "content": null, "url": "https://b", "publishedAt": "2025-06-22T08:00:00Z"}
            ]
        }"#;
        let items = interpret_search(200, body).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title.as_deref(), Some("A"));
    }

    #[test]
    fn test_interpret_ok_with_no_articles() {
        let items = interpret_search(200, r#"{"status":"ok","totalResults":0,"articles":[]}"#).unwrap();
        assert!(items.is_empty());
    }

    #[test]
    fn test_interpret_api_error_status() {
        let body = r#"{"status":"error","code":"apiKeyInvalid","message":"Your API key is invalid."}"#;
        let err = interpret_search(401, body).unwrap_err();
        match err {
            BotError::UnexpectedStatus { status, body, .. } => {
                assert_eq!(status, 401);
                assert_eq!(body, "Your API key is invalid.");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_interpret_non_json_error_page() {
        let err = interpret_search(502, "<html>Bad Gateway</html>").unwrap_err();
        assert!(matches!(err, BotError::UnexpectedStatus { status: 502, .. }));
    }

    #[test]
    fn test_interpret_non_json_success_is_malformed() {
        let err = interpret_search(200, "not json").unwrap_err();
        assert!(matches!(err, BotError::MalformedResponse { .. }));
    }

    #[test]
    fn test_published_on() {
        assert!(published_on(&item("a", "2025-06-23T23:59:59Z", true), today()));
        assert!(!published_on(&item("a", "2025-06-22T10:00:00Z", true), today()));
        assert!(!published_on(&item("a", "yesterday", true), today()));
        let mut undated = item("a", "", true);
        undated.published_at = None;
        assert!(!published_on(&undated, today()));
    }

    #[test]
    fn test_pick_prefers_complete_items_from_today() {
        let items = vec![
            item("old", "2025-06-20T10:00:00Z", true),
            item("today-incomplete", "2025-06-23T10:00:00Z", false),
            item("today", "2025-06-23T09:00:00Z", true),
        ];
        for seed in 0..10 {
            let mut rng = StdRng::seed_from_u64(seed);
            let picked = pick_news_item(&items, today(), &mut rng).unwrap();
            assert_eq!(picked.title.as_deref(), Some("today"));
        }
    }

    #[test]
    fn test_pick_falls_back_to_any_item() {
        let items = vec![
            item("old", "2025-06-20T10:00:00Z", true),
            item("older", "2025-06-19T10:00:00Z", false),
        ];
        let mut rng = StdRng::seed_from_u64(1);
        let picked = pick_news_item(&items, today(), &mut rng).unwrap();
        assert!(items.contains(&picked));
    }

    #[test]
    fn test_pick_from_empty_is_none() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(pick_news_item(&[], today(), &mut rng).is_none());
    }

    #[test]
    fn test_query_params() {
        let client = NewsApiClient::new(NewsSettings::default(), "key123".into()).unwrap();
        let now = NaiveDate::from_ymd_opt(2025, 6, 23)
            .unwrap()
            .and_hms_opt(12, 30, 0)
            .unwrap();
        let params = client.query_params(now);
        let get = |k: &str| {
            params
                .iter()
                .find(|(name, _)| *name == k)
                .map(|(_, v)| v.clone())
                .unwrap()
        };
        assert_eq!(get("from"), "2025-06-16T12:30:00");
        assert_eq!(get("pageSize"), "10");
        assert_eq!(get("sortBy"), "relevancy");
        assert_eq!(get("language"), "en");
        assert_eq!(get("apiKey"), "key123");
    }

    #[test]
    fn test_query_params_with_unusable_window() {
        let now = NaiveDate::from_ymd_opt(2025, 6, 23)
            .unwrap()
            .and_hms_opt(12, 30, 0)
            .unwrap();
        for window_days in [i64::MAX / 1000, -5, 0] {
            let settings = NewsSettings {
                window_days,
                ..Default::default()
            };
            let client = NewsApiClient::new(settings, "key".into()).unwrap();
            let params = client.query_params(now);
            let from = params.iter().find(|(k, _)| *k == "from").unwrap();
            assert_eq!(from.1, "2025-06-16T12:30:00", "window_days = {window_days}");
        }
    }

    #[tokio::test]
    async fn test_search_over_http() {
        let body = r#"{"status":"ok","totalResults":1,"articles":[{"title":"A","url":"https://a"}]}"#;
        let (base, server) = serve_once(response("200 OK", "application/json", body)).await;
        let settings = NewsSettings {
            endpoint: format!("{base}/v2/everything"),
            query: "AI OR rust".into(),
            ..Default::default()
        };
        let client = NewsApiClient::new(settings, "key123".into()).unwrap();

        let items = client.search().await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title.as_deref(), Some("A"));

        let request = server.await.unwrap();
        let request_line = request.lines().next().unwrap();
        assert!(
            request_line.starts_with("GET /v2/everything?q=AI+OR+rust&language=en&sortBy=relevancy&apiKey=key123&from="),
            "{request_line}"
        );
        assert!(request_line.contains("&pageSize=10 HTTP/1.1"));
    }

    #[tokio::test]
    async fn test_search_error_status_over_http() {
        let body = r#"{"status":"error","code":"rateLimited","message":"Too many requests"}"#;
        let (base, server) = serve_once(response("429 Too Many Requests", "application/json", body)).await;
        let settings = NewsSettings {
            endpoint: format!("{base}/v2/everything"),
            ..Default::default()
        };
        let client = NewsApiClient::new(settings, "key".into()).unwrap();
        let err = client.search().await.unwrap_err();
        assert!(matches!(err, BotError::UnexpectedStatus { status: 429, .. }));
        server.await.unwrap();
    }
}
