//! Hashnode GraphQL client.
//!
//! One endpoint, three operations: look up the account's publication, publish
//! a post, or create a draft. Responses are read as JSON whatever the HTTP
//! status, because GraphQL errors usually arrive with a 200.

use crate::config::{HashnodeSettings, PublishMode};
use crate::error::{BotError, Result};
use crate::models::{PostInput, PublishedPost};
use crate::utils::truncate_for_log;
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

const SERVICE: &str = "hashnode";
const TIMEOUT: Duration = Duration::from_secs(60);

const PUBLISH_POST_MUTATION: &str = r#"
mutation PublishPost($input: PublishPostInput!) {
  publishPost(input: $input) {
    post {
      id
      title
      slug
      url
    }
  }
}
"#;

const CREATE_DRAFT_MUTATION: &str = r#"
mutation CreateDraft($input: CreateDraftInput!) {
  createDraft(input: $input) {
    draft {
      id
      title
      slug
    }
  }
}
"#;

const MY_PUBLICATIONS_QUERY: &str = r#"
query MyPublications {
  me {
    publications(first: 1) {
      edges {
        node {
          id
          title
        }
      }
    }
  }
}
"#;

impl PublishMode {
    fn mutation(self) -> &'static str {
        match self {
            PublishMode::Publish => PUBLISH_POST_MUTATION,
            PublishMode::Draft => CREATE_DRAFT_MUTATION,
        }
    }

    /// Path to the created object under `data`.
    fn result_path(self) -> (&'static str, &'static str) {
        match self {
            PublishMode::Publish => ("publishPost", "post"),
            PublishMode::Draft => ("createDraft", "draft"),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct GraphQlError {
    pub message: String,
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    errors: Option<Vec<GraphQlError>>,
}

/// What the backend reported after an error-free mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum PublishOutcome {
    /// The created post or draft came back in the response.
    Created(PublishedPost),
    /// No errors, but no post object either.
    Unconfirmed,
}

/// The publishing backend as seen by the pipeline.
pub trait PostPublisher {
    /// Id of the first publication owned by the authenticated account.
    async fn lookup_publication_id(&self) -> Result<String>;

    /// Submit `input`. At most one attempt.
    async fn publish(&self, input: &PostInput) -> Result<PublishOutcome>;
}

/// Parse a GraphQL body, failing on a non-empty `errors` list.
fn parse_graphql(status: u16, body: &str) -> Result<Option<Value>> {
    let parsed: GraphQlResponse = match serde_json::from_str(body) {
        Ok(parsed) => parsed,
        Err(e) if (200..300).contains(&status) => {
            return Err(BotError::malformed(
                SERVICE,
                format!("invalid JSON ({e}): {}", truncate_for_log(body, 300)),
            ));
        }
        Err(_) => return Err(status_error(status, body)),
    };

    if let Some(errors) = parsed.errors.filter(|e| !e.is_empty()) {
        let messages = errors
            .iter()
            .map(|e| e.message.as_str())
            .collect::<Vec<_>>()
            .join("; ");
        return Err(BotError::GraphQl {
            service: SERVICE,
            messages,
        });
    }

    if !(200..300).contains(&status) {
        return Err(status_error(status, body));
    }
    Ok(parsed.data)
}

fn status_error(status: u16, body: &str) -> BotError {
    match status {
        401 | 403 => BotError::Auth {
            service: SERVICE,
            status,
        },
        _ => BotError::UnexpectedStatus {
            service: SERVICE,
            status,
            body: truncate_for_log(body, 500),
        },
    }
}

/// Interpret the response to a publish or draft mutation.
///
/// # Arguments
///
/// * `status` - HTTP status code
/// * `body` - Raw response body
/// * `mode` - Which mutation was sent; selects `publishPost.post` or `createDraft.draft`
///
/// # Returns
///
/// - `Created` when the post object came back
/// - `Unconfirmed` when there were no errors and no post object
/// - `GraphQl` error for a non-empty `errors` list, whatever the status
/// - `Auth` for 401/403, `UnexpectedStatus` for other non-2xx answers
/// - `MalformedResponse` for a 2xx body that is not JSON
pub fn interpret_publish(status: u16, body: &str, mode: PublishMode) -> Result<PublishOutcome> {
    let data = parse_graphql(status, body)?;
    let (field, object) = mode.result_path();
    let created = data
        .as_ref()
        .and_then(|d| d.get(field))
        .and_then(|f| f.get(object))
        .filter(|o| !o.is_null());

    match created {
        Some(obj) => {
            let post: PublishedPost = serde_json::from_value(obj.clone())
                .map_err(|e| BotError::malformed(SERVICE, format!("{object} object: {e}")))?;
            Ok(PublishOutcome::Created(post))
        }
        None => Ok(PublishOutcome::Unconfirmed),
    }
}

/// Interpret the response to [`MY_PUBLICATIONS_QUERY`].
pub fn interpret_publication_lookup(status: u16, body: &str) -> Result<String> {
    let data = parse_graphql(status, body)?;
    let me = data
        .as_ref()
        .and_then(|d| d.get("me"))
        .filter(|m| !m.is_null())
        .ok_or_else(|| BotError::malformed(SERVICE, "publication lookup returned no 'me' object"))?;

    me.pointer("/publications/edges/0/node/id")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| {
            BotError::Config(
                "the Hashnode account has no publication; set hashnode.publication_id".to_string(),
            )
        })
}

/// `reqwest` implementation of [`PostPublisher`].
pub struct HashnodeClient {
    http: reqwest::Client,
    settings: HashnodeSettings,
    api_key: String,
}

impl std::fmt::Debug for HashnodeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HashnodeClient")
            .field("endpoint", &self.settings.endpoint)
            .field("mode", &self.settings.mode)
            .finish()
    }
}

impl HashnodeClient {
    pub fn new(settings: HashnodeSettings, api_key: String) -> Result<Self> {
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

    async fn execute(&self, payload: &Value) -> Result<(u16, String)> {
        let resp = self
            .http
            .post(&self.settings.endpoint)
            .bearer_auth(&self.api_key)
            .json(payload)
            .send()
            .await
            .map_err(|e| BotError::transport(SERVICE, e))?;
        let status = resp.status().as_u16();
        let body = resp
            .text()
            .await
            .map_err(|e| BotError::transport(SERVICE, e))?;
        Ok((status, body))
    }
}

/// GraphQL request body: `{ "query": <mutation for mode>, "variables": { "input": <input> } }`.
pub fn mutation_payload(input: &PostInput, mode: PublishMode) -> Value {
    json!({
        "query": mode.mutation(),
        "variables": { "input": input },
    })
}

/// The input as logged: everything except the full markdown body.
fn loggable_input(input: &PostInput) -> Value {
    let mut value = json!(input);
    if let Some(obj) = value.as_object_mut() {
        obj.insert(
            "contentMarkdown".to_string(),
            Value::String(truncate_for_log(&input.content_markdown, 200)),
        );
    }
    value
}

impl PostPublisher for HashnodeClient {
    #[instrument(level = "info", skip_all)]
    async fn lookup_publication_id(&self) -> Result<String> {
        info!("No publication id configured; looking it up from the account");
        let (status, body) = self
            .execute(&json!({ "query": MY_PUBLICATIONS_QUERY }))
            .await?;
        let id = interpret_publication_lookup(status, &body)?;
        info!(publication_id = %id, "Publication id resolved");
        Ok(id)
    }

    #[instrument(level = "info", skip_all, fields(title = %input.title, mode = ?self.settings.mode))]
    async fn publish(&self, input: &PostInput) -> Result<PublishOutcome> {
        let mode = self.settings.mode;
        debug!(variables = %loggable_input(input), "Payload sent to Hashnode");
        info!("Attempting to publish article");

        let (status, body) = self.execute(&mutation_payload(input, mode)).await?;
        info!(status, response = %truncate_for_log(&body, 500), "Publish response");

        match interpret_publish(status, &body, mode) {
            Ok(PublishOutcome::Created(post)) => {
                match post.url.as_deref() {
                    Some(url) => info!(%url, slug = ?post.slug, "Article published successfully"),
                    None => info!(id = ?post.id, slug = ?post.slug, "Article created (no URL returned)"),
                }
                Ok(PublishOutcome::Created(post))
            }
            Ok(PublishOutcome::Unconfirmed) => {
                warn!("Article published but the response carried no post object (URL not retrieved)");
                Ok(PublishOutcome::Unconfirmed)
            }
            Err(e) => {
                error!(error = %e, "Publishing failed");
                Err(e)
            }
        }
    }
}
