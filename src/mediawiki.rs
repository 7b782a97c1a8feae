//! MediaWiki Action API client.
//!
//! Implements both collaborator traits over HTTP:
//!
//! - [`RevisionIndex`] via `action=query&prop=revisions`, walking the
//!   `continue` object until the server stops returning one.
//! - [`ContentSource`] via `action=parse&oldid=<id>&section=<n>`, which
//!   renders only the requested section instead of the whole page.
//!
//! Responses are requested with `formatversion=2`; the parsers also accept
//! the legacy `formatversion=1` shapes (`pages` as an object keyed by page
//! id, `text` wrapped in `{"*": ...}`).
//!
//! # Rate limiting
//!
//! HTTP 429 and API error codes `ratelimited` / `maxlag` are reported as
//! [`RevisionError::RateLimited`]. Retrying is the caller's job
//! ([`crate::fetcher::ContentFetcher`]).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::config::{FetchConfig, WikiConfig};
use crate::error::RevisionError;
use crate::models::RevisionRef;
use crate::traits::{ContentSource, RevisionIndex};

/// HTTP client for one MediaWiki installation.
pub struct MediaWikiClient {
    http: reqwest::Client,
    api_url: String,
    page_limit: String,
    section: u32,
}

impl MediaWikiClient {
    pub fn new(wiki: &WikiConfig, fetch: &FetchConfig) -> Result<Self, RevisionError> {
        let http = reqwest::Client::builder()
            .user_agent(wiki.user_agent.clone())
            .timeout(Duration::from_secs(wiki.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            api_url: wiki.api_url.clone(),
            page_limit: wiki.page_limit.clone(),
            section: fetch.section,
        })
    }

    async fn get_json(&self, params: &[(String, String)]) -> Result<Value, RevisionError> {
        let response = self.http.get(&self.api_url).query(params).send().await?;
        let status = response.status();

        if status.as_u16() == 429 {
            return Err(RevisionError::RateLimited);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RevisionError::Transport(format!(
                "HTTP {}: {}",
                status,
                truncate(&body, 200)
            )));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| RevisionError::MalformedResponse(e.to_string()))
    }
}

#[async_trait]
impl RevisionIndex for MediaWikiClient {
    async fn list_revisions(&self, title: &str) -> Result<Vec<RevisionRef>, RevisionError> {
        let mut revisions = Vec::new();
        let mut continuation: Vec<(String, String)> = Vec::new();

        loop {
            let mut params = vec![
                param("action", "query"),
                param("prop", "revisions"),
                param("titles", title),
                param("rvprop", "ids|timestamp"),
                param("rvlimit", &self.page_limit),
                param("rvdir", "newer"),
                param("format", "json"),
                param("formatversion", "2"),
            ];
            params.extend(continuation.iter().cloned());

            let json = match self.get_json(&params).await {
                Err(RevisionError::RateLimited) => {
                    return Err(RevisionError::Transport(
                        "rate limited while listing revisions".to_string(),
                    ))
                }
                other => other?,
            };
            let page = parse_revision_page(&json, title)?;
            revisions.extend(page.revisions);
            debug!(title, fetched = revisions.len(), "revision listing page");

            match page.continuation {
                Some(next) => continuation = next,
                None => break,
            }
        }

        Ok(revisions)
    }
}

#[async_trait]
impl ContentSource for MediaWikiClient {
    async fn render_lead(&self, revision_id: &str) -> Result<String, RevisionError> {
        let params = vec![
            param("action", "parse"),
            param("oldid", revision_id),
            param("prop", "text"),
            param("section", &self.section.to_string()),
            param("disablelimitreport", "1"),
            param("disableeditsection", "1"),
            param("format", "json"),
            param("formatversion", "2"),
        ];
        let json = self.get_json(&params).await?;
        parse_rendered_text(&json)
    }
}

fn param(key: &str, value: &str) -> (String, String) {
    (key.to_string(), value.to_string())
}

fn truncate(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

/// One page of a revision listing.
#[derive(Debug, Clone, PartialEq)]
pub struct RevisionPage {
    pub revisions: Vec<RevisionRef>,
    /// Query parameters to send with the next request, if there is one.
    pub continuation: Option<Vec<(String, String)>>,
}

/// Map an `{"error": {...}}` payload to a [`RevisionError`].
fn api_error(json: &Value) -> Option<RevisionError> {
    let error = json.get("error")?;
    let code = error.get("code").and_then(Value::as_str).unwrap_or("unknown");
    let info = error.get("info").and_then(Value::as_str).unwrap_or("");
    Some(match code {
        "ratelimited" | "maxlag" => RevisionError::RateLimited,
        _ => RevisionError::Transport(format!("API error {}: {}", code, info)),
    })
}

/// Parse one `action=query&prop=revisions` response.
pub fn parse_revision_page(json: &Value, title: &str) -> Result<RevisionPage, RevisionError> {
    if let Some(err) = api_error(json) {
        return Err(match err {
            RevisionError::RateLimited => {
                RevisionError::Transport("rate limited while listing revisions".to_string())
            }
            other => other,
        });
    }

    let pages = json
        .get("query")
        .and_then(|q| q.get("pages"))
        .ok_or_else(|| RevisionError::MalformedResponse("missing query.pages".to_string()))?;

    let page = match pages {
        Value::Array(items) => items.first(),
        Value::Object(map) => map.values().next(),
        _ => None,
    }
    .ok_or_else(|| RevisionError::MalformedResponse("empty query.pages".to_string()))?;

    if page.get("missing").is_some() || page.get("invalid").is_some() {
        return Err(RevisionError::NotFound(title.to_string()));
    }

    let mut revisions = Vec::new();
    if let Some(items) = page.get("revisions") {
        let items = items
            .as_array()
            .ok_or_else(|| RevisionError::MalformedResponse("revisions is not an array".into()))?;
        for item in items {
            revisions.push(parse_revision(item)?);
        }
    }

    let continuation = json.get("continue").and_then(Value::as_object).map(|obj| {
        obj.iter()
            .map(|(k, v)| (k.clone(), scalar_to_string(v)))
            .collect::<Vec<_>>()
    });

    Ok(RevisionPage {
        revisions,
        continuation,
    })
}

fn parse_revision(item: &Value) -> Result<RevisionRef, RevisionError> {
    let id = item
        .get("revid")
        .filter(|v| v.is_number() || v.is_string())
        .map(scalar_to_string)
        .ok_or_else(|| RevisionError::MalformedResponse("revision without revid".into()))?;
    let raw_ts = item
        .get("timestamp")
        .and_then(Value::as_str)
        .ok_or_else(|| RevisionError::MalformedResponse(format!("revision {} without timestamp", id)))?;
    let timestamp = DateTime::parse_from_rfc3339(raw_ts)
        .map_err(|e| RevisionError::MalformedResponse(format!("bad timestamp '{}': {}", raw_ts, e)))?
        .with_timezone(&Utc);
    Ok(RevisionRef { id, timestamp })
}

fn scalar_to_string(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Parse one `action=parse` response into its rendered HTML.
pub fn parse_rendered_text(json: &Value) -> Result<String, RevisionError> {
    if let Some(err) = api_error(json) {
        return Err(err);
    }

    let text = json
        .get("parse")
        .and_then(|p| p.get("text"))
        .ok_or_else(|| RevisionError::MalformedResponse("missing parse.text".to_string()))?;

    match text {
        Value::String(s) => Ok(s.clone()),
        Value::Object(_) => text
            .get("*")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| RevisionError::MalformedResponse("missing parse.text.*".to_string())),
        _ => Err(RevisionError::MalformedResponse(
            "parse.text is not a string".to_string(),
        )),
    }
}
