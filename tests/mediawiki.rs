//! MediaWikiClient against a local mock of the Action API.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{TimeZone, Utc};
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use lede::analyze::{AnalysisOptions, Engine};
use lede::config::{FetchConfig, WikiConfig};
use lede::error::RevisionError;
use lede::fetcher::{ContentFetcher, FetchPolicy};
use lede::mediawiki::MediaWikiClient;
use lede::normalize::Normalizer;
use lede::store::MemoryStore;
use lede::traits::{ContentSource, RevisionIndex};

#[derive(Default)]
struct MockWiki {
    continuations: Mutex<Vec<String>>,
    parse_calls: Mutex<HashMap<String, u32>>,
}

async fn api(
    State(wiki): State<Arc<MockWiki>>,
    Query(q): Query<HashMap<String, String>>,
) -> Response {
    match q.get("action").map(String::as_str) {
        Some("query") => query(&wiki, &q).into_response(),
        Some("parse") => parse(&wiki, &q),
        _ => (StatusCode::BAD_REQUEST, "unknown action").into_response(),
    }
}

fn query(wiki: &MockWiki, q: &HashMap<String, String>) -> Json<serde_json::Value> {
    if q.get("titles").map(String::as_str) == Some("Missing Page") {
        return Json(json!({
            "query": {"pages": [{"ns": 0, "title": "Missing Page", "missing": true}]}
        }));
    }

    match q.get("rvcontinue") {
        None => Json(json!({
            "continue": {"rvcontinue": "20050101000000|2", "continue": "||"},
            "query": {"pages": [{"pageid": 9, "title": "27 Club", "revisions": [
                {"revid": 1, "timestamp": "2004-01-01T00:00:00Z"},
                {"revid": 2, "timestamp": "2004-01-11T00:00:00Z"}
            ]}]}
        })),
        Some(token) => {
            wiki.continuations.lock().unwrap().push(token.clone());
            Json(json!({
                "query": {"pages": [{"pageid": 9, "title": "27 Club", "revisions": [
                    {"revid": 3, "timestamp": "2004-01-21T00:00:00Z"}
                ]}]}
            }))
        }
    }
}

fn parse(wiki: &MockWiki, q: &HashMap<String, String>) -> Response {
    let oldid = q.get("oldid").cloned().unwrap_or_default();
    let calls = {
        let mut map = wiki.parse_calls.lock().unwrap();
        let n = map.entry(oldid.clone()).or_insert(0);
        *n += 1;
        *n
    };

    // revision 3 is rate limited on its first request
    if oldid == "3" && calls == 1 {
        return (StatusCode::TOO_MANY_REQUESTS, "slow down").into_response();
    }

    let sentence = match oldid.as_str() {
        "1" | "2" => "The 27 Club is a list of musicians.",
        _ => "The 27 Club is a popular-culture phenomenon.",
    };
    Json(json!({
        "parse": {
            "title": "27 Club",
            "text": format!(
                "<div class=\"mw-parser-output\"><p><b>{}</b> It has members.</p></div>",
                sentence
            )
        }
    }))
    .into_response()
}

async fn spawn_mock() -> (Arc<MockWiki>, MediaWikiClient) {
    let wiki = Arc::new(MockWiki::default());
    let app = Router::new()
        .route("/w/api.php", get(api))
        .with_state(wiki.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let wiki_cfg = WikiConfig {
        api_url: format!("http://{}/w/api.php", addr),
        ..WikiConfig::default()
    };
    let client = MediaWikiClient::new(&wiki_cfg, &FetchConfig::default()).unwrap();
    (wiki, client)
}

fn fast_policy() -> FetchPolicy {
    FetchPolicy {
        throttle: Duration::ZERO,
        max_retries: 3,
        backoff_base: Duration::from_millis(1),
    }
}

#[tokio::test]
async fn listing_follows_continuation() {
    let (wiki, client) = spawn_mock().await;
    let revisions = client.list_revisions("27 Club").await.unwrap();

    let ids: Vec<&str> = revisions.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["1", "2", "3"]);
    assert_eq!(
        revisions[2].timestamp,
        Utc.with_ymd_and_hms(2004, 1, 21, 0, 0, 0).unwrap()
    );
    assert_eq!(
        *wiki.continuations.lock().unwrap(),
        vec!["20050101000000|2".to_string()]
    );
}

#[tokio::test]
async fn missing_page_is_not_found() {
    let (_wiki, client) = spawn_mock().await;
    let err = client.list_revisions("Missing Page").await.unwrap_err();
    assert!(matches!(err, RevisionError::NotFound(ref t) if t == "Missing Page"));
}

#[tokio::test]
async fn http_429_is_rate_limited() {
    let (_wiki, client) = spawn_mock().await;
    let err = client.render_lead("3").await.unwrap_err();
    assert!(matches!(err, RevisionError::RateLimited));
    // second request goes through
    let html = client.render_lead("3").await.unwrap();
    assert!(html.contains("popular-culture phenomenon"));
}

#[tokio::test]
async fn fetcher_backs_off_through_rate_limit() {
    let (wiki, client) = spawn_mock().await;
    let normalizer = Normalizer::default();
    let mut fetcher = ContentFetcher::new(&client, &normalizer, fast_policy());

    let sentence = fetcher.fetch_sentence("3").await;
    assert_eq!(
        sentence.as_deref(),
        Some("The 27 Club is a popular-culture phenomenon.")
    );
    assert_eq!(wiki.parse_calls.lock().unwrap()["3"], 2);
}

#[tokio::test]
async fn engine_runs_against_mock_wiki() {
    let (_wiki, client) = spawn_mock().await;
    let store = MemoryStore::new();
    let normalizer = Normalizer::default();
    let engine = Engine::new(&client, &client, &store, &normalizer).with_policy(fast_policy());

    let options = AnalysisOptions {
        as_of: Some(Utc.with_ymd_and_hms(2004, 2, 1, 0, 0, 0).unwrap()),
        ..AnalysisOptions::default()
    };
    let analysis = engine.run("27 Club", &options).await.unwrap();

    assert_eq!(analysis.total_revisions, 3);
    assert_eq!(analysis.failed, 0);
    assert_eq!(analysis.stats.len(), 2);
    assert_eq!(analysis.stats[0].sentence, "The 27 Club is a list of musicians.");
    assert_eq!(analysis.stats[0].total_days, 20);
    assert_eq!(analysis.stats[1].total_days, 11);
}
