//! Integration tests for the Gmail and Notion HTTP adapters.
//!
//! Each test spins up an Axum server on a random port that fakes both
//! services, points the real clients at it, and exercises full sync passes.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use secrecy::SecretString;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::time::timeout;

use job_sync::error::{MailboxError, StoreError};
use job_sync::mailbox::{GmailClient, Mailbox};
use job_sync::store::{NotionStore, RecordStore, RecordUpdate};
use job_sync::sync::SyncDriver;

/// Maximum time any test is allowed to run before we consider it hung.
const TEST_TIMEOUT: Duration = Duration::from_secs(5);

const ACCOUNT: &str = "me@example.com";
const GMAIL_TOKEN: &str = "gmail-token";
const NOTION_TOKEN: &str = "notion-token";
const DATABASE_ID: &str = "db-1";
const PAGE_SIZE: usize = 2;

#[derive(Default)]
struct Fake {
    /// Message ids in search order.
    ids: Vec<String>,
    /// id -> (subject, from, snippet)
    messages: HashMap<String, (String, String, String)>,
    /// page id -> properties
    pages: Vec<(String, Value)>,
    notion_requests: usize,
    notion_missing_version: usize,
    creates: usize,
    updates: usize,
}

type Shared = Arc<Mutex<Fake>>;

impl Fake {
    fn add_message(&mut self, id: &str, subject: &str, from: &str, snippet: &str) {
        self.ids.push(id.to_string());
        self.messages.insert(
            id.to_string(),
            (subject.to_string(), from.to_string(), snippet.to_string()),
        );
    }

    fn page_status(&self, id: &str) -> Option<String> {
        self.pages
            .iter()
            .find(|(pid, _)| pid == id)
            .and_then(|(_, p)| p.pointer("/Status/select/name"))
            .and_then(Value::as_str)
            .map(String::from)
    }

    fn note_notion(&mut self, headers: &HeaderMap) {
        self.notion_requests += 1;
        let pinned = headers
            .get("Notion-Version")
            .and_then(|v| v.to_str().ok())
            == Some("2022-06-28");
        if !pinned {
            self.notion_missing_version += 1;
        }
    }
}

fn authorized(headers: &HeaderMap, token: &str) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {token}"))
}

// ── Gmail handlers ──────────────────────────────────────────────────

async fn list_messages(
    State(fake): State<Shared>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Value>, StatusCode> {
    if !authorized(&headers, GMAIL_TOKEN) {
        return Err(StatusCode::UNAUTHORIZED);
    }
    let fake = fake.lock().unwrap();
    let start: usize = params
        .get("pageToken")
        .and_then(|t| t.parse().ok())
        .unwrap_or(0);
    let max: usize = params
        .get("maxResults")
        .and_then(|m| m.parse().ok())
        .unwrap_or(PAGE_SIZE);
    let end = (start + max.min(PAGE_SIZE)).min(fake.ids.len());

    let messages: Vec<Value> = fake.ids[start..end]
        .iter()
        .map(|id| json!({ "id": id, "threadId": id }))
        .collect();
    let mut body = json!({ "messages": messages, "resultSizeEstimate": fake.ids.len() });
    if end < fake.ids.len() {
        body["nextPageToken"] = json!(end.to_string());
    }
    Ok(Json(body))
}

async fn get_message(
    State(fake): State<Shared>,
    Path(id): Path<String>,
) -> Result<Json<Value>, StatusCode> {
    let fake = fake.lock().unwrap();
    let (subject, from, snippet) = fake.messages.get(&id).ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(json!({
        "id": id,
        "snippet": snippet,
        "payload": { "headers": [
            { "name": "Subject", "value": subject },
            { "name": "From", "value": from },
            { "name": "Date", "value": "Fri, 07 Feb 2025 10:30:00 -0500" }
        ]}
    })))
}

async fn profile(headers: HeaderMap) -> Result<Json<Value>, StatusCode> {
    if !authorized(&headers, GMAIL_TOKEN) {
        return Err(StatusCode::UNAUTHORIZED);
    }
    Ok(Json(json!({ "emailAddress": ACCOUNT, "messagesTotal": 3 })))
}

// ── Notion handlers ─────────────────────────────────────────────────

async fn query_database(
    State(fake): State<Shared>,
    Path(db): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<Json<Value>, StatusCode> {
    let mut fake = fake.lock().unwrap();
    fake.note_notion(&headers);
    if db != DATABASE_ID || !authorized(&headers, NOTION_TOKEN) {
        return Err(StatusCode::NOT_FOUND);
    }
    let wanted = body
        .pointer("/filter/rich_text/equals")
        .and_then(Value::as_str)
        .unwrap_or_default();
    let results: Vec<Value> = fake
        .pages
        .iter()
        .filter(|(_, props)| {
            props.pointer("/Subject/rich_text/0/text/content").and_then(Value::as_str)
                == Some(wanted)
        })
        .map(|(id, props)| json!({ "object": "page", "id": id, "properties": props }))
        .collect();
    Ok(Json(json!({ "results": results, "has_more": false, "next_cursor": null })))
}

async fn create_page(
    State(fake): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<Json<Value>, StatusCode> {
    let mut fake = fake.lock().unwrap();
    fake.note_notion(&headers);
    if body.pointer("/parent/database_id").and_then(Value::as_str) != Some(DATABASE_ID) {
        return Err(StatusCode::BAD_REQUEST);
    }
    let id = format!("page-{}", fake.pages.len() + 1);
    fake.pages.push((id.clone(), body["properties"].clone()));
    fake.creates += 1;
    Ok(Json(json!({ "object": "page", "id": id })))
}

async fn update_page(
    State(fake): State<Shared>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<Json<Value>, StatusCode> {
    let mut fake = fake.lock().unwrap();
    fake.note_notion(&headers);
    let (_, props) = fake
        .pages
        .iter_mut()
        .find(|(pid, _)| *pid == id)
        .ok_or(StatusCode::NOT_FOUND)?;
    if let (Some(target), Some(changes)) = (props.as_object_mut(), body["properties"].as_object())
    {
        for (key, value) in changes {
            target.insert(key.clone(), value.clone());
        }
    }
    fake.updates += 1;
    Ok(Json(json!({ "object": "page", "id": id })))
}

/// Start the fake on a random port, return (base url, shared state).
async fn start_server() -> (String, Shared) {
    let fake: Shared = Arc::new(Mutex::new(Fake::default()));
    let app = Router::new()
        .route("/gmail/v1/users/me/messages", get(list_messages))
        .route("/gmail/v1/users/me/messages/{id}", get(get_message))
        .route("/gmail/v1/users/me/profile", get(profile))
        .route("/v1/databases/{db}/query", post(query_database))
        .route("/v1/pages", post(create_page))
        .route("/v1/pages/{id}", patch(update_page))
        .with_state(Arc::clone(&fake));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    // Give the server a moment to start accepting connections.
    tokio::time::sleep(Duration::from_millis(50)).await;

    (format!("http://127.0.0.1:{port}"), fake)
}

fn gmail(base: &str) -> GmailClient {
    GmailClient::new(base, SecretString::from(GMAIL_TOKEN))
}

fn notion(base: &str) -> NotionStore {
    NotionStore::new(base, SecretString::from(NOTION_TOKEN), DATABASE_ID)
}

fn driver(base: &str) -> SyncDriver {
    SyncDriver::new(
        Arc::new(gmail(base)),
        Arc::new(notion(base)),
        ACCOUNT,
        Duration::ZERO,
    )
}

#[tokio::test]
async fn full_pass_creates_once_across_pages() {
    timeout(TEST_TIMEOUT, async {
        let (base, fake) = start_server().await;
        {
            let mut f = fake.lock().unwrap();
            f.add_message("m1", "Thank you for applying at Acme", "Acme <jobs@acme.com>", "We got it");
            f.add_message("m2", "Interview at Globex", "Globex <hr@globex.com>", "Pick a time");
            f.add_message("m3", "Your application", "Initech Careers <careers@initech.com>", "");
        }
        let driver = driver(&base);

        let first = driver.run_pass(50).await.unwrap();
        assert_eq!(first.listed, 3);
        assert_eq!(first.created, 3);

        let second = driver.run_pass(50).await.unwrap();
        assert_eq!(second.created, 0);
        assert_eq!(second.unchanged, 3);

        let f = fake.lock().unwrap();
        assert_eq!(f.creates, 3);
        assert_eq!(f.updates, 0);
        assert_eq!(f.notion_missing_version, 0);
        assert!(f.notion_requests >= 9);
        assert_eq!(f.page_status("page-2").as_deref(), Some("Interview Round 1"));

        let company = f.pages[2]
            .1
            .pointer("/Company/rich_text/0/text/content")
            .and_then(Value::as_str)
            .map(String::from);
        assert_eq!(company.as_deref(), Some("Initech"));
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn rejection_updates_existing_page() {
    timeout(TEST_TIMEOUT, async {
        let (base, fake) = start_server().await;
        fake.lock()
            .unwrap()
            .add_message("m1", "Your application at Acme", "Acme <jobs@acme.com>", "received");
        let driver = driver(&base);
        driver.run_pass(50).await.unwrap();

        fake.lock().unwrap().messages.get_mut("m1").unwrap().2 =
            "Unfortunately we have decided to move forward with another candidate".into();
        let report = driver.run_pass(50).await.unwrap();

        assert_eq!(report.updated, 1);
        let f = fake.lock().unwrap();
        assert_eq!(f.pages.len(), 1);
        assert_eq!(f.page_status("page-1").as_deref(), Some("Rejected"));
        let action = f.pages[0]
            .1
            .pointer("/Next Action/rich_text/0/text/content")
            .and_then(Value::as_str)
            .map(String::from);
        assert_eq!(action.as_deref(), Some("Archived"));
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn legacy_link_is_rewritten() {
    timeout(TEST_TIMEOUT, async {
        let (base, fake) = start_server().await;
        {
            let mut f = fake.lock().unwrap();
            f.add_message("m1", "Application at Acme", "Acme <jobs@acme.com>", "");
            f.pages.push((
                "page-1".into(),
                json!({
                    "Subject": { "rich_text": [{ "text": { "content": "Application at Acme" } }] },
                    "Status": { "select": { "name": "Applied" } },
                    "Email Link": { "url": "https://mail.google.com/mail/u/0/#inbox/m1" }
                }),
            ));
        }

        let report = driver(&base).run_pass(50).await.unwrap();

        assert_eq!(report.updated, 1);
        let f = fake.lock().unwrap();
        assert_eq!(f.creates, 0);
        assert_eq!(
            f.pages[0].1.pointer("/Email Link/url").and_then(Value::as_str),
            Some("https://mail.google.com/mail/u/me@example.com/#all/m1")
        );
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn gmail_profile_and_errors() {
    timeout(TEST_TIMEOUT, async {
        let (base, _fake) = start_server().await;

        assert_eq!(gmail(&base).account_email().await.unwrap(), ACCOUNT);

        let bad = GmailClient::new(base.as_str(), SecretString::from("wrong"));
        assert!(matches!(bad.account_email().await, Err(MailboxError::AuthFailed)));

        let missing = gmail(&base).get_message("nope").await;
        assert!(matches!(missing, Err(MailboxError::NotFound { ref id }) if id == "nope"));
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn notion_update_of_missing_page() {
    timeout(TEST_TIMEOUT, async {
        let (base, _fake) = start_server().await;
        let update = RecordUpdate {
            status: "Applied".into(),
            next_action: "Check status".into(),
            snippet_lower: String::new(),
            permalink: "https://mail.google.com/mail/u/me@example.com/#all/m1".into(),
        };

        let err = notion(&base).update("page-404", &update).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { ref id } if id == "page-404"));

        let found = notion(&base).find_by_subject("anything").await.unwrap();
        assert!(found.is_empty());
    })
    .await
    .expect("test timed out");
}
