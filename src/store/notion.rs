//! Notion database backend for `RecordStore`.
//!
//! Records are pages in one database. Property names and types:
//! Title (title), Company / Email From / Subject / Email Preview /
//! Next Action (rich_text), Date Received / Action Date (date),
//! Email Link (url), Status (select).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tracing::debug;

use super::traits::{RecordStore, RecordUpdate, StoredRecord};
use crate::error::StoreError;
use crate::pipeline::types::CandidateRecord;

/// API version pinned in every request.
pub const NOTION_VERSION: &str = "2022-06-28";

const CREATE_TIMEOUT: Duration = Duration::from_secs(10);

// ── API response types ──────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    results: Vec<Page>,
    #[serde(default)]
    has_more: bool,
    #[serde(default)]
    next_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Page {
    id: String,
    #[serde(default)]
    properties: Map<String, Value>,
}

impl Page {
    fn into_stored(self) -> StoredRecord {
        let status = self
            .properties
            .get("Status")
            .and_then(|p| p.pointer("/select/name"))
            .and_then(Value::as_str)
            .map(String::from);
        let permalink = self
            .properties
            .get("Email Link")
            .and_then(|p| p.get("url"))
            .and_then(Value::as_str)
            .map(String::from);
        let subject: String = self
            .properties
            .get("Subject")
            .and_then(|p| p.get("rich_text"))
            .and_then(Value::as_array)
            .map(|parts| parts.iter().map(rich_text_part).collect())
            .unwrap_or_default();

        StoredRecord {
            id: self.id,
            subject,
            status,
            permalink,
        }
    }
}

/// Text of one rich_text element; responses carry `plain_text`, requests `text.content`.
fn rich_text_part(part: &Value) -> &str {
    part.get("plain_text")
        .or_else(|| part.pointer("/text/content"))
        .and_then(Value::as_str)
        .unwrap_or_default()
}

// ── Property payloads ───────────────────────────────────────────────

fn rich_text(content: &str) -> Value {
    json!({ "rich_text": [{ "text": { "content": content } }] })
}

fn date(at: &chrono::DateTime<chrono::Utc>) -> Value {
    json!({ "date": { "start": at.to_rfc3339() } })
}

/// Full property set for a new page.
pub fn create_properties(record: &CandidateRecord) -> Value {
    json!({
        "Title": { "title": [{ "text": { "content": record.title } }] },
        "Company": rich_text(&record.company),
        "Email From": rich_text(&record.sender_raw),
        "Subject": rich_text(&record.subject),
        "Date Received": date(&record.received_at),
        "Email Preview": rich_text(&record.snippet_lower),
        "Email Link": { "url": record.permalink },
        "Status": { "select": { "name": record.status.label() } },
        "Next Action": rich_text(&record.next_action),
        "Action Date": date(&record.action_due_at),
    })
}

/// Mutable properties only.
pub fn update_properties(update: &RecordUpdate) -> Value {
    json!({
        "Status": { "select": { "name": update.status } },
        "Next Action": rich_text(&update.next_action),
        "Email Preview": rich_text(&update.snippet_lower),
        "Email Link": { "url": update.permalink },
    })
}

// ── Store ───────────────────────────────────────────────────────────

/// Notion-backed record store for a single database.
pub struct NotionStore {
    client: reqwest::Client,
    api_base: String,
    token: SecretString,
    database_id: String,
}

impl NotionStore {
    pub fn new(
        api_base: impl Into<String>,
        token: SecretString,
        database_id: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: api_base.into(),
            token,
            database_id: database_id.into(),
        }
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, format!("{}/v1/{path}", self.api_base))
            .bearer_auth(self.token.expose_secret())
            .header("Notion-Version", NOTION_VERSION)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Value, StoreError> {
        let resp = request.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(StoreError::Api {
                status: status.as_u16(),
                message: body,
            });
        }
        Ok(resp.json().await?)
    }
}

#[async_trait]
impl RecordStore for NotionStore {
    async fn find_by_subject(&self, subject: &str) -> Result<Vec<StoredRecord>, StoreError> {
        let path = format!("databases/{}/query", self.database_id);
        let mut records = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let mut body = json!({
                "filter": {
                    "property": "Subject",
                    "rich_text": { "equals": subject }
                }
            });
            if let Some(ref c) = cursor {
                body["start_cursor"] = json!(c);
            }

            let value = self.send(self.request(Method::POST, &path).json(&body)).await?;
            let page: QueryResponse = serde_json::from_value(value)
                .map_err(|e| StoreError::InvalidResponse(e.to_string()))?;

            records.extend(page.results.into_iter().map(Page::into_stored));

            match page.next_cursor {
                Some(next) if page.has_more => cursor = Some(next),
                _ => break,
            }
        }

        debug!(subject = %subject, matches = records.len(), "Queried records by subject");
        Ok(records)
    }

    async fn create(&self, record: &CandidateRecord) -> Result<String, StoreError> {
        let body = json!({
            "parent": { "database_id": self.database_id },
            "properties": create_properties(record),
        });

        let value = self
            .send(
                self.request(Method::POST, "pages")
                    .timeout(CREATE_TIMEOUT)
                    .json(&body),
            )
            .await?;

        value
            .get("id")
            .and_then(Value::as_str)
            .map(String::from)
            .ok_or_else(|| StoreError::InvalidResponse("created page has no id".into()))
    }

    async fn update(&self, id: &str, update: &RecordUpdate) -> Result<(), StoreError> {
        let body = json!({ "properties": update_properties(update) });

        self.send(
            self.request(Method::PATCH, &format!("pages/{id}"))
                .json(&body),
        )
        .await
        .map(|_| ())
        .map_err(|e| match e {
            StoreError::Api { status: 404, .. } => StoreError::NotFound { id: id.into() },
            other => other,
        })
    }
}
