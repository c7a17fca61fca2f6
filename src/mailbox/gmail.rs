//! Gmail API v1 adapter for the `Mailbox` trait.
//!
//! Lists message ids for a search query, then fetches metadata headers
//! (Subject, From, Date) and the snippet for each message.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::debug;

use super::{Mailbox, MessagePage, RawMessage};
use crate::error::MailboxError;

// ── API response types ──────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MessageListResponse {
    #[serde(default)]
    messages: Vec<MessageStub>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MessageStub {
    id: String,
}

#[derive(Debug, Deserialize)]
struct MessageDetail {
    #[serde(default)]
    id: String,
    #[serde(default)]
    snippet: String,
    #[serde(default)]
    payload: Option<MessagePayload>,
}

#[derive(Debug, Deserialize)]
struct MessagePayload {
    #[serde(default)]
    headers: Vec<Header>,
}

#[derive(Debug, Deserialize)]
struct Header {
    #[serde(default)]
    name: String,
    #[serde(default)]
    value: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Profile {
    email_address: String,
}

// ── Client ──────────────────────────────────────────────────────────

/// Gmail REST client bound to one authenticated account (`users/me`).
pub struct GmailClient {
    client: reqwest::Client,
    api_base: String,
    access_token: SecretString,
}

impl GmailClient {
    pub fn new(api_base: impl Into<String>, access_token: SecretString) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: api_base.into(),
            access_token,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/gmail/v1/users/me/{path}", self.api_base)
    }

    async fn get(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<reqwest::Response, MailboxError> {
        let resp = self
            .client
            .get(self.url(path))
            .bearer_auth(self.access_token.expose_secret())
            .query(query)
            .send()
            .await?;

        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(MailboxError::AuthFailed);
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(MailboxError::Api {
                status: status.as_u16(),
                message: body,
            });
        }
        Ok(resp)
    }
}

#[async_trait]
impl Mailbox for GmailClient {
    async fn search_page(
        &self,
        query: &str,
        max_results: usize,
        page_token: Option<&str>,
    ) -> Result<MessagePage, MailboxError> {
        let max_results = max_results.to_string();
        let mut params = vec![("q", query), ("maxResults", max_results.as_str())];
        if let Some(token) = page_token {
            params.push(("pageToken", token));
        }

        let list: MessageListResponse = self.get("messages", &params).await?.json().await?;
        debug!(
            count = list.messages.len(),
            has_more = list.next_page_token.is_some(),
            "Listed message page"
        );

        Ok(MessagePage {
            ids: list.messages.into_iter().map(|m| m.id).collect(),
            next_page_token: list.next_page_token,
        })
    }

    async fn get_message(&self, id: &str) -> Result<RawMessage, MailboxError> {
        let resp = self
            .get(
                &format!("messages/{id}"),
                &[
                    ("format", "metadata"),
                    ("metadataHeaders", "Subject"),
                    ("metadataHeaders", "From"),
                    ("metadataHeaders", "Date"),
                ],
            )
            .await
            .map_err(|e| match e {
                MailboxError::Api { status: 404, .. } => MailboxError::NotFound { id: id.into() },
                other => other,
            })?;

        let detail: MessageDetail = resp.json().await?;

        let headers = detail
            .payload
            .map(|p| p.headers.into_iter().map(|h| (h.name, h.value)).collect())
            .unwrap_or_default();

        Ok(RawMessage {
            id: if detail.id.is_empty() {
                id.to_string()
            } else {
                detail.id
            },
            headers,
            snippet: detail.snippet,
        })
    }

    async fn account_email(&self) -> Result<String, MailboxError> {
        let profile: Profile = self.get("profile", &[]).await?.json().await?;
        Ok(profile.email_address)
    }
}
