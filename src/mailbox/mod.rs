//! Mailbox collaborator: the read-only message source.
//!
//! The sync core only needs two reads: a paginated search for message ids
//! and retrieval of one message's headers plus preview text.

pub mod gmail;

use async_trait::async_trait;

use crate::error::MailboxError;

pub use gmail::GmailClient;

/// Fixed search query selecting job-application mail and excluding one-time codes.
pub const JOB_SEARCH_QUERY: &str = concat!(
    r#"subject:(application OR "thank you for applying" OR "received your application" "#,
    r#"OR "applying to" OR "unfortunate" OR "rejected" OR "moving forward" OR "interview" "#,
    r#"OR "interviews" OR "next steps") "#,
    r#"-subject:("Security code" OR "Verification code" OR "Your code" "#,
    r#"OR "one-time password" OR "OTP")"#,
);

/// One message as returned by the mailbox: identifier, headers, preview.
#[derive(Debug, Clone, Default)]
pub struct RawMessage {
    pub id: String,
    /// Header name/value pairs in the order the mailbox returned them.
    pub headers: Vec<(String, String)>,
    /// Short plaintext preview of the body.
    pub snippet: String,
}

impl RawMessage {
    /// Case-insensitive header lookup; first occurrence wins.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// A page of message ids from a search.
#[derive(Debug, Clone, Default)]
pub struct MessagePage {
    pub ids: Vec<String>,
    pub next_page_token: Option<String>,
}

/// Read operations the sync core consumes from the mailbox service.
#[async_trait]
pub trait Mailbox: Send + Sync {
    /// Fetch one page of message ids matching `query`.
    async fn search_page(
        &self,
        query: &str,
        max_results: usize,
        page_token: Option<&str>,
    ) -> Result<MessagePage, MailboxError>;

    /// Retrieve a single message's headers and preview text.
    async fn get_message(&self, id: &str) -> Result<RawMessage, MailboxError>;

    /// Email address of the authenticated account.
    async fn account_email(&self) -> Result<String, MailboxError>;
}

/// Largest page the mailbox listing API hands back.
pub const MAX_PAGE_SIZE: usize = 500;

/// Collect up to `cap` message ids for `query`, following page tokens.
pub async fn search_ids(
    mailbox: &dyn Mailbox,
    query: &str,
    cap: usize,
) -> Result<Vec<String>, MailboxError> {
    let mut ids: Vec<String> = Vec::new();
    let mut page_token: Option<String> = None;

    while ids.len() < cap {
        let remaining = cap - ids.len();
        let page = mailbox
            .search_page(query, remaining.min(MAX_PAGE_SIZE), page_token.as_deref())
            .await?;

        if page.ids.is_empty() {
            break;
        }

        ids.extend(page.ids.into_iter().take(remaining));

        match page.next_page_token {
            Some(token) if !token.is_empty() => page_token = Some(token),
            _ => break,
        }
    }

    Ok(ids)
}
