//! Message parser: raw mailbox message → `CandidateRecord`.
//!
//! Pure string handling; the only outside input is the account identity
//! used for permalinks and the processing clock.

use std::sync::LazyLock;

use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use regex::Regex;

use crate::error::ParseError;
use crate::mailbox::RawMessage;
use crate::pipeline::classifier::classify;
use crate::pipeline::types::{CandidateRecord, SNIPPET_MAX_CHARS};

pub const UNKNOWN_COMPANY: &str = "Unknown Company";
pub const REFERRAL_COMPANY: &str = "Referral/Direct";

const NO_SUBJECT: &str = "No Subject";
const UNKNOWN_SENDER: &str = "Unknown Sender";

/// Consumer mail providers and ATS senders that say nothing about the employer.
const GENERIC_DOMAINS: &[&str] = &[
    "gmail.com",
    "outlook.com",
    "yahoo.com",
    "icloud.com",
    "me.com",
    "mail.com",
    "notifications.greenhouse.io",
    "ashbyhq.com",
    "lever.co",
];

/// Subject separators tried in order; the text after the last occurrence names the company.
const SUBJECT_SEPARATORS: &[&str] = &[" at ", " to ", " in "];

const MAIL_WEB_PREFIX: &str = "https://mail.google.com/mail/u";

/// Path segment of the old account-index links, which open whichever account
/// the browser lists first.
pub const LEGACY_LINK_MARKER: &str = "/mail/u/0/";

const ACTION_DUE_DAYS: i64 = 7;

/// Trailing "(UTC)"-style timezone names some mailers append to Date.
static TZ_NAME_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\([^()]*\)\s*$").unwrap());

/// Parse one raw message into a classified candidate record.
pub fn parse_message(
    raw: &RawMessage,
    account_email: &str,
    now: DateTime<Utc>,
) -> Result<CandidateRecord, ParseError> {
    let id = raw.id.trim();
    if id.is_empty() {
        return Err(ParseError::MissingId);
    }
    let account_email = account_email.trim();
    if account_email.is_empty() {
        return Err(ParseError::MissingAccount { id: id.to_string() });
    }

    let subject = raw.header("Subject").unwrap_or(NO_SUBJECT).to_string();
    let sender_raw = raw.header("From").unwrap_or(UNKNOWN_SENDER).to_string();
    // Classify on the full preview; only the stored copy is truncated.
    let full_snippet = raw.snippet.to_lowercase();
    let (status, next_action) = classify(&subject, &full_snippet);
    let snippet_lower: String = full_snippet.chars().take(SNIPPET_MAX_CHARS).collect();

    Ok(CandidateRecord {
        title: subject.clone(),
        company: guess_company(&subject, &sender_raw),
        received_at: parse_received_at(raw.header("Date"), now),
        permalink: permalink(account_email, id),
        sender_raw,
        subject,
        snippet_lower,
        status,
        next_action: next_action.to_string(),
        action_due_at: now + Duration::days(ACTION_DUE_DAYS),
    })
}

/// Best-effort employer name from the subject line, then the sender.
///
/// Never returns an empty string.
pub fn guess_company(subject: &str, from: &str) -> String {
    let guess = SUBJECT_SEPARATORS
        .iter()
        .find_map(|sep| after_last(subject, sep))
        .or_else(|| after_last(from, " - "))
        .map(str::to_string)
        .unwrap_or_else(|| company_from_domain(from));

    let cleaned = guess
        .trim_end_matches(|c: char| matches!(c, '!' | '.' | ','))
        .trim();
    if cleaned.is_empty() {
        UNKNOWN_COMPANY.to_string()
    } else {
        cleaned.to_string()
    }
}

fn after_last<'a>(haystack: &'a str, sep: &str) -> Option<&'a str> {
    haystack
        .rfind(sep)
        .map(|idx| haystack[idx + sep.len()..].trim())
}

fn company_from_domain(from: &str) -> String {
    let address = match (from.rfind('<'), from.rfind('>')) {
        (Some(start), Some(end)) if start < end => &from[start + 1..end],
        _ => from.trim(),
    };

    let Some((_, domain)) = address.rsplit_once('@') else {
        return REFERRAL_COMPANY.to_string();
    };
    let domain = domain.trim().to_lowercase();

    if !domain.contains('.') || GENERIC_DOMAINS.contains(&domain.as_str()) {
        return REFERRAL_COMPANY.to_string();
    }

    let label = domain.split('.').next().unwrap_or_default();
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Parse an RFC 2822-style Date header, falling back to `now`.
///
/// Formats are tried with offset first, then without (read as UTC).
pub fn parse_received_at(raw: Option<&str>, now: DateTime<Utc>) -> DateTime<Utc> {
    let Some(raw) = raw else {
        return now;
    };
    let cleaned = TZ_NAME_SUFFIX.replace(raw.trim(), "");
    let cleaned = cleaned.trim();

    if let Ok(dt) = DateTime::parse_from_str(cleaned, "%a, %d %b %Y %H:%M:%S %z") {
        return dt.with_timezone(&Utc);
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(cleaned, "%a, %d %b %Y %H:%M:%S") {
        return naive.and_utc();
    }
    now
}

/// Link to a message in the mail web client for a specific account.
pub fn permalink(account_email: &str, message_id: &str) -> String {
    format!("{MAIL_WEB_PREFIX}/{account_email}/#all/{message_id}")
}

/// Whether a stored link predates account-scoped links.
pub fn is_stale_permalink(link: &str, account_email: &str) -> bool {
    link.contains(LEGACY_LINK_MARKER) && !link.contains(account_email)
}
