use std::borrow::Cow;
use std::fmt::Write;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Author triple as published by the feed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub name: String,
    pub email: Option<String>,
    pub uri: Option<String>,
}

/// A date as it arrived from the feed.
///
/// Parsed timestamps are rendered with the formatter's date pattern, while
/// preformatted text is passed through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryDate {
    Timestamp(DateTime<FixedOffset>),
    Text(String),
}

impl EntryDate {
    pub fn render(&self, date_format: &str) -> String {
        match self {
            EntryDate::Timestamp(dt) => {
                let mut rendered = String::new();
                // An unusable pattern makes chrono report fmt::Error
                if write!(rendered, "{}", dt.format(date_format)).is_err() {
                    return dt.to_rfc3339();
                }
                rendered
            }
            EntryDate::Text(text) => text.clone(),
        }
    }
}

impl From<DateTime<FixedOffset>> for EntryDate {
    fn from(dt: DateTime<FixedOffset>) -> Self {
        EntryDate::Timestamp(dt)
    }
}

/// One item of a syndication feed, normalized.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Entry {
    pub id: String,
    pub title: Option<String>,
    pub link: Option<String>,
    pub permalink: Option<String>,
    pub links: Vec<String>,
    pub content: Option<String>,
    pub description: Option<String>,
    pub author: Option<Author>,
    pub date_created: Option<EntryDate>,
    pub date_modified: Option<EntryDate>,
    pub comment_count: Option<u64>,
    pub comment_link: Option<String>,
    pub comment_feed_link: Option<String>,
}

impl Entry {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Key used to recognize the same entry across polls.
    ///
    /// The permalink when there is one, otherwise a SHA-256 digest of the
    /// entry's full JSON serialization.
    pub fn identity_key(&self) -> Cow<'_, str> {
        match self.permalink.as_deref() {
            Some(permalink) if !permalink.is_empty() => Cow::Borrowed(permalink),
            _ => Cow::Owned(self.serialized_digest()),
        }
    }

    fn serialized_digest(&self) -> String {
        // Serializing plain strings, numbers and dates cannot fail; fall back
        // to the debug form rather than panic if it ever does.
        let serialized = serde_json::to_vec(self)
            .unwrap_or_else(|_| format!("{:?}", self).into_bytes());
        let mut hasher = Sha256::new();
        hasher.update(&serialized);
        hex::encode(hasher.finalize())
    }

    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or("(Untitled)")
    }
}
