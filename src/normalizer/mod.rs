use feed_rs::model;
use feed_rs::parser;
use html_escape::decode_html_entities;

use crate::app::{Result, TickerError};
use crate::domain::{Author, Entry, EntryDate};

/// Turns a raw feed body into entries, in document order.
pub trait FeedParser {
    fn parse(&self, body: &[u8]) -> Result<Vec<Entry>>;
}

#[derive(Clone)]
pub struct Normalizer;

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Normalizer {
    pub fn new() -> Self {
        Self
    }

    fn entry_from(entry: model::Entry) -> Entry {
        let link = entry
            .links
            .iter()
            .find(|l| l.rel.as_deref().map_or(true, |rel| rel == "alternate"))
            .or_else(|| entry.links.first())
            .map(|l| l.href.clone());

        let author = entry.authors.into_iter().next().map(|person| Author {
            name: person.name,
            email: person.email,
            uri: person.uri,
        });

        let published = entry.published.map(|dt| EntryDate::Timestamp(dt.fixed_offset()));
        let updated = entry.updated.map(|dt| EntryDate::Timestamp(dt.fixed_offset()));

        Entry {
            id: entry.id,
            title: entry
                .title
                .map(|t| decode_html_entities(&t.content).to_string()),
            permalink: link.clone(),
            link,
            links: entry.links.into_iter().map(|l| l.href).collect(),
            content: entry.content.and_then(|c| c.body),
            description: entry.summary.map(|s| s.content),
            author,
            date_modified: updated.or_else(|| published.clone()),
            date_created: published,
            comment_count: None,
            comment_link: None,
            comment_feed_link: None,
        }
    }
}

impl FeedParser for Normalizer {
    fn parse(&self, body: &[u8]) -> Result<Vec<Entry>> {
        let feed = parser::parse(body).map_err(|e| TickerError::FeedParse(e.to_string()))?;

        Ok(feed.entries.into_iter().map(Self::entry_from).collect())
    }
}
