use std::collections::HashMap;

use crate::domain::Entry;

/// Entries from the last successful parse of each feed, keyed by URL.
///
/// A URL without a slot has never been parsed successfully.
#[derive(Debug, Default)]
pub struct FeedCache {
    feeds: HashMap<String, Vec<Entry>>,
}

impl FeedCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, url: &str) -> Option<&[Entry]> {
        self.feeds.get(url).map(Vec::as_slice)
    }

    pub fn contains(&self, url: &str) -> bool {
        self.feeds.contains_key(url)
    }

    /// Store `entries` as the new baseline, returning the previous one.
    pub fn replace(&mut self, url: &str, entries: Vec<Entry>) -> Option<Vec<Entry>> {
        self.feeds.insert(url.to_string(), entries)
    }

    pub fn len(&self) -> usize {
        self.feeds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.feeds.is_empty()
    }
}
