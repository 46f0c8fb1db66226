//! Turning entries into one-line messages.
//!
//! The [`TemplateFormatter`] substitutes `%placeholder%` tokens in a pattern
//! with entry fields. Anything implementing [`Formatter`] can replace it.

use crate::domain::Entry;

pub const DEFAULT_PATTERN: &str = "%title% [ %link% ] by %authorname% at %datemodified%";

/// ISO-8601 with a numeric offset, e.g. `2014-07-10T19:56:01-0500`.
pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%z";

/// Every token the template formatter understands.
pub const PLACEHOLDERS: [&str; 15] = [
    "%authorname%",
    "%authoremail%",
    "%authoruri%",
    "%content%",
    "%datecreated%",
    "%datemodified%",
    "%description%",
    "%id%",
    "%link%",
    "%links%",
    "%permalink%",
    "%title%",
    "%commentcount%",
    "%commentlink%",
    "%commentfeedlink%",
];

pub trait Formatter: Send + Sync {
    fn format(&self, entry: &Entry) -> String;
}

#[derive(Debug, Clone)]
pub struct TemplateFormatter {
    pattern: String,
    date_format: String,
}

impl Default for TemplateFormatter {
    fn default() -> Self {
        Self::new(DEFAULT_PATTERN, DEFAULT_DATE_FORMAT)
    }
}

impl TemplateFormatter {
    pub fn new(pattern: impl Into<String>, date_format: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            date_format: date_format.into(),
        }
    }

    pub fn with_pattern(pattern: impl Into<String>) -> Self {
        Self::new(pattern, DEFAULT_DATE_FORMAT)
    }

    /// Value substituted for `token`, empty when the entry lacks the field.
    fn value_of(&self, token: &str, entry: &Entry) -> String {
        let author = entry.author.as_ref();
        let text = |field: &Option<String>| field.clone().unwrap_or_default();

        match token {
            "%authorname%" => author.map(|a| a.name.clone()).unwrap_or_default(),
            "%authoremail%" => author.and_then(|a| a.email.clone()).unwrap_or_default(),
            "%authoruri%" => author.and_then(|a| a.uri.clone()).unwrap_or_default(),
            "%content%" => text(&entry.content),
            "%datecreated%" => entry
                .date_created
                .as_ref()
                .map(|d| d.render(&self.date_format))
                .unwrap_or_default(),
            "%datemodified%" => entry
                .date_modified
                .as_ref()
                .map(|d| d.render(&self.date_format))
                .unwrap_or_default(),
            "%description%" => text(&entry.description),
            "%id%" => entry.id.clone(),
            "%link%" => text(&entry.link),
            "%links%" => entry.links.join(" "),
            "%permalink%" => text(&entry.permalink),
            "%title%" => text(&entry.title),
            "%commentcount%" => entry
                .comment_count
                .map(|c| c.to_string())
                .unwrap_or_default(),
            "%commentlink%" => text(&entry.comment_link),
            "%commentfeedlink%" => text(&entry.comment_feed_link),
            _ => String::new(),
        }
    }
}

impl Formatter for TemplateFormatter {
    /// Single left-to-right pass; substituted values are never rescanned.
    fn format(&self, entry: &Entry) -> String {
        let mut out = String::with_capacity(self.pattern.len());
        let mut rest = self.pattern.as_str();

        while let Some(pos) = rest.find('%') {
            out.push_str(&rest[..pos]);
            let candidate = &rest[pos..];

            match PLACEHOLDERS.iter().find(|token| candidate.starts_with(**token)) {
                Some(token) => {
                    out.push_str(&self.value_of(token, entry));
                    rest = &candidate[token.len()..];
                }
                None => {
                    out.push('%');
                    rest = &candidate[1..];
                }
            }
        }

        out.push_str(rest);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Author, EntryDate};
    use chrono::DateTime;

    fn sample_entry() -> Entry {
        let mut entry = Entry::new("1");
        entry.date_created = Some(EntryDate::Timestamp(
            DateTime::parse_from_rfc3339("2014-07-10T19:56:00-05:00").unwrap(),
        ));
        entry.date_modified = Some(EntryDate::Timestamp(
            DateTime::parse_from_rfc3339("2014-07-10T19:56:01-05:00").unwrap(),
        ));
        entry.author = Some(Author {
            name: "Author".into(),
            email: Some("author@example.com".into()),
            uri: Some("http://author.com".into()),
        });
        entry.content = Some("content".into());
        entry.description = Some("description".into());
        entry.link = Some("http://feed/link".into());
        entry.links = vec!["http://feed/link1".into(), "http://feed/link2".into()];
        entry.permalink = Some("http://feed/permalink".into());
        entry.title = Some("Title".into());
        entry.comment_count = Some(2);
        entry.comment_link = Some("http://feed/link/comments".into());
        entry.comment_feed_link = Some("http://feed/comments".into());
        entry
    }

    #[test]
    fn test_default_pattern() {
        let formatted = TemplateFormatter::default().format(&sample_entry());
        assert_eq!(
            formatted,
            "Title [ http://feed/link ] by Author at 2014-07-10T19:56:01-0500"
        );
    }

    #[test]
    fn test_each_placeholder_alone() {
        let cases = [
            ("%authorname%", "Author"),
            ("%authoremail%", "author@example.com"),
            ("%authoruri%", "http://author.com"),
            ("%content%", "content"),
            ("%datecreated%", "2014-07-10T19:56:00-0500"),
            ("%datemodified%", "2014-07-10T19:56:01-0500"),
            ("%description%", "description"),
            ("%id%", "1"),
            ("%link%", "http://feed/link"),
            ("%links%", "http://feed/link1 http://feed/link2"),
            ("%permalink%", "http://feed/permalink"),
            ("%title%", "Title"),
            ("%commentcount%", "2"),
            ("%commentlink%", "http://feed/link/comments"),
            ("%commentfeedlink%", "http://feed/comments"),
        ];
        let entry = sample_entry();

        for (pattern, expected) in cases {
            let formatter = TemplateFormatter::with_pattern(pattern);
            assert_eq!(formatter.format(&entry), expected, "pattern {}", pattern);
        }
    }

    #[test]
    fn test_every_placeholder_empty_when_absent() {
        let entry = Entry::default();
        for token in PLACEHOLDERS {
            let formatter = TemplateFormatter::with_pattern(token);
            assert_eq!(formatter.format(&entry), "", "token {}", token);
        }
    }

    #[test]
    fn test_multiple_placeholders() {
        let formatter = TemplateFormatter::with_pattern("%title% - %authorname%");
        assert_eq!(formatter.format(&sample_entry()), "Title - Author");
    }

    #[test]
    fn test_pattern_without_tokens_is_unchanged() {
        let pattern = "100% plain %unknown% text %";
        let formatter = TemplateFormatter::with_pattern(pattern);
        assert_eq!(formatter.format(&sample_entry()), pattern);
    }

    #[test]
    fn test_substituted_values_are_not_rescanned() {
        let mut entry = sample_entry();
        entry.title = Some("%link%".into());
        let formatter = TemplateFormatter::with_pattern("%title%");
        assert_eq!(formatter.format(&entry), "%link%");
    }

    #[test]
    fn test_timestamp_strings_pass_through() {
        let mut entry = sample_entry();
        entry.date_created = Some(EntryDate::Text("2014-07-10T19:56:00-0500".into()));
        entry.date_modified = Some(EntryDate::Text("2014-07-10T19:56:01-0500".into()));

        let formatter = TemplateFormatter::with_pattern("%datecreated%");
        assert_eq!(formatter.format(&entry), "2014-07-10T19:56:00-0500");
        let formatter = TemplateFormatter::with_pattern("%datemodified%");
        assert_eq!(formatter.format(&entry), "2014-07-10T19:56:01-0500");
    }

    #[test]
    fn test_custom_date_format() {
        let formatter = TemplateFormatter::new("%datemodified%", "%d/%m/%Y");
        assert_eq!(formatter.format(&sample_entry()), "10/07/2014");
    }

    #[test]
    fn test_without_author() {
        let mut entry = sample_entry();
        entry.author = None;
        let formatter = TemplateFormatter::with_pattern("%authorname%%authoremail%%authoruri%");
        assert_eq!(formatter.format(&entry), "");
    }
}
