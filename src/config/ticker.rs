use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::format::{Item, StrftimeItems};
use toml::{Table, Value};
use url::Url;

use super::ConfigError;
use crate::formatter::{Formatter, TemplateFormatter, DEFAULT_DATE_FORMAT, DEFAULT_PATTERN};

/// Seconds between two polls of the same feed when none is configured.
pub const DEFAULT_INTERVAL_SECS: u64 = 300;

/// Validated settings of the poll/diff/deliver cycle.
#[derive(Clone)]
pub struct TickerConfig {
    urls: Vec<String>,
    targets: BTreeMap<String, Vec<String>>,
    interval: Duration,
    formatter: Arc<dyn Formatter>,
}

impl fmt::Debug for TickerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TickerConfig")
            .field("urls", &self.urls)
            .field("targets", &self.targets)
            .field("interval", &self.interval)
            .finish_non_exhaustive()
    }
}

impl TickerConfig {
    pub fn new(
        urls: Vec<String>,
        targets: BTreeMap<String, Vec<String>>,
    ) -> Result<Self, ConfigError> {
        validate_urls(&urls)?;
        Ok(Self {
            urls,
            targets,
            interval: Duration::from_secs(DEFAULT_INTERVAL_SECS),
            formatter: Arc::new(TemplateFormatter::default()),
        })
    }

    pub fn with_interval(mut self, secs: u64) -> Result<Self, ConfigError> {
        if secs == 0 {
            return Err(ConfigError::Interval(
                "interval must reference a positive integer value".into(),
            ));
        }
        self.interval = Duration::from_secs(secs);
        Ok(self)
    }

    /// Replace the default template formatter.
    pub fn with_formatter(mut self, formatter: Arc<dyn Formatter>) -> Self {
        self.formatter = formatter;
        self
    }

    /// Build from the raw `[ticker]` table, checking every key on its own.
    pub fn from_table(table: &Table) -> Result<Self, ConfigError> {
        let urls = urls_from(table)?;
        let targets = targets_from(table)?;
        let interval = interval_from(table)?;
        let formatter = formatter_from(table)?;

        Ok(Self {
            urls,
            targets,
            interval: Duration::from_secs(interval),
            formatter,
        })
    }

    pub fn urls(&self) -> &[String] {
        &self.urls
    }

    pub fn targets(&self) -> &BTreeMap<String, Vec<String>> {
        &self.targets
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn formatter(&self) -> Arc<dyn Formatter> {
        self.formatter.clone()
    }
}

fn validate_urls(urls: &[String]) -> Result<(), ConfigError> {
    if urls.is_empty() {
        return Err(ConfigError::Urls("urls must list at least one feed URL".into()));
    }
    for url in urls {
        if url.trim().is_empty() {
            return Err(ConfigError::Urls("urls must not contain empty strings".into()));
        }
        Url::parse(url).map_err(|e| ConfigError::Urls(format!("invalid feed URL {}: {}", url, e)))?;
    }
    Ok(())
}

fn urls_from(table: &Table) -> Result<Vec<String>, ConfigError> {
    let invalid = || ConfigError::Urls("urls must be a list of strings containing feed URLs".into());

    let values = table.get("urls").and_then(Value::as_array).ok_or_else(invalid)?;
    let urls = values
        .iter()
        .map(|v| v.as_str().map(String::from))
        .collect::<Option<Vec<_>>>()
        .ok_or_else(invalid)?;

    validate_urls(&urls)?;
    Ok(urls)
}

fn targets_from(table: &Table) -> Result<BTreeMap<String, Vec<String>>, ConfigError> {
    let targets = table
        .get("targets")
        .and_then(Value::as_table)
        .ok_or_else(|| ConfigError::Targets("targets must be a table of lists".into()))?;

    let mut parsed = BTreeMap::new();
    for (connection, value) in targets {
        let list = value
            .as_array()
            .and_then(|values| {
                values
                    .iter()
                    .map(|v| v.as_str().map(String::from))
                    .collect::<Option<Vec<_>>>()
            })
            .ok_or_else(|| {
                ConfigError::Targets(format!(
                    "targets for {} must be a list of channel or user names",
                    connection
                ))
            })?;
        parsed.insert(connection.clone(), list);
    }
    Ok(parsed)
}

fn interval_from(table: &Table) -> Result<u64, ConfigError> {
    match table.get("interval") {
        None => Ok(DEFAULT_INTERVAL_SECS),
        Some(Value::Integer(secs)) if *secs > 0 => Ok(*secs as u64),
        Some(_) => Err(ConfigError::Interval(
            "interval must reference a positive integer value".into(),
        )),
    }
}

fn formatter_from(table: &Table) -> Result<Arc<dyn Formatter>, ConfigError> {
    let (pattern, date_format) = match table.get("formatter") {
        None => return Ok(Arc::new(TemplateFormatter::default())),
        Some(Value::String(pattern)) => (Some(pattern.as_str()), None),
        Some(Value::Table(settings)) => {
            let field = |key: &str| match settings.get(key) {
                None => Ok(None),
                Some(Value::String(s)) => Ok(Some(s.as_str())),
                Some(_) => Err(ConfigError::Formatter(format!("formatter.{} must be a string", key))),
            };
            (field("pattern")?, field("date_format")?)
        }
        Some(_) => {
            return Err(ConfigError::Formatter(
                "formatter must be a pattern string or a table".into(),
            ))
        }
    };

    if pattern.is_some_and(|p| p.is_empty()) {
        return Err(ConfigError::Formatter("formatter pattern must not be empty".into()));
    }

    let date_format = date_format.unwrap_or(DEFAULT_DATE_FORMAT);
    if StrftimeItems::new(date_format).any(|item| matches!(item, Item::Error)) {
        return Err(ConfigError::Formatter(format!(
            "invalid date format: {}",
            date_format
        )));
    }

    Ok(Arc::new(TemplateFormatter::new(
        pattern.unwrap_or(DEFAULT_PATTERN),
        date_format,
    )))
}
