//! The poll → diff → deliver cycle.
//!
//! ```text
//! poll task (per feed) ──Polled──▶ controller ──▶ cache / registry ──▶ sessions
//!        ▲                             │
//!        └──────── ack, then sleep ────┘
//! ```
//!
//! Every feed URL gets its own task that fetches and parses, hands the
//! outcome to the controller and waits for it to be processed before
//! sleeping for the poll interval. The controller task is the only owner of
//! [`TickerState`], so the cache and the registry need no locking.

pub mod cache;
pub mod novelty;
pub mod registry;

pub use cache::FeedCache;
pub use novelty::diff;
pub use registry::{DestinationRegistry, Session};

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, info, warn};

use crate::app::TickerError;
use crate::config::TickerConfig;
use crate::domain::Entry;
use crate::fetcher::Fetcher;
use crate::formatter::Formatter;
use crate::normalizer::FeedParser;

/// Result of one fetch-and-parse attempt.
#[derive(Debug)]
pub enum PollOutcome {
    Parsed(Vec<Entry>),
    FetchFailed(TickerError),
    ParseFailed { error: TickerError, payload: Vec<u8> },
}

/// What processing a [`PollOutcome`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleReport {
    /// First successful parse of the feed: stored, nothing delivered.
    Baseline { entries: usize },
    /// `new` entries were detected and `sent` messages handed to sessions.
    Delivered { new: usize, sent: usize },
    FetchFailed,
    ParseFailed,
    /// Processing panicked; the cached baseline was left as it was.
    Aborted,
}

/// Cache, registry and formatter, owned by the controller.
pub struct TickerState {
    cache: FeedCache,
    registry: DestinationRegistry,
    formatter: Arc<dyn Formatter>,
}

impl TickerState {
    pub fn new(config: &TickerConfig) -> Self {
        Self {
            cache: FeedCache::new(),
            registry: DestinationRegistry::from_targets(config.targets()),
            formatter: config.formatter(),
        }
    }

    pub fn cache(&self) -> &FeedCache {
        &self.cache
    }

    pub fn registry(&self) -> &DestinationRegistry {
        &self.registry
    }

    pub fn bind_session(&mut self, connection: &str, session: Arc<dyn Session>) {
        info!(connection, "Connection ready for delivery");
        self.registry.bind_session(connection, session);
    }

    /// Apply one poll outcome for `url`.
    ///
    /// A successful parse always becomes the new baseline. Delivery only
    /// happens when a baseline already existed, so the backlog of a feed
    /// seen for the first time is never syndicated. Failures leave the
    /// cached baseline untouched.
    pub fn process(&mut self, url: &str, outcome: PollOutcome) -> CycleReport {
        match outcome {
            PollOutcome::Parsed(entries) => {
                let report = match self.cache.get(url) {
                    None => {
                        info!(url, entries = entries.len(), "Stored initial feed contents");
                        CycleReport::Baseline {
                            entries: entries.len(),
                        }
                    }
                    Some(old) => {
                        let new = diff(&entries, old);
                        for entry in &new {
                            debug!(url, title = entry.display_title(), "New feed item");
                        }
                        let sent = self.syndicate(&new);
                        if !new.is_empty() {
                            info!(url, new = new.len(), sent, "Syndicated new feed items");
                        }
                        CycleReport::Delivered {
                            new: new.len(),
                            sent,
                        }
                    }
                };
                self.cache.replace(url, entries);
                report
            }
            PollOutcome::FetchFailed(error) => {
                warn!(url, error = %error, "Failed to poll feed");
                CycleReport::FetchFailed
            }
            PollOutcome::ParseFailed { error, payload } => {
                warn!(
                    url,
                    error = %error,
                    payload = %String::from_utf8_lossy(&payload),
                    "Failed to process feed"
                );
                CycleReport::ParseFailed
            }
        }
    }

    /// Format `entries` and send them to every configured destination.
    pub fn syndicate(&self, entries: &[Entry]) -> usize {
        let messages: Vec<String> = entries.iter().map(|e| self.formatter.format(e)).collect();
        self.registry.broadcast(&messages)
    }
}

/// Message type for the controller
enum TickerMessage {
    Polled {
        url: String,
        outcome: PollOutcome,
        done: oneshot::Sender<CycleReport>,
    },
    SessionReady {
        connection: String,
        session: Arc<dyn Session>,
    },
    Shutdown,
}

/// Handle to talk to a running [`Ticker`]
#[derive(Clone)]
pub struct TickerHandle {
    tx: mpsc::UnboundedSender<TickerMessage>,
}

impl TickerHandle {
    /// Report that `connection` can now send, with its session.
    ///
    /// Calling it again for the same connection (after a reconnect) replaces
    /// the previous session.
    pub fn bind_session(&self, connection: impl Into<String>, session: Arc<dyn Session>) {
        let msg = TickerMessage::SessionReady {
            connection: connection.into(),
            session,
        };
        if self.tx.send(msg).is_err() {
            warn!("Ticker is gone, dropping session");
        }
    }

    pub fn shutdown(&self) {
        let _ = self.tx.send(TickerMessage::Shutdown);
    }
}

/// Controller of the per-feed poll cycles.
pub struct Ticker {
    config: TickerConfig,
    fetcher: Arc<dyn Fetcher + Send + Sync>,
    parser: Arc<dyn FeedParser + Send + Sync>,
    state: TickerState,
    tx: mpsc::UnboundedSender<TickerMessage>,
    rx: mpsc::UnboundedReceiver<TickerMessage>,
}

impl Ticker {
    /// Create a ticker and return a handle to communicate with it
    pub fn new(
        config: TickerConfig,
        fetcher: Arc<dyn Fetcher + Send + Sync>,
        parser: Arc<dyn FeedParser + Send + Sync>,
    ) -> (Self, TickerHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = TickerHandle { tx: tx.clone() };
        let state = TickerState::new(&config);
        let ticker = Self {
            config,
            fetcher,
            parser,
            state,
            tx,
            rx,
        };
        (ticker, handle)
    }

    /// Poll every feed until a shutdown is requested.
    pub async fn run(mut self) {
        let interval = self.config.interval();
        info!(
            feeds = self.config.urls().len(),
            interval_secs = interval.as_secs(),
            "Feed ticker started"
        );

        let mut pollers = JoinSet::new();
        for url in self.config.urls() {
            pollers.spawn(poll_feed(
                url.clone(),
                self.fetcher.clone(),
                self.parser.clone(),
                interval,
                self.tx.clone(),
            ));
        }

        while let Some(msg) = self.rx.recv().await {
            match msg {
                TickerMessage::Polled { url, outcome, done } => {
                    let report = self.process_guarded(&url, outcome);
                    let _ = done.send(report);
                }
                TickerMessage::SessionReady {
                    connection,
                    session,
                } => {
                    self.state.bind_session(&connection, session);
                }
                TickerMessage::Shutdown => {
                    info!("Feed ticker shutting down");
                    break;
                }
            }
        }

        pollers.shutdown().await;
    }

    /// [`TickerState::process`], with a panic reported as a failed cycle
    /// of this feed only.
    fn process_guarded(&mut self, url: &str, outcome: PollOutcome) -> CycleReport {
        let state = &mut self.state;
        match panic::catch_unwind(AssertUnwindSafe(|| state.process(url, outcome))) {
            Ok(report) => report,
            Err(cause) => {
                let reason = cause
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| cause.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                warn!(url, error = %reason, "Failed to process feed");
                CycleReport::Aborted
            }
        }
    }
}

/// Spawn the ticker as a tokio task
pub fn spawn_ticker(
    config: TickerConfig,
    fetcher: Arc<dyn Fetcher + Send + Sync>,
    parser: Arc<dyn FeedParser + Send + Sync>,
) -> (TickerHandle, JoinHandle<()>) {
    let (ticker, handle) = Ticker::new(config, fetcher, parser);
    let task = tokio::spawn(ticker.run());
    (handle, task)
}

/// One feed's cycle: fetch, parse, wait for processing, sleep, repeat.
async fn poll_feed(
    url: String,
    fetcher: Arc<dyn Fetcher + Send + Sync>,
    parser: Arc<dyn FeedParser + Send + Sync>,
    interval: Duration,
    tx: mpsc::UnboundedSender<TickerMessage>,
) {
    loop {
        debug!(url = %url, "Polling feed");

        let outcome = match fetcher.fetch(&url).await {
            Ok(body) => match parser.parse(&body) {
                Ok(entries) => PollOutcome::Parsed(entries),
                Err(error) => PollOutcome::ParseFailed {
                    error,
                    payload: body,
                },
            },
            Err(error) => PollOutcome::FetchFailed(error),
        };

        let (done, processed) = oneshot::channel();
        let msg = TickerMessage::Polled {
            url: url.clone(),
            outcome,
            done,
        };
        if tx.send(msg).is_err() {
            debug!(url = %url, "Ticker is gone, stopping poll loop");
            return;
        }

        match processed.await {
            Ok(report) => debug!(url = %url, ?report, "Feed processed"),
            Err(_) => warn!(url = %url, "Feed processing did not complete"),
        }

        tokio::time::sleep(interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::registry::tests::{capture_logs, RecordingSession};
    use super::*;
    use crate::formatter::TemplateFormatter;
    use std::collections::BTreeMap;

    const URL: &str = "https://example.com/feed.xml";
    const CONNECTION: &str = "bot!bot@localhost";

    fn entry(n: u32) -> Entry {
        let mut entry = Entry::new(n.to_string());
        entry.title = Some(format!("Title {}", n));
        entry.link = Some(format!("https://example.com/{}", n));
        entry.permalink = entry.link.clone();
        entry
    }

    fn config() -> TickerConfig {
        let mut targets = BTreeMap::new();
        targets.insert(
            CONNECTION.to_string(),
            vec!["#one".to_string(), "#two".to_string()],
        );
        TickerConfig::new(vec![URL.to_string()], targets).unwrap()
    }

    fn state_with_session(config: &TickerConfig) -> (TickerState, Arc<RecordingSession>) {
        let mut state = TickerState::new(config);
        let session = Arc::new(RecordingSession::default());
        state.bind_session(CONNECTION, session.clone());
        (state, session)
    }

    #[test]
    fn test_first_poll_is_suppressed() {
        let (mut state, session) = state_with_session(&config());

        let report = state.process(URL, PollOutcome::Parsed(vec![entry(1), entry(2)]));

        assert_eq!(report, CycleReport::Baseline { entries: 2 });
        assert_eq!(state.cache().get(URL).map(<[Entry]>::len), Some(2));
        assert!(session.sent().is_empty());
    }

    #[test]
    fn test_second_poll_delivers_only_new_entries() {
        let (mut state, session) = state_with_session(&config());
        state.process(URL, PollOutcome::Parsed(vec![entry(1), entry(2)]));

        let report = state.process(
            URL,
            PollOutcome::Parsed(vec![entry(1), entry(2), entry(3)]),
        );

        assert_eq!(report, CycleReport::Delivered { new: 1, sent: 2 });
        let expected = "Title 3 [ https://example.com/3 ] by  at ";
        assert_eq!(
            session.sent(),
            vec![
                ("#one".to_string(), expected.to_string()),
                ("#two".to_string(), expected.to_string()),
            ]
        );
        assert_eq!(state.cache().get(URL).map(<[Entry]>::len), Some(3));
    }

    #[test]
    fn test_empty_baseline_still_counts_as_polled() {
        let (mut state, session) = state_with_session(&config());
        state.process(URL, PollOutcome::Parsed(Vec::new()));

        let report = state.process(URL, PollOutcome::Parsed(vec![entry(1)]));

        assert_eq!(report, CycleReport::Delivered { new: 1, sent: 2 });
        assert_eq!(session.sent().len(), 2);
    }

    #[test]
    fn test_fetch_failure_keeps_cache() {
        let (mut state, session) = state_with_session(&config());
        state.process(URL, PollOutcome::Parsed(vec![entry(1)]));

        let report = state.process(
            URL,
            PollOutcome::FetchFailed(TickerError::Other("connection refused".into())),
        );

        assert_eq!(report, CycleReport::FetchFailed);
        assert_eq!(state.cache().get(URL).map(<[Entry]>::len), Some(1));

        // The next good poll still compares against the last good baseline
        state.process(URL, PollOutcome::Parsed(vec![entry(1), entry(2)]));
        assert_eq!(session.sent().len(), 2);
    }

    #[test]
    fn test_fetch_failure_before_any_success_leaves_no_baseline() {
        let (mut state, _session) = state_with_session(&config());
        state.process(
            URL,
            PollOutcome::FetchFailed(TickerError::Other("timeout".into())),
        );
        assert!(!state.cache().contains(URL));
    }

    #[test]
    fn test_fetch_failure_logs_url_and_error() {
        let (mut state, _session) = state_with_session(&config());

        let logs = capture_logs(|| {
            state.process(
                URL,
                PollOutcome::FetchFailed(TickerError::Other("connection refused".into())),
            );
        });

        assert!(logs.contains("Failed to poll feed"));
        assert!(logs.contains(URL));
        assert!(logs.contains("connection refused"));
    }

    #[test]
    fn test_parse_failure_logs_raw_payload() {
        let (mut state, _session) = state_with_session(&config());

        let logs = capture_logs(|| {
            state.process(
                URL,
                PollOutcome::ParseFailed {
                    error: TickerError::FeedParse("unexpected EOF".into()),
                    payload: b"<html>maintenance</html>".to_vec(),
                },
            );
        });

        assert!(logs.contains("Failed to process feed"));
        assert!(logs.contains(URL));
        assert!(logs.contains("unexpected EOF"));
        assert!(logs.contains("<html>maintenance</html>"));
    }

    #[test]
    fn test_parse_failure_keeps_cache() {
        let (mut state, session) = state_with_session(&config());
        state.process(URL, PollOutcome::Parsed(vec![entry(1)]));

        let report = state.process(
            URL,
            PollOutcome::ParseFailed {
                error: TickerError::FeedParse("unexpected EOF".into()),
                payload: b"<rss".to_vec(),
            },
        );

        assert_eq!(report, CycleReport::ParseFailed);
        assert_eq!(state.cache().get(URL).map(<[Entry]>::len), Some(1));
        assert!(session.sent().is_empty());
    }

    #[test]
    fn test_unready_connection_does_not_block_others() {
        let mut targets = BTreeMap::new();
        targets.insert("absent!bot@localhost".to_string(), vec!["#x".to_string()]);
        targets.insert(CONNECTION.to_string(), vec!["#one".to_string()]);
        let config = TickerConfig::new(vec![URL.to_string()], targets).unwrap();
        let (mut state, session) = state_with_session(&config);

        state.process(URL, PollOutcome::Parsed(vec![entry(1)]));
        let report = state.process(URL, PollOutcome::Parsed(vec![entry(1), entry(2)]));

        assert_eq!(report, CycleReport::Delivered { new: 1, sent: 1 });
        assert_eq!(session.sent().len(), 1);
        assert!(!state.registry().is_ready("absent!bot@localhost"));
    }

    #[test]
    fn test_custom_formatter() {
        let config = config().with_formatter(Arc::new(TemplateFormatter::with_pattern("%title%")));
        let (mut state, session) = state_with_session(&config);

        state.process(URL, PollOutcome::Parsed(vec![entry(1)]));
        state.process(URL, PollOutcome::Parsed(vec![entry(1), entry(2)]));

        assert_eq!(session.sent()[0].1, "Title 2");
    }

    #[test]
    fn test_feeds_have_separate_baselines() {
        let other = "https://example.org/atom.xml";
        let (mut state, session) = state_with_session(&config());
        state.process(URL, PollOutcome::Parsed(vec![entry(1)]));

        let report = state.process(other, PollOutcome::Parsed(vec![entry(1), entry(2)]));

        assert_eq!(report, CycleReport::Baseline { entries: 2 });
        assert!(session.sent().is_empty());
    }
}
