//! # feedticker
//!
//! Polls RSS/Atom feeds and relays new items to IRC channels and users.
//!
//! ## Architecture
//!
//! ```text
//! Fetcher → Normalizer → Ticker (cache + diff) → Formatter → Sessions
//! ```
//!
//! Each feed is polled on its own schedule. The first successful poll of a
//! feed only records its contents; later polls deliver the entries that
//! were not there the previous time.
//!
//! ## Quick Start
//!
//! ```bash
//! # Write a commented config to ~/.config/feedticker/config.toml
//! feedticker init
//!
//! # Validate it
//! feedticker check
//!
//! # See what the configured feeds would produce
//! feedticker preview
//!
//! # Relay
//! feedticker run
//! ```

/// Application context and error types.
pub mod app;

/// Command-line interface using clap.
pub mod cli;

/// Configuration loading and validation.
///
/// The `[ticker]` table (urls, targets, interval, formatter) is validated
/// key by key; `[[connections]]` lists the IRC connections.
pub mod config;

/// Process lifecycle: ticker, IRC connections and shutdown signals.
pub mod daemon;

/// Core domain model: [`Entry`](domain::Entry) and its identity key.
pub mod domain;

/// HTTP fetching of raw feed bodies.
pub mod fetcher;

/// Entry to message formatting with `%placeholder%` patterns.
pub mod formatter;

/// Minimal IRC client that provides delivery sessions.
pub mod irc;

/// Feed parsing and normalization.
///
/// Converts RSS 0.9x/1.0/2.0, Atom 0.3/1.0, and JSON Feed 1.0
/// into [`Entry`](domain::Entry) values.
pub mod normalizer;

/// Poll scheduling, novelty detection and delivery fan-out.
pub mod ticker;
