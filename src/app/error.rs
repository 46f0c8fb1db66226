use thiserror::Error;

use crate::config::ConfigError;

#[derive(Error, Debug)]
pub enum TickerError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Feed parsing error: {0}")]
    FeedParse(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("IRC error: {0}")]
    Irc(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, TickerError>;
