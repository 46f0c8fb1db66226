//! Configuration management for feedticker.
//!
//! Configuration is read from `~/.config/feedticker/config.toml` unless a
//! path is given. `feedticker init` writes a commented starting point.
//!
//! The `[ticker]` table is validated key by key so each invalid setting is
//! reported with its own [`ConfigError`] variant.

pub mod connection;
pub mod ticker;

pub use connection::ConnectionSettings;
pub use ticker::{TickerConfig, DEFAULT_INTERVAL_SECS};

use serde::Deserialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// On-disk layout before validation.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawConfig {
    ticker: toml::Table,
    connections: Vec<ConnectionSettings>,
}

/// Main configuration struct.
#[derive(Debug, Clone)]
pub struct Config {
    pub ticker: TickerConfig,
    pub connections: Vec<ConnectionSettings>,
}

impl Config {
    /// Load configuration from `path`, or from the default path.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::default_config_path()?,
        };

        let content = fs::read_to_string(&config_path).map_err(|e| ConfigError::Io {
            path: config_path.clone(),
            source: e,
        })?;

        let raw: RawConfig = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: config_path,
            source: e,
        })?;

        Self::from_raw(raw)
    }

    fn from_raw(raw: RawConfig) -> Result<Self, ConfigError> {
        let ticker = TickerConfig::from_table(&raw.ticker)?;
        for connection in &raw.connections {
            connection.validate()?;
        }

        Ok(Self {
            ticker,
            connections: raw.connections,
        })
    }

    /// Get the default config file path: `~/.config/feedticker/config.toml`
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("feedticker").join("config.toml"))
    }

    /// Write the commented default configuration to `path`.
    ///
    /// An existing file is left alone; returns whether a file was written.
    pub fn create_default_config(path: &Path) -> Result<bool, ConfigError> {
        if path.exists() {
            return Ok(false);
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let mut file = fs::File::create(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        file.write_all(Self::default_config_content().as_bytes())
            .map_err(|e| ConfigError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;

        Ok(true)
    }

    /// Generate the default config file content with comments.
    fn default_config_content() -> &'static str {
        r##"# feedticker configuration

[ticker]
# Feeds to poll (RSS 0.9x/1.0/2.0, Atom or JSON Feed)
urls = [
    "https://blog.rust-lang.org/feed.xml",
]

# Seconds between two polls of the same feed
interval = 300

# Message pattern. Recognized placeholders:
#   %title% %link% %links% %permalink% %id% %content% %description%
#   %authorname% %authoremail% %authoruri% %datecreated% %datemodified%
#   %commentcount% %commentlink% %commentfeedlink%
# date_format uses chrono strftime syntax.
formatter = { pattern = "%title% [ %link% ] by %authorname% at %datemodified%", date_format = "%Y-%m-%dT%H:%M:%S%z" }

# Channels or users receiving new items, keyed by connection
# (nickname!username@hostname of an entry in [[connections]])
[ticker.targets]
"feedticker!feedticker@localhost" = ["#feedticker"]

[[connections]]
server = "irc.libera.chat"
port = 6667
nickname = "feedticker"
# username = "feedticker"
# realname = "feedticker"
# hostname = "localhost"
# password = "secret"
reconnect_delay = 30
"##
    }
}

impl std::str::FromStr for Config {
    type Err = ConfigError;

    fn from_str(content: &str) -> Result<Self, Self::Err> {
        let raw: RawConfig = toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: PathBuf::from("<string>"),
            source: e,
        })?;
        Self::from_raw(raw)
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to read/write config file at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid urls: {0}")]
    Urls(String),

    #[error("Invalid targets: {0}")]
    Targets(String),

    #[error("Invalid interval: {0}")]
    Interval(String),

    #[error("Invalid formatter: {0}")]
    Formatter(String),

    #[error("Invalid connection: {0}")]
    Connection(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_default_config_is_valid() {
        let config: Config = Config::default_config_content()
            .parse()
            .expect("Default config should be valid");

        assert_eq!(config.ticker.urls(), ["https://blog.rust-lang.org/feed.xml"]);
        assert_eq!(config.ticker.interval(), Duration::from_secs(300));
        assert_eq!(config.connections.len(), 1);
        assert!(config
            .ticker
            .targets()
            .contains_key(&config.connections[0].mask()));
    }

    #[test]
    fn test_empty_config_reports_urls() {
        let err = "".parse::<Config>().unwrap_err();
        assert!(matches!(err, ConfigError::Urls(_)));
    }

    #[test]
    fn test_invalid_connection() {
        let content = r##"
[ticker]
urls = ["https://example.com/feed.xml"]
[ticker.targets]

[[connections]]
server = "irc.example.net"
nickname = ""
"##;
        let err = content.parse::<Config>().unwrap_err();
        assert!(matches!(err, ConfigError::Connection(_)));
    }

    #[test]
    fn test_load_and_create_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        assert!(matches!(
            Config::load(Some(&path)),
            Err(ConfigError::Io { .. })
        ));
        assert!(Config::create_default_config(&path).unwrap());
        assert!(!Config::create_default_config(&path).unwrap());

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.connections[0].server, "irc.libera.chat");
    }

    #[test]
    fn test_load_reports_toml_syntax_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[ticker\nurls = ").unwrap();
        assert!(matches!(
            Config::load(Some(&path)),
            Err(ConfigError::Parse { .. })
        ));
    }
}
