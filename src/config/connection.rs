use serde::Deserialize;

use super::ConfigError;

/// Settings for one IRC connection.
#[derive(Debug, Clone, Deserialize)]
pub struct ConnectionSettings {
    pub server: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub nickname: String,
    pub username: Option<String>,
    #[serde(default = "default_realname")]
    pub realname: String,
    #[serde(default = "default_hostname")]
    pub hostname: String,
    pub password: Option<String>,
    /// Seconds to wait before reconnecting after the connection drops
    #[serde(default = "default_reconnect_delay")]
    pub reconnect_delay: u64,
}

fn default_port() -> u16 {
    6667
}

fn default_realname() -> String {
    "feedticker".to_string()
}

fn default_hostname() -> String {
    "localhost".to_string()
}

fn default_reconnect_delay() -> u64 {
    30
}

impl ConnectionSettings {
    pub fn new(server: impl Into<String>, nickname: impl Into<String>) -> Self {
        Self {
            server: server.into(),
            port: default_port(),
            nickname: nickname.into(),
            username: None,
            realname: default_realname(),
            hostname: default_hostname(),
            password: None,
            reconnect_delay: default_reconnect_delay(),
        }
    }

    pub fn username(&self) -> &str {
        self.username.as_deref().unwrap_or(&self.nickname)
    }

    /// Connection identity used as the key of `[ticker.targets]`.
    pub fn mask(&self) -> String {
        format!("{}!{}@{}", self.nickname, self.username(), self.hostname)
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.server, self.port)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.trim().is_empty() {
            return Err(ConfigError::Connection("server must not be empty".into()));
        }
        if self.nickname.trim().is_empty() || self.nickname.contains(char::is_whitespace) {
            return Err(ConfigError::Connection(format!(
                "invalid nickname for {}: {:?}",
                self.server, self.nickname
            )));
        }
        Ok(())
    }
}
