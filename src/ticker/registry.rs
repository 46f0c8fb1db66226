use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use tracing::{debug, warn};

/// Send side of a live messaging connection.
///
/// Delivery is fire-and-forget: the outcome of the underlying transport is
/// not reported back.
pub trait Session: Send + Sync {
    fn send(&self, target: &str, message: &str);
}

/// Where formatted messages go, per connection identity.
///
/// Target lists come from configuration and never change afterwards.
/// Sessions appear once their connection reports it is ready.
#[derive(Default)]
pub struct DestinationRegistry {
    targets: BTreeMap<String, Vec<String>>,
    sessions: HashMap<String, Arc<dyn Session>>,
}

impl DestinationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_targets(targets: &BTreeMap<String, Vec<String>>) -> Self {
        let mut registry = Self::new();
        for (connection, list) in targets {
            registry.register_target(connection, list.clone());
        }
        registry
    }

    pub fn register_target(&mut self, connection: &str, targets: Vec<String>) {
        self.targets.insert(connection.to_string(), targets);
    }

    /// Attach the session for `connection`, replacing any earlier one.
    pub fn bind_session(&mut self, connection: &str, session: Arc<dyn Session>) {
        if self
            .sessions
            .insert(connection.to_string(), session)
            .is_some()
        {
            debug!(connection, "Replaced session");
        } else {
            debug!(connection, "Bound session");
        }
    }

    pub fn is_ready(&self, connection: &str) -> bool {
        self.sessions.contains_key(connection)
    }

    pub fn targets(&self) -> &BTreeMap<String, Vec<String>> {
        &self.targets
    }

    /// Send `message` to `target` over `connection`.
    ///
    /// Returns false, after logging, when the connection has no session yet.
    pub fn deliver(&self, connection: &str, target: &str, message: &str) -> bool {
        match self.sessions.get(connection) {
            Some(session) => {
                session.send(target, message);
                true
            }
            None => {
                warn!(connection, "Encountered unknown connection");
                false
            }
        }
    }

    /// Send every message to every target of every configured connection.
    ///
    /// Connections without a session are skipped with one warning each and
    /// do not hold up the others. Returns the number of messages sent.
    pub fn broadcast(&self, messages: &[String]) -> usize {
        if messages.is_empty() {
            return 0;
        }

        let mut sent = 0;
        for (connection, targets) in &self.targets {
            if !self.is_ready(connection) {
                warn!(connection = %connection, "Connection not ready, skipping delivery");
                continue;
            }

            for target in targets {
                for message in messages {
                    if self.deliver(connection, target, message) {
                        sent += 1;
                    }
                }
            }
        }
        sent
    }
}
