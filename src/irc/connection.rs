use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

use crate::app::{Result, TickerError};
use crate::config::ConnectionSettings;
use crate::irc::message::{self, Message, MAX_LINE_LEN};
use crate::ticker::Session;

/// End of MOTD
const RPL_ENDOFMOTD: &str = "376";
/// No MOTD available
const ERR_NOMOTD: &str = "422";
const ERR_NICKNAMEINUSE: &str = "433";

/// Longest inbound line accepted: message tags may add up to 8191 bytes.
const MAX_INBOUND_LEN: usize = 8191 + MAX_LINE_LEN;

/// [`Session`] that queues PRIVMSG lines for the connection's writer.
#[derive(Clone)]
pub struct IrcSession {
    tx: mpsc::UnboundedSender<String>,
}

impl Session for IrcSession {
    fn send(&self, target: &str, message: &str) {
        if self.tx.send(message::privmsg(target, message)).is_err() {
            debug!(target, "Connection closed, dropping message");
        }
    }
}

pub struct IrcConnection {
    settings: ConnectionSettings,
}

impl IrcConnection {
    pub fn new(settings: ConnectionSettings) -> Self {
        Self { settings }
    }

    /// Open a TCP connection and run it until it closes.
    pub async fn connect<F>(&self, on_ready: F) -> Result<()>
    where
        F: FnMut(Arc<dyn Session>),
    {
        let address = self.settings.address();
        info!(address = %address, nickname = %self.settings.nickname, "Connecting");
        let stream = TcpStream::connect(&address).await?;
        self.run(stream, on_ready).await
    }

    /// Register on `stream` and serve it until the server closes it.
    ///
    /// `on_ready` receives the session once the server has finished
    /// sending its MOTD (or reported that there is none).
    pub async fn run<S, F>(&self, stream: S, mut on_ready: F) -> Result<()>
    where
        S: AsyncRead + AsyncWrite + Unpin,
        F: FnMut(Arc<dyn Session>),
    {
        let (reader, mut writer) = tokio::io::split(stream);
        let mut reader = BufReader::new(reader).take(MAX_INBOUND_LEN as u64);
        let (tx, mut rx) = mpsc::unbounded_channel();

        if let Some(password) = &self.settings.password {
            let _ = tx.send(message::pass(password));
        }
        let _ = tx.send(message::nick(&self.settings.nickname));
        let _ = tx.send(message::user(self.settings.username(), &self.settings.realname));

        let mut ready = false;
        let mut buf = Vec::new();

        loop {
            reader.set_limit((MAX_INBOUND_LEN - buf.len()) as u64);

            tokio::select! {
                read = reader.read_until(b'\n', &mut buf) => {
                    if read? == 0 {
                        info!(server = %self.settings.server, "Connection closed by server");
                        return Ok(());
                    }
                    if buf.len() >= MAX_INBOUND_LEN && !buf.ends_with(b"\n") {
                        return Err(TickerError::Irc(format!(
                            "line longer than {} bytes",
                            MAX_INBOUND_LEN
                        )));
                    }
                    let line = String::from_utf8_lossy(&buf).into_owned();
                    buf.clear();

                    let Some(msg) = Message::parse(&line) else {
                        continue;
                    };
                    trace!(line = %line.trim_end(), "Received");

                    match msg.command.as_str() {
                        "PING" => {
                            let token = msg.params.first().map(String::as_str).unwrap_or("");
                            let _ = tx.send(message::pong(token));
                        }
                        RPL_ENDOFMOTD | ERR_NOMOTD if !ready => {
                            ready = true;
                            info!(connection = %self.settings.mask(), "Registered");
                            on_ready(Arc::new(IrcSession { tx: tx.clone() }));
                        }
                        ERR_NICKNAMEINUSE => {
                            return Err(TickerError::Irc(format!(
                                "nickname {} is already in use",
                                self.settings.nickname
                            )));
                        }
                        "ERROR" => {
                            let reason = msg.params.last().cloned().unwrap_or_default();
                            warn!(server = %self.settings.server, reason = %reason, "Server closed the link");
                            return Err(TickerError::Irc(reason));
                        }
                        _ => {}
                    }
                }
                Some(line) = rx.recv() => {
                    writer.write_all(line.as_bytes()).await?;
                    writer.flush().await?;
                }
            }
        }
    }
}
