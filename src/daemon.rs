//! Long-running relay process.
//!
//! Starts the feed ticker, keeps every configured IRC connection alive and
//! stops everything on SIGINT/SIGTERM.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::app::{AppContext, Result};
use crate::config::ConnectionSettings;
use crate::irc::IrcConnection;
use crate::ticker::{spawn_ticker, TickerHandle};

/// Format interval for display
pub fn format_interval(secs: u64) -> String {
    if secs >= 86400 && secs.is_multiple_of(86400) {
        format!("{}d", secs / 86400)
    } else if secs >= 3600 && secs.is_multiple_of(3600) {
        format!("{}h", secs / 3600)
    } else if secs >= 60 && secs.is_multiple_of(60) {
        format!("{}m", secs / 60)
    } else {
        format!("{}s", secs)
    }
}

/// Daemon runner
pub struct Daemon {
    ctx: Arc<AppContext>,
}

impl Daemon {
    pub fn new(ctx: Arc<AppContext>) -> Self {
        Self { ctx }
    }

    /// Run until a shutdown signal arrives.
    pub async fn run(&self) -> Result<()> {
        let ticker_config = self.ctx.config.ticker.clone();
        let connections = &self.ctx.config.connections;

        info!(
            feeds = ticker_config.urls().len(),
            connections = connections.len(),
            interval = %format_interval(ticker_config.interval().as_secs()),
            pid = std::process::id(),
            "feedticker started"
        );

        for connection in ticker_config.targets().keys() {
            if !connections.iter().any(|c| &c.mask() == connection) {
                warn!(connection = %connection, "Targets reference a connection that is not configured");
            }
        }

        let (ticker, ticker_task) = spawn_ticker(
            ticker_config,
            self.ctx.fetcher.clone(),
            self.ctx.parser.clone(),
        );

        let mut links = JoinSet::new();
        for settings in connections {
            links.spawn(keep_connected(settings.clone(), ticker.clone()));
        }

        wait_for_shutdown().await?;

        info!("feedticker shutting down...");
        ticker.shutdown();
        links.shutdown().await;
        if let Err(e) = ticker_task.await {
            error!("Ticker task failed: {}", e);
        }

        Ok(())
    }
}

/// Connect, and reconnect after `reconnect_delay` whenever the link drops.
async fn keep_connected(settings: ConnectionSettings, ticker: TickerHandle) {
    let mask = settings.mask();
    let delay = Duration::from_secs(settings.reconnect_delay);
    let connection = IrcConnection::new(settings);

    loop {
        let result = connection
            .connect(|session| ticker.bind_session(mask.clone(), session))
            .await;

        match result {
            Ok(()) => info!(connection = %mask, "Disconnected"),
            Err(e) => warn!(connection = %mask, error = %e, "Connection failed"),
        }

        info!(connection = %mask, delay_secs = delay.as_secs(), "Reconnecting later");
        tokio::time::sleep(delay).await;
    }
}

#[cfg(unix)]
async fn wait_for_shutdown() -> Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    tokio::select! {
        _ = sigterm.recv() => {},
        _ = sigint.recv() => {},
    }
    Ok(())
}

#[cfg(windows)]
async fn wait_for_shutdown() -> Result<()> {
    tokio::signal::ctrl_c().await?;
    Ok(())
}
