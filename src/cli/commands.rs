use std::fmt::Write;
use std::path::Path;
use std::sync::Arc;

use futures::future::join_all;

use crate::app::{AppContext, Result};
use crate::config::Config;
use crate::daemon::{format_interval, Daemon};
use crate::formatter::{Formatter, TemplateFormatter};

pub async fn run(ctx: AppContext) -> Result<()> {
    Daemon::new(Arc::new(ctx)).run().await
}

pub fn check(config: &Config) -> Result<()> {
    print!("{}", summary(config));
    Ok(())
}

/// Human-readable description of a validated configuration.
fn summary(config: &Config) -> String {
    let ticker = &config.ticker;
    let mut out = String::new();

    let _ = writeln!(
        out,
        "Configuration OK: {} feeds, polled every {}",
        ticker.urls().len(),
        format_interval(ticker.interval().as_secs())
    );
    for url in ticker.urls() {
        let _ = writeln!(out, "  {}", url);
    }

    for (connection, targets) in ticker.targets() {
        let configured = config.connections.iter().any(|c| &c.mask() == connection);
        let _ = writeln!(
            out,
            "{} -> {}{}",
            connection,
            targets.join(", "),
            if configured { "" } else { " (no such connection)" }
        );
    }

    out
}

pub async fn preview(ctx: &AppContext, urls: &[String], pattern: Option<&str>) -> Result<()> {
    let formatter: Arc<dyn Formatter> = match pattern {
        Some(p) => Arc::new(TemplateFormatter::with_pattern(p)),
        None => ctx.config.ticker.formatter(),
    };

    let urls: Vec<String> = if urls.is_empty() {
        ctx.config.ticker.urls().to_vec()
    } else {
        urls.to_vec()
    };

    let polls = urls.iter().map(|url| async move {
        let body = ctx.fetcher.fetch(url).await?;
        ctx.parser.parse(&body)
    });
    let results = join_all(polls).await;

    for (url, result) in urls.iter().zip(results) {
        println!("{}", url);
        match result {
            Ok(entries) if entries.is_empty() => println!("  (no items)"),
            Ok(entries) => {
                for entry in &entries {
                    println!("  {}", formatter.format(entry));
                }
            }
            Err(e) => eprintln!("  ! {}", e),
        }
    }

    Ok(())
}

pub fn init(path: Option<&Path>) -> Result<()> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => Config::default_config_path()?,
    };

    if Config::create_default_config(&path)? {
        println!("Wrote default configuration to {}", path.display());
    } else {
        println!("Configuration already exists at {}", path.display());
    }
    Ok(())
}
