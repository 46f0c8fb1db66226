use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use feedticker::app::AppContext;
use feedticker::cli::{commands, Cli, Commands};
use feedticker::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    let config_path = cli.config.as_deref();

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => {
            let ctx = AppContext::new(config_path)?;
            commands::run(ctx).await?;
        }
        Commands::Check => {
            let config = Config::load(config_path)?;
            commands::check(&config)?;
        }
        Commands::Preview { urls, pattern } => {
            let ctx = AppContext::new(config_path)?;
            commands::preview(&ctx, &urls, pattern.as_deref()).await?;
        }
        Commands::Init => {
            commands::init(config_path)?;
        }
    }

    Ok(())
}
