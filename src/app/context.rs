use std::path::Path;
use std::sync::Arc;

use crate::app::error::Result;
use crate::config::Config;
use crate::fetcher::http_fetcher::HttpFetcher;
use crate::fetcher::Fetcher;
use crate::normalizer::{FeedParser, Normalizer};

pub struct AppContext {
    pub config: Config,
    pub fetcher: Arc<dyn Fetcher + Send + Sync>,
    pub parser: Arc<dyn FeedParser + Send + Sync>,
}

impl AppContext {
    /// Load the configuration and build the HTTP fetcher and feed parser.
    pub fn new(config_path: Option<&Path>) -> Result<Self> {
        let config = Config::load(config_path)?;
        Self::with_config(config)
    }

    pub fn with_config(config: Config) -> Result<Self> {
        let fetcher: Arc<dyn Fetcher + Send + Sync> = Arc::new(HttpFetcher::new()?);
        let parser: Arc<dyn FeedParser + Send + Sync> = Arc::new(Normalizer::new());

        Ok(Self {
            config,
            fetcher,
            parser,
        })
    }
}
