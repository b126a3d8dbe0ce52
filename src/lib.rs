// Re-export modules
pub mod config;
pub mod fetcher;
pub mod pool;
pub mod results;

// Re-export commonly used types for convenience
pub use config::TallyConfig;
pub use fetcher::FetchOutcome;
pub use pool::{Aggregation, TallyError};
pub use results::{TallyReport, UrlCount};

/// Main builder for tallying a word across a list of URLs
pub struct WordTally {
    config: TallyConfig,
}

impl WordTally {
    /// Create a new WordTally builder for the given target word
    pub fn new(word: &str) -> Self {
        Self {
            config: TallyConfig::new(word),
        }
    }

    /// Replace the target word
    pub fn with_word(mut self, word: &str) -> Self {
        self.config.word = word.to_string();
        self
    }

    /// Replace the list of URLs to fetch
    pub fn with_urls(mut self, urls: Vec<String>) -> Self {
        self.config.urls = urls;
        self
    }

    /// Append a single URL to the list
    pub fn with_url(mut self, url: &str) -> Self {
        self.config.urls.push(url.to_string());
        self
    }

    /// Set the maximum number of fetches in flight at once
    pub fn with_pool_size(mut self, pool_size: usize) -> Self {
        self.config.pool_size = pool_size;
        self
    }

    /// Set the per-request timeout in seconds
    pub fn with_request_timeout(mut self, timeout_seconds: u64) -> Self {
        self.config.request_timeout_secs = timeout_seconds;
        self
    }

    /// Set the result aggregation strategy
    pub fn with_aggregation(mut self, aggregation: Aggregation) -> Self {
        self.config.aggregation = aggregation;
        self
    }

    /// Set the configuration from a TallyConfig
    pub fn with_config(mut self, config: TallyConfig) -> Self {
        self.config = config;
        self
    }

    /// Load configuration from a file
    pub fn with_config_file(
        self,
        path: impl AsRef<std::path::Path>,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let config = TallyConfig::from_file(path)?;
        Ok(self.with_config(config))
    }

    /// Load configuration from a string
    pub fn with_config_str(self, config_str: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let config = serde_json::from_str(config_str)?;
        Ok(self.with_config(config))
    }

    /// Run the tally and get the aggregated report
    pub async fn run(self) -> Result<TallyReport, TallyError> {
        pool::run(&self.config).await
    }
}
