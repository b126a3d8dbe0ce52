use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::pool::Aggregation;

/// Configuration for a tally run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TallyConfig {
    /// Word to count, matched as a case-sensitive literal substring
    pub word: String,

    /// URLs whose response bodies are searched
    #[serde(default)]
    pub urls: Vec<String>,

    /// Maximum number of concurrent requests
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,

    /// Timeout in seconds for each GET request
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// How worker results are folded into the final report
    #[serde(default)]
    pub aggregation: Aggregation,
}

impl TallyConfig {
    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn Error>> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        let config: Self = serde_json::from_str(&contents)?;
        Ok(config)
    }
}

/// Default value for pool_size
fn default_pool_size() -> usize {
    5
}

/// Default request timeout in seconds
fn default_request_timeout_secs() -> u64 {
    30
}

impl TallyConfig {
    /// Create a new configuration with default values and no URLs
    pub fn new(word: &str) -> Self {
        Self {
            word: word.to_string(),
            urls: Vec::new(),
            pool_size: default_pool_size(),
            request_timeout_secs: default_request_timeout_secs(),
            aggregation: Aggregation::default(),
        }
    }
}
