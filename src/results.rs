use serde::{Deserialize, Serialize};

use crate::fetcher::FetchOutcome;

/// Tally result for a single URL
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UrlCount {
    /// URL the count came from
    pub url: String,

    /// Occurrences found in the response body (0 when the fetch failed)
    pub matches: usize,

    /// Why the fetch failed, if it did
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl UrlCount {
    /// Create a per-URL count for a successful fetch
    pub fn new(url: String, matches: usize) -> Self {
        Self {
            url,
            matches,
            error: None,
        }
    }

    /// Build a per-URL count from a fetch outcome
    pub fn from_outcome(url: String, outcome: FetchOutcome) -> Self {
        match outcome {
            FetchOutcome::Counted(matches) => Self::new(url, matches),
            FetchOutcome::Failed(reason) => Self {
                url,
                matches: 0,
                error: Some(reason),
            },
        }
    }

    /// Whether this entry is a failed fetch rather than a genuine zero count
    pub fn is_fetch_failure(&self) -> bool {
        self.error.is_some()
    }
}

/// Aggregate report for a whole tally run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TallyReport {
    /// Word that was counted
    pub word: String,

    /// Per-URL counts in completion order
    pub counts: Vec<UrlCount>,

    /// Sum of all per-URL counts, produced only after every task has finished
    pub total: usize,
}

impl TallyReport {
    /// Create a new report
    pub fn new(word: String, counts: Vec<UrlCount>, total: usize) -> Self {
        Self {
            word,
            counts,
            total,
        }
    }
}
