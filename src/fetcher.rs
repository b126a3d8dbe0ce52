use std::time::Duration;

/// Outcome of a single fetch-and-count request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Body retrieved; holds the number of matches found in it
    Counted(usize),
    /// Request failed; tallied as zero
    Failed(String),
}

impl FetchOutcome {
    /// Number of matches this outcome contributes to a total
    pub fn matches(&self) -> usize {
        match self {
            FetchOutcome::Counted(matches) => *matches,
            FetchOutcome::Failed(_) => 0,
        }
    }
}

/// Fetches a page and counts occurrences of `word` in its body.
///
/// # Arguments
///
/// * `word` - Substring to count, case-sensitive
/// * `url` - Page to fetch
/// * `request_timeout` - Bound on the whole request/response cycle
///
/// Every failure (client build, connect, timeout, body read) is downgraded to
/// a zero-count outcome so one bad URL never aborts a batch. A non-success
/// status code is not a failure; whatever body the server returns is counted.
pub async fn fetch_count(word: &str, url: &str, request_timeout: Duration) -> FetchOutcome {
    // One client per request, carrying the per-request timeout; the timeout
    // covers connection plus body read, not just connection setup
    let client = match reqwest::Client::builder().timeout(request_timeout).build() {
        Ok(client) => client,
        Err(e) => {
            ::log::error!("Failed to build HTTP client for {}: {}", url, e);
            return FetchOutcome::Failed(e.to_string());
        }
    };

    let response = match client.get(url).send().await {
        Ok(response) => response,
        Err(e) => {
            ::log::debug!("GET {} failed: {}", url, e);
            return FetchOutcome::Failed(e.to_string());
        }
    };

    // Reading the body to completion (or dropping the response on the error
    // path) is what releases the connection
    match response.text().await {
        Ok(body) => FetchOutcome::Counted(count_occurrences(&body, word)),
        Err(e) => {
            ::log::debug!("Failed to read body from {}: {}", url, e);
            FetchOutcome::Failed(e.to_string())
        }
    }
}

/// Counts non-overlapping occurrences of `word` in `text`.
///
/// Matching is case-sensitive and ignores word boundaries, so "Go" matches
/// inside "Golang". An empty word counts one more than the number of
/// characters.
pub fn count_occurrences(text: &str, word: &str) -> usize {
    text.matches(word).count()
}
