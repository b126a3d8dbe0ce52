use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{Mutex, Semaphore, mpsc};
use tokio::task::JoinHandle;

use crate::config::TallyConfig;
use crate::fetcher::{self, FetchOutcome};
use crate::results::{TallyReport, UrlCount};

/// How completed fetches are folded into the final report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    /// Workers hand their counts to the coordinator over a channel that is
    /// drained once every task has finished
    #[default]
    Channel,
    /// Workers add their counts to a shared accumulator behind a lock
    Locked,
}

/// Errors that reject a tally run before any work is dispatched
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TallyError {
    /// The pool needs at least one admission slot
    #[error("pool size must be at least 1 (got {0})")]
    InvalidPoolSize(usize),

    /// Requests need a timeout of at least one second
    #[error("request timeout must be at least 1 second (got {0}s)")]
    InvalidTimeout(u64),
}

/// Runs a whole tally: fetches every configured URL with at most
/// `pool_size` requests in flight and aggregates the counts.
///
/// # Arguments
///
/// * `config` - Word, URL list, pool size, timeout and aggregation strategy
///
/// An out-of-range pool size or timeout rejects the run with an explicit
/// error; a rejected run performs no work at all.
pub async fn run(config: &TallyConfig) -> Result<TallyReport, TallyError> {
    if config.pool_size < 1 {
        return Err(TallyError::InvalidPoolSize(config.pool_size));
    }
    if config.request_timeout_secs < 1 {
        return Err(TallyError::InvalidTimeout(config.request_timeout_secs));
    }

    ::log::info!(
        "Tallying \"{}\" across {} URLs ({} pool slots, {}s timeout)",
        config.word,
        config.urls.len(),
        config.pool_size,
        config.request_timeout_secs
    );

    let word = config.word.clone();
    let request_timeout = Duration::from_secs(config.request_timeout_secs);
    let fetch = move |url: String| {
        let word = word.clone();
        async move { fetcher::fetch_count(&word, &url, request_timeout).await }
    };

    let (counts, total) = run_pool(&config.urls, config.pool_size, config.aggregation, fetch).await;

    ::log::info!("Tally finished: total {}", total);

    Ok(TallyReport::new(config.word.clone(), counts, total))
}

/// Fans the URL list out to one task per URL, gated by a semaphore with
/// `pool_size` permits, and collects the results with the chosen strategy.
async fn run_pool<F, Fut>(
    urls: &[String],
    pool_size: usize,
    aggregation: Aggregation,
    fetch: F,
) -> (Vec<UrlCount>, usize)
where
    F: Fn(String) -> Fut + Clone + Send + 'static,
    Fut: Future<Output = FetchOutcome> + Send + 'static,
{
    match aggregation {
        Aggregation::Channel => collect_via_channel(urls, pool_size, fetch).await,
        Aggregation::Locked => collect_via_locked(urls, pool_size, fetch).await,
    }
}

/// Channel strategy: each worker deposits its count into a result channel;
/// the coordinator drains it after every task has finished.
async fn collect_via_channel<F, Fut>(
    urls: &[String],
    pool_size: usize,
    fetch: F,
) -> (Vec<UrlCount>, usize)
where
    F: Fn(String) -> Fut + Clone + Send + 'static,
    Fut: Future<Output = FetchOutcome> + Send + 'static,
{
    let semaphore = Arc::new(Semaphore::new(pool_size));

    // Capacity covers every task, so depositing a result can never block a
    // worker that still holds its pool slot
    let (result_tx, mut result_rx) = mpsc::channel::<UrlCount>(urls.len().max(1));

    let mut handles = Vec::with_capacity(urls.len());
    for url in urls {
        let url = url.clone();
        let fetch = fetch.clone();
        let semaphore = Arc::clone(&semaphore);
        let result_tx = result_tx.clone();

        handles.push(tokio::spawn(async move {
            let count = gated_fetch(&semaphore, url, fetch).await;
            if let Err(e) = result_tx.send(count).await {
                ::log::error!("Result channel closed early, dropping count for {}", e.0.url);
            }
        }));
    }

    // The workers hold the only remaining senders; dropping ours lets the
    // drain loop see the channel close once they are all done
    drop(result_tx);

    await_all(handles).await;

    let mut counts = Vec::with_capacity(urls.len());
    let mut total = 0;
    while let Some(count) = result_rx.recv().await {
        total += count.matches;
        counts.push(count);
    }

    (counts, total)
}

/// Shared state for the locked strategy
#[derive(Default)]
struct Accumulator {
    counts: Vec<UrlCount>,
    total: usize,
}

/// Locked strategy: each worker takes the lock and adds its count to a
/// shared accumulator; the coordinator reads it after every task has
/// finished.
async fn collect_via_locked<F, Fut>(
    urls: &[String],
    pool_size: usize,
    fetch: F,
) -> (Vec<UrlCount>, usize)
where
    F: Fn(String) -> Fut + Clone + Send + 'static,
    Fut: Future<Output = FetchOutcome> + Send + 'static,
{
    let semaphore = Arc::new(Semaphore::new(pool_size));
    let accumulator = Arc::new(Mutex::new(Accumulator::default()));

    let mut handles = Vec::with_capacity(urls.len());
    for url in urls {
        let url = url.clone();
        let fetch = fetch.clone();
        let semaphore = Arc::clone(&semaphore);
        let accumulator = Arc::clone(&accumulator);

        handles.push(tokio::spawn(async move {
            let count = gated_fetch(&semaphore, url, fetch).await;

            // The guard drop releases the lock on every path
            let mut acc = accumulator.lock().await;
            acc.total += count.matches;
            acc.counts.push(count);
        }));
    }

    await_all(handles).await;

    let mut acc = accumulator.lock().await;
    (std::mem::take(&mut acc.counts), acc.total)
}

/// Synchronization barrier: waits for every dispatched task to finish.
///
/// A worker that failed to complete is logged and contributes nothing; it
/// never aborts the rest of the batch.
async fn await_all(handles: Vec<JoinHandle<()>>) {
    for handle in handles {
        if let Err(e) = handle.await {
            ::log::error!("Worker task failed to complete: {}", e);
        }
    }
}

/// Single worker step: waits for a pool slot, performs the fetch while
/// holding it, then reports the result.
async fn gated_fetch<F, Fut>(semaphore: &Semaphore, url: String, fetch: F) -> UrlCount
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = FetchOutcome>,
{
    let outcome = {
        // The permit spans only the request itself and is released on every
        // path, including failed fetches
        let _permit = semaphore.acquire().await.unwrap();
        ::log::debug!("Acquired pool slot for: {}", url);
        fetch(url.clone()).await
    };

    let count = UrlCount::from_outcome(url, outcome);
    ::log::info!("Count for {}: {}", count.url, count.matches);
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn mock_pages(server: &MockServer, pages: &[(&str, &str)]) {
        for (route, body) in pages {
            Mock::given(method("GET"))
                .and(path(*route))
                .respond_with(ResponseTemplate::new(200).set_body_string(*body))
                .mount(server)
                .await;
        }
    }

    fn config_for(word: &str, urls: Vec<String>, pool_size: usize) -> TallyConfig {
        let mut config = TallyConfig::new(word);
        config.urls = urls;
        config.pool_size = pool_size;
        config.request_timeout_secs = 5;
        config
    }

    #[tokio::test]
    async fn test_total_is_sum_of_counts_across_pool_sizes() {
        let server = MockServer::start().await;
        mock_pages(
            &server,
            &[
                ("/a", "Go Golang GoGo"),
                ("/b", "none here"),
                ("/c", "Go go Go"),
            ],
        )
        .await;

        let urls: Vec<String> = ["/a", "/b", "/c"]
            .iter()
            .map(|p| format!("{}{}", server.uri(), p))
            .collect();

        // Full parallelism and full serialization must agree on the total
        for pool_size in 1..=urls.len() + 10 {
            let config = config_for("Go", urls.clone(), pool_size);
            let report = run(&config).await.unwrap();

            assert_eq!(report.total, 6, "pool size {}", pool_size);
            assert_eq!(report.counts.len(), 3);

            let sum: usize = report.counts.iter().map(|c| c.matches).sum();
            assert_eq!(report.total, sum);
        }
    }

    #[tokio::test]
    async fn test_aggregation_strategies_agree() {
        let server = MockServer::start().await;
        mock_pages(
            &server,
            &[("/a", "Go GoGo"), ("/b", "Golang"), ("/c", "nothing")],
        )
        .await;

        let urls: Vec<String> = ["/a", "/b", "/c"]
            .iter()
            .map(|p| format!("{}{}", server.uri(), p))
            .collect();

        let mut seen = Vec::new();
        for aggregation in [Aggregation::Channel, Aggregation::Locked] {
            let mut config = config_for("Go", urls.clone(), 2);
            config.aggregation = aggregation;
            let report = run(&config).await.unwrap();

            let mut counts: Vec<(String, usize)> = report
                .counts
                .iter()
                .map(|c| (c.url.clone(), c.matches))
                .collect();
            counts.sort();
            seen.push((report.total, counts));
        }

        assert_eq!(seen[0], seen[1]);
        assert_eq!(seen[0].0, 4);
    }

    #[tokio::test]
    async fn test_failed_urls_tally_zero_and_batch_completes() {
        let server = MockServer::start().await;
        mock_pages(&server, &[("/good", "Go Go Go")]).await;

        let urls = vec![
            format!("{}/good", server.uri()),
            // Nothing listens on the discard port; this fetch fails
            "http://127.0.0.1:9/".to_string(),
        ];
        let config = config_for("Go", urls, 2);
        let report = run(&config).await.unwrap();

        assert_eq!(report.counts.len(), 2);
        assert_eq!(report.total, 3);

        let failed: Vec<_> = report.counts.iter().filter(|c| c.is_fetch_failure()).collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].matches, 0);
        assert!(failed[0].error.is_some());
    }

    #[tokio::test]
    async fn test_zero_pool_size_is_rejected() {
        let config = config_for("Go", vec!["http://example.com/".to_string()], 0);
        let err = run(&config).await.unwrap_err();
        assert_eq!(err, TallyError::InvalidPoolSize(0));
    }

    #[tokio::test]
    async fn test_zero_timeout_is_rejected() {
        let mut config = config_for("Go", vec!["http://example.com/".to_string()], 3);
        config.request_timeout_secs = 0;
        let err = run(&config).await.unwrap_err();
        assert_eq!(err, TallyError::InvalidTimeout(0));
    }

    #[tokio::test]
    async fn test_in_flight_fetches_never_exceed_pool_size() {
        for aggregation in [Aggregation::Channel, Aggregation::Locked] {
            for pool_size in [1usize, 2, 4] {
                let active = Arc::new(AtomicUsize::new(0));
                let peak = Arc::new(AtomicUsize::new(0));

                let fetch = {
                    let active = Arc::clone(&active);
                    let peak = Arc::clone(&peak);
                    move |_url: String| {
                        let active = Arc::clone(&active);
                        let peak = Arc::clone(&peak);
                        async move {
                            let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                            peak.fetch_max(now, Ordering::SeqCst);
                            tokio::time::sleep(Duration::from_millis(25)).await;
                            active.fetch_sub(1, Ordering::SeqCst);
                            FetchOutcome::Counted(1)
                        }
                    }
                };

                let urls: Vec<String> =
                    (0..12).map(|i| format!("http://pages.test/{}", i)).collect();
                let (counts, total) = run_pool(&urls, pool_size, aggregation, fetch).await;

                assert_eq!(counts.len(), 12);
                assert_eq!(total, 12);

                let observed = peak.load(Ordering::SeqCst);
                assert!(
                    observed <= pool_size,
                    "{:?} pool of {} peaked at {}",
                    aggregation,
                    pool_size,
                    observed
                );
                assert!(observed >= 1);
            }
        }
    }

    #[tokio::test]
    async fn test_panicked_worker_does_not_abort_batch() {
        for aggregation in [Aggregation::Channel, Aggregation::Locked] {
            let fetch = move |url: String| async move {
                if url.ends_with("/bad") {
                    panic!("boom");
                }
                FetchOutcome::Counted(1)
            };

            let urls: Vec<String> = ["/a", "/bad", "/b"]
                .iter()
                .map(|p| format!("http://pages.test{}", p))
                .collect();
            let (counts, total) = run_pool(&urls, 2, aggregation, fetch).await;

            // The panicked task is joined and dropped; the rest still land
            assert_eq!(counts.len(), 2, "{:?}", aggregation);
            assert_eq!(total, 2);
            assert!(counts.iter().all(|c| !c.url.ends_with("/bad")));
        }
    }

    #[tokio::test]
    async fn test_duplicate_urls_count_independently() {
        let server = MockServer::start().await;
        mock_pages(&server, &[("/a", "Go Go")]).await;

        let url = format!("{}/a", server.uri());
        let config = config_for("Go", vec![url.clone(), url], 2);
        let report = run(&config).await.unwrap();

        // One entry per work item, even for duplicates
        assert_eq!(report.counts.len(), 2);
        assert!(report.counts.iter().all(|c| c.matches == 2));
        assert_eq!(report.total, 4);
    }

    #[tokio::test]
    async fn test_empty_url_list_reports_zero() {
        let config = config_for("Go", Vec::new(), 3);
        let report = run(&config).await.unwrap();

        assert!(report.counts.is_empty());
        assert_eq!(report.total, 0);
    }

    #[tokio::test]
    async fn test_builder_end_to_end() {
        let server = MockServer::start().await;
        mock_pages(&server, &[("/go", "Go Golang GoGo")]).await;

        let report = crate::WordTally::new("Go")
            .with_url(&format!("{}/go", server.uri()))
            .with_pool_size(1)
            .with_request_timeout(5)
            .run()
            .await
            .unwrap();

        assert_eq!(report.word, "Go");
        assert_eq!(report.counts.len(), 1);
        assert_eq!(report.counts[0].matches, 4);
        assert_eq!(report.total, 4);
    }
}
