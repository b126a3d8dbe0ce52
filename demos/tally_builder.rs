use clap::{Parser, ValueEnum};
use page_tally::{Aggregation, WordTally};
use std::error::Error;

/// Preset word and pages, tallied when no configuration or overrides are given
const DEFAULT_WORD: &str = "Go";
const DEFAULT_URLS: [&str; 9] = [
    "http://www.golang.org/",
    "http://www.google.com/",
    "http://www.example.com/",
    "https://dev.to/",
    "http://www.typescriptlang.org/",
    "http://www.japan.com/",
    "http://metanit.com/",
    "https://go.dev/",
    "http://www.golang.org/",
];

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Target word to count
    #[arg(short, long)]
    word: Option<String>,

    /// URL to fetch (repeat for multiple)
    #[arg(short, long)]
    url: Vec<String>,

    /// JSON configuration string
    #[arg(short, long)]
    config: Option<String>,

    /// Path to JSON configuration file
    #[arg(long)]
    config_file: Option<String>,

    /// Maximum number of fetches in flight
    #[arg(short, long)]
    pool_size: Option<usize>,

    /// Per-request timeout in seconds
    #[arg(short, long)]
    timeout: Option<u64>,

    /// Result aggregation strategy
    #[arg(long, value_enum)]
    aggregation: Option<AggregationArg>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum AggregationArg {
    Channel,
    Locked,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Initialize logger
    env_logger::init();

    // Parse command line arguments
    let args = Args::parse();

    // Start from the preset word and URL list
    let mut tally_builder = WordTally::new(DEFAULT_WORD)
        .with_urls(DEFAULT_URLS.iter().map(|u| u.to_string()).collect());

    // Apply configuration from file if specified
    if let Some(config_file) = args.config_file {
        println!("Loading configuration from file: {}", config_file);
        tally_builder = tally_builder.with_config_file(config_file)?;
    }

    // Apply configuration from string if specified (overrides file config)
    if let Some(config_str) = args.config {
        println!("Applying configuration from string");
        tally_builder = tally_builder.with_config_str(&config_str)?;
    }

    // Apply command-line overrides
    if let Some(word) = args.word {
        println!("Overriding target word: {}", word);
        tally_builder = tally_builder.with_word(&word);
    }

    if !args.url.is_empty() {
        println!("Overriding URL list ({} URLs)", args.url.len());
        tally_builder = tally_builder.with_urls(args.url);
    }

    if let Some(pool_size) = args.pool_size {
        println!("Overriding pool size: {}", pool_size);
        tally_builder = tally_builder.with_pool_size(pool_size);
    }

    if let Some(timeout) = args.timeout {
        println!("Overriding request timeout: {}s", timeout);
        tally_builder = tally_builder.with_request_timeout(timeout);
    }

    if let Some(aggregation) = args.aggregation {
        println!("Overriding aggregation strategy: {:?}", aggregation);
        let aggregation = match aggregation {
            AggregationArg::Channel => Aggregation::Channel,
            AggregationArg::Locked => Aggregation::Locked,
        };
        tally_builder = tally_builder.with_aggregation(aggregation);
    }

    // Run the tally and wait for the aggregated report
    let start_time = std::time::Instant::now();
    let report = tally_builder.run().await?;

    for count in &report.counts {
        println!("Count for {}: {}", count.url, count.matches);
    }
    println!("Total: {}", report.total);

    let duration = start_time.elapsed();
    println!(
        "Tally complete. Fetched {} URLs in {:.2} seconds.",
        report.counts.len(),
        duration.as_secs_f64()
    );

    Ok(())
}
