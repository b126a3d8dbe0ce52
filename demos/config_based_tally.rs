use clap::{Parser, ValueEnum};
use page_tally::{Aggregation, WordTally, config::TallyConfig};
use std::error::Error;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to tally configuration file
    #[arg(short, long)]
    config: String,

    /// Override pool size
    #[arg(short, long)]
    pool_size: Option<usize>,

    /// Override request timeout in seconds
    #[arg(short, long)]
    timeout: Option<u64>,

    /// Override aggregation strategy
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

    // Load configuration from file
    let config_path = PathBuf::from(&args.config);
    let config = TallyConfig::from_file(config_path)?;

    // Print the loaded configuration (for debugging)
    println!("Loaded tally configuration:");
    println!("  Target word: {}", config.word);
    println!("  URLs: {}", config.urls.len());
    println!("  Pool size: {}", config.pool_size);
    println!("  Request timeout: {}s", config.request_timeout_secs);
    println!("  Aggregation: {:?}", config.aggregation);

    // Create a WordTally builder with the loaded configuration
    let mut tally_builder = WordTally::new(&config.word).with_config(config);

    // Apply overrides if specified
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
