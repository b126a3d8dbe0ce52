use clap::Parser;
use page_tally::WordTally;
use page_tally::results::TallyReport;

mod args;
use args::{Args, convert_aggregation};

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::init();

    // Parse command-line arguments
    let args = Args::parse();

    ::log::info!(
        "Starting tally of \"{}\" across {} URLs",
        args.word,
        args.urls.len()
    );

    // Convert from CLI argument aggregation to internal aggregation strategy
    let aggregation = convert_aggregation(args.aggregation);

    // Create a WordTally builder with the specified parameters
    let tally = WordTally::new(&args.word)
        .with_urls(args.urls)
        .with_pool_size(args.pool_size)
        .with_request_timeout(args.timeout)
        .with_aggregation(aggregation);

    let start_time = std::time::Instant::now();

    // Run the tally and wait for the aggregated report
    let report = match tally.run().await {
        Ok(report) => report,
        Err(e) => {
            ::log::error!("Tally rejected: {}", e);
            std::process::exit(1);
        }
    };

    print_report(&report);

    let duration = start_time.elapsed();
    ::log::info!(
        "Tally complete - fetched {} URLs in {:.2} seconds",
        report.counts.len(),
        duration.as_secs_f64()
    );
}

// Print one line per URL and the aggregated total
fn print_report(report: &TallyReport) {
    for count in &report.counts {
        println!("Count for {}: {}", count.url, count.matches);
    }
    println!("Total: {}", report.total);
}
