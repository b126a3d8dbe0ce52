use clap::{Parser, ValueEnum};
use page_tally::Aggregation;

#[derive(Parser, Debug)]
#[command(name = "page-tally")]
#[command(author = "Ryan Northey <ryan@synca.io>")]
#[command(about = "Counts occurrences of a word across a list of web pages")]
#[command(version)]
pub struct Args {
    /// Word to tally (case-sensitive literal match)
    pub word: String,

    /// URLs to fetch and count
    pub urls: Vec<String>,

    /// Number of fetches allowed in flight at once
    #[arg(short, long, default_value_t = 5)]
    pub pool_size: usize,

    /// Per-request timeout in seconds
    #[arg(short, long, default_value_t = 30)]
    pub timeout: u64,

    /// Result aggregation strategy
    #[arg(short, long, value_enum, default_value_t = AggregationArg::Channel)]
    pub aggregation: AggregationArg,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum AggregationArg {
    Channel,
    Locked,
}

/// Convert from CLI argument aggregation to internal aggregation strategy
pub fn convert_aggregation(arg: AggregationArg) -> Aggregation {
    match arg {
        AggregationArg::Channel => Aggregation::Channel,
        AggregationArg::Locked => Aggregation::Locked,
    }
}
