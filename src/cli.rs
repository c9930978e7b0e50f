// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// clap is a popular Rust library for parsing command-line arguments.
// We use the "derive" API which lets us define the CLI structure using
// Rust structs and attributes (the #[...] things).
//
// Rust concepts:
// - Structs: Custom data types that group related data
// - Enums: Types that can be one of several variants
// - Derive macros: Automatically generate code for our types
// =============================================================================

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use sucker::config::{
    CrawlConfig, DEFAULT_CONCURRENCY, DEFAULT_QUEUE_CAPACITY, DEFAULT_RESULT_BUFFER,
    DEFAULT_USER_AGENT,
};

#[derive(Parser, Debug)]
#[command(
    name = "sucker",
    version,
    about = "A concurrent web crawler that records every page it fetches",
    long_about = "sucker starts from one URL, follows every link it finds, and fetches each \
                  reachable page exactly once. Every fetch is recorded (status, timing, size, \
                  error) to the console, a JSON lines stream, a directory, or a graph database."
)]
pub struct Cli {
    /// More log output (-v = debug, -vv = trace). RUST_LOG overrides this.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Crawl everything reachable from a URL
    ///
    /// Example: sucker crawl http://wikipedia.org --concurrency 32
    Crawl(CrawlArgs),

    /// Fetch one page and list the links found on it
    ///
    /// Example: sucker links https://example.com --json
    Links {
        /// Page to inspect
        url: String,

        /// Output results in JSON format instead of a list
        #[arg(long)]
        json: bool,

        /// Give up on the request after this many seconds
        #[arg(long, default_value_t = 30)]
        timeout_secs: u64,
    },
}

#[derive(Args, Debug)]
pub struct CrawlArgs {
    /// First URL to fetch
    #[arg(default_value = "http://wikipedia.org")]
    pub first: String,

    /// Number of pages fetched in parallel
    #[arg(short, long, default_value_t = DEFAULT_CONCURRENCY)]
    pub concurrency: usize,

    /// Pending jobs held before link discovery has to wait
    #[arg(long, default_value_t = DEFAULT_QUEUE_CAPACITY)]
    pub queue_capacity: usize,

    /// Finished results held before workers wait on a slow output
    #[arg(long, default_value_t = DEFAULT_RESULT_BUFFER)]
    pub result_buffer: usize,

    /// Give up on a request after this many seconds (default: never)
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// User-Agent header sent with every request
    #[arg(long, default_value = DEFAULT_USER_AGENT)]
    pub user_agent: String,

    /// Where results go
    #[arg(short, long, value_enum, default_value_t = Output::Console)]
    pub output: Output,

    /// Directory for `--output store`
    #[arg(long, default_value = "pages")]
    pub out_dir: PathBuf,

    /// Neo4j REST endpoint for `--output graph`
    #[arg(long, default_value = "http://localhost:7474/db/data")]
    pub db: String,
}

/// Result destinations for `crawl`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Output {
    /// One progress line per page on stdout
    Console,
    /// One JSON object per page on stdout
    Json,
    /// Result and body files in --out-dir, named by URL hash
    Store,
    /// Nodes in a Neo4j database at --db
    Graph,
}

impl CrawlArgs {
    /// Builds the engine configuration from the flags.
    pub fn to_config(&self) -> CrawlConfig {
        CrawlConfig::default()
            .with_concurrency(self.concurrency)
            .with_queue_capacity(self.queue_capacity)
            .with_result_buffer(self.result_buffer)
            .with_request_timeout(self.timeout_secs.map(Duration::from_secs))
            .with_user_agent(self.user_agent.clone())
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. What is ValueEnum?
//    - It lets clap parse a flag value into an enum
//    - `--output json` becomes Output::Json; bad values get a helpful error
//
// 2. What does `global = true` do?
//    - The flag can be given before or after the subcommand
//    - `sucker -v crawl ...` and `sucker crawl ... -v` both work
//
// 3. Why ArgAction::Count?
//    - Each repetition of -v adds one: -vv = 2
//
// 4. What does Crawl(CrawlArgs) do?
//    - #[derive(Args)] turns a plain struct into a group of flags
//    - The crawl handler gets one value it can pass around whole
// -----------------------------------------------------------------------------
