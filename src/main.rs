// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Set up logging (tracing, filtered by -v/-q or RUST_LOG)
// 3. Dispatch to the appropriate subcommand handler
// 4. Exit with proper code (0 = clean crawl, 1 = some pages failed, 2 = error)
//
// Results go to stdout (when the output is console or json); everything meant
// for a human watching the crawl (headlines, summary, logs) goes to stderr.
// =============================================================================

mod cli;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use url::Url;

use cli::{Cli, Commands, CrawlArgs, Output};
use sucker::config::DEFAULT_USER_AGENT;
use sucker::extract::{extract_links, HtmlTokenizer};
use sucker::sink::{ConsoleSink, ContentStore, GraphSink, JsonLinesSink, ResultSink, Tee};
use sucker::{Completion, CrawlSummary, Crawler, Fetcher, HttpFetcher};

#[tokio::main]
async fn main() {
    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            // If an unexpected error occurred, print it and exit with code 2
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

async fn run() -> Result<i32> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Crawl(args) => handle_crawl(&args).await,
        Commands::Links {
            url,
            json,
            timeout_secs,
        } => handle_links(&url, json, timeout_secs).await,
    }
}

// Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
fn init_tracing(verbose: u8, quiet: bool) {
    let default_level = if quiet {
        "error"
    } else {
        match verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

// Handles the 'crawl' subcommand
async fn handle_crawl(args: &CrawlArgs) -> Result<i32> {
    let config = args.to_config();
    let fetcher = HttpFetcher::new(&config).context("failed to build HTTP client")?;
    let crawler = Crawler::new(config, Arc::new(fetcher));

    eprintln!("🔍 Crawling from: {}", args.first);
    eprintln!("👷 Workers: {}", crawler.config().concurrency);

    let out_dir = &args.out_dir;
    let sink: Box<dyn ResultSink> = match args.output {
        Output::Console => Box::new(ConsoleSink::stdout()),
        Output::Json => Box::new(JsonLinesSink::stdout()),
        Output::Store => {
            let store = ContentStore::open(out_dir)
                .await
                .with_context(|| format!("cannot use {} as a page store", out_dir.display()))?;
            eprintln!("💾 Storing pages in {}", store.dir().display());
            Box::new(store)
        }
        Output::Graph => {
            let db = Url::parse(&args.db)
                .with_context(|| format!("invalid database URL '{}'", args.db))?;
            eprintln!("🕸️  Writing nodes to {}", db);
            // Nodes go to the database; the progress line still goes to stdout.
            Box::new(Tee(GraphSink::new(&db), ConsoleSink::stdout()))
        }
    };

    // Ctrl-C stops the crawl; the results gathered so far are still written.
    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("\n⏹️  Interrupted, stopping crawl...");
                cancel.cancel();
            }
        }
    });

    let summary = crawler.run_until(&args.first, sink, cancel).await?;
    print_summary(&summary);

    if summary.failures > 0 {
        Ok(1) // Exit code 1 = some pages could not be fetched
    } else {
        Ok(0)
    }
}

// Handles the 'links' subcommand: fetch one page, list its links
async fn handle_links(url: &str, json: bool, timeout_secs: u64) -> Result<i32> {
    let url = Url::parse(url).with_context(|| format!("invalid URL '{}'", url))?;

    let fetcher = HttpFetcher::build(DEFAULT_USER_AGENT, Some(Duration::from_secs(timeout_secs)))
        .context("failed to build HTTP client")?;
    let page = fetcher.fetch(&url).await?;
    let links = extract_links(&HtmlTokenizer::new(), &page.body, &url);

    if json {
        println!("{}", serde_json::to_string_pretty(&links)?);
    } else {
        for link in &links {
            println!("{}", link);
        }
    }

    eprintln!(
        "🔗 {} link(s) found on {} (HTTP {})",
        links.len(),
        url,
        page.status_code
    );
    Ok(0)
}

fn print_summary(summary: &CrawlSummary) {
    let ok_count = summary.results - summary.failures.min(summary.results);

    eprintln!();
    match summary.completion {
        Completion::Drained => eprintln!("✅ Crawl complete"),
        Completion::Cancelled => eprintln!("⏹️  Crawl cancelled"),
    }
    eprintln!("📊 Summary:");
    eprintln!("   ✅ OK: {}", ok_count);
    eprintln!("   ❌ Failed: {}", summary.failures);
    eprintln!("   📋 Total: {}", summary.results);
    eprintln!("   🔗 URLs seen: {}", summary.urls_claimed);
    if summary.sink_errors > 0 {
        eprintln!("   ⚠️  Not persisted: {}", summary.sink_errors);
    }
    eprintln!("   ⏱️  Elapsed: {:.1}s", summary.elapsed.as_secs_f64());
}
