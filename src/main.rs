mod config;
mod crawler;
mod db;
mod dedup;
mod enrich;
mod export;
mod parser;
mod progress;
mod record;
mod source;

use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::warn;

use config::{CrawlConfig, RenderTimeoutPolicy};
use progress::{ProgressReporter, Silent};
use record::{CrawlRequest, Metrics, Record};
use source::SourceKind;

#[derive(Parser)]
#[command(name = "listing_scraper", about = "Business listing scraper for Justdial search results")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Crawl search result pages and store the listings
    Scrape {
        /// City or area, e.g. "New Delhi"
        #[arg(short, long)]
        location: String,
        /// What to search for, e.g. "timber suppliers"
        #[arg(short, long)]
        term: String,
        /// Max result pages to crawl
        #[arg(short, long, default_value = "3", value_parser = clap::value_parser!(u32).range(1..=10))]
        pages: u32,
        /// Visit each listing's detail page for its GSTIN (much slower)
        #[arg(long)]
        gstin: bool,
        /// How pages are fetched
        #[arg(long, value_enum, default_value = "http")]
        source: SourceKind,
        /// What to do when a page never finishes rendering
        #[arg(long, value_enum, default_value = "skip")]
        on_render_timeout: RenderTimeoutPolicy,
        /// Override the site root
        #[arg(long)]
        base_url: Option<String>,
        /// Pause between result pages, in milliseconds
        #[arg(long)]
        page_delay_ms: Option<u64>,
        /// Pause after each detail page, in milliseconds
        #[arg(long)]
        detail_delay_ms: Option<u64>,
        /// Also export the results in this format
        #[arg(long, value_enum)]
        export: Option<export::Format>,
        /// Directory for exported files
        #[arg(long, default_value = ".")]
        out: PathBuf,
        /// Append today's date to exported file names
        #[arg(long)]
        dated: bool,
        /// No progress bar
        #[arg(short, long)]
        quiet: bool,
    },
    /// List stored runs
    Runs {
        #[arg(short = 'n', long, default_value = "20")]
        limit: usize,
    },
    /// Show the records of a stored run
    Show {
        #[arg(short, long)]
        run: i64,
        /// Max rows to display
        #[arg(short = 'n', long, default_value = "50")]
        limit: usize,
    },
    /// Export a stored run to a file
    Export {
        #[arg(short, long)]
        run: i64,
        #[arg(short, long, value_enum, default_value = "csv")]
        format: export::Format,
        #[arg(long, default_value = ".")]
        out: PathBuf,
        #[arg(long)]
        dated: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Scrape {
            location,
            term,
            pages,
            gstin,
            source,
            on_render_timeout,
            base_url,
            page_delay_ms,
            detail_delay_ms,
            export: export_format,
            out,
            dated,
            quiet,
        } => {
            let request = CrawlRequest::new(&location, &term, pages, gstin)?;
            let mut config = CrawlConfig {
                on_render_timeout,
                ..Default::default()
            };
            if let Some(url) = base_url {
                config.base_url = url;
            }
            if let Some(ms) = page_delay_ms {
                config.page_delay = Duration::from_millis(ms);
            }
            if let Some(ms) = detail_delay_ms {
                config.detail_delay = Duration::from_millis(ms);
            }

            let conn = db::connect()?;
            db::init_schema(&conn)?;

            let cancel = CancellationToken::new();
            {
                let cancel = cancel.clone();
                tokio::spawn(async move {
                    if tokio::signal::ctrl_c().await.is_ok() {
                        warn!("Interrupted, finishing with what was gathered so far");
                        cancel.cancel();
                    }
                });
            }

            let pb = progress::bar();
            let reporter: &dyn ProgressReporter = if quiet { &Silent } else { &pb };
            let crawl = crawler::scrape(&request, source, &config, reporter, &cancel).await;
            pb.finish_and_clear();
            let crawl = crawl?;

            println!(
                "Crawled {} page(s), stopped: {}. {} extracted, {} unique.",
                crawl.pages_visited,
                crawl.stop,
                crawl.extracted,
                crawl.records.len()
            );
            if crawl.records.is_empty() {
                println!("No results found. Try different search terms.");
                return Ok(());
            }
            crawl.metrics().print();

            let run_id = db::save_run(&conn, &request, &crawl)?;
            println!("Saved as run {}", run_id);

            if let Some(format) = export_format {
                let path = export::write(
                    &crawl.records,
                    &request.search_term,
                    &request.location,
                    format,
                    &out,
                    dated.then(today),
                )?;
                println!("Exported to {}", path.display());
            }
            Ok(())
        }
        Commands::Runs { limit } => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let runs = db::fetch_runs(&conn, limit)?;
            if runs.is_empty() {
                println!("No runs yet. Use 'scrape' first.");
                return Ok(());
            }

            println!(
                "{:>4} | {:<19} | {:<16} | {:<20} | {:>5} | {:>5} | {:>5} | {:>5} | {:>5} | {:>5} | {}",
                "Run", "When", "Location", "Search", "Pages", "Found", "Rows", "Phone", "GSTIN", "Addr", "Stop"
            );
            println!("{}", "-".repeat(128));
            for r in &runs {
                println!(
                    "{:>4} | {:<19} | {:<16} | {:<20} | {:>5} | {:>5} | {:>5} | {:>5} | {:>5} | {:>5} | {}",
                    r.id,
                    r.created_at,
                    truncate(&r.location, 16),
                    truncate(&r.search_term, 20),
                    r.pages_visited,
                    r.extracted,
                    r.metrics.total,
                    r.metrics.with_phone,
                    r.metrics.with_gstin,
                    r.metrics.with_address,
                    r.stop_reason,
                );
            }
            Ok(())
        }
        Commands::Show { run, limit } => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            db::fetch_run_request(&conn, run)?;
            let records = db::fetch_records(&conn, run, Some(limit))?;
            print_records(&records);
            Metrics::of(&db::fetch_records(&conn, run, None)?).print();
            Ok(())
        }
        Commands::Export {
            run,
            format,
            out,
            dated,
        } => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let (location, term) = db::fetch_run_request(&conn, run)?;
            let records = db::fetch_records(&conn, run, None)?;
            let path = export::write(&records, &term, &location, format, &out, dated.then(today))?;
            println!("Exported {} records to {}", records.len(), path.display());
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

fn today() -> chrono::NaiveDate {
    chrono::Local::now().date_naive()
}

fn print_records(records: &[Record]) {
    println!(
        "{:>3} | {:<30} | {:<24} | {:<15} | {:<36}",
        "#", "Company", "Phone", "GSTIN", "Address"
    );
    println!("{}", "-".repeat(120));
    for (i, r) in records.iter().enumerate() {
        println!(
            "{:>3} | {:<30} | {:<24} | {:<15} | {:<36}",
            i + 1,
            truncate(&r.company_name, 30),
            truncate(&r.phone_number, 24),
            r.gstin,
            truncate(&r.address, 36),
        );
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max).collect();
        format!("{}...", truncated)
    }
}

fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
