//! `mensa`: print today's canteen menu in canonical form.
//!
//! Reads the rendered page from a running Chrome (or from a saved CDP
//! snapshot), normalizes it and writes the day plan to stdout. Logs go to
//! stderr.
//!
//! Exit codes: 0 menu printed, 2 no menu today, 1 error.

mod scrape;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use mensa_browser::config::{DEFAULT_CDP_URL, DEFAULT_MENU_URL};
use mensa_browser::{MenuPage, PageConfig};
use tracing_subscriber::EnvFilter;

use scrape::{Format, Scrape, SnapshotFile};

#[derive(Parser, Debug)]
#[command(name = "mensa")]
#[command(about = "Fetch the Mensa menu page and print it in canonical form")]
struct Args {
    /// Browser DevTools WebSocket URL
    #[arg(long, env = "MENSA_CDP_URL", default_value = DEFAULT_CDP_URL)]
    cdp_url: String,

    /// Menu page to load
    #[arg(long, env = "MENSA_MENU_URL", default_value = DEFAULT_MENU_URL)]
    menu_url: String,

    /// Max wait for the page load event, in milliseconds
    #[arg(long, env = "MENSA_LOAD_TIMEOUT_MS", default_value_t = 15_000)]
    load_timeout_ms: u64,

    /// Extra wait after load for client-side rendering, in milliseconds
    #[arg(long, env = "MENSA_SETTLE_MS", default_value_t = 3_000)]
    settle_ms: u64,

    #[arg(long, env = "MENSA_VIEWPORT_WIDTH", default_value_t = 1279)]
    viewport_width: u32,

    #[arg(long, env = "MENSA_VIEWPORT_HEIGHT", default_value_t = 2000)]
    viewport_height: u32,

    /// Read a saved CDP document instead of driving a browser
    #[arg(long)]
    snapshot: Option<PathBuf>,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Also write the raw CDP document to this file
    #[arg(long)]
    dump_raw: Option<PathBuf>,

    /// Print the normalizer report as JSON to stderr
    #[arg(long)]
    report: bool,

    /// Debug logging (overridden by RUST_LOG)
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn page_config(&self) -> PageConfig {
        PageConfig {
            cdp_url: self.cdp_url.clone(),
            menu_url: self.menu_url.clone(),
            load_timeout_ms: self.load_timeout_ms,
            settle_ms: self.settle_ms,
            viewport_width: self.viewport_width,
            viewport_height: self.viewport_height,
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(args: &Args) -> anyhow::Result<Scrape> {
    let dump_raw = args.dump_raw.as_deref();

    if let Some(path) = &args.snapshot {
        let source = SnapshotFile { path: path.clone() };
        return scrape::scrape(&source, args.format, dump_raw).await;
    }

    let page = MenuPage::open(args.page_config())
        .await
        .context("opening menu page")?;
    let result = scrape::scrape(&page, args.format, dump_raw).await;

    if let Err(e) = page.close().await {
        tracing::warn!("closing browser connection failed: {}", e);
    }

    result
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    match run(&args).await {
        Ok(Scrape::Menu { content, report }) => {
            if args.report {
                match serde_json::to_string(&report) {
                    Ok(json) => eprintln!("{json}"),
                    Err(e) => tracing::warn!("report not serializable: {}", e),
                }
            }
            println!("{content}");
            ExitCode::SUCCESS
        }
        Ok(Scrape::Closed) => ExitCode::from(2),
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
