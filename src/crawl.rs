//! Crawl orchestration.
//!
//! Coordinates one `vlist crawl` run: pick the state, build the HTTP oracle
//! and the file sink, walk, and print a summary. Library callers that want
//! their own oracle or sink use [`run_crawl_with`].

use anyhow::{bail, Context, Result};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::{Config, CrawlConfig};
use crate::oracle::HttpOracle;
use crate::progress::ProgressMode;
use crate::sink::FileSink;
use crate::traits::{Oracle, Sink};
use crate::walker::{WalkSummary, Walker};

/// Per-run overrides from the command line.
#[derive(Debug, Clone)]
pub struct CrawlOptions {
    pub concurrency: Option<usize>,
    pub output_dir: Option<PathBuf>,
    pub dry_run: bool,
    pub progress: ProgressMode,
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self {
            concurrency: None,
            output_dir: None,
            dry_run: false,
            progress: ProgressMode::Off,
        }
    }
}

pub async fn run_crawl(config: &Config, state: Option<String>, opts: CrawlOptions) -> Result<()> {
    let state = match state {
        Some(input) => parse_state(&input, &config.crawl)?,
        None => {
            let stdin = std::io::stdin();
            prompt_state(&mut stdin.lock(), &mut std::io::stderr(), &config.crawl)?
        }
    };

    let oracle = Arc::new(HttpOracle::new(&config.oracle)?);
    let output_dir = opts
        .output_dir
        .clone()
        .unwrap_or_else(|| config.crawl.output_dir.clone());
    let sink = Arc::new(FileSink::new(&output_dir)?);
    let output_path = sink.path_for(&state);

    let summary = run_crawl_with(config, &state, &opts, oracle, sink).await?;

    if opts.dry_run {
        println!("crawl state {} (dry-run)", state);
    } else {
        println!("crawl state {}", state);
    }
    println!("  districts: {}", summary.districts);
    println!("  vdcs: {}", summary.villages);
    println!("  wards: {}", summary.wards);
    println!("  reg centres: {}", summary.reg_centres);
    println!("  pruned branches: {}", summary.pruned_branches);
    println!("  leaf paths: {}", summary.leaf_paths);
    if !opts.dry_run {
        println!("  links written: {}", summary.links_written);
        println!("  links not found: {}", summary.links_not_found);
        println!("  failed lookups: {}", summary.failed_lookups);
        println!("  output: {}", output_path.display());
    }
    println!("ok");

    Ok(())
}

/// Walk `state` with a caller-supplied oracle and sink.
pub async fn run_crawl_with(
    config: &Config,
    state: &str,
    opts: &CrawlOptions,
    oracle: Arc<dyn Oracle>,
    sink: Arc<dyn Sink>,
) -> Result<WalkSummary> {
    let concurrency = opts.concurrency.unwrap_or(config.crawl.concurrency);
    if concurrency == 0 {
        bail!("--concurrency must be >= 1");
    }

    let walker = Walker::new(oracle, sink)
        .with_concurrency(concurrency)
        .with_reporter(Arc::from(opts.progress.reporter()))
        .with_dry_run(opts.dry_run);

    walker.walk(state).await
}

/// Validate operator input against the configured state range.
///
/// Returns the canonical spelling of the state number (`"03"` → `"3"`).
pub fn parse_state(input: &str, crawl: &CrawlConfig) -> Result<String> {
    let trimmed = input.trim();
    let n: u32 = trimmed
        .parse()
        .with_context(|| format!("state must be a number, got '{}'", trimmed))?;
    if !(crawl.min_state..=crawl.max_state).contains(&n) {
        bail!(
            "state must be between {} and {}, got {}",
            crawl.min_state,
            crawl.max_state,
            n
        );
    }
    Ok(n.to_string())
}

/// Ask for the state on `output` and read one line from `input`.
pub fn prompt_state<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    crawl: &CrawlConfig,
) -> Result<String> {
    write!(
        output,
        "Enter the state number to crawl ({}-{}): ",
        crawl.min_state, crawl.max_state
    )?;
    output.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        bail!("no state given on stdin");
    }
    parse_state(&line, crawl)
}
