//! # Voter List Crawler CLI (`vlist`)
//!
//! ## Usage
//!
//! ```bash
//! vlist --config ./config/vlist.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `vlist crawl [STATE]` | Walk one state and append its links to `{state}_links.txt` |
//! | `vlist options <level>` | List the options of one level under a partial path |
//! | `vlist lookup` | Fetch the voter list link of one registration centre |
//! | `vlist completions <shell>` | Print shell completions |
//!
//! Logs go to stderr and honour `RUST_LOG` (default `info`).

use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;

use voterlist_crawler::config;
use voterlist_crawler::crawl::{self, CrawlOptions};
use voterlist_crawler::models::Level;
use voterlist_crawler::probe::{self, PathArgs};
use voterlist_crawler::progress::ProgressMode;

/// Voter list crawler. Walks state → district → VDC → ward → registration
/// centre and records the voter list link of each registration centre.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. When the file does not exist, built-in defaults are used.
#[derive(Parser)]
#[command(
    name = "vlist",
    about = "Crawl the voter list lookup service and record every registration centre's voter list link",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/vlist.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Crawl every registration centre of one state.
    ///
    /// Links are appended to `{state}_links.txt` in the output directory.
    /// Failed branches are logged and skipped; the run only fails if the
    /// output file cannot be written.
    Crawl {
        /// State number. Prompted for on stdin when omitted.
        state: Option<String>,

        /// Maximum number of requests in flight (1 = strictly sequential).
        #[arg(long)]
        concurrency: Option<usize>,

        /// Directory for `{state}_links.txt` files.
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Enumerate the tree without fetching links or writing files.
        #[arg(long)]
        dry_run: bool,

        /// Progress on stderr: `off`, `human`, or `json`. Defaults to
        /// `human` when stderr is a terminal.
        #[arg(long, value_parser = parse_progress)]
        progress: Option<ProgressMode>,
    },

    /// List the options of one level under a partial path.
    Options {
        /// Level to list: `district`, `vdc`, `ward`, or `reg-centre`.
        #[arg(value_parser = parse_level)]
        level: Level,

        #[arg(long)]
        state: String,
        #[arg(long)]
        district: Option<String>,
        #[arg(long)]
        vdc: Option<String>,
        #[arg(long)]
        ward: Option<String>,
    },

    /// Fetch the voter list link of one registration centre.
    Lookup {
        #[arg(long)]
        state: String,
        #[arg(long)]
        district: String,
        #[arg(long)]
        vdc: String,
        #[arg(long)]
        ward: String,
        #[arg(long)]
        reg_centre: String,
    },

    /// Print shell completions.
    Completions {
        shell: clap_complete::Shell,
    },
}

fn parse_level(s: &str) -> Result<Level, String> {
    Level::parse(s).ok_or_else(|| {
        format!(
            "unknown level '{}': expected district, vdc, ward, or reg-centre",
            s
        )
    })
}

fn parse_progress(s: &str) -> Result<ProgressMode, String> {
    ProgressMode::parse(s)
        .ok_or_else(|| format!("unknown progress mode '{}': expected off, human, or json", s))
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Commands that don't require config
    if let Commands::Completions { shell } = &cli.command {
        clap_complete::generate(*shell, &mut Cli::command(), "vlist", &mut std::io::stdout());
        return Ok(());
    }

    init_tracing();
    let cfg = config::load_or_default(&cli.config)?;

    match cli.command {
        Commands::Crawl {
            state,
            concurrency,
            output_dir,
            dry_run,
            progress,
        } => {
            let opts = CrawlOptions {
                concurrency,
                output_dir,
                dry_run,
                progress: progress.unwrap_or_else(ProgressMode::default_for_tty),
            };
            crawl::run_crawl(&cfg, state, opts).await?;
        }
        Commands::Options {
            level,
            state,
            district,
            vdc,
            ward,
        } => {
            let args = PathArgs {
                state,
                district,
                vdc,
                ward,
                reg_centre: None,
            };
            probe::run_options(&cfg, level, &args).await?;
        }
        Commands::Lookup {
            state,
            district,
            vdc,
            ward,
            reg_centre,
        } => {
            let args = PathArgs {
                state,
                district: Some(district),
                vdc: Some(vdc),
                ward: Some(ward),
                reg_centre: Some(reg_centre),
            };
            probe::run_lookup(&cfg, &args).await?;
        }
        Commands::Completions { .. } => {
            // Handled above (before config loading)
            unreachable!()
        }
    }

    Ok(())
}
