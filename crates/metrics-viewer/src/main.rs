//! metrics-viewer — live terminal view of selected Prometheus metrics.
//!
//! Scrapes one metrics endpoint on an interval, keeps the configured metric
//! families, and shows them as a filterable, sortable table.
//!
//! # Usage
//!
//! ```text
//! metrics-viewer --token-file ~/.kube/token watch
//! metrics-viewer --url http://localhost:9090/metrics dump --format json
//! ```

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser, Debug)]
#[command(
    name = "metrics-viewer",
    about = "Live terminal viewer for Prometheus metrics",
    version,
    propagate_version = true
)]
struct Cli {
    /// Configuration file; a default one is written when missing.
    #[arg(
        long,
        global = true,
        env = "METRICS_VIEWER_CONFIG",
        default_value = "metrics-viewer.toml"
    )]
    config: PathBuf,

    /// File holding a bearer token for the metrics endpoint.
    #[arg(long, global = true, env = "METRICS_VIEWER_TOKEN_FILE")]
    token_file: Option<PathBuf>,

    /// Metrics endpoint URL, overriding [source].url.
    #[arg(long, global = true, env = "METRICS_VIEWER_URL")]
    url: Option<String>,

    /// Debug-level logging for metrics-viewer crates. Use with --log-file
    /// in the full-screen view.
    #[arg(long, global = true)]
    debug: bool,

    /// Write logs to this file instead of stderr. Without it the full-screen
    /// view only logs errors unless RUST_LOG is set.
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
enum Commands {
    /// Watch the metrics live (default)
    Watch {
        /// Print scrolling tables instead of the full-screen view
        #[arg(long)]
        plain: bool,
    },
    /// Scrape once and print the result
    Dump {
        /// Output format: text or json
        #[arg(short, long, default_value = "text", value_parser = ["text", "json"])]
        format: String,
    },
    /// Print the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Watch { plain: false });
    let full_screen = matches!(
        command,
        Commands::Watch { plain } if commands::watch::is_interactive(plain)
    );
    init_tracing(cli.debug, cli.log_file.as_deref(), full_screen)?;

    let config = commands::load_config(&cli.config, cli.url)?;

    match command {
        Commands::Watch { plain } => {
            let source = commands::build_source(&config, cli.token_file.as_deref())?;
            commands::watch::run(&config, source, plain).await
        }
        Commands::Dump { format } => {
            let source = commands::build_source(&config, cli.token_file.as_deref())?;
            commands::dump::run(&config, source, &format).await
        }
        Commands::Config => commands::config::show(&config),
    }
}

/// Directives used when `RUST_LOG` is unset.
fn default_directives(debug: bool, stderr_under_screen: bool) -> &'static str {
    if stderr_under_screen {
        // Anything chattier draws over the table.
        "error"
    } else if debug {
        "info,metrics_viewer=debug,mview_core=debug,mview_scrape=debug,mview_term=debug"
    } else {
        "info"
    }
}

fn init_tracing(debug: bool, log_file: Option<&Path>, full_screen: bool) -> anyhow::Result<()> {
    let directives = default_directives(debug, full_screen && log_file.is_none());
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directives));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("unable to open log file {}", path.display()))?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).init();
        }
        None => builder.with_writer(std::io::stderr).init(),
    }
    Ok(())
}
