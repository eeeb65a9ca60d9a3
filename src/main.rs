//! credmatch - verify portal certificates and CSRs against local key material
//!
//! Subcommands:
//! - `pair`: leaf certificate of a chain vs private key
//! - `csr`: portal CSR vs local CSR
//! - `verify`: both, with inputs from the settings file
//! - `blocks`: list the PEM blocks of a file
//! - `probe`: fetch the certificate a host presents over TLS

use clap::Parser;
use console::style;
use credmatch::cert_ops::runner as cert_runner;
use credmatch::cli::{Cli, Command};
use credmatch::config;
use credmatch::output::OutputMode;
use credmatch::runner;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Install the ring crypto provider for rustls
    let _ = rustls::crypto::ring::default_provider().install_default();

    let cli = Cli::parse();

    let default_level = if cli.verbose { "info" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if cli.no_color {
        console::set_colors_enabled(false);
        console::set_colors_enabled_stderr(false);
    }

    match run(cli).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            std::process::exit(1);
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<bool> {
    let settings = config::load_settings(cli.config.as_deref())?;

    let mode = if cli.json {
        OutputMode::Json
    } else if cli.quiet {
        OutputMode::Quiet
    } else {
        OutputMode::Terminal {
            verbose: cli.verbose,
        }
    };

    match &cli.command {
        Command::Pair(args) => cert_runner::run_pair(args, &settings, mode),
        Command::Csr(args) => cert_runner::run_csr(args, mode),
        Command::Verify(args) => cert_runner::run_verify(args, &settings, mode),
        Command::Blocks(args) => cert_runner::run_blocks(args, mode),
        Command::Probe(args) => runner::run_probe(args, &settings, mode).await,
    }
}
