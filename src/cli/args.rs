//! CLI argument definitions using clap

use crate::utils::ConfigError;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "credmatch")]
#[command(version)]
#[command(
    about = "Check that a TLS certificate chain and CSR copied from a web portal match local key material",
    long_about = None
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Settings file (default: config/default.toml when present)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Emit results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Show detail sections and informational logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print nothing; report through the exit status only
    #[arg(short, long, global = true, conflicts_with = "json")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Check that the leaf certificate of a chain matches a private key
    Pair(PairArgs),

    /// Compare a CSR copied from the portal with a local CSR
    Csr(CsrArgs),

    /// Run both checks, taking missing inputs from the settings file
    Verify(VerifyArgs),

    /// List the PEM blocks of a file and show which one is used as the leaf
    Blocks(BlocksArgs),

    /// Connect to a host over TLS and print its certificate
    Probe(ProbeArgs),
}

#[derive(Args, Debug)]
pub struct PairArgs {
    /// Certificate chain text (`-` for stdin)
    #[arg(long, value_name = "FILE")]
    pub chain: PathBuf,

    /// Private key file
    #[arg(long, value_name = "FILE")]
    pub key: PathBuf,

    /// Passphrase for an encrypted private key
    #[arg(long, value_name = "PASSPHRASE")]
    pub passphrase: Option<String>,
}

#[derive(Args, Debug)]
pub struct CsrArgs {
    /// CSR text copied from the portal (`-` for stdin)
    #[arg(long, value_name = "FILE")]
    pub remote: PathBuf,

    /// Local CSR file
    #[arg(long, value_name = "FILE")]
    pub local: PathBuf,
}

#[derive(Args, Debug, Default)]
pub struct VerifyArgs {
    /// Certificate chain text (`-` for stdin)
    #[arg(long, value_name = "FILE")]
    pub chain: Option<PathBuf>,

    /// CSR text copied from the portal (`-` for stdin)
    #[arg(long, value_name = "FILE")]
    pub remote_csr: Option<PathBuf>,

    /// Private key file
    #[arg(long, value_name = "FILE")]
    pub key: Option<PathBuf>,

    /// Local CSR file
    #[arg(long, value_name = "FILE")]
    pub csr: Option<PathBuf>,

    /// Passphrase for an encrypted private key
    #[arg(long, value_name = "PASSPHRASE")]
    pub passphrase: Option<String>,
}

#[derive(Args, Debug)]
pub struct BlocksArgs {
    /// PEM text (`-` for stdin)
    #[arg(value_name = "FILE")]
    pub file: PathBuf,
}

#[derive(Args, Debug)]
pub struct ProbeArgs {
    /// Host to connect to (default: host of probe.login_url)
    #[arg(value_name = "HOST")]
    pub host: Option<String>,

    /// Port (default: probe.port, 443)
    #[arg(long)]
    pub port: Option<u16>,

    /// Connect and handshake timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Additional trusted root certificates (PEM)
    #[arg(long, value_name = "FILE")]
    pub ca_file: Option<PathBuf>,
}

impl ProbeArgs {
    /// Accept `host:port` and URLs as well as bare host names.
    ///
    /// Returns `Ok(None)` when no host was given. A host that cannot be
    /// parsed is an error rather than a reason to fall back to the configured
    /// login URL.
    pub fn split_host(&self) -> Result<Option<(String, Option<u16>)>, ConfigError> {
        let Some(raw) = self.host.as_deref().map(str::trim) else {
            return Ok(None);
        };

        let invalid = |message: String| ConfigError::InvalidValue {
            key: "HOST".to_string(),
            message,
        };

        if raw.contains("://") {
            let url = url::Url::parse(raw).map_err(|e| invalid(format!("{}: {}", raw, e)))?;
            let host = url
                .host_str()
                .map(|h| h.trim_matches(['[', ']']))
                .filter(|h| !h.is_empty())
                .ok_or_else(|| invalid(format!("{}: URL has no host", raw)))?;
            return Ok(Some((host.to_string(), url.port())));
        }

        let raw = raw.trim_end_matches('/');
        let (host, port) = match raw.strip_prefix('[') {
            Some(bracketed) => {
                let (host, rest) = bracketed
                    .split_once(']')
                    .ok_or_else(|| invalid(format!("{}: unclosed '['", raw)))?;
                match rest {
                    "" => (host, None),
                    _ => {
                        let port = rest
                            .strip_prefix(':')
                            .ok_or_else(|| invalid(format!("{}: unexpected {:?}", raw, rest)))?;
                        (host, Some(port))
                    }
                }
            }
            None => match raw.rsplit_once(':') {
                Some((host, port)) if !host.contains(':') => (host, Some(port)),
                _ => (raw, None),
            },
        };

        let port = port
            .map(|p| p.parse::<u16>())
            .transpose()
            .map_err(|e| invalid(format!("{}: invalid port: {}", raw, e)))?;

        if host.is_empty() || host.contains(char::is_whitespace) {
            return Err(invalid(format!("{:?} is not a host name", raw)));
        }
        Ok(Some((host.to_string(), port)))
    }
}
