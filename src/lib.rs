//! credmatch library
//!
//! Checks that TLS material copied from a certificate portal matches the key
//! material on the server:
//! - the leaf of a PEM certificate chain against a local private key
//! - a CSR shown by the portal against the local CSR file
//! - the certificate a host presents over TLS (probe)
//!
//! # Usage
//!
//! ```rust,no_run
//! use credmatch::cert_ops::{verify_cert_key_pair, verify_csr_pair};
//! use std::path::Path;
//!
//! let chain = std::fs::read_to_string("chain.pem").unwrap();
//! let matches = verify_cert_key_pair(&chain, Path::new("server.key"), None).unwrap();
//!
//! let csr = std::fs::read_to_string("portal.csr").unwrap();
//! let comparison = verify_csr_pair(&csr, Path::new("server.csr")).unwrap();
//! println!("{} {}", matches, comparison.is_match());
//! ```

pub mod cert_ops;
pub mod checks;
pub mod cli;
pub mod config;
pub mod models;
pub mod output;
pub mod runner;
pub mod utils;

// Re-export commonly used types
pub use cli::Cli;
pub use config::Settings;
pub use models::{CheckStatus, TestResult};
pub use utils::{ComparisonError, ConfigError, ProbeError, VerifyError};
