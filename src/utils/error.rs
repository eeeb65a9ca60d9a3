//! Custom error types for credmatch
//!
//! This module defines domain-specific error types using `thiserror` for
//! the failure modes of credential verification, configuration and TLS probing.

use thiserror::Error;

/// Errors raised while parsing the artifacts of a verification run.
///
/// Every variant names the artifact it came from so the operator can tell the
/// remote (scraped) material from the local files.
#[derive(Error, Debug)]
pub enum VerifyError {
    #[error("No PEM certificate found in {artifact}")]
    NoCertificateFound { artifact: String },

    #[error("Malformed PEM in {artifact}: {message}")]
    Pem { artifact: String, message: String },

    #[error("Failed to parse certificate from {artifact}: {message}")]
    CertificateParse { artifact: String, message: String },

    #[error("Failed to load private key {path}: {message}")]
    KeyLoad { path: String, message: String },

    #[error("Failed to parse CSR from {artifact}: {message}")]
    CsrParse { artifact: String, message: String },

    #[error("Failed to read {artifact}: {message}")]
    InputRead { artifact: String, message: String },
}

/// Reasons two public keys could not be compared.
///
/// These never abort a run: `keys_match` downgrades them to "no match".
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ComparisonError {
    #[error("cannot compare a {left} key with a {right} key")]
    KeyTypeMismatch { left: String, right: String },

    #[error("EC keys are on different curves ({left} vs {right})")]
    CurveMismatch { left: String, right: String },

    #[error("unsupported public key algorithm {algorithm}")]
    UnsupportedAlgorithm { algorithm: String },
}

/// Configuration loading and validation errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },

    #[error("Failed to parse configuration: {message}")]
    ParseError { message: String },

    #[error("Missing required configuration: {}", keys.join(", "))]
    MissingRequired { keys: Vec<String> },

    #[error("Input files not found: {}", paths.join(", "))]
    InputsNotFound { paths: Vec<String> },

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// TLS probe errors
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("Failed to resolve {host}: {message}")]
    Resolve { host: String, message: String },

    #[error("Connection to {host}:{port} failed: {message}")]
    ConnectionError {
        host: String,
        port: u16,
        message: String,
    },

    #[error("Timed out during {stage} with {host}:{port}")]
    Timeout {
        host: String,
        port: u16,
        stage: String,
    },

    #[error("TLS handshake with {host} failed: {message}")]
    HandshakeFailed { host: String, message: String },

    #[error("{host} did not present a certificate")]
    NoPeerCertificate { host: String },

    #[error("Failed to parse peer certificate: {message}")]
    CertificateParse { message: String },

    #[error("TLS configuration error: {message}")]
    Configuration { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_required_lists_every_key() {
        let err = ConfigError::MissingRequired {
            keys: vec!["verify.key_path".to_string(), "verify.csr_path".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Missing required configuration: verify.key_path, verify.csr_path"
        );
    }

    #[test]
    fn test_verify_error_names_artifact() {
        let err = VerifyError::NoCertificateFound {
            artifact: "remote certificate chain".to_string(),
        };
        assert!(err.to_string().contains("remote certificate chain"));
    }
}
