//! Peer certificate summary returned by the TLS probe

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// TLS protocol versions rustls can negotiate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TlsProtocol {
    Tls12,
    Tls13,
    Unknown,
}

impl fmt::Display for TlsProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TlsProtocol::Tls12 => write!(f, "TLS 1.2"),
            TlsProtocol::Tls13 => write!(f, "TLS 1.3"),
            TlsProtocol::Unknown => write!(f, "unknown"),
        }
    }
}

/// Basic fields of the certificate a server presented
#[derive(Debug, Clone, Serialize)]
pub struct PeerCertificate {
    pub host: String,
    pub port: u16,
    pub common_name: Option<String>,
    pub organization: Option<String>,
    pub issuer_common_name: Option<String>,
    pub issuer_organization: Option<String>,
    pub not_before: DateTime<Utc>,
    pub not_after: DateTime<Utc>,
    /// SHA-256 of the DER encoding, colon separated
    pub fingerprint: String,
    pub protocol: TlsProtocol,
    pub cipher_suite: String,
    /// Certificates the server sent, leaf included
    pub chain_len: usize,
}

impl PeerCertificate {
    /// Calculate days until expiry (negative if expired)
    pub fn days_until_expiry(&self) -> i64 {
        self.not_after.signed_duration_since(Utc::now()).num_days()
    }

    /// Check if the certificate is expired
    pub fn is_expired(&self) -> bool {
        Utc::now() > self.not_after
    }

    /// Rows for display, with `N/A` for fields the certificate lacks
    pub fn display_pairs(&self) -> Vec<(String, String)> {
        let or_na = |v: &Option<String>| v.clone().unwrap_or_else(|| "N/A".to_string());
        vec![
            ("Common Name (CN)".to_string(), or_na(&self.common_name)),
            ("Organization (O)".to_string(), or_na(&self.organization)),
            ("Issuer".to_string(), or_na(&self.issuer_common_name)),
            (
                "Issuer Organization".to_string(),
                or_na(&self.issuer_organization),
            ),
            (
                "NotBefore".to_string(),
                self.not_before.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            ),
            (
                "NotAfter".to_string(),
                self.not_after.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            ),
            (
                "Days Until Expiry".to_string(),
                self.days_until_expiry().to_string(),
            ),
            ("Protocol".to_string(), self.protocol.to_string()),
            ("Cipher Suite".to_string(), self.cipher_suite.clone()),
            ("SHA-256".to_string(), self.fingerprint.clone()),
        ]
    }
}
