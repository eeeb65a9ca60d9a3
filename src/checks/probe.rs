//! TLS probe
//!
//! Connects to a host, completes a rustls handshake against the Mozilla root
//! set (plus any extra trust anchors) and summarizes the leaf certificate the
//! server presented. No verification beyond the handshake's own is done.

use crate::cert_ops::reader;
use crate::config::ProbeSettings;
use crate::models::{PeerCertificate, TlsProtocol};
use crate::utils::ProbeError;
use chrono::{DateTime, TimeZone, Utc};
use rustls::pki_types::{CertificateDer, ServerName};
use rustls::{ClientConfig, RootCertStore};
use sha2::{Digest, Sha256};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use x509_parser::prelude::*;

/// TLS probe
pub struct TlsProbe {
    connect_timeout: Duration,
    handshake_timeout: Duration,
    extra_roots: Vec<CertificateDer<'static>>,
}

impl TlsProbe {
    /// Create a probe from settings, loading `ca_file` when one is configured
    pub fn new(settings: &ProbeSettings) -> Result<Self, ProbeError> {
        // No-op when main already installed it
        let _ = rustls::crypto::ring::default_provider().install_default();

        let probe = Self {
            connect_timeout: settings.connect_timeout(),
            handshake_timeout: settings.handshake_timeout(),
            extra_roots: Vec::new(),
        };

        match &settings.ca_file {
            Some(path) => probe.with_ca_file(path),
            None => Ok(probe),
        }
    }

    /// Trust the certificates in a PEM file in addition to the Mozilla roots
    pub fn with_ca_file(mut self, path: &Path) -> Result<Self, ProbeError> {
        let artifact = format!("CA file {}", path.display());
        let text = reader::read_text_input(path, &artifact).map_err(|e| {
            ProbeError::Configuration {
                message: e.to_string(),
            }
        })?;
        let blocks = reader::certificate_blocks(&text, &artifact).map_err(|e| {
            ProbeError::Configuration {
                message: e.to_string(),
            }
        })?;
        if blocks.is_empty() {
            return Err(ProbeError::Configuration {
                message: format!("no certificates in {}", artifact),
            });
        }

        tracing::debug!("Loaded {} extra trust anchor(s) from {}", blocks.len(), path.display());
        self.extra_roots
            .extend(blocks.into_iter().map(|b| CertificateDer::from(b.der)));
        Ok(self)
    }

    /// Use the same timeout for connecting and for the handshake
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self.handshake_timeout = timeout;
        self
    }

    fn client_config(&self) -> Result<ClientConfig, ProbeError> {
        let mut root_store =
            RootCertStore::from_iter(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
        for der in &self.extra_roots {
            root_store
                .add(der.clone())
                .map_err(|e| ProbeError::Configuration {
                    message: format!("invalid trust anchor: {}", e),
                })?;
        }

        Ok(ClientConfig::builder()
            .with_root_certificates(root_store)
            .with_no_client_auth())
    }

    /// Connect to `host:port` and return the server's leaf certificate
    pub async fn probe(&self, host: &str, port: u16) -> Result<PeerCertificate, ProbeError> {
        let connector = tokio_rustls::TlsConnector::from(Arc::new(self.client_config()?));

        let server_name =
            ServerName::try_from(host.to_string()).map_err(|_| ProbeError::Configuration {
                message: format!("Invalid server name: {}", host),
            })?;

        let addr = tokio::net::lookup_host((host, port))
            .await
            .map_err(|e| ProbeError::Resolve {
                host: host.to_string(),
                message: e.to_string(),
            })?
            .next()
            .ok_or_else(|| ProbeError::Resolve {
                host: host.to_string(),
                message: "no addresses returned".to_string(),
            })?;
        tracing::info!("Connecting to {} ({})", host, addr);

        let stream = tokio::time::timeout(self.connect_timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| ProbeError::Timeout {
                host: host.to_string(),
                port,
                stage: "TCP connect".to_string(),
            })?
            .map_err(|e| ProbeError::ConnectionError {
                host: host.to_string(),
                port,
                message: e.to_string(),
            })?;

        let tls_stream = tokio::time::timeout(
            self.handshake_timeout,
            connector.connect(server_name, stream),
        )
        .await
        .map_err(|_| ProbeError::Timeout {
            host: host.to_string(),
            port,
            stage: "TLS handshake".to_string(),
        })?
        .map_err(|e| ProbeError::HandshakeFailed {
            host: host.to_string(),
            message: e.to_string(),
        })?;

        let (_, connection) = tls_stream.get_ref();

        let protocol = match connection.protocol_version() {
            Some(rustls::ProtocolVersion::TLSv1_3) => TlsProtocol::Tls13,
            Some(rustls::ProtocolVersion::TLSv1_2) => TlsProtocol::Tls12,
            _ => TlsProtocol::Unknown,
        };

        let cipher_suite = connection
            .negotiated_cipher_suite()
            .map(|cs| format!("{:?}", cs.suite()))
            .unwrap_or_else(|| "Unknown".to_string());

        let peer_certs = connection
            .peer_certificates()
            .filter(|certs| !certs.is_empty())
            .ok_or_else(|| ProbeError::NoPeerCertificate {
                host: host.to_string(),
            })?;

        let mut peer = parse_peer_certificate(peer_certs[0].as_ref())?;
        peer.host = host.to_string();
        peer.port = port;
        peer.protocol = protocol;
        peer.cipher_suite = cipher_suite;
        peer.chain_len = peer_certs.len();
        Ok(peer)
    }
}

/// Summarize a DER certificate. Connection fields are left empty.
pub fn parse_peer_certificate(der: &[u8]) -> Result<PeerCertificate, ProbeError> {
    let (_, cert) = X509Certificate::from_der(der).map_err(|e| ProbeError::CertificateParse {
        message: e.to_string(),
    })?;

    let subject = cert.subject();
    let issuer = cert.issuer();

    let fingerprint = Sha256::digest(der)
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(":");

    Ok(PeerCertificate {
        host: String::new(),
        port: 0,
        common_name: first_attr(subject.iter_common_name()),
        organization: first_attr(subject.iter_organization()),
        issuer_common_name: first_attr(issuer.iter_common_name()),
        issuer_organization: first_attr(issuer.iter_organization()),
        not_before: asn1_time_to_datetime(cert.validity().not_before)?,
        not_after: asn1_time_to_datetime(cert.validity().not_after)?,
        fingerprint,
        protocol: TlsProtocol::Unknown,
        cipher_suite: String::new(),
        chain_len: 1,
    })
}

fn first_attr<'a, 'b: 'a>(
    mut attrs: impl Iterator<Item = &'a AttributeTypeAndValue<'b>>,
) -> Option<String> {
    attrs.next().and_then(|a| a.as_str().ok()).map(str::to_string)
}

fn asn1_time_to_datetime(time: ASN1Time) -> Result<DateTime<Utc>, ProbeError> {
    Utc.timestamp_opt(time.timestamp(), 0)
        .single()
        .ok_or_else(|| ProbeError::CertificateParse {
            message: "Invalid timestamp in certificate".to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fixture_certificate() {
        let pem = include_str!("../../tests/fixtures/test-cert.pem");
        let blocks = reader::certificate_blocks(pem, "fixture").unwrap();
        let peer = parse_peer_certificate(&blocks[0].der).unwrap();

        assert_eq!(peer.common_name.as_deref(), Some("test.example.com"));
        assert_eq!(peer.organization.as_deref(), Some("Example Org"));
        assert_eq!(peer.issuer_common_name.as_deref(), Some("test.example.com"));
        assert!(peer.not_before < peer.not_after);
        assert_eq!(peer.fingerprint.split(':').count(), 32);
    }

    #[test]
    fn test_missing_ca_file_is_configuration_error() {
        let settings = ProbeSettings::default();
        let result = TlsProbe::new(&settings)
            .unwrap()
            .with_ca_file(Path::new("/nonexistent/roots.pem"));
        assert!(matches!(result, Err(ProbeError::Configuration { .. })));
    }
}
