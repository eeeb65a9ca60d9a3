//! Certificate signing request parsing and comparison

use crate::cert_ops::public_key::{keys_match, PublicKeyNumbers};
use crate::cert_ops::reader;
use crate::utils::VerifyError;
use serde::Serialize;
use std::path::Path;
use x509_parser::certification_request::X509CertificationRequest;
use x509_parser::prelude::*;

/// One attribute of a distinguished name: OID and value
pub type NameAttribute = (String, String);

/// A parsed CSR, reduced to what the comparison needs
#[derive(Debug, Clone)]
pub struct ParsedCsr {
    /// Subject as RDN sets of (OID, value), in encoding order
    pub subject: Vec<Vec<NameAttribute>>,
    /// Subject rendered as a string, for display
    pub subject_display: String,
    pub public_key: PublicKeyNumbers,
    pub der: Vec<u8>,
}

impl ParsedCsr {
    /// Parse a CSR from PEM text. Text around the block, including trailing
    /// whitespace picked up when scraping a page, is ignored.
    pub fn from_pem(text: &str, artifact: &str) -> Result<Self, VerifyError> {
        let blocks = reader::decode_blocks_where(text, artifact, |label| {
            reader::CSR_LABELS.contains(&label)
        })
        .map_err(|e| VerifyError::CsrParse {
            artifact: artifact.to_string(),
            message: e.to_string(),
        })?;

        let block = blocks
            .into_iter()
            .next()
            .ok_or_else(|| VerifyError::CsrParse {
                artifact: artifact.to_string(),
                message: "no CERTIFICATE REQUEST block found".to_string(),
            })?;

        Self::from_der(block.der, artifact)
    }

    /// Parse a CSR from a PEM file
    pub fn from_file(path: &Path) -> Result<Self, VerifyError> {
        let artifact = format!("local CSR {}", path.display());
        let text = reader::read_text_input(path, "local CSR")?;
        Self::from_pem(&text, &artifact)
    }

    fn from_der(der: Vec<u8>, artifact: &str) -> Result<Self, VerifyError> {
        let parse_error = |message: String| VerifyError::CsrParse {
            artifact: artifact.to_string(),
            message,
        };

        let (subject, subject_display, public_key) = {
            let (_, csr) = X509CertificationRequest::from_der(&der)
                .map_err(|e| parse_error(e.to_string()))?;
            let info = &csr.certification_request_info;

            (
                name_attributes(&info.subject),
                info.subject.to_string(),
                PublicKeyNumbers::from_spki(&info.subject_pki).map_err(parse_error)?,
            )
        };

        Ok(ParsedCsr {
            subject,
            subject_display,
            public_key,
            der,
        })
    }
}

/// Structural view of a name: each RDN as a list of (OID, value)
fn name_attributes(name: &X509Name<'_>) -> Vec<Vec<NameAttribute>> {
    name.iter()
        .map(|rdn| {
            rdn.iter()
                .map(|attr| {
                    let value = match attr.as_str() {
                        Ok(s) => s.to_string(),
                        Err(_) => format!("{:?}", attr.attr_value()),
                    };
                    (attr.attr_type().to_id_string(), value)
                })
                .collect()
        })
        .collect()
}

/// Result of comparing a remote CSR with a local one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CsrComparison {
    pub same_subject: bool,
    pub same_public_key: bool,
    /// Byte-for-byte DER equality; stricter than the match condition since
    /// attribute ordering or extra attributes change the encoding.
    pub same_der: bool,
}

impl CsrComparison {
    /// Compare two parsed CSRs
    pub fn compare(remote: &ParsedCsr, local: &ParsedCsr) -> Self {
        Self {
            same_subject: remote.subject == local.subject,
            same_public_key: keys_match(&remote.public_key, &local.public_key),
            same_der: remote.der == local.der,
        }
    }

    /// Subject and public key agree
    pub fn is_match(&self) -> bool {
        self.same_subject && self.same_public_key
    }
}

/// Compare the CSR shown on the page with the CSR on disk
pub fn verify_csr_pair(
    remote_csr_pem: &str,
    local_csr_path: &Path,
) -> Result<CsrComparison, VerifyError> {
    let (comparison, _, _) = check_csr_pair(remote_csr_pem, local_csr_path)?;
    Ok(comparison)
}

/// Like `verify_csr_pair`, also returning both parsed CSRs for reporting
pub fn check_csr_pair(
    remote_csr_pem: &str,
    local_csr_path: &Path,
) -> Result<(CsrComparison, ParsedCsr, ParsedCsr), VerifyError> {
    let remote = ParsedCsr::from_pem(remote_csr_pem, "remote CSR")?;
    let local = ParsedCsr::from_file(local_csr_path)?;
    let comparison = CsrComparison::compare(&remote, &local);

    tracing::info!(
        "CSR comparison: subject={} public_key={} der={}",
        comparison.same_subject,
        comparison.same_public_key,
        comparison.same_der
    );

    Ok((comparison, remote, local))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_match_ignores_der() {
        let c = CsrComparison {
            same_subject: true,
            same_public_key: true,
            same_der: false,
        };
        assert!(c.is_match());

        let c = CsrComparison {
            same_subject: true,
            same_public_key: false,
            same_der: false,
        };
        assert!(!c.is_match());
    }

    #[test]
    fn test_from_pem_without_csr_block() {
        let text = "-----BEGIN CERTIFICATE-----\nAQID\n-----END CERTIFICATE-----\n";
        let err = ParsedCsr::from_pem(text, "remote CSR").unwrap_err();
        assert!(matches!(err, VerifyError::CsrParse { .. }));
        assert!(err.to_string().contains("remote CSR"));
    }

    #[test]
    fn test_from_pem_garbage_der() {
        let text = "-----BEGIN CERTIFICATE REQUEST-----\nAQID\n-----END CERTIFICATE REQUEST-----\n";
        assert!(ParsedCsr::from_pem(text, "remote CSR").is_err());
    }
}
