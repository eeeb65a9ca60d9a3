//! Public key normalization and comparison
//!
//! Keys are compared by their public numbers rather than by encoded bytes:
//! the same EC key may be serialized compressed or uncompressed, and an RSA
//! modulus may carry a leading zero byte.

use crate::utils::{ComparisonError, VerifyError};
use serde::Serialize;
use x509_parser::prelude::*;
use x509_parser::public_key::PublicKey;

const OID_RSA_ENCRYPTION: &str = "1.2.840.113549.1.1.1";
const OID_EC_PUBLIC_KEY: &str = "1.2.840.10045.2.1";
const OID_ED25519: &str = "1.3.101.112";
const OID_CURVE_P256: &str = "1.2.840.10045.3.1.7";
const OID_CURVE_P384: &str = "1.3.132.0.34";
const OID_CURVE_P521: &str = "1.3.132.0.35";

/// Algorithm-specific public numbers of a key
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum PublicKeyNumbers {
    /// Big-endian modulus and exponent, leading zero bytes stripped
    Rsa { modulus: Vec<u8>, exponent: Vec<u8> },
    /// Named curve and SEC1 point (uncompressed for P-256 and P-384)
    Ec { curve: String, point: Vec<u8> },
    Ed25519 { key: Vec<u8> },
    /// Any other algorithm; kept only so it can be reported
    Unsupported { algorithm: String },
}

impl PublicKeyNumbers {
    /// Extract the public numbers from a parsed SubjectPublicKeyInfo
    pub fn from_spki(spki: &SubjectPublicKeyInfo<'_>) -> Result<Self, String> {
        let algorithm = spki.algorithm.algorithm.to_id_string();

        if algorithm == OID_ED25519 {
            return Ok(PublicKeyNumbers::Ed25519 {
                key: spki.subject_public_key.data.to_vec(),
            });
        }

        let parsed = spki
            .parsed()
            .map_err(|e| format!("malformed {} public key: {}", algorithm, e))?;

        match (algorithm.as_str(), parsed) {
            (OID_RSA_ENCRYPTION, PublicKey::RSA(rsa)) => Ok(PublicKeyNumbers::Rsa {
                modulus: strip_leading_zeros(rsa.modulus).to_vec(),
                exponent: strip_leading_zeros(rsa.exponent).to_vec(),
            }),
            (OID_EC_PUBLIC_KEY, PublicKey::EC(point)) => {
                let curve = spki
                    .algorithm
                    .parameters
                    .as_ref()
                    .and_then(|p| p.as_oid().ok())
                    .map(|oid| oid.to_id_string())
                    .ok_or_else(|| "EC key without a named curve".to_string())?;
                let point = normalize_ec_point(&curve, point.data())?;
                Ok(PublicKeyNumbers::Ec { curve, point })
            }
            _ => Ok(PublicKeyNumbers::Unsupported { algorithm }),
        }
    }

    /// Parse a DER-encoded SubjectPublicKeyInfo
    pub fn from_spki_der(der: &[u8], artifact: &str) -> Result<Self, VerifyError> {
        let (_, spki) =
            SubjectPublicKeyInfo::from_der(der).map_err(|e| VerifyError::CertificateParse {
                artifact: artifact.to_string(),
                message: format!("invalid SubjectPublicKeyInfo: {}", e),
            })?;

        Self::from_spki(&spki).map_err(|message| VerifyError::CertificateParse {
            artifact: artifact.to_string(),
            message,
        })
    }

    /// Short algorithm name, e.g. `RSA` or `EC P-256`
    pub fn algorithm_name(&self) -> String {
        match self {
            PublicKeyNumbers::Rsa { .. } => "RSA".to_string(),
            PublicKeyNumbers::Ec { curve, .. } => format!("EC {}", curve_name(curve)),
            PublicKeyNumbers::Ed25519 { .. } => "Ed25519".to_string(),
            PublicKeyNumbers::Unsupported { algorithm } => algorithm.clone(),
        }
    }

    /// Key size in bits, where it is meaningful
    pub fn bits(&self) -> Option<usize> {
        match self {
            PublicKeyNumbers::Rsa { modulus, .. } => modulus.first().map(|top| {
                (modulus.len() - 1) * 8 + (8 - top.leading_zeros() as usize)
            }),
            PublicKeyNumbers::Ec { curve, .. } => match curve.as_str() {
                OID_CURVE_P256 => Some(256),
                OID_CURVE_P384 => Some(384),
                OID_CURVE_P521 => Some(521),
                _ => None,
            },
            PublicKeyNumbers::Ed25519 { .. } => Some(256),
            PublicKeyNumbers::Unsupported { .. } => None,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            PublicKeyNumbers::Rsa { .. } => "RSA",
            PublicKeyNumbers::Ec { .. } => "EC",
            PublicKeyNumbers::Ed25519 { .. } => "Ed25519",
            PublicKeyNumbers::Unsupported { .. } => "unsupported",
        }
    }
}

impl std::fmt::Display for PublicKeyNumbers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.bits() {
            Some(bits) => write!(f, "{} ({} bits)", self.algorithm_name(), bits),
            None => write!(f, "{}", self.algorithm_name()),
        }
    }
}

/// Compare two public keys by their public numbers.
///
/// Keys of different algorithms, or EC keys on different curves, are reported
/// as a `ComparisonError` rather than `false` so the caller can say why.
pub fn compare_keys(
    a: &PublicKeyNumbers,
    b: &PublicKeyNumbers,
) -> Result<bool, ComparisonError> {
    match (a, b) {
        (PublicKeyNumbers::Unsupported { algorithm }, _)
        | (_, PublicKeyNumbers::Unsupported { algorithm }) => {
            Err(ComparisonError::UnsupportedAlgorithm {
                algorithm: algorithm.clone(),
            })
        }
        (
            PublicKeyNumbers::Rsa {
                modulus: m1,
                exponent: e1,
            },
            PublicKeyNumbers::Rsa {
                modulus: m2,
                exponent: e2,
            },
        ) => Ok(m1 == m2 && e1 == e2),
        (
            PublicKeyNumbers::Ec {
                curve: c1,
                point: p1,
            },
            PublicKeyNumbers::Ec {
                curve: c2,
                point: p2,
            },
        ) => {
            if c1 != c2 {
                return Err(ComparisonError::CurveMismatch {
                    left: curve_name(c1).to_string(),
                    right: curve_name(c2).to_string(),
                });
            }
            Ok(p1 == p2)
        }
        (PublicKeyNumbers::Ed25519 { key: k1 }, PublicKeyNumbers::Ed25519 { key: k2 }) => {
            Ok(k1 == k2)
        }
        _ => Err(ComparisonError::KeyTypeMismatch {
            left: a.kind().to_string(),
            right: b.kind().to_string(),
        }),
    }
}

/// Whether two public keys are the same key.
///
/// Never fails: when the keys cannot be compared a diagnostic is logged and
/// the keys are treated as different.
pub fn keys_match(a: &PublicKeyNumbers, b: &PublicKeyNumbers) -> bool {
    match compare_keys(a, b) {
        Ok(matches) => matches,
        Err(e) => {
            tracing::warn!("Could not compare public keys: {}", e);
            false
        }
    }
}

/// Human-readable name for a curve OID
pub fn curve_name(oid: &str) -> &str {
    match oid {
        OID_CURVE_P256 => "P-256",
        OID_CURVE_P384 => "P-384",
        OID_CURVE_P521 => "P-521",
        other => other,
    }
}

fn strip_leading_zeros(bytes: &[u8]) -> &[u8] {
    let first = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
    &bytes[first..]
}

/// Re-encode a SEC1 point in uncompressed form so equal keys compare equal
fn normalize_ec_point(curve: &str, data: &[u8]) -> Result<Vec<u8>, String> {
    match curve {
        OID_CURVE_P256 => {
            use p256::elliptic_curve::sec1::ToEncodedPoint;
            let key = p256::PublicKey::from_sec1_bytes(data)
                .map_err(|e| format!("invalid P-256 point: {}", e))?;
            Ok(key.to_encoded_point(false).as_bytes().to_vec())
        }
        OID_CURVE_P384 => {
            use p384::elliptic_curve::sec1::ToEncodedPoint;
            let key = p384::PublicKey::from_sec1_bytes(data)
                .map_err(|e| format!("invalid P-384 point: {}", e))?;
            Ok(key.to_encoded_point(false).as_bytes().to_vec())
        }
        OID_CURVE_P521 => {
            use p521::elliptic_curve::sec1::ToEncodedPoint;
            let key = p521::PublicKey::from_sec1_bytes(data)
                .map_err(|e| format!("invalid P-521 point: {}", e))?;
            Ok(key.to_encoded_point(false).as_bytes().to_vec())
        }
        _ => Ok(data.to_vec()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rsa(modulus: &[u8]) -> PublicKeyNumbers {
        PublicKeyNumbers::Rsa {
            modulus: modulus.to_vec(),
            exponent: vec![1, 0, 1],
        }
    }

    #[test]
    fn test_strip_leading_zeros() {
        assert_eq!(strip_leading_zeros(&[0, 0, 0xab, 0]), &[0xab, 0]);
        assert_eq!(strip_leading_zeros(&[0, 0]), &[] as &[u8]);
    }

    #[test]
    fn test_compare_is_symmetric() {
        let a = rsa(&[0xc1, 0x02]);
        let b = rsa(&[0xc1, 0x03]);
        assert_eq!(compare_keys(&a, &b), compare_keys(&b, &a));
        assert_eq!(compare_keys(&a, &a), Ok(true));
    }

    #[test]
    fn test_type_mismatch_is_not_a_match() {
        let a = rsa(&[0xc1]);
        let b = PublicKeyNumbers::Ed25519 { key: vec![7; 32] };
        assert!(matches!(
            compare_keys(&a, &b),
            Err(ComparisonError::KeyTypeMismatch { .. })
        ));
        assert!(!keys_match(&a, &b));
        assert!(!keys_match(&b, &a));
    }

    #[test]
    fn test_curve_mismatch() {
        let a = PublicKeyNumbers::Ec {
            curve: OID_CURVE_P256.to_string(),
            point: vec![4, 1],
        };
        let b = PublicKeyNumbers::Ec {
            curve: OID_CURVE_P384.to_string(),
            point: vec![4, 1],
        };
        assert_eq!(
            compare_keys(&a, &b),
            Err(ComparisonError::CurveMismatch {
                left: "P-256".to_string(),
                right: "P-384".to_string(),
            })
        );
    }

    #[test]
    fn test_unsupported_never_matches() {
        let odd = PublicKeyNumbers::Unsupported {
            algorithm: "1.2.3.4".to_string(),
        };
        assert!(!keys_match(&odd, &odd));
    }

    #[test]
    fn test_rsa_bits() {
        let mut modulus = vec![0x80];
        modulus.extend(std::iter::repeat(0).take(255));
        assert_eq!(rsa(&modulus).bits(), Some(2048));
        assert_eq!(rsa(&modulus).to_string(), "RSA (2048 bits)");
    }
}
