//! Credential match verification
//!
//! Decides whether PEM material scraped from a remote page (certificate chain,
//! CSR) matches local key material (private key, CSR file).

pub mod csr;
pub mod key_match;
pub mod public_key;
pub mod reader;
pub mod runner;

pub use csr::{verify_csr_pair, CsrComparison, ParsedCsr};
pub use key_match::{
    extract_leaf, read_private_key, verify_cert_key_pair, KeyPairVerdict, LeafCertificate,
    LeafPolicy, PrivateKeyInfo,
};
pub use public_key::{compare_keys, keys_match, PublicKeyNumbers};
pub use reader::{
    decode_blocks, decode_blocks_where, detect_format_from_bytes, DetectedFormat, PemBlock,
};
