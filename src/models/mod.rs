//! Data models for credmatch

pub mod peer_certificate;
pub mod test_result;

pub use peer_certificate::{PeerCertificate, TlsProtocol};
pub use test_result::{CheckStatus, DetailSection, TestResult, TestStep};
