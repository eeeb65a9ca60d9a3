//! Network checks
//!
//! The only network operation is the TLS probe of the portal host.

pub mod probe;

pub use probe::{parse_peer_certificate, TlsProbe};
