//! Probe orchestration
//!
//! Drives the TLS probe for the `probe` command: picks the host from the
//! command line or the configured login URL, shows a spinner while connecting
//! and reports the peer certificate as a TestResult.

use crate::checks::TlsProbe;
use crate::cli::ProbeArgs;
use crate::config::Settings;
use crate::models::{CheckStatus, DetailSection, PeerCertificate, TestResult, TestStep};
use crate::output::{self, OutputMode};
use crate::utils::progress;
use anyhow::Result;
use std::time::Duration;

/// Certificates closer than this to expiry are reported as a warning
const EXPIRY_WARNING_DAYS: i64 = 30;

/// Host and port to probe, from the arguments or the settings
pub fn probe_target(args: &ProbeArgs, settings: &Settings) -> Result<(String, u16)> {
    let (host, port) = match args.split_host()? {
        Some((host, port)) => (host, port),
        None => {
            let host = settings.probe.login_host()?.ok_or_else(|| {
                anyhow::anyhow!("No host given and probe.login_url is not configured")
            })?;
            (host, None)
        }
    };

    let port = args.port.or(port).unwrap_or(settings.probe.port);
    Ok((host, port))
}

/// Turn a probed certificate into a TestResult
pub fn peer_result(peer: &PeerCertificate) -> TestResult {
    let days = peer.days_until_expiry();
    let status = if days < EXPIRY_WARNING_DAYS {
        CheckStatus::Warning
    } else {
        CheckStatus::Pass
    };

    let expiry_step = if status == CheckStatus::Pass {
        TestStep::pass(format!("Certificate valid for {} more days", days))
    } else {
        TestStep::warning("Certificate expires soon", format!("{} days left", days))
    };

    let mut result = TestResult::new(
        "TLS Probe",
        status,
        format!("{}:{} ({})", peer.host, peer.port, peer.protocol),
    )
    .with_detail(DetailSection::key_value(
        Some("Peer Certificate".to_string()),
        peer.display_pairs(),
    ))
    .with_step(TestStep::pass(format!(
        "TLS handshake completed, {} certificate(s) presented",
        peer.chain_len
    )))
    .with_step(expiry_step);

    if let Ok(data) = serde_json::to_value(peer) {
        result = result.with_data(data);
    }
    result
}

/// Run the `probe` command
pub async fn run_probe(args: &ProbeArgs, settings: &Settings, mode: OutputMode) -> Result<bool> {
    let (host, port) = probe_target(args, settings)?;

    let mut probe = TlsProbe::new(&settings.probe)?;
    if let Some(ca_file) = &args.ca_file {
        probe = probe.with_ca_file(ca_file)?;
    }
    if let Some(secs) = args.timeout {
        probe = probe.with_timeout(Duration::from_secs(secs));
    }

    let spinner = match mode {
        OutputMode::Terminal { .. } => progress::create_spinner(&format!(
            "Connecting to {}:{}...",
            host, port
        )),
        _ => indicatif::ProgressBar::hidden(),
    };
    let outcome = probe.probe(&host, port).await;
    spinner.finish_and_clear();

    let result = peer_result(&outcome?);
    let mode = match mode {
        OutputMode::Terminal { .. } => OutputMode::Terminal { verbose: true },
        other => other,
    };
    output::emit(std::slice::from_ref(&result), mode)?;
    Ok(result.passed())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(host: Option<&str>, port: Option<u16>) -> ProbeArgs {
        ProbeArgs {
            host: host.map(str::to_string),
            port,
            timeout: None,
            ca_file: None,
        }
    }

    #[test]
    fn test_target_from_login_url() {
        let settings = Settings::from_toml(
            r#"
            [probe]
            login_url = "https://portal.example.edu/login"
            port = 8443
            "#,
        )
        .unwrap();

        let (host, port) = probe_target(&args(None, None), &settings).unwrap();
        assert_eq!(host, "portal.example.edu");
        assert_eq!(port, 8443);
    }

    #[test]
    fn test_bad_host_does_not_fall_back_to_login_url() {
        let settings = Settings::from_toml(
            r#"
            [probe]
            login_url = "https://portal.example.edu/login"
            "#,
        )
        .unwrap();

        let err = probe_target(&args(Some("https://bad host/"), None), &settings).unwrap_err();
        assert!(err.to_string().contains("HOST"), "{}", err);
    }

    #[test]
    fn test_port_flag_beats_host_port() {
        let settings = Settings::default();
        let (host, port) =
            probe_target(&args(Some("example.com:8443"), Some(9443)), &settings).unwrap();
        assert_eq!(host, "example.com");
        assert_eq!(port, 9443);

        let (_, port) = probe_target(&args(Some("example.com:8443"), None), &settings).unwrap();
        assert_eq!(port, 8443);
    }

    #[test]
    fn test_no_host_anywhere_is_error() {
        assert!(probe_target(&args(None, None), &Settings::default()).is_err());
    }
}
