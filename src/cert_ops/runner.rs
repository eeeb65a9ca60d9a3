//! Runner for the verification subcommands
//!
//! Reads the artifacts, runs the comparisons and turns each verdict into a
//! TestResult for the terminal and JSON formatters.

use crate::cert_ops::csr::{check_csr_pair, CsrComparison, ParsedCsr};
use crate::cert_ops::key_match::{self, KeyPairVerdict};
use crate::cert_ops::reader::{self, PemBlock};
use crate::cli::{BlocksArgs, CsrArgs, PairArgs, VerifyArgs};
use crate::config::{require_local_file, Settings, VerifyOverrides};
use crate::models::{CheckStatus, DetailSection, TestResult, TestStep};
use crate::output::{self, OutputMode};
use crate::utils::VerifyError;
use std::path::Path;
use x509_parser::certification_request::X509CertificationRequest;
use x509_parser::prelude::*;

const REMOTE_CHAIN: &str = "remote certificate chain";
const REMOTE_CSR: &str = "remote CSR";

/// Complete the passphrase with an interactive prompt when the key needs one.
///
/// Prompts only when no passphrase was resolved, the key is encrypted and
/// stderr is a terminal. Otherwise key loading reports the missing passphrase.
fn resolve_passphrase(
    key_path: &Path,
    passphrase: Option<String>,
) -> Result<Option<String>, anyhow::Error> {
    if passphrase.is_some() {
        return Ok(passphrase);
    }

    if key_match::is_encrypted_key(key_path)? && console::Term::stderr().is_term() {
        let pwd = dialoguer::Password::new()
            .with_prompt(format!(
                "Passphrase for {}",
                key_path.file_name().unwrap_or_default().to_string_lossy()
            ))
            .allow_empty_password(true)
            .interact()?;
        return Ok(Some(pwd));
    }

    Ok(None)
}

/// Build the key pair TestResult from a verdict
pub fn key_pair_result(verdict: &KeyPairVerdict, key_path: &Path) -> TestResult {
    let status = if !verdict.matches {
        CheckStatus::Fail
    } else if verdict.suspect_chain_order() {
        CheckStatus::Warning
    } else {
        CheckStatus::Pass
    };

    let summary = if verdict.matches {
        "leaf certificate matches the private key"
    } else {
        "leaf certificate does not match the private key"
    };

    let mut result = TestResult::new("Key Pair Verification", status, summary)
        .with_detail(DetailSection::key_value(
            Some("Leaf Certificate".to_string()),
            vec![
                ("Subject".to_string(), verdict.leaf_subject.clone()),
                ("Public Key".to_string(), verdict.certificate_key.clone()),
                (
                    "Certificates in Chain".to_string(),
                    verdict.chain_len.to_string(),
                ),
            ],
        ))
        .with_detail(DetailSection::key_value(
            Some("Private Key".to_string()),
            vec![
                ("File".to_string(), key_path.display().to_string()),
                ("Type".to_string(), verdict.key_type.clone()),
            ],
        ))
        .with_step(TestStep::check(
            "Certificate public key matches private key",
            verdict.matches,
        ));

    if verdict.suspect_chain_order() {
        result = result
            .with_step(TestStep::warning(
                "Leaf certificate is a CA certificate",
                format!("first of {} certificates", verdict.chain_len),
            ))
            .with_recommendation(
                "The chain does not appear to list the end-entity certificate first; check which certificate the portal issued",
            );
    }

    if !verdict.matches {
        result = result.with_recommendation(
            "Make sure the certificate was issued for the CSR generated with this private key",
        );
    }

    match serde_json::to_value(verdict) {
        Ok(data) => result.with_data(data),
        Err(_) => result,
    }
}

/// Build the CSR TestResult from a comparison
pub fn csr_result(
    comparison: &CsrComparison,
    remote: &ParsedCsr,
    local: &ParsedCsr,
    local_path: &Path,
) -> TestResult {
    let summary = if comparison.is_match() {
        "remote CSR matches the local CSR"
    } else {
        "remote CSR does not match the local CSR"
    };

    let der_step = if comparison.same_der {
        TestStep::pass("Same DER encoding")
    } else {
        TestStep::warning(
            "Same DER encoding",
            "encodings differ; informational only",
        )
    };

    let mut result = TestResult::new(
        "CSR Verification",
        CheckStatus::from_bool(comparison.is_match()),
        summary,
    )
    .with_detail(DetailSection::table(
        None,
        vec![
            "".to_string(),
            "Remote".to_string(),
            format!("Local ({})", local_path.display()),
        ],
        vec![
            vec![
                "Subject".to_string(),
                remote.subject_display.clone(),
                local.subject_display.clone(),
            ],
            vec![
                "Public Key".to_string(),
                remote.public_key.to_string(),
                local.public_key.to_string(),
            ],
            vec![
                "DER Size".to_string(),
                format!("{} bytes", remote.der.len()),
                format!("{} bytes", local.der.len()),
            ],
        ],
    ))
    .with_step(TestStep::check("Same subject", comparison.same_subject))
    .with_step(TestStep::check("Same public key", comparison.same_public_key))
    .with_step(der_step)
    .with_data(serde_json::json!({
        "same_subject": comparison.same_subject,
        "same_public_key": comparison.same_public_key,
        "same_der": comparison.same_der,
        "remote_subject": remote.subject_display,
        "local_subject": local.subject_display,
    }));

    if !comparison.same_public_key {
        result = result.with_recommendation(
            "The portal holds a CSR for a different key; regenerate or resubmit the CSR",
        );
    }
    result
}

fn collect_key_pair(
    chain_path: &Path,
    key_path: &Path,
    passphrase: Option<String>,
) -> Result<TestResult, anyhow::Error> {
    let chain_pem = reader::read_text_input(chain_path, REMOTE_CHAIN)?;
    let passphrase = resolve_passphrase(key_path, passphrase)?;
    let verdict = key_match::check_cert_key_pair(&chain_pem, key_path, passphrase.as_deref())?;
    Ok(key_pair_result(&verdict, key_path))
}

fn collect_csr(remote_path: &Path, local_path: &Path) -> Result<TestResult, anyhow::Error> {
    let remote_pem = reader::read_text_input(remote_path, REMOTE_CSR)?;
    let (comparison, remote, local) = check_csr_pair(&remote_pem, local_path)?;
    Ok(csr_result(&comparison, &remote, &local, local_path))
}

fn finish(results: &[TestResult], mode: OutputMode) -> Result<bool, anyhow::Error> {
    output::emit(results, mode)?;
    Ok(results.iter().all(TestResult::passed))
}

/// Run the `pair` command.
///
/// Returns `Ok(true)` if the key matches, `Ok(false)` otherwise.
pub fn run_pair(
    args: &PairArgs,
    settings: &Settings,
    mode: OutputMode,
) -> Result<bool, anyhow::Error> {
    require_local_file(&args.key, "--key")?;
    let passphrase = settings.verify.passphrase(args.passphrase.as_deref());
    let result = collect_key_pair(&args.chain, &args.key, passphrase)?;
    finish(&[result], mode)
}

/// Run the `csr` command
pub fn run_csr(args: &CsrArgs, mode: OutputMode) -> Result<bool, anyhow::Error> {
    require_local_file(&args.local, "--local")?;
    let result = collect_csr(&args.remote, &args.local)?;
    finish(&[result], mode)
}

/// Run the `verify` command: both checks, inputs merged with the settings file
pub fn run_verify(
    args: &VerifyArgs,
    settings: &Settings,
    mode: OutputMode,
) -> Result<bool, anyhow::Error> {
    let plan = settings.verify.resolve(&VerifyOverrides {
        chain_path: args.chain.clone(),
        remote_csr_path: args.remote_csr.clone(),
        key_path: args.key.clone(),
        csr_path: args.csr.clone(),
        passphrase: args.passphrase.clone(),
    })?;
    tracing::info!(
        "Verifying {} and {} against {} and {}",
        plan.chain_path.display(),
        plan.remote_csr_path.display(),
        plan.key_path.display(),
        plan.csr_path.display()
    );

    let results = vec![
        collect_key_pair(&plan.chain_path, &plan.key_path, plan.passphrase.clone())?,
        collect_csr(&plan.remote_csr_path, &plan.csr_path)?,
    ];
    finish(&results, mode)
}

/// Describe one decoded block for the `blocks` listing
fn block_subject(block: &PemBlock) -> String {
    if block.is_certificate() {
        X509Certificate::from_der(&block.der)
            .map(|(_, cert)| cert.subject().to_string())
            .unwrap_or_else(|e| format!("unparseable: {}", e))
    } else if block.is_csr() {
        X509CertificationRequest::from_der(&block.der)
            .map(|(_, csr)| csr.certification_request_info.subject.to_string())
            .unwrap_or_else(|e| format!("unparseable: {}", e))
    } else {
        String::new()
    }
}

/// Build the block listing TestResult for PEM text
pub fn blocks_result(text: &str, artifact: &str) -> Result<TestResult, VerifyError> {
    let blocks = reader::decode_blocks(text, artifact)?;
    let leaf_index = blocks.iter().position(PemBlock::is_certificate);

    let rows: Vec<Vec<String>> = blocks
        .iter()
        .enumerate()
        .map(|(i, block)| {
            vec![
                (i + 1).to_string(),
                block.label.clone(),
                format!("{} bytes", block.der.len()),
                block_subject(block),
                if Some(i) == leaf_index {
                    "✓ leaf".to_string()
                } else {
                    String::new()
                },
            ]
        })
        .collect();

    let summary = match leaf_index {
        Some(i) => format!("{} block(s); leaf is block {}", blocks.len(), i + 1),
        None => format!("{} block(s); no CERTIFICATE block", blocks.len()),
    };

    let headers = ["#", "Label", "DER", "Subject", "Selected"]
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut result = TestResult::new(
        "PEM Blocks",
        CheckStatus::from_bool(leaf_index.is_some()),
        summary,
    )
    .with_detail(DetailSection::table(None, headers, rows))
    .with_data(serde_json::json!({
        "blocks": blocks
            .iter()
            .map(|b| serde_json::json!({ "label": b.label, "der_len": b.der.len() }))
            .collect::<Vec<_>>(),
        "leaf_index": leaf_index,
    }));

    if let Some(i) = leaf_index {
        result = result.with_detail(DetailSection::text(
            Some("Selected Leaf".to_string()),
            blocks[i].text.clone(),
        ));
    }
    Ok(result)
}

/// Run the `blocks` command
pub fn run_blocks(args: &BlocksArgs, mode: OutputMode) -> Result<bool, anyhow::Error> {
    let artifact = args.file.display().to_string();
    let text = reader::read_text_input(&args.file, &artifact)?;
    let result = blocks_result(&text, &artifact)?;

    // The table is the point of this command
    let mode = match mode {
        OutputMode::Terminal { .. } => OutputMode::Terminal { verbose: true },
        other => other,
    };
    finish(&[result], mode)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn verdict(matches: bool, leaf_is_ca: bool, chain_len: usize) -> KeyPairVerdict {
        KeyPairVerdict {
            matches,
            key_type: "RSA".to_string(),
            certificate_key: "RSA (2048 bits)".to_string(),
            leaf_subject: "CN=test.example.com".to_string(),
            leaf_is_ca,
            chain_len,
        }
    }

    #[test]
    fn test_key_pair_result_status() {
        let key = Path::new("server.key");
        assert_eq!(
            key_pair_result(&verdict(true, false, 2), key).status,
            CheckStatus::Pass
        );
        assert_eq!(
            key_pair_result(&verdict(false, false, 2), key).status,
            CheckStatus::Fail
        );

        let reordered = key_pair_result(&verdict(true, true, 2), key);
        assert_eq!(reordered.status, CheckStatus::Warning);
        assert!(reordered.passed());
        assert!(!reordered.recommendations.is_empty());

        // A lone self-signed CA certificate is not a reordered chain
        assert_eq!(
            key_pair_result(&verdict(true, true, 1), key).status,
            CheckStatus::Pass
        );
    }

    #[test]
    fn test_blocks_result_marks_first_certificate() {
        let chain = include_str!("../../tests/fixtures/chain.pem");
        let key = include_str!("../../tests/fixtures/test-key.pem");
        let text = format!("{}{}", key, chain);

        let result = blocks_result(&text, "mixed").unwrap();
        assert_eq!(result.status, CheckStatus::Pass);
        let data = result.data.unwrap();
        assert_eq!(data["leaf_index"], 1);
        assert_eq!(data["blocks"][0]["label"], "PRIVATE KEY");
    }

    #[test]
    fn test_blocks_result_without_certificate_fails() {
        let csr = include_str!("../../tests/fixtures/test.csr");
        let result = blocks_result(csr, "csr").unwrap();
        assert_eq!(result.status, CheckStatus::Fail);
    }
}
