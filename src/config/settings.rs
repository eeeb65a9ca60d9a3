//! Application settings configuration
//!
//! Paths of the artifacts to verify and TLS probe settings, loaded from TOML.
//! Values given on the command line take precedence over the file.

use crate::cert_ops::reader::is_stdin;
use crate::utils::ConfigError;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Artifact locations for a verification run
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct VerifySettings {
    /// Certificate chain text saved from the page (`-` for stdin)
    pub chain_path: Option<PathBuf>,
    /// CSR text saved from the page (`-` for stdin)
    pub remote_csr_path: Option<PathBuf>,
    /// Local private key
    pub key_path: Option<PathBuf>,
    /// Local CSR
    pub csr_path: Option<PathBuf>,
    /// Name of the environment variable holding the key passphrase
    pub passphrase_env: Option<String>,
}

/// Values supplied on the command line for a verify run
#[derive(Debug, Clone, Default)]
pub struct VerifyOverrides {
    pub chain_path: Option<PathBuf>,
    pub remote_csr_path: Option<PathBuf>,
    pub key_path: Option<PathBuf>,
    pub csr_path: Option<PathBuf>,
    pub passphrase: Option<String>,
}

/// Fully resolved inputs of a verify run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyPlan {
    pub chain_path: PathBuf,
    pub remote_csr_path: PathBuf,
    pub key_path: PathBuf,
    pub csr_path: PathBuf,
    pub passphrase: Option<String>,
}

/// Local key material is always read from a file, never from stdin
pub fn require_local_file(path: &Path, key: &str) -> Result<(), ConfigError> {
    if is_stdin(path) {
        return Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: "local key material must be a file".to_string(),
        });
    }
    Ok(())
}

impl VerifySettings {
    /// Resolve the passphrase: explicit value first, then the configured
    /// environment variable.
    pub fn passphrase_with(
        &self,
        explicit: Option<&str>,
        lookup_env: impl Fn(&str) -> Option<String>,
    ) -> Option<String> {
        if let Some(p) = explicit {
            return Some(p.to_string());
        }
        self.passphrase_env.as_deref().and_then(lookup_env)
    }

    /// Passphrase from `explicit` or the process environment
    pub fn passphrase(&self, explicit: Option<&str>) -> Option<String> {
        self.passphrase_with(explicit, |name| std::env::var(name).ok())
    }

    /// Merge command-line values over these settings and validate the result
    pub fn resolve(&self, overrides: &VerifyOverrides) -> Result<VerifyPlan, ConfigError> {
        self.resolve_with(overrides, |name| std::env::var(name).ok())
    }

    /// Like `resolve`, with an explicit environment lookup.
    ///
    /// Reports every missing value at once, then every input path that does
    /// not exist.
    pub fn resolve_with(
        &self,
        overrides: &VerifyOverrides,
        lookup_env: impl Fn(&str) -> Option<String>,
    ) -> Result<VerifyPlan, ConfigError> {
        let pick = |cli: &Option<PathBuf>, file: &Option<PathBuf>| cli.clone().or(file.clone());

        let chain_path = pick(&overrides.chain_path, &self.chain_path);
        let remote_csr_path = pick(&overrides.remote_csr_path, &self.remote_csr_path);
        let key_path = pick(&overrides.key_path, &self.key_path);
        let csr_path = pick(&overrides.csr_path, &self.csr_path);

        let mut missing = Vec::new();
        for (value, key, flag) in [
            (&chain_path, "verify.chain_path", "--chain"),
            (&remote_csr_path, "verify.remote_csr_path", "--remote-csr"),
            (&key_path, "verify.key_path", "--key"),
            (&csr_path, "verify.csr_path", "--csr"),
        ] {
            if value.is_none() {
                missing.push(format!("{} ({})", key, flag));
            }
        }

        let (Some(chain_path), Some(remote_csr_path), Some(key_path), Some(csr_path)) =
            (chain_path, remote_csr_path, key_path, csr_path)
        else {
            return Err(ConfigError::MissingRequired { keys: missing });
        };

        if is_stdin(&chain_path) && is_stdin(&remote_csr_path) {
            return Err(ConfigError::InvalidValue {
                key: "verify.remote_csr_path".to_string(),
                message: "only one input can be read from stdin".to_string(),
            });
        }

        require_local_file(&key_path, "verify.key_path")?;
        require_local_file(&csr_path, "verify.csr_path")?;

        let not_found: Vec<String> = [&chain_path, &remote_csr_path, &key_path, &csr_path]
            .into_iter()
            .filter(|p| !is_stdin(p) && !p.is_file())
            .map(|p| p.display().to_string())
            .collect();
        if !not_found.is_empty() {
            return Err(ConfigError::InputsNotFound { paths: not_found });
        }

        let passphrase = self.passphrase_with(overrides.passphrase.as_deref(), lookup_env);

        Ok(VerifyPlan {
            chain_path,
            remote_csr_path,
            key_path,
            csr_path,
            passphrase,
        })
    }
}

/// TLS probe settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProbeSettings {
    /// Login page of the portal; its host is probed when none is given
    pub login_url: Option<String>,
    pub port: u16,
    pub connect_timeout_secs: u64,
    pub handshake_timeout_secs: u64,
    /// Extra trust anchors (PEM) added to the Mozilla root set
    pub ca_file: Option<PathBuf>,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            login_url: None,
            port: 443,
            connect_timeout_secs: 10,
            handshake_timeout_secs: 10,
            ca_file: None,
        }
    }
}

impl ProbeSettings {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn handshake_timeout(&self) -> Duration {
        Duration::from_secs(self.handshake_timeout_secs)
    }

    /// Host name of `login_url`, if configured
    pub fn login_host(&self) -> Result<Option<String>, ConfigError> {
        let Some(raw) = self.login_url.as_deref() else {
            return Ok(None);
        };

        let url = url::Url::parse(raw).map_err(|e| ConfigError::InvalidValue {
            key: "probe.login_url".to_string(),
            message: e.to_string(),
        })?;

        url.host_str()
            .map(|h| Some(h.trim_matches(['[', ']']).to_string()))
            .ok_or_else(|| ConfigError::InvalidValue {
                key: "probe.login_url".to_string(),
                message: format!("{} has no host", raw),
            })
    }
}

/// Application settings
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub verify: VerifySettings,
    #[serde(default)]
    pub probe: ProbeSettings,
}

impl Settings {
    /// Load settings from the default config file
    pub fn load_default() -> Result<Self, ConfigError> {
        let config_path = Path::new("config/default.toml");
        if config_path.exists() {
            Self::load_from_file(config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load settings from a specific file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.display().to_string(),
        })?;

        Self::from_toml(&content)
    }

    /// Parse settings from TOML text
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError {
            message: e.to_string(),
        })
    }
}
