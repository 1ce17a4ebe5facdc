//! Layered YAML configuration for the AUDITOR client (§6.3).
//!
//! Follows the same deep-merge + canonicalize + hash shape as the
//! workspace's other layered-config loader: later files in the list
//! override earlier ones, objects merge recursively, and the merged
//! result is hashed so callers can detect drift between runs.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fs;

fn default_timeout() -> u64 {
    10
}
fn default_retries() -> u32 {
    5
}
fn default_num_workers() -> usize {
    1
}
fn default_delay_before_retry() -> u64 {
    5
}
fn default_db_path() -> String {
    "database.db".to_string()
}
fn default_send_interval() -> u64 {
    1
}

/// The option set from §6.3, deserialized straight off the merged YAML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditorSettings {
    pub host: String,
    pub port: u16,

    #[serde(default = "default_timeout")]
    pub timeout: u64,
    #[serde(default = "default_retries")]
    pub retries: u32,
    #[serde(default = "default_num_workers")]
    pub num_workers: usize,
    #[serde(default = "default_delay_before_retry")]
    pub delay_before_retry: u64,
    #[serde(default = "default_db_path")]
    pub db_path: String,

    #[serde(default)]
    pub use_tls: bool,
    #[serde(default)]
    pub ca_cert_path: Option<String>,
    #[serde(default)]
    pub client_cert_path: Option<String>,
    #[serde(default)]
    pub client_key_path: Option<String>,

    #[serde(default = "default_send_interval")]
    pub send_interval: u64,
}

/// The three paths a TLS-enabled transport needs. Only constructed by
/// [`AuditorSettings::tls_settings`], which enforces §4.F's "mismatch ⇒
/// fail-fast" rule: all three paths present, or none.
#[derive(Debug, Clone)]
pub struct TlsSettings {
    pub ca_cert_path: String,
    pub client_cert_path: String,
    pub client_key_path: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    MissingTlsPath(&'static str),
    TlsPathsWithoutUseTls,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::MissingTlsPath(field) => write!(f, "use_tls is set but {field} is missing"),
            ConfigError::TlsPathsWithoutUseTls => write!(f, "TLS cert paths given but use_tls is false"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl AuditorSettings {
    pub fn base_url(&self) -> String {
        let scheme = if self.use_tls { "https" } else { "http" };
        format!("{scheme}://{}:{}", self.host, self.port)
    }

    /// Validates the TLS option group and, if `use_tls` is set, returns the
    /// three resolved paths. A record_id-less mismatch — any subset of the
    /// three paths given without `use_tls`, or `use_tls` set without all
    /// three — is rejected rather than silently falling back to plaintext.
    pub fn tls_settings(&self) -> Result<Option<TlsSettings>, ConfigError> {
        let any_path_given =
            self.ca_cert_path.is_some() || self.client_cert_path.is_some() || self.client_key_path.is_some();

        if !self.use_tls {
            return if any_path_given {
                Err(ConfigError::TlsPathsWithoutUseTls)
            } else {
                Ok(None)
            };
        }

        let ca_cert_path = self.ca_cert_path.clone().ok_or(ConfigError::MissingTlsPath("ca_cert_path"))?;
        let client_cert_path = self
            .client_cert_path
            .clone()
            .ok_or(ConfigError::MissingTlsPath("client_cert_path"))?;
        let client_key_path = self
            .client_key_path
            .clone()
            .ok_or(ConfigError::MissingTlsPath("client_key_path"))?;

        Ok(Some(TlsSettings {
            ca_cert_path,
            client_cert_path,
            client_key_path,
        }))
    }
}

/// Result of [`load_layered_yaml`]: the deserialized settings plus the
/// canonical (sorted-key) JSON form and its hash, for drift detection
/// across restarts.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub settings: AuditorSettings,
    pub canonical_json: String,
    pub config_hash: String,
}

/// Loads and deep-merges YAML files in order (later files override
/// earlier ones), canonicalizes the merged document to a sorted-key JSON
/// string, hashes it, and deserializes into [`AuditorSettings`].
pub fn load_layered_yaml(paths: &[&str]) -> Result<LoadedConfig> {
    if paths.is_empty() {
        bail!("load_layered_yaml requires at least one config path");
    }

    let mut merged = Value::Object(Default::default());
    for path in paths {
        let text = fs::read_to_string(path).with_context(|| format!("read config: {path}"))?;
        let yaml_value: serde_yaml::Value =
            serde_yaml::from_str(&text).with_context(|| format!("parse yaml: {path}"))?;
        let json_value = serde_json::to_value(yaml_value).context("yaml->json conversion failed")?;
        deep_merge(&mut merged, json_value);
    }

    let canonical = canonicalize_json(&merged);

    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    let config_hash = hex::encode(hasher.finalize());

    let settings: AuditorSettings =
        serde_json::from_str(&canonical).context("config does not match the expected option set")?;

    Ok(LoadedConfig {
        settings,
        canonical_json: canonical,
        config_hash,
    })
}

fn deep_merge(dst: &mut Value, src: Value) {
    match (dst, src) {
        (Value::Object(dst_map), Value::Object(src_map)) => {
            for (k, v) in src_map {
                match dst_map.get_mut(&k) {
                    Some(existing) => deep_merge(existing, v),
                    None => {
                        dst_map.insert(k, v);
                    }
                }
            }
        }
        (dst_slot, src_val) => {
            *dst_slot = src_val;
        }
    }
}

fn canonicalize_json(v: &Value) -> String {
    let sorted = sort_keys(v);
    serde_json::to_string(&sorted).expect("json serialization must not fail")
}

fn sort_keys(v: &Value) -> Value {
    match v {
        Value::Object(map) => {
            let mut keys: Vec<_> = map.keys().cloned().collect();
            keys.sort();
            let mut new = serde_json::Map::new();
            for k in keys {
                new.insert(k.clone(), sort_keys(&map[&k]));
            }
            Value::Object(new)
        }
        Value::Array(arr) => Value::Array(arr.iter().map(sort_keys).collect()),
        _ => v.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_yaml(dir: &tempfile::TempDir, name: &str, contents: &str) -> String {
        let path = dir.path().join(name);
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path.to_str().unwrap().to_string()
    }

    #[test]
    fn later_files_override_earlier_ones() {
        let dir = tempfile::tempdir().unwrap();
        let base = write_yaml(&dir, "base.yaml", "host: auditor.example.org\nport: 8000\n");
        let env = write_yaml(&dir, "env.yaml", "port: 8001\nretries: 3\n");

        let loaded = load_layered_yaml(&[&base, &env]).unwrap();
        assert_eq!(loaded.settings.host, "auditor.example.org");
        assert_eq!(loaded.settings.port, 8001);
        assert_eq!(loaded.settings.retries, 3);
    }

    #[test]
    fn defaults_fill_in_unset_options() {
        let dir = tempfile::tempdir().unwrap();
        let base = write_yaml(&dir, "base.yaml", "host: localhost\nport: 8000\n");

        let loaded = load_layered_yaml(&[&base]).unwrap();
        assert_eq!(loaded.settings.timeout, 10);
        assert_eq!(loaded.settings.retries, 5);
        assert_eq!(loaded.settings.num_workers, 1);
        assert_eq!(loaded.settings.delay_before_retry, 5);
        assert_eq!(loaded.settings.db_path, "database.db");
        assert!(!loaded.settings.use_tls);
    }

    #[test]
    fn hash_is_stable_for_identical_merged_content() {
        let dir = tempfile::tempdir().unwrap();
        let base = write_yaml(&dir, "base.yaml", "host: localhost\nport: 8000\n");

        let a = load_layered_yaml(&[&base]).unwrap();
        let b = load_layered_yaml(&[&base]).unwrap();
        assert_eq!(a.config_hash, b.config_hash);
    }

    #[test]
    fn use_tls_without_all_three_paths_is_rejected() {
        let settings = AuditorSettings {
            host: "h".into(),
            port: 1,
            timeout: 10,
            retries: 5,
            num_workers: 1,
            delay_before_retry: 5,
            db_path: "d".into(),
            use_tls: true,
            ca_cert_path: Some("ca.pem".into()),
            client_cert_path: None,
            client_key_path: None,
            send_interval: 1,
        };
        assert!(matches!(
            settings.tls_settings(),
            Err(ConfigError::MissingTlsPath("client_cert_path"))
        ));
    }

    #[test]
    fn tls_paths_without_use_tls_is_rejected() {
        let settings = AuditorSettings {
            host: "h".into(),
            port: 1,
            timeout: 10,
            retries: 5,
            num_workers: 1,
            delay_before_retry: 5,
            db_path: "d".into(),
            use_tls: false,
            ca_cert_path: Some("ca.pem".into()),
            client_cert_path: Some("cert.pem".into()),
            client_key_path: Some("key.pem".into()),
            send_interval: 1,
        };
        assert!(matches!(settings.tls_settings(), Err(ConfigError::TlsPathsWithoutUseTls)));
    }

    #[test]
    fn fully_specified_tls_resolves() {
        let settings = AuditorSettings {
            host: "h".into(),
            port: 1,
            timeout: 10,
            retries: 5,
            num_workers: 1,
            delay_before_retry: 5,
            db_path: "d".into(),
            use_tls: true,
            ca_cert_path: Some("ca.pem".into()),
            client_cert_path: Some("cert.pem".into()),
            client_key_path: Some("key.pem".into()),
            send_interval: 1,
        };
        let tls = settings.tls_settings().unwrap().unwrap();
        assert_eq!(tls.ca_cert_path, "ca.pem");
    }
}
