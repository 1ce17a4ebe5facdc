use crate::error::ClientError;
use std::fs;

/// The three paths a TLS-enabled transport needs (§4.F, §6.3). Kept free of
/// any particular config-file format — `auditor-config` maps its YAML
/// options onto this shape; callers that don't want YAML can build it
/// directly.
#[derive(Debug, Clone)]
pub struct TlsPaths {
    pub ca_cert_path: String,
    pub client_cert_path: String,
    pub client_key_path: String,
}

/// Applies `paths` to a `reqwest::ClientBuilder`. Reads all three files
/// eagerly so a bad path fails at `start()`/`build()` rather than on the
/// first request (§4.F: "mismatch ⇒ fail-fast at start()").
pub fn apply_tls(builder: reqwest::ClientBuilder, paths: &TlsPaths) -> Result<reqwest::ClientBuilder, ClientError> {
    let ca_pem = fs::read(&paths.ca_cert_path)
        .map_err(|e| ClientError::Configuration(format!("reading ca_cert_path: {e}")))?;
    let ca_cert = reqwest::Certificate::from_pem(&ca_pem)
        .map_err(|e| ClientError::Configuration(format!("parsing ca_cert_path: {e}")))?;

    let mut identity_pem = fs::read(&paths.client_cert_path)
        .map_err(|e| ClientError::Configuration(format!("reading client_cert_path: {e}")))?;
    let mut key_pem = fs::read(&paths.client_key_path)
        .map_err(|e| ClientError::Configuration(format!("reading client_key_path: {e}")))?;
    identity_pem.push(b'\n');
    identity_pem.append(&mut key_pem);
    let identity = reqwest::Identity::from_pem(&identity_pem)
        .map_err(|e| ClientError::Configuration(format!("parsing client cert/key: {e}")))?;

    Ok(builder.add_root_certificate(ca_cert).identity(identity).use_rustls_tls())
}
