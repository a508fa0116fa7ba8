//! Utilities shared by the SACCO portal crates: configuration, bearer-token
//! storage, request path templating, and log redaction.

pub mod config;
pub mod http_path_resolution;
pub mod keystore;
mod path_processing;

pub use config::{API_BASE_ENV, CONFIG_PATH_ENV, ConfigError, PortalConfig, default_config_path};
pub use keystore::{
    KeychainTokenStore, KeystoreError, MemoryTokenStore, SECRETS_BACKEND_ENV_VAR, SecretsBackend, TOKEN_ENV_VAR, TokenStore,
    secrets_backend, token_store_for,
};
pub use path_processing::expand_tilde;

use once_cell::sync::Lazy;
use regex::Regex;

static SENSITIVE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)(authorization: (?:bearer )?)([\w\-\.=:/+]+)",
        r"(?i)([A-Z0-9_]*?(?:KEY|TOKEN|SECRET|PASSWORD)=)([^\s]+)",
        r#"(?i)("(?:password|token|accessToken)"\s*:\s*)("[^"]*")"#,
    ]
    .iter()
    .filter_map(|pattern| Regex::new(pattern).ok())
    .collect()
});

/// Redacts values that look like secrets in a string.
pub fn redact_sensitive(input: &str) -> String {
    let mut redacted = input.to_string();
    for pattern in SENSITIVE_PATTERNS.iter() {
        redacted = pattern
            .replace_all(&redacted, |caps: &regex::Captures| {
                let prefix = caps.get(1).map(|m| m.as_str()).unwrap_or("");
                format!("{}<redacted>", prefix)
            })
            .to_string();
    }
    redacted
}
