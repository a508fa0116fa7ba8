//! Bearer-token storage.
//!
//! The session token is the only state the portal client persists. It lives
//! in the OS keychain (`keyring-rs`) by default; setting
//! `SACCO_SECRETS_BACKEND=env` reads it from `SACCO_TOKEN` instead and keeps
//! any later changes in memory, which keeps CI usage keychain-free.

use std::fmt;
use std::sync::{Arc, Mutex};

use thiserror::Error;
use tracing::{debug, warn};

static SERVICE: &str = "sacco-portal";

/// Environment variable used to select the secret resolution backend.
pub const SECRETS_BACKEND_ENV_VAR: &str = "SACCO_SECRETS_BACKEND";

/// Environment variable holding the token when the env backend is selected.
pub const TOKEN_ENV_VAR: &str = "SACCO_TOKEN";

/// Secret resolution backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretsBackend {
    Keychain,
    Environment,
}

impl SecretsBackend {
    fn from_env_var(raw: Option<String>) -> Self {
        match raw.unwrap_or_default().trim().to_ascii_lowercase().as_str() {
            "env" => Self::Environment,
            _ => Self::Keychain,
        }
    }
}

/// Determine the currently configured secrets backend.
pub fn secrets_backend() -> SecretsBackend {
    let configured_value = std::env::var(SECRETS_BACKEND_ENV_VAR).ok();
    SecretsBackend::from_env_var(configured_value)
}

#[derive(Debug, Error, Clone)]
pub enum KeystoreError {
    #[error("Keyring error for {account}: {error}")]
    Keyring { account: String, error: String },
    #[error("Token store lock poisoned")]
    Poisoned,
}

/// Storage for the bearer token attached to authenticated requests.
pub trait TokenStore: Send + Sync + fmt::Debug {
    fn load(&self) -> Result<Option<String>, KeystoreError>;
    fn store(&self, token: &str) -> Result<(), KeystoreError>;
    fn clear(&self) -> Result<(), KeystoreError>;
}

/// Token kept in the OS keychain under an account derived from the API base URL.
#[derive(Debug, Clone)]
pub struct KeychainTokenStore {
    account: String,
}

impl KeychainTokenStore {
    pub fn new(account: impl Into<String>) -> Self {
        Self { account: account.into() }
    }

    fn entry(&self) -> Result<keyring::Entry, KeystoreError> {
        keyring::Entry::new(SERVICE, &self.account).map_err(|error| KeystoreError::Keyring {
            account: self.account.clone(),
            error: error.to_string(),
        })
    }
}

impl TokenStore for KeychainTokenStore {
    fn load(&self) -> Result<Option<String>, KeystoreError> {
        match self.entry()?.get_password() {
            Ok(token) => Ok(Some(token)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(error) => {
                warn!(account = %self.account, "keyring error: {}", error);
                Err(KeystoreError::Keyring {
                    account: self.account.clone(),
                    error: error.to_string(),
                })
            }
        }
    }

    fn store(&self, token: &str) -> Result<(), KeystoreError> {
        self.entry()?.set_password(token).map_err(|error| KeystoreError::Keyring {
            account: self.account.clone(),
            error: error.to_string(),
        })?;
        debug!(account = %self.account, "Stored session token in keychain");
        Ok(())
    }

    fn clear(&self) -> Result<(), KeystoreError> {
        match self.entry()?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => {
                debug!(account = %self.account, "Removed session token from keychain");
                Ok(())
            }
            Err(error) => Err(KeystoreError::Keyring {
                account: self.account.clone(),
                error: error.to_string(),
            }),
        }
    }
}

/// Process-local token; backs the env backend and tests.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new(initial: Option<String>) -> Self {
        Self {
            token: Mutex::new(initial),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<String>, KeystoreError> {
        Ok(self.token.lock().map_err(|_| KeystoreError::Poisoned)?.clone())
    }

    fn store(&self, token: &str) -> Result<(), KeystoreError> {
        *self.token.lock().map_err(|_| KeystoreError::Poisoned)? = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<(), KeystoreError> {
        *self.token.lock().map_err(|_| KeystoreError::Poisoned)? = None;
        Ok(())
    }
}

/// Token store for the configured backend, scoped to one API base URL.
pub fn token_store_for(base_url: &str) -> Arc<dyn TokenStore> {
    match secrets_backend() {
        SecretsBackend::Environment => {
            let initial = std::env::var(TOKEN_ENV_VAR).ok().filter(|token| !token.trim().is_empty());
            Arc::new(MemoryTokenStore::new(initial))
        }
        SecretsBackend::Keychain => Arc::new(KeychainTokenStore::new(base_url.trim_end_matches('/'))),
    }
}
