//! Credential resolution for profile secrets
//!
//! A profile value is resolved in this order:
//! 1. the named environment variable, when the caller allows it
//! 2. `keyring:<key>` references, looked up in the OS keyring
//!    (`secure-storage` feature)
//! 3. the value itself, as plaintext

use super::error::{ConfigError, Result};
use std::env;

/// Prefix that marks a value as a keyring reference
pub const KEYRING_PREFIX: &str = "keyring:";

/// Service name for keyring entries
#[cfg(feature = "secure-storage")]
const SERVICE_NAME: &str = "ndbctl";

/// Resolves and stores profile secrets
#[derive(Debug, Clone, Default)]
pub struct CredentialStore {
    use_env: bool,
}

impl CredentialStore {
    /// Store that consults environment variables first
    pub fn new() -> Self {
        Self { use_env: true }
    }

    /// Store that ignores the environment, for explicit config files
    pub fn without_env() -> Self {
        Self { use_env: false }
    }

    /// Check if a value is a keyring reference
    pub fn is_keyring_reference(value: &str) -> bool {
        value.starts_with(KEYRING_PREFIX)
    }

    /// Resolve a configured value
    pub fn resolve(&self, value: &str, env_var: Option<&str>) -> Result<String> {
        if self.use_env
            && let Some(var) = env_var
            && let Ok(env_value) = env::var(var)
        {
            return Ok(env_value);
        }

        if let Some(key) = value.strip_prefix(KEYRING_PREFIX) {
            return Self::read_keyring(key);
        }

        Ok(value.to_string())
    }

    #[cfg(feature = "secure-storage")]
    fn read_keyring(key: &str) -> Result<String> {
        let entry = keyring::Entry::new(SERVICE_NAME, key)
            .map_err(|e| ConfigError::KeyringError(e.to_string()))?;
        entry.get_password().map_err(|e| {
            ConfigError::KeyringError(format!(
                "Failed to retrieve credential '{}' from keyring: {}",
                key, e
            ))
        })
    }

    #[cfg(not(feature = "secure-storage"))]
    fn read_keyring(key: &str) -> Result<String> {
        Err(ConfigError::CredentialError(format!(
            "'{}' references the keyring but the secure-storage feature is not enabled",
            key
        )))
    }

    /// Store a secret in the keyring and return the reference to put in the config
    #[cfg(feature = "secure-storage")]
    pub fn store_in_keyring(key: &str, secret: &str) -> Result<String> {
        let entry = keyring::Entry::new(SERVICE_NAME, key)
            .map_err(|e| ConfigError::KeyringError(e.to_string()))?;
        entry.set_password(secret).map_err(|e| {
            ConfigError::KeyringError(format!("Failed to store credential in keyring: {}", e))
        })?;
        Ok(format!("{}{}", KEYRING_PREFIX, key))
    }

    /// Remove a keyring entry; missing entries are not an error
    #[cfg(feature = "secure-storage")]
    pub fn delete_from_keyring(key: &str) -> Result<()> {
        let entry = keyring::Entry::new(SERVICE_NAME, key)
            .map_err(|e| ConfigError::KeyringError(e.to_string()))?;
        match entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(ConfigError::KeyringError(format!(
                "Failed to delete credential from keyring: {}",
                e
            ))),
        }
    }
}
