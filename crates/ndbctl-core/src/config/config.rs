//! Profile configuration for NDB endpoints
//!
//! Configuration is stored in TOML with support for multiple named profiles.
//! Each profile carries the endpoint, its credentials and the wait timings
//! used by the create, update and delete actions.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::credential::CredentialStore;
use super::error::{ConfigError, Result};
use crate::progress::{DEFAULT_POLL_INTERVAL, DEFAULT_TIMEOUT};
use crate::workflows::WaitOptions;

/// Environment variable overriding a profile's URL
pub const ENV_URL: &str = "NDB_URL";
/// Environment variable overriding a profile's username
pub const ENV_USERNAME: &str = "NDB_USERNAME";
/// Environment variable overriding a profile's password
pub const ENV_PASSWORD: &str = "NDB_PASSWORD";

/// Smallest timeout or poll interval honoured, in seconds
pub const MIN_WAIT_SECS: u64 = 1;

/// Main configuration structure
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct Config {
    /// Profile used when none is named on the command line
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_profile: Option<String>,
    /// Map of profile name -> profile configuration
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

/// One NDB endpoint
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Profile {
    /// Base URL of the NDB server, without the API path
    pub url: String,
    pub username: String,
    /// Optional for interactive prompting; supports the `keyring:` prefix
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Skip TLS certificate verification
    #[serde(default)]
    pub insecure: bool,
    #[serde(default)]
    pub timeouts: Timeouts,
}

/// Lifecycle action a timeout applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Create,
    Update,
    Delete,
}

/// Per-action wait deadlines, in seconds
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Timeouts {
    pub create_secs: u64,
    pub update_secs: u64,
    pub delete_secs: u64,
    pub poll_interval_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        let timeout = DEFAULT_TIMEOUT.as_secs();
        Self {
            create_secs: timeout,
            update_secs: timeout,
            delete_secs: timeout,
            poll_interval_secs: DEFAULT_POLL_INTERVAL.as_secs(),
        }
    }
}

impl Timeouts {
    /// Override the deadline of one lifecycle action
    pub fn set(&mut self, action: Action, secs: u64) {
        match action {
            Action::Create => self.create_secs = secs,
            Action::Update => self.update_secs = secs,
            Action::Delete => self.delete_secs = secs,
        }
    }

    /// Wait options for one lifecycle action
    ///
    /// Zero values are raised to one second so a wait never spins on the
    /// API or expires before its first fetch.
    pub fn wait_for(&self, action: Action) -> WaitOptions {
        let secs = match action {
            Action::Create => self.create_secs,
            Action::Update => self.update_secs,
            Action::Delete => self.delete_secs,
        };
        WaitOptions::new(
            Duration::from_secs(secs.max(MIN_WAIT_SECS)),
            Duration::from_secs(self.poll_interval_secs.max(MIN_WAIT_SECS)),
        )
    }
}

/// Connection details with all indirections resolved
#[derive(Clone, PartialEq)]
pub struct ResolvedCredentials {
    pub url: String,
    pub username: String,
    pub password: Option<String>,
    pub insecure: bool,
}

impl std::fmt::Debug for ResolvedCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedCredentials")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("insecure", &self.insecure)
            .finish()
    }
}

impl Profile {
    pub fn new(url: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            username: username.into(),
            password: None,
            insecure: false,
            timeouts: Timeouts::default(),
        }
    }

    /// Returns true if the profile has a stored password
    pub fn has_password(&self) -> bool {
        self.password.as_deref().is_some_and(|p| !p.is_empty())
    }

    /// Resolve environment overrides and keyring references
    pub fn resolve_credentials(&self, store: &CredentialStore) -> Result<ResolvedCredentials> {
        let url = store.resolve(&self.url, Some(ENV_URL))?;
        let username = store.resolve(&self.username, Some(ENV_USERNAME))?;
        let password = match &self.password {
            Some(value) => Some(store.resolve(value, Some(ENV_PASSWORD))?),
            None => store.resolve("", Some(ENV_PASSWORD)).ok().filter(|p| !p.is_empty()),
        };

        Ok(ResolvedCredentials {
            url,
            username,
            password,
            insecure: self.insecure,
        })
    }
}

impl Config {
    /// Resolve the profile name to use
    ///
    /// An explicit name wins, then `default_profile`, then the alphabetically
    /// first profile.
    pub fn resolve_profile(&self, explicit_profile: Option<&str>) -> Result<String> {
        if let Some(profile_name) = explicit_profile {
            return Ok(profile_name.to_string());
        }

        if let Some(ref default) = self.default_profile {
            return Ok(default.clone());
        }

        self.profiles
            .keys()
            .min()
            .cloned()
            .ok_or_else(|| ConfigError::NoProfiles {
                suggestion: "Use 'ndbctl profile set' to create a profile.".to_string(),
            })
    }

    /// Look up a profile by name
    pub fn profile(&self, name: &str) -> Result<&Profile> {
        self.profiles
            .get(name)
            .ok_or_else(|| ConfigError::ProfileNotFound {
                name: name.to_string(),
            })
    }

    /// Load configuration from the standard location
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        Self::load_from_path(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(config_path).map_err(|e| ConfigError::LoadError {
            path: config_path.display().to_string(),
            source: e,
        })?;

        let expanded_content = Self::expand_env_vars(&content);
        let config: Config = toml::from_str(&expanded_content)?;

        Ok(config)
    }

    /// Save configuration to the standard location
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;
        self.save_to_path(&config_path)
    }

    /// Save configuration to a specific path
    pub fn save_to_path(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::SaveError {
                path: parent.display().to_string(),
                source: e,
            })?;
        }

        let content = toml::to_string_pretty(self)?;

        fs::write(config_path, content).map_err(|e| ConfigError::SaveError {
            path: config_path.display().to_string(),
            source: e,
        })?;

        Ok(())
    }

    /// Set or update a profile
    pub fn set_profile(&mut self, name: String, profile: Profile) {
        self.profiles.insert(name, profile);
    }

    /// Remove a profile by name, clearing the default if it pointed there
    pub fn remove_profile(&mut self, name: &str) -> Option<Profile> {
        if self.default_profile.as_deref() == Some(name) {
            self.default_profile = None;
        }
        self.profiles.remove(name)
    }

    /// List all profiles sorted by name
    pub fn list_profiles(&self) -> Vec<(&String, &Profile)> {
        let mut profiles: Vec<_> = self.profiles.iter().collect();
        profiles.sort_by_key(|(name, _)| *name);
        profiles
    }

    /// Get the path to the configuration file
    ///
    /// On Linux: ~/.config/ndbctl/config.toml
    /// On macOS: ~/Library/Application Support/com.ndbctl.ndbctl/config.toml
    /// On Windows: %APPDATA%\ndbctl\ndbctl\config\config.toml
    pub fn config_path() -> Result<PathBuf> {
        let proj_dirs =
            ProjectDirs::from("com", "ndbctl", "ndbctl").ok_or(ConfigError::ConfigDirError)?;

        Ok(proj_dirs.config_dir().join("config.toml"))
    }

    /// Expand `${VAR}` and `${VAR:-default}` references
    ///
    /// Unset variables without a default are left as written.
    fn expand_env_vars(content: &str) -> String {
        shellexpand::env_with_context_no_errors(content, |var| std::env::var(var).ok())
            .to_string()
    }
}
