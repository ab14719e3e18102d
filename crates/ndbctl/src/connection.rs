//! Connection management for NDB clients

use crate::error::{NdbCtlError, Result as CliResult};
use ndbctl_core::NdbClient;
use ndbctl_core::WaitOptions;
use ndbctl_core::config::config::Action;
use ndbctl_core::config::{Config, CredentialStore, Profile, ResolvedCredentials, Timeouts};
use std::path::PathBuf;
use tracing::{debug, info, trace};

/// Connection manager for creating authenticated clients
#[derive(Clone)]
pub struct ConnectionManager {
    pub config: Config,
    pub config_path: Option<PathBuf>,
}

impl ConnectionManager {
    /// Create a new connection manager with a custom config path
    pub fn with_config_path(config: Config, config_path: Option<PathBuf>) -> Self {
        Self {
            config,
            config_path,
        }
    }

    /// Save the configuration to the appropriate location
    pub fn save_config(&self, config: &Config) -> CliResult<()> {
        match &self.config_path {
            Some(path) => config.save_to_path(path)?,
            None => config.save()?,
        }
        Ok(())
    }

    /// When --config-file is explicitly specified, environment variables are ignored
    fn credential_store(&self) -> CredentialStore {
        if self.config_path.is_some() {
            info!("--config-file specified explicitly, ignoring environment variables");
            CredentialStore::without_env()
        } else {
            CredentialStore::new()
        }
    }

    fn profile(&self, profile_name: Option<&str>) -> CliResult<(String, Option<&Profile>)> {
        match self.config.resolve_profile(profile_name) {
            Ok(name) => {
                let profile = self.config.profile(&name)?;
                Ok((name, Some(profile)))
            }
            // Environment-only setups need no profile at all
            Err(_) if self.config_path.is_none() && std::env::var("NDB_URL").is_ok() => {
                Ok(("<environment>".to_string(), None))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn resolve_credentials(&self, profile_name: Option<&str>) -> CliResult<ResolvedCredentials> {
        let (name, profile) = self.profile(profile_name)?;
        info!("Using NDB profile: {}", name);

        let store = self.credential_store();
        let env_only;
        let profile = match profile {
            Some(profile) => profile,
            None => {
                env_only = Profile::new("", "");
                &env_only
            }
        };

        let mut resolved = profile.resolve_credentials(&store)?;
        if resolved.url.is_empty() || resolved.username.is_empty() {
            return Err(NdbCtlError::MissingCredentials { name });
        }

        if resolved.password.is_none() {
            debug!("No password configured for '{}', prompting", name);
            let prompt = format!("NDB password for {}@{}: ", resolved.username, resolved.url);
            let password =
                rpassword::prompt_password(prompt).map_err(|_| NdbCtlError::MissingCredentials {
                    name: name.clone(),
                })?;
            resolved.password = Some(password);
        }

        trace!("Resolved credentials: {:?}", resolved);
        Ok(resolved)
    }

    /// Create an NDB client from profile credentials with environment variable override support
    pub fn create_client(&self, profile_name: Option<&str>) -> CliResult<NdbClient> {
        debug!("Creating NDB client");
        let creds = self.resolve_credentials(profile_name)?;
        let update_timeout = self
            .profile_timeouts(profile_name)
            .wait_for(Action::Update)
            .timeout;

        let client = NdbClient::builder(
            &creds.url,
            &creds.username,
            creds.password.unwrap_or_default(),
        )
        .insecure(creds.insecure)
        .update_timeout(update_timeout)
        .build()?;

        debug!("NDB client created for {}", client.base_url());
        Ok(client)
    }

    /// Wait timing for an action, with per-command overrides applied
    pub fn wait_options(
        &self,
        profile_name: Option<&str>,
        action: Action,
        timeout_secs: Option<u64>,
        interval_secs: Option<u64>,
    ) -> WaitOptions {
        let mut timeouts = self.profile_timeouts(profile_name);

        if let Some(secs) = timeout_secs {
            timeouts.set(action, secs);
        }
        if let Some(secs) = interval_secs {
            timeouts.poll_interval_secs = secs;
        }
        timeouts.wait_for(action)
    }

    fn profile_timeouts(&self, profile_name: Option<&str>) -> Timeouts {
        self.profile(profile_name)
            .ok()
            .and_then(|(_, profile)| profile.map(|p| p.timeouts.clone()))
            .unwrap_or_default()
    }
}
