//! Profile management command implementations

use crate::cli::{OutputFormat, ProfileCommands};
use crate::connection::ConnectionManager;
use crate::error::{NdbCtlError, Result as CliResult};
use crate::output::{self, print_output};
use colored::Colorize;
use ndbctl_core::config::{Config, CredentialStore, Profile};
use serde_json::json;
use tracing::{debug, trace};

/// Handle profile management commands
pub fn handle_profile_command(
    profile_cmd: &ProfileCommands,
    conn_mgr: &ConnectionManager,
    output_format: OutputFormat,
) -> CliResult<()> {
    let format = output::OutputFormat::from(output_format);

    match profile_cmd {
        ProfileCommands::List => handle_list(conn_mgr, format),
        ProfileCommands::Path => handle_path(conn_mgr, format),
        ProfileCommands::Show { name } => handle_show(conn_mgr, name, format),
        ProfileCommands::Set {
            name,
            url,
            username,
            password,
            insecure,
            default,
            #[cfg(feature = "secure-storage")]
            use_keyring,
        } => {
            #[cfg(feature = "secure-storage")]
            let password = if *use_keyring {
                password
                    .as_deref()
                    .map(|secret| CredentialStore::store_in_keyring(name, secret))
                    .transpose()?
            } else {
                password.clone()
            };
            #[cfg(not(feature = "secure-storage"))]
            let password = password.clone();

            handle_set(conn_mgr, name, url, username, password, *insecure, *default)
        }
        ProfileCommands::Remove { name } => handle_remove(conn_mgr, name),
    }
}

fn config_path_display(conn_mgr: &ConnectionManager) -> Option<String> {
    conn_mgr
        .config_path
        .clone()
        .or_else(|| Config::config_path().ok())
        .map(|p| p.display().to_string())
}

fn profile_summary(name: &str, profile: &Profile, is_default: bool) -> serde_json::Value {
    let password = match profile.password.as_deref() {
        None | Some("") => "not set",
        Some(value) if CredentialStore::is_keyring_reference(value) => "keyring",
        Some(_) => "stored",
    };

    json!({
        "name": name,
        "url": profile.url,
        "username": profile.username,
        "password": password,
        "insecure": profile.insecure,
        "default": is_default,
    })
}

fn handle_list(conn_mgr: &ConnectionManager, format: output::OutputFormat) -> CliResult<()> {
    debug!("Listing all configured profiles");
    let profiles = conn_mgr.config.list_profiles();
    trace!("Found {} profiles", profiles.len());

    if profiles.is_empty() && format.is_table() {
        println!("No profiles configured.");
        println!("Use 'ndbctl profile set' to create a profile.");
        return Ok(());
    }

    let default = conn_mgr.config.default_profile.as_deref();
    let rows: Vec<_> = profiles
        .iter()
        .map(|(name, profile)| profile_summary(name, profile, default == Some(name.as_str())))
        .collect();

    if format.is_table() {
        print_output(&rows, format)?;
        if let Some(path) = config_path_display(conn_mgr) {
            println!("{} {}", "Config:".dimmed(), path);
        }
    } else {
        print_output(
            json!({ "config_path": config_path_display(conn_mgr), "profiles": rows }),
            format,
        )?;
    }
    Ok(())
}

fn handle_path(conn_mgr: &ConnectionManager, format: output::OutputFormat) -> CliResult<()> {
    let config_path = match &conn_mgr.config_path {
        Some(path) => path.clone(),
        None => Config::config_path()?,
    };

    if format.is_table() {
        println!("{}", config_path.display());
    } else {
        print_output(json!({ "config_path": config_path.display().to_string() }), format)?;
    }
    Ok(())
}

fn handle_show(
    conn_mgr: &ConnectionManager,
    name: &str,
    format: output::OutputFormat,
) -> CliResult<()> {
    let profile = conn_mgr.config.profile(name)?;
    let is_default = conn_mgr.config.default_profile.as_deref() == Some(name);

    let mut summary = profile_summary(name, profile, is_default);
    summary["timeouts"] = json!(profile.timeouts);
    if format.is_table() {
        summary["timeouts"] = json!(format!(
            "create {}s, update {}s, delete {}s, poll every {}s",
            profile.timeouts.create_secs,
            profile.timeouts.update_secs,
            profile.timeouts.delete_secs,
            profile.timeouts.poll_interval_secs
        ));
    }
    print_output(summary, format)?;
    Ok(())
}

fn handle_set(
    conn_mgr: &ConnectionManager,
    name: &str,
    url: &str,
    username: &str,
    password: Option<String>,
    insecure: bool,
    make_default: bool,
) -> CliResult<()> {
    debug!("Setting profile: {}", name);
    if url.trim().is_empty() {
        return Err(NdbCtlError::InvalidInput {
            message: "--url must not be empty".to_string(),
        });
    }

    let mut config = conn_mgr.config.clone();

    // Existing wait timings survive a credential update
    let timeouts = config
        .profiles
        .get(name)
        .map(|p| p.timeouts.clone())
        .unwrap_or_default();
    let existed = config.profiles.contains_key(name);

    config.set_profile(
        name.to_string(),
        Profile {
            url: url.to_string(),
            username: username.to_string(),
            password,
            insecure,
            timeouts,
        },
    );
    if make_default || config.profiles.len() == 1 {
        config.default_profile = Some(name.to_string());
    }

    conn_mgr.save_config(&config)?;

    let verb = if existed { "updated" } else { "created" };
    println!("Profile '{}' {} successfully.", name, verb);
    if config.default_profile.as_deref() == Some(name) {
        println!("'{}' is the default profile.", name);
    }
    Ok(())
}

fn handle_remove(conn_mgr: &ConnectionManager, name: &str) -> CliResult<()> {
    debug!("Removing profile: {}", name);

    let mut config = conn_mgr.config.clone();
    let was_default = config.default_profile.as_deref() == Some(name);
    let removed = config
        .remove_profile(name)
        .ok_or_else(|| NdbCtlError::ProfileNotFound {
            name: name.to_string(),
        })?;

    #[cfg(feature = "secure-storage")]
    if let Some(key) = removed
        .password
        .as_deref()
        .and_then(|p| p.strip_prefix(ndbctl_core::config::credential::KEYRING_PREFIX))
    {
        CredentialStore::delete_from_keyring(key)?;
    }
    #[cfg(not(feature = "secure-storage"))]
    let _ = removed;

    conn_mgr.save_config(&config)?;

    println!("Profile '{}' removed successfully.", name);
    if was_default {
        println!("Default profile cleared.");
    }
    Ok(())
}
