//! DB server command implementations

use std::path::Path;

use ndbctl_core::config::config::Action;
use ndbctl_core::params::{DbServerConfig, DeleteDbServerParams, TagConfig, UpdateDbServerParams};
use ndbctl_core::{
    NdbApi, ResourceState, create_dbserver_and_wait, delete_dbserver_and_wait, read_dbserver,
    update_dbserver,
};
use serde_json::json;
use tracing::{debug, info};

use crate::cli::{DbServerCommands, OutputFormat};
use crate::commands::wait::OperationSpinner;
use crate::connection::ConnectionManager;
use crate::error::{NdbCtlError, Result as CliResult};
use crate::output::{self, print_output};

pub async fn handle_dbserver_command(
    cmd: &DbServerCommands,
    conn_mgr: &ConnectionManager,
    profile: Option<&str>,
    output_format: OutputFormat,
) -> CliResult<()> {
    let format = output::OutputFormat::from(output_format);

    match cmd {
        DbServerCommands::Create { file, wait } => {
            // A bad file is reported before any credential prompt
            let config = load_dbserver_config(Path::new(file))?;
            config.validate()?;
            let client = conn_mgr.create_client(profile)?;
            if wait.no_wait {
                return submit_create(&client, &config, format).await;
            }

            let wait_opts =
                conn_mgr.wait_options(profile, Action::Create, wait.timeout, wait.interval);
            let spinner = OperationSpinner::start("Provisioning DB server", format.is_table());
            let mut state = ResourceState::new();
            let result = create_dbserver_and_wait(
                &client,
                &config,
                &mut state,
                wait_opts,
                Some(spinner.callback()),
            )
            .await;
            spinner.finish();

            if let Err(e) = result {
                if let Some(id) = state.id() {
                    eprintln!("DB server {} was registered before the failure", id);
                }
                return Err(e.into());
            }
            print_output(&state, format)?;
            Ok(())
        }

        DbServerCommands::Get { id } => {
            let client = conn_mgr.create_client(profile)?;
            let mut state = ResourceState::new();
            read_dbserver(&client, id, &mut state).await?;
            print_output(&state, format)?;
            Ok(())
        }

        DbServerCommands::Update {
            id,
            name,
            description,
            tags,
        } => {
            let mut params = UpdateDbServerParams::new();
            if let Some(name) = name {
                params = params.with_name(name);
            }
            if let Some(description) = description {
                params = params.with_description(description);
            }
            if !tags.is_empty() {
                params = params.with_tags(parse_tags(tags)?);
            }
            if params.is_empty() {
                return Err(NdbCtlError::InvalidInput {
                    message: "nothing to update; pass --name, --description or --tag".to_string(),
                });
            }

            let client = conn_mgr.create_client(profile)?;
            let mut state = ResourceState::new();
            state.set_id(id.as_str());
            match update_dbserver(&client, id, params, &mut state).await? {
                Some(_) => print_output(&state, format)?,
                None if format.is_table() => println!("DB server {} updated", id),
                None => print_output(json!({ "id": id, "updated": true }), format)?,
            }
            Ok(())
        }

        DbServerCommands::Delete {
            id,
            remove_only,
            soft_remove,
            keep_vgs,
            keep_snapshots,
            wait,
        } => {
            let mut params = DeleteDbServerParams::new()
                .with_soft_remove(*soft_remove)
                .with_delete_vgs(!keep_vgs)
                .with_delete_vm_snapshots(!keep_snapshots);
            if *remove_only {
                params = params.remove_only();
            }
            let client = conn_mgr.create_client(profile)?;

            if wait.no_wait {
                let handle = client.delete_dbserver(&params.into_request(), id).await?;
                print_handle("Deletion", &handle, format)?;
                return Ok(());
            }

            let wait_opts =
                conn_mgr.wait_options(profile, Action::Delete, wait.timeout, wait.interval);
            let spinner = OperationSpinner::start("Deleting DB server", format.is_table());
            let mut state = ResourceState::new();
            state.set_id(id.as_str());
            let result = delete_dbserver_and_wait(
                &client,
                id,
                params,
                &mut state,
                wait_opts,
                Some(spinner.callback()),
            )
            .await;
            spinner.finish();
            result?;

            if format.is_table() {
                println!("DB server {} deleted", id);
            } else {
                print_output(json!({ "id": id, "deleted": true }), format)?;
            }
            Ok(())
        }
    }
}

/// Submit a provisioning request without waiting on it
async fn submit_create<A: NdbApi + ?Sized>(
    api: &A,
    config: &DbServerConfig,
    format: output::OutputFormat,
) -> CliResult<()> {
    let request = config.to_request()?;
    let handle = api.create_dbserver(&request).await?;
    info!(
        "provisioning of db server {} submitted as operation {}",
        handle.entity_id, handle.operation_id
    );
    print_handle("Provisioning", &handle, format)
}

fn print_handle(
    action: &str,
    handle: &ndbctl_core::models::OperationHandle,
    format: output::OutputFormat,
) -> CliResult<()> {
    if format.is_table() {
        println!("{} of DB server {} started", action, handle.entity_id);
        println!("Operation ID: {}", handle.operation_id);
        println!(
            "To wait for completion, run: ndbctl operation wait {}",
            handle.operation_id
        );
    } else {
        print_output(handle, format)?;
    }
    Ok(())
}

/// Read a DB server configuration file, choosing the format by extension
pub fn load_dbserver_config(path: &Path) -> CliResult<DbServerConfig> {
    let file_error = |message: String| NdbCtlError::FileError {
        path: path.display().to_string(),
        message,
    };

    let content = std::fs::read_to_string(path).map_err(|e| file_error(e.to_string()))?;
    debug!("Loaded {} bytes from {}", content.len(), path.display());

    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => serde_json::from_str(&content).map_err(|e| file_error(e.to_string())),
        Some("yaml") | Some("yml") => {
            serde_yaml::from_str(&content).map_err(|e| file_error(e.to_string()))
        }
        _ => toml::from_str(&content).map_err(|e| file_error(e.to_string())),
    }
}

/// Parse `TAG_ID=VALUE` pairs
pub fn parse_tags(raw: &[String]) -> CliResult<Vec<TagConfig>> {
    raw.iter()
        .map(|pair| {
            let (tag_id, value) = pair
                .split_once('=')
                .ok_or_else(|| NdbCtlError::InvalidInput {
                    message: format!("tag '{}' must look like TAG_ID=VALUE", pair),
                })?;
            if tag_id.is_empty() {
                return Err(NdbCtlError::InvalidInput {
                    message: format!("tag '{}' has an empty tag id", pair),
                });
            }
            Ok(TagConfig {
                tag_id: tag_id.to_string(),
                tag_name: None,
                value: value.to_string(),
            })
        })
        .collect()
}
