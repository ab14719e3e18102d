//! DB server lifecycle workflows
//!
//! These compose the request builders, the API calls, the operation poller
//! and the flattener into the four lifecycle actions. Create and delete are
//! asynchronous server-side and block until the operation finishes; read
//! and update are single calls.

use serde_json::json;
use std::time::Duration;
use tracing::{debug, info};

use crate::client::{NdbApi, OperationSource};
use crate::error::{CoreError, Result};
use crate::flatten::{ResourceState, StateWriter, flatten_dbserver};
use crate::models::DbServer;
use crate::params::{DbServerConfig, DeleteDbServerParams, UpdateDbServerParams};
use crate::progress::{PollRequest, PollResult, ProgressCallback, poll_operation};

/// Deadline and polling cadence for one wait
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaitOptions {
    pub timeout: Duration,
    pub interval: Duration,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout: crate::progress::DEFAULT_TIMEOUT,
            interval: crate::progress::DEFAULT_POLL_INTERVAL,
        }
    }
}

impl WaitOptions {
    #[must_use]
    pub fn new(timeout: Duration, interval: Duration) -> Self {
        Self { timeout, interval }
    }

    fn poll_request(&self, operation_id: &str, entity_id: &str) -> PollRequest {
        PollRequest::new(operation_id)
            .for_entity(entity_id)
            .with_delay(self.interval)
            .with_timeout(self.timeout)
    }
}

/// Provision a DB server VM and wait for it to come up
///
/// This workflow:
/// 1. Builds and validates the provisioning request
/// 2. Submits it and records the new entity id in `state`
/// 3. Polls the returned operation until it finishes
/// 4. Reads the server back and flattens it into `state`
///
/// The id is recorded before waiting, so a failed or timed-out wait still
/// leaves `state` pointing at the half-built server.
///
/// # Example
///
/// ```rust,ignore
/// use ndbctl_core::params::DbServerConfig;
/// use ndbctl_core::{ResourceState, WaitOptions, create_dbserver_and_wait};
///
/// let config = DbServerConfig::new("postgres_database", "np", "cp", "cluster", "pw")
///     .with_time_machine("tm-1");
/// let mut state = ResourceState::new();
///
/// let wait = WaitOptions::default();
/// let server = create_dbserver_and_wait(&client, &config, &mut state, wait, None).await?;
/// println!("created {}", server.id);
/// ```
pub async fn create_dbserver_and_wait<A>(
    api: &A,
    config: &DbServerConfig,
    state: &mut ResourceState,
    wait: WaitOptions,
    on_progress: Option<ProgressCallback>,
) -> Result<DbServer>
where
    A: NdbApi + ?Sized,
{
    let request = config.to_request()?;

    let handle = api.create_dbserver(&request).await?;
    state.set_id(handle.entity_id.clone());

    if handle.operation_id.is_empty() {
        return Err(CoreError::MissingOperationId {
            action: format!("creating db server {}", handle.entity_id),
        });
    }

    poll_operation(
        api,
        &wait.poll_request(&handle.operation_id, &handle.entity_id),
        on_progress,
    )
    .await?
    .into_completed()?;

    info!(
        "NDB database server VM with {} id is created successfully",
        handle.entity_id
    );
    read_dbserver(api, &handle.entity_id, state).await
}

/// Read a DB server and flatten it into `state`
pub async fn read_dbserver<A>(api: &A, id: &str, state: &mut ResourceState) -> Result<DbServer>
where
    A: NdbApi + ?Sized,
{
    let server = api.read_dbserver(id).await?;
    state.set_id(id);
    flatten_dbserver(&server, state)?;
    debug!("read db server {}", id);
    Ok(server)
}

/// Update the mutable attributes of a DB server
///
/// Empty params are not sent. When the service echoes the server back, its
/// name and description are written into `state`.
pub async fn update_dbserver<A>(
    api: &A,
    id: &str,
    params: UpdateDbServerParams,
    state: &mut ResourceState,
) -> Result<Option<DbServer>>
where
    A: NdbApi + ?Sized,
{
    if params.is_empty() {
        debug!("no changes for db server {}", id);
        return Ok(None);
    }

    let response = api.update_dbserver(&params.into_request(), id).await?;
    if let Some(server) = &response {
        state.set("description", json!(server.description))?;
        state.set("name", json!(server.name))?;
    }

    info!("NDB database server with {} id updated successfully", id);
    Ok(response)
}

/// Delete a DB server VM and wait for completion
///
/// On success the stored identity in `state` is cleared.
pub async fn delete_dbserver_and_wait<A>(
    api: &A,
    id: &str,
    params: DeleteDbServerParams,
    state: &mut ResourceState,
    wait: WaitOptions,
    on_progress: Option<ProgressCallback>,
) -> Result<()>
where
    A: NdbApi + ?Sized,
{
    let handle = api.delete_dbserver(&params.into_request(), id).await?;
    info!(
        "Operation to delete dbserver vm with id {} has started, operation id: {}",
        id, handle.operation_id
    );

    if handle.operation_id.is_empty() {
        return Err(CoreError::MissingOperationId {
            action: format!("deleting db server {}", id),
        });
    }

    poll_operation(
        api,
        &wait.poll_request(&handle.operation_id, id),
        on_progress,
    )
    .await?
    .into_completed()?;

    state.clear();
    info!("NDB database server VM with {} id is deleted successfully", id);
    Ok(())
}

/// Wait on an arbitrary operation without escalating FAILED
pub async fn wait_for_operation<A>(
    api: &A,
    operation_id: &str,
    wait: WaitOptions,
    on_progress: Option<ProgressCallback>,
) -> Result<PollResult>
where
    A: OperationSource + ?Sized,
{
    let request = PollRequest::new(operation_id)
        .with_delay(wait.interval)
        .with_timeout(wait.timeout);
    poll_operation(api, &request, on_progress).await
}
