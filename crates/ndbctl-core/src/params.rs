//! Typed configuration records and the request builders that consume them
//!
//! `DbServerConfig` is the statically typed stand-in for a resource
//! configuration: optional attributes are `Option<T>`, repeated blocks are
//! `Vec<T>`. Building a request checks the cross-field preconditions first
//! and then copies over only what is present.
//!
//! # Example
//!
//! ```rust
//! use ndbctl_core::params::DbServerConfig;
//!
//! let config = DbServerConfig::new("postgres_database", "np-1", "cp-1", "cluster-1", "secret")
//!     .with_time_machine("tm-1");
//!
//! let request = config.to_request().unwrap();
//! assert_eq!(request.time_machine_id.as_deref(), Some("tm-1"));
//! assert!(request.latest_snapshot);
//! assert!(request.snapshot_id.is_none());
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CoreError, Result};
use crate::models::{
    ActionArgument, DbServerInputRequest, DeleteDbServerRequest, MaintenanceTask,
    MaintenanceTaskType, MaintenanceTasks, PrePostCommand, Tag, TaskPayload,
    UpdateDbServerRequest, VmCredential,
};

/// Configuration for provisioning a DB server VM
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DbServerConfig {
    /// Database engine, e.g. `postgres_database` (required)
    pub database_type: String,
    pub description: Option<String>,
    /// Provision from a software profile; requires `software_profile_version_id`
    pub software_profile_id: Option<String>,
    pub software_profile_version_id: Option<String>,
    /// Provision from a time machine instead of a software profile
    pub time_machine_id: Option<String>,
    /// Specific snapshot of the time machine; requires `time_machine_id`
    pub snapshot_id: Option<String>,
    pub timezone: Option<String>,
    pub network_profile_id: String,
    pub compute_profile_id: String,
    pub nx_cluster_id: String,
    pub vm_password: String,
    /// Defaults to true when unset
    pub latest_snapshot: Option<bool>,
    pub postgres_database: Vec<PostgresDatabase>,
    pub credentials: Vec<Credential>,
    pub maintenance_tasks: Option<MaintenanceConfig>,
    pub tags: Vec<TagConfig>,
}

/// Postgres-specific provisioning arguments
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostgresDatabase {
    pub vm_name: String,
    pub client_public_key: String,
}

#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Credential {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub label: Option<String>,
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("label", &self.label)
            .finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaintenanceConfig {
    pub maintenance_window_id: Option<String>,
    pub tasks: Vec<MaintenanceTaskConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaintenanceTaskConfig {
    pub task_type: Option<MaintenanceTaskType>,
    pub pre_command: Option<String>,
    pub post_command: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TagConfig {
    pub tag_id: String,
    #[serde(default)]
    pub tag_name: Option<String>,
    pub value: String,
}

impl fmt::Debug for DbServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbServerConfig")
            .field("database_type", &self.database_type)
            .field("description", &self.description)
            .field("software_profile_id", &self.software_profile_id)
            .field(
                "software_profile_version_id",
                &self.software_profile_version_id,
            )
            .field("time_machine_id", &self.time_machine_id)
            .field("snapshot_id", &self.snapshot_id)
            .field("timezone", &self.timezone)
            .field("network_profile_id", &self.network_profile_id)
            .field("compute_profile_id", &self.compute_profile_id)
            .field("nx_cluster_id", &self.nx_cluster_id)
            .field("vm_password", &"<redacted>")
            .field("latest_snapshot", &self.latest_snapshot)
            .field("postgres_database", &self.postgres_database)
            .field("credentials", &self.credentials)
            .field("maintenance_tasks", &self.maintenance_tasks)
            .field("tags", &self.tags)
            .finish()
    }
}

impl DbServerConfig {
    /// Create a config with the required attributes
    #[must_use]
    pub fn new(
        database_type: impl Into<String>,
        network_profile_id: impl Into<String>,
        compute_profile_id: impl Into<String>,
        nx_cluster_id: impl Into<String>,
        vm_password: impl Into<String>,
    ) -> Self {
        Self {
            database_type: database_type.into(),
            network_profile_id: network_profile_id.into(),
            compute_profile_id: compute_profile_id.into(),
            nx_cluster_id: nx_cluster_id.into(),
            vm_password: vm_password.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Provision from a software profile version
    #[must_use]
    pub fn with_software_profile(
        mut self,
        profile_id: impl Into<String>,
        version_id: impl Into<String>,
    ) -> Self {
        self.software_profile_id = Some(profile_id.into());
        self.software_profile_version_id = Some(version_id.into());
        self
    }

    /// Provision from a time machine
    #[must_use]
    pub fn with_time_machine(mut self, time_machine_id: impl Into<String>) -> Self {
        self.time_machine_id = Some(time_machine_id.into());
        self
    }

    #[must_use]
    pub fn with_snapshot(mut self, snapshot_id: impl Into<String>) -> Self {
        self.snapshot_id = Some(snapshot_id.into());
        self
    }

    #[must_use]
    pub fn with_timezone(mut self, timezone: impl Into<String>) -> Self {
        self.timezone = Some(timezone.into());
        self
    }

    #[must_use]
    pub fn with_latest_snapshot(mut self, latest: bool) -> Self {
        self.latest_snapshot = Some(latest);
        self
    }

    #[must_use]
    pub fn with_postgres_database(
        mut self,
        vm_name: impl Into<String>,
        client_public_key: impl Into<String>,
    ) -> Self {
        self.postgres_database.push(PostgresDatabase {
            vm_name: vm_name.into(),
            client_public_key: client_public_key.into(),
        });
        self
    }

    #[must_use]
    pub fn with_credential(mut self, credential: Credential) -> Self {
        self.credentials.push(credential);
        self
    }

    #[must_use]
    pub fn with_maintenance(mut self, maintenance: MaintenanceConfig) -> Self {
        self.maintenance_tasks = Some(maintenance);
        self
    }

    #[must_use]
    pub fn with_tag(mut self, tag_id: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.push(TagConfig {
            tag_id: tag_id.into(),
            tag_name: None,
            value: value.into(),
        });
        self
    }

    /// Check the cross-field preconditions
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("database_type", &self.database_type),
            ("network_profile_id", &self.network_profile_id),
            ("compute_profile_id", &self.compute_profile_id),
            ("nx_cluster_id", &self.nx_cluster_id),
            ("vm_password", &self.vm_password),
        ];
        if let Some((name, _)) = required.iter().find(|(_, value)| value.is_empty()) {
            return Err(CoreError::Validation(format!("{} is required", name)));
        }

        match (&self.software_profile_id, &self.time_machine_id) {
            (Some(_), Some(_)) => {
                return Err(CoreError::Validation(
                    "software_profile_id conflicts with time_machine_id".to_string(),
                ));
            }
            (None, None) => {
                return Err(CoreError::Validation(
                    "one of software_profile_id or time_machine_id must be set".to_string(),
                ));
            }
            _ => {}
        }

        if self.software_profile_id.is_some() && self.software_profile_version_id.is_none() {
            return Err(CoreError::Validation(
                "software_profile_id requires software_profile_version_id".to_string(),
            ));
        }

        if self.snapshot_id.is_some() && self.time_machine_id.is_none() {
            return Err(CoreError::Validation(
                "snapshot_id requires time_machine_id".to_string(),
            ));
        }

        Ok(())
    }

    /// Build the provisioning request
    pub fn to_request(&self) -> Result<DbServerInputRequest> {
        self.validate()?;

        let mut request = DbServerInputRequest {
            database_type: Some(self.database_type.clone()),
            software_profile_id: self.software_profile_id.clone(),
            software_profile_version_id: self.software_profile_version_id.clone(),
            latest_snapshot: self.latest_snapshot.unwrap_or(true),
            timezone: self.timezone.clone(),
            network_profile_id: Some(self.network_profile_id.clone()),
            compute_profile_id: Some(self.compute_profile_id.clone()),
            nx_cluster_id: Some(self.nx_cluster_id.clone()),
            vm_password: Some(self.vm_password.clone()),
            description: self.description.clone(),
            action_arguments: expand_postgres_arguments(&self.postgres_database),
            maintenance_tasks: self.maintenance_tasks.as_ref().map(expand_maintenance_tasks),
            ..Default::default()
        };

        if let Some(time_machine_id) = &self.time_machine_id {
            request.time_machine_id = Some(time_machine_id.clone());
            // An explicit snapshot always wins over "latest"
            match &self.snapshot_id {
                Some(snapshot_id) => {
                    request.snapshot_id = Some(snapshot_id.clone());
                    request.latest_snapshot = false;
                }
                None => request.latest_snapshot = true,
            }
        }

        Ok(request)
    }

    /// Name given to the VM by the first postgres block, if any
    pub fn vm_name(&self) -> Option<&str> {
        self.postgres_database.first().map(|p| p.vm_name.as_str())
    }
}

fn expand_postgres_arguments(blocks: &[PostgresDatabase]) -> Vec<ActionArgument> {
    blocks
        .iter()
        .flat_map(|block| {
            [
                ActionArgument::new("vm_name", &block.vm_name),
                ActionArgument::new("client_public_key", &block.client_public_key),
            ]
        })
        .collect()
}

fn expand_maintenance_tasks(config: &MaintenanceConfig) -> MaintenanceTasks {
    let tasks = config
        .tasks
        .iter()
        .map(|task| {
            let payload = if task.pre_command.is_some() || task.post_command.is_some() {
                Some(TaskPayload {
                    pre_post_command: Some(PrePostCommand {
                        pre_command: task.pre_command.clone(),
                        post_command: task.post_command.clone(),
                    }),
                })
            } else {
                None
            };
            MaintenanceTask {
                task_type: task.task_type,
                payload,
            }
        })
        .collect();

    MaintenanceTasks {
        maintenance_window_id: config.maintenance_window_id.clone(),
        tasks,
    }
}

fn expand_tags(tags: &[TagConfig]) -> Vec<Tag> {
    tags.iter()
        .map(|tag| Tag {
            tag_id: tag.tag_id.clone(),
            tag_name: tag.tag_name.clone(),
            value: tag.value.clone(),
            ..Default::default()
        })
        .collect()
}

fn expand_credentials(credentials: &[Credential]) -> Vec<VmCredential> {
    credentials
        .iter()
        .map(|cred| VmCredential {
            username: Some(cred.username.clone()),
            password: Some(cred.password.clone()),
            label: cred.label.clone(),
        })
        .collect()
}

/// Parameters for updating a DB server VM
///
/// All fields are optional - only set fields you want to change. Setting
/// `tags` or `credentials` to an empty list clears them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateDbServerParams {
    pub name: Option<String>,
    pub description: Option<String>,
    pub tags: Option<Vec<TagConfig>>,
    pub credentials: Option<Vec<Credential>>,
}

impl UpdateDbServerParams {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn with_tags(mut self, tags: Vec<TagConfig>) -> Self {
        self.tags = Some(tags);
        self
    }

    #[must_use]
    pub fn with_credentials(mut self, credentials: Vec<Credential>) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Derive the update from an old and a new configuration
    ///
    /// Only description, VM name, tags and credentials are updatable in
    /// place; other differences are ignored here.
    #[must_use]
    pub fn from_changes(old: &DbServerConfig, new: &DbServerConfig) -> Self {
        let mut params = Self::new();

        if old.description != new.description {
            params.description = Some(new.description.clone().unwrap_or_default());
        }
        if old.postgres_database != new.postgres_database
            && let Some(vm_name) = new.vm_name()
        {
            params.name = Some(vm_name.to_string());
        }
        if old.tags != new.tags {
            params.tags = Some(new.tags.clone());
        }
        if old.credentials != new.credentials {
            params.credentials = Some(new.credentials.clone());
        }

        params
    }

    /// Check if any fields are set
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.tags.is_none()
            && self.credentials.is_none()
    }

    /// Convert to `UpdateDbServerRequest`, raising the reset flag of every present field
    #[must_use]
    pub fn into_request(self) -> UpdateDbServerRequest {
        UpdateDbServerRequest {
            reset_name: self.name.is_some(),
            reset_description: self.description.is_some(),
            reset_tags: self.tags.is_some(),
            reset_credential: self.credentials.is_some(),
            tags: self.tags.as_deref().map(expand_tags),
            credentials: self.credentials.as_deref().map(expand_credentials),
            name: self.name,
            description: self.description,
        }
    }
}

/// Parameters for deleting a DB server VM
///
/// Defaults delete the VM together with its volume groups and VM snapshots.
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteDbServerParams {
    pub delete: bool,
    pub remove: bool,
    pub soft_remove: bool,
    pub delete_vgs: bool,
    pub delete_vm_snapshots: bool,
}

impl Default for DeleteDbServerParams {
    fn default() -> Self {
        Self {
            delete: true,
            remove: false,
            soft_remove: false,
            delete_vgs: true,
            delete_vm_snapshots: true,
        }
    }
}

impl DeleteDbServerParams {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Unregister from NDB without deleting the VM
    #[must_use]
    pub fn remove_only(mut self) -> Self {
        self.delete = false;
        self.remove = true;
        self
    }

    #[must_use]
    pub fn with_soft_remove(mut self, soft_remove: bool) -> Self {
        self.soft_remove = soft_remove;
        self
    }

    #[must_use]
    pub fn with_delete_vgs(mut self, delete_vgs: bool) -> Self {
        self.delete_vgs = delete_vgs;
        self
    }

    #[must_use]
    pub fn with_delete_vm_snapshots(mut self, delete_vm_snapshots: bool) -> Self {
        self.delete_vm_snapshots = delete_vm_snapshots;
        self
    }

    #[must_use]
    pub fn into_request(self) -> DeleteDbServerRequest {
        DeleteDbServerRequest {
            delete: self.delete,
            remove: self.remove,
            soft_remove: self.soft_remove,
            delete_vgs: self.delete_vgs,
            delete_vm_snapshots: self.delete_vm_snapshots,
        }
    }
}
