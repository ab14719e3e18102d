//! Wire types for the NDB REST API
//!
//! Request types skip absent optional fields when serialized so the API can
//! tell "not specified" apart from "explicitly cleared". Response types
//! default every field so partially populated payloads still decode.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Payload for `POST /dbservers/provision`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DbServerInputRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub software_profile_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub software_profile_version_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_machine_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot_id: Option<String>,
    #[serde(default)]
    pub latest_snapshot: bool,
    #[serde(default, rename = "timeZone", skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_profile_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compute_profile_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nx_cluster_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vm_password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub action_arguments: Vec<ActionArgument>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maintenance_tasks: Option<MaintenanceTasks>,
}

/// Engine-specific name/value argument
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionArgument {
    pub name: String,
    pub value: serde_json::Value,
}

impl ActionArgument {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: serde_json::Value::String(value.into()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceTasks {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maintenance_window_id: Option<String>,
    #[serde(default)]
    pub tasks: Vec<MaintenanceTask>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceTask {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_type: Option<MaintenanceTaskType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<TaskPayload>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pre_post_command: Option<PrePostCommand>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrePostCommand {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pre_command: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_command: Option<String>,
}

/// Kind of maintenance task scheduled in a maintenance window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MaintenanceTaskType {
    OsPatching,
    DbPatching,
}

impl fmt::Display for MaintenanceTaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaintenanceTaskType::OsPatching => write!(f, "OS_PATCHING"),
            MaintenanceTaskType::DbPatching => write!(f, "DB_PATCHING"),
        }
    }
}

impl FromStr for MaintenanceTaskType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "OS_PATCHING" => Ok(MaintenanceTaskType::OsPatching),
            "DB_PATCHING" => Ok(MaintenanceTaskType::DbPatching),
            other => Err(format!(
                "invalid task type '{}', expected OS_PATCHING or DB_PATCHING",
                other
            )),
        }
    }
}

/// Credential attached to a DB server VM
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VmCredential {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    #[serde(default)]
    pub tag_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_type: Option<String>,
    #[serde(default)]
    pub value: String,
}

/// Payload for `PATCH /dbservers/{id}`
///
/// Every `reset_*` flag tells the service to overwrite the matching field;
/// a field whose flag is false is left untouched server-side.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDbServerRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub reset_name: bool,
    #[serde(default)]
    pub reset_description: bool,
    #[serde(default)]
    pub reset_credential: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials: Option<Vec<VmCredential>>,
    #[serde(default)]
    pub reset_tags: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<Tag>>,
}

/// Payload for `DELETE /dbservers/{id}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteDbServerRequest {
    pub delete: bool,
    pub remove: bool,
    pub soft_remove: bool,
    pub delete_vgs: bool,
    pub delete_vm_snapshots: bool,
}

/// Response to a request that starts an asynchronous operation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationHandle {
    #[serde(default)]
    pub entity_id: String,
    #[serde(default)]
    pub operation_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub value: String,
}

/// DB server VM as returned by `GET /dbservers/{id}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DbServer {
    pub id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub properties: Vec<Property>,
    pub tags: Vec<Tag>,
    pub era_created: bool,
    pub internal: bool,
    pub dbserver_cluster_id: Option<String>,
    pub vm_cluster_name: Option<String>,
    pub vm_cluster_uuid: Option<String>,
    pub ip_addresses: Vec<String>,
    pub fqdns: Option<String>,
    pub mac_addresses: Vec<String>,
    #[serde(rename = "type")]
    pub server_type: Option<String>,
    pub placeholder: bool,
    pub status: Option<String>,
    pub client_id: Option<String>,
    pub era_drive_id: Option<String>,
    pub era_version: Option<String>,
    #[serde(rename = "vmTimeZone")]
    pub vm_timezone: Option<String>,
}

/// Server-side asynchronous unit of work
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Operation {
    pub id: String,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub operation_type: Option<String>,
    pub status: String,
    pub percentage_complete: Option<String>,
    pub message: Option<String>,
    pub entity_id: Option<String>,
    pub entity_name: Option<String>,
}

impl Operation {
    /// Classified status of this operation
    pub fn status(&self) -> OperationStatus {
        OperationStatus::from_wire(&self.status)
    }
}

/// Classified operation status
///
/// NDB reports numeric codes: `5` is completed and `4` is failed. Textual
/// names are accepted as well. Anything else is still in flight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationStatus {
    Pending,
    Completed,
    Failed,
    /// Backend-specific non-terminal value, kept verbatim
    Transient(String),
}

impl OperationStatus {
    pub fn from_wire(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "5" | "COMPLETED" => OperationStatus::Completed,
            "4" | "FAILED" => OperationStatus::Failed,
            "" | "PENDING" => OperationStatus::Pending,
            _ => OperationStatus::Transient(raw.trim().to_string()),
        }
    }

    /// COMPLETED and FAILED never transition again
    pub fn is_terminal(&self) -> bool {
        matches!(self, OperationStatus::Completed | OperationStatus::Failed)
    }
}

impl fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationStatus::Pending => write!(f, "PENDING"),
            OperationStatus::Completed => write!(f, "COMPLETED"),
            OperationStatus::Failed => write!(f, "FAILED"),
            OperationStatus::Transient(raw) => write!(f, "{}", raw),
        }
    }
}
