//! Flattening DB server responses into named-field state
//!
//! The flattener never defaults or infers: each attribute is copied from the
//! response as-is and lists keep the order the server returned them in.

use serde::Serialize;
use serde_json::{Value, json};
use std::collections::BTreeMap;

use crate::error::{CoreError, Result};
use crate::models::{DbServer, Property, Tag};

/// Attributes a DB server state may hold, in addition to `id`
pub const DBSERVER_ATTRIBUTES: &[&str] = &[
    "description",
    "name",
    "properties",
    "tags",
    "era_created",
    "internal",
    "dbserver_cluster_id",
    "vm_cluster_name",
    "vm_cluster_uuid",
    "ip_addresses",
    "fqdns",
    "mac_addresses",
    "type",
    "placeholder",
    "status",
    "client_id",
    "era_drive_id",
    "era_version",
    "vm_timezone",
];

/// Sink for flattened attributes
pub trait StateWriter {
    /// Store one attribute; an error aborts the flattening
    fn set(&mut self, attribute: &str, value: Value) -> Result<()>;
}

/// In-memory state for one DB server resource
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResourceState {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(flatten)]
    attributes: BTreeMap<String, Value>,
}

impl ResourceState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = Some(id.into());
    }

    pub fn get(&self, attribute: &str) -> Option<&Value> {
        self.attributes.get(attribute)
    }

    pub fn is_empty(&self) -> bool {
        self.id.is_none() && self.attributes.is_empty()
    }

    /// Forget the resource entirely, as after a delete
    pub fn clear(&mut self) {
        self.id = None;
        self.attributes.clear();
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl StateWriter for ResourceState {
    fn set(&mut self, attribute: &str, value: Value) -> Result<()> {
        if !DBSERVER_ATTRIBUTES.contains(&attribute) {
            return Err(CoreError::State {
                attribute: attribute.to_string(),
                reason: "unknown attribute".to_string(),
            });
        }
        self.attributes.insert(attribute.to_string(), value);
        Ok(())
    }
}

/// Write every attribute of `server` into `state`
pub fn flatten_dbserver<W: StateWriter + ?Sized>(server: &DbServer, state: &mut W) -> Result<()> {
    state.set("description", json!(server.description))?;
    state.set("name", json!(server.name))?;
    state.set("properties", flatten_properties(&server.properties))?;
    state.set("tags", flatten_tags(&server.tags))?;
    state.set("era_created", json!(server.era_created))?;
    state.set("internal", json!(server.internal))?;
    state.set("dbserver_cluster_id", json!(server.dbserver_cluster_id))?;
    state.set("vm_cluster_name", json!(server.vm_cluster_name))?;
    state.set("vm_cluster_uuid", json!(server.vm_cluster_uuid))?;
    state.set("ip_addresses", json!(server.ip_addresses))?;
    state.set("fqdns", json!(server.fqdns))?;
    state.set("mac_addresses", json!(server.mac_addresses))?;
    state.set("type", json!(server.server_type))?;
    state.set("placeholder", json!(server.placeholder))?;
    state.set("status", json!(server.status))?;
    state.set("client_id", json!(server.client_id))?;
    state.set("era_drive_id", json!(server.era_drive_id))?;
    state.set("era_version", json!(server.era_version))?;
    state.set("vm_timezone", json!(server.vm_timezone))?;
    Ok(())
}

pub fn flatten_properties(properties: &[Property]) -> Value {
    Value::Array(
        properties
            .iter()
            .map(|p| json!({"name": p.name, "value": p.value}))
            .collect(),
    )
}

pub fn flatten_tags(tags: &[Tag]) -> Value {
    Value::Array(
        tags.iter()
            .map(|t| {
                json!({
                    "tag_id": t.tag_id,
                    "tag_name": t.tag_name,
                    "entity_id": t.entity_id,
                    "entity_type": t.entity_type,
                    "value": t.value,
                })
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn server() -> DbServer {
        DbServer {
            id: "srv-1".to_string(),
            name: Some("pg-vm".to_string()),
            description: Some("primary".to_string()),
            properties: vec![
                Property {
                    name: "os_type".to_string(),
                    value: "linux".to_string(),
                },
                Property {
                    name: "cpus".to_string(),
                    value: "4".to_string(),
                },
            ],
            ip_addresses: vec![
                "10.0.0.3".to_string(),
                "10.0.0.1".to_string(),
                "10.0.0.2".to_string(),
            ],
            mac_addresses: vec!["aa:bb".to_string(), "cc:dd".to_string()],
            era_created: true,
            status: Some("UP".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_flatten_preserves_list_order() {
        let mut state = ResourceState::new();
        flatten_dbserver(&server(), &mut state).unwrap();

        assert_eq!(
            state.get("ip_addresses").unwrap(),
            &json!(["10.0.0.3", "10.0.0.1", "10.0.0.2"])
        );
        assert_eq!(state.get("mac_addresses").unwrap(), &json!(["aa:bb", "cc:dd"]));
        assert_eq!(
            state.get("properties").unwrap(),
            &json!([
                {"name": "os_type", "value": "linux"},
                {"name": "cpus", "value": "4"}
            ])
        );
    }

    #[test]
    fn test_flatten_writes_verbatim() {
        let mut state = ResourceState::new();
        flatten_dbserver(&server(), &mut state).unwrap();

        assert_eq!(state.get("name").unwrap(), &json!("pg-vm"));
        assert_eq!(state.get("era_created").unwrap(), &json!(true));
        assert_eq!(state.get("placeholder").unwrap(), &json!(false));
        // Absent values stay null rather than being defaulted
        assert_eq!(state.get("vm_timezone").unwrap(), &Value::Null);
        assert_eq!(state.get("tags").unwrap(), &json!([]));
        assert_eq!(state.attributes().count(), DBSERVER_ATTRIBUTES.len());
    }

    #[test]
    fn test_empty_lists_stay_empty() {
        let mut state = ResourceState::new();
        flatten_dbserver(&DbServer::default(), &mut state).unwrap();
        assert_eq!(state.get("ip_addresses").unwrap(), &json!([]));
        assert_eq!(state.get("mac_addresses").unwrap(), &json!([]));
    }

    struct RejectingWriter {
        reject: &'static str,
        written: Vec<String>,
    }

    impl StateWriter for RejectingWriter {
        fn set(&mut self, attribute: &str, _value: Value) -> Result<()> {
            if attribute == self.reject {
                return Err(CoreError::State {
                    attribute: attribute.to_string(),
                    reason: "rejected".to_string(),
                });
            }
            self.written.push(attribute.to_string());
            Ok(())
        }
    }

    #[test]
    fn test_writer_rejection_propagates() {
        let mut writer = RejectingWriter {
            reject: "tags",
            written: Vec::new(),
        };
        let err = flatten_dbserver(&server(), &mut writer).unwrap_err();
        assert!(matches!(err, CoreError::State { ref attribute, .. } if attribute == "tags"));
        // Nothing after the rejected attribute is written
        assert_eq!(writer.written, vec!["description", "name", "properties"]);
    }

    #[test]
    fn test_resource_state_rejects_unknown_attribute() {
        let mut state = ResourceState::new();
        let err = state.set("vm_password", json!("secret")).unwrap_err();
        assert!(err.to_string().contains("vm_password"));
    }

    #[test]
    fn test_resource_state_serializes_flat() {
        let mut state = ResourceState::new();
        state.set_id("srv-1");
        state.set("name", json!("pg-vm")).unwrap();
        assert_eq!(
            serde_json::to_value(&state).unwrap(),
            json!({"id": "srv-1", "name": "pg-vm"})
        );

        state.clear();
        assert!(state.is_empty());
        assert_eq!(state.id(), None);
    }
}
