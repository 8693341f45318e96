//! Typed node payloads for the infrastructure graph
//!
//! Each node carries a payload whose shape is determined by its type. The
//! payload is an internally tagged sum type so exhaustiveness is enforced
//! at compile time instead of runtime field probing, and its wire shape
//! matches the canvas JSON (`{"type": "vmTemplate", "cpu": 2, ...}`).

use serde::{Deserialize, Serialize};

use super::NodeType;

/// Payload carried by a graph node, keyed on its node type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum NodePayload {
    /// Cluster root
    #[serde(rename_all = "camelCase")]
    Cluster { cluster_name: String },
    /// Grouping node, no extra fields
    NodeGroup,
    /// Virtual machine template
    VmTemplate {
        name: String,
        cpu: u32,
        ram: String,
        disk: String,
        network: String,
        image: String,
        firewall: Vec<String>,
        user: String,
        replicas: u32,
    },
    /// Container template (no disk)
    ContainerTemplate {
        name: String,
        cpu: u32,
        ram: String,
        network: String,
        image: String,
        firewall: Vec<String>,
        user: String,
        replicas: u32,
    },
    /// OS image repository, identified by its node label
    ImageStore,
    /// Network configuration
    NetworkConfig {
        name: String,
        subnet: String,
        gateway: String,
        dhcp: bool,
    },
    /// Ordered firewall rule set
    FirewallPolicies { name: String, rules: Vec<String> },
    /// Access-control leaf, identified by its node label
    UsersRoles,
    /// Auto-scaling leaf, identified by its node label
    ScalingRules,
}

impl NodePayload {
    /// The node type this payload belongs to
    pub fn node_type(&self) -> NodeType {
        match self {
            NodePayload::Cluster { .. } => NodeType::Cluster,
            NodePayload::NodeGroup => NodeType::NodeGroup,
            NodePayload::VmTemplate { .. } => NodeType::VmTemplate,
            NodePayload::ContainerTemplate { .. } => NodeType::ContainerTemplate,
            NodePayload::ImageStore => NodeType::ImageStore,
            NodePayload::NetworkConfig { .. } => NodeType::NetworkConfig,
            NodePayload::FirewallPolicies { .. } => NodeType::FirewallPolicies,
            NodePayload::UsersRoles => NodeType::UsersRoles,
            NodePayload::ScalingRules => NodeType::ScalingRules,
        }
    }

    /// The payload-level name, where the payload carries one.
    ///
    /// Label-only leaves (`nodeGroup`, `imageStore`, `usersRoles`,
    /// `scalingRules`) return `None`; their node label is the identifier.
    pub fn name(&self) -> Option<&str> {
        match self {
            NodePayload::Cluster { cluster_name } => Some(cluster_name),
            NodePayload::VmTemplate { name, .. } => Some(name),
            NodePayload::ContainerTemplate { name, .. } => Some(name),
            NodePayload::NetworkConfig { name, .. } => Some(name),
            NodePayload::FirewallPolicies { name, .. } => Some(name),
            NodePayload::NodeGroup
            | NodePayload::ImageStore
            | NodePayload::UsersRoles
            | NodePayload::ScalingRules => None,
        }
    }

    /// The default payload a node of the given type starts with when
    /// dropped onto the canvas
    pub fn default_for(node_type: NodeType) -> NodePayload {
        match node_type {
            NodeType::Cluster => NodePayload::Cluster {
                cluster_name: "microcloud-lxd".to_string(),
            },
            NodeType::NodeGroup => NodePayload::NodeGroup,
            NodeType::VmTemplate => NodePayload::VmTemplate {
                name: String::new(),
                cpu: 2,
                ram: "4GB".to_string(),
                disk: "20GB".to_string(),
                network: "default".to_string(),
                image: "ubuntu-22.04".to_string(),
                firewall: Vec::new(),
                user: "admin".to_string(),
                replicas: 1,
            },
            NodeType::ContainerTemplate => NodePayload::ContainerTemplate {
                name: String::new(),
                cpu: 1,
                ram: "2GB".to_string(),
                network: "default".to_string(),
                image: "ubuntu-22.04".to_string(),
                firewall: Vec::new(),
                user: "admin".to_string(),
                replicas: 1,
            },
            NodeType::ImageStore => NodePayload::ImageStore,
            NodeType::NetworkConfig => NodePayload::NetworkConfig {
                name: String::new(),
                subnet: String::new(),
                gateway: String::new(),
                dhcp: true,
            },
            NodeType::FirewallPolicies => NodePayload::FirewallPolicies {
                name: String::new(),
                rules: Vec::new(),
            },
            NodeType::UsersRoles => NodePayload::UsersRoles,
            NodeType::ScalingRules => NodePayload::ScalingRules,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_node_type() {
        for node_type in NodeType::ALL {
            assert_eq!(NodePayload::default_for(node_type).node_type(), node_type);
        }
    }

    #[test]
    fn test_vm_default_payload() {
        let payload = NodePayload::default_for(NodeType::VmTemplate);
        match &payload {
            NodePayload::VmTemplate {
                cpu,
                ram,
                disk,
                network,
                image,
                user,
                replicas,
                ..
            } => {
                assert_eq!(*cpu, 2);
                assert_eq!(ram, "4GB");
                assert_eq!(disk, "20GB");
                assert_eq!(network, "default");
                assert_eq!(image, "ubuntu-22.04");
                assert_eq!(user, "admin");
                assert_eq!(*replicas, 1);
            }
            _ => panic!("expected a vmTemplate payload"),
        }
    }

    #[test]
    fn test_payload_wire_shape() {
        let payload = NodePayload::Cluster {
            cluster_name: "prod".to_string(),
        };
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["type"], "cluster");
        assert_eq!(value["clusterName"], "prod");

        let leaf = serde_json::to_value(NodePayload::ImageStore).unwrap();
        assert_eq!(leaf, serde_json::json!({ "type": "imageStore" }));
    }

    #[test]
    fn test_payload_roundtrip() {
        let payload = NodePayload::default_for(NodeType::ContainerTemplate);
        let json = serde_json::to_string(&payload).unwrap();
        let back: NodePayload = serde_json::from_str(&json).unwrap();
        assert_eq!(back, payload);
        // Containers carry no disk field on the wire
        assert!(!json.contains("disk"));
    }

    #[test]
    fn test_name_resolution() {
        let network = NodePayload::NetworkConfig {
            name: "net1".to_string(),
            subnet: "10.0.0.0/24".to_string(),
            gateway: "10.0.0.1".to_string(),
            dhcp: true,
        };
        assert_eq!(network.name(), Some("net1"));
        assert_eq!(NodePayload::UsersRoles.name(), None);
    }
}
