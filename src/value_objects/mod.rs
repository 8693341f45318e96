//! Graph value objects
//!
//! Value objects are immutable types that represent concepts in the
//! infrastructure graph domain. They are compared by value rather than
//! identity and encapsulate domain validation.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

mod payload;

pub use payload::NodePayload;

/// Unique identifier for a graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GraphId(Uuid);

impl GraphId {
    /// Create a new random graph identifier
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for GraphId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for GraphId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a node, stable for the node's lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(Uuid);

impl NodeId {
    /// Create a new random node identifier
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for an edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeId(Uuid);

impl EdgeId {
    /// Create a new random edge identifier
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EdgeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The closed set of node types in an infrastructure diagram
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeType {
    /// A MicroCloud LXD cluster, the root of a deployable subgraph
    Cluster,
    /// A grouping of compute nodes, purely organisational
    NodeGroup,
    /// A virtual machine configuration template
    VmTemplate,
    /// A container configuration template
    ContainerTemplate,
    /// An OS image repository
    ImageStore,
    /// A network configuration
    NetworkConfig,
    /// A set of firewall security rules
    FirewallPolicies,
    /// Access-control users and roles
    UsersRoles,
    /// Auto-scaling configuration
    ScalingRules,
}

impl NodeType {
    /// All node types, in palette order
    pub const ALL: [NodeType; 9] = [
        NodeType::Cluster,
        NodeType::NodeGroup,
        NodeType::VmTemplate,
        NodeType::ContainerTemplate,
        NodeType::ImageStore,
        NodeType::NetworkConfig,
        NodeType::FirewallPolicies,
        NodeType::UsersRoles,
        NodeType::ScalingRules,
    ];

    /// Get the string representation of the node type
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::Cluster => "cluster",
            NodeType::NodeGroup => "nodeGroup",
            NodeType::VmTemplate => "vmTemplate",
            NodeType::ContainerTemplate => "containerTemplate",
            NodeType::ImageStore => "imageStore",
            NodeType::NetworkConfig => "networkConfig",
            NodeType::FirewallPolicies => "firewallPolicies",
            NodeType::UsersRoles => "usersRoles",
            NodeType::ScalingRules => "scalingRules",
        }
    }

    /// Whether this node type describes a compute resource
    pub fn is_compute(&self) -> bool {
        matches!(self, NodeType::VmTemplate | NodeType::ContainerTemplate)
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The semantics of a directed edge, determined by its endpoint types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgeRelation {
    /// Cluster or group contains a node group
    Containment,
    /// Cluster or group hosts a compute template
    Hosting,
    /// Compute template attaches to a network configuration
    NetworkAttachment,
    /// Compute template sources its image from an image store
    ImageSource,
    /// Compute template attaches a firewall policy set
    FirewallAttachment,
    /// Compute template runs as a user/role
    AccessAttachment,
    /// Scaling rules attached to a cluster, group, or compute template
    ScalingAttachment,
}

impl EdgeRelation {
    /// Classify an edge by its endpoint types.
    ///
    /// Returns `None` when no relation is defined for the pair; the graph
    /// model still stores such edges (legality is the validator's job).
    pub fn classify(source: NodeType, target: NodeType) -> Option<EdgeRelation> {
        use NodeType::*;
        match (source, target) {
            (Cluster | NodeGroup, NodeGroup) => Some(EdgeRelation::Containment),
            (Cluster | NodeGroup, VmTemplate | ContainerTemplate) => Some(EdgeRelation::Hosting),
            (VmTemplate | ContainerTemplate, NetworkConfig) => {
                Some(EdgeRelation::NetworkAttachment)
            }
            (VmTemplate | ContainerTemplate, ImageStore) => Some(EdgeRelation::ImageSource),
            (VmTemplate | ContainerTemplate, FirewallPolicies) => {
                Some(EdgeRelation::FirewallAttachment)
            }
            (VmTemplate | ContainerTemplate, UsersRoles) => Some(EdgeRelation::AccessAttachment),
            (Cluster | NodeGroup | VmTemplate | ContainerTemplate, ScalingRules) => {
                Some(EdgeRelation::ScalingAttachment)
            }
            _ => None,
        }
    }

    /// Whether this relation forms the containment/hosting skeleton walked
    /// during compilation and checked for cycles
    pub fn is_structural(&self) -> bool {
        matches!(self, EdgeRelation::Containment | EdgeRelation::Hosting)
    }
}

/// Direction of a structural adjacency query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Edges where the node is the source
    Out,
    /// Edges where the node is the target
    In,
}
