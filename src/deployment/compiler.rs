//! Graph to deployment configuration compilation
//!
//! Reduces a validated subgraph rooted at a cluster node into a flat
//! `DeploymentConfig`. Compilation validates first and is all-or-nothing:
//! any error-severity issue yields the full issue list and no config. The
//! walk order is stable (first-added edge first), so repeated compiles of
//! an unchanged graph are byte-for-byte identical.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::aggregate::Graph;
use crate::value_objects::{NodeId, NodePayload, NodeType};

use super::validation::{
    self, compute_fields, compute_refs, resolved_name, structural_walk, ContractViolation,
    ReferenceModes, ValidationIssue, ValidationOutcome,
};

/// Kind of provisioned resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Vm,
    Container,
}

/// One compute resource to provision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceEntry {
    #[serde(rename = "type")]
    pub kind: ResourceKind,
    pub name: String,
    pub cpu: u32,
    pub ram: String,
    /// VM only; omitted for containers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disk: Option<String>,
    pub network: String,
    pub image: String,
    pub firewall: Vec<String>,
    pub user: String,
    pub replicas: u32,
}

/// The compiled, flat description of resources to provision.
///
/// A freestanding value with no back-reference to the graph: mutating the
/// graph after compiling never affects a previously returned config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentConfig {
    pub cluster: String,
    pub resources: Vec<ResourceEntry>,
}

/// Why compilation did not produce a config
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompileFailure {
    /// Caller bug, aborted loudly
    #[error(transparent)]
    Contract(#[from] ContractViolation),
    /// The graph has error-severity validation issues; the list is
    /// returned unchanged and no partial config is produced
    #[error("graph rejected with {} validation issue(s)", .0.len())]
    Rejected(Vec<ValidationIssue>),
}

/// Compile the subgraph rooted at `root_id` into a `DeploymentConfig`.
///
/// Pure read pass over the graph: validates first, then emits one resource
/// entry per reachable compute node in stable traversal order.
pub fn compile(graph: &Graph, root_id: NodeId) -> Result<DeploymentConfig, CompileFailure> {
    let outcome = validation::validate(graph, root_id)?;
    if !outcome.is_compilable() {
        return Err(CompileFailure::Rejected(outcome.into_issues()));
    }
    if let ValidationOutcome::Invalid(issues) = &outcome {
        debug!(warnings = issues.len(), "compiling with warnings");
    }

    // The validator guarantees the root is a cluster node.
    let cluster = match graph.node(root_id).map(|node| &node.payload) {
        Some(NodePayload::Cluster { cluster_name }) if !cluster_name.is_empty() => {
            cluster_name.clone()
        }
        _ => "microcloud-lxd".to_string(),
    };

    let modes = ReferenceModes::of(graph);
    let walk = structural_walk(graph, root_id);
    let resources = walk
        .compute
        .iter()
        .filter_map(|&node_id| resource_entry(graph, node_id, &modes))
        .collect();

    let config = DeploymentConfig { cluster, resources };
    debug!(
        cluster = %config.cluster,
        resources = config.resources.len(),
        "compiled deployment config"
    );
    Ok(config)
}

fn resource_entry(graph: &Graph, node_id: NodeId, modes: &ReferenceModes) -> Option<ResourceEntry> {
    let node = graph.node(node_id)?;
    let fields = compute_fields(&node.payload)?;
    let refs = compute_refs(graph, node_id);
    let kind = match node.node_type() {
        NodeType::VmTemplate => ResourceKind::Vm,
        NodeType::ContainerTemplate => ResourceKind::Container,
        _ => return None,
    };

    let network = refs
        .network
        .first()
        .and_then(|edge| resolved_name(graph, edge.target_id))
        .unwrap_or(fields.network);
    let image = refs
        .image
        .first()
        .and_then(|edge| resolved_name(graph, edge.target_id))
        .unwrap_or(fields.image);
    let user = refs
        .user
        .first()
        .and_then(|edge| resolved_name(graph, edge.target_id))
        .unwrap_or(fields.user);

    // Attached policy names in edge-insertion order, deduplicated keeping
    // the first occurrence. With no attachments the payload list is the
    // literal only when the graph has no firewall policy nodes at all.
    let firewall = if !refs.firewall.is_empty() {
        let mut names: Vec<String> = Vec::new();
        for edge in &refs.firewall {
            if let Some(name) = resolved_name(graph, edge.target_id) {
                if !names.iter().any(|existing| existing == name) {
                    names.push(name.to_string());
                }
            }
        }
        names
    } else if !modes.firewall {
        fields.firewall.to_vec()
    } else {
        Vec::new()
    };

    let (fallback_name, fallback_ram, fallback_disk) = match kind {
        ResourceKind::Vm => ("unnamed-vm", "4GB", Some("20GB")),
        ResourceKind::Container => ("unnamed-container", "2GB", None),
    };

    Some(ResourceEntry {
        kind,
        name: non_empty(fields.name, fallback_name),
        cpu: fields.cpu,
        ram: non_empty(fields.ram, fallback_ram),
        disk: match kind {
            ResourceKind::Vm => Some(non_empty(
                fields.disk.unwrap_or_default(),
                fallback_disk.unwrap_or_default(),
            )),
            ResourceKind::Container => None,
        },
        network: non_empty(network, "default"),
        image: non_empty(image, "ubuntu-22.04"),
        firewall,
        user: non_empty(user, "admin"),
        replicas: fields.replicas,
    })
}

fn non_empty(value: &str, fallback: &str) -> String {
    if value.is_empty() {
        fallback.to_string()
    } else {
        value.to_string()
    }
}
