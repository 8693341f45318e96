//! Validation rules for infrastructure flow graphs
//!
//! Checks run in a fixed order so issue lists are deterministic and
//! reproducible: root type, edge legality, reference closure, field
//! agreement, cycle detection, field constraints. Semantic findings are
//! always returned as data; only a genuine contract violation (validating
//! against a root id that is not in the graph) aborts the call.

use std::collections::HashSet;
use std::fmt;
use std::net::Ipv4Addr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::aggregate::{Edge, Graph};
use crate::value_objects::{EdgeId, NodeId, NodePayload, NodeType};

/// How serious a validation finding is. Warnings leave the graph
/// compilable; any error blocks compilation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// Which reference a closure or agreement finding concerns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferenceKind {
    Network,
    Image,
    User,
    Firewall,
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReferenceKind::Network => "network",
            ReferenceKind::Image => "image",
            ReferenceKind::User => "user",
            ReferenceKind::Firewall => "firewall",
        };
        write!(f, "{name}")
    }
}

/// Closed taxonomy of validation findings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IssueKind {
    /// The root id does not reference a cluster node
    InvalidRoot,
    /// An edge whose endpoint types define no relation; the compiler
    /// ignores it
    IllegalEdge,
    /// A required network/image/user reference is missing
    MissingReference,
    /// An edge and a payload field encode the same relation but disagree
    ReferenceMismatch,
    /// A containment/hosting cycle was found; the branch is excluded from
    /// compilation
    StructuralCycle,
    /// A payload field violates its schema constraint
    InvalidField,
}

/// A structured report of one rule violation found in the graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationIssue {
    pub severity: Severity,
    pub kind: IssueKind,
    /// The node the issue concerns, when node-scoped
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_id: Option<NodeId>,
    /// The edge the issue concerns, when edge-scoped
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edge_id: Option<EdgeId>,
    /// Human-readable specifics; for `MissingReference` this is the
    /// reference kind name ("network", "image", "user")
    pub detail: String,
}

impl ValidationIssue {
    fn error(kind: IssueKind, detail: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            kind,
            node_id: None,
            edge_id: None,
            detail: detail.into(),
        }
    }

    fn warning(kind: IssueKind, detail: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            kind,
            node_id: None,
            edge_id: None,
            detail: detail.into(),
        }
    }

    fn at_node(mut self, node_id: NodeId) -> Self {
        self.node_id = Some(node_id);
        self
    }

    fn at_edge(mut self, edge_id: EdgeId) -> Self {
        self.edge_id = Some(edge_id);
        self
    }
}

/// Outcome of validating a graph against a cluster root
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ValidationOutcome {
    /// No issues at all
    Valid,
    /// One or more issues, in deterministic check order
    Invalid(Vec<ValidationIssue>),
}

impl ValidationOutcome {
    /// Whether the graph has no issues of any severity
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationOutcome::Valid)
    }

    /// Whether the graph can be compiled (no error-severity issue)
    pub fn is_compilable(&self) -> bool {
        self.issues()
            .iter()
            .all(|issue| issue.severity != Severity::Error)
    }

    /// The ordered issue list (empty when valid)
    pub fn issues(&self) -> &[ValidationIssue] {
        match self {
            ValidationOutcome::Valid => &[],
            ValidationOutcome::Invalid(issues) => issues,
        }
    }

    /// Consume the outcome, yielding its issues
    pub fn into_issues(self) -> Vec<ValidationIssue> {
        match self {
            ValidationOutcome::Valid => Vec::new(),
            ValidationOutcome::Invalid(issues) => issues,
        }
    }
}

/// Caller bugs, distinct from issue reporting. These abort the call
/// instead of appearing in the issue list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ContractViolation {
    /// The root id passed to validate/compile is not in the graph
    #[error("root node {0} is not in the graph")]
    RootNotFound(NodeId),
}

/// Validate the subgraph rooted at `root_id`.
///
/// Returns `Err` only for contract violations; every semantic finding is
/// reported in the `ValidationOutcome`, ordered by check then by traversal
/// order, with nothing silently dropped.
pub fn validate(graph: &Graph, root_id: NodeId) -> Result<ValidationOutcome, ContractViolation> {
    let root = graph
        .node(root_id)
        .ok_or(ContractViolation::RootNotFound(root_id))?;
    debug!(%root_id, "validating graph");

    let mut issues = Vec::new();

    // Check 1: root must be a cluster; nothing downstream is meaningful
    // otherwise.
    if root.node_type() != NodeType::Cluster {
        issues.push(
            ValidationIssue::error(
                IssueKind::InvalidRoot,
                format!("root must be a cluster node, found {}", root.node_type()),
            )
            .at_node(root_id),
        );
        return Ok(ValidationOutcome::Invalid(issues));
    }

    let walk = structural_walk(graph, root_id);
    let modes = ReferenceModes::of(graph);
    let reachable = reachable_order(graph, root_id);
    let reachable_set: HashSet<NodeId> = reachable.iter().copied().collect();

    // Check 2: edge legality. The model stores any edge; pairs with no
    // defined relation are flagged here and ignored by the compiler.
    for edge in graph.edges().values() {
        if reachable_set.contains(&edge.source_id) && graph.relation_of(edge).is_none() {
            let source_type = graph.node(edge.source_id).map(|n| n.node_type());
            let target_type = graph.node(edge.target_id).map(|n| n.node_type());
            issues.push(
                ValidationIssue::warning(
                    IssueKind::IllegalEdge,
                    match (source_type, target_type) {
                        (Some(s), Some(t)) => format!("no relation is defined from {s} to {t}"),
                        _ => "edge endpoint is missing".to_string(),
                    },
                )
                .at_node(edge.source_id)
                .at_edge(edge.id),
            );
        }
    }

    // Check 3: reference closure per reachable compute node.
    for &node_id in &walk.compute {
        closure_issues(graph, node_id, &modes, &mut issues);
    }

    // Check 4: field agreement between edges and payload fields.
    for &node_id in &walk.compute {
        agreement_issues(graph, node_id, &modes, &mut issues);
    }

    // Check 5: containment/hosting edges must form a forest.
    for &(edge_id, node_id) in &walk.cycles {
        issues.push(
            ValidationIssue::warning(
                IssueKind::StructuralCycle,
                "containment cycle; the branch is excluded from compilation",
            )
            .at_node(node_id)
            .at_edge(edge_id),
        );
    }

    // Check 6: field-level constraints over every reachable node.
    for node_id in reachable {
        if let Some(node) = graph.node(node_id) {
            field_issues(node, &mut issues);
        }
    }

    if issues.is_empty() {
        Ok(ValidationOutcome::Valid)
    } else {
        debug!(count = issues.len(), "validation found issues");
        Ok(ValidationOutcome::Invalid(issues))
    }
}

/// Result of walking the containment/hosting skeleton from the root
pub(crate) struct StructuralWalk {
    /// Compute nodes in stable traversal order (first-added edge first)
    pub compute: Vec<NodeId>,
    /// Back edges discovered during the walk: (edge, re-entered node)
    pub cycles: Vec<(EdgeId, NodeId)>,
}

/// Depth-first walk over structural edges with a recursion stack, so each
/// back edge is recorded once and traversal always terminates.
pub(crate) fn structural_walk(graph: &Graph, root_id: NodeId) -> StructuralWalk {
    let mut walk = StructuralWalk {
        compute: Vec::new(),
        cycles: Vec::new(),
    };
    let mut visited = HashSet::new();
    let mut on_path = HashSet::new();
    walk_from(graph, root_id, &mut visited, &mut on_path, &mut walk);
    walk
}

fn walk_from(
    graph: &Graph,
    node_id: NodeId,
    visited: &mut HashSet<NodeId>,
    on_path: &mut HashSet<NodeId>,
    walk: &mut StructuralWalk,
) {
    visited.insert(node_id);
    on_path.insert(node_id);

    if let Some(node) = graph.node(node_id) {
        if node.node_type().is_compute() {
            walk.compute.push(node_id);
        }
    }

    for edge in graph.outgoing_edges(node_id) {
        let structural = graph
            .relation_of(edge)
            .map(|relation| relation.is_structural())
            .unwrap_or(false);
        if !structural {
            continue;
        }
        if on_path.contains(&edge.target_id) {
            walk.cycles.push((edge.id, edge.target_id));
        } else if !visited.contains(&edge.target_id) {
            walk_from(graph, edge.target_id, visited, on_path, walk);
        }
    }

    on_path.remove(&node_id);
}

/// All nodes reachable from the root along any outbound edge, preorder,
/// first-added edge first. Scope of the field-constraint check.
pub(crate) fn reachable_order(graph: &Graph, root_id: NodeId) -> Vec<NodeId> {
    let mut order = Vec::new();
    let mut visited = HashSet::new();
    reach_from(graph, root_id, &mut visited, &mut order);
    order
}

fn reach_from(
    graph: &Graph,
    node_id: NodeId,
    visited: &mut HashSet<NodeId>,
    order: &mut Vec<NodeId>,
) {
    if !visited.insert(node_id) {
        return;
    }
    order.push(node_id);
    for edge in graph.outgoing_edges(node_id) {
        reach_from(graph, edge.target_id, visited, order);
    }
}

/// Whether each reference kind resolves through edges or payload literals.
///
/// A kind is in edge mode when the graph contains at least one node of the
/// referenced type; with no such node the payload field is the resolved
/// literal.
pub(crate) struct ReferenceModes {
    pub network: bool,
    pub image: bool,
    pub user: bool,
    pub firewall: bool,
}

impl ReferenceModes {
    pub(crate) fn of(graph: &Graph) -> Self {
        let mut modes = Self {
            network: false,
            image: false,
            user: false,
            firewall: false,
        };
        for node in graph.nodes().values() {
            match node.node_type() {
                NodeType::NetworkConfig => modes.network = true,
                NodeType::ImageStore => modes.image = true,
                NodeType::UsersRoles => modes.user = true,
                NodeType::FirewallPolicies => modes.firewall = true,
                _ => {}
            }
        }
        modes
    }
}

/// Attachment edges of one compute node, grouped by relation, each group
/// in edge-insertion order
pub(crate) struct ComputeRefs<'a> {
    pub network: Vec<&'a Edge>,
    pub image: Vec<&'a Edge>,
    pub user: Vec<&'a Edge>,
    pub firewall: Vec<&'a Edge>,
}

pub(crate) fn compute_refs(graph: &Graph, node_id: NodeId) -> ComputeRefs<'_> {
    use crate::value_objects::EdgeRelation::*;
    let mut refs = ComputeRefs {
        network: Vec::new(),
        image: Vec::new(),
        user: Vec::new(),
        firewall: Vec::new(),
    };
    for edge in graph.outgoing_edges(node_id) {
        match graph.relation_of(edge) {
            Some(NetworkAttachment) => refs.network.push(edge),
            Some(ImageSource) => refs.image.push(edge),
            Some(AccessAttachment) => refs.user.push(edge),
            Some(FirewallAttachment) => refs.firewall.push(edge),
            _ => {}
        }
    }
    refs
}

/// Borrowed view of the fields shared by both compute payloads
pub(crate) struct ComputeFields<'a> {
    pub name: &'a str,
    pub cpu: u32,
    pub ram: &'a str,
    pub disk: Option<&'a str>,
    pub network: &'a str,
    pub image: &'a str,
    pub firewall: &'a [String],
    pub user: &'a str,
    pub replicas: u32,
}

pub(crate) fn compute_fields(payload: &NodePayload) -> Option<ComputeFields<'_>> {
    match payload {
        NodePayload::VmTemplate {
            name,
            cpu,
            ram,
            disk,
            network,
            image,
            firewall,
            user,
            replicas,
        } => Some(ComputeFields {
            name,
            cpu: *cpu,
            ram,
            disk: Some(disk),
            network,
            image,
            firewall,
            user,
            replicas: *replicas,
        }),
        NodePayload::ContainerTemplate {
            name,
            cpu,
            ram,
            network,
            image,
            firewall,
            user,
            replicas,
        } => Some(ComputeFields {
            name,
            cpu: *cpu,
            ram,
            disk: None,
            network,
            image,
            firewall,
            user,
            replicas: *replicas,
        }),
        _ => None,
    }
}

/// The identifier a reference target resolves to: the payload name when
/// the payload carries one, the node label otherwise
pub(crate) fn resolved_name(graph: &Graph, node_id: NodeId) -> Option<&str> {
    let node = graph.node(node_id)?;
    match node.payload.name() {
        Some(name) if !name.is_empty() => Some(name),
        _ => Some(node.label.as_str()),
    }
}

fn closure_issues(
    graph: &Graph,
    node_id: NodeId,
    modes: &ReferenceModes,
    issues: &mut Vec<ValidationIssue>,
) {
    let Some(node) = graph.node(node_id) else {
        return;
    };
    let Some(fields) = compute_fields(&node.payload) else {
        return;
    };
    let refs = compute_refs(graph, node_id);

    let required: [(ReferenceKind, &[&Edge], bool, &str); 3] = [
        (ReferenceKind::Network, &refs.network, modes.network, fields.network),
        (ReferenceKind::Image, &refs.image, modes.image, fields.image),
        (ReferenceKind::User, &refs.user, modes.user, fields.user),
    ];

    for (kind, edges, edge_mode, literal) in required {
        match edges.len() {
            0 => {
                // Edge mode: an attachment edge is required. Literal mode:
                // the payload field is the resolved value and must be set.
                if edge_mode || literal.is_empty() {
                    issues.push(
                        ValidationIssue::error(IssueKind::MissingReference, kind.to_string())
                            .at_node(node_id),
                    );
                }
            }
            1 => {}
            n => {
                issues.push(
                    ValidationIssue::error(
                        IssueKind::InvalidField,
                        format!("{kind}: expects exactly one {kind} attachment, found {n}"),
                    )
                    .at_node(node_id),
                );
            }
        }
    }
}

fn agreement_issues(
    graph: &Graph,
    node_id: NodeId,
    modes: &ReferenceModes,
    issues: &mut Vec<ValidationIssue>,
) {
    let Some(node) = graph.node(node_id) else {
        return;
    };
    let Some(fields) = compute_fields(&node.payload) else {
        return;
    };
    let refs = compute_refs(graph, node_id);

    let singular: [(ReferenceKind, &[&Edge], &str); 3] = [
        (ReferenceKind::Network, &refs.network, fields.network),
        (ReferenceKind::Image, &refs.image, fields.image),
        (ReferenceKind::User, &refs.user, fields.user),
    ];

    for (kind, edges, literal) in singular {
        // An empty payload field defers to the edge; only a set field can
        // disagree with it.
        if let [edge] = edges {
            if let Some(resolved) = resolved_name(graph, edge.target_id) {
                if !literal.is_empty() && literal != resolved {
                    issues.push(
                        ValidationIssue::error(
                            IssueKind::ReferenceMismatch,
                            format!("{kind}: payload says '{literal}', edge resolves to '{resolved}'"),
                        )
                        .at_node(node_id)
                        .at_edge(edge.id),
                    );
                }
            }
        }
    }

    // Firewall lists are optional; disagreement is best-effort compilable,
    // so it downgrades to a warning.
    if !refs.firewall.is_empty() {
        let attached: Vec<&str> = refs
            .firewall
            .iter()
            .filter_map(|edge| resolved_name(graph, edge.target_id))
            .collect();
        let payload_set: HashSet<&str> = fields.firewall.iter().map(String::as_str).collect();
        let attached_set: HashSet<&str> = attached.iter().copied().collect();
        if !fields.firewall.is_empty() && payload_set != attached_set {
            issues.push(
                ValidationIssue::warning(
                    IssueKind::ReferenceMismatch,
                    format!(
                        "firewall: payload lists [{}], edges resolve to [{}]",
                        fields.firewall.join(", "),
                        attached.join(", ")
                    ),
                )
                .at_node(node_id),
            );
        }
    } else if modes.firewall && !fields.firewall.is_empty() {
        issues.push(
            ValidationIssue::warning(
                IssueKind::ReferenceMismatch,
                "firewall: payload list has no attached policies; compiling with an empty set",
            )
            .at_node(node_id),
        );
    }
}

fn field_issues(node: &crate::aggregate::Node, issues: &mut Vec<ValidationIssue>) {
    let node_id = node.id;
    let mut invalid = |severity: Severity, field: &str, reason: &str| {
        let issue = ValidationIssue {
            severity,
            kind: IssueKind::InvalidField,
            node_id: Some(node_id),
            edge_id: None,
            detail: format!("{field}: {reason}"),
        };
        issues.push(issue);
    };

    if let Some(fields) = compute_fields(&node.payload) {
        if fields.cpu == 0 {
            invalid(Severity::Error, "cpu", "must be greater than zero");
        }
        if fields.replicas == 0 {
            invalid(Severity::Error, "replicas", "must be at least 1");
        }
        if fields.name.is_empty() {
            invalid(Severity::Warning, "name", "empty; a placeholder name will be used");
        }
        if fields.ram.is_empty() {
            invalid(Severity::Warning, "ram", "empty; the default size will be used");
        }
        return;
    }

    match &node.payload {
        NodePayload::NetworkConfig {
            name,
            subnet,
            gateway,
            ..
        } => {
            if name.is_empty() {
                invalid(Severity::Error, "name", "must not be empty");
            }
            if !is_valid_cidr(subnet) {
                invalid(Severity::Error, "subnet", "not a well-formed IPv4 CIDR");
            }
            if gateway.parse::<Ipv4Addr>().is_err() {
                invalid(Severity::Error, "gateway", "not a well-formed IPv4 address");
            }
        }
        NodePayload::FirewallPolicies { name, .. } => {
            if name.is_empty() {
                invalid(Severity::Error, "name", "must not be empty");
            }
        }
        _ => {}
    }
}

fn is_valid_cidr(subnet: &str) -> bool {
    match subnet.split_once('/') {
        Some((addr, prefix)) => {
            addr.parse::<Ipv4Addr>().is_ok()
                && prefix.parse::<u8>().map(|p| p <= 32).unwrap_or(false)
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value_objects::NodePayload;

    fn cluster_payload(name: &str) -> NodePayload {
        NodePayload::Cluster {
            cluster_name: name.to_string(),
        }
    }

    fn vm_payload(name: &str) -> NodePayload {
        NodePayload::VmTemplate {
            name: name.to_string(),
            cpu: 2,
            ram: "4GB".to_string(),
            disk: "20GB".to_string(),
            network: "net1".to_string(),
            image: "ubuntu-22.04".to_string(),
            firewall: vec![],
            user: "alice".to_string(),
            replicas: 1,
        }
    }

    fn network_payload(name: &str) -> NodePayload {
        NodePayload::NetworkConfig {
            name: name.to_string(),
            subnet: "10.0.0.0/24".to_string(),
            gateway: "10.0.0.1".to_string(),
            dhcp: true,
        }
    }

    #[test]
    fn test_missing_root_is_contract_violation() {
        let graph = Graph::new("g", "");
        let missing = NodeId::new();
        assert_eq!(
            validate(&graph, missing),
            Err(ContractViolation::RootNotFound(missing))
        );
    }

    #[test]
    fn test_non_cluster_root_is_invalid_root() {
        let mut graph = Graph::new("g", "");
        let group = graph.add_node("group", NodePayload::NodeGroup);

        let outcome = validate(&graph, group).unwrap();
        let issues = outcome.issues();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::InvalidRoot);
        assert_eq!(issues[0].severity, Severity::Error);
        assert_eq!(issues[0].node_id, Some(group));
    }

    #[test]
    fn test_literal_mode_graph_is_valid() {
        // No networkConfig/imageStore/usersRoles nodes anywhere: the
        // payload fields are the resolved literals.
        let mut graph = Graph::new("g", "");
        let cluster = graph.add_node("cluster", cluster_payload("prod"));
        let group = graph.add_node("group", NodePayload::NodeGroup);
        let vm = graph.add_node("web1", vm_payload("web1"));
        graph.connect(cluster, group).unwrap();
        graph.connect(group, vm).unwrap();

        let outcome = validate(&graph, cluster).unwrap();
        assert!(outcome.is_valid(), "unexpected issues: {:?}", outcome.issues());
    }

    #[test]
    fn test_missing_network_edge_in_edge_mode() {
        let mut graph = Graph::new("g", "");
        let cluster = graph.add_node("cluster", cluster_payload("prod"));
        let group = graph.add_node("group", NodePayload::NodeGroup);
        let vm = graph.add_node("web1", vm_payload("web1"));
        // The network node exists, so the reference must resolve by edge.
        let _net = graph.add_node("net1", network_payload("net1"));
        graph.connect(cluster, group).unwrap();
        graph.connect(group, vm).unwrap();

        let outcome = validate(&graph, cluster).unwrap();
        let issues = outcome.issues();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::MissingReference);
        assert_eq!(issues[0].detail, "network");
        assert_eq!(issues[0].node_id, Some(vm));
        assert!(!outcome.is_compilable());
    }

    #[test]
    fn test_reference_mismatch() {
        let mut graph = Graph::new("g", "");
        let cluster = graph.add_node("cluster", cluster_payload("prod"));
        let group = graph.add_node("group", NodePayload::NodeGroup);
        let vm = graph.add_node("web1", vm_payload("web1"));
        let net = graph.add_node("net2", network_payload("net2"));
        graph.connect(cluster, group).unwrap();
        graph.connect(group, vm).unwrap();
        // Payload says net1 but the edge resolves to net2.
        graph.connect(vm, net).unwrap();

        let outcome = validate(&graph, cluster).unwrap();
        let issues = outcome.issues();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::ReferenceMismatch);
        assert_eq!(issues[0].severity, Severity::Error);
        assert!(issues[0].detail.contains("net1"));
        assert!(issues[0].detail.contains("net2"));
    }

    #[test]
    fn test_image_mismatch_resolves_through_label() {
        let mut graph = Graph::new("g", "");
        let cluster = graph.add_node("cluster", cluster_payload("prod"));
        let vm = graph.add_node("web1", vm_payload("web1"));
        // Image stores carry no payload name; the label identifies them.
        let image = graph.add_node("debian-12", NodePayload::ImageStore);
        graph.connect(cluster, vm).unwrap();
        graph.connect(vm, image).unwrap();

        let outcome = validate(&graph, cluster).unwrap();
        let issues = outcome.issues();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::ReferenceMismatch);
        assert_eq!(issues[0].severity, Severity::Error);
        assert!(issues[0].detail.starts_with("image"));
        assert!(issues[0].detail.contains("ubuntu-22.04"));
        assert!(issues[0].detail.contains("debian-12"));
    }

    #[test]
    fn test_user_mismatch_resolves_through_label() {
        let mut graph = Graph::new("g", "");
        let cluster = graph.add_node("cluster", cluster_payload("prod"));
        let vm = graph.add_node("web1", vm_payload("web1"));
        let user = graph.add_node("bob", NodePayload::UsersRoles);
        graph.connect(cluster, vm).unwrap();
        graph.connect(vm, user).unwrap();

        let outcome = validate(&graph, cluster).unwrap();
        let issues = outcome.issues();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::ReferenceMismatch);
        assert_eq!(issues[0].severity, Severity::Error);
        assert!(issues[0].detail.starts_with("user"));
        assert!(issues[0].detail.contains("alice"));
        assert!(issues[0].detail.contains("bob"));
    }

    #[test]
    fn test_firewall_disagreement_is_warning() {
        let mut graph = Graph::new("g", "");
        let cluster = graph.add_node("cluster", cluster_payload("prod"));
        let vm = graph.add_node(
            "web1",
            NodePayload::VmTemplate {
                name: "web1".to_string(),
                cpu: 2,
                ram: "4GB".to_string(),
                disk: "20GB".to_string(),
                network: "net1".to_string(),
                image: "ubuntu-22.04".to_string(),
                firewall: vec!["fw2".to_string()],
                user: "alice".to_string(),
                replicas: 1,
            },
        );
        let fw = graph.add_node(
            "fw1",
            NodePayload::FirewallPolicies {
                name: "fw1".to_string(),
                rules: vec![],
            },
        );
        graph.connect(cluster, vm).unwrap();
        graph.connect(vm, fw).unwrap();

        let outcome = validate(&graph, cluster).unwrap();
        let issues = outcome.issues();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::ReferenceMismatch);
        assert_eq!(issues[0].severity, Severity::Warning);
        assert!(issues[0].detail.starts_with("firewall"));
        assert!(issues[0].detail.contains("fw1"));
        assert!(issues[0].detail.contains("fw2"));
        assert!(outcome.is_compilable());
    }

    #[test]
    fn test_cycle_reported_once_as_warning() {
        let mut graph = Graph::new("g", "");
        let cluster = graph.add_node("cluster", cluster_payload("prod"));
        let a = graph.add_node("a", NodePayload::NodeGroup);
        let b = graph.add_node("b", NodePayload::NodeGroup);
        graph.connect(cluster, a).unwrap();
        graph.connect(a, b).unwrap();
        graph.connect(b, a).unwrap();

        let outcome = validate(&graph, cluster).unwrap();
        let cycles: Vec<_> = outcome
            .issues()
            .iter()
            .filter(|issue| issue.kind == IssueKind::StructuralCycle)
            .collect();
        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0].severity, Severity::Warning);
        assert!(outcome.is_compilable());
    }

    #[test]
    fn test_cpu_zero_is_error() {
        let mut graph = Graph::new("g", "");
        let cluster = graph.add_node("cluster", cluster_payload("prod"));
        let vm = graph.add_node(
            "web1",
            NodePayload::VmTemplate {
                name: "web1".to_string(),
                cpu: 0,
                ram: "4GB".to_string(),
                disk: "20GB".to_string(),
                network: "net1".to_string(),
                image: "ubuntu-22.04".to_string(),
                firewall: vec![],
                user: "alice".to_string(),
                replicas: 1,
            },
        );
        graph.connect(cluster, vm).unwrap();

        let outcome = validate(&graph, cluster).unwrap();
        let issues = outcome.issues();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::InvalidField);
        assert!(issues[0].detail.starts_with("cpu"));
        assert!(!outcome.is_compilable());
    }

    #[test]
    fn test_malformed_subnet_and_gateway() {
        let mut graph = Graph::new("g", "");
        let cluster = graph.add_node("cluster", cluster_payload("prod"));
        let vm = graph.add_node("web1", vm_payload("web1"));
        let net = graph.add_node(
            "net1",
            NodePayload::NetworkConfig {
                name: "net1".to_string(),
                subnet: "10.0.0.0".to_string(),
                gateway: "not-an-ip".to_string(),
                dhcp: false,
            },
        );
        graph.connect(cluster, vm).unwrap();
        graph.connect(vm, net).unwrap();

        let outcome = validate(&graph, cluster).unwrap();
        let details: Vec<&str> = outcome
            .issues()
            .iter()
            .map(|issue| issue.detail.as_str())
            .collect();
        assert!(details.iter().any(|d| d.starts_with("subnet")));
        assert!(details.iter().any(|d| d.starts_with("gateway")));
    }

    #[test]
    fn test_illegal_edge_is_flagged_but_compilable() {
        let mut graph = Graph::new("g", "");
        let cluster = graph.add_node("cluster", cluster_payload("prod"));
        let net = graph.add_node("net1", network_payload("net1"));
        // No relation is defined from a cluster to a network.
        let edge_id = graph.connect(cluster, net).unwrap();

        let outcome = validate(&graph, cluster).unwrap();
        let issues = outcome.issues();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::IllegalEdge);
        assert_eq!(issues[0].severity, Severity::Warning);
        assert_eq!(issues[0].edge_id, Some(edge_id));
        assert!(outcome.is_compilable());
    }

    #[test]
    fn test_cidr_parsing() {
        assert!(is_valid_cidr("10.0.0.0/24"));
        assert!(is_valid_cidr("192.168.1.0/32"));
        assert!(!is_valid_cidr("10.0.0.0"));
        assert!(!is_valid_cidr("10.0.0.0/33"));
        assert!(!is_valid_cidr("300.0.0.0/24"));
        assert!(!is_valid_cidr(""));
    }

    #[test]
    fn test_issue_wire_shape() {
        let mut graph = Graph::new("g", "");
        let cluster = graph.add_node("cluster", cluster_payload("prod"));
        let vm = graph.add_node("web1", vm_payload("web1"));
        let _net = graph.add_node("net1", network_payload("net1"));
        graph.connect(cluster, vm).unwrap();

        let outcome = validate(&graph, cluster).unwrap();
        let value = serde_json::to_value(&outcome.issues()[0]).unwrap();
        assert_eq!(value["severity"], "error");
        assert_eq!(value["kind"], "MissingReference");
        assert_eq!(value["detail"], "network");
        assert!(value.get("edgeId").is_none());
    }
}
