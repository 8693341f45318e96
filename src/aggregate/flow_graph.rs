//! Flow Graph Aggregate
//!
//! The in-memory representation of one editing session's infrastructure
//! diagram: typed nodes, directed edges, and an incrementally maintained
//! adjacency index. The aggregate is a dumb, always-consistent container;
//! type-pair legality and reference checking belong to the validator.

use std::collections::HashMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::commands::GraphCommandError;
use crate::value_objects::{Direction, EdgeId, EdgeRelation, GraphId, NodeId, NodePayload, NodeType};

/// A typed node in the infrastructure diagram
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Unique identifier, stable for the node's lifetime
    pub id: NodeId,
    /// Display label
    pub label: String,
    /// Typed payload; the node's type is its discriminant
    #[serde(flatten)]
    pub payload: NodePayload,
}

impl Node {
    /// The node's type, derived from its payload
    pub fn node_type(&self) -> NodeType {
        self.payload.node_type()
    }
}

/// A directed edge between two nodes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    /// Unique identifier for the edge
    pub id: EdgeId,
    /// Source node of the edge
    pub source_id: NodeId,
    /// Target node of the edge
    pub target_id: NodeId,
}

/// Flow graph aggregate for one editing session.
///
/// Nodes and edges are stored in insertion-ordered maps so every read pass
/// over the graph (validation, compilation, queries) is deterministic.
#[derive(Debug, Clone)]
pub struct Graph {
    /// Unique identifier for the graph
    id: GraphId,
    /// Human-readable name of the graph
    name: String,
    /// Description of the graph's purpose
    description: String,
    /// All nodes, in insertion order
    nodes: IndexMap<NodeId, Node>,
    /// All edges, in insertion order
    edges: IndexMap<EdgeId, Edge>,
    /// Outbound adjacency index, edge ids in insertion order
    outgoing: HashMap<NodeId, Vec<EdgeId>>,
    /// Inbound adjacency index, edge ids in insertion order
    incoming: HashMap<NodeId, Vec<EdgeId>>,
    /// When the graph was created
    created_at: chrono::DateTime<chrono::Utc>,
    /// When the graph was last modified
    last_modified: chrono::DateTime<chrono::Utc>,
    /// Version for optimistic concurrency control
    version: u64,
}

impl Graph {
    /// Create a new empty graph
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        let now = chrono::Utc::now();
        Self {
            id: GraphId::new(),
            name: name.into(),
            description: description.into(),
            nodes: IndexMap::new(),
            edges: IndexMap::new(),
            outgoing: HashMap::new(),
            incoming: HashMap::new(),
            created_at: now,
            last_modified: now,
            version: 1,
        }
    }

    /// Get the graph's identifier
    pub fn id(&self) -> GraphId {
        self.id
    }

    /// Get the graph's name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the graph's description
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Get all nodes, in insertion order
    pub fn nodes(&self) -> &IndexMap<NodeId, Node> {
        &self.nodes
    }

    /// Get all edges, in insertion order
    pub fn edges(&self) -> &IndexMap<EdgeId, Edge> {
        &self.edges
    }

    /// Get a node by id
    pub fn node(&self, node_id: NodeId) -> Option<&Node> {
        self.nodes.get(&node_id)
    }

    /// Get an edge by id
    pub fn edge(&self, edge_id: EdgeId) -> Option<&Edge> {
        self.edges.get(&edge_id)
    }

    /// Whether a node exists in the graph
    pub fn contains_node(&self, node_id: NodeId) -> bool {
        self.nodes.contains_key(&node_id)
    }

    /// Get node count
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Get edge count
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Get creation timestamp
    pub fn created_at(&self) -> chrono::DateTime<chrono::Utc> {
        self.created_at
    }

    /// Get last modified timestamp
    pub fn last_modified(&self) -> chrono::DateTime<chrono::Utc> {
        self.last_modified
    }

    /// Get current version
    pub fn version(&self) -> u64 {
        self.version
    }

    fn touch(&mut self) {
        self.last_modified = chrono::Utc::now();
        self.version += 1;
    }

    /// Add a node to the graph, returning its freshly allocated id.
    ///
    /// Never fails: the id is minted here, so it cannot collide.
    pub fn add_node(&mut self, label: impl Into<String>, payload: NodePayload) -> NodeId {
        let node_id = NodeId::new();
        let node = Node {
            id: node_id,
            label: label.into(),
            payload,
        };
        debug!(%node_id, node_type = %node.node_type(), "adding node");
        self.nodes.insert(node_id, node);
        self.outgoing.insert(node_id, Vec::new());
        self.incoming.insert(node_id, Vec::new());
        self.touch();
        node_id
    }

    /// Replace a node's label and payload in place, keeping its id and
    /// every incident edge.
    ///
    /// The node's type is fixed at creation: a payload whose discriminant
    /// differs from the current one is rejected with `TypeChange`.
    pub fn update_node(
        &mut self,
        node_id: NodeId,
        label: impl Into<String>,
        payload: NodePayload,
    ) -> Result<(), GraphCommandError> {
        let Some(node) = self.nodes.get_mut(&node_id) else {
            return Err(GraphCommandError::UnknownNode(node_id));
        };
        if payload.node_type() != node.node_type() {
            return Err(GraphCommandError::TypeChange(node_id, node.node_type()));
        }
        node.label = label.into();
        node.payload = payload;
        debug!(%node_id, "updated node");
        self.touch();
        Ok(())
    }

    /// Remove a node and every edge where it is source or target.
    ///
    /// No-op when the node is absent.
    pub fn remove_node(&mut self, node_id: NodeId) {
        if self.nodes.shift_remove(&node_id).is_none() {
            return;
        }

        let mut incident: Vec<EdgeId> = self.outgoing.remove(&node_id).unwrap_or_default();
        incident.extend(self.incoming.remove(&node_id).unwrap_or_default());

        for edge_id in incident {
            if let Some(edge) = self.edges.shift_remove(&edge_id) {
                self.unlink(&edge);
            }
        }

        debug!(%node_id, "removed node and incident edges");
        self.touch();
    }

    /// Connect two nodes with a directed edge.
    ///
    /// Fails with `UnknownNode` when either endpoint is missing and with
    /// `DuplicateEdge` when the same (source, target) pair already exists.
    /// Type-pair legality is not enforced here.
    pub fn connect(
        &mut self,
        source_id: NodeId,
        target_id: NodeId,
    ) -> Result<EdgeId, GraphCommandError> {
        if !self.nodes.contains_key(&source_id) {
            return Err(GraphCommandError::UnknownNode(source_id));
        }
        if !self.nodes.contains_key(&target_id) {
            return Err(GraphCommandError::UnknownNode(target_id));
        }

        let duplicate = self
            .outgoing
            .get(&source_id)
            .into_iter()
            .flatten()
            .filter_map(|edge_id| self.edges.get(edge_id))
            .any(|edge| edge.target_id == target_id);
        if duplicate {
            return Err(GraphCommandError::DuplicateEdge(source_id, target_id));
        }

        let edge_id = EdgeId::new();
        self.edges.insert(
            edge_id,
            Edge {
                id: edge_id,
                source_id,
                target_id,
            },
        );
        self.outgoing.entry(source_id).or_default().push(edge_id);
        self.incoming.entry(target_id).or_default().push(edge_id);
        debug!(%edge_id, %source_id, %target_id, "connected nodes");
        self.touch();
        Ok(edge_id)
    }

    /// Remove an edge. No-op when the edge is absent, so a second
    /// disconnect of the same edge never errors.
    pub fn disconnect(&mut self, edge_id: EdgeId) {
        if let Some(edge) = self.edges.shift_remove(&edge_id) {
            self.unlink(&edge);
            debug!(%edge_id, "disconnected edge");
            self.touch();
        }
    }

    fn unlink(&mut self, edge: &Edge) {
        if let Some(out) = self.outgoing.get_mut(&edge.source_id) {
            out.retain(|id| *id != edge.id);
        }
        if let Some(inc) = self.incoming.get_mut(&edge.target_id) {
            inc.retain(|id| *id != edge.id);
        }
    }

    /// Adjacent node ids in the given direction, in edge-insertion order
    pub fn neighbors(&self, node_id: NodeId, direction: Direction) -> Vec<NodeId> {
        let index = match direction {
            Direction::Out => &self.outgoing,
            Direction::In => &self.incoming,
        };
        index
            .get(&node_id)
            .into_iter()
            .flatten()
            .filter_map(|edge_id| self.edges.get(edge_id))
            .map(|edge| match direction {
                Direction::Out => edge.target_id,
                Direction::In => edge.source_id,
            })
            .collect()
    }

    /// Outbound edges of a node, in insertion order
    pub fn outgoing_edges(&self, node_id: NodeId) -> Vec<&Edge> {
        self.outgoing
            .get(&node_id)
            .into_iter()
            .flatten()
            .filter_map(|edge_id| self.edges.get(edge_id))
            .collect()
    }

    /// Inbound edges of a node, in insertion order
    pub fn incoming_edges(&self, node_id: NodeId) -> Vec<&Edge> {
        self.incoming
            .get(&node_id)
            .into_iter()
            .flatten()
            .filter_map(|edge_id| self.edges.get(edge_id))
            .collect()
    }

    /// The semantic relation of an edge, from its endpoint types
    pub fn relation_of(&self, edge: &Edge) -> Option<EdgeRelation> {
        let source = self.nodes.get(&edge.source_id)?;
        let target = self.nodes.get(&edge.target_id)?;
        EdgeRelation::classify(source.node_type(), target.node_type())
    }

    /// The induced subgraph of all nodes reachable from `root_id` along
    /// outbound edges. Node and edge ids are preserved; insertion order of
    /// the parent graph is kept. Returns an empty graph when the root is
    /// absent.
    pub fn subgraph_from(&self, root_id: NodeId) -> Graph {
        let mut reachable = std::collections::HashSet::new();
        if self.nodes.contains_key(&root_id) {
            let mut stack = vec![root_id];
            while let Some(node_id) = stack.pop() {
                if !reachable.insert(node_id) {
                    continue;
                }
                for edge in self.outgoing_edges(node_id) {
                    if !reachable.contains(&edge.target_id) {
                        stack.push(edge.target_id);
                    }
                }
            }
        }

        let mut subgraph = Graph::new(self.name.clone(), self.description.clone());
        for (node_id, node) in &self.nodes {
            if reachable.contains(node_id) {
                subgraph.nodes.insert(*node_id, node.clone());
                subgraph.outgoing.insert(*node_id, Vec::new());
                subgraph.incoming.insert(*node_id, Vec::new());
            }
        }
        for (edge_id, edge) in &self.edges {
            // Every outbound edge of a reachable node has a reachable target
            if reachable.contains(&edge.source_id) {
                subgraph.edges.insert(*edge_id, *edge);
                subgraph
                    .outgoing
                    .entry(edge.source_id)
                    .or_default()
                    .push(*edge_id);
                subgraph
                    .incoming
                    .entry(edge.target_id)
                    .or_default()
                    .push(*edge_id);
            }
        }
        subgraph
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph() -> Graph {
        Graph::new("Test Graph", "A test graph")
    }

    #[test]
    fn test_graph_creation() {
        let graph = graph();
        assert_eq!(graph.name(), "Test Graph");
        assert_eq!(graph.description(), "A test graph");
        assert_eq!(graph.node_count(), 0);
        assert_eq!(graph.edge_count(), 0);
        assert_eq!(graph.version(), 1);
    }

    #[test]
    fn test_add_node() {
        let mut graph = graph();
        let node_id = graph.add_node("prod", NodePayload::default_for(NodeType::Cluster));

        assert!(graph.contains_node(node_id));
        assert_eq!(graph.node_count(), 1);
        assert_eq!(graph.version(), 2);
        assert_eq!(graph.node(node_id).unwrap().node_type(), NodeType::Cluster);
    }

    #[test]
    fn test_connect_and_duplicate() {
        let mut graph = graph();
        let cluster = graph.add_node("cluster", NodePayload::default_for(NodeType::Cluster));
        let group = graph.add_node("group", NodePayload::NodeGroup);

        let edge_id = graph.connect(cluster, group).unwrap();
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.edge(edge_id).unwrap().target_id, group);

        let duplicate = graph.connect(cluster, group);
        assert_eq!(
            duplicate,
            Err(GraphCommandError::DuplicateEdge(cluster, group))
        );

        let missing = graph.connect(cluster, NodeId::new());
        assert!(matches!(missing, Err(GraphCommandError::UnknownNode(_))));
    }

    #[test]
    fn test_update_node_replaces_label_and_payload() {
        let mut graph = graph();
        let net = graph.add_node("net", NodePayload::default_for(NodeType::NetworkConfig));
        let version = graph.version();

        let payload = NodePayload::NetworkConfig {
            name: "lan0".to_string(),
            subnet: "10.1.0.0/24".to_string(),
            gateway: "10.1.0.1".to_string(),
            dhcp: false,
        };
        graph.update_node(net, "lan0", payload.clone()).unwrap();

        let node = graph.node(net).unwrap();
        assert_eq!(node.id, net);
        assert_eq!(node.label, "lan0");
        assert_eq!(node.payload, payload);
        assert!(graph.version() > version);
    }

    #[test]
    fn test_update_node_rejects_type_change() {
        let mut graph = graph();
        let group = graph.add_node("group", NodePayload::NodeGroup);
        let version = graph.version();

        let result =
            graph.update_node(group, "group", NodePayload::default_for(NodeType::VmTemplate));
        assert_eq!(
            result,
            Err(GraphCommandError::TypeChange(group, NodeType::NodeGroup))
        );
        assert_eq!(graph.node(group).unwrap().payload, NodePayload::NodeGroup);
        assert_eq!(graph.version(), version);
    }

    #[test]
    fn test_update_missing_node_errors() {
        let mut graph = graph();
        let missing = NodeId::new();
        assert_eq!(
            graph.update_node(missing, "x", NodePayload::NodeGroup),
            Err(GraphCommandError::UnknownNode(missing))
        );
    }

    #[test]
    fn test_remove_node_cascades_edges() {
        let mut graph = graph();
        let cluster = graph.add_node("cluster", NodePayload::default_for(NodeType::Cluster));
        let group = graph.add_node("group", NodePayload::NodeGroup);
        let vm = graph.add_node("vm", NodePayload::default_for(NodeType::VmTemplate));

        graph.connect(cluster, group).unwrap();
        graph.connect(group, vm).unwrap();
        assert_eq!(graph.edge_count(), 2);

        graph.remove_node(group);

        assert!(!graph.contains_node(group));
        assert_eq!(graph.edge_count(), 0);
        assert!(graph.neighbors(cluster, Direction::Out).is_empty());
        assert!(graph.neighbors(vm, Direction::In).is_empty());
        assert!(graph.outgoing_edges(group).is_empty());

        // Removing again is a no-op
        let version = graph.version();
        graph.remove_node(group);
        assert_eq!(graph.version(), version);
    }

    #[test]
    fn test_disconnect_is_idempotent() {
        let mut graph = graph();
        let a = graph.add_node("a", NodePayload::NodeGroup);
        let b = graph.add_node("b", NodePayload::NodeGroup);
        let edge_id = graph.connect(a, b).unwrap();

        graph.disconnect(edge_id);
        assert_eq!(graph.edge_count(), 0);

        let version = graph.version();
        graph.disconnect(edge_id);
        assert_eq!(graph.version(), version);
    }

    #[test]
    fn test_neighbors_in_insertion_order() {
        let mut graph = graph();
        let vm = graph.add_node("vm", NodePayload::default_for(NodeType::VmTemplate));
        let fw1 = graph.add_node("fw1", NodePayload::default_for(NodeType::FirewallPolicies));
        let fw2 = graph.add_node("fw2", NodePayload::default_for(NodeType::FirewallPolicies));

        graph.connect(vm, fw1).unwrap();
        graph.connect(vm, fw2).unwrap();

        assert_eq!(graph.neighbors(vm, Direction::Out), vec![fw1, fw2]);
        assert_eq!(graph.neighbors(fw1, Direction::In), vec![vm]);
    }

    #[test]
    fn test_relation_of() {
        let mut graph = graph();
        let group = graph.add_node("group", NodePayload::NodeGroup);
        let vm = graph.add_node("vm", NodePayload::default_for(NodeType::VmTemplate));
        let edge_id = graph.connect(group, vm).unwrap();

        let edge = *graph.edge(edge_id).unwrap();
        assert_eq!(graph.relation_of(&edge), Some(EdgeRelation::Hosting));
    }

    #[test]
    fn test_subgraph_from_scopes_to_reachable() {
        let mut graph = graph();
        let cluster = graph.add_node("cluster", NodePayload::default_for(NodeType::Cluster));
        let group = graph.add_node("group", NodePayload::NodeGroup);
        let vm = graph.add_node("vm", NodePayload::default_for(NodeType::VmTemplate));
        let stray = graph.add_node("stray", NodePayload::default_for(NodeType::NetworkConfig));

        graph.connect(cluster, group).unwrap();
        graph.connect(group, vm).unwrap();

        let subgraph = graph.subgraph_from(cluster);
        assert_eq!(subgraph.node_count(), 3);
        assert_eq!(subgraph.edge_count(), 2);
        assert!(subgraph.contains_node(vm));
        assert!(!subgraph.contains_node(stray));
        assert_eq!(subgraph.neighbors(group, Direction::Out), vec![vm]);
    }

    #[test]
    fn test_subgraph_from_missing_root_is_empty() {
        let graph = graph();
        let subgraph = graph.subgraph_from(NodeId::new());
        assert_eq!(subgraph.node_count(), 0);
        assert_eq!(subgraph.edge_count(), 0);
    }
}
