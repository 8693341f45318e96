//! Graph commands
//!
//! Commands represent intent to modify graph state. The presentation
//! adapter turns user gestures (drop, connect, delete) into commands and
//! applies them synchronously, keeping input-event plumbing out of the
//! mutation contract.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::aggregate::Graph;
use crate::value_objects::{EdgeId, NodeId, NodePayload, NodeType};

/// Commands for graph mutations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GraphCommand {
    /// Add a node with the given label and typed payload
    AddNode {
        /// Display label for the node
        label: String,
        /// Typed payload; its discriminant is the node type
        payload: NodePayload,
    },

    /// Replace a node's label and payload, keeping its id and edges
    UpdateNode {
        /// The node to update
        node_id: NodeId,
        /// New display label
        label: String,
        /// New payload; must keep the node's type
        payload: NodePayload,
    },

    /// Remove a node, cascading deletion of its incident edges
    RemoveNode {
        /// The node to remove
        node_id: NodeId,
    },

    /// Connect two nodes with a directed edge
    Connect {
        /// Source node of the edge
        source_id: NodeId,
        /// Target node of the edge
        target_id: NodeId,
    },

    /// Remove an edge
    Disconnect {
        /// The edge to remove
        edge_id: EdgeId,
    },
}

/// What a successfully applied command did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommandEffect {
    /// A node was added with this id
    NodeAdded(NodeId),
    /// A node's label and payload were replaced
    NodeUpdated,
    /// A node (and its incident edges) was removed
    NodeRemoved,
    /// An edge was added with this id
    EdgeAdded(EdgeId),
    /// An edge was removed
    EdgeRemoved,
}

/// Result type for graph command processing
pub type GraphCommandResult<T> = Result<T, GraphCommandError>;

/// Structural errors from graph mutation attempts, surfaced to the
/// presentation adapter so it can reject the gesture that caused them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GraphCommandError {
    /// An edge endpoint does not exist in the graph
    #[error("unknown node: {0}")]
    UnknownNode(NodeId),
    /// An identical (source, target) edge already exists
    #[error("duplicate edge from {0} to {1}")]
    DuplicateEdge(NodeId, NodeId),
    /// A payload update attempted to change the node's type
    #[error("node {0} is a {1} node; updates cannot change its type")]
    TypeChange(NodeId, NodeType),
}

impl Graph {
    /// Apply a command to the graph.
    ///
    /// `RemoveNode` and `Disconnect` are no-ops when the target is already
    /// gone, matching the underlying operations.
    pub fn apply(&mut self, command: GraphCommand) -> GraphCommandResult<CommandEffect> {
        match command {
            GraphCommand::AddNode { label, payload } => {
                Ok(CommandEffect::NodeAdded(self.add_node(label, payload)))
            }
            GraphCommand::UpdateNode {
                node_id,
                label,
                payload,
            } => {
                self.update_node(node_id, label, payload)?;
                Ok(CommandEffect::NodeUpdated)
            }
            GraphCommand::RemoveNode { node_id } => {
                self.remove_node(node_id);
                Ok(CommandEffect::NodeRemoved)
            }
            GraphCommand::Connect {
                source_id,
                target_id,
            } => Ok(CommandEffect::EdgeAdded(self.connect(source_id, target_id)?)),
            GraphCommand::Disconnect { edge_id } => {
                self.disconnect(edge_id);
                Ok(CommandEffect::EdgeRemoved)
            }
        }
    }
}
