//! Infrastructure flow graph domain
//!
//! The core model behind a visual infrastructure designer: a palette of
//! typed building blocks (clusters, node groups, VM/container templates,
//! networks, firewalls, users, scaling rules) assembled into a directed
//! graph, validated for structural and referential well-formedness, and
//! compiled into a concrete `DeploymentConfig` for an external
//! provisioning backend.
//!
//! Rendering, drag-and-drop, and transport are external collaborators;
//! this crate owns only the graph, its validation rules, and the
//! compilation step. Everything here is synchronous and single-threaded:
//! one editing session owns one [`Graph`], and validation/compilation are
//! pure read passes over it.

pub mod aggregate;
pub mod catalog;
pub mod commands;
pub mod deployment;
pub mod value_objects;

// Re-export main types
pub use aggregate::{Edge, Graph, Node};

// Re-export commands and their types
pub use commands::{CommandEffect, GraphCommand, GraphCommandError, GraphCommandResult};

// Re-export catalog types
pub use catalog::{catalog, group_by_category, lookup, CatalogEntry, CatalogError, Category};

// Re-export validation and compilation
pub use deployment::{
    compile, validate, CompileFailure, ContractViolation, DeploymentConfig, IssueKind,
    ReferenceKind, ResourceEntry, ResourceKind, Severity, ValidationIssue, ValidationOutcome,
};

// Re-export value objects
pub use value_objects::{
    Direction, EdgeId, EdgeRelation, GraphId, NodeId, NodePayload, NodeType,
};
