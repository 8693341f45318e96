//! Graph validation and deployment compilation
//!
//! This module reduces a validated infrastructure flow graph rooted at a
//! cluster node into a concrete `DeploymentConfig` ready for an external
//! provisioning backend.

pub mod compiler;
pub mod validation;

pub use compiler::{compile, CompileFailure, DeploymentConfig, ResourceEntry, ResourceKind};
pub use validation::{
    validate, ContractViolation, IssueKind, ReferenceKind, Severity, ValidationIssue,
    ValidationOutcome,
};
