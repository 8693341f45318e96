//! Node catalog
//!
//! Static registry mapping each node type to its palette metadata. This is
//! compiled configuration, not user data: a pure lookup table consumed by
//! the presentation adapter when rendering the palette.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::value_objects::NodeType;

/// Palette categories, in palette order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Infrastructure,
    Compute,
    Storage,
    Networking,
    Security,
    Operations,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Category::Infrastructure => "Infrastructure",
            Category::Compute => "Compute",
            Category::Storage => "Storage",
            Category::Networking => "Networking",
            Category::Security => "Security",
            Category::Operations => "Operations",
        };
        write!(f, "{name}")
    }
}

/// Display metadata for one node type
///
/// Entries are static configuration; they serialize for the presentation
/// adapter but are never read back in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogEntry {
    pub node_type: NodeType,
    pub label: &'static str,
    pub description: &'static str,
    pub category: Category,
    /// Icon reference key, resolved by the presentation adapter
    pub icon: &'static str,
}

/// Errors from catalog lookups
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    /// Unreachable while `NodeType` stays exhaustive; kept so lookup has a
    /// fallible contract if the set ever opens up
    #[error("unknown node type: {0}")]
    UnknownNodeType(String),
}

const CATALOG: [CatalogEntry; 9] = [
    CatalogEntry {
        node_type: NodeType::Cluster,
        label: "Cluster",
        description: "MicroCloud LXD Cluster",
        category: Category::Infrastructure,
        icon: "layers",
    },
    CatalogEntry {
        node_type: NodeType::NodeGroup,
        label: "Node Group",
        description: "Group of compute nodes",
        category: Category::Infrastructure,
        icon: "server",
    },
    CatalogEntry {
        node_type: NodeType::VmTemplate,
        label: "VM Template",
        description: "Virtual Machine configuration",
        category: Category::Compute,
        icon: "box",
    },
    CatalogEntry {
        node_type: NodeType::ContainerTemplate,
        label: "Container Template",
        description: "Container configuration",
        category: Category::Compute,
        icon: "container",
    },
    CatalogEntry {
        node_type: NodeType::ImageStore,
        label: "Image Store",
        description: "OS image repository",
        category: Category::Storage,
        icon: "hard-drive",
    },
    CatalogEntry {
        node_type: NodeType::NetworkConfig,
        label: "Network Config",
        description: "Network configuration",
        category: Category::Networking,
        icon: "network",
    },
    CatalogEntry {
        node_type: NodeType::FirewallPolicies,
        label: "Firewall Policies",
        description: "Security rules",
        category: Category::Security,
        icon: "shield",
    },
    CatalogEntry {
        node_type: NodeType::UsersRoles,
        label: "Users / Roles",
        description: "Access control",
        category: Category::Security,
        icon: "users",
    },
    CatalogEntry {
        node_type: NodeType::ScalingRules,
        label: "Scaling Rules",
        description: "Auto-scaling configuration",
        category: Category::Operations,
        icon: "trending-up",
    },
];

/// The full palette, in display order
pub fn catalog() -> &'static [CatalogEntry] {
    &CATALOG
}

/// Look up the catalog entry for a node type
pub fn lookup(node_type: NodeType) -> Result<&'static CatalogEntry, CatalogError> {
    CATALOG
        .iter()
        .find(|entry| entry.node_type == node_type)
        .ok_or_else(|| CatalogError::UnknownNodeType(node_type.to_string()))
}

/// Group the palette by category, preserving palette order within each
/// category. Pure derived view for the presentation adapter.
pub fn group_by_category() -> IndexMap<Category, Vec<&'static CatalogEntry>> {
    let mut groups: IndexMap<Category, Vec<&'static CatalogEntry>> = IndexMap::new();
    for entry in &CATALOG {
        groups.entry(entry.category).or_default().push(entry);
    }
    groups
}
