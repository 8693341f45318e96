//! Graph aggregates

pub mod flow_graph;

pub use flow_graph::{Edge, Graph, Node};
