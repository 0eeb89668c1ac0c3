//! Scheduling analysis: dependency graph construction and critical-path
//! priorities. Instructions are never reordered here.

pub mod graph;
pub mod latency;

use log::info;

use crate::error::Result;
use crate::ir::Block;

pub use graph::{DependencyGraph, Node};
pub use latency::{compute_latencies, latency};

/// Builds the dependency graph of an annotated block and weights its nodes.
pub fn analyze(block: &Block) -> Result<DependencyGraph> {
    let mut graph = DependencyGraph::build(block)?;
    compute_latencies(&mut graph);

    let edges: usize = graph.nodes().iter().map(|node| node.dependencies.len()).sum();
    info!(
        "dependency graph: {} nodes, {edges} edges, critical path {}",
        graph.len(),
        graph.critical_path()
    );
    Ok(graph)
}
