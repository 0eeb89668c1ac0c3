use std::collections::HashMap;
use std::fmt;

use crate::error::{Error, Result};
use crate::ir::display::Render;
use crate::ir::{Block, Instr, Operand, View};

/// One instruction of the block as a scheduling node.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// 1-based position in the block.
    pub label: usize,
    pub instr: Instr,
    /// Nodes that must execute before this one.
    pub dependencies: Vec<usize>,
    /// Nodes that depend on this one. Filled in by latency computation.
    pub parents: Vec<usize>,
    /// Critical-path priority.
    pub weight: u32,
}

/// Data and memory-ordering dependencies between the instructions of a
/// block. Edges are node indices and always point to earlier nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct DependencyGraph {
    pub(crate) nodes: Vec<Node>,
}

fn add_edge(edges: &mut Vec<usize>, node: Option<usize>) {
    if let Some(node) = node {
        if !edges.contains(&node) {
            edges.push(node);
        }
    }
}

impl DependencyGraph {
    /// Builds the graph over an annotated block.
    pub fn build(block: &Block) -> Result<Self> {
        if block.is_empty() {
            return Err(Error::EmptyBlock);
        }

        let mut nodes = Vec::with_capacity(block.len());
        let mut vr_to_node: HashMap<u32, usize> = HashMap::new();
        let mut last_store: Option<usize> = None;
        let mut last_output: Option<usize> = None;
        let mut tracked_loads: Vec<usize> = Vec::new();

        for (id, line) in block.lines().iter().enumerate() {
            let vr = |op: &Operand| op.vr.ok_or(Error::Unannotated { index: line.index });
            let mut deps = Vec::new();

            match &line.instr {
                Instr::LoadI { dst, .. } => {
                    vr_to_node.insert(vr(dst)?, id);
                }
                Instr::Load { addr, dst } => {
                    add_edge(&mut deps, vr_to_node.get(&vr(addr)?).copied());
                    add_edge(&mut deps, last_store);
                    vr_to_node.insert(vr(dst)?, id);
                    tracked_loads.push(id);
                }
                Instr::Store { value, addr } => {
                    let addr = vr(addr)?;
                    add_edge(&mut deps, vr_to_node.get(&vr(value)?).copied());
                    add_edge(&mut deps, vr_to_node.get(&addr).copied());
                    add_edge(&mut deps, last_store);
                    add_edge(&mut deps, last_output);
                    for load in tracked_loads.drain(..) {
                        add_edge(&mut deps, Some(load));
                    }
                    last_store = Some(id);
                    // later readers of the address register order after the store
                    vr_to_node.insert(addr, id);
                }
                Instr::Output { .. } => {
                    add_edge(&mut deps, last_output);
                    add_edge(&mut deps, last_store);
                    last_output = Some(id);
                }
                Instr::Nop => {}
                Instr::Arith { lhs, rhs, dst, .. } => {
                    add_edge(&mut deps, vr_to_node.get(&vr(lhs)?).copied());
                    add_edge(&mut deps, vr_to_node.get(&vr(rhs)?).copied());
                    vr_to_node.insert(vr(dst)?, id);
                }
            }

            nodes.push(Node {
                label: id + 1,
                instr: line.instr.clone(),
                dependencies: deps,
                parents: Vec::new(),
                weight: 0,
            });
        }

        Ok(DependencyGraph { nodes })
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Length of the longest latency-weighted path through the block.
    pub fn critical_path(&self) -> u32 {
        self.nodes.iter().map(|node| node.weight).max().unwrap_or(0)
    }

    fn labels(&self, ids: &[usize]) -> String {
        let labels: Vec<_> = ids
            .iter()
            .map(|&id| format!("n{}", self.nodes[id].label))
            .collect();
        if labels.is_empty() {
            "{ }".to_string()
        } else {
            format!("{{ {} }}", labels.join(", "))
        }
    }
}

impl fmt::Display for DependencyGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "nodes:")?;
        for node in &self.nodes {
            let instr = Render {
                instr: &node.instr,
                view: View::Virtual,
            };
            writeln!(f, "    n{} : {instr}", node.label)?;
        }

        writeln!(f, "\nedges:")?;
        for node in &self.nodes {
            writeln!(f, "    n{} : {}", node.label, self.labels(&node.dependencies))?;
        }

        writeln!(f, "\nweights:")?;
        for node in &self.nodes {
            writeln!(f, "    n{} : {}", node.label, node.weight)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;

    fn deps(graph: &DependencyGraph) -> Vec<Vec<usize>> {
        graph
            .nodes()
            .iter()
            .map(|node| {
                node.dependencies
                    .iter()
                    .map(|&id| graph.nodes()[id].label)
                    .collect()
            })
            .collect()
    }

    #[test]
    fn test_build_data_and_memory_edges() {
        let block = annotated(
            "loadI 1024 => r1
             load r1 => r2
             loadI 4 => r3
             mult r2, r3 => r4
             store r4 => r1
             output 1024",
        );
        let graph = DependencyGraph::build(&block).unwrap();

        assert_eq!(
            deps(&graph),
            vec![vec![], vec![1], vec![], vec![2, 3], vec![4, 1, 2], vec![5]]
        );
        let labels: Vec<_> = graph.nodes().iter().map(|node| node.label).collect();
        assert_eq!(labels, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_build_store_output_ordering() {
        let block = annotated(
            "store r1 => r2
             output 0
             store r1 => r2",
        );
        let graph = DependencyGraph::build(&block).unwrap();
        assert_eq!(deps(&graph), vec![vec![], vec![1], vec![1, 2]]);
    }

    #[test]
    fn test_build_loads_after_store() {
        let block = annotated(
            "loadI 8 => r1
             load r1 => r2
             store r2 => r1
             load r1 => r3
             load r1 => r4
             store r3 => r4",
        );
        let graph = DependencyGraph::build(&block).unwrap();
        // loads order after the last store and the next store waits for them
        assert_eq!(
            deps(&graph),
            vec![vec![], vec![1], vec![2, 1], vec![3], vec![3], vec![4, 5, 3]]
        );
    }

    #[test]
    fn test_build_deduplicates_edges() {
        let block = annotated("loadI 2 => r1\nadd r1, r1 => r2\nnop");
        let graph = DependencyGraph::build(&block).unwrap();
        assert_eq!(deps(&graph), vec![vec![], vec![1], vec![]]);
    }

    #[test]
    fn test_edges_point_backwards() {
        let block = annotated(
            "loadI 1024 => r1
             load r1 => r2
             add r2, r2 => r3
             store r3 => r1
             output 1024
             load r1 => r4
             store r4 => r1
             output 1024",
        );
        let graph = DependencyGraph::build(&block).unwrap();
        for (id, node) in graph.nodes().iter().enumerate() {
            assert!(node.dependencies.iter().all(|&dep| dep < id), "n{}", node.label);
        }
    }

    #[test]
    fn test_build_errors() {
        assert!(matches!(
            DependencyGraph::build(&Block::new()),
            Err(Error::EmptyBlock)
        ));
        assert!(matches!(
            DependencyGraph::build(&parse("loadI 1 => r1")),
            Err(Error::Unannotated { index: 0 })
        ));
    }
}
