use crate::ir::Opcode;

use super::graph::DependencyGraph;

/// Cycles an instruction occupies before its result is available.
pub fn latency(opcode: Opcode) -> u32 {
    match opcode {
        Opcode::Load | Opcode::Store => 3,
        Opcode::Mult => 2,
        _ => 1,
    }
}

/// Fills in `parents` and the critical-path `weight` of every node.
///
/// Every edge points to an earlier node, so walking the block backwards
/// visits each node after all of its parents.
pub fn compute_latencies(graph: &mut DependencyGraph) {
    let nodes = &mut graph.nodes;

    for node in nodes.iter_mut() {
        node.parents.clear();
    }
    for id in 0..nodes.len() {
        for dep in nodes[id].dependencies.clone() {
            if !nodes[dep].parents.contains(&id) {
                nodes[dep].parents.push(id);
            }
        }
    }

    for id in (0..nodes.len()).rev() {
        let longest_parent = nodes[id]
            .parents
            .iter()
            .map(|&parent| nodes[parent].weight)
            .max()
            .unwrap_or(0);
        nodes[id].weight = latency(nodes[id].instr.opcode()) + longest_parent;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;

    fn weights(src: &str) -> Vec<u32> {
        let mut graph = DependencyGraph::build(&annotated(src)).unwrap();
        compute_latencies(&mut graph);
        graph.nodes().iter().map(|node| node.weight).collect()
    }

    #[test]
    fn test_latency_table() {
        assert_eq!(latency(Opcode::Load), 3);
        assert_eq!(latency(Opcode::Store), 3);
        assert_eq!(latency(Opcode::Mult), 2);
        for opcode in [Opcode::LoadI, Opcode::Add, Opcode::RShift, Opcode::Output, Opcode::Nop] {
            assert_eq!(latency(opcode), 1);
        }
    }

    #[test]
    fn test_weights_store_output_ordering() {
        assert_eq!(
            weights("store r1 => r2\noutput 0\nstore r1 => r2"),
            vec![7, 4, 3]
        );
    }

    #[test]
    fn test_weights_critical_path() {
        let src = "loadI 1024 => r1
                   load r1 => r2
                   loadI 4 => r3
                   mult r2, r3 => r4
                   store r4 => r1
                   output 1024";
        assert_eq!(weights(src), vec![10, 9, 7, 6, 4, 1]);

        let mut graph = DependencyGraph::build(&annotated(src)).unwrap();
        compute_latencies(&mut graph);
        assert_eq!(graph.critical_path(), 10);
        let parents: Vec<_> = graph.nodes()[0].parents.clone();
        assert_eq!(parents, vec![1, 4]);
    }

    #[test]
    fn test_weights_cover_latency_of_every_parent() {
        let mut graph = DependencyGraph::build(&annotated(
            "loadI 3 => r1
             loadI 4 => r2
             add r1, r2 => r3
             mult r1, r2 => r4
             add r3, r4 => r5
             loadI 1024 => r6
             store r5 => r6
             output 1024",
        ))
        .unwrap();
        compute_latencies(&mut graph);

        let nodes = graph.nodes();
        for node in nodes {
            let own = latency(node.instr.opcode());
            assert!(node.weight >= own);
            for &parent in &node.parents {
                assert!(node.weight >= own + nodes[parent].weight);
            }
        }
    }

    #[test]
    fn test_recompute_is_stable() {
        let mut graph = DependencyGraph::build(&annotated("loadI 1 => r1\nadd r1, r1 => r2")).unwrap();
        compute_latencies(&mut graph);
        let first = graph.clone();
        compute_latencies(&mut graph);
        assert_eq!(graph, first);
    }
}
