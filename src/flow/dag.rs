// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 jetflow contributors

//! Flow graph
//!
//! Graph view over a flow definition: one node per invocation, one edge
//! per connection target. Used for the optional structural checks
//! (cycles, reachability from the trigger) and for rendering.

use petgraph::algo::{tarjan_scc, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::Dfs;
use petgraph::Direction;

use crate::errors::ValidationError;
use crate::flow::FlowDefinition;

/// Directed graph of a flow's invocations
pub struct FlowGraph {
    graph: DiGraph<usize, ()>,
    nodes: Vec<NodeIndex>,
    keys: Vec<String>,
}

impl FlowGraph {
    /// Build the graph. Targets outside the component list are skipped;
    /// the validator reports them before a graph is ever needed.
    pub fn build(flow: &FlowDefinition) -> Self {
        let mut graph = DiGraph::new();
        let nodes: Vec<NodeIndex> = (0..flow.components.len())
            .map(|idx| graph.add_node(idx))
            .collect();

        for (idx, component) in flow.components.iter().enumerate() {
            for &target in &component.connections.targets {
                let Some(&to) = nodes.get(target) else {
                    continue;
                };

                if !graph.contains_edge(nodes[idx], to) {
                    graph.add_edge(nodes[idx], to, ());
                }
            }
        }

        Self {
            graph,
            nodes,
            keys: flow.components.iter().map(|c| c.key.clone()).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Reject cycles first, then invocations not reachable from index 0
    pub fn check_structure(&self) -> Result<(), ValidationError> {
        if let Some(indices) = self.find_cycle() {
            return Err(ValidationError::CyclicFlow { indices });
        }

        if let Some(&index) = self.unreachable().first() {
            return Err(ValidationError::UnreachableComponent { index });
        }

        Ok(())
    }

    /// Indices of one cycle, sorted, if the graph has any
    pub fn find_cycle(&self) -> Option<Vec<usize>> {
        let mut cycles: Vec<Vec<usize>> = tarjan_scc(&self.graph)
            .into_iter()
            .filter(|scc| {
                scc.len() > 1 || self.graph.contains_edge(scc[0], scc[0])
            })
            .map(|scc| {
                let mut indices: Vec<usize> = scc.into_iter().map(|n| self.graph[n]).collect();
                indices.sort_unstable();
                indices
            })
            .collect();

        // Report the cycle closest to the trigger
        cycles.sort();
        cycles.into_iter().next()
    }

    /// Invocations the trigger cannot reach, in index order
    pub fn unreachable(&self) -> Vec<usize> {
        let Some(&start) = self.nodes.first() else {
            return Vec::new();
        };

        let mut reached = vec![false; self.nodes.len()];
        let mut dfs = Dfs::new(&self.graph, start);
        while let Some(node) = dfs.next(&self.graph) {
            reached[self.graph[node]] = true;
        }

        reached
            .into_iter()
            .enumerate()
            .filter(|(_, r)| !r)
            .map(|(idx, _)| idx)
            .collect()
    }

    /// Invocation indices in execution order
    pub fn topological_order(&self) -> Result<Vec<usize>, ValidationError> {
        toposort(&self.graph, None)
            .map(|nodes| nodes.into_iter().map(|n| self.graph[n]).collect())
            .map_err(|_| ValidationError::CyclicFlow {
                indices: self.find_cycle().unwrap_or_default(),
            })
    }

    /// Direct upstream invocations of `index`
    pub fn upstream(&self, index: usize) -> Vec<usize> {
        self.neighbors(index, Direction::Incoming)
    }

    /// Direct downstream invocations of `index`
    pub fn downstream(&self, index: usize) -> Vec<usize> {
        self.neighbors(index, Direction::Outgoing)
    }

    fn neighbors(&self, index: usize, direction: Direction) -> Vec<usize> {
        let Some(&node) = self.nodes.get(index) else {
            return Vec::new();
        };

        let mut out: Vec<usize> = self
            .graph
            .neighbors_directed(node, direction)
            .map(|n| self.graph[n])
            .collect();
        out.sort_unstable();
        out
    }

    fn label(&self, index: usize) -> String {
        format!("{}:{}", index, self.keys[index])
    }

    /// Generate Mermaid diagram of the flow
    pub fn to_mermaid(&self) -> String {
        let mut out = String::from("graph TD\n");

        for (idx, key) in self.keys.iter().enumerate() {
            out.push_str(&format!("    c{}[{}]\n", idx, key));
        }

        for edge in self.graph.raw_edges() {
            out.push_str(&format!(
                "    c{} --> c{}\n",
                self.graph[edge.source()],
                self.graph[edge.target()]
            ));
        }

        out
    }

    /// Generate DOT diagram of the flow
    pub fn to_dot(&self) -> String {
        let mut out = String::from("digraph flow {\n");
        out.push_str("    rankdir=TB;\n");
        out.push_str("    node [shape=box, style=rounded];\n\n");

        for edge in self.graph.raw_edges() {
            out.push_str(&format!(
                "    \"{}\" -> \"{}\";\n",
                self.label(self.graph[edge.source()]),
                self.label(self.graph[edge.target()])
            ));
        }

        for (idx, node) in self.nodes.iter().enumerate() {
            if self.graph.neighbors_undirected(*node).count() == 0 {
                out.push_str(&format!("    \"{}\";\n", self.label(idx)));
            }
        }

        out.push_str("}\n");
        out
    }

    /// Generate text representation of execution order
    pub fn to_text(&self) -> Result<String, ValidationError> {
        let order = self.topological_order()?;
        let mut out = String::new();

        for (i, idx) in order.iter().enumerate() {
            out.push_str(&format!("{}. {} [{}]", i + 1, self.keys[*idx], idx));

            let upstream = self.upstream(*idx);
            if !upstream.is_empty() {
                let names: Vec<String> = upstream.iter().map(|u| self.label(*u)).collect();
                out.push_str(&format!(" <- {}", names.join(", ")));
            }

            out.push('\n');
        }

        Ok(out)
    }
}
