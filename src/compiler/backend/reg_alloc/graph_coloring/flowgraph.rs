// Copyright 2017 The Australian National University
// 
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
// 
//     http://www.apache.org/licenses/LICENSE-2.0
// 
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use ast::ir::*;
use ast::inst::*;

use petgraph::Graph;
use petgraph::graph::NodeIndex;
use petgraph::Direction;

use std::collections::HashMap;

/// control flow graph over instructions. Node `i` is instruction `i`
pub struct FlowGraph {
    graph: Graph<usize, ()>,
    labels: HashMap<Label, usize>
}

impl FlowGraph {
    /// builds the flow graph.
    ///
    /// Consecutive instructions are connected unless the earlier one is an unconditional
    /// jump, then every jump gets an edge to each of its targets. A conditional jump
    /// thus has its fall-through (the false branch) and its targets as successors.
    pub fn build(insts: &[Instr]) -> FlowGraph {
        trace!("building flow graph for {} instructions", insts.len());

        let mut graph = Graph::with_capacity(insts.len(), insts.len());
        let mut labels = HashMap::new();

        for (i, inst) in insts.iter().enumerate() {
            let node = graph.add_node(i);
            debug_assert!(node.index() == i);

            if i > 0 && !insts[i - 1].is_unconditional_jump() {
                graph.add_edge(NodeIndex::new(i - 1), node, ());
            }

            if let Some(label) = inst.get_label() {
                if labels.insert(label.clone(), i).is_some() {
                    panic!("label {} is defined more than once", label);
                }
            }
        }

        for (i, inst) in insts.iter().enumerate() {
            for target in inst.jump_targets() {
                match labels.get(target) {
                    Some(t) => {
                        trace!("jump edge #{} -> #{} ({})", i, t, target);
                        graph.update_edge(NodeIndex::new(i), NodeIndex::new(*t), ());
                    }
                    None => panic!("cannot find label {} (jump target of #{}: {})", target, i, inst)
                }
            }
        }

        FlowGraph {
            graph: graph,
            labels: labels
        }
    }

    pub fn n_nodes(&self) -> usize {
        self.graph.node_count()
    }

    /// successors of a node in ascending order
    pub fn get_succs(&self, n: usize) -> Vec<usize> {
        self.neighbors(n, Direction::Outgoing)
    }

    /// predecessors of a node in ascending order
    pub fn get_preds(&self, n: usize) -> Vec<usize> {
        self.neighbors(n, Direction::Incoming)
    }

    /// the node of the instruction defining a label
    pub fn get_label_node(&self, label: &Label) -> Option<usize> {
        self.labels.get(label).cloned()
    }

    fn neighbors(&self, n: usize, dir: Direction) -> Vec<usize> {
        let mut ret: Vec<usize> = self.graph.neighbors_directed(NodeIndex::new(n), dir)
            .map(|x| x.index())
            .collect();
        ret.sort();
        ret.dedup();
        ret
    }
}
