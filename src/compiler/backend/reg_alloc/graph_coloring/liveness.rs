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
use compiler::machine_code::CompiledFunction;
use compiler::backend::x86_64;
use compiler::backend::reg_alloc::graph_coloring::flowgraph::FlowGraph;
use utils::LinkedHashMap;
use utils::LinkedHashSet;

use petgraph;
use petgraph::Graph;
use petgraph::graph::NodeIndex;

/// GraphNode represents a node in the interference graph.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GraphNode {
    /// temp ID (could be a machine register)
    temp: TempID,
    /// assigned color
    color: Option<TempID>
}

/// Move represents a move between two nodes (referred by index)
/// We need to know the moves so that we can coalesce.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Move{pub from: NodeIndex, pub to: NodeIndex}

/// live-in and live-out sets of every instruction
pub struct LiveSets {
    livein: Vec<LinkedHashSet<TempID>>,
    liveout: Vec<LinkedHashSet<TempID>>
}

impl LiveSets {
    pub fn get_livein(&self, n: usize) -> &LinkedHashSet<TempID> {
        &self.livein[n]
    }

    pub fn get_liveout(&self, n: usize) -> &LinkedHashSet<TempID> {
        &self.liveout[n]
    }

    pub fn n_nodes(&self) -> usize {
        self.livein.len()
    }
}

/// computes live sets to a fixpoint:
///
/// out[n] = union(in[s] for every successor s of n)
/// in[n]  = use[n] + (out[n] - def[n])
pub fn build_live_set(insts: &[Instr], fg: &FlowGraph) -> LiveSets {
    info!("start building live set");

    let n_insts = insts.len();

    let mut livein  : Vec<LinkedHashSet<TempID>> = vec![LinkedHashSet::new(); n_insts];
    let mut liveout : Vec<LinkedHashSet<TempID>> = vec![LinkedHashSet::new(); n_insts];

    let mut is_changed = true;
    let mut iterations = 0;

    while is_changed {
        // reset
        is_changed = false;
        iterations += 1;

        // liveness flows backwards, going in reverse order converges faster
        for n in (0..n_insts).rev() {
            // out[n] <- union(in[s] for every successor s of n)
            let mut outset = LinkedHashSet::new();
            for s in fg.get_succs(n) {
                outset.add_all(&livein[s]);
            }

            // in[n] <- use[n] + (out[n] - def[n])
            let mut inset = LinkedHashSet::new();
            // (1) in[n] = use[n]
            inset.add_from_slice(insts[n].uses());
            // (2) + (out[n] - def[n])
            {
                let defs = insts[n].defs();
                for reg in outset.iter() {
                    if !defs.contains(reg) {
                        inset.insert(*reg);
                    }
                }
            }

            // is in/out changed in this iteration?
            let n_changed = !inset.equals(&livein[n]) || !outset.equals(&liveout[n]);
            if n_changed {
                livein[n] = inset;
                liveout[n] = outset;
                is_changed = true;
            }
        }
    }

    debug!("live set converged after {} iterations", iterations);

    LiveSets {
        livein: livein,
        liveout: liveout
    }
}

/// InterferenceGraph represents the interference graph, including
/// * the graph
/// * all the nodes and its NodeIndex (a node is referred to by NodeIndex)
/// * all the moves
pub struct InterferenceGraph {
    /// the internal graph
    graph: Graph<GraphNode, (), petgraph::Undirected>,
    /// a map of all nodes (from temp ID to node index), in creation order
    nodes: LinkedHashMap<TempID, NodeIndex>,
    /// a set of all moves, in the order they appear in the code
    moves: LinkedHashSet<Move>
}

impl InterferenceGraph {
    fn new() -> InterferenceGraph {
        InterferenceGraph {
            graph: Graph::new_undirected(),
            nodes: LinkedHashMap::new(),
            moves: LinkedHashSet::new()
        }
    }

    /// creates a node for a temp, or returns the existing one.
    /// Machine registers are colored with themselves
    fn new_node(&mut self, reg_id: TempID) -> NodeIndex {
        if let Some(index) = self.nodes.get(&reg_id) {
            return *index;
        }

        let node = GraphNode {
            temp: reg_id,
            color: if x86_64::is_machine_reg(reg_id) {
                Some(reg_id)
            } else {
                None
            }
        };

        let index = self.graph.add_node(node);
        self.nodes.insert(reg_id, index);

        index
    }

    /// returns the node index for a temp
    pub fn get_node(&self, reg: TempID) -> NodeIndex {
        match self.nodes.get(&reg) {
            Some(index) => *index,
            None => panic!("do not have a node for {}", reg)
        }
    }

    pub fn has_node(&self, reg: TempID) -> bool {
        self.nodes.contains_key(&reg)
    }

    /// returns all the temps in the graph
    pub fn temps(&self) -> Vec<TempID> {
        self.nodes.keys().cloned().collect()
    }

    /// returns all the nodes in the graph
    pub fn nodes(&self) -> Vec<NodeIndex> {
        self.nodes.values().cloned().collect()
    }

    /// returns all the moves in the graph
    pub fn moves(&self) -> &LinkedHashSet<Move> {
        &self.moves
    }

    /// returns the number of nodes in the graph
    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// adds a move between two nodes. A move in the opposite direction
    /// of an existing one is not recorded again
    fn add_move(&mut self, src: NodeIndex, dst: NodeIndex) {
        let reversed = Move{from: dst, to: src};
        if !self.moves.contains(&reversed) {
            self.moves.insert(Move{from: src, to: dst});
        }
    }

    /// adds an interference edge between two nodes
    pub fn add_interference_edge(&mut self, from: NodeIndex, to: NodeIndex) {
        debug_assert!(from != to, "a node cannot interfere with itself");
        self.graph.update_edge(from, to, ());
    }

    /// is two nodes interfered?
    pub fn is_interferenced_with(&self, node1: NodeIndex, node2: NodeIndex) -> bool {
        self.graph.find_edge(node1, node2).is_some()
    }

    /// set color for a node
    pub fn color_node(&mut self, node: NodeIndex, color: TempID) {
        self.graph[node].color = Some(color);
    }

    /// is a node colored yet?
    pub fn is_colored(&self, node: NodeIndex) -> bool {
        self.graph[node].color.is_some()
    }

    /// gets the color of a node
    pub fn get_color_of(&self, node: NodeIndex) -> Option<TempID> {
        self.graph[node].color
    }

    /// gets the temp of a node
    pub fn get_temp_of(&self, node: NodeIndex) -> TempID {
        self.graph[node].temp
    }

    /// is a node precolored (a machine register)?
    pub fn is_precolored(&self, node: NodeIndex) -> bool {
        x86_64::is_machine_reg(self.get_temp_of(node))
    }

    /// are two nodes adjacent?
    pub fn is_adj(&self, from: NodeIndex, to: NodeIndex) -> bool {
        self.is_interferenced_with(from, to)
    }

    /// gets edges from a node
    pub fn outedges_of(&self, node: NodeIndex) -> Vec<NodeIndex> {
        let mut ret: Vec<NodeIndex> = self.graph.neighbors(node).collect();
        // petgraph yields neighbors latest first
        ret.reverse();
        ret
    }

    /// gets degree of a node
    pub fn outdegree_of(&self, node: NodeIndex) -> usize {
        self.graph.neighbors(node).count()
    }

    /// prints current graph for debugging (via debug!())
    pub fn print(&self, cf: &CompiledFunction) {
        use petgraph::dot::Dot;
        use petgraph::dot::Config;

        debug!("");
        debug!("Interference Graph");

        debug!("nodes:");
        for (id, index) in self.nodes.iter() {
            debug!("Reg {} -> {:?}", cf.get_reg_name(*id), index);
        }

        debug!("moves:");
        for mov in self.moves.iter() {
            debug!("Move {} -> {}",
                cf.get_reg_name(self.get_temp_of(mov.from)), cf.get_reg_name(self.get_temp_of(mov.to)));
        }

        debug!("graph:");
        debug!("\n\n{:?}\n", Dot::with_config(&self.graph, &[Config::EdgeNoLabel]));
        debug!("");
    }
}

/// builds the interference graph of a function.
///
/// `precolored` are the machine registers that are always in the graph. They (and any other
/// machine register appearing in the code) interfere with each other. The stack pointer is
/// never allocated and never appears in the graph.
pub fn build_interference_graph(cf: &CompiledFunction, precolored: &[TempID]) -> InterferenceGraph {
    let fg = FlowGraph::build(&cf.insts);
    let live = build_live_set(&cf.insts, &fg);

    build_interference_graph_from_live_set(cf, &live, precolored)
}

pub fn build_interference_graph_from_live_set(
    cf: &CompiledFunction,
    live: &LiveSets,
    precolored: &[TempID]
) -> InterferenceGraph {
    info!("start building interference graph");

    let sp = x86_64::STACK_POINTER.id;
    let mut ig = InterferenceGraph::new();

    for reg in precolored {
        debug_assert!(x86_64::is_machine_reg(*reg));
        if *reg != sp {
            ig.new_node(*reg);
        }
    }

    for n in 0..cf.number_of_insts() {
        let inst = &cf.insts[n];
        let liveout = live.get_liveout(n);

        // every temp that shows up gets a node, including temps that are
        // used without a define (e.g. incoming arguments)
        for reg in liveout.iter().chain(inst.defs().iter()).chain(inst.uses().iter()) {
            if *reg != sp {
                ig.new_node(*reg);
            }
        }

        let move_src = if inst.is_move() {
            if inst.defs().len() != 1 || inst.uses().len() != 1 {
                panic!("a move should have exactly one source and one destination: #{} {}", n, inst);
            }

            let src = inst.uses()[0];
            let dst = inst.defs()[0];
            if src != dst && src != sp && dst != sp {
                trace!("add move {} -> {}", cf.get_reg_name(src), cf.get_reg_name(dst));
                let (from, to) = (ig.get_node(src), ig.get_node(dst));
                ig.add_move(from, to);
            }

            Some(src)
        } else {
            None
        };

        // a define interferes with everything live out, except the source of a move
        for d in inst.defs().iter().filter(|d| **d != sp) {
            for b in liveout.iter().filter(|b| **b != sp) {
                if *d == *b || Some(*b) == move_src {
                    continue;
                }

                let (from, to) = (ig.get_node(*d), ig.get_node(*b));
                trace!("add edge between {} and {}", cf.get_reg_name(*d), cf.get_reg_name(*b));
                ig.add_interference_edge(from, to);
            }
        }
    }

    // machine registers form a complete subgraph
    let machine_nodes: Vec<NodeIndex> = ig.nodes().into_iter()
        .filter(|n| ig.is_precolored(*n))
        .collect();
    for (i, a) in machine_nodes.iter().enumerate() {
        for b in machine_nodes[i + 1..].iter() {
            ig.add_interference_edge(*a, *b);
        }
    }

    ig
}
