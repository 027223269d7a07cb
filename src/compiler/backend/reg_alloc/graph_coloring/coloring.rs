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
use compiler::machine_code::CompiledFunction;
use compiler::backend::reg_alloc::graph_coloring::liveness::*;
use utils::LinkedHashMap;
use utils::LinkedHashSet;

use petgraph::graph::NodeIndex;

use std::collections::HashMap;
use std::usize;

type Node = NodeIndex;

/// GraphColoring algorithm
/// based on Appel's book section 11.4
pub struct GraphColoring<'a> {
    /// the function being allocated (only read here)
    pub cf: &'a CompiledFunction,

    /// the interference graph, nodes get their colors in place
    pub ig: InterferenceGraph,

    /// whether move related nodes may be merged
    coalescing: bool,
    /// temps that should not be chosen for spilling if there is another candidate
    /// (scratch temps created by earlier spilling, their live ranges are already minimal)
    unspillable: &'a LinkedHashSet<TempID>,

    /// machine registers, preassigned a color
    precolored: LinkedHashSet<Node>,
    /// all colors available, in the order they are tried
    colors: Vec<TempID>,

    /// temporary registers, not precolored and not yet processed
    initial: Vec<Node>,
    /// current degree of each node in the graph (precolored nodes have infinite degree)
    degree: HashMap<Node, usize>,

    /// moves enabled for possible coalescing
    worklist_moves: LinkedHashSet<Move>,
    /// a mapping from a node to the list of moves it is associated with
    movelist: HashMap<Node, LinkedHashSet<Move>>,
    /// moves not yet ready for coalescing
    active_moves: LinkedHashSet<Move>,
    /// registers that have been coalesced; when u <- v is coalesced,
    /// v is added to this set and u put back on some work list
    coalesced_nodes: LinkedHashSet<Node>,
    /// moves that have been coalesced
    coalesced_moves: LinkedHashSet<Move>,
    /// moves whose source and target interfere
    constrained_moves: LinkedHashSet<Move>,
    /// when a move (u, v) has been coalesced, and v put in coalescedNodes, then alias(v) = u
    alias: HashMap<Node, Node>,

    /// high-degree nodes
    worklist_spill: LinkedHashSet<Node>,
    /// nodes marked for spilling during this round
    spilled_nodes: Vec<Node>,

    /// low-degree move related nodes
    worklist_freeze: LinkedHashSet<Node>,
    /// moves that will no longer be considered for coalescing
    frozen_moves: LinkedHashSet<Move>,

    /// list of low-degree non-move-related nodes
    worklist_simplify: LinkedHashSet<Node>,
    /// stack containing temporaries removed from the graph
    select_stack: Vec<Node>
}

impl <'a> GraphColoring<'a> {
    /// builds the interference graph of `cf` and colors it with `colors`
    pub fn start(
        cf: &'a CompiledFunction,
        colors: &[TempID],
        coalescing: bool,
        unspillable: &'a LinkedHashSet<TempID>
    ) -> GraphColoring<'a> {
        trace!("Initializing coloring allocator...");
        cf.trace_mc();

        let ig = build_interference_graph(cf, colors);

        let coloring = GraphColoring {
            cf: cf,
            ig: ig,
            coalescing: coalescing,
            unspillable: unspillable,

            precolored: LinkedHashSet::new(),
            colors: colors.to_vec(),

            initial: Vec::new(),
            degree: HashMap::new(),

            worklist_moves: LinkedHashSet::new(),
            movelist: HashMap::new(),
            active_moves: LinkedHashSet::new(),
            coalesced_nodes: LinkedHashSet::new(),
            coalesced_moves: LinkedHashSet::new(),
            constrained_moves: LinkedHashSet::new(),
            alias: HashMap::new(),

            worklist_spill: LinkedHashSet::new(),
            spilled_nodes: Vec::new(),

            worklist_freeze: LinkedHashSet::new(),
            frozen_moves: LinkedHashSet::new(),

            worklist_simplify: LinkedHashSet::new(),
            select_stack: Vec::new()
        };

        coloring.regalloc()
    }

    fn display_node(&self, node: Node) -> String {
        let id = self.ig.get_temp_of(node);
        self.cf.get_reg_name(id)
    }

    fn display_move(&self, m: Move) -> String {
        format!("Move: {} -> {}", self.display_node(m.from), self.display_node(m.to))
    }

    /// K
    fn n_regs(&self) -> usize {
        self.colors.len()
    }

    fn regalloc(mut self) -> GraphColoring<'a> {
        trace!("---InterenceGraph---");
        self.ig.print(self.cf);

        for node in self.ig.nodes() {
            if self.ig.is_precolored(node) {
                self.precolored.insert(node);
            } else {
                self.initial.push(node);
                let outdegree = self.ig.outdegree_of(node);
                self.degree.insert(node, outdegree);

                trace!("{} has a degree of {}", self.display_node(node), outdegree);
            }
        }

        self.build();
        self.make_work_list();
        self.check_invariants();

        while {
            if !self.worklist_simplify.is_empty() {
                self.simplify();
            } else if !self.worklist_moves.is_empty() {
                self.coalesce();
            } else if !self.worklist_freeze.is_empty() {
                self.freeze();
            } else if !self.worklist_spill.is_empty() {
                self.select_spill();
            }

            self.check_invariants();

            ! (self.worklist_simplify.is_empty()
            && self.worklist_moves.is_empty()
            && self.worklist_freeze.is_empty()
            && self.worklist_spill.is_empty())
        } {}

        self.assign_colors();

        if !self.spilled_nodes.is_empty() {
            trace!("spill required");
            if cfg!(debug_assertions) {
                trace!("nodes to be spilled:");
                for node in self.spilled_nodes.iter() {
                    trace!("{}", self.display_node(*node));
                }
            }
        }

        self
    }

    fn build(&mut self) {
        if self.coalescing {
            trace!("coalescing enabled, build move list");
            let moves: Vec<Move> = self.ig.moves().iter().cloned().collect();
            for m in moves {
                trace!("add to movelist: {}", self.display_move(m));
                self.worklist_moves.insert(m);
                self.movelist.entry(m.from).or_insert_with(LinkedHashSet::new).insert(m);
                self.movelist.entry(m.to).or_insert_with(LinkedHashSet::new).insert(m);
            }
        } else {
            trace!("coalescing disabled");
        }
    }

    fn make_work_list(&mut self) {
        trace!("Making work list from initials...");
        while let Some(node) = self.initial.pop() {
            if self.degree(node) >= self.n_regs() {
                trace!("{} 's degree >= reg number limit (K), push to spill list", self.display_node(node));
                self.worklist_spill.insert(node);
            } else if self.is_move_related(node) {
                trace!("{} is move related, push to freeze list", self.display_node(node));
                self.worklist_freeze.insert(node);
            } else {
                trace!("{} has small degree and not move related, push to simplify list", self.display_node(node));
                self.worklist_simplify.insert(node);
            }
        }
    }

    fn is_move_related(&self, node: Node) -> bool {
        !self.node_moves(node).is_empty()
    }

    /// moves of a node that are still candidates for coalescing
    fn node_moves(&self, node: Node) -> LinkedHashSet<Move> {
        let mut retained = LinkedHashSet::new();

        if let Some(movelist) = self.movelist.get(&node) {
            for m in movelist.iter() {
                if self.active_moves.contains(m) || self.worklist_moves.contains(m) {
                    retained.insert(*m);
                }
            }
        }

        retained
    }

    fn simplify(&mut self) {
        // remove next element from worklist_simplify, we know its not empty
        let node = match self.worklist_simplify.pop_back() {
            Some(node) => node,
            None => return
        };

        trace!("Simplifying {}", self.display_node(node));

        self.select_stack.push(node);

        for m in self.adjacent(node).iter() {
            self.decrement_degree(*m);
        }
    }

    /// neighbors of a node that are still in the graph
    fn adjacent(&self, n: Node) -> LinkedHashSet<Node> {
        let mut adj = LinkedHashSet::new();

        for s in self.ig.outedges_of(n) {
            if !self.select_stack.contains(&s) && !self.coalesced_nodes.contains(&s) {
                adj.insert(s);
            }
        }

        adj
    }

    fn degree(&self, n: Node) -> usize {
        if self.precolored.contains(&n) {
            return usize::MAX;
        }

        match self.degree.get(&n) {
            Some(d) => *d,
            None => 0
        }
    }

    fn decrement_degree(&mut self, n: Node) {
        if self.precolored.contains(&n) {
            return;
        }

        trace!("decrement degree of {}", self.display_node(n));

        let d = self.degree(n);
        debug_assert!(d != 0);
        self.degree.insert(n, d - 1);

        if d == self.n_regs() {
            trace!("{}'s degree is K, no longer need to spill it", self.display_node(n));
            let mut nodes = self.adjacent(n);
            nodes.insert(n);
            self.enable_moves(nodes);

            self.worklist_spill.remove(&n);
            // a node in the freeze list may have lost its last move meanwhile
            self.worklist_freeze.remove(&n);

            if self.is_move_related(n) {
                trace!("{} is move related, push to freeze list", self.display_node(n));
                self.worklist_freeze.insert(n);
            } else {
                trace!("{} is not move related, push to simplify list", self.display_node(n));
                self.worklist_simplify.insert(n);
            }
        }
    }

    fn enable_moves(&mut self, nodes: LinkedHashSet<Node>) {
        for n in nodes.iter() {
            for mov in self.node_moves(*n).iter() {
                if self.active_moves.remove(mov) {
                    trace!("enable {}", self.display_move(*mov));
                    self.worklist_moves.insert(*mov);
                }
            }
        }
    }

    fn coalesce(&mut self) {
        let m = match self.worklist_moves.pop_back() {
            Some(m) => m,
            None => return
        };

        trace!("Coalescing on {}", self.display_move(m));

        let x = self.get_alias(m.from);
        let y = self.get_alias(m.to);
        trace!("resolve alias: from {} to {}", self.display_node(x), self.display_node(y));

        // keep the precolored node (if any) as u
        let (u, v) = if self.precolored.contains(&y) {
            (y, x)
        } else {
            (x, y)
        };
        let precolored_u = self.precolored.contains(&u);
        let precolored_v = self.precolored.contains(&v);
        trace!("u={}, v={}, precolored_u={}, precolored_v={}",
            self.display_node(u),
            self.display_node(v),
            precolored_u, precolored_v);

        if u == v {
            trace!("u == v, coalesce the move");
            self.coalesced_moves.insert(m);
            self.add_worklist(u);
        } else if precolored_v || self.ig.is_adj(u, v) || (precolored_u && !self.is_color(u)) {
            trace!("v is precolored or u,v is adjacent, the move is constrained");
            self.constrained_moves.insert(m);
            self.add_worklist(u);
            self.add_worklist(v);
        } else if (precolored_u && self.george(u, v))
          || (!precolored_u && self.briggs(u, v)) {
            trace!("precolored_u&&george(u,v) || !precolored_u&&briggs(u,v), coalesce and combine the move");
            self.coalesced_moves.insert(m);
            self.combine(u, v);
            self.add_worklist(u);
        } else {
            trace!("cannot coalesce the move");
            self.active_moves.insert(m);
        }
    }

    /// follows coalescing to the representative of a node
    pub fn get_alias(&self, node: Node) -> Node {
        let mut n = node;
        while self.coalesced_nodes.contains(&n) {
            n = match self.alias.get(&n) {
                Some(alias) => *alias,
                None => panic!("coalesced node {} has no alias", self.display_node(n))
            };
        }
        n
    }

    fn add_worklist(&mut self, node: Node) {
        if !self.precolored.contains(&node)
          && !self.is_move_related(node)
          && self.degree(node) < self.n_regs() {
            trace!("{} is no longer move related, push to simplify list", self.display_node(node));
            self.worklist_freeze.remove(&node);
            self.worklist_simplify.insert(node);
        }
    }

    /// George: merging v into the precolored u is safe if every neighbor of v is
    /// low-degree, precolored, or already a neighbor of u
    fn george(&self, u: Node, v: Node) -> bool {
        self.adjacent(v).iter().all(|t| self.ok(*t, u))
    }

    fn ok(&self, t: Node, r: Node) -> bool {
        self.degree(t) < self.n_regs()
          || self.precolored.contains(&t)
          || self.ig.is_adj(t, r)
    }

    /// Briggs: merging u and v is safe if the merged node has fewer than K
    /// neighbors of significant degree
    fn briggs(&self, u: Node, v: Node) -> bool {
        let mut nodes = self.adjacent(u);
        nodes.add_all(&self.adjacent(v));

        self.conservative(&nodes)
    }

    fn conservative(&self, nodes: &LinkedHashSet<Node>) -> bool {
        let k = nodes.iter().filter(|n| self.degree(**n) >= self.n_regs()).count();
        k < self.n_regs()
    }

    fn combine(&mut self, u: Node, v: Node) {
        debug_assert!(
            if self.precolored.contains(&u) { self.george(u, v) } else { self.briggs(u, v) },
            "merging {} into {} is not conservative", self.display_node(v), self.display_node(u));

        if !self.worklist_freeze.remove(&v) {
            self.worklist_spill.remove(&v);
        }
        self.coalesced_nodes.insert(v);

        self.alias.insert(v, u);

        // movelist[u] <- movelist[u] + movelist[v]
        if let Some(movelist_v) = self.movelist.get(&v).cloned() {
            self.movelist.entry(u).or_insert_with(LinkedHashSet::new).add_all(&movelist_v);
        }

        self.enable_moves(LinkedHashSet::new1(v));

        for t in self.adjacent(v).iter() {
            let t = *t;
            self.add_edge(t, u);
            self.decrement_degree(t);
        }

        if self.worklist_freeze.contains(&u)
          && self.degree(u) >= self.n_regs() {
            self.worklist_freeze.remove(&u);
            self.worklist_spill.insert(u);
        }

        // a merged temp keeps fewer than K neighbors of significant degree
        debug_assert!(self.precolored.contains(&u) || self.conservative(&self.adjacent(u)),
            "{} has too many significant neighbors after merging", self.display_node(u));
    }

    fn add_edge(&mut self, u: Node, v: Node) {
        if u != v && !self.ig.is_adj(u, v) {
            self.ig.add_interference_edge(u, v);

            if !self.precolored.contains(&u) {
                let degree_u = self.degree(u);
                self.degree.insert(u, degree_u + 1);
            }
            if !self.precolored.contains(&v) {
                let degree_v = self.degree(v);
                self.degree.insert(v, degree_v + 1);
            }
        }
    }

    fn freeze(&mut self) {
        let node = match self.worklist_freeze.pop_back() {
            Some(node) => node,
            None => return
        };
        trace!("Freezing {}...", self.display_node(node));

        self.worklist_simplify.insert(node);
        self.freeze_moves(node);
    }

    fn freeze_moves(&mut self, u: Node) {
        for m in self.node_moves(u).iter() {
            let m = *m;
            let mut v = self.get_alias(m.from);
            if v == self.get_alias(u) {
                v = self.get_alias(m.to);
            }

            self.active_moves.remove(&m);
            self.worklist_moves.remove(&m);
            self.frozen_moves.insert(m);

            if self.worklist_freeze.contains(&v)
               && self.node_moves(v).is_empty()
               && self.degree(v) < self.n_regs() {
                trace!("{} lost its last move, push to simplify list", self.display_node(v));
                self.worklist_freeze.remove(&v);
                self.worklist_simplify.insert(v);
            }
        }
    }

    /// picks the node with the most neighbors left. Temps that already came out of
    /// spilling are only picked when nothing else is left: their live ranges cannot
    /// get any shorter, so spilling them again would not bring the rounds to an end
    fn select_spill(&mut self) {
        trace!("Selecting a node to spill...");
        let mut m : Option<Node> = None;

        for n in self.worklist_spill.iter() {
            let n = *n;
            m = match m {
                None => Some(n),
                Some(cur) => {
                    let spillable_n = self.is_spillable(n);
                    let spillable_cur = self.is_spillable(cur);

                    if spillable_n && !spillable_cur {
                        Some(n)
                    } else if spillable_n == spillable_cur && self.degree(n) > self.degree(cur) {
                        Some(n)
                    } else {
                        Some(cur)
                    }
                }
            };
        }

        let m = match m {
            Some(m) => m,
            None => return
        };
        trace!("Spilling {}...", self.display_node(m));

        self.worklist_spill.remove(&m);
        self.worklist_simplify.insert(m);
        self.freeze_moves(m);
    }

    /// is a precolored node one of the colors we allocate?
    fn is_color(&self, n: Node) -> bool {
        self.colors.contains(&self.ig.get_temp_of(n))
    }

    fn is_spillable(&self, n: Node) -> bool {
        !self.unspillable.contains(&self.ig.get_temp_of(n))
    }

    fn assign_colors(&mut self) {
        trace!("---coloring done---");
        while let Some(n) = self.select_stack.pop() {
            trace!("Assigning color to {}", self.display_node(n));

            let mut ok_colors : LinkedHashSet<TempID> = LinkedHashSet::from_vec(self.colors.clone());
            for w in self.ig.outedges_of(n) {
                let w = self.get_alias(w);
                match self.ig.get_color_of(w) {
                    None => {}, // do nothing
                    Some(color) => {ok_colors.remove(&color);}
                }
            }
            trace!("available colors: {:?}", ok_colors);

            match ok_colors.pop_front() {
                None => {
                    trace!("{} is a spilled node", self.display_node(n));
                    self.spilled_nodes.push(n);
                }
                Some(first_available_color) => {
                    trace!("Color {} as {}", self.display_node(n), first_available_color);
                    self.ig.color_node(n, first_available_color);
                }
            }
        }

        for n in self.coalesced_nodes.iter() {
            let n = *n;
            let alias = self.get_alias(n);
            if let Some(alias_color) = self.ig.get_color_of(alias) {
                trace!("Assign color to {} based on aliased {}", self.display_node(n), self.display_node(alias));
                trace!("Color {} as {}", self.display_node(n), alias_color);
                self.ig.color_node(n, alias_color);
            }
        }
    }

    /// temps that need to be spilled
    pub fn spills(&self) -> Vec<TempID> {
        self.spilled_nodes.iter().map(|n| self.ig.get_temp_of(*n)).collect()
    }

    /// the color of every colored temp (machine registers map to themselves)
    pub fn get_assignments(&self) -> LinkedHashMap<TempID, TempID> {
        let mut ret = LinkedHashMap::new();

        for node in self.ig.nodes() {
            if let Some(color) = self.ig.get_color_of(node) {
                ret.insert(self.ig.get_temp_of(node), color);
            }
        }

        ret
    }

    /// coalesced temps and the temp they were merged into
    pub fn get_coalesced(&self) -> LinkedHashMap<TempID, TempID> {
        let mut ret = LinkedHashMap::new();

        for node in self.coalesced_nodes.iter() {
            let alias = self.get_alias(*node);
            ret.insert(self.ig.get_temp_of(*node), self.ig.get_temp_of(alias));
        }

        ret
    }

    /// checks that every temp is in exactly one work list, and that the degree of
    /// every node in a work list counts its neighbors still in the graph.
    /// Only done with debug assertions on
    fn check_invariants(&self) {
        if !cfg!(debug_assertions) {
            return;
        }

        for node in self.ig.nodes() {
            if self.precolored.contains(&node) {
                continue;
            }

            let in_lists = [
                self.worklist_simplify.contains(&node),
                self.worklist_freeze.contains(&node),
                self.worklist_spill.contains(&node),
                self.select_stack.contains(&node),
                self.coalesced_nodes.contains(&node),
            ].iter().filter(|x| **x).count();
            debug_assert!(in_lists == 1, "{} is in {} work lists", self.display_node(node), in_lists);

            if self.is_in_graph_worklists(node) {
                let expect = self.ig.outedges_of(node).into_iter()
                    .filter(|n| self.precolored.contains(n) || self.is_in_graph_worklists(*n))
                    .count();
                debug_assert!(self.degree(node) == expect,
                    "degree of {} is {}, expect {}", self.display_node(node), self.degree(node), expect);
            }
        }
    }

    fn is_in_graph_worklists(&self, node: Node) -> bool {
        self.worklist_simplify.contains(&node)
          || self.worklist_freeze.contains(&node)
          || self.worklist_spill.contains(&node)
    }
}
