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

use tiger_backend::ast::ir::*;
use tiger_backend::ast::inst::*;
use tiger_backend::utils::LinkedHashSet;
use tiger_backend::options::start_logging_trace;
use tiger_backend::compiler::machine_code::CompiledFunction;
use tiger_backend::compiler::backend::x86_64;
use tiger_backend::compiler::backend::reg_alloc::graph_coloring::*;

use super::*;
use common::*;

fn as_vec(set: &LinkedHashSet<TempID>) -> Vec<TempID> {
    set.iter().cloned().collect()
}

/// ```text
///  0      a <- 0
///  1  L:
///  2      b <- a + 1
///  3      c <- c + b
///  4      a <- b * 2
///  5      if a < N goto L
///  6      rax <- c
///  7      (sink rax)
/// ```
fn loop_function() -> (CompiledFunction, TempID, TempID, TempID) {
    let mut context = FunctionContext::new();
    temps!((context) a, b, c);
    label!((context) l);

    let rax = x86_64::RAX.id;
    let cf = new_function(context, vec![
        oper!("movq $0, `d0"; [a] <- []),
        mark!(l),
        oper!("leaq 1(`s0), `d0"; [b] <- [a]),
        oper!("addq `s0, `d0"; [c] <- [b, c]),
        oper!("leaq (`s0,`s0), `d0"; [a] <- [b]),
        cjmp!("cmpq $10, `s0\njl `j0"; [a] -> l),
        mov!(rax, c),
    ]);

    (cf, a, b, c)
}

#[test]
fn test_flow_graph_of_loop() {
    start_logging_trace();

    let (cf, ..) = loop_function();
    let fg = FlowGraph::build(&cf.insts);

    assert_eq!(fg.n_nodes(), 8);
    assert_vector_ordered(&fg.get_succs(5), &vec![1, 6]);
    assert_vector_ordered(&fg.get_preds(1), &vec![0, 5]);
    assert!(fg.get_succs(7).is_empty());
}

#[test]
fn test_liveness_of_loop() {
    start_logging_trace();

    let (cf, a, b, c) = loop_function();
    let rax = x86_64::RAX.id;
    let fg = FlowGraph::build(&cf.insts);
    let live = build_live_set(&cf.insts, &fg);

    assert_vector_no_order(&as_vec(live.get_livein(0)), &vec![c]);
    assert_vector_no_order(&as_vec(live.get_liveout(0)), &vec![a, c]);
    assert_vector_no_order(&as_vec(live.get_livein(2)), &vec![a, c]);
    assert_vector_no_order(&as_vec(live.get_liveout(2)), &vec![b, c]);
    assert_vector_no_order(&as_vec(live.get_liveout(3)), &vec![b, c]);
    assert_vector_no_order(&as_vec(live.get_liveout(4)), &vec![a, c]);
    assert_vector_no_order(&as_vec(live.get_liveout(5)), &vec![a, c]);
    assert_vector_no_order(&as_vec(live.get_livein(6)), &vec![c]);
    assert_vector_no_order(&as_vec(live.get_liveout(6)), &vec![rax]);
    assert!(live.get_liveout(7).is_empty());
}

#[test]
fn test_liveness_is_a_fixpoint() {
    start_logging_trace();

    let (cf, ..) = loop_function();
    let fg = FlowGraph::build(&cf.insts);
    let live = build_live_set(&cf.insts, &fg);

    for n in 0..cf.number_of_insts() {
        // out[n] = union of in[s] for every successor s
        let mut out = LinkedHashSet::new();
        for s in fg.get_succs(n) {
            out.add_all(live.get_livein(s));
        }
        assert!(out.equals(live.get_liveout(n)), "live-out of #{} is not the union of its successors", n);

        // in[n] = use[n] + (out[n] - def[n])
        let mut livein = LinkedHashSet::new();
        livein.add_from_slice(cf.get_inst_reg_uses(n));
        for t in live.get_liveout(n).iter() {
            if !cf.get_inst_reg_defines(n).contains(t) {
                livein.insert(*t);
            }
        }
        assert!(livein.equals(live.get_livein(n)), "live-in of #{} is wrong", n);
    }
}

#[test]
fn test_interference_of_loop() {
    start_logging_trace();

    let (cf, a, b, c) = loop_function();
    let rax = x86_64::RAX.id;
    let ig = build_interference_graph(&cf, &first_regs(3));

    let node = |t: TempID| ig.get_node(t);
    assert!(ig.is_interferenced_with(node(a), node(c)));
    assert!(ig.is_interferenced_with(node(b), node(c)));
    assert!(!ig.is_interferenced_with(node(a), node(b)));

    // the move source does not interfere with its destination
    assert!(!ig.is_interferenced_with(node(c), node(rax)));
    assert_eq!(ig.moves().len(), 1);

    // the precolored registers interfere with each other
    let regs = first_regs(3);
    for x in regs.iter() {
        assert!(ig.is_precolored(node(*x)));
        for y in regs.iter().filter(|y| *y != x) {
            assert!(ig.is_interferenced_with(node(*x), node(*y)));
        }
    }
    assert!(!ig.has_node(x86_64::STACK_POINTER.id));
}

#[test]
fn test_interference_with_stack_pointer() {
    start_logging_trace();

    let mut context = FunctionContext::new();
    temps!((context) a);
    let sp = x86_64::STACK_POINTER.id;
    let rax = x86_64::RAX.id;

    let cf = new_function(context, vec![
        oper!("movq $8, `d0"; [a] <- []),
        oper!("subq `s0, `d0"; [sp] <- [a, sp]),
        mov!(rax, a),
    ]);
    let ig = build_interference_graph(&cf, &first_regs(15));

    assert!(!ig.has_node(sp));
    assert_eq!(ig.n_nodes(), 16);
}

#[test]
#[should_panic]
fn test_jump_to_unknown_label() {
    let mut context = FunctionContext::new();
    label!((context) nowhere);

    let cf = new_function(context, vec![jmp!(nowhere)]);
    FlowGraph::build(&cf.insts);
}
