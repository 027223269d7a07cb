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
use tiger_backend::options::*;
use tiger_backend::compiler::*;
use tiger_backend::compiler::machine_code::CompiledFunction;
use tiger_backend::compiler::backend::peephole_opt::remove_redundant_moves;
use tiger_backend::compiler::backend::x86_64;
use tiger_backend::compiler::backend::reg_alloc::graph_coloring::*;

use super::*;

/// allocates the first `n_regs` registers. Redundant moves are left in place
fn allocate(cf: &mut CompiledFunction, n_regs: usize, args: &str) {
    let options = BackendOptions::init(args);
    let policy = CompilerPolicy::new(vec![
        Box::new(RegisterAllocation::with_registers(&options, first_regs(n_regs)))
    ]);
    let compiler = Compiler::new(policy, &options);

    compiler.compile(cf);
}

/// checked before redundant moves are removed: every temp in the code is colored with one of the given registers (or is a machine
/// register), and temps that interfere in the final code never share a color
fn check_coloring(cf: &CompiledFunction, colors: &[TempID]) {
    let ig = build_interference_graph(cf, &[]);
    let temps = ig.temps();

    for t in temps.iter() {
        let color = match cf.get_color(*t) {
            Some(c) => c,
            None => panic!("{} is not colored", cf.context.get_temp_display(*t))
        };
        assert!(x86_64::is_machine_reg(*t) || colors.contains(&color),
            "{} is colored with {}, which is not allocatable", t, color);
    }

    for (i, x) in temps.iter().enumerate() {
        for y in temps[i + 1..].iter() {
            if ig.is_interferenced_with(ig.get_node(*x), ig.get_node(*y)) {
                assert!(cf.get_color(*x) != cf.get_color(*y),
                    "{} and {} interfere but share a color", x, y);
            }
        }
    }
}

fn count_in_code(cf: &CompiledFunction, pattern: &str) -> usize {
    cf.insts.iter().filter(|i| format!("{}", i).contains(pattern)).count()
}

/// ```text
///  t1 <- 1
///  t2 <- 2
///  t3 <- 3
///  t1 <- t1 + t2
///  t1 <- t1 + t3
///  rax <- t1
/// ```
/// t1, t2 and t3 are live at the same time
fn three_live_temps(t1: TempID, t2: TempID, t3: TempID) -> Vec<Instr> {
    vec![
        oper!("movq $1, `d0"; [t1] <- []),
        oper!("movq $2, `d0"; [t2] <- []),
        oper!("movq $3, `d0"; [t3] <- []),
        oper!("addq `s0, `d0"; [t1] <- [t2, t1]),
        oper!("addq `s0, `d0"; [t1] <- [t3, t1]),
        mov!(x86_64::RAX.id, t1),
    ]
}

#[test]
fn test_spill_one_of_three() {
    start_logging_trace();

    let mut context = FunctionContext::new();
    temps!((context) t1, t2, t3);
    let mut cf = new_function(context, three_live_temps(t1, t2, t3));

    // with two registers, the first round spills exactly one temp
    {
        let unspillable = LinkedHashSet::new();
        let coloring = GraphColoring::start(&cf, &first_regs(2), true, &unspillable);
        let spills = coloring.spills();
        assert_eq!(spills.len(), 1);
        assert!([t1, t2, t3].contains(&spills[0]));
    }

    allocate(&mut cf, 2, "");

    assert!(!cf.frame.locals.is_empty());
    assert!(count_in_code(&cf, "f_framesize") >= 2);
    check_coloring(&cf, &first_regs(2));
}

#[test]
fn test_spill_with_three_registers() {
    start_logging_trace();

    let mut context = FunctionContext::new();
    temps!((context) t1, t2, t3, t4);
    let mut cf = new_function(context, vec![
        oper!("movq $1, `d0"; [t1] <- []),
        oper!("movq $2, `d0"; [t2] <- []),
        oper!("movq $3, `d0"; [t3] <- []),
        oper!("movq $4, `d0"; [t4] <- []),
        oper!("addq `s0, `d0"; [t1] <- [t2, t1]),
        oper!("addq `s0, `d0"; [t3] <- [t4, t3]),
        oper!("addq `s0, `d0"; [t1] <- [t3, t1]),
        mov!(x86_64::RAX.id, t1),
    ]);

    // four temps are live after t4 is defined, one too many for three registers
    {
        let unspillable = LinkedHashSet::new();
        let coloring = GraphColoring::start(&cf, &first_regs(3), true, &unspillable);
        assert_eq!(coloring.spills().len(), 1);
    }

    allocate(&mut cf, 3, "");

    assert!(!cf.frame.locals.is_empty());
    // stores and loads of the spill slots
    assert!(count_in_code(&cf, ", (f_framesize") >= 1);
    assert!(count_in_code(&cf, "(%rsp), t") >= 1);
    check_coloring(&cf, &first_regs(3));
}

#[test]
fn test_coalesced_move_disappears() {
    start_logging_trace();

    let mut context = FunctionContext::new();
    temps!((context) t1, t2);
    let mut cf = new_function(context, vec![
        oper!("movq $1, `d0"; [t1] <- []),
        mov!(t2, t1),
        oper!("addq $1, `d0"; [t2] <- [t2]),
        mov!(x86_64::RAX.id, t2),
    ]);

    allocate(&mut cf, 15, "");
    remove_redundant_moves(&mut cf);

    assert_eq!(get_number_of_moves(&cf), 0);
    assert_eq!(cf.get_color(t1), cf.get_color(t2));
    assert_eq!(cf.get_color(t2), Some(x86_64::RAX.id));
    assert!(cf.frame.locals.is_empty());
}

#[test]
fn test_constrained_move_stays() {
    start_logging_trace();

    let mut context = FunctionContext::new();
    temps!((context) t1, t2);
    let mut cf = new_function(context, vec![
        oper!("movq $1, `d0"; [t1] <- []),
        mov!(t2, t1),
        oper!("addq $1, `d0"; [t1] <- [t1]),
        oper!("addq `s0, `d0"; [t2] <- [t1, t2]),
        mov!(x86_64::RAX.id, t2),
    ]);

    allocate(&mut cf, 15, "");
    check_coloring(&cf, &first_regs(15));

    // t1 is live across the define of t2, so the move between them cannot go away
    assert!(cf.get_color(t1) != cf.get_color(t2));
    remove_redundant_moves(&mut cf);
    assert_eq!(get_number_of_moves(&cf), 1);
}

#[test]
fn test_one_register_no_spill() {
    start_logging_trace();

    let mut context = FunctionContext::new();
    temps!((context) t1, t2, t3);
    let mut cf = new_function(context, vec![
        oper!("movq $1, `d0"; [t1] <- []),
        oper!("leaq 1(`s0), `d0"; [t2] <- [t1]),
        oper!("leaq 1(`s0), `d0"; [t3] <- [t2]),
        mov!(x86_64::RAX.id, t3),
    ]);

    allocate(&mut cf, 1, "");

    assert!(cf.frame.locals.is_empty());
    for t in [t1, t2, t3].iter() {
        assert_eq!(cf.get_color(*t), Some(x86_64::RAX.id));
    }
    remove_redundant_moves(&mut cf);
    assert_eq!(get_number_of_moves(&cf), 0);
}

/// defines `n` temps, then sums them one by one into the first
fn many_live_temps(context: &mut FunctionContext, n: usize, pointer: bool) -> Vec<Instr> {
    let temps: Vec<TempID> = (0..n)
        .map(|_| if pointer { context.new_pointer_temp() } else { context.new_temp() })
        .collect();

    let mut body = vec![];
    for (i, t) in temps.iter().enumerate() {
        body.push(Instr::oper(format!("movq ${}, `d0", i), vec![*t], vec![]));
    }
    for t in temps[1..].iter() {
        body.push(oper!("addq `s0, `d0"; [temps[0]] <- [*t, temps[0]]));
    }
    body.push(mov!(x86_64::RAX.id, temps[0]));
    body
}

#[test]
fn test_spilling_converges() {
    start_logging_trace();

    let mut context = FunctionContext::new();
    let body = many_live_temps(&mut context, 20, false);
    let mut cf = new_function(context, body);

    allocate(&mut cf, 15, "");

    assert!(cf.frame.locals.len() >= 5);
    assert!(cf.frame.pointer_slots().is_empty());
    check_coloring(&cf, &first_regs(15));

    let asm = cf.emit();
    assert!(asm.starts_with("f:\n.set f_framesize, "));
    assert!(asm.ends_with("retq\n"));
}

#[test]
fn test_spilling_pointers() {
    start_logging_trace();

    let mut context = FunctionContext::new();
    temps!((context) * t1, t2, t3);
    let mut cf = new_function(context, three_live_temps(t1, t2, t3));

    allocate(&mut cf, 2, "");

    // slots of spilled pointers are reported, and the scratch temps are pointers too
    assert!(!cf.frame.pointer_slots().is_empty());
    assert_eq!(cf.frame.pointer_slots().len(), cf.frame.locals.len());
    for inst in cf.insts.iter() {
        for t in inst.defs().iter().chain(inst.uses().iter()) {
            if !x86_64::is_machine_reg(*t) {
                assert!(cf.context.is_pointer(*t), "{} lost its pointer tag", t);
            }
        }
    }
}

#[test]
fn test_disable_coalescing() {
    start_logging_trace();

    let mut context = FunctionContext::new();
    temps!((context) t1, t2);
    let mut cf = new_function(context, vec![
        oper!("movq $1, `d0"; [t1] <- []),
        mov!(t2, t1),
        oper!("addq $1, `d0"; [t2] <- [t2]),
        mov!(x86_64::RAX.id, t2),
    ]);

    allocate(&mut cf, 15, "--disable-coalescing");

    check_coloring(&cf, &first_regs(15));
}

#[test]
#[should_panic]
fn test_max_rounds_exceeded() {
    let mut context = FunctionContext::new();
    let body = many_live_temps(&mut context, 20, false);
    let mut cf = new_function(context, body);

    allocate(&mut cf, 15, "--regalloc-max-rounds=1");
}

#[test]
#[should_panic]
fn test_stack_pointer_is_not_a_color() {
    let options = BackendOptions::init("");
    RegisterAllocation::with_registers(&options, vec![x86_64::STACK_POINTER.id]);
}

#[test]
fn test_default_policy() {
    start_logging_trace();

    let mut context = FunctionContext::new();
    temps!((context) t1, t2, t3);
    let mut cf = new_function(context, three_live_temps(t1, t2, t3));

    let options = BackendOptions::init("");
    let compiler = Compiler::new(CompilerPolicy::default(&options), &options);
    compiler.compile(&mut cf);

    assert!(cf.frame.locals.is_empty());
    assert_eq!(get_number_of_moves(&cf), 0);

    let colors: LinkedHashSet<TempID> = LinkedHashSet::from_vec(
        [t1, t2, t3].iter().filter_map(|t| cf.get_color(*t)).collect());
    assert_eq!(colors.len(), 3);
}
