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

/// control flow graph over machine instructions
pub mod flowgraph;
/// live sets and the interference graph
pub mod liveness;
/// iterated register coalescing
pub mod coloring;

pub use compiler::backend::reg_alloc::graph_coloring::flowgraph::FlowGraph;
pub use compiler::backend::reg_alloc::graph_coloring::liveness::InterferenceGraph;
pub use compiler::backend::reg_alloc::graph_coloring::liveness::LiveSets;
pub use compiler::backend::reg_alloc::graph_coloring::liveness::build_live_set;
pub use compiler::backend::reg_alloc::graph_coloring::liveness::build_interference_graph;
pub use compiler::backend::reg_alloc::graph_coloring::coloring::GraphColoring;

use ast::ir::*;
use compiler::CompilerPass;
use compiler::machine_code::CompiledFunction;
use compiler::backend::x86_64;
use compiler::backend::reg_alloc::validate;
use options::BackendOptions;
use utils::LinkedHashMap;
use utils::LinkedHashSet;
use utils::vec_utils;

/// register allocation pass. Colors the function, rewrites it with spill code
/// and colors it again until no temp is spilled
pub struct RegisterAllocation {
    name: &'static str,
    /// the colors to allocate, in the order they are tried
    colors: Vec<TempID>,
    coalescing: bool,
    validate: bool,
    /// 0 means the bound is derived from the function
    max_rounds: usize
}

impl RegisterAllocation {
    /// allocates all usable x86-64 registers
    pub fn new(options: &BackendOptions) -> RegisterAllocation {
        let colors = x86_64::all_usable_regs().iter().map(|reg| reg.id).collect();
        RegisterAllocation::with_registers(options, colors)
    }

    /// allocates only the given machine registers
    pub fn with_registers(options: &BackendOptions, colors: Vec<TempID>) -> RegisterAllocation {
        for reg in colors.iter() {
            if !x86_64::is_machine_reg(*reg) || *reg == x86_64::STACK_POINTER.id {
                panic!("{} cannot be used as a color", reg);
            }
        }

        RegisterAllocation {
            name: "Register Allocation",
            colors: colors,
            coalescing: !options.flag_disable_coalescing,
            validate: !options.flag_disable_regalloc_validate,
            max_rounds: options.flag_regalloc_max_rounds
        }
    }

    fn coloring(&mut self, cf: &mut CompiledFunction) {
        let max_rounds = if self.max_rounds == 0 {
            number_of_temps_in_code(cf) + 1
        } else {
            self.max_rounds
        };

        // scratch temps introduced by spilling, and the temps they stand for
        let mut spill_scratch_temps : LinkedHashMap<TempID, TempID> = LinkedHashMap::new();
        let mut spill_history : LinkedHashSet<TempID> = LinkedHashSet::new();
        let mut unspillable : LinkedHashSet<TempID> = LinkedHashSet::new();

        let mut round = 0;
        let assignments = loop {
            round += 1;
            if round > max_rounds {
                panic!("register allocation for {} does not converge after {} rounds (spilled: {:?})",
                    cf.name(), max_rounds, spill_history);
            }
            info!("coloring round {} for {}", round, cf.name());

            let (spills, assignments) = {
                let coloring = GraphColoring::start(cf, &self.colors, self.coalescing, &unspillable);
                (coloring.spills(), coloring.get_assignments())
            };

            if spills.is_empty() {
                break assignments;
            }

            debug!("round {} spills [{}]", round, vec_utils::as_str(&spills));
            let new_temps = rewrite_program(cf, &spills);
            for (scratch, spilled) in new_temps.iter() {
                unspillable.insert(*scratch);
                spill_scratch_temps.insert(*scratch, *spilled);
            }
            for reg in spills {
                spill_history.insert(reg);
            }
        };

        info!("{} colored in {} rounds, {} temps spilled", cf.name(), round, spill_history.len());

        // replace regs
        trace!("Replacing Registers...");
        cf.temps.clear();
        for (temp, machine_reg) in assignments.iter() {
            trace!("replacing {} with {}", cf.context.get_temp_display(*temp), x86_64::get_name_for_value(*machine_reg));
            cf.temps.insert(*temp, *machine_reg);
        }
        // the stack pointer is never allocated, it is always itself
        let sp = x86_64::STACK_POINTER.id;
        cf.temps.insert(sp, sp);

        if self.validate {
            validate::validate_regalloc(cf, &spill_scratch_temps);
        }

        cf.trace_mc();
    }
}

/// allocates a frame slot for every spilled temp, and inserts the loads and stores.
/// Returns the scratch temps created, mapped to the spilled temps
fn rewrite_program(cf: &mut CompiledFunction, spills: &[TempID]) -> LinkedHashMap<TempID, TempID> {
    let mut spilled_mem = LinkedHashMap::new();

    // allocating frame slots for every spilled temp
    for reg_id in spills.iter() {
        let offset = cf.frame.alloc_slot_for_spilling(*reg_id, &mut cf.context);
        spilled_mem.insert(*reg_id, offset);
    }

    x86_64::spill_rewrite(&spilled_mem, cf)
}

/// the number of distinct temps (not machine registers) in the code
fn number_of_temps_in_code(cf: &CompiledFunction) -> usize {
    let mut temps = LinkedHashSet::new();
    for inst in cf.insts.iter() {
        for t in inst.defs().iter().chain(inst.uses().iter()) {
            if !x86_64::is_machine_reg(*t) {
                temps.insert(*t);
            }
        }
    }
    temps.len()
}

impl CompilerPass for RegisterAllocation {
    fn name(&self) -> &'static str {
        self.name
    }

    fn visit_function(&mut self, cf: &mut CompiledFunction) {
        self.coloring(cf);
    }
}
