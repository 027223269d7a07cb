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
use compiler::backend::x86_64;
use compiler::backend::reg_alloc::graph_coloring::FlowGraph;
use compiler::backend::reg_alloc::graph_coloring::build_live_set;
use utils::LinkedHashMap;

/// checks the coloring in `cf.temps` against the final code.
///
/// Liveness is recomputed from scratch. Every temp in the code needs a color, and a
/// define must not share its color with anything live after it (except the source of a move).
/// A violation is a bug in the allocator and panics.
pub fn validate_regalloc(cf: &CompiledFunction, spill_scratch_temps: &LinkedHashMap<TempID, TempID>) {
    debug!("---validating register allocation for {}---", cf.name());

    let fg = FlowGraph::build(&cf.insts);
    let live = build_live_set(&cf.insts, &fg);
    let sp = x86_64::STACK_POINTER.id;

    for n in 0..cf.number_of_insts() {
        let inst = &cf.insts[n];
        let liveout = live.get_liveout(n);

        for t in inst.defs().iter().chain(inst.uses().iter()).chain(liveout.iter()) {
            if cf.get_color(*t).is_none() {
                panic!("validation failed: {} in #{} {} has no register assigned",
                    display_temp(cf, *t, spill_scratch_temps), n, inst);
            }
        }

        let move_src = if inst.is_move() {
            inst.uses().first().cloned()
        } else {
            None
        };

        for d in inst.defs().iter().filter(|d| **d != sp) {
            for b in liveout.iter().filter(|b| **b != sp) {
                if *d == *b || Some(*b) == move_src {
                    continue;
                }

                if cf.get_color(*d) == cf.get_color(*b) {
                    panic!("validation failed: #{} {} defines {} while {} is live, but both are in {}",
                        n, cf.emit_inst(n),
                        display_temp(cf, *d, spill_scratch_temps),
                        display_temp(cf, *b, spill_scratch_temps),
                        cf.get_reg_name(*d));
                }
            }
        }
    }

    debug!("---validation done---");
}

/// shows a temp, and the temp it was spilled from if it is a spill scratch temp
fn display_temp(cf: &CompiledFunction, temp: TempID, spill_scratch_temps: &LinkedHashMap<TempID, TempID>) -> String {
    match get_source_temp_for_scratch(temp, spill_scratch_temps) {
        Some(source) => format!("{} (scratch of {})", cf.context.get_temp_display(temp), cf.context.get_temp_display(source)),
        None => cf.context.get_temp_display(temp)
    }
}

fn get_source_temp_for_scratch(scratch: TempID, spill_scratch_temps: &LinkedHashMap<TempID, TempID>) -> Option<TempID> {
    match spill_scratch_temps.get(&scratch) {
        Some(src) => Some(get_source_temp_for_scratch(*src, spill_scratch_temps).unwrap_or(*src)),
        None => None
    }
}
