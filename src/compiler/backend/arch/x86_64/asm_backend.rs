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
use utils::LinkedHashMap;
use utils::LinkedHashSet;

use std::mem;

/// rewrites the code of a function so that every spilled temporary lives in its frame slot.
///
/// `spills` maps spilled temporaries to their slot offsets. Each use of a spilled temporary is
/// replaced by a fresh scratch temporary that is loaded right before the instruction, each
/// define by a scratch temporary that is stored right after it. An instruction that both uses
/// and defines a spilled temporary uses the same scratch temporary for both.
///
/// Returns a map from scratch temporaries to the spilled temporaries they stand for.
pub fn spill_rewrite(
    spills: &LinkedHashMap<TempID, isize>,
    cf: &mut CompiledFunction
) -> LinkedHashMap<TempID, TempID> {
    trace!("spill rewrite for x86_64 asm backend");

    trace!("code before spilling");
    cf.trace_mc();

    // if temp a gets spilled, all its uses and defines will become a use/def of a scratch temp
    // we maintain this mapping for later use
    let mut spilled_scratch_temps = LinkedHashMap::new();

    // map from old to new
    let mut temp_for_cur_inst: LinkedHashMap<TempID, TempID> = LinkedHashMap::new();

    let old_insts = mem::replace(&mut cf.insts, vec![]);
    let mut new_insts = Vec::with_capacity(old_insts.len());

    // iterate through all instructions
    for (i, mut inst) in old_insts.into_iter().enumerate() {
        temp_for_cur_inst.clear();

        trace!("---Inst {}---", i);
        // find use of any register that gets spilled
        {
            let reg_uses = LinkedHashSet::from_vec(inst.uses().to_vec());
            for reg in reg_uses.iter() {
                let offset = match spills.get(reg) {
                    Some(offset) => *offset,
                    None => continue
                };

                let temp = cf.context.new_temp_like(*reg);
                trace!("{} used in Inst{} is replaced as {}",
                    cf.context.get_temp_display(*reg), i, cf.context.get_temp_display(temp));
                spilled_scratch_temps.insert(temp, *reg);

                // load into the scratch temp right before this instruction
                let load = format!("movq {}, `d0", cf.frame.slot_operand(offset));
                trace!("insert before inst #{}: {}", i, load);
                new_insts.push(Instr::oper(load, vec![temp], vec![]));

                inst.replace_use(*reg, temp);
                temp_for_cur_inst.insert(*reg, temp);
            }
        }

        // find define of any register that gets spilled
        let mut spill_code_after = vec![];
        {
            let reg_defines = LinkedHashSet::from_vec(inst.defs().to_vec());
            for reg in reg_defines.iter() {
                let offset = match spills.get(reg) {
                    Some(offset) => *offset,
                    None => continue
                };

                let temp = match temp_for_cur_inst.get(reg) {
                    Some(temp) => *temp,
                    None => {
                        let temp = cf.context.new_temp_like(*reg);
                        spilled_scratch_temps.insert(temp, *reg);
                        temp
                    }
                };
                trace!("{} defined in Inst{} is replaced as {}",
                    cf.context.get_temp_display(*reg), i, cf.context.get_temp_display(temp));

                // store from the scratch temp right after this instruction
                let store = format!("movq `s0, {}", cf.frame.slot_operand(offset));
                trace!("insert after inst #{}: {}", i, store);
                spill_code_after.push(Instr::oper(store, vec![], vec![temp]));

                inst.replace_def(*reg, temp);
            }
        }

        new_insts.push(inst);
        new_insts.append(&mut spill_code_after);
    }

    cf.insts = new_insts;

    trace!("code after spilling");
    cf.trace_mc();

    spilled_scratch_temps
}

/// appends a sink instruction that uses the return sink registers, so that they
/// are live until the end of the function body
pub fn proc_entry_exit2(body: &mut Vec<Instr>) {
    let sink = x86_64::RETURN_SINK.iter().map(|reg| reg.id).collect();
    body.push(Instr::oper("", vec![], sink));
}

/// returns the prologue and the epilogue of a function. The prologue defines
/// `<fn>_framesize`, which every frame slot operand is relative to
pub fn proc_entry_exit3(cf: &CompiledFunction) -> (String, String) {
    let name = cf.name();
    let size = cf.frame.frame_size();

    let mut prologue = String::new();
    prologue.push_str(&format!("{}:\n", name));
    prologue.push_str(&format!(".set {}_framesize, {}\n", name, size));
    prologue.push_str(&format!("subq ${}, %rsp\n", size));

    let mut epilogue = String::new();
    epilogue.push_str(&format!("addq ${}, %rsp\n", size));
    epilogue.push_str("retq\n");

    (prologue, epilogue)
}

/// emits a function as assembly text. Empty instructions (such as the return sink) are skipped
pub fn emit_code(cf: &CompiledFunction) -> String {
    let (prologue, epilogue) = proc_entry_exit3(cf);

    let mut ret = prologue;
    for i in 0..cf.number_of_insts() {
        let line = cf.emit_inst(i);
        if !line.is_empty() {
            ret.push_str(&line);
            ret.push('\n');
        }
    }
    ret.push_str(&epilogue);

    ret
}
