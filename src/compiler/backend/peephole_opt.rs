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
use compiler::CompilerPass;
use compiler::machine_code::CompiledFunction;

/// removes moves whose source and destination got the same register
pub struct PeepholeOptimization {
    name: &'static str
}

impl PeepholeOptimization {
    pub fn new() -> PeepholeOptimization {
        PeepholeOptimization {
            name: "Peephole Optimization"
        }
    }
}

/// returns true if instruction `inst` is a move between temps in the same register
pub fn is_redundant_move(inst: usize, cf: &CompiledFunction) -> bool {
    if !cf.is_move(inst) {
        return false;
    }

    let src : TempID = match cf.get_inst_reg_uses(inst).first() {
        Some(src) => *src,
        None => return false
    };
    let dst : TempID = match cf.get_inst_reg_defines(inst).first() {
        Some(dst) => *dst,
        None => return false
    };

    let src_machine_reg = cf.get_color(src).unwrap_or(src);
    let dst_machine_reg = cf.get_color(dst).unwrap_or(dst);

    src_machine_reg == dst_machine_reg
}

/// deletes every redundant move, returns how many were deleted
pub fn remove_redundant_moves(cf: &mut CompiledFunction) -> usize {
    let redundant : Vec<bool> = (0..cf.number_of_insts())
        .map(|i| {
            let ret = is_redundant_move(i, cf);
            if ret {
                trace!("#{} {} is redundant! removed", i, cf.emit_inst(i));
            }
            ret
        })
        .collect();

    let n_before = cf.insts.len();
    let mut index = 0;
    cf.insts.retain(|_| {
        let keep = !redundant[index];
        index += 1;
        keep
    });

    n_before - cf.insts.len()
}

impl CompilerPass for PeepholeOptimization {
    fn name(&self) -> &'static str {
        self.name
    }

    fn visit_function(&mut self, cf: &mut CompiledFunction) {
        let removed = remove_redundant_moves(cf);
        debug!("{} redundant moves removed", removed);
    }

    fn finish_function(&mut self, cf: &mut CompiledFunction) {
        trace!("after peephole optimization:");
        cf.trace_mc();
    }
}
