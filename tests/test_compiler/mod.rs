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

mod test_liveness;
mod test_regalloc;
mod test_peephole;

use tiger_backend::ast::ir::*;
use tiger_backend::ast::inst::*;
use tiger_backend::compiler::frame::Frame;
use tiger_backend::compiler::machine_code::CompiledFunction;
use tiger_backend::compiler::backend::x86_64;

/// wraps a body into a function named `f` with an empty frame, appending the return sink
pub fn new_function(context: FunctionContext, body: Vec<Instr>) -> CompiledFunction {
    let mut context = context;
    let mut body = body;
    x86_64::proc_entry_exit2(&mut body);

    let frame = Frame::new(Label::named("f"), &[], &mut context);
    CompiledFunction::new(context, frame, body)
}

pub fn get_number_of_moves(cf: &CompiledFunction) -> usize {
    (0..cf.number_of_insts()).filter(|&i| cf.is_move(i)).count()
}

/// the first `n` registers in coloring order
pub fn first_regs(n: usize) -> Vec<TempID> {
    x86_64::all_usable_regs().iter().take(n).map(|r| r.id).collect()
}
