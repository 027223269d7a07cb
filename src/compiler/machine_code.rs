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
use compiler::frame::Frame;
use compiler::backend::x86_64;
use utils::LinkedHashMap;

/// CompiledFunction stores all information (including code) for a function that
/// is going through the backend
pub struct CompiledFunction {
    /// temporaries of this function
    pub context: FunctionContext,
    /// frame info for this function
    pub frame: Frame,

    /// the machine code. Register allocation may insert spill code and delete moves
    pub insts: Vec<Instr>,

    /// a map between temporaries and their assigned machine registers.
    /// Empty until register allocation succeeds
    pub temps: LinkedHashMap<TempID, TempID>
}

impl CompiledFunction {
    pub fn new(context: FunctionContext, frame: Frame, insts: Vec<Instr>) -> CompiledFunction {
        CompiledFunction {
            context: context,
            frame: frame,
            insts: insts,
            temps: LinkedHashMap::new()
        }
    }

    pub fn name(&self) -> &Label {
        self.frame.name()
    }

    pub fn number_of_insts(&self) -> usize {
        self.insts.len()
    }

    pub fn get_inst_reg_uses(&self, index: usize) -> &[TempID] {
        self.insts[index].uses()
    }

    pub fn get_inst_reg_defines(&self, index: usize) -> &[TempID] {
        self.insts[index].defs()
    }

    pub fn is_move(&self, index: usize) -> bool {
        self.insts[index].is_move()
    }

    /// returns the register assigned to a temporary (a machine register is assigned to itself)
    pub fn get_color(&self, temp: TempID) -> Option<TempID> {
        if x86_64::is_machine_reg(temp) {
            Some(temp)
        } else {
            self.temps.get(&temp).cloned()
        }
    }

    /// the name used when printing a temporary. After register allocation
    /// this is the name of its machine register
    pub fn get_reg_name(&self, temp: TempID) -> String {
        match self.get_color(temp) {
            Some(color) => x86_64::get_name_for_value(color).to_string(),
            None => self.context.get_temp_display(temp)
        }
    }

    pub fn emit_inst(&self, index: usize) -> String {
        self.insts[index].format(|t| self.get_reg_name(t))
    }

    /// prints the code at trace level
    pub fn trace_mc(&self) {
        trace!("code for {}: ", self.name());
        for i in 0..self.number_of_insts() {
            trace!("#{}\t{}", i, self.emit_inst(i));
        }
    }

    /// emits the assembly for this function, prologue and epilogue included
    pub fn emit(&self) -> String {
        x86_64::emit_code(self)
    }
}
