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

//! x86-64 register description and the target specific parts of register allocation
//! (spill code, function entry/exit sequences).

/// assembly text for spill code and function entry/exit
pub mod asm_backend;

pub use compiler::backend::x86_64::asm_backend::spill_rewrite;
pub use compiler::backend::x86_64::asm_backend::proc_entry_exit2;
pub use compiler::backend::x86_64::asm_backend::proc_entry_exit3;
pub use compiler::backend::x86_64::asm_backend::emit_code;

use ast::ir::*;
use utils::LinkedHashMap;

/// a 64-bit general purpose register. Its id is also its color
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MachineReg {
    pub id: TempID,
    pub name: &'static str
}

macro_rules! GPR64 {
    ($id:expr, $name: expr) => {
        MachineReg {
            id: MACHINE_ID_START + $id,
            name: $name
        }
    };
}

pub const WORD_SIZE: usize = 8;

// ids follow the hardware encoding
lazy_static! {
    pub static ref RAX : MachineReg = GPR64!(0,  "%rax");
    pub static ref RCX : MachineReg = GPR64!(1,  "%rcx");
    pub static ref RDX : MachineReg = GPR64!(2,  "%rdx");
    pub static ref RBX : MachineReg = GPR64!(3,  "%rbx");
    pub static ref RSP : MachineReg = GPR64!(4,  "%rsp");
    pub static ref RBP : MachineReg = GPR64!(5,  "%rbp");
    pub static ref RSI : MachineReg = GPR64!(6,  "%rsi");
    pub static ref RDI : MachineReg = GPR64!(7,  "%rdi");
    pub static ref R8  : MachineReg = GPR64!(8,  "%r8");
    pub static ref R9  : MachineReg = GPR64!(9,  "%r9");
    pub static ref R10 : MachineReg = GPR64!(10, "%r10");
    pub static ref R11 : MachineReg = GPR64!(11, "%r11");
    pub static ref R12 : MachineReg = GPR64!(12, "%r12");
    pub static ref R13 : MachineReg = GPR64!(13, "%r13");
    pub static ref R14 : MachineReg = GPR64!(14, "%r14");
    pub static ref R15 : MachineReg = GPR64!(15, "%r15");
}

lazy_static! {
    pub static ref FRAME_POINTER : MachineReg = *RBP;
    pub static ref STACK_POINTER : MachineReg = *RSP;
    pub static ref RETURN_VALUE  : MachineReg = *RAX;

    pub static ref ARGUMENT_GPRS : [MachineReg; 6] = [
        *RDI,
        *RSI,
        *RDX,
        *RCX,
        *R8,
        *R9
    ];

    pub static ref CALLER_SAVED_GPRS : [MachineReg; 9] = [
        *RAX,
        *RDI,
        *RSI,
        *RDX,
        *RCX,
        *R8,
        *R9,
        *R10,
        *R11
    ];

    pub static ref CALLEE_SAVED_GPRS : [MachineReg; 6] = [
        *RBX,
        *RBP,
        *R12,
        *R13,
        *R14,
        *R15
    ];

    /// registers that are live at the end of a function
    pub static ref RETURN_SINK : [MachineReg; 1] = [
        *RAX
    ];
}

lazy_static! {
    pub static ref ALL_MACHINE_REGS : LinkedHashMap<TempID, MachineReg> = {
        let mut ret = LinkedHashMap::new();
        for reg in [*RAX, *RCX, *RDX, *RBX, *RSP, *RBP, *RSI, *RDI,
                    *R8, *R9, *R10, *R11, *R12, *R13, *R14, *R15].iter() {
            ret.insert(reg.id, *reg);
        }
        ret
    };

    // the order here is the order colors are tried in.
    // %rsp is never allocated
    pub static ref ALL_USABLE_MACHINE_REGS : Vec<MachineReg> = vec![
        *RAX,
        *RDI,
        *RSI,
        *RDX,
        *RCX,
        *RBX,
        *RBP,
        *R8,
        *R9,
        *R10,
        *R11,
        *R12,
        *R13,
        *R14,
        *R15
    ];
}

pub fn all_regs() -> &'static LinkedHashMap<TempID, MachineReg> {
    &ALL_MACHINE_REGS
}

pub fn all_usable_regs() -> &'static Vec<MachineReg> {
    &ALL_USABLE_MACHINE_REGS
}

/// K, the number of colors
pub fn number_of_usable_regs() -> usize {
    ALL_USABLE_MACHINE_REGS.len()
}

pub fn number_of_all_regs() -> usize {
    ALL_MACHINE_REGS.len()
}

pub fn is_machine_reg(id: TempID) -> bool {
    ALL_MACHINE_REGS.contains_key(&id)
}

/// finds a register by its name, with or without the leading `%`
pub fn find_by_name(name: &str) -> Option<&'static MachineReg> {
    let name = name.trim_start_matches('%');
    ALL_MACHINE_REGS.values().find(|reg| &reg.name[1..] == name)
}

pub fn get_name_for_value(id: TempID) -> &'static str {
    match ALL_MACHINE_REGS.get(&id) {
        Some(reg) => reg.name,
        None => panic!("{} is not a machine register", id)
    }
}

pub fn is_callee_saved(id: TempID) -> bool {
    CALLEE_SAVED_GPRS.iter().any(|reg| reg.id == id)
}

pub fn is_caller_saved(id: TempID) -> bool {
    CALLER_SAVED_GPRS.iter().any(|reg| reg.id == id)
}
