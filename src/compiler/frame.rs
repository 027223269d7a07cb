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
use compiler::backend::x86_64;

use std::fmt;

/// Frame manages the stack allocation that is known statically for a function:
/// escaping formals, escaping locals and spilled registers.
///
/// on x64
/// | previous frame ...
/// |---------------
/// | incoming arguments (7th onwards)
/// | return address
/// |---------------     <- %rsp + <fn>_framesize
/// | escaping formals
/// | locals/spilled
/// |---------------
/// | outgoing arguments
/// |---------------     <- %rsp
///
/// There is no frame pointer at runtime. Every slot is addressed as
/// `(<fn>_framesize<offset>)(%rsp)`, where `<fn>_framesize` is set by the
/// prologue (see `x86_64::proc_entry_exit3()`).
#[derive(Clone, Debug)]
pub struct Frame {
    /// function name, also the prefix of the frame size symbol
    name: Label,
    /// offset of the next slot, relative to the frame base
    cur_offset: isize,
    /// how each formal is accessed from within the function body
    pub formals: Vec<Access>,
    /// locals and spill slots, in the order they were allocated
    pub locals: Vec<Access>
}

/// Access describes where a formal or local lives
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Access {
    /// a stack slot at the given offset from the frame base. `pointer` marks
    /// slots that hold heap references, so a collector can find them
    InFrame { offset: isize, pointer: bool },
    /// a virtual register
    InReg(TempID)
}

impl Access {
    /// marks this access as holding a heap pointer. For a register access the
    /// tag goes onto the register's record in the function context
    pub fn set_store_pointer(&mut self, context: &mut FunctionContext) {
        match *self {
            Access::InFrame { ref mut pointer, .. } => *pointer = true,
            Access::InReg(temp) => context.set_pointer(temp, true)
        }
    }

    pub fn is_pointer(&self, context: &FunctionContext) -> bool {
        match *self {
            Access::InFrame { pointer, .. } => pointer,
            Access::InReg(temp) => context.is_pointer(temp)
        }
    }

    pub fn offset(&self) -> Option<isize> {
        match *self {
            Access::InFrame { offset, .. } => Some(offset),
            Access::InReg(_) => None
        }
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "\nFrame for {} {{", self.name)?;
        writeln!(f, "  formals:")?;
        for access in self.formals.iter() {
            writeln!(f, "    {:?}", access)?;
        }
        writeln!(f, "  locals:")?;
        for access in self.locals.iter() {
            writeln!(f, "    {:?}", access)?;
        }
        writeln!(f, "  cur offset: {}", self.cur_offset)?;
        writeln!(f, "}}")
    }
}

impl Frame {
    /// creates a frame for a function whose formals escape as given by `formals_escape`.
    /// Escaping formals get a slot (or use their incoming stack slot if they are
    /// beyond the argument registers), the others get a fresh register.
    pub fn new(name: Label, formals_escape: &[bool], context: &mut FunctionContext) -> Frame {
        let n_arg_regs = x86_64::ARGUMENT_GPRS.len();
        let word = x86_64::WORD_SIZE as isize;

        let mut frame = Frame {
            name: name,
            cur_offset: -word,
            formals: vec![],
            locals: vec![]
        };

        for (i, escape) in formals_escape.iter().enumerate() {
            let access = if *escape {
                if i < n_arg_regs {
                    frame.next_slot()
                } else {
                    // passed on the stack, above the return address
                    Access::InFrame {
                        offset: word * (i + 1 - n_arg_regs) as isize,
                        pointer: false
                    }
                }
            } else {
                Access::InReg(context.new_temp())
            };

            trace!("formal #{} of {}: {:?}", i, frame.name, access);
            frame.formals.push(access);
        }

        frame
    }

    pub fn name(&self) -> &Label {
        &self.name
    }

    /// allocates a local. Escaping locals get a frame slot, others a fresh register.
    /// Returns the access so the caller may tag it (see `Access::set_store_pointer()`)
    pub fn alloc_local(&mut self, escape: bool, context: &mut FunctionContext) -> &mut Access {
        let access = if escape {
            self.next_slot()
        } else {
            Access::InReg(context.new_temp())
        };

        self.locals.push(access);
        match self.locals.last_mut() {
            Some(access) => access,
            None => unreachable!()
        }
    }

    /// allocates a slot for a spilled register, and returns its offset.
    /// The slot is tagged as a pointer slot if the register holds a pointer
    pub fn alloc_slot_for_spilling(&mut self, reg: TempID, context: &mut FunctionContext) -> isize {
        let is_pointer = context.is_pointer(reg);

        let access = self.alloc_local(true, context);
        if is_pointer {
            access.set_store_pointer(context);
        }

        trace!("spill slot for {}: {:?}", context.get_temp_display(reg), access);
        match access.offset() {
            Some(offset) => offset,
            None => unreachable!()
        }
    }

    /// returns current size, so that %rsp stays 16 bytes aligned at call sites
    /// (the return address takes the other 8 bytes)
    pub fn frame_size(&self) -> usize {
        let word = x86_64::WORD_SIZE;

        let size = (-self.cur_offset) as usize;
        if (size + word) % 16 != 0 {
            size + word
        } else {
            size
        }
    }

    /// offsets of all slots that hold heap pointers
    pub fn pointer_slots(&self) -> Vec<isize> {
        self.formals.iter().chain(self.locals.iter())
            .filter_map(|access| match *access {
                Access::InFrame { offset, pointer: true } => Some(offset),
                _ => None
            })
            .collect()
    }

    /// the memory operand text for the slot at `offset`
    pub fn slot_operand(&self, offset: isize) -> String {
        format!("({}_framesize{:+})(%rsp)", self.name, offset)
    }

    fn next_slot(&mut self) -> Access {
        let ret = Access::InFrame { offset: self.cur_offset, pointer: false };
        self.cur_offset -= x86_64::WORD_SIZE as isize;
        ret
    }
}
