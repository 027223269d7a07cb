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

//! # Machine-level IR for the tiger backend
//!
//! Instruction selection produces a flat list of [`Instr`](inst/enum.Instr.html) over
//! virtual registers (temporaries). Every temporary is identified by a [`TempID`](ir/type.TempID.html);
//! ids below `MACHINE_ID_END` name machine registers.
//!
//! The register allocator only relies on the def/use lists, the move/non-move
//! distinction and the jump targets of each instruction. The assembly template
//! is carried around as text and only interpreted when printing.

#[macro_use]
extern crate log;
extern crate tiger_utils as utils;

/// temporaries, labels and the per-function context that owns them
pub mod ir;
/// machine-level instructions
pub mod inst;
