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

/// A register allocation pass. Graph coloring.
pub mod reg_alloc;
/// A peephole optimization pass after register allocation.
pub mod peephole_opt;

// re-export some common backend functions to allow target independent code

/// --- X86_64 backend ---
#[path = "arch/x86_64/mod.rs"]
pub mod x86_64;

/// returns all usable registers (machine registers that can be assigned to temporaries)
pub use compiler::backend::x86_64::all_usable_regs;

/// returns all the machine registers
pub use compiler::backend::x86_64::all_regs;

/// checks if a register is callee saved
pub use compiler::backend::x86_64::is_callee_saved;

/// rewrites a function with given spilling info
/// (inserting load/store for spilled temporaries)
pub use compiler::backend::x86_64::spill_rewrite;

/// emits a function as assembly text
pub use compiler::backend::x86_64::emit_code;
