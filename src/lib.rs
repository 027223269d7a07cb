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

//! # Register allocation backend for the tiger compiler
//!
//! The crate takes the abstract machine instructions produced by instruction
//! selection (see the `tiger_ast` crate) for one function, and assigns a machine
//! register to every temporary by iterated register coalescing. Temporaries that
//! cannot be colored are spilled to frame slots and the allocation is retried on
//! the rewritten code.
//!
//! Entry point is [`compiler::Compiler`](compiler/struct.Compiler.html):
//!
//! ```ignore
//! let options = BackendOptions::init("--log-level=info");
//! let compiler = Compiler::new(CompilerPolicy::default(&options), &options);
//! compiler.compile(&mut compiled_func);
//! // compiled_func.temps is the coloring, compiled_func.insts the final code
//! ```

#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate log;
#[macro_use]
extern crate serde_derive;
extern crate docopt;
extern crate petgraph;
extern crate stderrlog;

#[macro_use]
pub extern crate tiger_utils as utils;
pub extern crate tiger_ast as ast;

/// backend options and logging
pub mod options;
/// the register allocation pipeline
pub mod compiler;
