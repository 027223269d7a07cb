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

use compiler::machine_code::CompiledFunction;
use options::BackendOptions;
use options::start_logging;

use std::cell::RefCell;

/// backend of the compiler: register allocation and the passes after it
pub mod backend;
/// static stack frame of a function
pub mod frame;
/// the code of a function going through the backend
pub mod machine_code;

pub use compiler::backend::reg_alloc::RegisterAllocation;
pub use compiler::backend::peephole_opt::PeepholeOptimization;

/// Compiler runs each pass of its policy over a function, in order
pub struct Compiler {
    policy: RefCell<CompilerPolicy>
}

impl Compiler {
    /// creates a compiler, and starts logging as the options say
    pub fn new(policy: CompilerPolicy, options: &BackendOptions) -> Compiler {
        start_logging(options.flag_log_level);

        Compiler {
            policy: RefCell::new(policy)
        }
    }

    pub fn compile(&self, cf: &mut CompiledFunction) {
        info!("compiling {}", cf.name());

        let mut policy = self.policy.borrow_mut();
        for pass in policy.passes.iter_mut() {
            pass.execute(cf);
        }
    }
}

/// CompilerPolicy specifies the passes and their order
pub struct CompilerPolicy {
    pub passes: Vec<Box<CompilerPass>>
}

impl CompilerPolicy {
    /// register allocation, then removal of the moves it made redundant
    pub fn default(options: &BackendOptions) -> CompilerPolicy {
        let mut passes : Vec<Box<CompilerPass>> = vec![];
        passes.push(Box::new(RegisterAllocation::new(options)));
        passes.push(Box::new(PeepholeOptimization::new()));

        CompilerPolicy{passes: passes}
    }

    pub fn new(passes: Vec<Box<CompilerPass>>) -> CompilerPolicy {
        CompilerPolicy{passes: passes}
    }
}

/// a pass over a function
#[allow(unused_variables)]
pub trait CompilerPass {
    fn name(&self) -> &'static str;

    fn execute(&mut self, cf: &mut CompiledFunction) {
        info!("---CompilerPass {} for {}---", self.name(), cf.name());

        self.visit_function(cf);
        self.finish_function(cf);

        info!("---finish---");
    }

    fn visit_function(&mut self, cf: &mut CompiledFunction) {}
    fn finish_function(&mut self, cf: &mut CompiledFunction) {}
}
