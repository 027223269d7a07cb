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

use tiger_backend::ast::ir::*;
use tiger_backend::ast::inst::*;
use tiger_backend::options::start_logging_trace;
use tiger_backend::compiler::backend::x86_64;
use tiger_backend::compiler::backend::peephole_opt::*;

use super::*;

#[test]
fn test_remove_moves_between_same_register() {
    start_logging_trace();

    let mut context = FunctionContext::new();
    temps!((context) t1, t2, t3);
    let (rax, rdi) = (x86_64::RAX.id, x86_64::RDI.id);

    let mut cf = new_function(context, vec![
        oper!("movq $1, `d0"; [t1] <- []),
        mov!(t2, t1),
        mov!(t3, t2),
        oper!("addq `s0, `d0"; [t3] <- [t2, t3]),
        mov!(rax, t3),
    ]);

    let colors = hashmap!{
        t1 => rax,
        t2 => rax,
        t3 => rdi
    };
    for (t, c) in colors.iter() {
        cf.temps.insert(*t, *c);
    }

    assert!(is_redundant_move(1, &cf));
    assert!(!is_redundant_move(2, &cf));
    assert!(!is_redundant_move(0, &cf));

    assert_eq!(remove_redundant_moves(&mut cf), 1);
    assert_eq!(get_number_of_moves(&cf), 2);

    // a second run finds nothing to remove
    assert_eq!(remove_redundant_moves(&mut cf), 0);
    assert_eq!(cf.number_of_insts(), 5);
}
