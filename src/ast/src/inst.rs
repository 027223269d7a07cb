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

use ir::*;

use std::fmt;
use std::slice;

/// control transfer of an `Oper`
#[derive(Clone, Debug, PartialEq)]
pub enum Jump {
    /// never falls through to the next instruction
    Unconditional(Label),
    /// falls through to the next instruction when not taken, so the
    /// next instruction must be the false-branch continuation
    Conditional(Vec<Label>),
}

/// a machine instruction over temporaries
///
/// `assem` is an assembly template: `` `s<n> ``, `` `d<n> `` and `` `j<n> `` refer to
/// the n-th source, destination and jump target.
#[derive(Clone, Debug, PartialEq)]
pub enum Instr {
    Label {
        assem: String,
        label: Label,
    },
    /// register-to-register copy: exactly one destination and one source
    Move {
        assem: String,
        dst: Vec<TempID>,
        src: Vec<TempID>,
    },
    Oper {
        assem: String,
        dst: Vec<TempID>,
        src: Vec<TempID>,
        jump: Option<Jump>,
    },
}

impl Instr {
    pub fn label(label: Label) -> Instr {
        Instr::Label {
            assem: format!("{}:", label),
            label: label,
        }
    }

    pub fn mov<S: Into<String>>(assem: S, dst: TempID, src: TempID) -> Instr {
        Instr::Move {
            assem: assem.into(),
            dst: vec![dst],
            src: vec![src],
        }
    }

    pub fn oper<S: Into<String>>(assem: S, dst: Vec<TempID>, src: Vec<TempID>) -> Instr {
        Instr::Oper {
            assem: assem.into(),
            dst: dst,
            src: src,
            jump: None,
        }
    }

    pub fn jump<S: Into<String>>(assem: S, target: Label) -> Instr {
        Instr::Oper {
            assem: assem.into(),
            dst: vec![],
            src: vec![],
            jump: Some(Jump::Unconditional(target)),
        }
    }

    pub fn cjump<S: Into<String>>(assem: S, src: Vec<TempID>, targets: Vec<Label>) -> Instr {
        Instr::Oper {
            assem: assem.into(),
            dst: vec![],
            src: src,
            jump: Some(Jump::Conditional(targets)),
        }
    }

    pub fn defs(&self) -> &[TempID] {
        match *self {
            Instr::Label { .. } => &[],
            Instr::Move { ref dst, .. } | Instr::Oper { ref dst, .. } => &dst[..],
        }
    }

    pub fn uses(&self) -> &[TempID] {
        match *self {
            Instr::Label { .. } => &[],
            Instr::Move { ref src, .. } | Instr::Oper { ref src, .. } => &src[..],
        }
    }

    pub fn is_move(&self) -> bool {
        match *self {
            Instr::Move { .. } => true,
            _ => false,
        }
    }

    pub fn is_unconditional_jump(&self) -> bool {
        match *self {
            Instr::Oper { jump: Some(Jump::Unconditional(_)), .. } => true,
            _ => false,
        }
    }

    pub fn jump_targets(&self) -> &[Label] {
        match *self {
            Instr::Oper { jump: Some(Jump::Unconditional(ref target)), .. } => slice::from_ref(target),
            Instr::Oper { jump: Some(Jump::Conditional(ref targets)), .. } => &targets[..],
            _ => &[],
        }
    }

    /// returns the label if this is a label pseudo instruction
    pub fn get_label(&self) -> Option<&Label> {
        match *self {
            Instr::Label { ref label, .. } => Some(label),
            _ => None,
        }
    }

    /// replaces every use of `from` with `to`, returns true if anything changed
    pub fn replace_use(&mut self, from: TempID, to: TempID) -> bool {
        match *self {
            Instr::Label { .. } => false,
            Instr::Move { ref mut src, .. } | Instr::Oper { ref mut src, .. } => {
                replace_in(src, from, to)
            }
        }
    }

    /// replaces every define of `from` with `to`, returns true if anything changed
    pub fn replace_def(&mut self, from: TempID, to: TempID) -> bool {
        match *self {
            Instr::Label { .. } => false,
            Instr::Move { ref mut dst, .. } | Instr::Oper { ref mut dst, .. } => {
                replace_in(dst, from, to)
            }
        }
    }

    /// renders the assembly template, naming registers with `name_of`
    pub fn format<F: Fn(TempID) -> String>(&self, name_of: F) -> String {
        match *self {
            Instr::Label { ref assem, .. } => assem.clone(),
            Instr::Move {
                ref assem,
                ref dst,
                ref src,
            } => format_assem(assem, dst, src, &[], &name_of),
            Instr::Oper {
                ref assem,
                ref dst,
                ref src,
                ..
            } => format_assem(assem, dst, src, self.jump_targets(), &name_of),
        }
    }
}

impl fmt::Display for Instr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.format(|t| format!("t{}", t)))
    }
}

fn replace_in(list: &mut Vec<TempID>, from: TempID, to: TempID) -> bool {
    let mut replaced = false;
    for t in list.iter_mut() {
        if *t == from {
            *t = to;
            replaced = true;
        }
    }
    replaced
}

fn format_assem<F: Fn(TempID) -> String>(
    assem: &str,
    dst: &[TempID],
    src: &[TempID],
    jumps: &[Label],
    name_of: &F,
) -> String {
    let mut ret = String::with_capacity(assem.len());
    let mut chars = assem.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '`' {
            ret.push(c);
            continue;
        }

        let kind = match chars.next() {
            Some(kind) => kind,
            None => panic!("dangling placeholder at the end of \"{}\"", assem),
        };
        if kind == '`' {
            ret.push('`');
            continue;
        }

        let mut digits = String::new();
        while let Some(&d) = chars.peek() {
            if d.is_digit(10) {
                digits.push(d);
                chars.next();
            } else {
                break;
            }
        }
        let index: usize = match digits.parse() {
            Ok(index) => index,
            Err(_) => panic!("placeholder `{} without an operand index in \"{}\"", kind, assem),
        };

        match kind {
            's' => match src.get(index) {
                Some(t) => ret.push_str(&name_of(*t)),
                None => panic!("\"{}\" refers to source {} but has {} sources", assem, index, src.len()),
            },
            'd' => match dst.get(index) {
                Some(t) => ret.push_str(&name_of(*t)),
                None => panic!("\"{}\" refers to destination {} but has {} destinations", assem, index, dst.len()),
            },
            'j' => match jumps.get(index) {
                Some(l) => ret.push_str(l.name()),
                None => panic!("\"{}\" refers to jump target {} but has {} targets", assem, index, jumps.len()),
            },
            _ => panic!("unknown placeholder `{} in \"{}\"", kind, assem),
        }
    }

    ret
}
