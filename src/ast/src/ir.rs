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

use utils::LinkedHashMap;

use std::fmt;

/// identifier of a temporary (virtual register) or a machine register
pub type TempID = usize;

/// machine registers use ids in [MACHINE_ID_START, MACHINE_ID_END)
pub const MACHINE_ID_START: TempID = 0;
pub const MACHINE_ID_END: TempID = 100;

/// returns true if the id is reserved for a machine register
#[inline(always)]
pub fn is_machine_id(id: TempID) -> bool {
    id < MACHINE_ID_END
}

/// a symbolic code address
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Label(String);

impl Label {
    pub fn named<S: Into<String>>(name: S) -> Label {
        Label(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for Label {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// a record for a temporary
///
/// `pointer` is set by earlier stages when the temporary may hold a heap pointer.
/// The backend never interprets it, it only makes sure every register that takes
/// over the role of this one (spill scratch registers, spill slots) carries it as well.
#[derive(Clone, Debug)]
pub struct TempEntry {
    pub id: TempID,
    pub pointer: bool,
}

/// per-function table of temporaries and a label supply
pub struct FunctionContext {
    temps: LinkedHashMap<TempID, TempEntry>,
    next_temp: TempID,
    next_label: usize,
}

impl FunctionContext {
    pub fn new() -> FunctionContext {
        FunctionContext {
            temps: LinkedHashMap::new(),
            next_temp: MACHINE_ID_END,
            next_label: 0,
        }
    }

    /// creates a fresh temporary that does not hold a pointer
    pub fn new_temp(&mut self) -> TempID {
        self.new_temp_with(false)
    }

    /// creates a fresh temporary that holds a heap pointer
    pub fn new_pointer_temp(&mut self) -> TempID {
        self.new_temp_with(true)
    }

    /// creates a fresh temporary carrying the pointer tag of `orig`
    pub fn new_temp_like(&mut self, orig: TempID) -> TempID {
        let pointer = self.is_pointer(orig);
        self.new_temp_with(pointer)
    }

    fn new_temp_with(&mut self, pointer: bool) -> TempID {
        let id = self.next_temp;
        self.next_temp += 1;

        trace!("new temp t{} (pointer: {})", id, pointer);
        self.temps.insert(id, TempEntry { id: id, pointer: pointer });
        id
    }

    pub fn new_label(&mut self) -> Label {
        let ret = Label(format!("L{}", self.next_label));
        self.next_label += 1;
        ret
    }

    /// machine registers and unknown ids never hold a pointer
    pub fn is_pointer(&self, id: TempID) -> bool {
        match self.temps.get(&id) {
            Some(entry) => entry.pointer,
            None => false,
        }
    }

    pub fn set_pointer(&mut self, id: TempID, pointer: bool) {
        match self.temps.get_mut(&id) {
            Some(entry) => entry.pointer = pointer,
            None => panic!("t{} is not a temporary of this function", id),
        }
    }

    pub fn get_temp_display(&self, id: TempID) -> String {
        if self.is_pointer(id) {
            format!("t{}*", id)
        } else {
            format!("t{}", id)
        }
    }
}

impl Default for FunctionContext {
    fn default() -> FunctionContext {
        FunctionContext::new()
    }
}
