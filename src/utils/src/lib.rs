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

//! # Utility crate that serves the tiger backend
//!
//! It includes:
//!
//! * data structures
//!   * linked hashmap/set (insertion ordered, so every worklist pick is reproducible)
//! * extra functions for existing types
//!   * vector
//! * literal macros for the linked containers

extern crate linked_hash_map;

/// linked hashset implementation based on LinkedHashMap
mod linked_hashset;

// re-export these data structures

pub use linked_hash_map::LinkedHashMap;
pub use linked_hashset::LinkedHashSet;

// These modules provide operations on Vector.
// They are not found in the standard library.
/// vector utilities
pub mod vec_utils;

/// the macro to create LinkedHashMap
#[macro_export]
macro_rules! linked_hashmap {
    ($($key:expr => $value:expr,)+) => { linked_hashmap!($($key => $value),+) };
    ($($key:expr => $value:expr),*) => {
        {
            let mut _map = $crate::LinkedHashMap::new();
            $(
                _map.insert($key, $value);
            )*
            _map
        }
    };
}

/// the macro to create LinkedHashSet
#[macro_export]
macro_rules! linked_hashset {
    ($($value:expr,)+) => { linked_hashset!($($value),+) };
    ($($value:expr),*) => {
        {
            let mut _set = $crate::LinkedHashSet::new();
            $(
                _set.insert($value);
            )*
            _set
        }
    };
}


#[cfg(test)]
mod tests {
    #[test]
    fn test_literal_macros() {
        let map = linked_hashmap!{3 => "c", 1 => "a"};
        assert_eq!(map.keys().cloned().collect::<Vec<_>>(), vec![3, 1]);

        let set = linked_hashset!{2, 5, 2};
        assert_eq!(set.len(), 2);
        assert_eq!(set.iter().cloned().collect::<Vec<_>>(), vec![2, 5]);
    }
}
