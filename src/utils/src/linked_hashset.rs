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

use std::collections::hash_map::RandomState;
use std::hash::{BuildHasher, Hash};
use std::borrow::Borrow;
use std::iter::FromIterator;

use linked_hash_map::LinkedHashMap;
use linked_hash_map::Keys;

/// A hash set that remembers insertion order.
///
/// Set semantics (membership, equality) ignore the order; `pop_front`/`pop_back`
/// and iteration observe it.
pub struct LinkedHashSet<K, S = RandomState>(LinkedHashMap<K, (), S>);

impl<K: Hash + Eq> LinkedHashSet<K> {
    pub fn new() -> Self {
        LinkedHashSet(LinkedHashMap::new())
    }

    pub fn new1(val: K) -> Self {
        let mut ret = LinkedHashSet::new();
        ret.insert(val);
        ret
    }

    pub fn from_vec(from: Vec<K>) -> Self {
        let mut ret = LinkedHashSet::new();

        for ele in from {
            ret.insert(ele);
        }

        ret
    }

    pub fn to_vec(mut self) -> Vec<K> {
        let mut ret = vec![];

        while let Some(ele) = self.pop_front() {
            ret.push(ele);
        }

        ret
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }
}

impl<K: Hash + Eq, S: BuildHasher> LinkedHashSet<K, S> {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn pop_front(&mut self) -> Option<K> {
        self.0.pop_front().map(|(k, _)| k)
    }

    pub fn pop_back(&mut self) -> Option<K> {
        self.0.pop_back().map(|(k, _)| k)
    }

    /// inserts an element, returns true if it was not present before
    /// (an element already present keeps its position)
    pub fn insert(&mut self, k: K) -> bool {
        if self.0.contains_key(&k) {
            false
        } else {
            self.0.insert(k, ());
            true
        }
    }

    pub fn contains<Q: ?Sized>(&self, k: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Eq + Hash,
    {
        self.0.contains_key(k)
    }

    /// removes an element, returns true if it was present
    pub fn remove<Q: ?Sized>(&mut self, k: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Eq + Hash,
    {
        self.0.remove(k).is_some()
    }

    pub fn iter(&self) -> Keys<K, ()> {
        self.0.keys()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn add_all(&mut self, other: &Self)
    where
        K: Clone,
    {
        for ele in other.iter() {
            self.insert(ele.clone());
        }
    }

    pub fn add_from_slice(&mut self, slice: &[K])
    where
        K: Clone,
    {
        for ele in slice {
            self.insert(ele.clone());
        }
    }

    /// unordered set equality
    pub fn equals(&self, other: &Self) -> bool {
        if self.len() != other.len() {
            return false;
        }

        self.iter().all(|ele| other.contains(ele))
    }
}

impl<K: Hash + Eq + Clone> Clone for LinkedHashSet<K> {
    fn clone(&self) -> Self {
        LinkedHashSet(self.0.clone())
    }
}

impl<K: Hash + Eq> Default for LinkedHashSet<K> {
    fn default() -> Self {
        LinkedHashSet::new()
    }
}

impl<K: Hash + Eq, S: BuildHasher> PartialEq for LinkedHashSet<K, S> {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other)
    }
}

impl<K: Hash + Eq, S: BuildHasher> Eq for LinkedHashSet<K, S> {}

impl<K: Hash + Eq> FromIterator<K> for LinkedHashSet<K> {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let mut ret = LinkedHashSet::new();
        for ele in iter {
            ret.insert(ele);
        }
        ret
    }
}

impl<'a, K: Hash + Eq, S: BuildHasher> IntoIterator for &'a LinkedHashSet<K, S> {
    type Item = &'a K;
    type IntoIter = Keys<'a, K, ()>;

    fn into_iter(self) -> Keys<'a, K, ()> {
        self.iter()
    }
}

use std::fmt;
impl<A: fmt::Debug + Hash + Eq, S: BuildHasher> fmt::Debug for LinkedHashSet<A, S> {
    /// Returns a string that lists the elements in insertion order.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}
