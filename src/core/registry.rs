// Copyright 2025 Eric Jingryd (tidynest@proton.me)
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

//! Rule storage with upsert semantics
//!
//! This module indexes registered rules by their [`RuleKey`] using a
//! HashMap, so registering the same combination twice replaces the
//! earlier callback instead of adding a second binding.
//!
//! # Evaluation order
//! Exclusive rules come first, then non-exclusive ones; each group keeps
//! registration order. A replaced rule keeps its original position.
//!
//! # Performance
//! - Register / unregister: O(1) average plus an O(n log n) reorder
//! - Lookup by key: O(1) average case

use std::collections::HashMap;
use std::rc::Rc;

use crate::core::rule::{CombinationRule, RuleKey};

struct Entry<C> {
    rule: Rc<CombinationRule>,
    callback: C,
    /// Registration sequence number, fixes the position among peers
    seq: u64,
}

/// Rules of one event type with their callbacks
///
/// Generic over the callback type so the engine never needs to know how
/// callbacks are invoked.
pub struct RuleRegistry<C> {
    entries: HashMap<RuleKey, Entry<C>>,
    /// Keys in evaluation order, rebuilt on every change
    order: Vec<RuleKey>,
    next_seq: u64,
}

impl<C: Clone> RuleRegistry<C> {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            order: Vec::new(),
            next_seq: 0,
        }
    }

    /// Inserts a rule, replacing any rule with the same identity.
    ///
    /// Returns true when an existing binding was replaced.
    pub fn register(&mut self, rule: CombinationRule, callback: C) -> bool {
        let key = rule.key();
        let rule = Rc::new(rule);

        let replaced = match self.entries.get_mut(&key) {
            Some(entry) => {
                entry.rule = rule;
                entry.callback = callback;
                true
            }
            None => {
                let seq = self.next_seq;
                self.next_seq += 1;
                self.entries.insert(key, Entry { rule, callback, seq });
                false
            }
        };

        self.rebuild_order();
        replaced
    }

    /// Removes the rule with this identity, returning it if present.
    pub fn unregister(&mut self, key: &RuleKey) -> Option<Rc<CombinationRule>> {
        let entry = self.entries.remove(key)?;
        self.rebuild_order();
        Some(entry.rule)
    }

    pub fn get(&self, key: &RuleKey) -> Option<(&Rc<CombinationRule>, &C)> {
        self.entries.get(key).map(|e| (&e.rule, &e.callback))
    }

    pub fn contains(&self, key: &RuleKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Rules with their callbacks, in evaluation order.
    pub fn iter(&self) -> impl Iterator<Item = (&Rc<CombinationRule>, &C)> {
        self.order
            .iter()
            .filter_map(|key| self.entries.get(key))
            .map(|e| (&e.rule, &e.callback))
    }

    /// Rules only, in evaluation order.
    pub fn rules(&self) -> Vec<Rc<CombinationRule>> {
        self.iter().map(|(rule, _)| Rc::clone(rule)).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn rebuild_order(&mut self) {
        let mut keyed: Vec<(bool, u64, RuleKey)> = self
            .entries
            .iter()
            .map(|(key, e)| (!e.rule.is_exclusive(), e.seq, key.clone()))
            .collect();

        // false < true, so exclusive rules sort first
        keyed.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));
        self.order = keyed.into_iter().map(|(_, _, key)| key).collect();
    }
}

impl<C: Clone> Default for RuleRegistry<C> {
    fn default() -> Self {
        Self::new()
    }
}
