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

//! src/core/matcher.rs
//!
//! Stepwise chord matching
//!
//! Every rule is walked one token at a time. The matcher keeps an active
//! set of in-progress chains, separate from the registry's root rules:
//!
//! 1. Each active chain tries to advance with the incoming token; a chain
//!    that cannot advance (foreign key, modifier mismatch) keeps its place.
//! 2. Every root rule is also tried from its first step, so a chord can
//!    start on any key.
//! 3. A chain that consumes its last step completes its rule, and every
//!    chain of that rule goes back to the root.
//!
//! Ordered rules advance position by position. Unordered rules may consume
//! any position not yet consumed, preferring an exact token over the
//! wildcard. Every step requires the event's modifiers to equal the rule's
//! modifier set exactly.
//!
//! Only the inactivity timeout ([`ChordMatcher::reset`]) clears the whole
//! active set. The first completing exclusive rule is the only one reported
//! for that pass; rules after it are not evaluated and keep their chains.

use std::rc::Rc;

use crate::core::registry::RuleRegistry;
use crate::core::rule::{CombinationRule, RuleKey};
use crate::core::types::{ModifierSet, Token};

/// Partial progress through one rule
#[derive(Clone, Debug, Eq, PartialEq)]
struct Chain {
    key: RuleKey,
    /// One flag per rule token, true once that step has been consumed
    consumed: Vec<bool>,
}

impl Chain {
    fn start(rule: &CombinationRule) -> Self {
        Self {
            key: rule.key(),
            consumed: vec![false; rule.tokens().len()],
        }
    }

    /// Returns the chain advanced by `token`, or `None` if no step accepts it
    fn advance(&self, rule: &CombinationRule, token: &Token) -> Option<Chain> {
        let tokens = rule.tokens();

        let position = if rule.is_ordered() {
            let next = self.consumed.iter().position(|done| !done)?;
            rule.step_accepts(&tokens[next], token).then_some(next)
        } else {
            let open: Vec<usize> = (0..tokens.len()).filter(|&i| !self.consumed[i]).collect();
            open.iter()
                .copied()
                .find(|&i| &tokens[i] == token)
                .or_else(|| {
                    open.iter()
                        .copied()
                        .find(|&i| rule.step_accepts(&tokens[i], token))
                })
        }?;

        let mut next = self.clone();
        next.consumed[position] = true;
        Some(next)
    }

    fn is_complete(&self) -> bool {
        self.consumed.iter().all(|done| *done)
    }

    fn steps_done(&self) -> usize {
        self.consumed.iter().filter(|done| **done).count()
    }
}

/// A satisfied rule with its callback
#[derive(Clone)]
pub struct Match<C> {
    pub rule: Rc<CombinationRule>,
    pub callback: C,
}

/// In-progress chord state of one event type
#[derive(Debug, Default)]
pub struct ChordMatcher {
    active: Vec<Chain>,
}

impl ChordMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one token with the modifiers held when it arrived
    ///
    /// Returns the rules completed by this token, in evaluation order.
    /// A completed rule restarts from its first step; other rules keep
    /// their progress.
    pub fn step<C: Clone>(
        &mut self,
        registry: &RuleRegistry<C>,
        token: &Token,
        modifiers: ModifierSet,
    ) -> Vec<Match<C>> {
        let mut next_active: Vec<Chain> = Vec::new();
        let mut matches: Vec<Match<C>> = Vec::new();
        let mut stopped = false;

        for (rule, callback) in registry.iter() {
            let key = rule.key();
            let current = self.active.iter().filter(|chain| chain.key == key);

            if stopped || rule.modifiers() != modifiers {
                next_active.extend(current.cloned());
                continue;
            }

            let root = Chain::start(rule);
            let mut chains: Vec<Chain> = Vec::new();
            let mut completed = false;

            for chain in current.chain(std::iter::once(&root)) {
                let next = match chain.advance(rule, token) {
                    Some(advanced) if advanced.is_complete() => {
                        completed = true;
                        continue;
                    }
                    Some(advanced) => {
                        tracing::trace!(rule = %key, step = advanced.steps_done(), "chord advanced");
                        advanced
                    }
                    // Stalled chains wait for their key or the timeout
                    None if chain.steps_done() > 0 => chain.clone(),
                    None => continue,
                };
                if !chains.contains(&next) {
                    chains.push(next);
                }
            }

            if completed {
                matches.push(Match {
                    rule: Rc::clone(rule),
                    callback: callback.clone(),
                });
                stopped = rule.is_exclusive();
            } else {
                next_active.extend(chains);
            }
        }

        self.active = next_active;
        matches
    }

    /// Drops every in-progress chain
    pub fn reset(&mut self) {
        self.active.clear();
    }

    /// Number of chains currently in progress
    pub fn in_progress(&self) -> usize {
        self.active.len()
    }
}
