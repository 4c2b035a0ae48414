// Copyright 2025 bakri (tidynest@proton.me)
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

//! src/core/mod.rs
//!
//! Core matching engine
//!
//! This module contains the data structures and algorithms for
//! combination matching, including:
//! - Key name normalisation into tokens
//! - Modifier sets with exact-match semantics
//! - Combination rule parsing and identity keys
//! - The rolling key sequence with its inactivity deadline
//! - Rule storage with upsert semantics
//! - Stepwise chord matching
//!
//! Nothing here performs I/O or subscribes to anything, so the whole
//! engine is unit-testable without an event source.

pub mod accumulator;
pub mod matcher;
pub mod normalize;
pub mod registry;
pub mod rule;
pub mod types;
pub mod validator;

pub use accumulator::{Clock, ManualClock, SequenceAccumulator, SystemClock, DEFAULT_DELAY_MS};
pub use matcher::{ChordMatcher, Match};
pub use normalize::normalize;
pub use registry::RuleRegistry;
pub use rule::{CombinationRule, RuleKey, RuleOptions};
pub use types::*;
pub use validator::ValidationError;

#[cfg(test)]
mod tests;
