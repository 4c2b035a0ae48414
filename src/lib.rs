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

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

//! Hotkey Combination Matcher
//!
//! An event-driven hotkey engine: it listens to key events from a host
//! event source, accumulates the keys pressed within an inactivity window
//! and fires callbacks when a registered combination is completed.
//!
//! # Features
//!
//! - **Chord Sequences:** Multi-step combinations like `g g` or `a space b`
//! - **Exact Modifiers:** ctrl/alt/shift/meta must match exactly
//! - **Ordered or Unordered:** Keys in written order, or in any order
//! - **Upsert Registration:** Re-registering a combination replaces it
//! - **Exclusive Rules:** A match can stop the rest of the dispatch pass
//! - **Wildcard Steps:** `all` matches any key at its position
//!
//! # Architecture
//!
//! - **`core`:** Matching engine (tokens, rules, accumulator, matcher)
//! - **`config`:** Manager and per-binding options
//! - **`source`:** Event source trait and an in-process event target
//! - **`manager`:** Facade wiring source, engine and callbacks
//! - **`script`:** Scenario scripts replayed on a manual clock (CLI)
//!
//! # Examples
//!
//! ## Binding a chord
//!
//! ```
//! use hotkey_combo::{BindingManager, BindingOptions, EventType, KeyEvent, ManagerConfig};
//! use hotkey_combo::source::LocalSource;
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! let source = Rc::new(LocalSource::new());
//! let manager = BindingManager::new(Rc::clone(&source), ManagerConfig::default())?;
//!
//! let hits = Rc::new(Cell::new(0));
//! let counter = Rc::clone(&hits);
//! manager.down(
//!     "g g",
//!     move |_, _| counter.set(counter.get() + 1),
//!     BindingOptions::new().ordered(true).repeatable(true),
//! )?;
//!
//! source.dispatch(EventType::KeyDown, &KeyEvent::new("g"));
//! source.dispatch(EventType::KeyDown, &KeyEvent::new("g"));
//! assert_eq!(hits.get(), 1);
//! # Ok::<(), hotkey_combo::ValidationError>(())
//! ```
//!
//! ## Inspecting a rule
//!
//! ```
//! use hotkey_combo::core::{CombinationRule, EventType, ModifierOptions, RuleOptions};
//!
//! let rule = CombinationRule::parse(
//!     EventType::KeyDown,
//!     "shift b a",
//!     &ModifierOptions::default(),
//!     RuleOptions::default(),
//! )?;
//! assert_eq!(rule.key().to_string(), "keydown:{a b}:0010");
//! # Ok::<(), hotkey_combo::ValidationError>(())
//! ```

pub mod config;
pub mod core;
pub mod manager;
pub mod script;
pub mod source;

// Re-export commonly used types for convenience
pub use config::{BindingOptions, ManagerConfig};
pub use core::{CombinationRule, EventType, KeyEvent, ModifierSet, RuleKey, Token, ValidationError};
pub use manager::BindingManager;
