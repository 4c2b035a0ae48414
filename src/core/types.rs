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

//! src/core/types.rs
//!
//! Core type definitions for combination matching
//!
//! This module defines the fundamental types used throughout the engine:
//! - `Token`: Normalised identity of one physical key
//! - `ModifierSet`: Exact ctrl/alt/shift/meta requirement of a rule
//! - `ModifierOptions`: Partially specified modifier flags supplied by callers
//! - `EventType`: The two key event types a rule can be bound to
//! - `KeyEvent`: A raw key event as delivered by an event source

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::core::validator::ValidationError;

/// Token text that matches any key at its position
pub const WILDCARD: &str = "all";

/// Normalised key identity
///
/// Always lowercase. The space key is spelled `"space"`.
/// Built by [`crate::core::normalize::normalize`], never from raw input directly.
#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct Token(String);

impl Token {
    pub(crate) fn new(name: String) -> Self {
        Self(name)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True for the `"all"` token
    pub fn is_wildcard(&self) -> bool {
        self.0 == WILDCARD
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Exact modifier requirement
///
/// Four independent flags, all `false` by default. A rule's set must equal
/// the event's flags exactly: holding an extra modifier is a mismatch.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct ModifierSet {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub meta: bool,
}

impl ModifierSet {
    /// Empty set (no modifier held)
    pub const NONE: ModifierSet = ModifierSet {
        ctrl: false,
        alt: false,
        shift: false,
        meta: false,
    };

    /// Fills every flag the caller left unspecified with `false`
    pub fn from_options(options: &ModifierOptions) -> Self {
        Self {
            ctrl: options.ctrl.unwrap_or(false),
            alt: options.alt.unwrap_or(false),
            shift: options.shift.unwrap_or(false),
            meta: options.meta.unwrap_or(false),
        }
    }

    /// Union of both sets
    pub fn merge(self, other: ModifierSet) -> Self {
        Self {
            ctrl: self.ctrl || other.ctrl,
            alt: self.alt || other.alt,
            shift: self.shift || other.shift,
            meta: self.meta || other.meta,
        }
    }

    /// Exact comparison against the flags carried by an event
    pub fn matches_event(&self, event: &KeyEvent) -> bool {
        *self == event.modifiers()
    }

    /// Deterministic four-character form in ctrl, alt, shift, meta order
    ///
    /// Used inside rule identity keys, e.g. `"1010"` for ctrl+shift.
    pub fn bits(&self) -> String {
        [self.ctrl, self.alt, self.shift, self.meta]
            .iter()
            .map(|&on| if on { '1' } else { '0' })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::NONE
    }
}

impl fmt::Display for ModifierSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = [
            (self.ctrl, "ctrl"),
            (self.alt, "alt"),
            (self.shift, "shift"),
            (self.meta, "meta"),
        ]
        .iter()
        .filter(|(on, _)| *on)
        .map(|(_, name)| *name)
        .collect();

        if names.is_empty() {
            write!(f, "none")
        } else {
            write!(f, "{}", names.join("+"))
        }
    }
}

/// Caller-supplied modifier flags
///
/// `None` means "not specified" and becomes `false` once turned into a
/// [`ModifierSet`].
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct ModifierOptions {
    pub ctrl: Option<bool>,
    pub alt: Option<bool>,
    pub shift: Option<bool>,
    pub meta: Option<bool>,
}

impl ModifierOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ctrl(mut self, on: bool) -> Self {
        self.ctrl = Some(on);
        self
    }

    pub fn alt(mut self, on: bool) -> Self {
        self.alt = Some(on);
        self
    }

    pub fn shift(mut self, on: bool) -> Self {
        self.shift = Some(on);
        self
    }

    pub fn meta(mut self, on: bool) -> Self {
        self.meta = Some(on);
        self
    }
}

/// Key event types a rule can be bound to
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum EventType {
    #[serde(rename = "keydown")]
    KeyDown,
    #[serde(rename = "keyup")]
    KeyUp,
}

impl EventType {
    pub const ALL: [EventType; 2] = [EventType::KeyDown, EventType::KeyUp];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::KeyDown => "keydown",
            EventType::KeyUp => "keyup",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "keydown" => Ok(EventType::KeyDown),
            "keyup" => Ok(EventType::KeyUp),
            other => Err(ValidationError::UnsupportedEventType(other.to_string())),
        }
    }
}

/// Raw key event as delivered by an event source
///
/// `key` is the unnormalised key name ("K", " ", "Control", ...).
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct KeyEvent {
    pub key: String,
    pub ctrl_key: bool,
    pub alt_key: bool,
    pub shift_key: bool,
    pub meta_key: bool,
}

impl KeyEvent {
    /// Event for `key` with no modifier held
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Self::default()
        }
    }

    pub fn with_ctrl(mut self) -> Self {
        self.ctrl_key = true;
        self
    }

    pub fn with_alt(mut self) -> Self {
        self.alt_key = true;
        self
    }

    pub fn with_shift(mut self) -> Self {
        self.shift_key = true;
        self
    }

    pub fn with_meta(mut self) -> Self {
        self.meta_key = true;
        self
    }

    /// Held modifiers as a set
    pub fn modifiers(&self) -> ModifierSet {
        ModifierSet {
            ctrl: self.ctrl_key,
            alt: self.alt_key,
            shift: self.shift_key,
            meta: self.meta_key,
        }
    }
}

impl fmt::Display for KeyEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mods = self.modifiers();
        if mods.is_empty() {
            write!(f, "{:?}", self.key)
        } else {
            write!(f, "{}+{:?}", mods, self.key)
        }
    }
}
