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

//! src/core/normalize.rs
//!
//! Key name normalisation
//!
//! Raw key names arrive in whatever casing the event source uses
//! ("K", "Enter", " ", "Control"). Matching works on lowercase tokens,
//! and modifier keys never become tokens: they only contribute to the
//! modifier flags of an event or a rule.

use crate::core::types::{ModifierSet, Token};

/// Maps a raw modifier key name to the single flag it represents
///
/// Recognises `control`/`ctrl`, `alt`, `shift` and `meta` in any casing.
/// Returns `None` for every other name.
pub fn modifier_flag(raw: &str) -> Option<ModifierSet> {
    let mut set = ModifierSet::NONE;
    match raw.to_lowercase().as_str() {
        "control" | "ctrl" => set.ctrl = true,
        "alt" => set.alt = true,
        "shift" => set.shift = true,
        "meta" => set.meta = true,
        _ => return None,
    }
    Some(set)
}

/// Normalises a raw key name into a token
///
/// - Empty input yields `None`
/// - Names are lowercased
/// - `" "` becomes `"space"`
/// - Modifier key names yield `None`
///
/// Total function: never fails, never panics.
pub fn normalize(raw: &str) -> Option<Token> {
    if raw.is_empty() {
        return None;
    }

    let key = raw.to_lowercase();
    if key == " " {
        return Some(Token::new("space".to_string()));
    }

    if modifier_flag(&key).is_some() {
        return None;
    }

    Some(Token::new(key))
}
