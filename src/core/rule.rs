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

//! src/core/rule.rs
//!
//! Combination rule parsing
//!
//! Turns a user-supplied combination string such as `"ctrl shift k"` or
//! `"g g"` into a [`CombinationRule`]: a canonical token sequence plus an
//! exact [`ModifierSet`], bound to one [`EventType`].
//!
//! # Canonical form
//! 1. Split on whitespace
//! 2. Modifier names switch on their flag and are dropped
//! 3. Remaining names are normalised into tokens
//! 4. Unless `repeatable`, duplicates are removed (first occurrence wins)
//! 5. Unless `ordered`, tokens are sorted lexicographically
//!
//! Two rules with the same [`RuleKey`] are the same binding.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::normalize::{modifier_flag, normalize};
use crate::core::types::{EventType, ModifierOptions, ModifierSet, Token};
use crate::core::validator::{validate_combo, ValidationError};

/// Flags that shape how a combination string is interpreted
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct RuleOptions {
    /// Keys must be pressed in the written order
    pub ordered: bool,
    /// Keep repeated keys ("g g") instead of collapsing them
    pub repeatable: bool,
    /// A completed match stops the rest of the dispatch pass
    pub exclusive: bool,
    /// Treat the `"all"` token as a wildcard
    pub wildcard: bool,
}

impl Default for RuleOptions {
    fn default() -> Self {
        Self {
            ordered: false,
            repeatable: false,
            exclusive: true,
            wildcard: true,
        }
    }
}

/// Identity of a rule
///
/// Hash/Eq over event type, canonical token string, ordering mode and
/// modifier set. Displayed as `keydown:a b:0000`, with unordered token
/// sets wrapped in braces (`keydown:{a b}:1000`).
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct RuleKey {
    pub event_type: EventType,
    pub combo: String,
    pub ordered: bool,
    pub modifiers: ModifierSet,
}

impl fmt::Display for RuleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ordered {
            write!(f, "{}:{}:{}", self.event_type, self.combo, self.modifiers.bits())
        } else {
            write!(f, "{}:{{{}}}:{}", self.event_type, self.combo, self.modifiers.bits())
        }
    }
}

/// A parsed, immutable combination rule
///
/// # Example
/// ```
/// use hotkey_combo::core::{CombinationRule, EventType, ModifierOptions, RuleOptions};
///
/// let rule = CombinationRule::parse(
///     EventType::KeyDown,
///     "ctrl shift K",
///     &ModifierOptions::default(),
///     RuleOptions::default(),
/// )?;
/// assert_eq!(rule.canonical(), "k");
/// assert!(rule.modifiers().ctrl && rule.modifiers().shift);
/// # Ok::<(), hotkey_combo::core::ValidationError>(())
/// ```
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct CombinationRule {
    event_type: EventType,
    source: String,
    tokens: Vec<Token>,
    modifiers: ModifierSet,
    options: RuleOptions,
}

impl CombinationRule {
    /// Parses a combination string into a rule
    ///
    /// Modifier names inside `combo` are merged into the flags given by
    /// `modifiers`. Fails with [`ValidationError::EmptyCombo`] when nothing
    /// but whitespace or modifier names remains.
    pub fn parse(
        event_type: EventType,
        combo: &str,
        modifiers: &ModifierOptions,
        options: RuleOptions,
    ) -> Result<Self, ValidationError> {
        validate_combo(combo)?;

        let mut flags = ModifierSet::from_options(modifiers);
        let mut tokens: Vec<Token> = Vec::new();

        for part in combo.split_whitespace() {
            if let Some(flag) = modifier_flag(part) {
                flags = flags.merge(flag);
                continue;
            }

            let Some(token) = normalize(part) else {
                continue;
            };

            if !options.repeatable && tokens.contains(&token) {
                continue;
            }
            tokens.push(token);
        }

        if tokens.is_empty() {
            return Err(ValidationError::EmptyCombo(combo.to_string()));
        }

        if !options.ordered {
            tokens.sort();
        }

        Ok(Self {
            event_type,
            source: combo.to_string(),
            tokens,
            modifiers: flags,
            options,
        })
    }

    pub fn event_type(&self) -> EventType {
        self.event_type
    }

    /// Combination string exactly as registered
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Canonical token sequence, never empty
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn modifiers(&self) -> ModifierSet {
        self.modifiers
    }

    pub fn options(&self) -> RuleOptions {
        self.options
    }

    pub fn is_ordered(&self) -> bool {
        self.options.ordered
    }

    pub fn is_exclusive(&self) -> bool {
        self.options.exclusive
    }

    /// Canonical tokens joined by single spaces
    pub fn canonical(&self) -> String {
        self.tokens
            .iter()
            .map(Token::as_str)
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn key(&self) -> RuleKey {
        RuleKey {
            event_type: self.event_type,
            combo: self.canonical(),
            ordered: self.options.ordered,
            modifiers: self.modifiers,
        }
    }

    /// Whether `observed` satisfies the step expecting `expected`
    pub fn step_accepts(&self, expected: &Token, observed: &Token) -> bool {
        (self.options.wildcard && expected.is_wildcard()) || expected == observed
    }
}

impl fmt::Display for CombinationRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.modifiers.is_empty() {
            write!(f, "{} [{}]", self.canonical(), self.event_type)
        } else {
            write!(f, "{} + {} [{}]", self.modifiers, self.canonical(), self.event_type)
        }
    }
}
