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

//! Binding manager configuration
//!
//! Two layers of settings:
//! - [`ManagerConfig`]: fixed at construction, shared by every binding
//! - [`BindingOptions`]: per registration, falling back to the manager's
//!   defaults for anything left unset
//!
//! Both derive serde so hosts can load them from their own settings files.

use serde::{Deserialize, Serialize};

use crate::core::accumulator::DEFAULT_DELAY_MS;
use crate::core::rule::RuleOptions;
use crate::core::types::ModifierOptions;
use crate::core::validator::{validate_delay, ValidationError};

/// Construction-time configuration
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct ManagerConfig {
    /// Inactivity delay after which a partial sequence is dropped
    pub inactivity_delay_ms: u64,
    /// Default for [`BindingOptions::ordered`]
    pub ordered: bool,
    /// Default for [`BindingOptions::repeatable`]
    pub repeatable: bool,
    /// Default for [`BindingOptions::exclusive`]
    pub exclusive: bool,
    /// Whether `"all"` acts as a wildcard token
    pub wildcard: bool,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            inactivity_delay_ms: DEFAULT_DELAY_MS,
            ordered: false,
            repeatable: false,
            exclusive: true,
            wildcard: true,
        }
    }
}

impl ManagerConfig {
    /// Checks the configuration before any accumulator is built
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_delay(self.inactivity_delay_ms)
    }

    pub fn with_delay_ms(mut self, delay_ms: u64) -> Self {
        self.inactivity_delay_ms = delay_ms;
        self
    }

    pub fn with_ordered(mut self, ordered: bool) -> Self {
        self.ordered = ordered;
        self
    }

    pub fn with_repeatable(mut self, repeatable: bool) -> Self {
        self.repeatable = repeatable;
        self
    }

    pub fn with_wildcard(mut self, wildcard: bool) -> Self {
        self.wildcard = wildcard;
        self
    }
}

/// Options of a single registration
///
/// `None` fields inherit the manager's [`ManagerConfig`].
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct BindingOptions {
    pub modifiers: ModifierOptions,
    pub ordered: Option<bool>,
    pub repeatable: Option<bool>,
    pub exclusive: Option<bool>,
    /// Forwarded to the event source when this registration subscribes
    pub use_capture: bool,
}

impl BindingOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ctrl(mut self) -> Self {
        self.modifiers = self.modifiers.ctrl(true);
        self
    }

    pub fn alt(mut self) -> Self {
        self.modifiers = self.modifiers.alt(true);
        self
    }

    pub fn shift(mut self) -> Self {
        self.modifiers = self.modifiers.shift(true);
        self
    }

    pub fn meta(mut self) -> Self {
        self.modifiers = self.modifiers.meta(true);
        self
    }

    pub fn modifiers(mut self, modifiers: ModifierOptions) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn ordered(mut self, ordered: bool) -> Self {
        self.ordered = Some(ordered);
        self
    }

    pub fn repeatable(mut self, repeatable: bool) -> Self {
        self.repeatable = Some(repeatable);
        self
    }

    pub fn exclusive(mut self, exclusive: bool) -> Self {
        self.exclusive = Some(exclusive);
        self
    }

    pub fn use_capture(mut self, use_capture: bool) -> Self {
        self.use_capture = use_capture;
        self
    }

    /// Resolves unset fields against the manager defaults
    pub fn resolve(&self, config: &ManagerConfig) -> RuleOptions {
        RuleOptions {
            ordered: self.ordered.unwrap_or(config.ordered),
            repeatable: self.repeatable.unwrap_or(config.repeatable),
            exclusive: self.exclusive.unwrap_or(config.exclusive),
            wildcard: config.wildcard,
        }
    }
}
