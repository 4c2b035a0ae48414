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

//! Registration-time validation
//!
//! Every check in this module runs synchronously when a binding or a
//! manager is created. Nothing here is ever called from the dispatch path:
//! once a rule is registered it is known to be well-formed.

use thiserror::Error;

/// Validation errors
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ValidationError {
    /// Event type outside the supported set (keydown, keyup)
    #[error("Unsupported event type '{0}': expected 'keydown' or 'keyup'")]
    UnsupportedEventType(String),

    /// Inactivity delay must be a positive number of milliseconds
    #[error("Invalid inactivity delay {0}ms: must be greater than 0")]
    InvalidDelay(u64),

    /// Combination is blank or contains only modifier names
    #[error("Empty key combination '{0}': no keys left after normalisation")]
    EmptyCombo(String),
}

/// Validates the inactivity delay of a sequence accumulator
pub fn validate_delay(delay_ms: u64) -> Result<(), ValidationError> {
    if delay_ms == 0 {
        Err(ValidationError::InvalidDelay(delay_ms))
    } else {
        Ok(())
    }
}

/// Rejects blank combination strings before any tokenising happens
pub fn validate_combo(combo: &str) -> Result<(), ValidationError> {
    if combo.trim().is_empty() {
        Err(ValidationError::EmptyCombo(combo.to_string()))
    } else {
        Ok(())
    }
}
