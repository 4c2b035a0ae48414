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

//! Scenario replay
//!
//! Runs a parsed scenario through a real [`BindingManager`] attached to a
//! [`LocalSource`], with time driven by a [`ManualClock`]. Used by the
//! `simulate` CLI command to check what a set of bindings does with a
//! given key timeline, without any keyboard attached.

pub mod parser;

use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::path::Path;
use std::rc::Rc;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use crate::config::ManagerConfig;
use crate::core::{CombinationRule, KeyEvent, ManualClock, ValidationError};
use crate::manager::BindingManager;
use crate::source::LocalSource;

pub use parser::{parse_script, Line, Statement};

/// Errors raised while loading or running a scenario
#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("Parse error on line {line}: {message}")]
    InvalidSyntax { line: usize, message: String },

    #[error("Unknown flag '{flag}' on line {line}")]
    UnknownFlag { line: usize, flag: String },

    #[error("Event at {at_ms}ms on line {line} is earlier than the previous one at {previous_ms}ms")]
    OutOfOrder {
        line: usize,
        at_ms: u64,
        previous_ms: u64,
    },

    #[error("Binding name '{name}' on line {line} is already used")]
    DuplicateName { line: usize, name: String },

    #[error("Invalid binding on line {line}: {source}")]
    Invalid {
        line: usize,
        #[source]
        source: ValidationError,
    },

    #[error("Invalid configuration: {0}")]
    Config(#[from] ValidationError),

    #[error("IO error reading scenario: {0}")]
    Io(#[from] std::io::Error),
}

/// One callback invocation observed during a replay
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Firing {
    /// Name given in the `bind` statement
    pub name: String,
    /// Scenario time of the triggering event
    pub at_ms: u64,
    /// Raw key of the triggering event
    pub key: String,
    /// Identity key of the satisfied rule
    pub rule: String,
}

/// Outcome of a replay
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Report {
    pub firings: Vec<Firing>,
    /// Key events dispatched
    pub events: usize,
    /// Sequences dropped by the inactivity timeout
    pub expired: usize,
}

/// Reads and parses a scenario file
pub fn load_script(path: &Path) -> Result<Vec<Line>, ScriptError> {
    let content = std::fs::read_to_string(path)?;
    parse_script(&content)
}

/// Replays `lines` against a fresh binding manager
///
/// # Errors
///
/// * `ScriptError::Config` - `config` is invalid
/// * `ScriptError::Invalid` - a `bind` statement fails validation
/// * `ScriptError::DuplicateName` - two `bind` statements share a name
pub fn run_script(lines: &[Line], config: ManagerConfig) -> Result<Report, ScriptError> {
    let source = Rc::new(LocalSource::new());
    let clock = ManualClock::new();
    let manager = BindingManager::with_clock(Rc::clone(&source), config, Rc::new(clock.clone()))?;

    let firings: Rc<RefCell<Vec<Firing>>> = Rc::new(RefCell::new(Vec::new()));
    let now_ms = Rc::new(Cell::new(0u64));
    let mut names: HashSet<String> = HashSet::new();
    let mut report = Report::default();

    for line in lines {
        match &line.statement {
            Statement::Bind {
                name,
                event_type,
                combo,
                options,
            } => {
                if !names.insert(name.clone()) {
                    return Err(ScriptError::DuplicateName {
                        line: line.number,
                        name: name.clone(),
                    });
                }

                let sink = Rc::clone(&firings);
                let now = Rc::clone(&now_ms);
                let name = name.clone();
                let callback = move |event: &KeyEvent, rule: &CombinationRule| {
                    sink.borrow_mut().push(Firing {
                        name: name.clone(),
                        at_ms: now.get(),
                        key: event.key.clone(),
                        rule: rule.key().to_string(),
                    });
                };

                manager
                    .register_binding(*event_type, combo, callback, *options)
                    .map_err(|source| ScriptError::Invalid {
                        line: line.number,
                        source,
                    })?;
            }
            Statement::Press {
                at_ms,
                event_type,
                event,
            } => {
                clock.set_elapsed(Duration::from_millis(*at_ms));
                now_ms.set(*at_ms);
                report.expired += manager.tick();

                source.dispatch(*event_type, event);
                report.events += 1;
            }
            Statement::Tick { at_ms } => {
                clock.set_elapsed(Duration::from_millis(*at_ms));
                now_ms.set(*at_ms);
                report.expired += manager.tick();
            }
        }
    }

    report.firings = firings.borrow().clone();
    Ok(report)
}

#[cfg(test)]
mod tests;
