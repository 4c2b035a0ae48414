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

//! Rolling key sequence with an inactivity timeout
//!
//! Each event type owns one [`SequenceAccumulator`]. Every accepted token
//! is appended and (re)arms a single inactivity deadline; once the deadline
//! passes, the buffer is cleared.
//!
//! # Timer model
//! The deadline is a one-shot scheduled task owned by the accumulator.
//! Arming it again replaces the pending one, so at most one is outstanding.
//! It never fires on its own thread: expiry is applied by [`poll`] on the
//! same timeline as input, which keeps the engine single-threaded and
//! lock-free. Time is read through an injected [`Clock`].
//!
//! [`poll`]: SequenceAccumulator::poll

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use crate::core::normalize::normalize;
use crate::core::types::Token;
use crate::core::validator::{validate_delay, ValidationError};

/// Default inactivity delay between two keys of one combination
pub const DEFAULT_DELAY_MS: u64 = 500;

/// Source of the current time
pub trait Clock {
    fn now(&self) -> Instant;
}

/// Wall clock
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Manually advanced clock
///
/// Clones share the same time, so a test (or the script runner) can keep
/// one handle and hand another to the engine.
#[derive(Clone, Debug)]
pub struct ManualClock {
    origin: Instant,
    offset: Rc<Cell<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset: Rc::new(Cell::new(Duration::ZERO)),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.offset.set(self.offset.get() + by);
    }

    /// Moves the clock to `at` past its origin. Never moves backwards.
    pub fn set_elapsed(&self, at: Duration) {
        if at > self.offset.get() {
            self.offset.set(at);
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.offset.get()
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + self.offset.get()
    }
}

/// Token buffer bounded by an inactivity deadline
#[derive(Debug)]
pub struct SequenceAccumulator {
    buffer: Vec<Token>,
    delay: Duration,
    deadline: Option<Instant>,
}

impl SequenceAccumulator {
    /// Creates an accumulator, rejecting a zero delay
    pub fn new(delay_ms: u64) -> Result<Self, ValidationError> {
        validate_delay(delay_ms)?;

        Ok(Self {
            buffer: Vec::new(),
            delay: Duration::from_millis(delay_ms),
            deadline: None,
        })
    }

    /// Feeds one raw key name
    ///
    /// Returns the normalised token, or `None` if the key was filtered.
    /// A pending deadline that is already due is applied first, so a key
    /// arriving after the timeout starts a fresh sequence.
    pub fn input(&mut self, raw_key: &str, now: Instant) -> Option<Token> {
        self.poll(now);

        let token = normalize(raw_key)?;
        self.buffer.push(token.clone());
        self.deadline = Some(now + self.delay);

        tracing::trace!(token = %token, len = self.buffer.len(), "token accumulated");
        Some(token)
    }

    /// Applies the deadline if it is due
    ///
    /// Returns true when the buffer was cleared by expiry.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                tracing::debug!(dropped = self.buffer.len(), "inactivity timeout, sequence cleared");
                self.buffer.clear();
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    /// Empties the buffer and cancels the pending deadline. Idempotent.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.deadline = None;
    }

    /// Cancels the pending deadline, keeping the buffer
    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn current_sequence(&self) -> &[Token] {
        &self.buffer
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}
