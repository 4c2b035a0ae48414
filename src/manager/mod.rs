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

//! Binding manager - routes source events through the matching engine
//!
//! # Responsibilities
//!
//! - Validate and register bindings (synchronously, at the call site)
//! - Subscribe to the event source lazily, once per event type
//! - Feed every event through accumulator, matcher and callbacks
//! - Tear down timers and subscriptions on [`detach`] or drop
//!
//! # Pipeline state
//!
//! Each event type moves `Unsubscribed → Subscribed` on its first
//! registration, and back to `Unsubscribed` when its last binding is
//! unregistered or the manager is detached.
//!
//! # Example
//!
//! ```
//! use hotkey_combo::manager::BindingManager;
//! use hotkey_combo::config::{BindingOptions, ManagerConfig};
//! use hotkey_combo::core::{EventType, KeyEvent};
//! use hotkey_combo::source::LocalSource;
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! let source = Rc::new(LocalSource::new());
//! let manager = BindingManager::new(Rc::clone(&source), ManagerConfig::default())?;
//!
//! let saved = Rc::new(Cell::new(false));
//! let flag = Rc::clone(&saved);
//! manager.down("ctrl s", move |_, _| flag.set(true), BindingOptions::new())?;
//!
//! source.dispatch(EventType::KeyDown, &KeyEvent::new("s").with_ctrl());
//! assert!(saved.get());
//! # Ok::<(), hotkey_combo::core::ValidationError>(())
//! ```
//!
//! [`detach`]: BindingManager::detach

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use crate::config::{BindingOptions, ManagerConfig};
use crate::core::{
    ChordMatcher, Clock, CombinationRule, EventType, KeyEvent, Match, RuleKey, RuleRegistry,
    SequenceAccumulator, SystemClock, Token, ValidationError,
};
use crate::source::{EventSource, KeyHandler, SubscriptionId};

/// Callback invoked with the triggering event and the rule it satisfied
pub type Callback = Rc<dyn Fn(&KeyEvent, &CombinationRule)>;

/// Matching state of one event type
struct Pipeline {
    accumulator: SequenceAccumulator,
    registry: RuleRegistry<Callback>,
    matcher: ChordMatcher,
    subscription: Option<SubscriptionId>,
}

impl Pipeline {
    fn new(delay_ms: u64) -> Result<Self, ValidationError> {
        Ok(Self {
            accumulator: SequenceAccumulator::new(delay_ms)?,
            registry: RuleRegistry::new(),
            matcher: ChordMatcher::new(),
            subscription: None,
        })
    }

    fn reset(&mut self) {
        self.accumulator.clear();
        self.matcher.reset();
    }
}

struct Inner {
    config: ManagerConfig,
    clock: Rc<dyn Clock>,
    pipelines: HashMap<EventType, Pipeline>,
}

impl Inner {
    /// Runs one event through its pipeline, returning the satisfied rules
    fn process(&mut self, event_type: EventType, event: &KeyEvent) -> Vec<Match<Callback>> {
        let now = self.clock.now();
        let Some(pipeline) = self.pipelines.get_mut(&event_type) else {
            tracing::warn!(%event_type, "event for unknown pipeline ignored");
            return Vec::new();
        };

        if pipeline.accumulator.poll(now) {
            pipeline.matcher.reset();
        }

        let Some(token) = pipeline.accumulator.input(&event.key, now) else {
            return Vec::new();
        };

        let matches = pipeline
            .matcher
            .step(&pipeline.registry, &token, event.modifiers());

        if !matches.is_empty() {
            for m in &matches {
                tracing::info!(rule = %m.rule.key(), %event, "binding fired");
            }
            // The buffer restarts; chains of rules that did not fire keep
            // their progress inside the matcher
            pipeline.accumulator.clear();
        }

        matches
    }
}

/// Facade owning one accumulator, registry and matcher per event type
pub struct BindingManager<S: EventSource> {
    source: S,
    inner: Rc<RefCell<Inner>>,
}

impl<S: EventSource> BindingManager<S> {
    /// Creates a manager reading time from the wall clock
    ///
    /// # Errors
    ///
    /// * `ValidationError::InvalidDelay` - `inactivity_delay_ms` is zero
    pub fn new(source: S, config: ManagerConfig) -> Result<Self, ValidationError> {
        Self::with_clock(source, config, Rc::new(SystemClock))
    }

    /// Creates a manager reading time from `clock`
    pub fn with_clock(
        source: S,
        config: ManagerConfig,
        clock: Rc<dyn Clock>,
    ) -> Result<Self, ValidationError> {
        config.validate()?;

        let mut pipelines = HashMap::new();
        for event_type in EventType::ALL {
            pipelines.insert(event_type, Pipeline::new(config.inactivity_delay_ms)?);
        }

        Ok(Self {
            source,
            inner: Rc::new(RefCell::new(Inner {
                config,
                clock,
                pipelines,
            })),
        })
    }

    pub fn config(&self) -> ManagerConfig {
        self.inner.borrow().config
    }

    /// Registers a binding
    ///
    /// Re-registering the same identity (combination, modifiers, ordering
    /// and event type) replaces the earlier callback. The first binding of
    /// an event type subscribes to the source.
    ///
    /// # Errors
    ///
    /// * `ValidationError::EmptyCombo` - nothing but whitespace or modifiers
    pub fn register_binding<F>(
        &self,
        event_type: EventType,
        combo: &str,
        callback: F,
        options: BindingOptions,
    ) -> Result<RuleKey, ValidationError>
    where
        F: Fn(&KeyEvent, &CombinationRule) + 'static,
    {
        let (key, subscribed) = {
            let mut inner = self.inner.borrow_mut();
            let rule_options = options.resolve(&inner.config);
            let rule = CombinationRule::parse(event_type, combo, &options.modifiers, rule_options)?;
            let key = rule.key();

            let Some(pipeline) = inner.pipelines.get_mut(&event_type) else {
                return Err(ValidationError::UnsupportedEventType(event_type.to_string()));
            };

            let replaced = pipeline.registry.register(rule, Rc::new(callback));
            tracing::debug!(rule = %key, replaced, "binding registered");

            (key, pipeline.subscription.is_some())
        };

        if subscribed {
            return Ok(key);
        }

        // Subscribe outside the borrow in case the source delivers eagerly
        let handler = self.handler(event_type);
        let id = self.source.subscribe(event_type, handler, options.use_capture);
        if let Some(pipeline) = self.inner.borrow_mut().pipelines.get_mut(&event_type) {
            pipeline.subscription = Some(id);
        }
        tracing::debug!(%event_type, use_capture = options.use_capture, "subscribed to event source");

        Ok(key)
    }

    /// Registers a binding for an event type given by name
    ///
    /// # Errors
    ///
    /// * `ValidationError::UnsupportedEventType` - not `keydown` or `keyup`
    /// * `ValidationError::EmptyCombo` - nothing but whitespace or modifiers
    pub fn register_named<F>(
        &self,
        event_type: &str,
        combo: &str,
        callback: F,
        options: BindingOptions,
    ) -> Result<RuleKey, ValidationError>
    where
        F: Fn(&KeyEvent, &CombinationRule) + 'static,
    {
        let event_type = event_type.parse::<EventType>()?;
        self.register_binding(event_type, combo, callback, options)
    }

    /// Registers a key-press binding
    pub fn down<F>(&self, combo: &str, callback: F, options: BindingOptions) -> Result<RuleKey, ValidationError>
    where
        F: Fn(&KeyEvent, &CombinationRule) + 'static,
    {
        self.register_binding(EventType::KeyDown, combo, callback, options)
    }

    /// Registers a key-release binding
    pub fn up<F>(&self, combo: &str, callback: F, options: BindingOptions) -> Result<RuleKey, ValidationError>
    where
        F: Fn(&KeyEvent, &CombinationRule) + 'static,
    {
        self.register_binding(EventType::KeyUp, combo, callback, options)
    }

    /// Removes the binding that `combo` and `options` identify
    ///
    /// Returns whether a binding was removed. Removing the last binding of
    /// an event type unsubscribes from the source.
    pub fn unregister(
        &self,
        event_type: EventType,
        combo: &str,
        options: BindingOptions,
    ) -> Result<bool, ValidationError> {
        let (removed, subscription) = {
            let mut inner = self.inner.borrow_mut();
            let rule_options = options.resolve(&inner.config);
            let key = CombinationRule::parse(event_type, combo, &options.modifiers, rule_options)?.key();

            let Some(pipeline) = inner.pipelines.get_mut(&event_type) else {
                return Ok(false);
            };

            let removed = pipeline.registry.unregister(&key).is_some();
            tracing::debug!(rule = %key, removed, "binding unregistered");

            let subscription = if pipeline.registry.is_empty() {
                pipeline.reset();
                pipeline.subscription.take()
            } else {
                None
            };
            (removed, subscription)
        };

        if let Some(id) = subscription {
            self.source.unsubscribe(id);
            tracing::debug!(%event_type, "unsubscribed from event source");
        }

        Ok(removed)
    }

    /// Applies every due inactivity deadline
    ///
    /// Hosts with an event loop call this periodically; expiry is also
    /// applied lazily before each event. Returns the number of pipelines
    /// whose sequence was cleared.
    pub fn tick(&self) -> usize {
        let Ok(mut inner) = self.inner.try_borrow_mut() else {
            return 0;
        };
        let now = inner.clock.now();

        let mut expired = 0;
        for pipeline in inner.pipelines.values_mut() {
            if pipeline.accumulator.poll(now) {
                pipeline.matcher.reset();
                expired += 1;
            }
        }
        expired
    }

    /// Cancels all timers and unsubscribes from the source
    ///
    /// Registered rules are kept; the next registration subscribes again.
    pub fn detach(&self) {
        let subscriptions: Vec<(EventType, SubscriptionId)> = match self.inner.try_borrow_mut() {
            Ok(mut inner) => inner
                .pipelines
                .iter_mut()
                .filter_map(|(event_type, pipeline)| {
                    pipeline.reset();
                    pipeline.subscription.take().map(|id| (*event_type, id))
                })
                .collect(),
            Err(_) => {
                tracing::warn!("detach requested while dispatching, skipped");
                return;
            }
        };

        for (event_type, id) in subscriptions {
            self.source.unsubscribe(id);
            tracing::debug!(%event_type, "unsubscribed from event source");
        }
    }

    /// Registered rules of `event_type` in evaluation order
    pub fn bindings(&self, event_type: EventType) -> Vec<Rc<CombinationRule>> {
        self.inner
            .borrow()
            .pipelines
            .get(&event_type)
            .map(|p| p.registry.rules())
            .unwrap_or_default()
    }

    /// Tokens accumulated for `event_type` since the last reset
    pub fn current_sequence(&self, event_type: EventType) -> Vec<Token> {
        self.inner
            .borrow()
            .pipelines
            .get(&event_type)
            .map(|p| p.accumulator.current_sequence().to_vec())
            .unwrap_or_default()
    }

    /// Number of chords partially typed for `event_type`
    pub fn in_progress(&self, event_type: EventType) -> usize {
        self.inner
            .borrow()
            .pipelines
            .get(&event_type)
            .map(|p| p.matcher.in_progress())
            .unwrap_or(0)
    }

    pub fn is_subscribed(&self, event_type: EventType) -> bool {
        self.inner
            .borrow()
            .pipelines
            .get(&event_type)
            .is_some_and(|p| p.subscription.is_some())
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    fn handler(&self, event_type: EventType) -> KeyHandler {
        let inner: Weak<RefCell<Inner>> = Rc::downgrade(&self.inner);

        Rc::new(move |event: &KeyEvent| {
            let Some(inner) = inner.upgrade() else {
                return;
            };

            // Release the borrow before any callback runs so callbacks
            // may register or unregister bindings
            let matches = match inner.try_borrow_mut() {
                Ok(mut inner) => inner.process(event_type, event),
                Err(_) => {
                    tracing::warn!(%event_type, %event, "re-entrant dispatch ignored");
                    return;
                }
            };

            for m in matches {
                (m.callback)(event, &m.rule);
            }
        })
    }
}

impl<S: EventSource> Drop for BindingManager<S> {
    fn drop(&mut self) {
        self.detach();
    }
}

#[cfg(test)]
mod tests;
