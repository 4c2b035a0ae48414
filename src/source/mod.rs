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

//! Event source integration
//!
//! The matching engine never captures input itself. It subscribes to an
//! [`EventSource`] supplied by the host (a window, a terminal, a test) and
//! receives one [`KeyEvent`] per key press or release.
//!
//! [`LocalSource`] is an in-process event target: the host calls
//! [`LocalSource::dispatch`] and every matching subscription runs
//! synchronously, capture-phase handlers first.
//!
//! # Example
//! ```
//! use hotkey_combo::source::{EventSource, LocalSource};
//! use hotkey_combo::core::{EventType, KeyEvent};
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! let source = LocalSource::new();
//! let seen = Rc::new(Cell::new(0));
//! let counter = Rc::clone(&seen);
//!
//! source.subscribe(
//!     EventType::KeyDown,
//!     Rc::new(move |_event: &KeyEvent| counter.set(counter.get() + 1)),
//!     false,
//! );
//! source.dispatch(EventType::KeyDown, &KeyEvent::new("a"));
//! source.dispatch(EventType::KeyUp, &KeyEvent::new("a"));
//! assert_eq!(seen.get(), 1);
//! ```

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::core::types::{EventType, KeyEvent};

/// Handler invoked for every delivered event
pub type KeyHandler = Rc<dyn Fn(&KeyEvent)>;

/// Opaque handle of one subscription
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct SubscriptionId(u64);

/// Anything that can deliver key events
///
/// Methods take `&self`: sources are shared between the host that feeds
/// them and the binding manager that listens on them.
pub trait EventSource {
    /// Registers `handler` for one event type
    fn subscribe(&self, event_type: EventType, handler: KeyHandler, use_capture: bool) -> SubscriptionId;

    /// Removes a subscription. Unknown ids are ignored.
    fn unsubscribe(&self, id: SubscriptionId);
}

impl<S: EventSource + ?Sized> EventSource for Rc<S> {
    fn subscribe(&self, event_type: EventType, handler: KeyHandler, use_capture: bool) -> SubscriptionId {
        (**self).subscribe(event_type, handler, use_capture)
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        (**self).unsubscribe(id)
    }
}

struct Subscription {
    id: SubscriptionId,
    event_type: EventType,
    handler: KeyHandler,
    use_capture: bool,
}

/// In-process event target
#[derive(Default)]
pub struct LocalSource {
    subscriptions: RefCell<Vec<Subscription>>,
    next_id: Cell<u64>,
}

impl LocalSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delivers `event` to every subscription of `event_type`
    ///
    /// Handlers are collected before any of them runs, so a handler may
    /// subscribe or unsubscribe without affecting the current delivery.
    /// Returns the number of handlers invoked.
    pub fn dispatch(&self, event_type: EventType, event: &KeyEvent) -> usize {
        let mut targets: Vec<(bool, KeyHandler)> = self
            .subscriptions
            .borrow()
            .iter()
            .filter(|s| s.event_type == event_type)
            .map(|s| (s.use_capture, Rc::clone(&s.handler)))
            .collect();

        // Capture-phase listeners run first, stable within each phase
        targets.sort_by_key(|(capture, _)| !*capture);

        for (_, handler) in &targets {
            handler(event);
        }
        targets.len()
    }

    /// Number of live subscriptions for `event_type`
    pub fn subscriber_count(&self, event_type: EventType) -> usize {
        self.subscriptions
            .borrow()
            .iter()
            .filter(|s| s.event_type == event_type)
            .count()
    }
}

impl EventSource for LocalSource {
    fn subscribe(&self, event_type: EventType, handler: KeyHandler, use_capture: bool) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.get());
        self.next_id.set(id.0 + 1);

        self.subscriptions.borrow_mut().push(Subscription {
            id,
            event_type,
            handler,
            use_capture,
        });
        id
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.subscriptions.borrow_mut().retain(|s| s.id != id);
    }
}
