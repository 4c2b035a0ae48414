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

//! Binding manager tests
//!
//! End-to-end: a LocalSource as event target, a ManualClock for timing,
//! callbacks recording into a shared log.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use crate::config::{BindingOptions, ManagerConfig};
use crate::core::{CombinationRule, EventType, KeyEvent, ManualClock, ModifierOptions, ValidationError};
use crate::manager::BindingManager;
use crate::source::LocalSource;

type Log = Rc<RefCell<Vec<String>>>;

struct Harness {
    source: Rc<LocalSource>,
    clock: ManualClock,
    manager: BindingManager<Rc<LocalSource>>,
    log: Log,
}

impl Harness {
    fn new(config: ManagerConfig) -> Self {
        let source = Rc::new(LocalSource::new());
        let clock = ManualClock::new();
        let manager =
            BindingManager::with_clock(Rc::clone(&source), config, Rc::new(clock.clone())).unwrap();

        Self {
            source,
            clock,
            manager,
            log: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// Callback that appends `name` to the log
    fn record(&self, name: &str) -> impl Fn(&KeyEvent, &CombinationRule) + 'static {
        let log = Rc::clone(&self.log);
        let name = name.to_string();
        move |_: &KeyEvent, _: &CombinationRule| log.borrow_mut().push(name.clone())
    }

    fn down(&self, event: KeyEvent) {
        self.source.dispatch(EventType::KeyDown, &event);
    }

    fn type_keys(&self, keys: &[&str], gap_ms: u64) {
        for key in keys {
            self.down(KeyEvent::new(*key));
            self.clock.advance(Duration::from_millis(gap_ms));
        }
    }

    fn fired(&self) -> Vec<String> {
        self.log.borrow().clone()
    }
}

#[test]
fn test_zero_delay_rejected_at_construction() {
    let source = Rc::new(LocalSource::new());
    let result = BindingManager::new(source, ManagerConfig::default().with_delay_ms(0));
    assert!(matches!(result, Err(ValidationError::InvalidDelay(0))));
}

#[test]
fn test_subscribes_lazily_once_per_event_type() {
    let h = Harness::new(ManagerConfig::default());
    assert!(!h.manager.is_subscribed(EventType::KeyDown));
    assert_eq!(h.source.subscriber_count(EventType::KeyDown), 0);

    h.manager.down("a", h.record("a"), BindingOptions::new()).unwrap();
    h.manager.down("b", h.record("b"), BindingOptions::new()).unwrap();

    assert!(h.manager.is_subscribed(EventType::KeyDown));
    assert!(!h.manager.is_subscribed(EventType::KeyUp));
    assert_eq!(h.source.subscriber_count(EventType::KeyDown), 1);
    assert_eq!(h.source.subscriber_count(EventType::KeyUp), 0);
}

#[test]
fn test_ctrl_shift_k_end_to_end() {
    let h = Harness::new(ManagerConfig::default());
    h.manager
        .down("ctrl shift k", h.record("cb"), BindingOptions::new().ctrl().shift())
        .unwrap();

    h.down(KeyEvent::new("k").with_ctrl().with_shift());
    assert_eq!(h.fired(), vec!["cb"]);

    h.clock.advance(Duration::from_millis(10));
    h.down(KeyEvent::new("k").with_ctrl());
    assert_eq!(h.fired(), vec!["cb"]);
}

#[test]
fn test_modifier_key_events_are_ignored() {
    let h = Harness::new(ManagerConfig::default());
    h.manager
        .down("ctrl k", h.record("ctrl-k"), BindingOptions::new())
        .unwrap();

    // Pressing Control itself produces no token
    h.down(KeyEvent::new("Control").with_ctrl());
    assert!(h.manager.current_sequence(EventType::KeyDown).is_empty());

    h.down(KeyEvent::new("K").with_ctrl());
    assert_eq!(h.fired(), vec!["ctrl-k"]);
}

#[test]
fn test_space_sequence_end_to_end() {
    let h = Harness::new(ManagerConfig::default());
    h.manager
        .down("a space b", h.record("asb"), BindingOptions::new())
        .unwrap();

    h.down(KeyEvent::new("a"));
    h.down(KeyEvent::new(" "));
    let sequence: Vec<String> = h
        .manager
        .current_sequence(EventType::KeyDown)
        .iter()
        .map(|t| t.to_string())
        .collect();
    assert_eq!(sequence, vec!["a", "space"]);

    h.down(KeyEvent::new("b"));
    assert_eq!(h.fired(), vec!["asb"]);
    assert!(h.manager.current_sequence(EventType::KeyDown).is_empty());
}

#[test]
fn test_ordered_chord_within_delay_fires_once() {
    let h = Harness::new(ManagerConfig::default());
    h.manager
        .down("a b", h.record("ab"), BindingOptions::new().ordered(true))
        .unwrap();

    h.type_keys(&["a", "b"], 100);
    assert_eq!(h.fired(), vec!["ab"]);

    // The completed chord starts over: a lone "b" does nothing
    h.type_keys(&["b"], 100);
    assert_eq!(h.fired(), vec!["ab"]);
}

#[test]
fn test_ordered_chord_after_timeout_never_fires() {
    let h = Harness::new(ManagerConfig::default());
    h.manager
        .down("a b", h.record("ab"), BindingOptions::new().ordered(true))
        .unwrap();

    h.type_keys(&["a", "b"], 600);
    assert!(h.fired().is_empty());
}

#[test]
fn test_prefix_binding_does_not_block_longer_chord() {
    let h = Harness::new(ManagerConfig::default());
    h.manager
        .down("a", h.record("a"), BindingOptions::new().exclusive(false))
        .unwrap();
    h.manager
        .down("a b", h.record("ab"), BindingOptions::new().ordered(true).exclusive(false))
        .unwrap();

    h.type_keys(&["a", "b"], 10);
    assert_eq!(h.fired(), vec!["a", "ab"]);
}

#[test]
fn test_interleaved_key_keeps_chord_until_timeout() {
    let h = Harness::new(ManagerConfig::default());
    h.manager
        .down("a b", h.record("ab"), BindingOptions::new().ordered(true))
        .unwrap();

    h.type_keys(&["a", "x", "b"], 10);
    assert_eq!(h.fired(), vec!["ab"]);

    // Once the window lapses the stalled chord is gone
    h.type_keys(&["a", "x"], 10);
    h.clock.advance(Duration::from_millis(600));
    h.type_keys(&["b"], 10);
    assert_eq!(h.fired(), vec!["ab"]);
}

#[test]
fn test_tick_clears_partial_chord() {
    let h = Harness::new(ManagerConfig::default());
    h.manager
        .down("a b", h.record("ab"), BindingOptions::new().ordered(true))
        .unwrap();

    h.down(KeyEvent::new("a"));
    assert_eq!(h.manager.in_progress(EventType::KeyDown), 1);

    h.clock.advance(Duration::from_millis(499));
    assert_eq!(h.manager.tick(), 0);
    h.clock.advance(Duration::from_millis(1));
    assert_eq!(h.manager.tick(), 1);

    assert_eq!(h.manager.in_progress(EventType::KeyDown), 0);
    assert!(h.manager.current_sequence(EventType::KeyDown).is_empty());
}

#[test]
fn test_custom_delay() {
    let h = Harness::new(ManagerConfig::default().with_delay_ms(1000));
    h.manager
        .down("a b", h.record("ab"), BindingOptions::new().ordered(true))
        .unwrap();

    h.type_keys(&["a", "b"], 800);
    assert_eq!(h.fired(), vec!["ab"]);
}

#[test]
fn test_reregistration_replaces_callback() {
    let h = Harness::new(ManagerConfig::default());
    h.manager.down("x y", h.record("old"), BindingOptions::new()).unwrap();
    h.manager.down("y x", h.record("new"), BindingOptions::new()).unwrap();

    assert_eq!(h.manager.bindings(EventType::KeyDown).len(), 1);

    h.type_keys(&["x", "y"], 50);
    assert_eq!(h.fired(), vec!["new"]);
}

#[test]
fn test_explicit_no_ctrl_blocks_ctrl_events() {
    let h = Harness::new(ManagerConfig::default());
    h.manager
        .down(
            "a",
            h.record("a"),
            BindingOptions::new().modifiers(ModifierOptions::new().ctrl(false)),
        )
        .unwrap();

    h.down(KeyEvent::new("a").with_ctrl());
    assert!(h.fired().is_empty());
}

#[test]
fn test_exclusive_suppresses_shared_binding() {
    let h = Harness::new(ManagerConfig::default());
    h.manager
        .down("k", h.record("shared"), BindingOptions::new().exclusive(false))
        .unwrap();
    h.manager
        .down("j k", h.record("exclusive"), BindingOptions::new().ordered(true))
        .unwrap();

    h.type_keys(&["j", "k"], 50);
    assert_eq!(h.fired(), vec!["exclusive"]);
}

#[test]
fn test_wildcard_binding() {
    let h = Harness::new(ManagerConfig::default());
    h.manager
        .down("g all", h.record("g-any"), BindingOptions::new().ordered(true))
        .unwrap();

    h.type_keys(&["g", "5"], 50);
    assert_eq!(h.fired(), vec!["g-any"]);
}

#[test]
fn test_up_and_down_pipelines_are_independent() {
    let h = Harness::new(ManagerConfig::default());
    h.manager.up("a", h.record("up-a"), BindingOptions::new()).unwrap();
    h.manager.down("a", h.record("down-a"), BindingOptions::new()).unwrap();

    h.source.dispatch(EventType::KeyUp, &KeyEvent::new("a"));
    assert_eq!(h.fired(), vec!["up-a"]);

    h.down(KeyEvent::new("a"));
    assert_eq!(h.fired(), vec!["up-a", "down-a"]);
}

#[test]
fn test_validation_errors_are_synchronous() {
    let h = Harness::new(ManagerConfig::default());

    assert!(matches!(
        h.manager.down("   ", h.record("x"), BindingOptions::new()),
        Err(ValidationError::EmptyCombo(_))
    ));
    assert!(matches!(
        h.manager.down("shift", h.record("x"), BindingOptions::new()),
        Err(ValidationError::EmptyCombo(_))
    ));
    assert!(matches!(
        h.manager.register_named("keypress", "a", h.record("x"), BindingOptions::new()),
        Err(ValidationError::UnsupportedEventType(_))
    ));

    // Nothing was registered or subscribed
    assert!(h.manager.bindings(EventType::KeyDown).is_empty());
    assert!(!h.manager.is_subscribed(EventType::KeyDown));
}

#[test]
fn test_register_named() {
    let h = Harness::new(ManagerConfig::default());
    h.manager
        .register_named("keyup", "q", h.record("q"), BindingOptions::new())
        .unwrap();

    assert!(h.manager.is_subscribed(EventType::KeyUp));
    h.source.dispatch(EventType::KeyUp, &KeyEvent::new("Q"));
    assert_eq!(h.fired(), vec!["q"]);
}

#[test]
fn test_unregister_last_binding_unsubscribes() {
    let h = Harness::new(ManagerConfig::default());
    h.manager.down("a", h.record("a"), BindingOptions::new()).unwrap();
    h.manager.down("b", h.record("b"), BindingOptions::new()).unwrap();

    assert!(h.manager.unregister(EventType::KeyDown, "a", BindingOptions::new()).unwrap());
    assert!(h.manager.is_subscribed(EventType::KeyDown));
    assert!(!h.manager.unregister(EventType::KeyDown, "a", BindingOptions::new()).unwrap());

    assert!(h.manager.unregister(EventType::KeyDown, "b", BindingOptions::new()).unwrap());
    assert!(!h.manager.is_subscribed(EventType::KeyDown));
    assert_eq!(h.source.subscriber_count(EventType::KeyDown), 0);

    h.down(KeyEvent::new("b"));
    assert!(h.fired().is_empty());
}

#[test]
fn test_detach_stops_dispatch_and_resubscribes_later() {
    let h = Harness::new(ManagerConfig::default());
    h.manager.down("a", h.record("a"), BindingOptions::new()).unwrap();

    h.manager.detach();
    assert!(!h.manager.is_subscribed(EventType::KeyDown));
    h.down(KeyEvent::new("a"));
    assert!(h.fired().is_empty());

    // Rules survive detach; the next registration subscribes again
    h.manager.down("b", h.record("b"), BindingOptions::new()).unwrap();
    h.down(KeyEvent::new("a"));
    assert_eq!(h.fired(), vec!["a"]);
}

#[test]
fn test_drop_unsubscribes() {
    let source = Rc::new(LocalSource::new());
    {
        let manager = BindingManager::new(Rc::clone(&source), ManagerConfig::default()).unwrap();
        manager.down("a", |_, _| {}, BindingOptions::new()).unwrap();
        manager.up("a", |_, _| {}, BindingOptions::new()).unwrap();
        assert_eq!(source.subscriber_count(EventType::KeyDown), 1);
    }

    assert_eq!(source.subscriber_count(EventType::KeyDown), 0);
    assert_eq!(source.subscriber_count(EventType::KeyUp), 0);
}

#[test]
fn test_callback_may_register_bindings() {
    let source = Rc::new(LocalSource::new());
    let manager = Rc::new(BindingManager::new(Rc::clone(&source), ManagerConfig::default()).unwrap());
    let log: Log = Rc::new(RefCell::new(Vec::new()));

    let weak = Rc::downgrade(&manager);
    let inner_log = Rc::clone(&log);
    manager
        .down(
            "a",
            move |_, _| {
                if let Some(manager) = weak.upgrade() {
                    let log = Rc::clone(&inner_log);
                    manager
                        .down("b", move |_, _| log.borrow_mut().push("b".to_string()), BindingOptions::new())
                        .unwrap();
                }
            },
            BindingOptions::new(),
        )
        .unwrap();

    source.dispatch(EventType::KeyDown, &KeyEvent::new("a"));
    source.dispatch(EventType::KeyDown, &KeyEvent::new("b"));
    assert_eq!(*log.borrow(), vec!["b"]);
}

#[test]
fn test_callback_receives_event_and_rule() {
    let h = Harness::new(ManagerConfig::default());
    let seen = Rc::new(RefCell::new(None));
    let sink = Rc::clone(&seen);

    h.manager
        .down(
            "alt x",
            move |event, rule| *sink.borrow_mut() = Some((event.key.clone(), rule.canonical())),
            BindingOptions::new(),
        )
        .unwrap();

    h.down(KeyEvent::new("X").with_alt());
    assert_eq!(*seen.borrow(), Some(("X".to_string(), "x".to_string())));
}
