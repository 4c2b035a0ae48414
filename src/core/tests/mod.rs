//! Core module tests
//!
//! Contains test suites for core functionality:
//! - Type tests (ModifierSet, EventType, KeyEvent)
//! - Rule parsing and identity tests
//! - Sequence accumulator timing tests
//! - Registry upsert and ordering tests
//! - Chord matcher tests
