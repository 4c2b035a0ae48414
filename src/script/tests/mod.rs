//! Scenario tests
//!
//! Full replays of small scenarios plus file loading through tempfile.

use std::fs;
use tempfile::TempDir;

use crate::config::ManagerConfig;
use crate::script::{load_script, parse_script, run_script, ScriptError};

fn replay(script: &str) -> Vec<(String, u64)> {
    let lines = parse_script(script).unwrap();
    let report = run_script(&lines, ManagerConfig::default()).unwrap();
    report
        .firings
        .into_iter()
        .map(|f| (f.name, f.at_ms))
        .collect()
}

#[test]
fn test_modifier_combo_scenario() {
    let fired = replay(
        r#"
# ctrl+shift+k saves, plain k does nothing
bind down "ctrl shift k" as save
at 0 down Control ctrl
at 10 down Shift ctrl shift
at 20 down K ctrl shift
at 30 down K ctrl
"#,
    );

    assert_eq!(fired, vec![("save".to_string(), 20)]);
}

#[test]
fn test_space_chord_scenario() {
    let fired = replay(
        r#"
bind down "a space b" as chord ordered
at 0 down a
at 100 down " "
at 200 down b
"#,
    );

    assert_eq!(fired, vec![("chord".to_string(), 200)]);
}

#[test]
fn test_timeout_scenario() {
    let lines = parse_script(
        r#"
bind down "a b" as ab ordered
at 0 down a
tick 600
at 700 down b
"#,
    )
    .unwrap();
    let report = run_script(&lines, ManagerConfig::default()).unwrap();

    assert!(report.firings.is_empty());
    assert_eq!(report.expired, 1);
    assert_eq!(report.events, 2);
}

#[test]
fn test_delay_from_config() {
    let lines = parse_script(
        r#"
bind down "a b" as ab ordered
at 0 down a
at 700 down b
"#,
    )
    .unwrap();

    let short = run_script(&lines, ManagerConfig::default()).unwrap();
    let long = run_script(&lines, ManagerConfig::default().with_delay_ms(1000)).unwrap();

    assert!(short.firings.is_empty());
    assert_eq!(long.firings.len(), 1);
}

#[test]
fn test_firing_reports_rule_key() {
    let lines = parse_script("bind up \"b a\" as ab\nat 0 up A\nat 5 up B").unwrap();
    let report = run_script(&lines, ManagerConfig::default()).unwrap();

    assert_eq!(report.firings.len(), 1);
    assert_eq!(report.firings[0].rule, "keyup:{a b}:0000");
    assert_eq!(report.firings[0].key, "B");
}

#[test]
fn test_shared_bindings_scenario() {
    let fired = replay(
        r#"
bind down "k" as one shared
bind down "j k" as two shared ordered
at 0 down j
at 10 down k
"#,
    );

    assert_eq!(
        fired,
        vec![("one".to_string(), 10), ("two".to_string(), 10)]
    );
}

#[test]
fn test_duplicate_name_rejected() {
    let lines = parse_script("bind down \"a\" as x\nbind down \"b\" as x").unwrap();
    let err = run_script(&lines, ManagerConfig::default()).unwrap_err();

    assert!(matches!(err, ScriptError::DuplicateName { line: 2, .. }));
}

#[test]
fn test_empty_combo_reports_line() {
    let lines = parse_script("\n\nbind down \"ctrl\" as nothing").unwrap();
    let err = run_script(&lines, ManagerConfig::default()).unwrap_err();

    assert!(matches!(err, ScriptError::Invalid { line: 3, .. }));
}

#[test]
fn test_invalid_config_rejected() {
    let lines = parse_script("bind down \"a\" as a").unwrap();
    let err = run_script(&lines, ManagerConfig::default().with_delay_ms(0)).unwrap_err();

    assert!(matches!(err, ScriptError::Config(_)));
}

#[test]
fn test_out_of_order_events_rejected() {
    let err = parse_script("at 100 down a\nat 50 down b").unwrap_err();
    assert!(matches!(
        err,
        ScriptError::OutOfOrder {
            line: 2,
            at_ms: 50,
            previous_ms: 100
        }
    ));
}

#[test]
fn test_load_script_from_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("scenario.keys");
    fs::write(&path, "bind down \"g g\" as top ordered repeatable\nat 0 down g\nat 80 down g\n").unwrap();

    let lines = load_script(&path).unwrap();
    assert_eq!(lines.len(), 3);

    let report = run_script(&lines, ManagerConfig::default()).unwrap();
    assert_eq!(report.firings.len(), 1);
    assert_eq!(report.firings[0].name, "top");
}

#[test]
fn test_missing_file_is_io_error() {
    let temp_dir = TempDir::new().unwrap();
    let err = load_script(&temp_dir.path().join("missing.keys")).unwrap_err();

    assert!(matches!(err, ScriptError::Io(_)));
}
