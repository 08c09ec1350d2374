//! Integration tests for patch configs and the patch engine
//!
//! Runs the built-in and custom patch sets over the frontend fixtures.

use classflow_fix::config::{
    apply_patches, apply_target, load_builtin, load_from_path, load_from_str, Operation,
    PatchDefinition, PatchResult, Query,
};
use proptest::prelude::*;
use std::fs;
use tempfile::TempDir;

const APP_JS: &str = include_str!("fixtures/app.js");
const APP_ASSIGNMENTS_JS: &str = include_str!("fixtures/app-assignments.js");

const SWITCH_TAB_ORIGINAL: &str = "    if (tabId === 'attendanceTab') {
        loadAttendanceTab();
    } else if (tabId === 'commentsTab') {
        loadCommentsTab();
    }";

#[test]
fn test_app_js_fixture() {
    let config = load_builtin().unwrap();
    let patched = apply_target(config.primary().unwrap(), APP_JS).unwrap();

    let results: Vec<_> = patched
        .results
        .iter()
        .map(|(id, r)| (id.as_str(), r.clone()))
        .collect();
    assert_eq!(
        results,
        vec![
            ("switch-tab-branches", PatchResult::Applied { sites: 1 }),
            ("tab-loaders", PatchResult::Applied { sites: 1 }),
            ("expose-tab-loaders", PatchResult::Applied { sites: 1 }),
            // The real banner never carried "v2.1"
            ("app-banner", PatchResult::NoMatch),
        ]
    );

    assert!(patched.text.contains(&format!(
        "{SWITCH_TAB_ORIGINAL} else if (tabId === 'assignmentsTab') {{
        loadAssignmentsTab();
    }} else if (tabId === 'gradesTab') {{
        loadGradesTab();
    }}
}}
"
    )));
    assert!(patched.text.contains("console.log('✅ App.js loaded successfully');"));
}

#[test]
fn test_app_assignments_fixture() {
    let config = load_builtin().unwrap();
    let secondary = config.secondaries().next().unwrap();
    let patched = apply_target(secondary, APP_ASSIGNMENTS_JS).unwrap();

    assert!(patched
        .results
        .iter()
        .all(|(_, r)| *r == PatchResult::Applied { sites: 1 }));

    let helpers = patched.text.find("// ===== HELPERS FROM APP.JS =====").unwrap();
    let state = patched.text.find("let currentClassForAssignment = null;").unwrap();
    let first_function = patched.text.find("async function loadAssignments").unwrap();
    assert!(state < helpers && helpers < first_function);

    for helper in [
        "const formatDate = window.formatDate ||",
        "const formatDateTime = window.formatDateTime ||",
        "const showAlert = window.showAlert ||",
        "const hasPermission = window.hasPermission ||",
        "const XLSX = window.XLSX;",
    ] {
        assert_eq!(patched.text.matches(helper).count(), 1, "{helper}");
    }
    assert!(patched
        .text
        .contains("return `${day}/${month}/${year} ${hours}:${minutes}`;"));
}

#[test]
fn test_engines_are_independent() {
    // Running the primary set over the secondary file changes nothing, and vice versa.
    let config = load_builtin().unwrap();
    let primary = config.primary().unwrap();
    let secondary = config.secondaries().next().unwrap();

    assert!(!apply_target(primary, APP_ASSIGNMENTS_JS).unwrap().changed());
    assert!(!apply_target(secondary, APP_JS).unwrap().changed());
}

#[test]
fn test_already_patched_chain_is_skipped() {
    let config = load_builtin().unwrap();
    let primary = config.primary().unwrap();
    let once = apply_target(primary, APP_JS).unwrap();
    let twice = apply_target(primary, &once.text).unwrap();

    assert_eq!(twice.results[0].1, PatchResult::NoMatch);
    assert_eq!(twice.text.matches("loadGradesTab();").count(), 1);
}

#[test]
fn test_load_custom_config_from_path() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("patches.toml");
    fs::write(
        &path,
        r#"
[meta]
name = "tabs"
checklist = ["reload"]

[[targets]]
file = "app.js"
required = true

[[targets.patches]]
id = "schedule-tab"
[targets.patches.query]
type = "conditional-chain"
subject = "tabId"
cases = ["attendanceTab", "commentsTab"]
[targets.patches.operation]
type = "append-branches"
branches = [{ case = "scheduleTab", body = "loadScheduleTab();\nrefreshCalendar();" }]

[[targets.patches]]
id = "version"
[targets.patches.query]
type = "regex"
pattern = "App\\.js (loaded) successfully"
[targets.patches.operation]
type = "replace"
text = "App.js v3 $1"
"#,
    )
    .unwrap();

    let config = load_from_path(&path).unwrap();
    assert_eq!(config.meta.checklist, vec!["reload".to_string()]);

    let patched = apply_target(config.primary().unwrap(), APP_JS).unwrap();
    assert!(patched.text.contains(
        "    } else if (tabId === 'scheduleTab') {\n        loadScheduleTab();\n        refreshCalendar();\n    }\n}"
    ));
    assert!(patched.text.contains("console.log('✅ App.js v3 loaded');"));
}

#[test]
fn test_secondary_only_config_is_rejected() {
    let input = r#"
[[targets]]
file = "app-assignments.js"

[[targets.patches]]
id = "banner"
[targets.patches.query]
type = "text"
search = "loaded"
[targets.patches.operation]
type = "replace"
text = "ready"
"#;
    let err = load_from_str(input).unwrap_err();
    assert!(err.to_string().contains("exactly one target must be marked required"));
}

fn literal(search: &str, text: &str) -> PatchDefinition {
    PatchDefinition {
        id: "literal".to_string(),
        description: None,
        query: Query::Text {
            search: search.to_string(),
        },
        operation: Operation::Replace {
            text: text.to_string(),
        },
    }
}

proptest! {
    #[test]
    fn prop_literal_replace_noop_without_search(content in "[a-z \n;(){}]{0,200}") {
        // The search string contains a character the generator never produces.
        let patch = literal("v2.1!", "v2.2!");
        let patched = apply_patches(&[patch], &content).unwrap();
        prop_assert_eq!(&patched.text, &content);
        prop_assert_eq!(&patched.results[0].1, &PatchResult::NoMatch);
    }

    #[test]
    fn prop_builtin_sets_never_fail(content in "\\PC{0,300}") {
        let config = load_builtin().unwrap();
        for target in &config.targets {
            prop_assert!(apply_target(target, &content).is_ok());
        }
    }

    #[test]
    fn prop_chain_extension_preserves_prefix_and_suffix(
        prefix in "(let [a-z]{1,8};\n){0,4}",
        suffix in "(let [a-z]{1,8};\n){0,4}",
    ) {
        let config = load_builtin().unwrap();
        let patch = config.primary().unwrap().patches[0].clone();
        let source = format!("{prefix}\n{SWITCH_TAB_ORIGINAL}\n{suffix}");
        let patched = apply_patches(&[patch], &source).unwrap();

        let expected_head = format!("{prefix}\n{SWITCH_TAB_ORIGINAL}");
        let expected_tail = format!("\n{suffix}");
        prop_assert!(patched.text.starts_with(&expected_head));
        prop_assert!(patched.text.ends_with(&expected_tail));
        prop_assert_eq!(patched.text.matches("loadAssignmentsTab();").count(), 1);
    }
}
