//! Integration tests for the command-line interface
//!
//! Runs the built binary against scratch copies of the frontend fixtures.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

const APP_JS: &str = include_str!("fixtures/app.js");
const APP_ASSIGNMENTS_JS: &str = include_str!("fixtures/app-assignments.js");

fn bin() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_classflow-fix"));
    cmd.env_remove("CLASSFLOW_FRONTEND_DIR").env("NO_COLOR", "1");
    cmd
}

/// Run the binary with `args` from inside `dir`.
fn run_in(dir: &Path, args: &[&str]) -> Output {
    bin().current_dir(dir).args(args).output().unwrap()
}

/// Helper to create a frontend directory with both files
fn setup_frontend() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("app.js"), APP_JS).unwrap();
    fs::write(dir.path().join("app-assignments.js"), APP_ASSIGNMENTS_JS).unwrap();
    dir
}

fn read_app(dir: &Path) -> String {
    fs::read_to_string(dir.join("app.js")).unwrap()
}

fn listing(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn test_help() {
    let output = bin().arg("--help").output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("assignments and grades"));
    assert!(stdout.contains("restore"));
}

#[test]
fn test_zero_args_patches_both_files() {
    let frontend = setup_frontend();
    let output = run_in(frontend.path(), &[]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("HOÀN THÀNH"));
    assert!(stdout.contains("mv app.js.backup app.js"));
    assert!(stdout.contains("mv app-assignments.js.backup app-assignments.js"));

    let app = fs::read_to_string(frontend.path().join("app.js")).unwrap();
    assert!(app.contains("} else if (tabId === 'assignmentsTab') {"));
    assert!(app.contains("async function loadGradesTab()"));
    assert!(app.contains("window.loadAssignmentsTab = loadAssignmentsTab;"));

    let assignments = fs::read_to_string(frontend.path().join("app-assignments.js")).unwrap();
    assert!(assignments.contains("// ===== HELPERS FROM APP.JS ====="));
    assert!(assignments.contains("Assignments module loaded - FIXED VERSION"));

    assert_eq!(
        fs::read_to_string(frontend.path().join("app.js.backup")).unwrap(),
        APP_JS
    );
    assert_eq!(
        fs::read_to_string(frontend.path().join("app-assignments.js.backup")).unwrap(),
        APP_ASSIGNMENTS_JS
    );
}

#[test]
fn test_reports_written_sizes() {
    let frontend = setup_frontend();
    let output = run_in(frontend.path(), &["apply"]);
    assert!(output.status.success());

    let app_len = fs::metadata(frontend.path().join("app.js")).unwrap().len();
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(&format!("📝 Đã tạo: app.js ({app_len} bytes)")));
}

#[test]
fn test_missing_primary_exits_1_without_changes() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("app-assignments.js"), APP_ASSIGNMENTS_JS).unwrap();
    let before = listing(dir.path());

    let output = run_in(dir.path(), &[]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Không tìm thấy file app.js"));
    assert_eq!(listing(dir.path()), before);
    assert_eq!(
        fs::read_to_string(dir.path().join("app-assignments.js")).unwrap(),
        APP_ASSIGNMENTS_JS
    );
}

#[test]
fn test_missing_secondary_still_patches_primary() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("app.js"), APP_JS).unwrap();

    let output = run_in(dir.path(), &[]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Không tìm thấy file app-assignments.js"));
    assert!(stdout.contains("HOÀN THÀNH"));
    assert!(!stdout.contains("mv app-assignments.js.backup"));

    assert_eq!(
        listing(dir.path()),
        vec!["app.js".to_string(), "app.js.backup".to_string()]
    );
    let app = fs::read_to_string(dir.path().join("app.js")).unwrap();
    assert!(app.contains("loadGradesTab();"));
}

#[test]
fn test_second_run_refuses_to_clobber_backup() {
    let frontend = setup_frontend();
    assert!(run_in(frontend.path(), &[]).status.success());
    let patched = fs::read_to_string(frontend.path().join("app.js")).unwrap();

    let output = run_in(frontend.path(), &[]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("app.js.backup"));
    // Neither the patched file nor the original backup moved
    assert_eq!(
        fs::read_to_string(frontend.path().join("app.js")).unwrap(),
        patched
    );
    assert_eq!(
        fs::read_to_string(frontend.path().join("app.js.backup")).unwrap(),
        APP_JS
    );
}

#[test]
fn test_dry_run_touches_nothing() {
    let frontend = setup_frontend();
    let before = listing(frontend.path());

    let output = run_in(frontend.path(), &["apply", "--dry-run"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("DRY RUN"));
    assert!(stdout.contains("switch-tab-branches"));
    assert_eq!(listing(frontend.path()), before);
    assert_eq!(
        fs::read_to_string(frontend.path().join("app.js")).unwrap(),
        APP_JS
    );
}

#[test]
fn test_diff_output() {
    let frontend = setup_frontend();
    let output = run_in(frontend.path(), &["apply", "--dry-run", "--diff"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("+    } else if (tabId === 'gradesTab') {"));
    assert!(stdout.contains("+window.loadGradesTab = loadGradesTab;"));
}

#[test]
fn test_dir_flag() {
    let frontend = setup_frontend();
    let elsewhere = TempDir::new().unwrap();
    let output = run_in(
        elsewhere.path(),
        &["apply", "--dir", frontend.path().to_str().unwrap()],
    );

    assert!(output.status.success());
    assert!(frontend.path().join("app.js.backup").exists());
    assert!(listing(elsewhere.path()).is_empty());
}

#[test]
fn test_dir_from_environment() {
    let frontend = setup_frontend();
    let elsewhere = TempDir::new().unwrap();
    let output = bin()
        .current_dir(elsewhere.path())
        .env("CLASSFLOW_FRONTEND_DIR", frontend.path())
        .output()
        .unwrap();

    assert!(output.status.success());
    assert!(frontend.path().join("app.js.backup").exists());
}

#[test]
fn test_dir_env_pointing_at_file_falls_back_to_cwd() {
    let frontend = setup_frontend();
    let stray = TempDir::new().unwrap();
    let not_a_dir = stray.path().join("notes.txt");
    fs::write(&not_a_dir, "not a directory").unwrap();

    let output = bin()
        .current_dir(frontend.path())
        .env("CLASSFLOW_FRONTEND_DIR", &not_a_dir)
        .output()
        .unwrap();

    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("CLASSFLOW_FRONTEND_DIR is set but is not a directory"));
    assert!(frontend.path().join("app.js.backup").exists());
    assert!(read_app(frontend.path()).contains("loadGradesTab();"));
    assert_eq!(listing(stray.path()), vec!["notes.txt".to_string()]);
}

#[test]
fn test_status_is_read_only() {
    let frontend = setup_frontend();
    let before = listing(frontend.path());

    let output = run_in(frontend.path(), &["status"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Patch Status Report"));
    assert!(stdout.contains("switch-tab-branches"));
    assert!(stdout.contains("helper-fallbacks"));
    assert!(stdout.contains("Define loadAssignmentsTab() and loadGradesTab()"));
    assert_eq!(listing(frontend.path()), before);
}

#[test]
fn test_custom_patch_config() {
    let frontend = setup_frontend();
    let config = frontend.path().join("rename.toml");
    fs::write(
        &config,
        r#"[meta]
name = "rename"

[[targets]]
file = "app.js"
required = true

[[targets.patches]]
id = "banner"
[targets.patches.query]
type = "text"
search = "App.js loaded successfully"
[targets.patches.operation]
type = "replace"
text = "App.js ready"
"#,
    )
    .unwrap();

    let output = run_in(frontend.path(), &["apply", "--patches", "rename.toml"]);

    assert!(output.status.success());
    let app = fs::read_to_string(frontend.path().join("app.js")).unwrap();
    assert!(app.contains("console.log('✅ App.js ready');"));
    // Only app.js is a target of this config
    assert_eq!(
        fs::read_to_string(frontend.path().join("app-assignments.js")).unwrap(),
        APP_ASSIGNMENTS_JS
    );
    assert!(!frontend.path().join("app-assignments.js.backup").exists());
}

#[test]
fn test_malformed_patch_config_fails() {
    let frontend = setup_frontend();
    fs::write(frontend.path().join("bad.toml"), "[[targets]]\n").unwrap();

    let output = run_in(frontend.path(), &["apply", "--patches", "bad.toml"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("bad.toml"));
    assert!(!frontend.path().join("app.js.backup").exists());
}

#[test]
fn test_patch_config_without_patches_fails() {
    let frontend = setup_frontend();
    fs::write(
        frontend.path().join("empty.toml"),
        "[[targets]]\nfile = \"app.js\"\nrequired = true\n",
    )
    .unwrap();

    let output = run_in(frontend.path(), &["apply", "--patches", "empty.toml"]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("empty.toml"));
    assert!(stderr.contains("target 'app.js' contains no patches"));
    assert_eq!(read_app(frontend.path()), APP_JS);
}
