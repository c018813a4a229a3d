use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn cnotes_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("cnotes");
    path
}

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();
    fs::create_dir_all(root.join("data")).unwrap();

    let config_content = format!(
        r#"[db]
path = "{}/data/cnotes.sqlite"

[resolver]
settle_delay_ms = 20
poll_interval_ms = 10
max_attempts = 5

[related]
limit = 5

[page_content]
max_chars = 40
"#,
        root.display()
    );

    let config_path = config_dir.join("cnotes.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_cnotes(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = cnotes_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run cnotes binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();
    (stdout, stderr, success)
}

fn write_file(dir: &Path, name: &str, body: &str) -> String {
    let path = dir.join(name);
    fs::write(&path, body).unwrap();
    path.to_str().unwrap().to_string()
}

#[test]
fn test_init_creates_database() {
    let (tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_cnotes(&config_path, &["init"]);
    assert!(success, "init failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("initialized"));
    assert!(tmp.path().join("data/cnotes.sqlite").exists());
}

#[test]
fn test_init_idempotent() {
    let (_tmp, config_path) = setup_test_env();

    let (_, _, success1) = run_cnotes(&config_path, &["init"]);
    assert!(success1, "First init failed");

    let (_, _, success2) = run_cnotes(&config_path, &["init"]);
    assert!(success2, "Second init failed (not idempotent)");
}

#[test]
fn test_add_list_delete() {
    let (_tmp, config_path) = setup_test_env();
    run_cnotes(&config_path, &["init"]);

    let (stdout, stderr, success) =
        run_cnotes(&config_path, &["add", "--key", "docs:Q3 Plan", "check hiring numbers"]);
    assert!(success, "add failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("Added note #0 to docs:Q3 Plan"));

    run_cnotes(&config_path, &["add", "--key", "docs:Q3 Plan", "ask about budget"]);

    let (stdout, _, success) = run_cnotes(&config_path, &["list", "docs:Q3 Plan"]);
    assert!(success);
    assert!(stdout.contains("2 notes"));
    assert!(stdout.contains("[0]"));
    assert!(stdout.contains("check hiring numbers"));
    assert!(stdout.contains("[1]"));

    let (stdout, _, success) = run_cnotes(&config_path, &["delete", "docs:Q3 Plan", "0"]);
    assert!(success);
    assert!(stdout.contains("Deleted note [0]"));

    let (stdout, _, _) = run_cnotes(&config_path, &["list", "docs:Q3 Plan"]);
    assert!(stdout.contains("1 note)"));
    assert!(!stdout.contains("check hiring numbers"));
    assert!(stdout.contains("[0]"));
    assert!(stdout.contains("ask about budget"));
}

#[test]
fn test_delete_out_of_range_is_noop() {
    let (_tmp, config_path) = setup_test_env();
    run_cnotes(&config_path, &["init"]);
    run_cnotes(&config_path, &["add", "--key", "docs:Q3 Plan", "only note"]);

    let (stdout, stderr, success) = run_cnotes(&config_path, &["delete", "docs:Q3 Plan", "7"]);
    assert!(success, "delete failed: stderr={}", stderr);
    assert!(stdout.contains("nothing deleted"));

    let (stdout, _, _) = run_cnotes(&config_path, &["list", "docs:Q3 Plan"]);
    assert!(stdout.contains("only note"));
}

#[test]
fn test_add_rejects_empty_text() {
    let (_tmp, config_path) = setup_test_env();
    run_cnotes(&config_path, &["init"]);

    let (_, stderr, success) = run_cnotes(&config_path, &["add", "--key", "docs:Q3 Plan", "   "]);
    assert!(!success);
    assert!(stderr.contains("must not be empty"));
}

#[test]
fn test_add_rejects_unknown_app() {
    let (_tmp, config_path) = setup_test_env();
    run_cnotes(&config_path, &["init"]);

    let (_, _, success) = run_cnotes(&config_path, &["add", "--key", "fax:Hello", "text"]);
    assert!(!success);
}

#[test]
fn test_add_requires_target() {
    let (_tmp, config_path) = setup_test_env();
    let (_, _, success) = run_cnotes(&config_path, &["add", "text"]);
    assert!(!success);
}

#[test]
fn test_related_notes() {
    let (_tmp, config_path) = setup_test_env();
    run_cnotes(&config_path, &["init"]);
    run_cnotes(&config_path, &["add", "--key", "docs:Budget Plan", "numbers look off"]);
    run_cnotes(&config_path, &["add", "--key", "calendar:Plan Review", "bring the deck"]);
    run_cnotes(&config_path, &["add", "--key", "docs:Unrelated", "nothing here"]);

    let (stdout, stderr, success) = run_cnotes(&config_path, &["related", "calendar:Plan Review"]);
    assert!(success, "related failed: stderr={}", stderr);
    assert!(stdout.contains("docs:Budget Plan"));
    assert!(stdout.contains("numbers look off"));
    assert!(!stdout.contains("bring the deck"));
    assert!(!stdout.contains("nothing here"));
}

#[test]
fn test_all_filters_by_app() {
    let (_tmp, config_path) = setup_test_env();
    run_cnotes(&config_path, &["init"]);
    run_cnotes(&config_path, &["add", "--key", "mail:alice@example.com", "m1"]);
    run_cnotes(&config_path, &["add", "--key", "mail:bob@example.com", "m2"]);
    run_cnotes(&config_path, &["add", "--key", "mail:bob@example.com", "m3"]);
    run_cnotes(&config_path, &["add", "--key", "docs:A", "d1"]);
    run_cnotes(&config_path, &["add", "--key", "docs:B", "d2"]);

    let (stdout, _, success) = run_cnotes(&config_path, &["all"]);
    assert!(success);
    assert!(stdout.contains("5 notes across 2 apps"));

    let (stdout, _, success) = run_cnotes(&config_path, &["all", "--app", "mail"]);
    assert!(success);
    assert!(stdout.contains("3 notes across 1 app"));
    assert!(!stdout.contains("d1"));

    let (stdout, _, success) = run_cnotes(&config_path, &["all", "--app", "video"]);
    assert!(success);
    assert!(stdout.contains("0 notes across 0 apps"));
}

#[test]
fn test_all_sort_order() {
    let (_tmp, config_path) = setup_test_env();
    run_cnotes(&config_path, &["init"]);
    run_cnotes(&config_path, &["add", "--key", "docs:A", "first-note"]);
    std::thread::sleep(std::time::Duration::from_millis(20));
    run_cnotes(&config_path, &["add", "--key", "docs:B", "second-note"]);

    let (stdout, _, _) = run_cnotes(&config_path, &["all", "--sort", "oldest"]);
    let first = stdout.find("first-note").unwrap();
    let second = stdout.find("second-note").unwrap();
    assert!(first < second);

    let (stdout, _, _) = run_cnotes(&config_path, &["all", "--sort", "newest"]);
    let first = stdout.find("first-note").unwrap();
    let second = stdout.find("second-note").unwrap();
    assert!(second < first);

    let (_, _, success) = run_cnotes(&config_path, &["all", "--sort", "sideways"]);
    assert!(!success);
}

#[test]
fn test_resolve_and_add_from_page() {
    let (tmp, config_path) = setup_test_env();
    run_cnotes(&config_path, &["init"]);

    let page = write_file(
        tmp.path(),
        "mail.json",
        r#"{
            "url": "https://mail.google.com/mail/u/0/#inbox/FMfcg123",
            "title": "Budget review - me@example.com - Gmail",
            "elements": [
                { "selector": "h2.hP", "text": "Budget review" },
                { "selector": "span.gD", "attrs": { "email": "bob@example.com" } }
            ]
        }"#,
    );

    let (stdout, stderr, success) = run_cnotes(&config_path, &["resolve", &page]);
    assert!(success, "resolve failed: stderr={}", stderr);
    let ctx: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(ctx["key"], "mail:bob@example.com");
    assert_eq!(ctx["title"], "Budget review");

    let (stdout, _, success) = run_cnotes(&config_path, &["add", "--page", &page, "follow up"]);
    assert!(success);
    assert!(stdout.contains("mail:bob@example.com"));
}

#[test]
fn test_resolve_unsupported_page() {
    let (tmp, config_path) = setup_test_env();
    let page = write_file(
        tmp.path(),
        "other.json",
        r#"{ "url": "https://example.com/", "title": "Example" }"#,
    );
    let (stdout, _, success) = run_cnotes(&config_path, &["resolve", &page]);
    assert!(success);
    assert!(stdout.contains("unsupported page"));
}

#[test]
fn test_content_is_capped() {
    let (tmp, config_path) = setup_test_env();
    let page = write_file(
        tmp.path(),
        "doc.json",
        r#"{
            "url": "https://docs.google.com/document/d/1/edit",
            "title": "Q3 Plan - Google Docs",
            "elements": [
                { "selector": ".kix-appview-editor", "text": "A very long quarterly planning document body that goes on" }
            ]
        }"#,
    );
    let (stdout, _, success) = run_cnotes(&config_path, &["content", &page]);
    assert!(success);
    let content = stdout.trim_end_matches('\n');
    assert!(content.starts_with("Q3 Plan\n\nA very long"));
    assert_eq!(content.chars().count(), 40);
}

#[test]
fn test_replay_prints_bridge_messages() {
    let (tmp, config_path) = setup_test_env();
    let script = write_file(
        tmp.path(),
        "script.json",
        r#"[
            { "page": { "url": "https://docs.google.com/document/d/1/edit", "title": "Q3 Plan - Google Docs" } },
            { "event": { "type": "panel_toggle" } },
            { "event": { "type": "navigation", "trigger": "initial" } }
        ]"#,
    );
    let (stdout, stderr, success) = run_cnotes(&config_path, &["replay", &script]);
    assert!(success, "replay failed: stderr={}", stderr);

    let lines: Vec<serde_json::Value> = stdout
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["type"], "CONTEXT_UPDATE");
    assert_eq!(lines[0]["context"]["isLoading"], true);
    assert_eq!(lines[1]["context"]["key"], "docs:Q3 Plan");
}

#[test]
fn test_export_and_stats() {
    let (tmp, config_path) = setup_test_env();
    run_cnotes(&config_path, &["init"]);
    run_cnotes(&config_path, &["add", "--key", "docs:A", "d1"]);
    run_cnotes(&config_path, &["add", "--key", "video:Rust talk", "v1"]);

    let out = tmp.path().join("out").join("notes.json");
    let (_, stderr, success) =
        run_cnotes(&config_path, &["export", "--output", out.to_str().unwrap()]);
    assert!(success, "export failed: stderr={}", stderr);
    assert!(stderr.contains("Exported 2 notes in 2 buckets"));

    let exported: serde_json::Value = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(exported["docs:A"][0]["text"], "d1");
    assert_eq!(exported["video:Rust talk"][0]["context"]["app"], "video");

    let (stdout, _, success) = run_cnotes(&config_path, &["stats"]);
    assert!(success);
    assert!(stdout.contains("Notes:       2"));
    assert!(stdout.contains("Contexts:    2"));
    assert!(stdout.contains("video"));
}

#[test]
fn test_missing_config_fails() {
    let tmp = TempDir::new().unwrap();
    let missing = tmp.path().join("nope.toml");
    let (_, stderr, success) = run_cnotes(&missing, &["list", "docs:A"]);
    assert!(!success);
    assert!(stderr.contains("Failed to read config file"));
}
