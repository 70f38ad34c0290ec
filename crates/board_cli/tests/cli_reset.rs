use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_path(file_name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("taskboard-{nanos}-{file_name}"))
}

fn run_with_input(store: &PathBuf, session: &PathBuf, args: &[&str], input: &str) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_taskboard"))
        .args(args)
        .env("TASKBOARD_STORE_PATH", store)
        .env("TASKBOARD_SESSION_PATH", session)
        .env("TASKBOARD_CONFIG_PATH", temp_path("no-config.json"))
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to run taskboard");
    child
        .stdin
        .take()
        .unwrap()
        .write_all(input.as_bytes())
        .unwrap();
    child.wait_with_output().unwrap()
}

fn seeded(name: &str) -> (PathBuf, PathBuf) {
    let store = temp_path(&format!("{name}-board.json"));
    let session = temp_path(&format!("{name}-session.json"));
    std::fs::write(
        &session,
        r#"{"email":"intern@demo.com","name":"Intern User","role":"admin"}"#,
    )
    .unwrap();
    let output = run_with_input(&store, &session, &["add", "something"], "");
    assert!(output.status.success());
    (store, session)
}

fn stored(store: &PathBuf) -> serde_json::Value {
    serde_json::from_str(&std::fs::read_to_string(store).unwrap()).unwrap()
}

#[test]
fn reset_with_yes_restores_default_board() {
    let (store, session) = seeded("reset-yes");

    let output = run_with_input(&store, &session, &["reset", "--yes"], "");
    let board = stored(&store);
    std::fs::remove_file(&store).ok();
    std::fs::remove_file(&session).ok();

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("Board reset"));
    assert_eq!(board["tasks"], serde_json::json!({}));
    assert_eq!(board["activityLog"], serde_json::json!([]));
    assert_eq!(board["columnOrder"], serde_json::json!(["todo", "doing", "done"]));
}

#[test]
fn reset_asks_for_confirmation() {
    let (store, session) = seeded("reset-confirm");

    let declined = run_with_input(&store, &session, &["reset"], "n\n");
    let after_decline = stored(&store);
    let accepted = run_with_input(&store, &session, &["reset"], "yes\n");
    let after_accept = stored(&store);
    std::fs::remove_file(&store).ok();
    std::fs::remove_file(&session).ok();

    assert!(String::from_utf8_lossy(&declined.stdout).contains("Reset cancelled"));
    assert_eq!(after_decline["activityLog"].as_array().unwrap().len(), 1);
    assert!(String::from_utf8_lossy(&accepted.stdout).contains("Board reset"));
    assert_eq!(after_accept["activityLog"], serde_json::json!([]));
}

#[test]
fn reset_requires_login() {
    let store = temp_path("reset-anon-board.json");
    let session = temp_path("reset-anon-session.json");

    let output = run_with_input(&store, &session, &["reset", "--yes"], "");

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("ERROR: unauthenticated"));
    assert!(!store.exists());
}
