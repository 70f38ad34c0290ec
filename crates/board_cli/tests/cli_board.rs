use std::path::PathBuf;
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_path(file_name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("taskboard-{nanos}-{file_name}"))
}

struct Board {
    store: PathBuf,
    session: PathBuf,
    config: PathBuf,
}

impl Board {
    /// Fresh store with a remembered session already in place.
    fn signed_in(name: &str) -> Self {
        let board = Self {
            store: temp_path(&format!("{name}-board.json")),
            session: temp_path(&format!("{name}-session.json")),
            config: temp_path(&format!("{name}-config.json")),
        };
        let user = serde_json::json!({
            "email": "intern@demo.com",
            "name": "Intern User",
            "role": "admin"
        });
        std::fs::write(&board.session, user.to_string()).unwrap();
        board
    }

    fn run(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_taskboard"))
            .args(args)
            .env("TASKBOARD_STORE_PATH", &self.store)
            .env("TASKBOARD_SESSION_PATH", &self.session)
            .env("TASKBOARD_CONFIG_PATH", &self.config)
            .output()
            .expect("failed to run taskboard")
    }

    fn add(&self, args: &[&str]) -> String {
        let mut argv = vec!["--json", "add"];
        argv.extend_from_slice(args);
        let output = self.run(&argv);
        assert!(output.status.success(), "add failed: {output:?}");
        let parsed: serde_json::Value =
            serde_json::from_str(&String::from_utf8_lossy(&output.stdout)).expect("json output");
        parsed["id"].as_str().unwrap().to_string()
    }

    fn stored(&self) -> serde_json::Value {
        serde_json::from_str(&std::fs::read_to_string(&self.store).unwrap()).unwrap()
    }

    fn cleanup(&self) {
        std::fs::remove_file(&self.store).ok();
        std::fs::remove_file(&self.session).ok();
        std::fs::remove_file(&self.config).ok();
    }
}

#[test]
fn add_then_move_updates_store_and_log() {
    let board = Board::signed_in("add-move");
    let id = board.add(&["Write spec"]);

    let stored = board.stored();
    assert_eq!(stored["columns"]["todo"]["taskIds"], serde_json::json!([id]));
    assert_eq!(stored["activityLog"][0]["type"], "created");

    let output = board.run(&["move", &id, "doing", "--index", "0"]);
    let stored = board.stored();
    board.cleanup();

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("Moved task: Write spec"));
    assert_eq!(stored["columns"]["todo"]["taskIds"], serde_json::json!([]));
    assert_eq!(stored["columns"]["doing"]["taskIds"], serde_json::json!([id]));
    assert_eq!(stored["activityLog"][0]["type"], "moved");
    assert_eq!(stored["activityLog"][0]["from"], "To Do");
    assert_eq!(stored["activityLog"][0]["to"], "Doing");
}

#[test]
fn add_stores_all_fields() {
    let board = Board::signed_in("add-fields");
    let id = board.add(&[
        "Ship it",
        "--column",
        "doing",
        "--description",
        "before friday",
        "--priority",
        "high",
        "--due",
        "2024-05-01",
        "--tags",
        "release, ops, release",
    ]);

    let stored = board.stored();
    board.cleanup();

    let task = &stored["tasks"][id.as_str()];
    assert_eq!(task["title"], "Ship it");
    assert_eq!(task["description"], "before friday");
    assert_eq!(task["priority"], "high");
    assert_eq!(task["dueDate"], "2024-05-01");
    assert_eq!(task["tags"], serde_json::json!(["release", "ops", "release"]));
    assert_eq!(stored["columns"]["doing"]["taskIds"], serde_json::json!([id]));
}

#[test]
fn add_rejects_missing_title_and_bad_fields() {
    let board = Board::signed_in("add-invalid");

    let missing = board.run(&["add"]);
    let bad_priority = board.run(&["add", "demo", "--priority", "urgent"]);
    let bad_due = board.run(&["add", "demo", "--due", "tomorrow"]);
    let bad_column = board.run(&["add", "demo", "--column", "backlog"]);
    let store_written = board.store.exists();
    board.cleanup();

    for output in [missing, bad_priority, bad_due, bad_column] {
        assert!(!output.status.success());
        assert!(String::from_utf8_lossy(&output.stderr).contains("ERROR: invalid_input"));
    }
    assert!(!store_written);
}

#[test]
fn add_uses_configured_default_column() {
    let board = Board::signed_in("add-config");
    std::fs::write(&board.config, r#"{ "default_column": "done" }"#).unwrap();

    let id = board.add(&["Already finished"]);
    let overridden = board.add(&["Next up", "--config-override", "default_column=doing"]);
    let stored = board.stored();
    board.cleanup();

    assert_eq!(stored["columns"]["done"]["taskIds"], serde_json::json!([id]));
    assert_eq!(stored["columns"]["doing"]["taskIds"], serde_json::json!([overridden]));
}

#[test]
fn edit_records_changed_fields() {
    let board = Board::signed_in("edit");
    let id = board.add(&["draft", "--due", "2024-01-01"]);

    let output = board.run(&["edit", &id, "--title", "final", "--clear-due", "--priority", "medium"]);
    let stored = board.stored();
    board.cleanup();

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("Updated task: final"));
    let task = &stored["tasks"][id.as_str()];
    assert_eq!(task["title"], "final");
    assert_eq!(task["priority"], "medium");
    assert!(task.get("dueDate").is_none());
    assert_eq!(stored["activityLog"][0]["type"], "updated");
    assert_eq!(
        stored["activityLog"][0]["changes"],
        serde_json::json!(["title", "priority", "dueDate"])
    );
}

#[test]
fn edit_reports_missing_task_and_empty_change() {
    let board = Board::signed_in("edit-missing");
    let id = board.add(&["demo"]);

    let missing = board.run(&["edit", "nope", "--title", "x"]);
    let empty = board.run(&["edit", &id]);
    let log_len = board.stored()["activityLog"].as_array().unwrap().len();
    board.cleanup();

    assert!(!missing.status.success());
    assert!(String::from_utf8_lossy(&missing.stderr).contains("ERROR: invalid_input - task not found"));
    assert!(!empty.status.success());
    assert_eq!(log_len, 1);
}

#[test]
fn delete_removes_task_from_its_column() {
    let board = Board::signed_in("delete");
    let id = board.add(&["doomed", "--column", "doing"]);

    let output = board.run(&["delete", &id]);
    let stored = board.stored();
    board.cleanup();

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("Deleted task: doomed"));
    assert_eq!(stored["tasks"], serde_json::json!({}));
    assert_eq!(stored["columns"]["doing"]["taskIds"], serde_json::json!([]));
    assert_eq!(stored["activityLog"][0]["type"], "deleted");
    assert_eq!(stored["activityLog"][0]["taskTitle"], "doomed");
}

#[test]
fn delete_with_wrong_column_is_rejected() {
    let board = Board::signed_in("delete-wrong");
    let id = board.add(&["kept"]);

    let output = board.run(&["delete", &id, "--column", "done"]);
    let stored = board.stored();
    board.cleanup();

    assert!(!output.status.success());
    assert_eq!(stored["columns"]["todo"]["taskIds"], serde_json::json!([id]));
}

#[test]
fn move_within_column_reorders_without_logging() {
    let board = Board::signed_in("reorder");
    let first = board.add(&["first"]);
    let second = board.add(&["second"]);

    let output = board.run(&["move", &first, "todo"]);
    let stored = board.stored();
    board.cleanup();

    assert!(output.status.success());
    assert_eq!(
        stored["columns"]["todo"]["taskIds"],
        serde_json::json!([second, first])
    );
    assert_eq!(stored["activityLog"].as_array().unwrap().len(), 2);
}

#[test]
fn move_to_current_position_is_a_no_op() {
    let board = Board::signed_in("move-noop");
    let id = board.add(&["only"]);
    let before = board.stored();

    let output = board.run(&["move", &id, "todo", "--index", "0"]);
    let after = board.stored();
    board.cleanup();

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("Task already in place"));
    assert_eq!(before, after);
}

#[test]
fn show_and_log_render_task_history() {
    let board = Board::signed_in("show-log");
    let id = board.add(&["Write spec", "--description", "the long one"]);
    board.run(&["move", &id, "done"]);

    let show = board.run(&["show", &id]);
    let log = board.run(&["log", "--limit", "1"]);
    let log_json = board.run(&["--json", "log"]);
    board.cleanup();

    let show_out = String::from_utf8_lossy(&show.stdout);
    assert!(show_out.contains("Write spec"));
    assert!(show_out.contains("Done"));
    assert!(show_out.contains("the long one"));

    let log_out = String::from_utf8_lossy(&log.stdout);
    assert!(log_out.contains("moved \"Write spec\" from To Do to Done"));
    assert!(!log_out.contains("created"));

    let entries: serde_json::Value =
        serde_json::from_str(&String::from_utf8_lossy(&log_json.stdout)).unwrap();
    assert_eq!(entries.as_array().unwrap().len(), 2);
    assert_eq!(entries[1]["type"], "created");
}

#[test]
fn corrupt_store_falls_back_to_empty_board() {
    let board = Board::signed_in("corrupt");
    std::fs::write(&board.store, "{ this is not json").unwrap();

    let list = board.run(&["--json", "list"]);
    let id = board.add(&["fresh start"]);
    let stored = board.stored();
    board.cleanup();

    assert!(list.status.success());
    let columns: serde_json::Value =
        serde_json::from_str(&String::from_utf8_lossy(&list.stdout)).unwrap();
    assert_eq!(columns.as_array().unwrap().len(), 3);
    assert_eq!(stored["columns"]["todo"]["taskIds"], serde_json::json!([id]));
}
