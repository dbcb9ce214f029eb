//! Tests for tracker record decoding and the typed task model.

use super::*;

const LIST_OUTPUT: &str = r#"[
  {
    "id": "fb-ft0.1.2",
    "title": "Wire login form",
    "description": "See docs/design/login.md",
    "status": "open",
    "issue_type": "task",
    "labels": ["agent:frontend", "ui"],
    "parent": "fb-ft0.1",
    "dependencies": [
      {"issue_id": "fb-ft0.1.2", "depends_on_id": "fb-ft0.1.1", "type": "blocks"},
      {"issue_id": "fb-ft0.1.2", "depends_on_id": "fb-ft0.1", "type": "parent-child"}
    ]
  },
  {
    "id": "fb-ft0",
    "title": "Auth epic",
    "status": "open",
    "issue_type": "epic",
    "labels": null
  }
]"#;

#[test]
fn test_decode_array_output() {
    let records = decode_records(LIST_OUTPUT).unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].id, "fb-ft0.1.2");
    assert_eq!(records[0].parent_ref(), Some("fb-ft0.1"));
    assert_eq!(records[1].parent_ref(), None);
    assert!(records[1].labels.is_none());
}

#[test]
fn test_decode_single_object_output() {
    let json = r#"{"id": "fb-1", "title": "Solo", "status": "in_progress", "parent_id": "fb-0"}"#;
    let records = decode_records(json).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].parent_ref(), Some("fb-0"));
}

#[test]
fn test_decode_empty_output() {
    assert!(decode_records("").unwrap().is_empty());
    assert!(decode_records("  \n").unwrap().is_empty());
    assert!(decode_records("null").unwrap().is_empty());
    assert!(decode_records("[]").unwrap().is_empty());
}

#[test]
fn test_decode_invalid_json_is_error() {
    assert!(decode_records("not json").is_err());
}

#[test]
fn test_only_blocking_dependencies_are_kept() {
    let records = decode_records(LIST_OUTPUT).unwrap();
    let deps = records[0].blocking_dependencies();
    assert_eq!(deps.len(), 1);
    assert!(deps.contains("fb-ft0.1.1"));
}

#[test]
fn test_show_style_dependencies() {
    let json = r#"{
        "id": "fb-2",
        "status": "open",
        "dependencies": [
            {"id": "fb-1", "title": "Schema", "status": "closed", "dependency_type": "blocks"},
            {"id": "fb-0", "title": "Epic", "dependency_type": "parent-child"},
            "fb-3"
        ]
    }"#;
    let records = decode_records(json).unwrap();
    let deps = records[0].blocking_dependencies();
    assert_eq!(
        deps.into_iter().collect::<Vec<_>>(),
        vec!["fb-1".to_string(), "fb-3".to_string()]
    );
}

#[test]
fn test_self_dependency_is_dropped() {
    let json = r#"{"id": "fb-1", "dependencies": ["fb-1", "fb-2"]}"#;
    let records = decode_records(json).unwrap();
    let deps = records[0].blocking_dependencies();
    assert!(!deps.contains("fb-1"));
    assert!(deps.contains("fb-2"));
}

#[test]
fn test_empty_parent_is_root() {
    let json = r#"{"id": "fb-1", "parent": ""}"#;
    let records = decode_records(json).unwrap();
    assert_eq!(records[0].parent_ref(), None);
}

#[test]
fn test_unknown_fields_are_preserved() {
    let json = r#"{"id": "fb-1", "priority": 2, "assignee": "someone"}"#;
    let records = decode_records(json).unwrap();
    assert!(records[0].extra.contains_key("priority"));
    assert!(records[0].extra.contains_key("assignee"));
}

#[test]
fn test_status_decoding() {
    assert_eq!(TaskStatus::from_tracker("open"), TaskStatus::Open);
    assert_eq!(TaskStatus::from_tracker("in_progress"), TaskStatus::InProgress);
    assert_eq!(TaskStatus::from_tracker("blocked"), TaskStatus::Blocked);
    assert_eq!(TaskStatus::from_tracker("closed"), TaskStatus::Done);
    assert_eq!(TaskStatus::from_tracker("DONE"), TaskStatus::Done);
    assert_eq!(TaskStatus::from_tracker("deferred"), TaskStatus::Open);
    assert_eq!(TaskStatus::from_tracker(""), TaskStatus::Open);
}

#[test]
fn test_done_is_written_as_closed() {
    assert_eq!(TaskStatus::Done.as_tracker_str(), "closed");
    assert_eq!(TaskStatus::InProgress.as_tracker_str(), "in_progress");
    assert_eq!(TaskStatus::Done.to_string(), "done");
}

#[test]
fn test_kind_from_depth() {
    assert_eq!(TaskKind::from_depth(0), TaskKind::Epic);
    assert_eq!(TaskKind::from_depth(1), TaskKind::Task);
    assert_eq!(TaskKind::from_depth(2), TaskKind::Subtask);
    assert_eq!(TaskKind::from_depth(5), TaskKind::Subtask);
}

#[test]
fn test_task_from_record() {
    let records = decode_records(LIST_OUTPUT).unwrap();
    let task = Task::from_record(&records[0], 2);

    assert_eq!(task.id, "fb-ft0.1.2");
    assert_eq!(task.title, "Wire login form");
    assert_eq!(task.kind, TaskKind::Subtask);
    assert_eq!(task.depth, 2);
    assert_eq!(task.parent_id.as_deref(), Some("fb-ft0.1"));
    assert!(task.labels.contains("agent:frontend"));
    assert_eq!(task.status, TaskStatus::Open);
    assert_eq!(task.description, "See docs/design/login.md");
    assert!(task.parent_id.is_some());
}

#[test]
fn test_task_from_sparse_record() {
    let records = decode_records(LIST_OUTPUT).unwrap();
    let epic = Task::from_record(&records[1], 0);

    assert_eq!(epic.kind, TaskKind::Epic);
    assert!(epic.labels.is_empty());
    assert!(epic.dependency_ids.is_empty());
    assert!(epic.notes.is_empty());
    assert!(epic.parent_id.is_none());
}
