//! Tests for the task graph builder.

use super::*;
use crate::scheduler::LabelFilter;
use crate::task::TaskKind;
use crate::test_support::{MemoryTracker, rec};

fn backlog() -> MemoryTracker {
    MemoryTracker::with_tasks([
        rec("E").build(),
        rec("T").parent("E").build(),
        rec("S1").parent("T").labels(&["agent:backend"]).build(),
        rec("S2").parent("T").labels(&["agent:frontend"]).build(),
    ])
}

#[test]
fn test_depths_follow_parent_chain() {
    let tracker = backlog();
    let mut builder = GraphBuilder::new(&tracker);
    let snapshot = builder.build(&RunContext::default()).unwrap();

    let depth_of = |id: &str| {
        snapshot
            .ready
            .iter()
            .find(|t| t.id == id)
            .map(|t| (t.depth, t.kind))
            .unwrap()
    };

    assert_eq!(depth_of("E"), (0, TaskKind::Epic));
    assert_eq!(depth_of("T"), (1, TaskKind::Task));
    assert_eq!(depth_of("S1"), (2, TaskKind::Subtask));
    assert_eq!(depth_of("S2"), (2, TaskKind::Subtask));
    assert!(snapshot.skipped.is_empty());
}

#[test]
fn test_depth_cache_avoids_repeated_lookups() {
    let tracker = MemoryTracker::with_tasks([
        rec("E").status("in_progress").build(),
        rec("T").parent("E").status("in_progress").build(),
        rec("S1").parent("T").build(),
        rec("S2").parent("T").build(),
    ]);
    let mut builder = GraphBuilder::new(&tracker);

    builder.build(&RunContext::default()).unwrap();
    // S1 walks T and E; S2 hits the cache at T.
    assert_eq!(tracker.gets(), vec!["T", "E"]);

    builder.build(&RunContext::default()).unwrap();
    assert_eq!(tracker.gets().len(), 2);
}

#[test]
fn test_broken_parent_is_skipped_not_fatal() {
    let tracker = MemoryTracker::with_tasks([
        rec("orphan").parent("missing").build(),
        rec("fine").build(),
    ]);
    let mut builder = GraphBuilder::new(&tracker);
    let snapshot = builder.build(&RunContext::default()).unwrap();

    assert_eq!(snapshot.ready.len(), 1);
    assert_eq!(snapshot.ready[0].id, "fine");
    assert_eq!(snapshot.skipped.len(), 1);
    assert_eq!(snapshot.skipped[0].id, "orphan");
    assert!(snapshot.skipped[0].reason.contains("missing"));
}

#[test]
fn test_parent_cycle_is_skipped() {
    let tracker = MemoryTracker::with_tasks([
        rec("A").parent("B").status("blocked").build(),
        rec("B").parent("A").status("blocked").build(),
        rec("C").parent("A").build(),
    ]);
    let mut builder = GraphBuilder::new(&tracker);
    let snapshot = builder.build(&RunContext::default()).unwrap();

    assert!(snapshot.ready.is_empty());
    assert_eq!(snapshot.skipped.len(), 1);
    assert!(snapshot.skipped[0].reason.contains("cycle"));
}

#[test]
fn test_in_progress_only_when_resuming() {
    let tracker = MemoryTracker::with_tasks([
        rec("E").build(),
        rec("A").parent("E").status("in_progress").build(),
    ]);
    let mut builder = GraphBuilder::new(&tracker);

    let snapshot = builder.build(&RunContext::default()).unwrap();
    assert!(snapshot.in_progress.is_empty());

    let resume = RunContext {
        resume: true,
        ..Default::default()
    };
    let snapshot = builder.build(&resume).unwrap();
    assert_eq!(snapshot.in_progress.len(), 1);
    assert_eq!(snapshot.in_progress[0].id, "A");
    assert_eq!(snapshot.in_progress[0].depth, 1);
}

#[test]
fn test_done_dependencies_are_collected() {
    let tracker = MemoryTracker::with_tasks([
        rec("D1").status("closed").build(),
        rec("D2").status("in_progress").build(),
        rec("A").deps(&["D1"]).build(),
        rec("B").status("in_progress").deps(&["D1", "D2", "ghost"]).build(),
    ]);
    let mut builder = GraphBuilder::new(&tracker);
    let ctx = RunContext {
        resume: true,
        ..Default::default()
    };
    let snapshot = builder.build(&ctx).unwrap();

    assert!(snapshot.done_ids.contains("D1"));
    assert!(!snapshot.done_ids.contains("D2"));
    assert!(!snapshot.done_ids.contains("ghost"));
}

#[test]
fn test_literal_label_is_passed_to_tracker() {
    let tracker = backlog();
    let mut builder = GraphBuilder::new(&tracker);
    let ctx = RunContext {
        label_filter: Some(LabelFilter::new("agent:backend").unwrap()),
        ..Default::default()
    };
    let snapshot = builder.build(&ctx).unwrap();

    let ids: Vec<&str> = snapshot.ready.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec!["S1"]);
}

#[test]
fn test_exclude_removes_attempted() {
    let tracker = backlog();
    let mut builder = GraphBuilder::new(&tracker);
    let mut snapshot = builder.build(&RunContext::default()).unwrap();

    snapshot.exclude(&BTreeSet::from(["S1".to_string(), "E".to_string()]));
    let ids: Vec<&str> = snapshot.ready.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec!["S2", "T"]);
}

#[test]
fn test_unavailable_tracker_is_fatal() {
    let tracker = backlog();
    tracker.set_unavailable(true);
    let mut builder = GraphBuilder::new(&tracker);

    let err = builder.build(&RunContext::default()).unwrap_err();
    assert!(err.is_fatal());
}
