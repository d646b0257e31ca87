//! Content sink start scenarios: thresholds, end of document, blockers,
//! forced starts.

use dom::{DOMSubscriber, DOMUpdate, NodeKey};
use sink::{ContentSink, ForceDeadline, LayoutEngine, LayoutStarting, SinkConfig, StartPolicy};
use std::time::Duration;

#[derive(Default)]
struct CountingEngine {
    starts: u32,
}

impl LayoutEngine for CountingEngine {
    fn start_layout(&mut self) {
        self.starts += 1;
    }
}

fn deferred_sink(content_threshold: usize) -> ContentSink<CountingEngine> {
    ContentSink::with_config(
        CountingEngine::default(),
        SinkConfig {
            policy: StartPolicy::Deferred { content_threshold },
        },
    )
}

fn element(key: u64, tag: &str) -> DOMUpdate {
    DOMUpdate::InsertElement {
        parent: NodeKey::ROOT,
        node: NodeKey(key),
        tag: tag.to_string(),
        pos: 0,
    }
}

fn text(key: u64, body: &str) -> DOMUpdate {
    DOMUpdate::InsertText {
        parent: NodeKey::ROOT,
        node: NodeKey(key),
        text: body.to_string(),
        pos: 0,
    }
}

fn init_logs() {
    let _result = env_logger::builder().is_test(true).try_init();
}

#[test]
fn threshold_crossing_starts_layout_once() {
    init_logs();
    let mut sink = deferred_sink(3);
    for key in 1..=2 {
        sink.apply_update(element(key, "div")).unwrap();
        assert!(!sink.layout_started());
    }
    sink.apply_update(element(3, "p")).unwrap();
    assert!(sink.layout_started());
    // Further content keeps flowing but must not start layout again.
    sink.apply_update(element(4, "div")).unwrap();
    sink.apply_update(DOMUpdate::EndOfDocument).unwrap();
    assert_eq!(sink.engine().starts, 1);
    assert_eq!(sink.nodes_consumed(), 4);
}

#[test]
fn short_document_starts_layout_at_end_of_document() {
    let mut sink = deferred_sink(100);
    sink.apply_update(element(1, "html")).unwrap();
    sink.apply_update(text(2, "hello")).unwrap();
    assert!(!sink.layout_started());
    sink.apply_update(DOMUpdate::EndOfDocument).unwrap();
    assert!(sink.layout_started());
    assert!(sink.parsing_finished());
    assert_eq!(sink.engine().starts, 1);
}

#[test]
fn external_blocker_defers_past_the_content_threshold() {
    // A pending-stylesheet style collaborator blocks before content arrives.
    let mut sink = deferred_sink(2);
    sink.add_layout_blocker();
    sink.apply_update(element(1, "div")).unwrap();
    sink.apply_update(element(2, "div")).unwrap();
    assert!(!sink.layout_started());
    assert!(sink.is_blocked());
    sink.remove_layout_blocker();
    assert!(sink.layout_started());
    assert_eq!(sink.engine().starts, 1);
}

#[test]
fn external_blocker_defers_past_end_of_document() {
    let mut sink = deferred_sink(100);
    sink.add_layout_blocker();
    sink.apply_update(element(1, "div")).unwrap();
    sink.apply_update(DOMUpdate::EndOfDocument).unwrap();
    assert!(!sink.layout_started());
    sink.remove_layout_blocker();
    assert!(sink.layout_started());
}

#[test]
fn forced_start_overrides_outstanding_blockers() {
    let mut sink = deferred_sink(100);
    sink.add_layout_blocker();
    sink.apply_update(element(1, "div")).unwrap();
    sink.force_layout();
    assert!(sink.layout_started());
    // The collaborator still releases on its normal path; no second start.
    sink.remove_layout_blocker();
    sink.apply_update(DOMUpdate::EndOfDocument).unwrap();
    assert_eq!(sink.engine().starts, 1);
}

#[test]
fn forcing_twice_is_idempotent() {
    let mut sink = deferred_sink(100);
    sink.force_layout();
    sink.force_layout();
    assert_eq!(sink.engine().starts, 1);
}

#[test]
fn eager_policy_starts_on_first_update() {
    let mut sink = ContentSink::with_config(
        CountingEngine::default(),
        SinkConfig {
            policy: StartPolicy::Eager,
        },
    );
    assert!(!sink.layout_started());
    sink.apply_update(element(1, "html")).unwrap();
    assert!(sink.layout_started());
}

#[test]
fn untouched_sink_never_starts_layout() {
    let sink = deferred_sink(100);
    assert!(!sink.layout_started());
    assert!(sink.is_blocked());
    assert_eq!(sink.engine().starts, 0);
}

#[test]
fn attributes_do_not_advance_content_readiness() {
    let mut sink = deferred_sink(2);
    sink.apply_update(element(1, "div")).unwrap();
    for _ in 0..10 {
        sink.apply_update(DOMUpdate::SetAttr {
            node: NodeKey(1),
            name: "class".to_string(),
            value: "wide".to_string(),
        })
        .unwrap();
    }
    assert!(!sink.layout_started());
    sink.apply_update(text(2, "body text")).unwrap();
    assert!(sink.layout_started());
    assert_eq!(sink.text_bytes_consumed(), "body text".len());
}

#[test]
fn expired_deadline_forces_a_stalled_document() {
    // The embedder's update loop: content stalled below the threshold with a
    // blocker outstanding, so only the deadline authority can start layout.
    let mut sink = deferred_sink(100);
    let mut deadline = ForceDeadline::new(Duration::ZERO);
    sink.add_layout_blocker();
    sink.apply_update(element(1, "div")).unwrap();
    deadline.arm();
    assert!(!sink.layout_started());
    if deadline.expired() {
        sink.force_layout();
    }
    assert!(sink.layout_started());
    assert_eq!(sink.engine().starts, 1);
}
