//! Content sink that gates a document's first layout pass.
//!
//! The sink consumes batched DOM updates from the parser, counts the content
//! it has seen, and holds the document's layout-start gate closed until its
//! start policy is satisfied and every collaborator's blocker is released,
//! or until an external authority forces the issue. The layout engine is
//! invoked exactly once per document load, whatever order those events
//! arrive in.

use anyhow::Result;
use dom::{DOMSubscriber, DOMUpdate};
use log::{debug, trace};

pub mod deadline;
pub mod gate;
pub mod guard;

pub use deadline::ForceDeadline;
pub use gate::LayoutGate;
pub use guard::BlockerGuard;

/// Collaborator that performs the document's first layout pass.
///
/// Invoked at most once per sink; implementations do not need to guard
/// against re-entry themselves.
pub trait LayoutEngine {
    /// Begin the first layout pass for the document this sink owns.
    fn start_layout(&mut self);
}

/// The layout-start capability exposed to any collaborator holding a
/// reference to the sink.
///
/// A subsystem that needs layout deferred (a resource preloader, a scripted
/// defer mechanism) adds a blocker before starting its deferred work and
/// releases it unconditionally when that work concludes, success or failure.
/// [`BlockerGuard`] does the release automatically. Both operations are
/// infallible by contract.
pub trait LayoutStarting {
    /// Defer layout start (unless forced) for at least one more release.
    /// Each call requires its own matching `remove_layout_blocker`.
    fn add_layout_blocker(&mut self);

    /// Undo one `add_layout_blocker` call. Releasing the last outstanding
    /// blocker synchronously starts layout.
    fn remove_layout_blocker(&mut self);
}

/// When the sink considers enough content consumed to release its own
/// readiness blocker.
#[derive(Debug, Clone, Copy)]
pub enum StartPolicy {
    /// Release on the first applied update.
    Eager,
    /// Release once this many content nodes have been consumed.
    Deferred { content_threshold: usize },
}

/// Sink configuration.
#[derive(Debug, Clone, Copy)]
pub struct SinkConfig {
    pub policy: StartPolicy,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            policy: StartPolicy::Deferred {
                content_threshold: 100,
            },
        }
    }
}

/// Content sink owning one document load's layout-start gate.
///
/// The sink always holds one blocker of its own, the readiness blocker,
/// added at construction and released once the start policy is satisfied or
/// the document ends. Under this discipline a freshly created sink is
/// blocked until acted upon, and a document with no other blockers starts
/// layout the moment enough of it has been consumed.
pub struct ContentSink<E: LayoutEngine> {
    engine: E,
    gate: LayoutGate,
    policy: StartPolicy,
    /// Whether the sink still holds its own readiness blocker.
    readiness_blocker_held: bool,
    /// Content nodes (elements and text runs) consumed so far.
    nodes_consumed: usize,
    /// Text bytes consumed so far.
    text_bytes_consumed: usize,
    end_of_document: bool,
    /// Telemetry: total updates applied to this sink.
    updates_applied: u64,
}

impl<E: LayoutEngine> ContentSink<E> {
    /// Create a sink with the default deferred start policy.
    pub fn new(engine: E) -> Self {
        Self::with_config(engine, SinkConfig::default())
    }

    /// Create a sink with an explicit configuration.
    pub fn with_config(engine: E, config: SinkConfig) -> Self {
        let mut gate = LayoutGate::new();
        // The sink's readiness blocker: released by the start policy.
        gate.add_blocker();
        Self {
            engine,
            gate,
            policy: config.policy,
            readiness_blocker_held: true,
            nodes_consumed: 0,
            text_bytes_consumed: 0,
            end_of_document: false,
            updates_applied: 0,
        }
    }

    /// Permit layout regardless of outstanding blockers. For external
    /// authorities such as a load timeout or an explicit user navigation;
    /// pending blockers keep their release obligations but lose their veto.
    pub fn force_layout(&mut self) {
        if self.gate.force() {
            self.begin_layout();
        }
    }

    /// True once the first layout pass has been started.
    pub fn layout_started(&self) -> bool {
        self.gate.started()
    }

    /// True while layout remains deferred by outstanding blockers.
    pub fn is_blocked(&self) -> bool {
        self.gate.is_blocked()
    }

    /// Gate state, for diagnostics.
    pub fn gate(&self) -> &LayoutGate {
        &self.gate
    }

    /// Content nodes consumed so far.
    pub fn nodes_consumed(&self) -> usize {
        self.nodes_consumed
    }

    /// Text bytes consumed so far.
    pub fn text_bytes_consumed(&self) -> usize {
        self.text_bytes_consumed
    }

    /// Whether the parser has signalled the end of the document.
    pub fn parsing_finished(&self) -> bool {
        self.end_of_document
    }

    /// Telemetry: total updates applied to this sink.
    pub fn updates_applied(&self) -> u64 {
        self.updates_applied
    }

    /// Read-only access to the layout engine.
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Mutable access to the layout engine.
    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    /// Consume the sink, returning the layout engine.
    pub fn into_engine(self) -> E {
        self.engine
    }

    fn begin_layout(&mut self) {
        debug!(
            "Starting layout after {} nodes, {} text bytes",
            self.nodes_consumed, self.text_bytes_consumed
        );
        self.engine.start_layout();
    }

    /// Release the readiness blocker once, recording why.
    fn release_readiness_blocker(&mut self, reason: &str) {
        if !self.readiness_blocker_held {
            return;
        }
        self.readiness_blocker_held = false;
        debug!(
            "Content readiness reached ({reason}) after {} nodes",
            self.nodes_consumed
        );
        if self.gate.remove_blocker() {
            self.begin_layout();
        }
    }

    /// Whether the start policy is satisfied by the content seen so far.
    fn content_ready(&self) -> bool {
        if self.end_of_document {
            return true;
        }
        match self.policy {
            StartPolicy::Eager => true,
            StartPolicy::Deferred { content_threshold } => {
                self.nodes_consumed >= content_threshold
            }
        }
    }
}

impl<E: LayoutEngine> LayoutStarting for ContentSink<E> {
    fn add_layout_blocker(&mut self) {
        self.gate.add_blocker();
        trace!(
            "Layout blocker added; {} outstanding",
            self.gate.outstanding()
        );
    }

    fn remove_layout_blocker(&mut self) {
        if self.gate.remove_blocker() {
            self.begin_layout();
        }
    }
}

impl<E: LayoutEngine> DOMSubscriber for ContentSink<E> {
    fn apply_update(&mut self, update: DOMUpdate) -> Result<()> {
        self.updates_applied = self.updates_applied.saturating_add(1);
        match update {
            DOMUpdate::InsertElement { node, tag, .. } => {
                trace!("InsertElement node={node:?} tag={tag}");
                self.nodes_consumed = self.nodes_consumed.saturating_add(1);
            }
            DOMUpdate::InsertText { node, text, .. } => {
                trace!("InsertText node={node:?} len={}", text.len());
                self.nodes_consumed = self.nodes_consumed.saturating_add(1);
                self.text_bytes_consumed = self.text_bytes_consumed.saturating_add(text.len());
            }
            DOMUpdate::SetAttr { node, name, .. } => {
                // Attributes do not advance content readiness.
                trace!("SetAttr node={node:?} name={name}");
            }
            DOMUpdate::RemoveNode { node } => {
                trace!("RemoveNode node={node:?}");
            }
            DOMUpdate::EndOfDocument => {
                debug!("EndOfDocument after {} updates", self.updates_applied);
                self.end_of_document = true;
            }
        }
        if self.content_ready() {
            let reason = if self.end_of_document {
                "end of document"
            } else {
                "start policy satisfied"
            };
            self.release_readiness_blocker(reason);
        }
        Ok(())
    }
}
