//! The layout-start gate: a blocker count, a force flag, and a one-shot latch.

use log::{debug, warn};

/// Tracks outstanding reasons to delay a document's first layout pass and
/// decides the single moment that pass may begin.
///
/// Collaborators that need layout deferred add a blocker before starting
/// their deferred work and release it when that work concludes; unrelated
/// call sites each own one matching add/release pair and never need to know
/// about each other. The gate opens when the count returns to zero on a
/// release, when an authority forces it, or on the first explicit
/// evaluation of a gate that was never blocked. Opening is latched: the
/// verdict handed back to the caller is `true` at most once per gate, and
/// the latch is set before the caller can run the layout-start action, so a
/// release issued from inside that action cannot fire it a second time.
#[derive(Debug, Default, Clone)]
pub struct LayoutGate {
    /// Outstanding block requests not yet released.
    outstanding: u32,
    /// Once set, layout is permitted regardless of outstanding blockers.
    forced: bool,
    /// Set the moment the gate opens; never reverts.
    started: bool,
    /// Telemetry: total blockers ever added.
    blockers_added_total: u64,
    /// Telemetry: highest number of simultaneously outstanding blockers.
    outstanding_high_water: u32,
    /// Telemetry: releases observed with no matching add.
    unbalanced_releases: u64,
}

impl LayoutGate {
    /// Create a gate with no blockers outstanding and layout not yet started.
    pub fn new() -> Self {
        Self::default()
    }

    /// Defer layout (unless forced) for at least one more release. Always
    /// succeeds; each call requires its own matching `remove_blocker`.
    pub fn add_blocker(&mut self) {
        self.outstanding = self.outstanding.saturating_add(1);
        self.blockers_added_total = self.blockers_added_total.saturating_add(1);
        self.outstanding_high_water = self.outstanding_high_water.max(self.outstanding);
    }

    /// Undo one `add_blocker` call. Returns `true` when this release opened
    /// the gate; the caller must then run the layout-start action.
    ///
    /// Releasing with no blockers outstanding is a caller bug: fatal in
    /// debug builds; in release builds the count is clamped at zero and the
    /// open condition is still evaluated so layout can still start.
    #[must_use]
    pub fn remove_blocker(&mut self) -> bool {
        debug_assert!(
            self.outstanding > 0,
            "layout blocker released with none outstanding"
        );
        if self.outstanding == 0 {
            warn!("Layout blocker released with none outstanding; clamping");
            self.unbalanced_releases = self.unbalanced_releases.saturating_add(1);
        } else {
            self.outstanding -= 1;
        }
        self.try_open()
    }

    /// Permit layout regardless of outstanding blockers. Returns `true` when
    /// this call opened the gate. Idempotent, and a no-op once open.
    #[must_use]
    pub fn force(&mut self) -> bool {
        self.forced = true;
        self.try_open()
    }

    /// Evaluate the open condition without releasing anything. Opens a gate
    /// that never had a blocker added; returns `true` when this call opened
    /// the gate.
    #[must_use]
    pub fn evaluate(&mut self) -> bool {
        self.try_open()
    }

    /// True while blockers are outstanding and no force has been applied.
    pub fn is_blocked(&self) -> bool {
        self.outstanding > 0 && !self.forced
    }

    /// True once the layout-start verdict has been handed out.
    pub fn started(&self) -> bool {
        self.started
    }

    /// Number of blockers currently outstanding.
    pub fn outstanding(&self) -> u32 {
        self.outstanding
    }

    /// Telemetry: total blockers ever added to this gate.
    pub fn blockers_added_total(&self) -> u64 {
        self.blockers_added_total
    }

    /// Telemetry: highest number of simultaneously outstanding blockers.
    pub fn outstanding_high_water(&self) -> u32 {
        self.outstanding_high_water
    }

    /// Telemetry: releases observed with no matching add.
    pub fn unbalanced_releases(&self) -> u64 {
        self.unbalanced_releases
    }

    /// Open the gate if permitted. The latch is set before the verdict is
    /// returned, so a reentrant call made from within the layout-start
    /// action observes the gate as already open.
    fn try_open(&mut self) -> bool {
        if self.started || self.is_blocked() {
            return false;
        }
        self.started = true;
        debug!(
            "Layout gate opened (forced={}, outstanding={})",
            self.forced, self.outstanding
        );
        true
    }
}
