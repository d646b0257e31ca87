//! Scoped layout blocker that releases on every exit path.

use crate::LayoutStarting;

/// Holds one layout blocker on a sink for the guard's lifetime.
///
/// The blocker is added on construction and released on drop, so early
/// returns and failure paths cannot leak a block. Deferred work that spans
/// a scope should prefer this over calling the capability directly.
pub struct BlockerGuard<'sink, S: LayoutStarting + ?Sized> {
    sink: &'sink mut S,
}

impl<'sink, S: LayoutStarting + ?Sized> BlockerGuard<'sink, S> {
    /// Add a blocker to `sink`, held until the guard drops.
    pub fn new(sink: &'sink mut S) -> Self {
        sink.add_layout_blocker();
        Self { sink }
    }

    /// Access the guarded sink; the blocker stays held.
    pub fn sink(&mut self) -> &mut S {
        self.sink
    }
}

impl<S: LayoutStarting + ?Sized> Drop for BlockerGuard<'_, S> {
    fn drop(&mut self) {
        self.sink.remove_layout_blocker();
    }
}
