//! Consumption-side mirror that drains batched updates into a subscriber.

use crate::{DOMSubscriber, DOMUpdate};
use anyhow::Result;
use log::warn;
use tokio::sync::broadcast;

/// Drains batched `DOMUpdate`s from the parser's broadcast channel into a
/// subscriber. A lagging receiver skips the overwritten batches and keeps
/// going; the parser remains the source of truth for document completeness.
pub struct UpdateMirror<T: DOMSubscriber> {
    updates: broadcast::Receiver<Vec<DOMUpdate>>,
    mirror: T,
}

impl<T: DOMSubscriber> UpdateMirror<T> {
    /// Create a mirror wrapping a subscriber implementation.
    pub fn new(updates: broadcast::Receiver<Vec<DOMUpdate>>, mirror: T) -> Self {
        Self { updates, mirror }
    }

    /// Drain and apply all currently pending update batches.
    ///
    /// # Errors
    ///
    /// Returns an error if the subscriber fails to apply an update.
    pub fn update(&mut self) -> Result<()> {
        use tokio::sync::broadcast::error::TryRecvError;
        loop {
            match self.updates.try_recv() {
                Ok(batch) => {
                    for update in batch {
                        self.mirror.apply_update(update)?;
                    }
                }
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!("Update mirror lagged; {skipped} batches skipped");
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => break,
            }
        }
        Ok(())
    }

    /// Apply update batches until the parser side closes the channel.
    ///
    /// # Errors
    ///
    /// Returns an error if the subscriber fails to apply an update.
    pub async fn run_until_closed(&mut self) -> Result<()> {
        use tokio::sync::broadcast::error::RecvError;
        loop {
            match self.updates.recv().await {
                Ok(batch) => {
                    for update in batch {
                        self.mirror.apply_update(update)?;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Update mirror lagged; {skipped} batches skipped");
                }
                Err(RecvError::Closed) => break,
            }
        }
        Ok(())
    }

    /// Read-only access to the wrapped subscriber.
    pub fn mirror(&self) -> &T {
        &self.mirror
    }

    /// Mutable access to the wrapped subscriber.
    pub fn mirror_mut(&mut self) -> &mut T {
        &mut self.mirror
    }

    /// Consume the mirror, returning the subscriber.
    pub fn into_inner(self) -> T {
        self.mirror
    }
}
