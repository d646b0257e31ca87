//! Shared DOM update model for the document-loading pipeline.
//! The parser emits batched tree edits over a channel; subscribers (the
//! content sink, inspectors) mirror those edits into their own state.

use anyhow::Result;

pub mod mirror;
pub use mirror::UpdateMirror;

/// A 64-bit stable key identifying a DOM node across update batches.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct NodeKey(pub u64);

impl NodeKey {
    /// The document root key (always present).
    pub const ROOT: NodeKey = NodeKey(0);
}

/// A batchable edit applied to the document tree and mirrored to subscribers.
#[derive(Debug, Clone)]
pub enum DOMUpdate {
    InsertElement { parent: NodeKey, node: NodeKey, tag: String, pos: usize },
    InsertText { parent: NodeKey, node: NodeKey, text: String, pos: usize },
    SetAttr { node: NodeKey, name: String, value: String },
    RemoveNode { node: NodeKey },
    EndOfDocument,
}

/// A subscriber that receives DOMUpdate values and mirrors them into its own state.
pub trait DOMSubscriber {
    /// Apply a single DOMUpdate to the subscriber state.
    fn apply_update(&mut self, update: DOMUpdate) -> Result<()>;
}
