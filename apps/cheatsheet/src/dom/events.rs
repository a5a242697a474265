use crate::dom::document::Document;
use crate::dom::node::NodeId;

/// A click on `target`, dispatched at document level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClickEvent {
    pub target: NodeId,
}

/// A document-level click listener. Listeners see every click and decide from
/// the target whether it concerns them, so content inserted after the
/// listener was attached is handled the same as content that was already there.
pub trait ClickListener: Send + Sync {
    /// Stable name, used to keep a listener from being attached twice.
    fn name(&self) -> &str;

    fn handle(&self, document: &mut Document, event: &ClickEvent);
}
