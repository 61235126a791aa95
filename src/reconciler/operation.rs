//! Queued widget operations.

use crate::dom::{Document, NodeId};
use crate::widget::PropBag;

/// A widget-side operation queued by a DOM mutation and applied at the next
/// flush. The DOM itself was already mutated when the operation was queued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingOperation {
    /// Materialize the widget for a freshly created element.
    Create { node: NodeId },
    /// Bring an element's widget to the `new` property bag. `old` is the bag
    /// the DOM held before the mutation; it is informational only, the
    /// reconciler diffs against the props actually applied.
    Update { node: NodeId, old: PropBag, new: PropBag },
    /// `node` was removed from `parent`.
    Delete { node: NodeId, parent: NodeId },
    /// `child` was appended to `parent`.
    Append { parent: NodeId, child: NodeId },
    /// `child` was inserted into `parent` before `before`.
    Insert {
        parent: NodeId,
        child: NodeId,
        before: Option<NodeId>,
    },
    /// `new` took the place of `old` under `parent`.
    Replace { parent: NodeId, old: NodeId, new: NodeId },
}

impl PendingOperation {
    /// The node whose widget the operation affects.
    pub fn target(&self) -> NodeId {
        match self {
            Self::Create { node } | Self::Update { node, .. } | Self::Delete { node, .. } => *node,
            Self::Append { child, .. } | Self::Insert { child, .. } => *child,
            Self::Replace { new, .. } => *new,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Create { .. } => "create",
            Self::Update { .. } => "update",
            Self::Delete { .. } => "delete",
            Self::Append { .. } => "append",
            Self::Insert { .. } => "insert",
            Self::Replace { .. } => "replace",
        }
    }
}

/// Property bag the widget of `node` should carry: the element's attributes,
/// plus `content` folded from its direct text children when it has any.
pub fn element_props(document: &Document, node: NodeId) -> PropBag {
    let Some(element) = document.element(node) else {
        return PropBag::new();
    };
    let mut props = element.attributes.clone();
    if document.has_text_children(node) {
        props.insert("content".to_owned(), document.text_content(node));
    }
    props
}
