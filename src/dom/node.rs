//! Node types: NodeId, NodeKind, ElementData.

use std::collections::BTreeMap;

use slotmap::new_key_type;

use crate::widget::WidgetId;

new_key_type! {
    /// Identity of a DOM node. Copy, lightweight (u64), stale after destruction.
    pub struct NodeId;
}

/// DOM `nodeType` numbers, kept for parity with the DOM connector contract.
pub const ELEMENT_NODE: u8 = 1;
pub const TEXT_NODE: u8 = 3;
pub const COMMENT_NODE: u8 = 8;
pub const DOCUMENT_FRAGMENT_NODE: u8 = 11;

/// Element payload: tag, attributes and the materialized widget handle.
#[derive(Debug, Clone, Default)]
pub struct ElementData {
    /// Tag name, which selects the widget kind.
    pub tag: String,
    /// Attribute map. Order is irrelevant.
    pub attributes: BTreeMap<String, String>,
    /// Widget created for this element at flush time, if any.
    pub widget: Option<WidgetId>,
}

impl ElementData {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: BTreeMap::new(),
            widget: None,
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }
}

/// The closed set of DOM node variants.
#[derive(Debug, Clone)]
pub enum NodeKind {
    Element(ElementData),
    Text(String),
    Comment(String),
    Fragment,
}

impl NodeKind {
    /// The DOM `nodeType` number for this variant.
    pub fn node_type(&self) -> u8 {
        match self {
            NodeKind::Element(_) => ELEMENT_NODE,
            NodeKind::Text(_) => TEXT_NODE,
            NodeKind::Comment(_) => COMMENT_NODE,
            NodeKind::Fragment => DOCUMENT_FRAGMENT_NODE,
        }
    }

    /// Human-readable variant name, used in error messages.
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Element(_) => "element",
            NodeKind::Text(_) => "text",
            NodeKind::Comment(_) => "comment",
            NodeKind::Fragment => "fragment",
        }
    }

    /// Whether this variant may own children.
    pub fn is_container(&self) -> bool {
        matches!(self, NodeKind::Element(_) | NodeKind::Fragment)
    }

    pub fn as_element(&self) -> Option<&ElementData> {
        match self {
            NodeKind::Element(data) => Some(data),
            _ => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut ElementData> {
        match self {
            NodeKind::Element(data) => Some(data),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            NodeKind::Text(value) => Some(value),
            _ => None,
        }
    }
}
