//! Terminal DOM: slotmap-backed node tree, attributes, inline styles.

pub mod node;
pub mod style;
pub mod tree;

pub use node::{ElementData, NodeId, NodeKind};
pub use style::InlineStyle;
pub use tree::Document;
