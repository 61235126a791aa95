//! Error taxonomy.
//!
//! Only [`DomError`] crosses the public contract boundary. Adapter, structural
//! and layout errors are caught inside a flush or a layout pass, logged, and
//! the work continues with the next operation.

use std::io;

use thiserror::Error;

use crate::dom::NodeId;

/// Programmer errors at the DOM-mutation contract. These fail fast.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomError {
    #[error("{op}: node {node:?} does not exist")]
    UnknownNode { op: &'static str, node: NodeId },

    #[error("insertBefore: reference node is not a child of parent")]
    ReferenceNotAChild,

    #[error("replaceChild: node to be replaced is not a child of parent")]
    ReplacedNotAChild,

    #[error("{op}: cannot insert a node into itself or one of its descendants")]
    HierarchyRequest { op: &'static str },

    #[error("{op}: node {node:?} is not an element")]
    NotAnElement { op: &'static str, node: NodeId },

    #[error("{op}: node {node:?} is not a text node")]
    NotText { op: &'static str, node: NodeId },

    #[error("{op}: {kind} nodes cannot have children")]
    LeafParent { op: &'static str, kind: &'static str },
}

/// A widget kind rejected a property value.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AdapterError {
    #[error("invalid value {value:?} for property '{key}': {reason}")]
    InvalidProp {
        key: String,
        value: String,
        reason: &'static str,
    },
}

/// Per-operation failures inside a reconciler flush. Never escape the flush.
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("node {0:?} has no materialized widget")]
    MissingWidget(NodeId),

    #[error("parent {0:?} has no materialized widget")]
    MissingParentWidget(NodeId),

    #[error("node {0:?} no longer exists")]
    StaleNode(NodeId),

    #[error(transparent)]
    Adapter(#[from] AdapterError),
}

/// Layout solver failures. Never escape a layout pass.
#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("layout solver error: {0}")]
    Solver(#[from] taffy::TaffyError),

    #[error("no space left for children of {0:?}")]
    NoSpace(NodeId),
}

/// Failures at the application bootstrap boundary.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("terminal i/o: {0}")]
    Io(#[from] io::Error),

    #[error("could not install log subscriber: {0}")]
    Logging(String),
}
