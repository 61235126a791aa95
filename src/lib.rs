//! # termweave
//!
//! A DOM-style reconciler for terminal widget trees. Compiled component code
//! mutates a lightweight node tree through [`Runtime`]; the reconciler turns
//! those mutations into widget create/update/attach/destroy operations, a
//! flexbox bridge computes geometry, and a hit grid routes SGR mouse input
//! and focus back to DOM listeners.
//!
//! ## Core Systems
//!
//! - **[`dom`]**: slotmap node arena and the inline style mini-language
//! - **[`widget`]**: widget kinds, typed props and the adapter layer
//! - **[`reconciler`]**: pending operations, eager and batched flushing
//! - **[`layout`]**: taffy solver plus an analytic flex fallback
//! - **[`event`]**: input parsing, hit grid, mouse routing, focus, listeners
//! - **[`scheduler`]**: render coalescing and the next-tick queue
//! - **[`render`]**: painting, frame diffing and the crossterm driver
//! - **[`runtime`]**: the context object tying it together
//! - **[`app`]**: terminal bootstrap and the async event loop

// Foundation
pub mod error;
pub mod geometry;
pub mod logging;

// Core systems
pub mod dom;
pub mod layout;
pub mod reconciler;
pub mod widget;

// Input and scheduling
pub mod event;
pub mod scheduler;

// Rendering
pub mod render;

// Application
pub mod app;
pub mod runtime;
pub mod testing;

pub use app::{App, AppConfig};
pub use dom::{Document, NodeId};
pub use error::{AppError, DomError};
pub use event::{DomEvent, EventKind};
pub use reconciler::FlushMode;
pub use runtime::{Runtime, RuntimeOptions};
pub use widget::{Theme, WidgetKind};
