//! Widget adapter layer: kinds, typed props, the widget tree, and the
//! create/update adapters that project DOM elements onto widgets.

pub mod adapter;
pub mod controls;
pub mod element;
pub mod kind;
pub mod props;

pub use element::{KindState, TerminalElement, Widget, WidgetId, WidgetTree};
pub use kind::WidgetKind;
pub use props::{BorderStyle, CommonProps, PropBag, PropChanges, Theme, WidgetStyle};
