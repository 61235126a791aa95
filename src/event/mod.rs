//! Input and routing: raw input parsing, hit-testing, mouse dispatch, focus,
//! key bindings and the DOM listener table.

pub mod binding;
pub mod focus;
pub mod handlers;
pub mod hit_grid;
pub mod input;
pub mod mouse;
pub mod parser;

pub use binding::{BindingAction, KeyBindingRegistry};
pub use focus::{FocusChange, FocusContext};
pub use handlers::{DomEvent, EventKind, EventTable, Handler};
pub use hit_grid::HitGrid;
pub use input::{InputEvent, Key, KeyEvent, Modifiers, MouseAction, MouseButton, MouseEvent};
pub use mouse::{MouseDispatch, MouseRouter};
pub use parser::InputParser;
