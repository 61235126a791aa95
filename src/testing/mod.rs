//! Headless testing: the [`Pilot`] input driver and snapshot helpers.

pub mod pilot;
pub mod snapshot;

pub use pilot::Pilot;
pub use snapshot::{render_to_string, screen_to_string, strips_to_string};
