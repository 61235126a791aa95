//! Rendering pipeline: paint widgets into frames, diff frames, write the
//! changed cells through the terminal driver.

pub mod compositor;
pub mod driver;
pub mod paint;
pub mod strip;

pub use compositor::{CellUpdate, Compositor};
pub use driver::{parse_color, Driver};
pub use paint::paint_tree;
pub use strip::{CellStyle, Strip, StyledCell};
