//! Terminal UI module using ratatui.
//!
//! - `render`: Frame layout, dashboard table and overlays
//! - `input`: Keyboard event handling
//! - `styles`: Color schemes and text styling

pub mod input;
pub mod render;
pub mod styles;
