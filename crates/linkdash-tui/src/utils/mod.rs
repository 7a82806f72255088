//! Display helpers shared by the renderers and headless commands.

pub mod format;

pub use format::*;
