//! Terminal UI module using ratatui.
//!
//! - `render`: frame layout, status bar and overlays
//! - `input`: keyboard handling
//! - `styles`: colors and text styles
//! - `tabs`: per-tab content (teams, tryouts, roster, players)

pub mod input;
pub mod render;
pub mod styles;
pub mod tabs;
