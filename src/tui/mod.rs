//! TUI module: Terminal User Interface using Ratatui.
//!
//! Screens:
//! - Home with model and dataset status
//! - Soil sample input
//! - Recommendation with ranked crops
//! - Dataset exploration

mod app;
mod styles;
mod ui;

pub use app::{App, Screen};
pub use styles::AgroTheme;
