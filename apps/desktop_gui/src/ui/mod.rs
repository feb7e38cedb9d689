//! UI layer for desktop GUI: app shell and the result chart widget.

pub mod app;
pub mod chart;

pub use app::SimFormApp;
