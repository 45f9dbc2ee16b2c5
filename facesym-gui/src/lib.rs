//! Desktop GUI for the face symmetry analyzer (Library).

pub mod app;
pub mod core;
pub mod theme;
pub mod types;
pub mod ui;

// Re-export types for convenience
pub use types::*;
