//! UI panels of the facesym GUI.

pub mod preview;
pub mod status_bar;
