//! Non-UI logic of the GUI: background jobs and settings.

pub mod jobs;
pub mod settings;
