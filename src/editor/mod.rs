//! Editor Module
//!
//! Editing session over one v.in file and the settings that drive it.

mod session;
mod settings;

pub use session::{BatchReport, Direction, EditSession};
pub use settings::EditSettings;
