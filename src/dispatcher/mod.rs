//! Update dispatch module.
//!
//! Drives the update stream and tracks how incoming messages were handled.

mod runner;
mod state;

pub use runner::{Dispatcher, DispatcherMessage};
pub use state::{DispatchStats, Outcome};
