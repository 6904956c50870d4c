// ABOUTME: Command implementations for each run mode
// ABOUTME: Exports analyze and dump commands

pub mod analyze;
pub mod dump;

pub use analyze::analyze;
pub use dump::{dump, DumpOptions};
