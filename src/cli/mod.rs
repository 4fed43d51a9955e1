//! CLI command handlers.
//!
//! This module contains the implementation of each CLI subcommand, separated
//! from the argument parsing in main.rs.

mod convert;
mod formats;
mod identify;

pub use convert::{run_convert, DEFAULT_DESTINATION};
pub use formats::run_formats;
pub use identify::run_identify;
