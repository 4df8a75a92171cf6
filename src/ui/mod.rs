//! Interactive terminal session.
//!
//! - `loop_runner` - Main event loop and command dispatch
//! - `input` - Command line parsing
//! - `page_file` - Atomic writes of the rendered page

mod input;
mod loop_runner;
mod page_file;

pub use input::{parse_command, Command, CommandError, HELP_TEXT};
pub use loop_runner::{handle_command, run, run_with, summary, Action, SessionOptions, ShutdownRx};
pub use page_file::atomic_write;
