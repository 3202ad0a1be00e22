//! Command-line interface for study-streamliner.
//!
//! Parses the topic and difficulty, runs the session and prints plan,
//! lesson, quiz and grade report to the console.

mod commands;
mod report;

pub use commands::{parse_cli, run, run_with_cli, Cli};
pub use report::{ConsoleReporter, LESSON_PREVIEW_CHARS, RAW_OUTPUT_PREVIEW_CHARS};
