//! # tkit CLI
//!
//! Command-line front end for `tkit-core`: tagged messages, aligned status
//! lines around arbitrary commands, and a tour of the renderers.
//! Run `tkit --help` for usage information.

mod cli;
mod ui;

use std::process::ExitCode;

fn main() -> ExitCode {
    cli::run()
}
