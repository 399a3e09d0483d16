//! # degit CLI
//!
//! This is the binary entry point for the `degit` command-line tool.
//!
//! The core logic lives in the `degit` library crate; the binary parses
//! arguments with `clap`, prints lifecycle events, and turns a failed clone
//! into a red `! message` line and exit status 1.

mod cli;

use std::process::ExitCode;

use clap::Parser;

fn main() -> ExitCode {
    cli::Cli::parse().run()
}
