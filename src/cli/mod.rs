//! Command-line interface module
//!
//! This module handles CLI argument parsing using Clap.

pub mod args;

pub use args::{BlocksArgs, Cli, Command, CsrArgs, PairArgs, ProbeArgs, VerifyArgs};
