//! Output formatting module
//!
//! Rich terminal output with colors and tables, or JSON.

pub mod json;
pub mod results;
pub mod tables;

pub use json::{print_json, to_json};
pub use results::{format_test_result, print_test_result};

use crate::models::TestResult;

/// How results are presented
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Terminal { verbose: bool },
    Json,
    Quiet,
}

/// Print results in the chosen mode
pub fn emit(results: &[TestResult], mode: OutputMode) -> anyhow::Result<()> {
    match mode {
        OutputMode::Json => print_json(results)?,
        OutputMode::Terminal { verbose } => {
            for result in results {
                print_test_result(result, verbose);
            }
        }
        OutputMode::Quiet => {}
    }
    Ok(())
}
