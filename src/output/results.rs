//! Render TestResult/DetailSection to terminal

use crate::models::{CheckStatus, DetailSection, TestResult};
use crate::output::tables;
use console::style;

/// Format a full test result to a string.
///
/// Without `verbose` only the status line, test steps and recommendations are
/// shown; detail sections (key types, extracted PEM text) need `verbose`.
pub fn format_test_result(result: &TestResult, verbose: bool) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "  {} {} {} {}\n",
        status_icon(result.status),
        status_label(result.status),
        style(&result.title).bold(),
        style(&result.summary).dim()
    ));

    if verbose {
        for section in &result.details {
            out.push_str(&format_detail_section(section));
        }
    }

    if !result.test_steps.is_empty() {
        out.push('\n');
        for step in &result.test_steps {
            out.push_str(&format!("    {} {}", status_icon(step.status), step.description));
            if let Some(details) = &step.details {
                out.push_str(&format!(" {}", style(format!("({})", details)).dim()));
            }
            out.push('\n');
        }
    }

    if !result.recommendations.is_empty() {
        out.push('\n');
        out.push_str(&format!(
            "    {}\n",
            style("Recommendations:").yellow().bold()
        ));
        for rec in &result.recommendations {
            out.push_str(&format!("    {} {}\n", style("→").yellow(), rec));
        }
    }

    out.push('\n');
    out
}

/// Print a full test result
pub fn print_test_result(result: &TestResult, verbose: bool) {
    print!("{}", format_test_result(result, verbose));
}

fn format_detail_section(section: &DetailSection) -> String {
    let mut out = String::new();
    match section {
        DetailSection::KeyValue { title, pairs } => {
            push_title(&mut out, title);
            let max_key_len = pairs.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
            for (key, value) in pairs {
                let dots = ".".repeat(max_key_len.saturating_sub(key.len()) + 2);
                out.push_str(&format!(
                    "    {} {} {}\n",
                    style(key).dim(),
                    style(dots).dim(),
                    value
                ));
            }
        }
        DetailSection::Table {
            title,
            headers,
            rows,
        } => {
            push_title(&mut out, title);
            out.push_str(&tables::format_table(headers, rows));
        }
        DetailSection::Text { title, content } => {
            push_title(&mut out, title);
            for line in content.lines() {
                out.push_str(&format!("      {}\n", line));
            }
        }
    }
    out
}

fn push_title(out: &mut String, title: &Option<String>) {
    if let Some(t) = title {
        out.push('\n');
        out.push_str(&format!("    {}\n", style(t).bold()));
    }
}

fn status_icon(status: CheckStatus) -> console::StyledObject<&'static str> {
    match status {
        CheckStatus::Pass => style(status.icon()).green(),
        CheckStatus::Warning => style(status.icon()).yellow(),
        CheckStatus::Fail => style(status.icon()).red(),
    }
}

fn status_label(status: CheckStatus) -> console::StyledObject<&'static str> {
    match status {
        CheckStatus::Pass => style(status.label()).green().bold(),
        CheckStatus::Warning => style(status.label()).yellow().bold(),
        CheckStatus::Fail => style(status.label()).red().bold(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TestStep;

    #[test]
    fn test_details_only_when_verbose() {
        console::set_colors_enabled(false);
        let result = TestResult::new("CSR Match", CheckStatus::Pass, "subject and key match")
            .with_detail(DetailSection::key_value(
                Some("Remote CSR".to_string()),
                vec![("Subject".to_string(), "CN=test".to_string())],
            ))
            .with_step(TestStep::pass("Same subject"));

        let short = format_test_result(&result, false);
        assert!(short.contains("PASS"));
        assert!(short.contains("Same subject"));
        assert!(!short.contains("CN=test"));

        let long = format_test_result(&result, true);
        assert!(long.contains("CN=test"));
    }
}
