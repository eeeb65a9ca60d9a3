//! JSON output formatter

use crate::models::TestResult;
use serde::Serialize;

/// JSON document printed with `--json`
#[derive(Serialize)]
pub struct JsonOutput<'a> {
    pub passed: bool,
    pub results: &'a [TestResult],
}

/// Render results as pretty JSON
pub fn to_json(results: &[TestResult]) -> serde_json::Result<String> {
    let output = JsonOutput {
        passed: results.iter().all(TestResult::passed),
        results,
    };
    serde_json::to_string_pretty(&output)
}

/// Print results as JSON to stdout
pub fn print_json(results: &[TestResult]) -> anyhow::Result<()> {
    println!("{}", to_json(results)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CheckStatus;

    #[test]
    fn test_json_reports_overall_verdict() {
        let results = vec![
            TestResult::new("Key Pair", CheckStatus::Pass, "match"),
            TestResult::new("CSR", CheckStatus::Fail, "mismatch")
                .with_data(serde_json::json!({ "same_der": false })),
        ];

        let parsed: serde_json::Value = serde_json::from_str(&to_json(&results).unwrap()).unwrap();
        assert_eq!(parsed["passed"], false);
        assert_eq!(parsed["results"][0]["status"], "pass");
        assert_eq!(parsed["results"][1]["data"]["same_der"], false);
        assert!(parsed["results"][0].get("data").is_none());
    }
}
