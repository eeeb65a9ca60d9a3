//! Verdict result types shared by the terminal and JSON renderers

use serde::Serialize;

/// Status of a check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Pass,
    Warning,
    Fail,
}

impl CheckStatus {
    /// Status derived from a boolean verdict
    pub fn from_bool(passed: bool) -> Self {
        if passed {
            CheckStatus::Pass
        } else {
            CheckStatus::Fail
        }
    }

    /// Get the icon for this status
    pub fn icon(&self) -> &'static str {
        match self {
            CheckStatus::Pass => "✓",
            CheckStatus::Warning => "⚠",
            CheckStatus::Fail => "✗",
        }
    }

    /// Upper-case label used in summary lines
    pub fn label(&self) -> &'static str {
        match self {
            CheckStatus::Pass => "PASS",
            CheckStatus::Warning => "WARN",
            CheckStatus::Fail => "FAIL",
        }
    }
}

/// A single step within a check
#[derive(Debug, Clone, Serialize)]
pub struct TestStep {
    pub description: String,
    pub status: CheckStatus,
    pub details: Option<String>,
}

impl TestStep {
    /// Create a new passing test step
    pub fn pass(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            status: CheckStatus::Pass,
            details: None,
        }
    }

    /// Create a new warning test step
    pub fn warning(description: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            status: CheckStatus::Warning,
            details: Some(details.into()),
        }
    }

    /// Create a new failing test step
    pub fn fail(description: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            status: CheckStatus::Fail,
            details: Some(details.into()),
        }
    }

    /// Pass or fail depending on `passed`, with the same description
    pub fn check(description: impl Into<String>, passed: bool) -> Self {
        Self {
            description: description.into(),
            status: CheckStatus::from_bool(passed),
            details: None,
        }
    }
}

/// A section of detailed information
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DetailSection {
    /// Key-value pairs
    KeyValue {
        title: Option<String>,
        pairs: Vec<(String, String)>,
    },
    /// Tabular data
    Table {
        title: Option<String>,
        headers: Vec<String>,
        rows: Vec<Vec<String>>,
    },
    /// Free-form text, e.g. an extracted PEM block
    Text {
        title: Option<String>,
        content: String,
    },
}

impl DetailSection {
    /// Create a key-value section
    pub fn key_value(title: Option<String>, pairs: Vec<(String, String)>) -> Self {
        Self::KeyValue { title, pairs }
    }

    /// Create a table section
    pub fn table(title: Option<String>, headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self::Table {
            title,
            headers,
            rows,
        }
    }

    /// Create a text section
    pub fn text(title: Option<String>, content: String) -> Self {
        Self::Text { title, content }
    }
}

/// Outcome of one verdict (key pair, CSR pair, probe)
#[derive(Debug, Clone, Serialize)]
pub struct TestResult {
    pub title: String,
    pub status: CheckStatus,
    /// One-line summary
    pub summary: String,
    pub details: Vec<DetailSection>,
    pub test_steps: Vec<TestStep>,
    pub recommendations: Vec<String>,
    /// Machine-readable verdict data (booleans, key types)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl TestResult {
    /// Create a new test result
    pub fn new(title: impl Into<String>, status: CheckStatus, summary: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            status,
            summary: summary.into(),
            details: vec![],
            test_steps: vec![],
            recommendations: vec![],
            data: None,
        }
    }

    /// Add a detail section
    pub fn with_detail(mut self, section: DetailSection) -> Self {
        self.details.push(section);
        self
    }

    /// Add a test step
    pub fn with_step(mut self, step: TestStep) -> Self {
        self.test_steps.push(step);
        self
    }

    /// Add a recommendation
    pub fn with_recommendation(mut self, recommendation: impl Into<String>) -> Self {
        self.recommendations.push(recommendation.into());
        self
    }

    /// Attach structured verdict data
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Warnings do not fail a run
    pub fn passed(&self) -> bool {
        self.status != CheckStatus::Fail
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warning_counts_as_passed() {
        let result = TestResult::new("Key Pair", CheckStatus::Warning, "odd chain order");
        assert!(result.passed());
        let result = TestResult::new("Key Pair", CheckStatus::Fail, "mismatch");
        assert!(!result.passed());
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_string(&CheckStatus::Pass).unwrap();
        assert_eq!(json, "\"pass\"");
    }
}
