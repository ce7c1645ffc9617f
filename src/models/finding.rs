use serde::{Deserialize, Serialize};

/// Severity tier of a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    None,
    Moderate,
    High,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Moderate => "Moderate",
            Self::High => "High",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named diagnostic conclusion derived from the class distribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub name: String,
    pub confidence_percent: f64,
    pub severity: Severity,
    pub description: String,
}

impl Finding {
    /// `"Confidence Score: 12.35%"`
    pub fn confidence_label(&self) -> String {
        format!("Confidence Score: {}", format_percentage(self.confidence_percent))
    }
}

/// Percentage with exactly two decimals: `12.3` → `"12.30%"`.
///
/// Ties round half up (`0.125` → `"0.13%"`), matching the web client's
/// `toFixed(2)`; `{:.2}` alone would round them to even.
pub fn format_percentage(value: f64) -> String {
    let rounded = (value * 100.0).round() / 100.0;
    format!("{rounded:.2}%")
}
