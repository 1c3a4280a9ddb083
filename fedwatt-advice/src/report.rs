//! Findings produced by the advice engine

use serde::{Deserialize, Serialize};

/// How far above the area average an appliance sits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdviceSeverity {
    /// Clearly above average
    High,
    /// Far above average
    Critical,
}

impl std::fmt::Display for AdviceSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::High => write!(f, "High"),
            Self::Critical => write!(f, "Critical"),
        }
    }
}

/// One flagged appliance with a concrete saving action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplianceFinding {
    /// Feature (appliance) name as it appears in the dataset
    pub feature: String,
    /// Standard score of the usage against the area average
    pub score: f32,
    /// Severity bucket derived from the score
    pub severity: AdviceSeverity,
    /// Usage above the area average, in whole percent
    pub excess_pct: i32,
    /// Suggested saving action
    pub action: String,
}

impl std::fmt::Display for ApplianceFinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}] {}: {}% above area average",
            self.severity, self.feature, self.excess_pct
        )
    }
}

/// All findings for one usage row, worst first
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdviceReport {
    findings: Vec<ApplianceFinding>,
}

impl AdviceReport {
    pub(crate) fn new(findings: Vec<ApplianceFinding>) -> Self {
        Self { findings }
    }

    /// Returns the findings, sorted by descending score
    pub fn findings(&self) -> &[ApplianceFinding] {
        &self.findings
    }

    /// Returns true if nothing was flagged
    pub fn is_efficient(&self) -> bool {
        self.findings.is_empty()
    }
}

impl std::fmt::Display for AdviceReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.findings.is_empty() {
            write!(
                f,
                "Excellent efficiency: no appliance is significantly above its area average"
            )
        } else {
            write!(f, "{} appliance(s) flagged", self.findings.len())
        }
    }
}
