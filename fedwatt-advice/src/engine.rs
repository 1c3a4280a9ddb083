//! Usage analysis against area averages
//!
//! The engine reads a z-scored usage row: each value says how many
//! standard deviations one household sits above or below the training
//! population's average for that feature. Appliances more than one
//! standard deviation above average get flagged with a concrete saving
//! action.

use tracing::debug;

use crate::error::AdviceError;
use crate::report::{AdviceReport, AdviceSeverity, ApplianceFinding};

/// Standard-score threshold above which an appliance is flagged
const FLAG_THRESHOLD: f32 = 1.0;

/// Standard-score threshold separating High from Critical findings
const CRITICAL_THRESHOLD: f32 = 2.0;

/// Context features that are not appliances and never get advice
const IGNORED_FEATURES: [&str; 4] = ["Temp", "Size", "Hour", "HomeID"];

/// Analyzes one scaled usage row and returns the flagged appliances,
/// worst first.
///
/// `scaled_row` must be z-scored with the same transform the model was
/// trained with; `feature_names` gives the column for each value.
pub fn analyze(scaled_row: &[f32], feature_names: &[String]) -> Result<AdviceReport, AdviceError> {
    if scaled_row.len() != feature_names.len() {
        return Err(AdviceError::MisalignedRow {
            values: scaled_row.len(),
            names: feature_names.len(),
        });
    }

    let mut findings: Vec<ApplianceFinding> = scaled_row
        .iter()
        .zip(feature_names)
        .filter(|(_, name)| !is_ignored(name))
        .filter(|&(&score, _)| score > FLAG_THRESHOLD)
        .map(|(&score, name)| ApplianceFinding {
            feature: name.clone(),
            score,
            severity: severity_for(score),
            excess_pct: (score * 100.0) as i32,
            action: action_for(name).to_string(),
        })
        .collect();

    findings.sort_by(|a, b| b.score.total_cmp(&a.score));
    debug!(flagged = findings.len(), "analyzed usage row");
    Ok(AdviceReport::new(findings))
}

fn is_ignored(name: &str) -> bool {
    IGNORED_FEATURES.iter().any(|ignored| name.contains(ignored))
}

fn severity_for(score: f32) -> AdviceSeverity {
    if score < CRITICAL_THRESHOLD {
        AdviceSeverity::High
    } else {
        AdviceSeverity::Critical
    }
}

/// Maps an appliance name onto its saving action
fn action_for(name: &str) -> &'static str {
    if name.contains("Air") || name.contains("AC") {
        "Set thermostat to 24°C. Every degree lower increases bill by 6%."
    } else if name.contains("Heater") {
        "Check window insulation for drafts. Lower thermostat by 1-2°C."
    } else if name.contains("Fridge") {
        "Check door seals. Vacuum coils behind the fridge for efficiency."
    } else if name.contains("Washing") {
        "Run only full loads. Use cold water (30°C) to save 90% energy."
    } else if name.contains("Dishwasher") {
        "Skip the 'Heated Dry' cycle. Run only when full."
    } else if name.contains("Lights") {
        "Switch to LED bulbs. Install motion sensors in hallways."
    } else if name.contains("Computer") || name.contains("TV") {
        "Enable 'Energy Saver' mode. Unplug when not in use (Vampire load)."
    } else if name.contains("Oven") {
        "Don't open the door while cooking. Use microwave for small meals."
    } else {
        "Consider checking this device for maintenance or replacement."
    }
}
