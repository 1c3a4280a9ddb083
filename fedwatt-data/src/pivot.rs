//! Per-home-per-hour observation building
//!
//! Readings are grouped by (home, hour). Within each group every
//! appliance's energy is summed into its own column (absent appliances
//! fill with zero) and the context attributes are averaged. Groups are
//! ordered by (home, hour) and appliance columns by name, so a given
//! input always produces the same row and column layout.

use std::collections::{BTreeMap, BTreeSet};

use ndarray::{Array1, Array2};
use tracing::debug;

use crate::dataset::Dataset;
use crate::error::DataError;
use crate::readings::ApplianceReading;

/// Name of the outdoor-temperature context feature
pub const TEMP_FEATURE: &str = "Temp";
/// Name of the household-size context feature
pub const SIZE_FEATURE: &str = "Size";

#[derive(Default)]
struct GroupStats {
    energy_by_appliance: BTreeMap<String, f64>,
    temp_sum: f64,
    size_sum: f64,
    count: usize,
}

/// Pivots exploded readings into a [`Dataset`].
///
/// The target for each observation is the sum of its appliance energy
/// columns; the context columns do not contribute to the target.
///
/// # Errors
/// Returns `DataError::EmptyDataset` if no readings are supplied.
pub fn build_dataset(readings: &[ApplianceReading]) -> Result<Dataset, DataError> {
    if readings.is_empty() {
        return Err(DataError::EmptyDataset);
    }

    let appliances: BTreeSet<&str> = readings.iter().map(|r| r.appliance.as_str()).collect();

    let mut groups: BTreeMap<(String, u8), GroupStats> = BTreeMap::new();
    for reading in readings {
        let entry = groups
            .entry((reading.home_id.clone(), reading.hour))
            .or_default();
        *entry
            .energy_by_appliance
            .entry(reading.appliance.clone())
            .or_insert(0.0) += f64::from(reading.energy_kwh);
        entry.temp_sum += f64::from(reading.outdoor_temp_c);
        entry.size_sum += f64::from(reading.household_size);
        entry.count += 1;
    }

    let num_appliances = appliances.len();
    let rows = groups.len();
    let mut features = Array2::<f32>::zeros((rows, num_appliances + 2));
    let mut target = Array1::<f32>::zeros(rows);

    for (i, stats) in groups.values().enumerate() {
        let mut row_energy = 0.0f64;
        for (j, name) in appliances.iter().enumerate() {
            let energy = stats.energy_by_appliance.get(*name).copied().unwrap_or(0.0);
            features[[i, j]] = energy as f32;
            row_energy += energy;
        }
        let n = stats.count as f64;
        features[[i, num_appliances]] = (stats.temp_sum / n) as f32;
        features[[i, num_appliances + 1]] = (stats.size_sum / n) as f32;
        target[i] = row_energy as f32;
    }

    let mut feature_names: Vec<String> = appliances.iter().map(|s| (*s).to_string()).collect();
    feature_names.push(TEMP_FEATURE.to_string());
    feature_names.push(SIZE_FEATURE.to_string());

    debug!(
        rows,
        features = feature_names.len(),
        "built observation matrix"
    );

    Dataset::new(features, target, feature_names)
}
