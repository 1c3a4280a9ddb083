//! Per-round training metrics
//!
//! Every completed round appends one record to the training history.
//! Records are plain serializable data: the simulator prints them, the
//! artifact manifest embeds the final loss, and tests assert on them.

use serde::{Deserialize, Serialize};

/// Measurements from one completed federation round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundRecord {
    /// Round number (1-based)
    pub round: u32,
    /// Final-epoch loss reported by each client, in client order
    pub client_losses: Vec<f32>,
    /// Unweighted mean of the client losses
    pub mean_loss: f32,
    /// Wall-clock duration of the round in milliseconds
    pub duration_ms: u64,
}

impl RoundRecord {
    /// Returns the smallest client loss of the round
    pub fn min_loss(&self) -> Option<f32> {
        self.client_losses.iter().copied().reduce(f32::min)
    }

    /// Returns the largest client loss of the round
    pub fn max_loss(&self) -> Option<f32> {
        self.client_losses.iter().copied().reduce(f32::max)
    }
}

/// Chronological record of a federated run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrainingHistory {
    records: Vec<RoundRecord>,
}

impl TrainingHistory {
    /// Creates an empty history
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends the record of a completed round
    pub fn record(&mut self, record: RoundRecord) {
        self.records.push(record);
    }

    /// Returns all recorded rounds in order
    pub fn records(&self) -> &[RoundRecord] {
        &self.records
    }

    /// Returns the number of recorded rounds
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if no round has completed yet
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns the mean loss of the first round
    pub fn first_loss(&self) -> Option<f32> {
        self.records.first().map(|r| r.mean_loss)
    }

    /// Returns the mean loss of the most recent round
    pub fn final_loss(&self) -> Option<f32> {
        self.records.last().map(|r| r.mean_loss)
    }

    /// Returns the lowest mean loss seen across all rounds
    pub fn best_loss(&self) -> Option<f32> {
        self.records.iter().map(|r| r.mean_loss).reduce(f32::min)
    }

    /// Returns the summed wall-clock time of all recorded rounds
    pub fn total_duration_ms(&self) -> u64 {
        self.records.iter().map(|r| r.duration_ms).sum()
    }
}

impl std::fmt::Display for TrainingHistory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.first_loss(), self.final_loss(), self.best_loss()) {
            (Some(first), Some(last), Some(best)) => write!(
                f,
                "{} rounds in {} ms, avg loss {first:.4} -> {last:.4} (best {best:.4})",
                self.len(),
                self.total_duration_ms(),
            ),
            _ => write!(f, "no rounds recorded"),
        }
    }
}
