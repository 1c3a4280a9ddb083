//! Test fixtures and builders
//!
//! Provides a deterministic readings CSV generator, synthetic datasets,
//! and a federation builder that wires partitions, clients, and the
//! orchestrator together the way `fw-sim` does.

use std::fs;
use std::path::{Path, PathBuf};

use fedwatt_common::{ClientId, FederationConfig, PrivacyConfig};
use fedwatt_data::{build_dataset, load_readings, partition_dataset, Dataset};
use fedwatt_fl::{Orchestrator, RoundSchedule, VirtualClient};
use fedwatt_model::{MlpRegressor, ScalingTransform, Trainable, WeightSet};
use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Header row of the packed household readings CSV
pub const READINGS_HEADER: &str = "Home ID,Time,Appliance Type,Energy Consumption (kWh),Outdoor Temperature (C),Household Size";

/// Appliances the generated readings rotate through, in sorted order
pub const FIXTURE_APPLIANCES: [&str; 4] = ["AC", "Fridge", "Lights", "Washing Machine"];

/// Generates a packed readings CSV covering `homes` households over
/// `hours` consecutive hours, one reading per appliance per home-hour.
///
/// Values are deterministic, so pivoting always yields the same dataset:
/// `homes * hours` observations with `FIXTURE_APPLIANCES.len() + 2`
/// feature columns.
pub fn readings_csv(homes: usize, hours: usize) -> String {
    let mut csv = String::from(READINGS_HEADER);
    csv.push('\n');

    for home in 0..homes {
        let mut times = Vec::new();
        let mut appliances = Vec::new();
        let mut energies = Vec::new();
        let mut temperatures = Vec::new();
        let mut sizes = Vec::new();

        for hour in 0..hours {
            for (slot, appliance) in FIXTURE_APPLIANCES.iter().enumerate() {
                times.push(format!("{:02}:00", 7 + hour));
                appliances.push((*appliance).to_string());
                energies.push(format!("{:.2}", 0.2 + 0.1 * (home + hour + slot) as f32));
                temperatures.push(format!("{:.1}", 15.0 + hour as f32));
                sizes.push(format!("{}", 2 + home % 3));
            }
        }

        csv.push_str(&format!(
            "H{:02},\"{}\",\"{}\",\"{}\",\"{}\",\"{}\"\n",
            home,
            times.join(", "),
            appliances.join(", "),
            energies.join(", "),
            temperatures.join(", "),
            sizes.join(", "),
        ));
    }
    csv
}

/// Writes a generated readings CSV into `dir` and returns its path
pub fn write_readings_csv(dir: &Path, homes: usize, hours: usize) -> PathBuf {
    let path = dir.join("households.csv");
    fs::write(&path, readings_csv(homes, hours)).unwrap();
    path
}

/// Loads, pivots, and standardizes a readings CSV the way `fw-sim` does
pub fn scaled_dataset_from_csv(path: &Path) -> (Dataset, ScalingTransform) {
    let readings = load_readings(path).unwrap();
    let dataset = build_dataset(&readings).unwrap();
    let scaler = ScalingTransform::fit(dataset.features()).unwrap();
    let scaled = scaler.transform(dataset.features()).unwrap();
    (dataset.with_features(scaled).unwrap(), scaler)
}

/// Builds a deterministic regression dataset with a linear ground truth.
///
/// Feature values already sit in `[-1, 1)`, so the dataset can feed the
/// federation directly without standardization.
pub fn synthetic_dataset(rows: usize, features: usize) -> Dataset {
    let mut rng = StdRng::seed_from_u64(rows as u64 ^ 0x5EED);
    let matrix = Array2::from_shape_fn((rows, features), |_| rng.gen_range(-1.0f32..1.0));
    let target = Array1::from_iter(matrix.rows().into_iter().map(|row| {
        row.iter()
            .enumerate()
            .map(|(j, &x)| x * (0.5 - 0.1 * j as f32))
            .sum::<f32>()
    }));
    let names = (0..features).map(|j| format!("Feature{j}")).collect();
    Dataset::new(matrix, target, names).unwrap()
}

/// Federation shape used by the integration tests
///
/// Defaults to the smallest interesting federation: two clients, two
/// rounds, one local epoch, privacy off.
#[derive(Debug, Clone)]
pub struct TestFederation {
    /// Number of virtual clients
    pub clients: u32,
    /// Number of federated rounds
    pub rounds: u32,
    /// Local epochs per client per round
    pub local_epochs: u32,
    /// Mini-batch size for local gradient steps
    pub batch_size: usize,
    /// Master seed for the shuffle and noise streams
    pub seed: u64,
    /// Thread-per-client scheduling
    pub parallel: bool,
    /// Privacy noise level, when enabled
    pub privacy_sigma: Option<f32>,
    /// Hidden layer widths of the regressor
    pub hidden_layers: Vec<usize>,
    /// Adam learning rate
    pub learning_rate: f32,
    /// Parameter init seed shared by every replica
    pub init_seed: u64,
}

impl Default for TestFederation {
    fn default() -> Self {
        Self {
            clients: 2,
            rounds: 2,
            local_epochs: 1,
            batch_size: 8,
            seed: 42,
            parallel: false,
            privacy_sigma: None,
            hidden_layers: vec![8],
            learning_rate: 0.01,
            init_seed: 7,
        }
    }
}

impl TestFederation {
    /// Set the client count
    pub fn with_clients(mut self, clients: u32) -> Self {
        self.clients = clients;
        self
    }

    /// Set the round count
    pub fn with_rounds(mut self, rounds: u32) -> Self {
        self.rounds = rounds;
        self
    }

    /// Set the master seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Schedule clients on worker threads instead of sequentially
    pub fn parallel(mut self) -> Self {
        self.parallel = true;
        self
    }

    /// Enable privacy noise with the given sigma
    pub fn with_privacy(mut self, sigma: f32) -> Self {
        self.privacy_sigma = Some(sigma);
        self
    }

    /// The federation config this shape describes
    pub fn federation_config(&self) -> FederationConfig {
        FederationConfig {
            clients: self.clients,
            rounds: self.rounds,
            local_epochs: self.local_epochs,
            batch_size: self.batch_size,
            seed: self.seed,
            parallel: self.parallel,
            round_timeout_secs: 0,
        }
    }

    /// The privacy config this shape describes
    pub fn privacy_config(&self) -> PrivacyConfig {
        PrivacyConfig {
            enabled: self.privacy_sigma.is_some(),
            sigma: self.privacy_sigma.unwrap_or(0.0),
        }
    }

    /// Partitions the dataset, wires up the orchestrator, and returns it
    /// together with matching initial global weights.
    ///
    /// Every client replica and the initial weights are built from the
    /// same init seed, mirroring `fw-sim`.
    pub fn build(&self, dataset: &Dataset) -> (Orchestrator<MlpRegressor>, WeightSet) {
        let input_dim = dataset.num_features();
        let clients: Vec<VirtualClient<MlpRegressor>> = partition_dataset(dataset, self.clients)
            .unwrap()
            .into_iter()
            .enumerate()
            .map(|(i, partition)| {
                let model = MlpRegressor::new(
                    input_dim,
                    &self.hidden_layers,
                    self.learning_rate,
                    self.init_seed,
                );
                VirtualClient::new(ClientId::new(i as u32), partition, model)
            })
            .collect();

        let initial =
            MlpRegressor::new(input_dim, &self.hidden_layers, self.learning_rate, self.init_seed)
                .parameters();

        let orchestrator = Orchestrator::new(
            clients,
            self.federation_config(),
            self.privacy_config(),
            RoundSchedule::from_parallel_flag(self.parallel),
        )
        .unwrap();
        (orchestrator, initial)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fedwatt_data::parse_readings;

    #[test]
    fn test_fixture_csv_parses_cleanly() {
        let readings = parse_readings(&readings_csv(3, 2)).unwrap();
        assert_eq!(readings.len(), 3 * 2 * FIXTURE_APPLIANCES.len());
    }

    #[test]
    fn test_fixture_dataset_shape() {
        let readings = parse_readings(&readings_csv(3, 2)).unwrap();
        let dataset = build_dataset(&readings).unwrap();
        assert_eq!(dataset.len(), 6);
        assert_eq!(dataset.num_features(), FIXTURE_APPLIANCES.len() + 2);
        assert_eq!(&dataset.feature_names()[..2], &["AC", "Fridge"]);
    }

    #[test]
    fn test_default_federation_builds() {
        let dataset = synthetic_dataset(16, 3);
        let (orchestrator, initial) = TestFederation::default().build(&dataset);
        assert_eq!(orchestrator.clients().len(), 2);
        // One hidden layer: kernel and bias for each of the two layers
        assert_eq!(initial.signature().len(), 4);
    }
}
