//! Round orchestration for the federated simulation
//!
//! The orchestrator owns the virtual clients and drives the
//! broadcast / local-train / aggregate cycle. Weights move strictly by
//! value between the global model and the replicas, and every round
//! waits for all clients before aggregating.
//!
//! Client-side randomness (batch shuffling, privacy noise) is seeded
//! per (client, round) from the master seed, so the sequential and the
//! threaded schedule produce bit-identical runs.

use std::thread;
use std::time::{Duration, Instant};

use fedwatt_common::{FederationConfig, PrivacyConfig};
use fedwatt_model::{FitOptions, ModelError, Trainable, WeightSet};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;

use crate::aggregator::aggregate;
use crate::client::{LocalUpdate, VirtualClient};
use crate::error::FlError;
use crate::metrics::{RoundRecord, TrainingHistory};
use crate::privacy::apply_privacy_noise;

const STREAM_SHUFFLE: u64 = 0;
const STREAM_NOISE: u64 = 1;

/// How the clients of one round are scheduled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundSchedule {
    /// Clients train one after another on the calling thread
    Sequential,
    /// Clients train concurrently, one thread per client
    Threaded,
}

impl RoundSchedule {
    /// Maps the `parallel` config flag onto a schedule
    pub fn from_parallel_flag(parallel: bool) -> Self {
        if parallel {
            Self::Threaded
        } else {
            Self::Sequential
        }
    }
}

/// Drives the federation: broadcast, local training, aggregation
pub struct Orchestrator<M: Trainable + Send> {
    clients: Vec<VirtualClient<M>>,
    federation: FederationConfig,
    privacy: PrivacyConfig,
    schedule: RoundSchedule,
    history: TrainingHistory,
}

impl<M: Trainable + Send> Orchestrator<M> {
    /// Creates an orchestrator over a non-empty set of clients
    pub fn new(
        clients: Vec<VirtualClient<M>>,
        federation: FederationConfig,
        privacy: PrivacyConfig,
        schedule: RoundSchedule,
    ) -> Result<Self, FlError> {
        if clients.is_empty() {
            return Err(FlError::EmptyClientSet);
        }
        Ok(Self {
            clients,
            federation,
            privacy,
            schedule,
            history: TrainingHistory::new(),
        })
    }

    /// Returns the managed clients
    pub fn clients(&self) -> &[VirtualClient<M>] {
        &self.clients
    }

    /// Returns the per-round training history
    pub fn history(&self) -> &TrainingHistory {
        &self.history
    }

    /// Installs the global weights into every client replica
    pub fn broadcast(&mut self, global: &WeightSet) -> Result<(), FlError> {
        for client in &mut self.clients {
            client.set_weights(global)?;
        }
        Ok(())
    }

    /// Runs the full federation and returns the final global weights
    pub fn run(&mut self, initial: WeightSet) -> Result<WeightSet, FlError> {
        info!(
            "Starting federated run: {} clients, {} rounds x {} local epochs",
            self.clients.len(),
            self.federation.rounds,
            self.federation.local_epochs
        );

        let mut global = initial;
        for round in 1..=self.federation.rounds {
            global = self.run_round(round, &global)?;
        }

        info!("Federated training finished: {}", self.history);
        Ok(global)
    }

    /// Runs one round against the given global weights and returns the
    /// aggregated result.
    ///
    /// The round aborts with [`FlError::NumericInstability`] if the mean
    /// local loss or any aggregated weight value is non-finite.
    pub fn run_round(&mut self, round: u32, global: &WeightSet) -> Result<WeightSet, FlError> {
        let round_start = Instant::now();
        let deadline = self.round_deadline(round_start);
        let template = global.signature();

        info!("Starting FL round {}/{}", round, self.federation.rounds);
        self.broadcast(global)?;

        let updates = match self.schedule {
            RoundSchedule::Sequential => self.train_sequential(round, deadline)?,
            RoundSchedule::Threaded => self.train_threaded(round)?,
        };
        check_deadline(deadline, round, self.federation.round_timeout_secs)?;

        // Every client has reported; split the updates into the loss
        // vector and the aggregation batch.
        let mut losses = Vec::with_capacity(updates.len());
        let mut batch = Vec::with_capacity(updates.len());
        for update in updates {
            losses.push(update.loss);
            batch.push(update.weights);
        }

        let mean_loss =
            losses.iter().map(|&l| l as f64).sum::<f64>() / losses.len() as f64;
        if !mean_loss.is_finite() {
            return Err(FlError::NumericInstability {
                round,
                reason: format!("mean local loss is {mean_loss}"),
            });
        }

        let next = aggregate(&template, &batch)?;
        if !next.is_finite() {
            return Err(FlError::NumericInstability {
                round,
                reason: "aggregated weights contain non-finite values".to_string(),
            });
        }

        let duration_ms = round_start.elapsed().as_millis() as u64;
        info!(
            "Round {}/{} | avg loss: {:.4} | {} ms",
            round, self.federation.rounds, mean_loss, duration_ms
        );
        self.history.record(RoundRecord {
            round,
            client_losses: losses,
            mean_loss: mean_loss as f32,
            duration_ms,
        });

        Ok(next)
    }

    fn train_sequential(
        &mut self,
        round: u32,
        deadline: Option<Instant>,
    ) -> Result<Vec<LocalUpdate>, FlError> {
        let master = self.federation.seed;
        let epochs = self.federation.local_epochs;
        let batch_size = self.federation.batch_size;
        let limit_secs = self.federation.round_timeout_secs;
        let sigma = self.effective_sigma();

        let mut updates = Vec::with_capacity(self.clients.len());
        for client in &mut self.clients {
            check_deadline(deadline, round, limit_secs)?;
            updates.push(train_one(client, round, master, epochs, batch_size, sigma)?);
        }
        Ok(updates)
    }

    fn train_threaded(&mut self, round: u32) -> Result<Vec<LocalUpdate>, FlError> {
        let master = self.federation.seed;
        let epochs = self.federation.local_epochs;
        let batch_size = self.federation.batch_size;
        let sigma = self.effective_sigma();

        let results: Vec<Result<LocalUpdate, FlError>> = thread::scope(|scope| {
            let handles: Vec<_> = self
                .clients
                .iter_mut()
                .map(|client| {
                    scope.spawn(move || train_one(client, round, master, epochs, batch_size, sigma))
                })
                .collect();

            // Joining in spawn order keeps the update batch in client order
            handles
                .into_iter()
                .map(|handle| {
                    handle
                        .join()
                        .unwrap_or_else(|_| Err(FlError::WorkerPanicked { round }))
                })
                .collect()
        });

        results.into_iter().collect()
    }

    fn effective_sigma(&self) -> f32 {
        if self.privacy.enabled {
            self.privacy.sigma
        } else {
            0.0
        }
    }

    fn round_deadline(&self, start: Instant) -> Option<Instant> {
        match self.federation.round_timeout_secs {
            0 => None,
            secs => Some(start + Duration::from_secs(secs)),
        }
    }
}

/// Runs one client's local pass: seeded fit, then noise on the outgoing
/// copy only. The replica keeps its exact trained weights.
fn train_one<M: Trainable>(
    client: &mut VirtualClient<M>,
    round: u32,
    master_seed: u64,
    epochs: u32,
    batch_size: usize,
    sigma: f32,
) -> Result<LocalUpdate, FlError> {
    let id = client.id().value();
    let options = FitOptions {
        epochs,
        batch_size,
        shuffle_seed: derive_seed(master_seed, id, round, STREAM_SHUFFLE),
    };

    let mut update = match client.train(&options) {
        Ok(update) => update,
        Err(FlError::Client {
            client,
            source: ModelError::NonFiniteLoss { epoch, loss },
        }) => {
            return Err(FlError::NumericInstability {
                round,
                reason: format!("{client} hit a non-finite loss {loss} in local epoch {epoch}"),
            })
        }
        Err(err) => return Err(err),
    };

    if sigma > 0.0 {
        let mut rng = StdRng::seed_from_u64(derive_seed(master_seed, id, round, STREAM_NOISE));
        update.weights = apply_privacy_noise(&update.weights, sigma, &mut rng);
    }
    Ok(update)
}

/// Cooperative timeout check between client passes
fn check_deadline(deadline: Option<Instant>, round: u32, limit_secs: u64) -> Result<(), FlError> {
    match deadline {
        Some(at) if Instant::now() > at => Err(FlError::RoundTimedOut { round, limit_secs }),
        _ => Ok(()),
    }
}

/// Derives an independent RNG seed for one (client, round, stream) cell.
///
/// SplitMix64 finalizer over the packed coordinates: distinct cells get
/// uncorrelated seeds, and a cell gets the same seed no matter which
/// thread schedule runs it.
fn derive_seed(master: u64, client: u32, round: u32, stream: u64) -> u64 {
    let cell = ((client as u64) << 32) | round as u64;
    let mut z = master
        ^ cell.wrapping_mul(0x9E37_79B9_7F4A_7C15)
        ^ stream.wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
