//! Virtual federated clients
//!
//! Each client owns one contiguous partition of the household dataset
//! and a private model replica. A round installs the global weights,
//! fits locally for a few epochs, and hands the updated weights back by
//! value. Nothing is shared between replicas, so two clients can train
//! on separate threads without synchronization.

use fedwatt_common::ClientId;
use fedwatt_data::ClientPartition;
use fedwatt_model::{FitOptions, Trainable, WeightSet};

use crate::error::FlError;

/// The update one client contributes to a round
#[derive(Debug, Clone)]
pub struct LocalUpdate {
    /// Client that produced the update
    pub client: ClientId,
    /// Weights after local training
    pub weights: WeightSet,
    /// Mean training loss of the final local epoch
    pub loss: f32,
}

/// One simulated participant: a data partition plus a private model replica
pub struct VirtualClient<M: Trainable> {
    id: ClientId,
    partition: ClientPartition,
    model: M,
}

impl<M: Trainable> VirtualClient<M> {
    /// Creates a client over its slice of the dataset
    pub fn new(id: ClientId, partition: ClientPartition, model: M) -> Self {
        Self {
            id,
            partition,
            model,
        }
    }

    /// Returns the client identifier
    pub fn id(&self) -> ClientId {
        self.id
    }

    /// Returns the number of local training samples
    pub fn num_samples(&self) -> usize {
        self.partition.len()
    }

    /// Installs the broadcast global weights into the local replica
    pub fn set_weights(&mut self, weights: &WeightSet) -> Result<(), FlError> {
        self.model.set_parameters(weights).map_err(|source| {
            FlError::Client {
                client: self.id,
                source,
            }
        })
    }

    /// Returns a copy of the local replica's weights
    pub fn weights(&self) -> WeightSet {
        self.model.parameters()
    }

    /// Runs local training and returns the resulting update by value
    pub fn train(&mut self, options: &FitOptions) -> Result<LocalUpdate, FlError> {
        let loss = self
            .model
            .fit(self.partition.features(), self.partition.target(), options)
            .map_err(|source| FlError::Client {
                client: self.id,
                source,
            })?;

        Ok(LocalUpdate {
            client: self.id,
            weights: self.model.parameters(),
            loss,
        })
    }
}
