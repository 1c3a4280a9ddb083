//! Contiguous client partitioning
//!
//! The dataset is split into equally-sized, non-overlapping slices in
//! original row order, one per client. No shuffling: the same input
//! always yields the same partitions. When the row count is not
//! divisible by the client count, the tail remainder belongs to no
//! client.

use std::ops::Range;

use ndarray::{s, Array1, Array2};
use tracing::debug;

use crate::dataset::Dataset;
use crate::error::DataError;

/// One client's private, contiguous slice of the dataset
#[derive(Debug, Clone)]
pub struct ClientPartition {
    features: Array2<f32>,
    target: Array1<f32>,
    rows: Range<usize>,
}

impl ClientPartition {
    /// Returns the partition's feature rows
    pub fn features(&self) -> &Array2<f32> {
        &self.features
    }

    /// Returns the partition's target slice
    pub fn target(&self) -> &Array1<f32> {
        &self.target
    }

    /// Returns the index range this partition covers in the full dataset
    pub fn rows(&self) -> Range<usize> {
        self.rows.clone()
    }

    /// Returns the number of observations in the partition
    pub fn len(&self) -> usize {
        self.features.nrows()
    }

    /// Returns true if the partition holds no observations
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Splits a dataset into `clients` contiguous partitions of exactly
/// `floor(len / clients)` rows each.
///
/// # Errors
/// Returns `DataError::InvalidConfiguration` when `clients` is zero or
/// exceeds the number of rows.
pub fn partition_dataset(
    dataset: &Dataset,
    clients: u32,
) -> Result<Vec<ClientPartition>, DataError> {
    let rows = dataset.len();
    let n = clients as usize;
    if clients == 0 || n > rows {
        return Err(DataError::InvalidConfiguration { clients, rows });
    }

    let size = rows / n;
    let dropped = rows % n;
    if dropped > 0 {
        debug!(dropped, "tail rows not assigned to any client");
    }

    let mut partitions = Vec::with_capacity(n);
    for i in 0..n {
        let start = i * size;
        let end = start + size;
        partitions.push(ClientPartition {
            features: dataset.features().slice(s![start..end, ..]).to_owned(),
            target: dataset.target().slice(s![start..end]).to_owned(),
            rows: start..end,
        });
    }
    Ok(partitions)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_test_dataset(rows: usize) -> Dataset {
        let features = Array2::from_shape_fn((rows, 2), |(i, j)| (i * 2 + j) as f32);
        let target = Array1::from_shape_fn(rows, |i| i as f32);
        Dataset::new(
            features,
            target,
            vec![String::from("a"), String::from("b")],
        )
        .unwrap()
    }

    #[test]
    fn test_even_split() {
        let dataset = make_test_dataset(100);
        let partitions = partition_dataset(&dataset, 5).unwrap();
        assert_eq!(partitions.len(), 5);
        assert!(partitions.iter().all(|p| p.len() == 20));
    }

    #[test]
    fn test_remainder_rows_are_dropped() {
        let dataset = make_test_dataset(101);
        let partitions = partition_dataset(&dataset, 5).unwrap();
        assert!(partitions.iter().all(|p| p.len() == 20));
        let covered: usize = partitions.iter().map(ClientPartition::len).sum();
        assert_eq!(covered, 100);
        assert_eq!(partitions[4].rows(), 80..100);
    }

    #[test]
    fn test_partitions_are_disjoint_and_ordered() {
        let dataset = make_test_dataset(100);
        let partitions = partition_dataset(&dataset, 4).unwrap();

        let mut next_start = 0;
        for partition in &partitions {
            let range = partition.rows();
            assert_eq!(range.start, next_start);
            next_start = range.end;
        }
        assert_eq!(next_start, 100);
    }

    #[test]
    fn test_partition_rows_carry_original_values() {
        let dataset = make_test_dataset(10);
        let partitions = partition_dataset(&dataset, 2).unwrap();
        // Row 0 of partition 1 is dataset row 5
        assert_eq!(partitions[1].features()[[0, 0]], 10.0);
        assert_eq!(partitions[1].target()[0], 5.0);
    }

    #[test]
    fn test_single_client_takes_everything() {
        let dataset = make_test_dataset(7);
        let partitions = partition_dataset(&dataset, 1).unwrap();
        assert_eq!(partitions.len(), 1);
        assert_eq!(partitions[0].len(), 7);
    }

    #[test]
    fn test_zero_clients_rejected() {
        let dataset = make_test_dataset(10);
        assert!(matches!(
            partition_dataset(&dataset, 0),
            Err(DataError::InvalidConfiguration {
                clients: 0,
                rows: 10,
            })
        ));
    }

    #[test]
    fn test_more_clients_than_rows_rejected() {
        let dataset = make_test_dataset(3);
        assert!(matches!(
            partition_dataset(&dataset, 4),
            Err(DataError::InvalidConfiguration {
                clients: 4,
                rows: 3,
            })
        ));
    }
}
