//! Federation round-loop behavior
//!
//! Covers the properties the simulator leans on: fresh runs with one
//! seed reproduce bit-identically, thread-per-client scheduling matches
//! the sequential schedule, broadcast realigns every replica, the
//! partition contract holds on irregular row counts, and privacy noise
//! moves the aggregate without touching the reported losses.

use fedwatt_data::{partition_dataset, DataError, Dataset};
use fedwatt_fl::{FlError, TrainingHistory};
use fedwatt_model::WeightSet;
use ndarray::{Array1, Array2};

use crate::test_fixtures::{synthetic_dataset, TestFederation};
use crate::test_utils::init_test_logging;

// ============================================================================
// Reproducibility
// ============================================================================

#[test]
fn test_fresh_runs_with_one_seed_are_identical() {
    init_test_logging();
    let dataset = synthetic_dataset(32, 3);
    let shape = TestFederation::default();

    let run = || {
        let (mut orchestrator, initial) = shape.build(&dataset);
        let finished = orchestrator.run(initial).unwrap();
        let losses: Vec<f32> = orchestrator
            .history()
            .records()
            .iter()
            .map(|r| r.mean_loss)
            .collect();
        (finished, losses)
    };

    let (weights_a, losses_a) = run();
    let (weights_b, losses_b) = run();
    assert_eq!(weights_a, weights_b);
    assert_eq!(losses_a, losses_b);

    let (mut reseeded, initial) = shape.clone().with_seed(43).build(&dataset);
    let weights_c = reseeded.run(initial).unwrap();
    assert_ne!(weights_a, weights_c);
}

#[test]
fn test_threaded_schedule_matches_sequential() {
    let dataset = synthetic_dataset(48, 3);
    let base = TestFederation::default().with_clients(3);

    let (mut sequential, init_seq) = base.clone().build(&dataset);
    let weights_seq = sequential.run(init_seq).unwrap();

    let (mut threaded, init_thr) = base.parallel().build(&dataset);
    let weights_thr = threaded.run(init_thr).unwrap();

    assert_eq!(weights_seq, weights_thr);
    let losses = |history: &TrainingHistory| -> Vec<Vec<f32>> {
        history
            .records()
            .iter()
            .map(|r| r.client_losses.clone())
            .collect()
    };
    assert_eq!(losses(sequential.history()), losses(threaded.history()));
}

// ============================================================================
// Broadcast
// ============================================================================

#[test]
fn test_broadcast_realigns_replicas_after_a_round() {
    let dataset = synthetic_dataset(32, 3);
    let (mut orchestrator, initial) = TestFederation::default().build(&dataset);

    let global = orchestrator.run_round(1, &initial).unwrap();

    // After local training the replicas have drifted apart
    let replicas: Vec<WeightSet> = orchestrator
        .clients()
        .iter()
        .map(|client| client.weights())
        .collect();
    assert_ne!(replicas[0], replicas[1]);

    orchestrator.broadcast(&global).unwrap();
    for client in orchestrator.clients() {
        assert_eq!(client.weights(), global);
    }
}

// ============================================================================
// Partitioning
// ============================================================================

#[test]
fn test_partitioning_contract_on_an_irregular_dataset() {
    let dataset = synthetic_dataset(101, 3);
    let partitions = partition_dataset(&dataset, 5).unwrap();

    assert_eq!(partitions.len(), 5);
    assert!(partitions.iter().all(|p| p.len() == 20));

    // Contiguous, disjoint, in order; the 101st row belongs to nobody
    let mut expected_start = 0;
    for partition in &partitions {
        assert_eq!(partition.rows().start, expected_start);
        expected_start = partition.rows().end;
    }
    assert_eq!(expected_start, 100);

    // Slices carry the original rows
    assert_eq!(partitions[2].features().row(0), dataset.features().row(40));
    assert_eq!(partitions[2].target()[0], dataset.target()[40]);
}

#[test]
fn test_partitioning_rejects_impossible_client_counts() {
    let dataset = synthetic_dataset(10, 3);
    assert!(matches!(
        partition_dataset(&dataset, 0),
        Err(DataError::InvalidConfiguration { .. })
    ));
    assert!(matches!(
        partition_dataset(&dataset, 11),
        Err(DataError::InvalidConfiguration { .. })
    ));
}

// ============================================================================
// Privacy
// ============================================================================

#[test]
fn test_privacy_toggle_moves_weights_not_losses() {
    let dataset = synthetic_dataset(32, 3);
    let base = TestFederation::default().with_rounds(1);

    let (mut plain, init_plain) = base.clone().build(&dataset);
    let weights_plain = plain.run(init_plain).unwrap();

    let (mut noisy, init_noisy) = base.with_privacy(0.05).build(&dataset);
    let weights_noisy = noisy.run(init_noisy).unwrap();

    // Losses are measured before the outgoing update is perturbed
    assert_eq!(
        plain.history().records()[0].client_losses,
        noisy.history().records()[0].client_losses
    );
    assert_ne!(weights_plain, weights_noisy);
}

#[test]
fn test_zero_sigma_privacy_degenerates_to_plain_averaging() {
    let dataset = synthetic_dataset(32, 3);

    let (mut plain, init_plain) = TestFederation::default().build(&dataset);
    let (mut zeroed, init_zeroed) = TestFederation::default().with_privacy(0.0).build(&dataset);

    assert_eq!(
        plain.run(init_plain).unwrap(),
        zeroed.run(init_zeroed).unwrap()
    );
}

// ============================================================================
// Aggregation
// ============================================================================

#[test]
fn test_single_client_aggregate_is_that_clients_update() {
    let dataset = synthetic_dataset(16, 3);
    let shape = TestFederation::default().with_clients(1).with_rounds(1);
    let (mut orchestrator, initial) = shape.build(&dataset);

    let global = orchestrator.run(initial).unwrap();
    // The mean of one noise-free update is exactly that update
    assert_eq!(global, orchestrator.clients()[0].weights());
}

// ============================================================================
// Failure paths
// ============================================================================

#[test]
fn test_non_finite_target_aborts_the_run() {
    init_test_logging();
    let mut target = vec![0.5f32; 32];
    target[3] = f32::INFINITY;
    let features = Array2::from_shape_fn((32, 3), |(r, c)| ((r + c) % 5) as f32 * 0.2 - 0.4);
    let names = (0..3).map(|j| format!("Feature{j}")).collect();
    let dataset = Dataset::new(features, Array1::from(target), names).unwrap();

    let (mut orchestrator, initial) = TestFederation::default().build(&dataset);
    let err = orchestrator.run(initial).unwrap_err();
    assert!(matches!(err, FlError::NumericInstability { round: 1, .. }));
}
