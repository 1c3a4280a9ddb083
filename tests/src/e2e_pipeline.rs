//! Full-pipeline integration tests
//!
//! Drives the same path as the binaries: a readings CSV on disk is
//! pivoted, standardized, partitioned, and federated the way `fw-sim`
//! does, then the persisted artifact bundle is reloaded for prediction
//! the way `fw-cli` does.

use std::fs;

use fedwatt_advice::{analyze, AdviceSeverity};
use fedwatt_data::Dataset;
use fedwatt_fl::{ArtifactBundle, ArtifactManifest, ArtifactStore, StoreError};
use fedwatt_model::{MlpRegressor, ScalingTransform, Trainable, WeightSet};
use ndarray::Axis;

use crate::test_fixtures::{scaled_dataset_from_csv, write_readings_csv, TestFederation};
use crate::test_utils::init_test_logging;

fn make_test_bundle(
    shape: &TestFederation,
    dataset: &Dataset,
    final_loss: Option<f32>,
    weights: WeightSet,
    scaler: ScalingTransform,
) -> ArtifactBundle {
    let manifest = ArtifactManifest {
        format: String::from("FWT1"),
        feature_names: dataset.feature_names().to_vec(),
        hidden_layers: shape.hidden_layers.clone(),
        signature: weights.signature(),
        rounds: shape.rounds,
        final_loss,
    };
    ArtifactBundle {
        weights,
        scaler,
        manifest,
    }
}

// ============================================================================
// CSV to prediction
// ============================================================================

#[test]
fn test_csv_to_prediction_e2e() {
    init_test_logging();
    let dir = tempfile::tempdir().unwrap();
    let csv = write_readings_csv(dir.path(), 6, 4);

    let (dataset, scaler) = scaled_dataset_from_csv(&csv);
    assert_eq!(dataset.len(), 24);

    let shape = TestFederation::default().with_clients(2).with_rounds(3);
    let (mut orchestrator, initial) = shape.build(&dataset);
    let global = orchestrator.run(initial).unwrap();
    assert_eq!(orchestrator.history().len(), 3);

    // Persist the result as fw-sim would
    let store = ArtifactStore::new(dir.path().join("artifacts"));
    let bundle = make_test_bundle(
        &shape,
        &dataset,
        orchestrator.history().final_loss(),
        global.clone(),
        scaler,
    );
    store.save(&bundle).unwrap();
    assert!(store.is_complete());

    // Reload and predict as fw-cli would
    let loaded = store.load().unwrap();
    assert_eq!(loaded.weights, global);
    assert_eq!(loaded.manifest.feature_names, dataset.feature_names());
    assert_eq!(loaded.manifest.rounds, 3);
    assert!(loaded.manifest.final_loss.unwrap().is_finite());

    let input_dim = loaded.manifest.feature_names.len();
    let mut model = MlpRegressor::new(input_dim, &loaded.manifest.hidden_layers, 0.001, 0);
    model.set_parameters(&loaded.weights).unwrap();

    let scaled = loaded.scaler.transform_row(&vec![0.4; input_dim]).unwrap();
    let batch = scaled.insert_axis(Axis(0));
    assert!(model.predict(&batch)[0].is_finite());
}

// ============================================================================
// Artifact corruption
// ============================================================================

#[test]
fn test_truncated_weight_dump_is_rejected() {
    init_test_logging();
    let dir = tempfile::tempdir().unwrap();
    let csv = write_readings_csv(dir.path(), 4, 3);
    let (dataset, scaler) = scaled_dataset_from_csv(&csv);

    let shape = TestFederation::default().with_rounds(1);
    let (mut orchestrator, initial) = shape.build(&dataset);
    let global = orchestrator.run(initial).unwrap();

    let store = ArtifactStore::new(dir.path().join("artifacts"));
    let bundle = make_test_bundle(
        &shape,
        &dataset,
        orchestrator.history().final_loss(),
        global,
        scaler,
    );
    store.save(&bundle).unwrap();

    let weights_path = dir.path().join("artifacts").join("weights.fwt");
    let bytes = fs::read(&weights_path).unwrap();
    fs::write(&weights_path, &bytes[..bytes.len() / 2]).unwrap();

    assert!(matches!(
        store.load(),
        Err(StoreError::BufferTooShort { .. })
    ));
}

#[test]
fn test_missing_scaler_marks_bundle_incomplete() {
    let dir = tempfile::tempdir().unwrap();
    let csv = write_readings_csv(dir.path(), 4, 3);
    let (dataset, scaler) = scaled_dataset_from_csv(&csv);

    let shape = TestFederation::default().with_rounds(1);
    let (mut orchestrator, initial) = shape.build(&dataset);
    let global = orchestrator.run(initial).unwrap();

    let store = ArtifactStore::new(dir.path().join("artifacts"));
    let bundle = make_test_bundle(
        &shape,
        &dataset,
        orchestrator.history().final_loss(),
        global,
        scaler,
    );
    store.save(&bundle).unwrap();

    fs::remove_file(dir.path().join("artifacts").join("scaler.json")).unwrap();
    assert!(matches!(store.load(), Err(StoreError::Incomplete { .. })));
}

// ============================================================================
// Advice over the pivoted layout
// ============================================================================

#[test]
fn test_advice_reads_the_pivoted_feature_layout() {
    let dir = tempfile::tempdir().unwrap();
    let csv = write_readings_csv(dir.path(), 4, 3);
    let (dataset, _) = scaled_dataset_from_csv(&csv);
    let names = dataset.feature_names().to_vec();

    let mut row = vec![0.0; names.len()];
    row[0] = 2.4; // AC far above the area average
    let report = analyze(&row, &names).unwrap();
    assert!(!report.is_efficient());

    let finding = &report.findings()[0];
    assert_eq!(finding.feature, "AC");
    assert_eq!(finding.severity, AdviceSeverity::Critical);
    assert_eq!(finding.excess_pct, 240);
    assert!(finding.action.contains("thermostat"));

    // Context columns are exempt no matter how extreme the value
    let mut context = vec![0.0; names.len()];
    context[names.len() - 2] = 5.0; // Temp
    context[names.len() - 1] = 5.0; // Size
    assert!(analyze(&context, &names).unwrap().is_efficient());
}
