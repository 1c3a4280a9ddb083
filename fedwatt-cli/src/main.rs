//! fedwatt prediction CLI
//!
//! Loads the artifact bundle persisted by `fw-sim` and answers "what
//! would this household draw, and where is it wasting energy?" for a
//! hand-entered usage row. Features not set on the command line default
//! to zero, the same as an appliance that never ran.
//!
//! # Usage
//!
//! ```bash
//! fw-cli --list-features
//! fw-cli --set "Fridge=1.2" --set "Air Conditioning=4.5" --set Temp=31
//! fw-cli -a artifacts --set Oven=2.0 --no-advice
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::Parser;
use ndarray::Axis;

use fedwatt_advice::analyze;
use fedwatt_fl::{ArtifactBundle, ArtifactStore};
use fedwatt_model::{MlpRegressor, Trainable};

#[derive(Parser, Debug)]
#[command(name = "fw-cli")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Artifact directory produced by fw-sim
    #[arg(
        short = 'a',
        long = "artifacts",
        value_name = "DIR",
        default_value = "artifacts"
    )]
    artifacts: PathBuf,

    /// List the feature names the model expects, then exit
    #[arg(short = 'l', long = "list-features")]
    list_features: bool,

    /// Feature assignment NAME=VALUE; repeatable, unset features are 0
    #[arg(short = 's', long = "set", value_name = "NAME=VALUE")]
    set: Vec<String>,

    /// Print only the prediction, without the advice section
    #[arg(long = "no-advice")]
    no_advice: bool,
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("ERROR: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let args = Args::parse();

    let store = ArtifactStore::new(&args.artifacts);
    if !store.is_complete() {
        bail!(
            "No artifact bundle in {}. Run fw-sim first to train and persist a model.",
            store.dir().display()
        );
    }
    let bundle = store.load().context("Failed to load artifact bundle")?;

    if args.list_features {
        return list_features(&bundle);
    }

    let raw = parse_assignments(&args.set, &bundle.manifest.feature_names)?;
    predict(&bundle, &raw, args.no_advice)
}

fn list_features(bundle: &ArtifactBundle) -> Result<()> {
    println!("Model features ({}):", bundle.manifest.feature_names.len());
    for name in &bundle.manifest.feature_names {
        println!("  {name}");
    }
    Ok(())
}

/// Builds the raw input row from NAME=VALUE assignments
fn parse_assignments(assignments: &[String], feature_names: &[String]) -> Result<Vec<f32>> {
    let mut row = vec![0.0_f32; feature_names.len()];
    for assignment in assignments {
        let (name, value) = assignment
            .split_once('=')
            .with_context(|| format!("Expected NAME=VALUE, got '{assignment}'"))?;
        let name = name.trim();
        let value = value.trim();

        let index = feature_names
            .iter()
            .position(|f| f == name)
            .with_context(|| {
                format!("Unknown feature '{name}'; use --list-features to see the model's inputs")
            })?;
        let parsed: f32 = value
            .parse()
            .with_context(|| format!("Invalid value '{value}' for feature '{name}'"))?;
        if !parsed.is_finite() {
            bail!("Value for feature '{name}' must be finite");
        }
        row[index] = parsed;
    }
    Ok(row)
}

fn predict(bundle: &ArtifactBundle, raw: &[f32], no_advice: bool) -> Result<()> {
    let scaled = bundle.scaler.transform_row(raw)?;

    // Learning rate and init seed do not matter for inference; the
    // persisted weights replace everything.
    let mut model = MlpRegressor::new(
        bundle.manifest.feature_names.len(),
        &bundle.manifest.hidden_layers,
        0.001,
        0,
    );
    model.set_parameters(&bundle.weights)?;

    let batch = scaled.clone().insert_axis(Axis(0));
    let predicted_kwh = model.predict(&batch)[0].abs();

    println!("Predicted total load: {predicted_kwh:.2} kWh");

    if no_advice {
        return Ok(());
    }

    let report = analyze(&scaled.to_vec(), &bundle.manifest.feature_names)?;
    if report.is_efficient() {
        println!("{report}");
    } else {
        for finding in report.findings() {
            println!("{finding}");
            println!("  ACTION: {}", finding.action);
        }
    }
    Ok(())
}
