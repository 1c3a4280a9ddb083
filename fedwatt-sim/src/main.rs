//! fedwatt simulator
//!
//! This is the main binary for the federated energy simulation. It
//! implements:
//! - CLI argument parsing with config file overrides
//! - Dataset ingestion, pivoting, scaling, and partitioning
//! - The federated training loop (or a centralized baseline)
//! - Artifact persistence and a sample household analysis
//!
//! # Usage
//!
//! ```bash
//! fw-sim -c config/sim.yaml
//! fw-sim -c config/sim.yaml --rounds 10 --parallel
//! fw-sim --data data/households.csv --centralized
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::info;

use fedwatt_common::{init_logging, ClientId, LogLevel, SimConfig};
use fedwatt_data::{build_dataset, load_readings, partition_dataset, Dataset};
use fedwatt_fl::{
    ArtifactBundle, ArtifactManifest, ArtifactStore, Orchestrator, RoundSchedule, VirtualClient,
};
use fedwatt_model::{FitOptions, MlpRegressor, ScalingTransform, Trainable, WeightSet};

/// Dataset row used for the post-training household snapshot
const SNAPSHOT_ROW: usize = 15;

/// fedwatt - federated household energy simulator
#[derive(Parser, Debug)]
#[command(name = "fw-sim")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the simulation configuration file (YAML)
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    config_file: Option<PathBuf>,

    /// Path to the household readings CSV, overriding the config file
    #[arg(long = "data", value_name = "FILE")]
    data_file: Option<PathBuf>,

    /// Number of virtual clients, overriding the config file
    #[arg(long = "clients", value_name = "NUM")]
    clients: Option<u32>,

    /// Number of federation rounds, overriding the config file
    #[arg(long = "rounds", value_name = "NUM")]
    rounds: Option<u32>,

    /// Local epochs per round, overriding the config file
    #[arg(long = "epochs", value_name = "NUM")]
    epochs: Option<u32>,

    /// Master seed, overriding the config file
    #[arg(long = "seed", value_name = "SEED")]
    seed: Option<u64>,

    /// Artifact output directory, overriding the config file
    #[arg(short = 'o', long = "output", value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Train clients on one thread each instead of sequentially
    #[arg(long = "parallel")]
    parallel: bool,

    /// Enable Gaussian privacy noise on client updates
    #[arg(long = "privacy")]
    privacy: bool,

    /// Noise standard deviation; implies --privacy
    #[arg(long = "sigma", value_name = "SIGMA")]
    sigma: Option<f32>,

    /// Train one centralized model on the full dataset instead of federating
    #[arg(long = "centralized")]
    centralized: bool,
}

/// Parsed and validated CLI options
#[derive(Debug, Clone)]
struct SimOptions {
    config_file: Option<PathBuf>,
    data_file: Option<PathBuf>,
    clients: Option<u32>,
    rounds: Option<u32>,
    epochs: Option<u32>,
    seed: Option<u64>,
    output_dir: Option<PathBuf>,
    parallel: bool,
    privacy: bool,
    sigma: Option<f32>,
    centralized: bool,
}

impl TryFrom<Args> for SimOptions {
    type Error = anyhow::Error;

    fn try_from(args: Args) -> Result<Self> {
        if let Some(clients) = args.clients {
            if clients == 0 {
                bail!("Number of clients must be at least 1");
            }
        }
        if let Some(rounds) = args.rounds {
            if rounds == 0 {
                bail!("Number of rounds must be at least 1");
            }
        }
        if let Some(epochs) = args.epochs {
            if epochs == 0 {
                bail!("Number of local epochs must be at least 1");
            }
        }
        if let Some(sigma) = args.sigma {
            if !sigma.is_finite() || sigma < 0.0 {
                bail!("Noise sigma must be finite and non-negative (got {sigma})");
            }
        }

        Ok(SimOptions {
            config_file: args.config_file,
            data_file: args.data_file,
            clients: args.clients,
            rounds: args.rounds,
            epochs: args.epochs,
            seed: args.seed,
            output_dir: args.output_dir,
            parallel: args.parallel,
            privacy: args.privacy || args.sigma.is_some(),
            sigma: args.sigma,
            centralized: args.centralized,
        })
    }
}

/// Loads the configuration, applies CLI overrides, and validates it
fn load_sim_config(options: &SimOptions) -> Result<SimConfig> {
    let mut config = match &options.config_file {
        Some(path) => SimConfig::from_yaml_file(path)
            .with_context(|| format!("Failed to load configuration: {}", path.display()))?,
        None => SimConfig::default(),
    };

    if let Some(path) = &options.data_file {
        config.dataset.path = path.clone();
    }
    if let Some(clients) = options.clients {
        config.federation.clients = clients;
    }
    if let Some(rounds) = options.rounds {
        config.federation.rounds = rounds;
    }
    if let Some(epochs) = options.epochs {
        config.federation.local_epochs = epochs;
    }
    if let Some(seed) = options.seed {
        config.federation.seed = seed;
    }
    if options.parallel {
        config.federation.parallel = true;
    }
    if let Some(dir) = &options.output_dir {
        config.artifacts.dir = dir.clone();
    }
    if options.privacy {
        config.privacy.enabled = true;
    }
    if let Some(sigma) = options.sigma {
        config.privacy.sigma = sigma;
    }

    config.validate()?;
    Ok(config)
}

fn main() -> ExitCode {
    let args = Args::parse();

    println!("fedwatt - federated household energy simulator");
    println!("==============================================");

    let options = match SimOptions::try_from(args) {
        Ok(opts) => opts,
        Err(e) => {
            eprintln!("fw-sim: invalid arguments: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    let config = match load_sim_config(&options) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("fw-sim: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    let level = config.logging.level.parse().unwrap_or(LogLevel::Info);
    init_logging(level);
    info!("Configuration: {config}");

    match run_sim(&config, options.centralized) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Simulation failed: {e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Runs the full pipeline: ingest, scale, train, persist, report
fn run_sim(config: &SimConfig, centralized: bool) -> Result<()> {
    info!("Loading readings from {}", config.dataset.path.display());
    let readings = load_readings(&config.dataset.path)?;
    let dataset = build_dataset(&readings)?;
    info!(
        "Dataset: {} rows x {} features",
        dataset.len(),
        dataset.num_features()
    );

    // One transform for the whole federation: fitted on the full matrix,
    // shared by training, inference, and the advice engine.
    let scaler = ScalingTransform::fit(dataset.features())?;
    let scaled = scaler.transform(dataset.features())?;
    let dataset = dataset.with_features(scaled)?;

    if centralized {
        return run_centralized(config, &dataset);
    }

    let global = run_federated(config, &dataset, &scaler)?;
    report_snapshot(config, &dataset, &scaler, &global)?;
    Ok(())
}

/// Trains the federation and persists the resulting artifact bundle
fn run_federated(
    config: &SimConfig,
    dataset: &Dataset,
    scaler: &ScalingTransform,
) -> Result<WeightSet> {
    let input_dim = dataset.num_features();
    let hidden = &config.model.hidden_layers;
    let learning_rate = config.model.learning_rate;
    let seed = config.federation.seed;

    let clients: Vec<VirtualClient<MlpRegressor>> =
        partition_dataset(dataset, config.federation.clients)?
            .into_iter()
            .enumerate()
            .map(|(i, partition)| {
                let model = MlpRegressor::new(input_dim, hidden, learning_rate, seed);
                VirtualClient::new(ClientId::new(i as u32), partition, model)
            })
            .collect();

    let initial = MlpRegressor::new(input_dim, hidden, learning_rate, seed).parameters();
    let schedule = RoundSchedule::from_parallel_flag(config.federation.parallel);
    let mut orchestrator = Orchestrator::new(
        clients,
        config.federation.clone(),
        config.privacy.clone(),
        schedule,
    )?;

    let global = orchestrator.run(initial)?;

    let manifest = ArtifactManifest {
        format: "FWT1".to_string(),
        feature_names: dataset.feature_names().to_vec(),
        hidden_layers: config.model.hidden_layers.clone(),
        signature: global.signature(),
        rounds: config.federation.rounds,
        final_loss: orchestrator.history().final_loss(),
    };
    let store = ArtifactStore::new(&config.artifacts.dir);
    store.save(&ArtifactBundle {
        weights: global.clone(),
        scaler: scaler.clone(),
        manifest,
    })?;

    Ok(global)
}

/// Trains one model on the full dataset for rounds x epochs, as the
/// baseline the federated loss is compared against
fn run_centralized(config: &SimConfig, dataset: &Dataset) -> Result<()> {
    let epochs = config.federation.rounds * config.federation.local_epochs;
    info!("Training centralized baseline for {epochs} epochs");

    let mut model = MlpRegressor::new(
        dataset.num_features(),
        &config.model.hidden_layers,
        config.model.learning_rate,
        config.federation.seed,
    );
    let options = FitOptions {
        epochs,
        batch_size: config.federation.batch_size,
        shuffle_seed: config.federation.seed,
    };
    let loss = model.fit(dataset.features(), dataset.target(), &options)?;

    println!();
    println!("Centralized baseline loss: {loss:.4}");
    Ok(())
}

/// Predicts and analyzes one household row with the trained global model
fn report_snapshot(
    config: &SimConfig,
    dataset: &Dataset,
    scaler: &ScalingTransform,
    global: &WeightSet,
) -> Result<()> {
    if dataset.len() <= SNAPSHOT_ROW {
        info!("Dataset has fewer than {} rows; skipping snapshot", SNAPSHOT_ROW + 1);
        return Ok(());
    }

    let mut model = MlpRegressor::new(
        dataset.num_features(),
        &config.model.hidden_layers,
        config.model.learning_rate,
        config.federation.seed,
    );
    model.set_parameters(global)?;

    let row = dataset.features().row(SNAPSHOT_ROW);
    let batch = row.to_owned().insert_axis(ndarray::Axis(0));
    let prediction = model.predict(&batch)[0];

    // Temp sits second-to-last in the feature order, before Size
    let temp_index = dataset.num_features() - 2;
    let outdoor_temp = scaler.inverse_transform_feature(temp_index, row[temp_index]);

    println!();
    println!("--- Household snapshot (row {SNAPSHOT_ROW}) ---");
    println!("Outdoor temperature: {outdoor_temp:.1}°C");
    println!("Predicted total load: {prediction:.2} kWh");

    let report = fedwatt_advice::analyze(&row.to_vec(), dataset.feature_names())?;
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
