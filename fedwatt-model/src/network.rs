//! Feed-forward energy regressor
//!
//! A small dense network trained with Adam on mean squared error: ReLU
//! hidden layers and a single linear output unit predicting total energy
//! draw for one home-hour. The federation treats it as an opaque
//! trainable function through the [`Trainable`] trait.
//!
//! Training is fully deterministic given the init seed and the shuffle
//! seed; two models constructed and fitted with the same seeds produce
//! bit-identical parameters.

use ndarray::{Array1, Array2, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::trace;

use crate::error::ModelError;
use crate::shape::{ShapeSignature, TensorShape};
use crate::weights::{WeightSet, WeightTensor};

const ADAM_BETA1: f32 = 0.9;
const ADAM_BETA2: f32 = 0.999;
const ADAM_EPS: f32 = 1e-7;

/// Options for one local training run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FitOptions {
    /// Number of full passes over the local samples
    pub epochs: u32,
    /// Mini-batch size for gradient steps
    pub batch_size: usize,
    /// Seed for the per-epoch sample shuffle
    pub shuffle_seed: u64,
}

/// Gradient-trainable model used as an opaque function by the federation
///
/// The federation only needs these three operations, so any
/// gradient-based regressor can stand in for [`MlpRegressor`] without
/// touching the round loop.
pub trait Trainable {
    /// Runs `opts.epochs` passes of optimization over the given samples
    /// and returns the mean loss of the final epoch.
    ///
    /// # Errors
    /// Returns `ModelError::NonFiniteLoss` if the loss diverges, or a
    /// dimension error if the inputs do not match the architecture.
    fn fit(
        &mut self,
        features: &Array2<f32>,
        target: &Array1<f32>,
        opts: &FitOptions,
    ) -> Result<f32, ModelError>;

    /// Returns a copy of the current parameters
    fn parameters(&self) -> WeightSet;

    /// Overwrites the parameters with the supplied set.
    ///
    /// # Errors
    /// Returns `ModelError::ShapeMismatch` if the set does not match the
    /// model architecture.
    fn set_parameters(&mut self, weights: &WeightSet) -> Result<(), ModelError>;
}

/// Layer activation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Activation {
    Relu,
    Linear,
}

impl Activation {
    fn apply(self, z: &Array2<f32>) -> Array2<f32> {
        match self {
            Activation::Relu => z.mapv(|x| x.max(0.0)),
            Activation::Linear => z.clone(),
        }
    }

    fn grad(self, z: &Array2<f32>) -> Array2<f32> {
        match self {
            Activation::Relu => z.mapv(|x| if x > 0.0 { 1.0 } else { 0.0 }),
            Activation::Linear => Array2::ones(z.raw_dim()),
        }
    }
}

/// Per-parameter Adam state (first and second moment estimates)
#[derive(Debug, Clone)]
struct AdamState {
    t: i32,
    m: Array2<f32>,
    v: Array2<f32>,
}

impl AdamState {
    fn new(shape: (usize, usize)) -> Self {
        Self {
            t: 0,
            m: Array2::zeros(shape),
            v: Array2::zeros(shape),
        }
    }

    fn step(&mut self, params: &mut Array2<f32>, grads: &Array2<f32>, lr: f32) {
        self.t += 1;

        self.m = &self.m * ADAM_BETA1 + grads * (1.0 - ADAM_BETA1);
        let grads_sq = grads.mapv(|g| g * g);
        self.v = &self.v * ADAM_BETA2 + grads_sq * (1.0 - ADAM_BETA2);

        let m_hat = self.m.mapv(|x| x / (1.0 - ADAM_BETA1.powi(self.t)));
        let v_hat = self.v.mapv(|x| x / (1.0 - ADAM_BETA2.powi(self.t)));

        let update = m_hat / v_hat.mapv(|x| x.sqrt() + ADAM_EPS);
        *params = &*params - &(update * lr);
    }
}

/// One fully-connected layer
#[derive(Debug, Clone)]
struct DenseLayer {
    /// Kernel, input_dim x output_dim
    weights: Array2<f32>,
    /// Bias as a 1 x output_dim row, broadcast over the batch
    bias: Array2<f32>,
    activation: Activation,
    opt_w: AdamState,
    opt_b: AdamState,
}

impl DenseLayer {
    fn new(input_dim: usize, output_dim: usize, activation: Activation, rng: &mut StdRng) -> Self {
        // Glorot uniform init, zero bias
        let limit = (6.0 / (input_dim + output_dim) as f32).sqrt();
        let weights =
            Array2::from_shape_fn((input_dim, output_dim), |_| rng.gen_range(-limit..limit));
        Self {
            weights,
            bias: Array2::zeros((1, output_dim)),
            activation,
            opt_w: AdamState::new((input_dim, output_dim)),
            opt_b: AdamState::new((1, output_dim)),
        }
    }

    fn forward(&self, input: &Array2<f32>) -> Array2<f32> {
        let z = input.dot(&self.weights) + &self.bias;
        self.activation.apply(&z)
    }
}

/// Dense energy regressor: ReLU hidden layers, one linear output unit
#[derive(Debug, Clone)]
pub struct MlpRegressor {
    layers: Vec<DenseLayer>,
    learning_rate: f32,
}

impl MlpRegressor {
    /// Builds a regressor with the given hidden widths and a seeded
    /// parameter init. Two regressors built with the same dimensions and
    /// seed start from identical parameters.
    pub fn new(input_dim: usize, hidden_layers: &[usize], learning_rate: f32, init_seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(init_seed);
        let mut layers = Vec::with_capacity(hidden_layers.len() + 1);
        let mut prev = input_dim;
        for &width in hidden_layers {
            layers.push(DenseLayer::new(prev, width, Activation::Relu, &mut rng));
            prev = width;
        }
        layers.push(DenseLayer::new(prev, 1, Activation::Linear, &mut rng));
        Self {
            layers,
            learning_rate,
        }
    }

    /// Returns the input feature count
    pub fn input_dim(&self) -> usize {
        self.layers.first().map_or(0, |l| l.weights.nrows())
    }

    /// Returns the shape signature of the parameter set: per layer, the
    /// kernel shape followed by the bias shape
    pub fn signature(&self) -> ShapeSignature {
        self.layers
            .iter()
            .flat_map(|layer| {
                let (input, output) = layer.weights.dim();
                [TensorShape::d2(input, output), TensorShape::d1(output)]
            })
            .collect()
    }

    /// Runs a forward pass and returns one prediction per input row
    pub fn predict(&self, features: &Array2<f32>) -> Array1<f32> {
        let mut a = features.clone();
        for layer in &self.layers {
            a = layer.forward(&a);
        }
        a.column(0).to_owned()
    }

    /// One gradient step over a mini-batch; returns the batch MSE
    fn train_batch(&mut self, x: &Array2<f32>, y: &Array2<f32>) -> f32 {
        let mut inputs = Vec::with_capacity(self.layers.len());
        let mut preacts = Vec::with_capacity(self.layers.len());

        let mut a = x.clone();
        for layer in &self.layers {
            let z = a.dot(&layer.weights) + &layer.bias;
            let out = layer.activation.apply(&z);
            inputs.push(a);
            preacts.push(z);
            a = out;
        }

        let diff = &a - y;
        let loss = diff.mapv(|d| d * d).mean().unwrap_or(0.0);

        // dL/dpred for mean squared error over the batch
        let scale = 2.0 / diff.len() as f32;
        let mut grad = diff.mapv(|d| d * scale);
        let lr = self.learning_rate;
        for (layer, (input, z)) in self
            .layers
            .iter_mut()
            .rev()
            .zip(inputs.iter().zip(preacts.iter()).rev())
        {
            let dz = &grad * &layer.activation.grad(z);
            let dw = input.t().dot(&dz);
            let db = dz.sum_axis(Axis(0)).insert_axis(Axis(0));
            // Propagate through the pre-step kernel before updating it
            grad = dz.dot(&layer.weights.t());
            layer.opt_w.step(&mut layer.weights, &dw, lr);
            layer.opt_b.step(&mut layer.bias, &db, lr);
        }

        loss
    }
}

impl Trainable for MlpRegressor {
    fn fit(
        &mut self,
        features: &Array2<f32>,
        target: &Array1<f32>,
        opts: &FitOptions,
    ) -> Result<f32, ModelError> {
        let samples = features.nrows();
        if samples == 0 {
            return Err(ModelError::EmptyTrainingSet);
        }
        if features.ncols() != self.input_dim() {
            return Err(ModelError::FeatureCountMismatch {
                expected: self.input_dim(),
                actual: features.ncols(),
            });
        }
        if target.len() != samples {
            return Err(ModelError::SampleCountMismatch {
                features: samples,
                targets: target.len(),
            });
        }

        let batch = opts.batch_size.max(1);
        let mut rng = StdRng::seed_from_u64(opts.shuffle_seed);
        let mut order: Vec<usize> = (0..samples).collect();
        let mut epoch_loss = 0.0f32;

        for epoch in 0..opts.epochs {
            order.shuffle(&mut rng);
            // Sample-weighted so the short tail batch does not skew the mean
            let mut loss_sum = 0.0f64;
            for chunk in order.chunks(batch) {
                let x = features.select(Axis(0), chunk);
                let y = Array2::from_shape_fn((chunk.len(), 1), |(i, _)| target[chunk[i]]);
                let batch_loss = self.train_batch(&x, &y);
                loss_sum += f64::from(batch_loss) * chunk.len() as f64;
            }
            epoch_loss = (loss_sum / samples as f64) as f32;
            if !epoch_loss.is_finite() {
                return Err(ModelError::NonFiniteLoss {
                    epoch,
                    loss: epoch_loss,
                });
            }
            trace!(epoch, loss = epoch_loss, "local epoch complete");
        }

        Ok(epoch_loss)
    }

    fn parameters(&self) -> WeightSet {
        let mut tensors = Vec::with_capacity(self.layers.len() * 2);
        for layer in &self.layers {
            tensors.push(WeightTensor::from(layer.weights.clone()));
            tensors.push(WeightTensor::from(layer.bias.row(0).to_owned()));
        }
        WeightSet::new(tensors)
    }

    fn set_parameters(&mut self, weights: &WeightSet) -> Result<(), ModelError> {
        weights.check_signature(&self.signature())?;
        // Signature equality guarantees the kernel/bias ranks below
        for (layer, pair) in self.layers.iter_mut().zip(weights.tensors().chunks(2)) {
            if let Some(kernel) = pair[0].to_array2() {
                layer.weights = kernel;
            }
            if let Some(bias) = pair[1].to_array1() {
                layer.bias = bias.insert_axis(Axis(0));
            }
        }
        Ok(())
    }
}
