//! Gaussian perturbation of client updates
//!
//! Before an update leaves a client it can be perturbed with zero-mean
//! Gaussian noise, which masks individual contributions at the cost of
//! some aggregate accuracy. The perturbation never mutates the input:
//! clients keep their exact local weights for the next round.

use fedwatt_model::WeightSet;
use rand::Rng;

/// Draws one sample from N(0, sigma^2) using the Box-Muller transform
fn sample_gaussian<R: Rng>(rng: &mut R, sigma: f32) -> f32 {
    let u1: f32 = rng.gen::<f32>().max(f32::EPSILON);
    let u2: f32 = rng.gen();
    sigma * (-2.0 * u1.ln()).sqrt() * (2.0 * std::f32::consts::PI * u2).cos()
}

/// Returns a copy of `weights` with zero-mean Gaussian noise added to
/// every element.
///
/// With `sigma == 0.0` the copy is element-for-element identical to the
/// input and no random numbers are drawn, so a disabled privacy toggle
/// leaves the update stream untouched.
pub fn apply_privacy_noise<R: Rng>(weights: &WeightSet, sigma: f32, rng: &mut R) -> WeightSet {
    if sigma == 0.0 {
        return weights.clone();
    }
    weights.map_elements(|x| x + sample_gaussian(rng, sigma))
}
