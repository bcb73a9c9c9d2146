//! Reproducible calibration datasets.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Noisy scores correlated with membership.
///
/// Members score around 0.65, non-members around 0.35, each with uniform
/// noise of +-0.3. Returns `(scores, truth)`, both `rows x labels`.
pub fn synthetic_scores(rows: usize, labels: usize, seed: u64) -> (Vec<Vec<f32>>, Vec<Vec<bool>>) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..rows)
        .map(|_| {
            (0..labels)
                .map(|_| {
                    let member = rng.gen_bool(0.35);
                    let base: f32 = if member { 0.65 } else { 0.35 };
                    let noise: f32 = rng.gen_range(-0.3..0.3);
                    ((base + noise).clamp(0.0, 1.0), member)
                })
                .unzip::<f32, bool, Vec<f32>, Vec<bool>>()
        })
        .unzip()
}

/// One-feature rows `i / rows` where row `i` is a member iff `i >= cut`.
pub fn separable_dataset(rows: usize, cut: usize) -> (Vec<Vec<f32>>, Vec<Vec<bool>>) {
    (0..rows)
        .map(|i| (vec![i as f32 / rows as f32], vec![i >= cut]))
        .unzip()
}
