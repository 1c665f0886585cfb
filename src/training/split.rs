// Sat Jan 24 2026 - Alex

use crate::source::PartitionKey;
use crate::transform::FeatureBatch;
use crate::utils::HashComputer;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Per-partition shuffle seed: reproducible for a run seed, distinct per (source, key).
pub fn split_seed(run_seed: u64, source: &str, key: &PartitionKey) -> u64 {
    let key_bytes = key.to_bytes();
    HashComputer::fnv1a_64_parts(&[&run_seed.to_le_bytes()[..], source.as_bytes(), &key_bytes[..]])
}

/// Number of training rows for `n` rows; both sides keep at least one row when `n >= 2`.
pub fn train_size(n: usize, ratio: f64) -> usize {
    if n < 2 {
        return n;
    }
    let size = (n as f64 * ratio).round() as usize;
    size.clamp(1, n - 1)
}

/// A shuffled train/test partition of one feature batch. Read-only once built.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainTestSplit {
    pub train_features: Vec<Vec<f64>>,
    pub train_target: Vec<f64>,
    pub test_features: Vec<Vec<f64>>,
    pub test_target: Vec<f64>,
    train_indices: Vec<usize>,
    test_indices: Vec<usize>,
}

impl TrainTestSplit {
    pub fn new(batch: &FeatureBatch, ratio: f64, seed: u64) -> Self {
        let n = batch.len();
        let mut order: Vec<usize> = (0..n).collect();
        let mut rng = StdRng::seed_from_u64(seed);
        order.shuffle(&mut rng);

        let test_indices = order.split_off(train_size(n, ratio));
        let train_indices = order;

        let pick_features = |idx: &[usize]| -> Vec<Vec<f64>> {
            idx.iter().map(|&i| batch.features[i].clone()).collect()
        };
        let pick_target = |idx: &[usize]| -> Vec<f64> {
            idx.iter().map(|&i| batch.target[i]).collect()
        };

        Self {
            train_features: pick_features(&train_indices),
            train_target: pick_target(&train_indices),
            test_features: pick_features(&test_indices),
            test_target: pick_target(&test_indices),
            train_indices,
            test_indices,
        }
    }

    pub fn train_indices(&self) -> &[usize] {
        &self.train_indices
    }

    pub fn test_indices(&self) -> &[usize] {
        &self.test_indices
    }

    pub fn train_len(&self) -> usize {
        self.train_target.len()
    }

    pub fn test_len(&self) -> usize {
        self.test_target.len()
    }
}
