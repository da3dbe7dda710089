//! Reproducible train/test partition.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_pcg::Mcg128Xsl64;

/// Row indices of the two partitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainTestSplit {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Shuffle `0..n_rows` with `seed` and hold out `ceil(n_rows * test_ratio)`
/// rows (at least one) for testing.
///
/// Same `n_rows`, ratio and seed always give the same split.
pub fn train_test_split(n_rows: usize, test_ratio: f64, seed: u64) -> TrainTestSplit {
    let mut indices: Vec<usize> = (0..n_rows).collect();
    let mut rng = Mcg128Xsl64::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let n_test = ((n_rows as f64 * test_ratio).ceil() as usize)
        .max(1)
        .min(n_rows.saturating_sub(1));
    let train = indices.split_off(n_test);

    TrainTestSplit {
        train,
        test: indices,
    }
}
