//! Deterministic fit / held-out split.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::error::{CoreError, CoreResult};

/// Row indices of the two partitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataSplit {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

impl DataSplit {
    pub fn train_rows<X: Clone, Y: Clone>(&self, x: &[X], y: &[Y]) -> (Vec<X>, Vec<Y>) {
        gather(&self.train, x, y)
    }

    pub fn test_rows<X: Clone, Y: Clone>(&self, x: &[X], y: &[Y]) -> (Vec<X>, Vec<Y>) {
        gather(&self.test, x, y)
    }
}

fn gather<X: Clone, Y: Clone>(indices: &[usize], x: &[X], y: &[Y]) -> (Vec<X>, Vec<Y>) {
    indices
        .iter()
        .map(|&i| (x[i].clone(), y[i].clone()))
        .unzip()
}

/// Shuffle `0..rows` with a seeded RNG and hold out `ceil(test_size * rows)`.
///
/// # Errors
/// - `Calibration` if either partition would be empty
pub fn train_test_split(rows: usize, test_size: f32, seed: u64) -> CoreResult<DataSplit> {
    // Round first so 0.3f32 * 10 is 3 rows, not 4.
    let exact = (test_size as f64 * rows as f64 * 1e6).round() / 1e6;
    let test_rows = exact.ceil() as usize;
    if test_rows == 0 || test_rows >= rows {
        return Err(CoreError::Calibration(format!(
            "cannot hold out {} of {} rows (test_size={})",
            test_rows, rows, test_size
        )));
    }

    let mut indices: Vec<usize> = (0..rows).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let train = indices.split_off(test_rows);
    Ok(DataSplit {
        train,
        test: indices,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_sizes() {
        let split = train_test_split(10, 0.3, 1234).unwrap();
        assert_eq!(split.test.len(), 3);
        assert_eq!(split.train.len(), 7);

        let mut all: Vec<usize> = split.train.iter().chain(&split.test).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn test_split_is_reproducible() {
        let a = train_test_split(50, 0.3, 1234).unwrap();
        let b = train_test_split(50, 0.3, 1234).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_split_rejects_degenerate_partitions() {
        assert!(train_test_split(1, 0.3, 1).is_err());
        assert!(train_test_split(0, 0.3, 1).is_err());
    }

    #[test]
    fn test_gather_rows() {
        let split = DataSplit {
            train: vec![2, 0],
            test: vec![1],
        };
        let x = vec!["a", "b", "c"];
        let y = vec![1, 2, 3];
        assert_eq!(split.train_rows(&x, &y), (vec!["c", "a"], vec![3, 1]));
        assert_eq!(split.test_rows(&x, &y), (vec!["b"], vec![2]));
    }
}
