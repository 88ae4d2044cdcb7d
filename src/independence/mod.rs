use ndarray::Array2;
use rand::Rng;
use rand::seq::SliceRandom;

use crate::permute::permute_rows;

mod dcorr;
mod hsic;
mod maxmargin;

pub use dcorr::{Dcorr, center_distance_matrix, distance_correlation};
pub use hsic::Hsic;
pub use maxmargin::{MarginBase, MaxMargin};

/// A dependence statistic evaluated on a pair of pairwise-distance (or
/// kernel) matrices.
///
/// This is the only capability the power estimator requires of a test.
/// Margin-wise tests ([`MaxMargin`]) instead read the pair as raw feature
/// matrices, one margin per column; the call site does not care which.
pub trait PairwiseStatistic {
    fn statistic(&self, dist_x: &Array2<f64>, dist_y: &Array2<f64>) -> f64;
}

/// Result of a `test` entry point: observed statistic plus the permutation
/// p-value with the +1 continuity correction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TestOutcome {
    pub statistic: f64,
    pub p_value: f64,
}

/// Flat row-permutation null distribution shared by every `test` entry
/// point: shuffle the second sample's rows, recompute the statistic through
/// `stat_of`, and count how often the null reaches the observed value.
pub(crate) fn permutation_pvalue<R, F>(
    observed: f64,
    y: &Array2<f64>,
    reps: usize,
    rng: &mut R,
    stat_of: F,
) -> f64
where
    R: Rng,
    F: Fn(&Array2<f64>) -> f64,
{
    let mut order: Vec<usize> = (0..y.nrows()).collect();
    let mut exceed = 0usize;
    for _ in 0..reps {
        order.shuffle(rng);
        let permuted = permute_rows(y, &order);
        if stat_of(&permuted) >= observed {
            exceed += 1;
        }
    }
    (exceed + 1) as f64 / (reps + 1) as f64
}
