use ndarray::Array2;
use num_traits::{Float, FromPrimitive};
use rand::Rng;

use super::{PairwiseStatistic, TestOutcome, permutation_pvalue};
use crate::PowerError;
use crate::math::euclidean;

/// Double-center a pairwise-distance (or kernel) matrix.
///
/// With `bias = false` the U-centering of Székely & Rizzo is used:
///
/// ```text
/// exp[i][j] = rowsum_i/(n-2) + colsum_j/(n-2) - total/((n-1)(n-2))
/// ```
///
/// subtracted from the matrix with the diagonal then zeroed; this makes the
/// downstream statistic an unbiased U-statistic and requires n ≥ 4. With
/// `bias = true` the plain mean-centering is used instead.
///
/// # Panics
/// Panics if `bias` is false and the matrix has fewer than 4 rows.
pub fn center_distance_matrix<F>(dist: &Array2<F>, bias: bool) -> Array2<F>
where
    F: Float + FromPrimitive,
{
    let n = dist.nrows();
    let nf = F::from_usize(n).expect("matrix size fits in a float");

    let mut row_sums = vec![F::zero(); n];
    let mut total = F::zero();
    for i in 0..n {
        for j in 0..n {
            row_sums[i] = row_sums[i] + dist[[i, j]];
            total = total + dist[[i, j]];
        }
    }

    let mut out = Array2::zeros((n, n));
    if bias {
        let grand = total / (nf * nf);
        for i in 0..n {
            for j in 0..n {
                let expected = row_sums[i] / nf + row_sums[j] / nf - grand;
                out[[i, j]] = dist[[i, j]] - expected;
            }
        }
    } else {
        assert!(n > 3, "unbiased centering requires at least 4 observations");
        let nm1 = nf - F::one();
        let nm2 = nf - F::from_usize(2).expect("2 is a valid float");
        let grand = total / (nm1 * nm2);
        for i in 0..n {
            for j in 0..n {
                if i == j {
                    continue;
                }
                let expected = row_sums[i] / nm2 + row_sums[j] / nm2 - grand;
                out[[i, j]] = dist[[i, j]] - expected;
            }
        }
    }
    out
}

/// Distance correlation between two pairwise-distance matrices: the
/// normalized inner product of the centered matrices,
/// Σ(cx∘cy) / √(Σcx² · Σcy²), defined as 0 whenever either variance term is
/// non-positive (constant, perfectly equidistant input).
pub fn distance_correlation<F>(dist_x: &Array2<F>, dist_y: &Array2<F>, bias: bool) -> F
where
    F: Float + FromPrimitive,
{
    let cx = center_distance_matrix(dist_x, bias);
    let cy = center_distance_matrix(dist_y, bias);

    let n = cx.nrows();
    let mut covar = F::zero();
    let mut var_x = F::zero();
    let mut var_y = F::zero();
    for i in 0..n {
        for j in 0..n {
            covar = covar + cx[[i, j]] * cy[[i, j]];
            var_x = var_x + cx[[i, j]] * cx[[i, j]];
            var_y = var_y + cy[[i, j]] * cy[[i, j]];
        }
    }

    if var_x <= F::zero() || var_y <= F::zero() {
        F::zero()
    } else {
        covar / (var_x * var_y).sqrt()
    }
}

/// Distance correlation test.
///
/// The statistic operates on pairwise Euclidean distance matrices; the
/// unbiased (U-centered) form is the default.
#[derive(Debug, Clone, Copy, Default)]
pub struct Dcorr {
    pub bias: bool,
}

impl PairwiseStatistic for Dcorr {
    fn statistic(&self, dist_x: &Array2<f64>, dist_y: &Array2<f64>) -> f64 {
        distance_correlation(dist_x, dist_y, self.bias)
    }
}

impl Dcorr {
    /// Full test on raw samples: Euclidean distance matrices, observed
    /// statistic, and a flat row-permutation p-value.
    pub fn test<R: Rng>(
        &self,
        x: &Array2<f64>,
        y: &Array2<f64>,
        reps: usize,
        rng: &mut R,
    ) -> Result<TestOutcome, PowerError> {
        check_paired_samples(x, y, reps)?;
        let dist_x = euclidean(x);
        let observed = self.statistic(&dist_x, &euclidean(y));
        let p_value = permutation_pvalue(observed, y, reps, rng, |permuted| {
            self.statistic(&dist_x, &euclidean(permuted))
        });
        Ok(TestOutcome {
            statistic: observed,
            p_value,
        })
    }
}

pub(crate) fn check_paired_samples(
    x: &Array2<f64>,
    y: &Array2<f64>,
    reps: usize,
) -> Result<(), PowerError> {
    if x.nrows() != y.nrows() {
        return Err(PowerError::invalid(format!(
            "paired samples must have equal row counts ({} vs {})",
            x.nrows(),
            y.nrows()
        )));
    }
    if x.nrows() < 4 {
        return Err(PowerError::invalid(
            "independence tests require at least 4 observations",
        ));
    }
    if reps == 0 {
        return Err(PowerError::invalid("reps must be positive"));
    }
    Ok(())
}
