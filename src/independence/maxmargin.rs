use std::str::FromStr;

use ndarray::{Array2, Axis};
use rand::Rng;

use super::dcorr::{check_paired_samples, distance_correlation};
use super::{PairwiseStatistic, TestOutcome, permutation_pvalue};
use crate::PowerError;
use crate::math::{euclidean, gaussian_kernel};

/// Base statistic evaluated on each margin pair by [`MaxMargin`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarginBase {
    Dcorr,
    Hsic,
}

impl FromStr for MarginBase {
    type Err = PowerError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name.to_ascii_lowercase().as_str() {
            "dcorr" => Ok(MarginBase::Dcorr),
            "hsic" => Ok(MarginBase::Hsic),
            other => Err(PowerError::invalid(format!(
                "unknown independence test '{other}', expected one of {{Dcorr, Hsic}}"
            ))),
        }
    }
}

/// Maximal-margin dependence statistic.
///
/// Reads its two inputs as raw feature matrices, one margin per column, and
/// takes the running maximum (from 0) of the base statistic over every
/// margin pair, building each margin's distance or Gram matrix the way the
/// base test would.
#[derive(Debug, Clone, Copy)]
pub struct MaxMargin {
    pub base: MarginBase,
}

impl MaxMargin {
    /// Build from a test name; unknown names are a configuration error.
    pub fn new(base: &str) -> Result<Self, PowerError> {
        Ok(Self {
            base: base.parse()?,
        })
    }

    fn margin_matrix(&self, data: &Array2<f64>, column: usize) -> Array2<f64> {
        let margin = data.column(column).to_owned().insert_axis(Axis(1));
        match self.base {
            MarginBase::Dcorr => euclidean(&margin),
            MarginBase::Hsic => gaussian_kernel(&margin, None),
        }
    }

    /// Full test on raw samples: the margin maximum as observed statistic,
    /// flat row-permutation p-value.
    pub fn test<R: Rng>(
        &self,
        x: &Array2<f64>,
        y: &Array2<f64>,
        reps: usize,
        rng: &mut R,
    ) -> Result<TestOutcome, PowerError> {
        check_paired_samples(x, y, reps)?;
        let observed = self.statistic(x, y);
        let p_value = permutation_pvalue(observed, y, reps, rng, |permuted| {
            self.statistic(x, permuted)
        });
        Ok(TestOutcome {
            statistic: observed,
            p_value,
        })
    }
}

impl From<MarginBase> for MaxMargin {
    fn from(base: MarginBase) -> Self {
        Self { base }
    }
}

impl PairwiseStatistic for MaxMargin {
    fn statistic(&self, x: &Array2<f64>, y: &Array2<f64>) -> f64 {
        let mut best = 0.0_f64;
        for i in 0..x.ncols() {
            let margin_x = self.margin_matrix(x, i);
            for j in 0..y.ncols() {
                let margin_y = self.margin_matrix(y, j);
                let stat = distance_correlation(&margin_x, &margin_y, false);
                if stat > best {
                    best = stat;
                }
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256PlusPlus;

    #[test]
    fn unknown_base_name_is_rejected() {
        let err = MaxMargin::new("abcd").unwrap_err();
        assert!(matches!(err, PowerError::InvalidConfiguration(_)));
    }

    #[test]
    fn base_names_parse_case_insensitively() {
        assert_eq!("Dcorr".parse::<MarginBase>().unwrap(), MarginBase::Dcorr);
        assert_eq!("hsic".parse::<MarginBase>().unwrap(), MarginBase::Hsic);
        assert_eq!("HSIC".parse::<MarginBase>().unwrap(), MarginBase::Hsic);
    }

    #[test]
    fn negative_margins_floor_at_zero() {
        // the crossed 2+2 split scores -1/2 on its only margin pair
        let x = array![[0.0], [0.0], [1.0], [1.0]];
        let y = array![[0.0], [1.0], [0.0], [1.0]];
        let test = MaxMargin::new("Dcorr").unwrap();
        assert_abs_diff_eq!(test.statistic(&x, &y), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn picks_the_strongest_margin() {
        // column 1 reproduces y exactly, column 0 anti-correlates with it
        let x = array![[0.0, 0.0], [0.0, 1.0], [1.0, 0.0], [1.0, 1.0]];
        let y = array![[0.0], [1.0], [0.0], [1.0]];
        let test = MaxMargin::new("Dcorr").unwrap();
        assert_abs_diff_eq!(test.statistic(&x, &y), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn hsic_base_detects_matching_margin() {
        let x = array![[0.0], [1.0], [2.0], [3.0], [4.0]];
        let test = MaxMargin::new("Hsic").unwrap();
        assert_abs_diff_eq!(test.statistic(&x, &x), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_rejects_dependent_data() {
        let x = Array2::from_shape_fn((16, 1), |(i, _)| i as f64);
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(23);
        let outcome = MaxMargin::new("Dcorr")
            .unwrap()
            .test(&x, &x, 99, &mut rng)
            .unwrap();
        assert!(outcome.p_value < 0.05, "p = {}", outcome.p_value);
    }
}
