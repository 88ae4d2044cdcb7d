use ndarray::{Array2, Axis, concatenate};
use rand::Rng;
use rand::distributions::Distribution;
use statrs::distribution::Normal;

use crate::PowerError;

/// The fixed 2×2 sampling design: two classes (outer level), each split into
/// two inner groups of `n` observations, N = 4n in total.
///
/// The membership template is immutable and identical across replications;
/// per-replication index bookkeeping is derived from it fresh each call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TwoLevelDesign {
    n: usize,
}

impl TwoLevelDesign {
    pub fn new(n: usize) -> Self {
        Self { n }
    }

    /// Observations per inner cell.
    pub fn cell_size(&self) -> usize {
        self.n
    }

    /// Total number of observations, 4n.
    pub fn len(&self) -> usize {
        4 * self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// One `[outer, inner]` row per observation:
    /// `[0,0]·n ++ [0,1]·n ++ [1,0]·n ++ [1,1]·n`.
    pub fn membership(&self) -> Vec<[usize; 2]> {
        let mut rows = Vec::with_capacity(self.len());
        for &(outer, inner) in &[(0, 0), (0, 1), (1, 0), (1, 1)] {
            rows.extend(std::iter::repeat_n([outer, inner], self.n));
        }
        rows
    }

    /// The multiway encoding vectors of the four cells, in cell order.
    pub fn cell_ways() -> [Vec<f64>; 4] {
        [
            vec![0.0, 0.0],
            vec![0.0, 1.0],
            vec![1.0, 0.0],
            vec![1.0, 1.0],
        ]
    }
}

/// Grouped two-sample Gaussian simulator over the 2×2 design.
///
/// Case 1 is the location alternative: cell means 0, 0, ε₁, ε₁+ε₂ at unit
/// variance, so ε₁ separates the classes, ε₂ adds an extra shift to the
/// second inner group of class 1, and ε₁ = ε₂ = 0 is an exact null. Case 2
/// is the scale alternative: zero means with class-1 standard deviations
/// 1+ε₁ and 1+ε₁+ε₂.
///
/// `weight` scales a per-cell random intercept shared by all observations of
/// an inner cell (drawn i.i.d. N(0,1) per cell per replication); 0 disables
/// it.
#[derive(Debug, Clone, Copy)]
pub struct GaussianTwoLevel {
    pub n: usize,
    pub epsilon1: f64,
    pub epsilon2: f64,
    pub weight: f64,
    pub case: u32,
}

impl GaussianTwoLevel {
    pub fn new(n: usize, epsilon1: f64, epsilon2: f64) -> Self {
        Self {
            n,
            epsilon1,
            epsilon2,
            weight: 0.0,
            case: 1,
        }
    }

    pub fn design(&self) -> TwoLevelDesign {
        TwoLevelDesign::new(self.n)
    }

    /// Check the configuration without drawing anything.
    pub fn validate(&self) -> Result<(), PowerError> {
        if self.n == 0 {
            return Err(PowerError::invalid("cell size n must be positive"));
        }
        self.cell_params().map(|_| ())
    }

    fn cell_params(&self) -> Result<[(f64, f64); 4], PowerError> {
        match self.case {
            1 => Ok([
                (0.0, 1.0),
                (0.0, 1.0),
                (self.epsilon1, 1.0),
                (self.epsilon1 + self.epsilon2, 1.0),
            ]),
            2 => {
                let sd_lo = 1.0 + self.epsilon1;
                let sd_hi = 1.0 + self.epsilon1 + self.epsilon2;
                if sd_lo <= 0.0 || sd_hi <= 0.0 {
                    return Err(PowerError::invalid(
                        "case 2 requires epsilons that keep standard deviations positive",
                    ));
                }
                Ok([(0.0, 1.0), (0.0, 1.0), (0.0, sd_lo), (0.0, sd_hi)])
            }
            other => Err(PowerError::invalid(format!(
                "unsupported simulation case {other}, expected 1 or 2"
            ))),
        }
    }

    /// Draw one grouped dataset: four cells of `n` single-column
    /// observations, in design cell order.
    pub fn simulate<R: Rng>(&self, rng: &mut R) -> Result<TwoLevelData, PowerError> {
        if self.n == 0 {
            return Err(PowerError::invalid("cell size n must be positive"));
        }
        let params = self.cell_params()?;
        let standard = Normal::new(0.0, 1.0).expect("N(0,1) is a valid distribution");

        let mut cells = Vec::with_capacity(4);
        for (mean, sd) in params {
            let intercept = if self.weight != 0.0 {
                self.weight * standard.sample(rng)
            } else {
                0.0
            };
            let mut cell = Array2::zeros((self.n, 1));
            for i in 0..self.n {
                cell[[i, 0]] = mean + intercept + sd * standard.sample(rng);
            }
            cells.push(cell);
        }
        let cells: [Array2<f64>; 4] = cells.try_into().expect("exactly four cells");
        Ok(TwoLevelData { cells })
    }
}

/// One simulated replication: the four inner cells in design order.
#[derive(Debug, Clone)]
pub struct TwoLevelData {
    pub cells: [Array2<f64>; 4],
}

impl TwoLevelData {
    /// The two class samples, each the row-stack of its inner cells.
    pub fn samples(&self) -> [Array2<f64>; 2] {
        let first = concatenate(Axis(0), &[self.cells[0].view(), self.cells[1].view()])
            .expect("cells share a column count");
        let second = concatenate(Axis(0), &[self.cells[2].view(), self.cells[3].view()])
            .expect("cells share a column count");
        [first, second]
    }
}
