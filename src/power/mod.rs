use std::str::FromStr;

use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::PowerError;
use crate::independence::PairwiseStatistic;
use crate::math::{euclidean, half_squared_euclidean};
use crate::permute::{GroupIndex, contiguous_labels, permute_rows};
use crate::sim::{GaussianTwoLevel, TwoLevelDesign};
use crate::transform::k_sample_transform;

mod parallel;

pub use parallel::run_parallel;

/// Null-preserving permutation scheme for grouped data.
///
/// Only the two-level hierarchical scheme is implemented; deeper nesting is
/// deliberately rejected at the parse boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PermuteStructure {
    /// Shuffle within inner groups, then reassign whole outer-group blocks
    /// across classes.
    #[default]
    Multilevel,
}

impl FromStr for PermuteStructure {
    type Err = PowerError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name.to_ascii_lowercase().as_str() {
            "multilevel" => Ok(PermuteStructure::Multilevel),
            other => Err(PowerError::invalid(format!(
                "permute_structure must be of {{'multilevel'}}, got '{other}'"
            ))),
        }
    }
}

/// Configuration of a two-level two-sample power run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PowerOptions {
    /// Observations per inner cell (total sample size is 4n).
    pub n: usize,
    /// Class-level effect size.
    pub epsilon1: f64,
    /// Inner-group-level effect size.
    pub epsilon2: f64,
    /// Scale of the shared per-cell random intercept (0 disables it).
    pub weight: f64,
    /// Simulation scenario: 1 = location alternative, 2 = scale alternative.
    pub case: u32,
    /// Rejection level for the permutation cutoff.
    pub alpha: f64,
    /// Number of Monte Carlo replications.
    pub reps: usize,
    /// Degree of parallelism; 1 runs sequentially, values above `reps` are
    /// clamped.
    pub workers: usize,
    /// Encode conditions with the 2×2 cell way vectors instead of plain
    /// class labels.
    pub multiway: bool,
    pub permute_structure: PermuteStructure,
}

impl Default for PowerOptions {
    fn default() -> Self {
        Self {
            n: 100,
            epsilon1: 0.5,
            epsilon2: 0.5,
            weight: 0.0,
            case: 1,
            alpha: 0.05,
            reps: 1000,
            workers: 1,
            multiway: false,
            permute_structure: PermuteStructure::Multilevel,
        }
    }
}

/// Outcome of a power run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PowerEstimate {
    /// Empirical power, floored at 1/reps.
    pub power: f64,
    /// Permutation critical value the observed statistics were held against.
    pub cutoff: f64,
    pub alpha: f64,
    pub reps: usize,
}

/// Empirical (1-α) critical value of a permutation null distribution: the
/// ⌈reps·(1-α)⌉-th smallest value (1-indexed), rounding the rank up on ties.
///
/// # Panics
/// Panics if the distribution is empty.
pub fn critical_cutoff(null_dist: &[f64], alpha: f64) -> f64 {
    assert!(!null_dist.is_empty(), "null distribution must be non-empty");
    let mut sorted = null_dist.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).expect("statistics are never NaN"));
    let reps = sorted.len();
    let rank = ((reps as f64) * (1.0 - alpha)).ceil() as usize;
    sorted[rank.clamp(1, reps) - 1]
}

fn empirical_power_value(alt_dist: &[f64], cutoff: f64) -> f64 {
    let reps = alt_dist.len();
    let exceed = alt_dist.iter().filter(|&&stat| stat >= cutoff).count();
    if exceed == 0 {
        // Monte Carlo resolution floor: never report an impossible zero
        1.0 / reps as f64
    } else {
        exceed as f64 / reps as f64
    }
}

/// One replication of the power experiment; owns nothing mutable beyond the
/// random source handed to [`Replication::run`].
struct Replication<'a, T> {
    test: &'a T,
    simulator: GaussianTwoLevel,
    membership: &'a [[usize; 2]],
    multiway: bool,
}

impl<T: PairwiseStatistic> Replication<'_, T> {
    /// Simulate, score, permute, re-score: returns the observed and
    /// permuted statistic of one fresh dataset.
    fn run<R: Rng>(&self, rng: &mut R) -> Result<(f64, f64), PowerError> {
        let data = self.simulator.simulate(rng)?;
        let (u, v) = if self.multiway {
            k_sample_transform(&data.cells, Some(&TwoLevelDesign::cell_ways()))?
        } else {
            k_sample_transform(&data.samples(), None)?
        };

        let u_dist = euclidean(&u);
        let v_dist = half_squared_euclidean(&v);
        let observed = self.test.statistic(&u_dist, &v_dist);

        // class labels: outer column relabeled to contiguous {0,1}
        let outer: Vec<usize> = self.membership.iter().map(|row| row[0]).collect();
        let (labels, _) = contiguous_labels(&outer);
        let index = GroupIndex::build(self.membership, &labels)?;

        let order = index.within_permute(rng);
        let permuted = permute_rows(&v, &order);
        let order = index.across_permute(rng)?;
        let permuted = permute_rows(&permuted, &order);

        let permuted_dist = half_squared_euclidean(&permuted);
        Ok((observed, self.test.statistic(&u_dist, &permuted_dist)))
    }
}

/// Permutation-based power estimator for the two-level two-sample design.
///
/// Runs `reps` self-contained replications (each with its own random source
/// derived from the master seed), collects the observed and permuted
/// statistic distributions, and reads the empirical power off the tail of
/// the permutation null.
#[derive(Debug, Clone)]
pub struct TwoLevelPower<T> {
    pub test: T,
    pub options: PowerOptions,
}

impl<T> TwoLevelPower<T>
where
    T: PairwiseStatistic + Sync,
{
    pub fn new(test: T, options: PowerOptions) -> Self {
        Self { test, options }
    }

    /// The observed-statistic and permuted-statistic distributions, in
    /// replication order: `(alt_dist, null_dist)`.
    ///
    /// Any replication failure aborts the whole batch; there are no partial
    /// results.
    pub fn distributions(
        &self,
        random_state: Option<u64>,
    ) -> Result<(Vec<f64>, Vec<f64>), PowerError> {
        let options = &self.options;
        if options.reps == 0 {
            return Err(PowerError::invalid("reps must be positive"));
        }
        if !(options.alpha > 0.0 && options.alpha < 1.0) {
            return Err(PowerError::invalid("alpha must lie in (0, 1)"));
        }

        let simulator = GaussianTwoLevel {
            n: options.n,
            epsilon1: options.epsilon1,
            epsilon2: options.epsilon2,
            weight: options.weight,
            case: options.case,
        };
        // surface configuration errors before any simulation runs
        simulator.validate()?;

        let membership = TwoLevelDesign::new(options.n).membership();
        let worker = Replication {
            test: &self.test,
            simulator,
            membership: &membership,
            multiway: options.multiway,
        };

        let rngs = derive_rngs(options.reps, random_state);
        let workers = options.workers.clamp(1, options.reps);
        let results = run_parallel(workers, rngs, |mut rng| worker.run(&mut rng));

        let mut alt_dist = Vec::with_capacity(options.reps);
        let mut null_dist = Vec::with_capacity(options.reps);
        for result in results {
            let (observed, permuted) = result?;
            alt_dist.push(observed);
            null_dist.push(permuted);
        }
        Ok((alt_dist, null_dist))
    }

    /// Estimate the power of the configured test: the fraction of
    /// replications whose observed statistic reaches the (1-α) permutation
    /// cutoff, floored at 1/reps.
    pub fn estimate(&self, random_state: Option<u64>) -> Result<PowerEstimate, PowerError> {
        let (alt_dist, null_dist) = self.distributions(random_state)?;
        let cutoff = critical_cutoff(&null_dist, self.options.alpha);
        Ok(PowerEstimate {
            power: empirical_power_value(&alt_dist, cutoff),
            cutoff,
            alpha: self.options.alpha,
            reps: self.options.reps,
        })
    }
}

/// One independent `StdRng` per replication, each seeded with four
/// independent 32-bit draws from the master source.
fn derive_rngs(reps: usize, random_state: Option<u64>) -> Vec<StdRng> {
    let mut master = match random_state {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    (0..reps)
        .map(|_| {
            let words = [
                master.next_u32(),
                master.next_u32(),
                master.next_u32(),
                master.next_u32(),
            ];
            let mut seed = [0u8; 32];
            for (chunk, word) in seed.chunks_exact_mut(4).zip(words.iter().cycle()) {
                chunk.copy_from_slice(&word.to_le_bytes());
            }
            StdRng::from_seed(seed)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rand::SeedableRng;
    use rand::seq::SliceRandom;
    use rand_xoshiro::Xoshiro256PlusPlus;

    use crate::independence::Dcorr;

    fn options(n: usize, epsilon1: f64, reps: usize) -> PowerOptions {
        PowerOptions {
            n,
            epsilon1,
            epsilon2: 0.0,
            reps,
            ..PowerOptions::default()
        }
    }

    #[test]
    fn cutoff_is_the_950th_smallest_at_the_default_level() {
        let mut values: Vec<f64> = (1..=1000).map(|v| v as f64).collect();
        values.shuffle(&mut Xoshiro256PlusPlus::seed_from_u64(2));
        assert_abs_diff_eq!(critical_cutoff(&values, 0.05), 950.0);
    }

    #[test]
    fn cutoff_rank_is_clamped_to_the_sample() {
        let values = vec![3.0, 1.0, 2.0];
        assert_abs_diff_eq!(critical_cutoff(&values, 0.999), 1.0);
        assert_abs_diff_eq!(critical_cutoff(&values, 1e-9), 3.0);
    }

    #[test]
    fn zero_rejections_floor_at_one_over_reps() {
        let alt = vec![0.1; 20];
        assert_abs_diff_eq!(empirical_power_value(&alt, 0.5), 0.05, epsilon = 1e-12);
        assert_abs_diff_eq!(empirical_power_value(&alt, 0.1), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn structure_names_parse_or_fail_before_any_simulation() {
        assert_eq!(
            "multilevel".parse::<PermuteStructure>().unwrap(),
            PermuteStructure::Multilevel
        );
        let err = "flat".parse::<PermuteStructure>().unwrap_err();
        assert!(matches!(err, PowerError::InvalidConfiguration(_)));
    }

    #[test]
    fn null_power_stays_near_the_level() {
        let runner = TwoLevelPower::new(Dcorr::default(), options(8, 0.0, 50));
        let estimate = runner.estimate(Some(42)).unwrap();
        assert!(
            estimate.power <= 0.3,
            "null power {} is far above alpha",
            estimate.power
        );
        assert!(estimate.power >= 1.0 / 50.0);
    }

    #[test]
    fn strong_effects_saturate_power() {
        let runner = TwoLevelPower::new(Dcorr::default(), options(10, 10.0, 40));
        let estimate = runner.estimate(Some(7)).unwrap();
        assert!(estimate.power >= 0.9, "power {} too low", estimate.power);
        assert!(estimate.power <= 1.0);
    }

    #[test]
    fn multiway_encoding_runs_end_to_end() {
        let mut opts = options(6, 5.0, 20);
        opts.multiway = true;
        let estimate = TwoLevelPower::new(Dcorr::default(), opts)
            .estimate(Some(3))
            .unwrap();
        assert!(estimate.power >= 1.0 / 20.0 && estimate.power <= 1.0);
    }

    #[test]
    fn same_master_seed_reproduces_the_estimate() {
        let runner = TwoLevelPower::new(Dcorr::default(), options(6, 1.0, 25));
        let first = runner.estimate(Some(11)).unwrap();
        let second = runner.estimate(Some(11)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn worker_count_does_not_change_the_result() {
        let mut opts = options(6, 1.0, 25);
        let sequential = TwoLevelPower::new(Dcorr::default(), opts)
            .estimate(Some(5))
            .unwrap();
        opts.workers = 4;
        let parallel = TwoLevelPower::new(Dcorr::default(), opts)
            .estimate(Some(5))
            .unwrap();
        assert_eq!(sequential, parallel);
    }

    #[test]
    fn invalid_settings_abort_before_simulation() {
        let mut opts = options(6, 0.0, 20);
        opts.alpha = 0.0;
        assert!(TwoLevelPower::new(Dcorr::default(), opts).estimate(Some(1)).is_err());

        let mut opts = options(6, 0.0, 0);
        opts.alpha = 0.05;
        assert!(TwoLevelPower::new(Dcorr::default(), opts).estimate(Some(1)).is_err());

        let mut opts = options(6, 0.0, 20);
        opts.case = 9;
        assert!(TwoLevelPower::new(Dcorr::default(), opts).estimate(Some(1)).is_err());
    }

    #[test]
    fn distributions_have_one_entry_per_replication() {
        let runner = TwoLevelPower::new(Dcorr::default(), options(5, 0.5, 12));
        let (alt, null) = runner.distributions(Some(9)).unwrap();
        assert_eq!(alt.len(), 12);
        assert_eq!(null.len(), 12);
    }
}
