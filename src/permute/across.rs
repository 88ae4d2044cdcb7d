use rand::Rng;

use super::GroupIndex;
use crate::PowerError;
use crate::math::{falling_factorial, ln_falling_factorial};

/// Direct falling-factorial products stay inside `f64` range as long as no
/// pool exceeds this size; beyond it the ratio is formed in log space.
const EXACT_POOL_MAX: usize = 170;

/// Probability that a block of `block` indices is drawn from class 0, given
/// the remaining pool sizes: each class is weighted by the number of ordered
/// ways its pool can supply the block.
///
/// An exhausted pool keeps the residual weight 1 from the falling-factorial
/// base case, so its selection probability is tiny but not zero; the
/// insufficient-pool guard in [`GroupIndex::across_permute`] covers that
/// sliver.
fn class_zero_probability(pool0: usize, pool1: usize, block: usize) -> f64 {
    if pool0.max(pool1) <= EXACT_POOL_MAX {
        let p0 = falling_factorial(pool0 as u64, block as u64);
        let p1 = falling_factorial(pool1 as u64, block as u64);
        p0 / (p0 + p1)
    } else {
        let l0 = ln_falling_factorial(pool0 as u64, block as u64);
        let l1 = ln_falling_factorial(pool1 as u64, block as u64);
        1.0 / (1.0 + (l1 - l0).exp())
    }
}

impl GroupIndex {
    /// Reassign whole outer-group blocks to class pools.
    ///
    /// Blocks are processed in the fixed descending-size order. For each
    /// block one uniform draw picks a class with probability proportional
    /// to its falling-factorial capacity weight, then exactly `block` size
    /// indices are popped off that pool's end and scattered, in pop order,
    /// over the block's positions. The pools are a fresh copy per call;
    /// under a balanced design they are exactly exhausted when the last
    /// block is placed.
    ///
    /// A pop that would exceed the chosen pool is an internal-invariant
    /// violation under correct group balance and fails with
    /// [`PowerError::InvalidConfiguration`].
    pub fn across_permute<R: Rng>(&self, rng: &mut R) -> Result<Vec<usize>, PowerError> {
        let mut pools = self.class_pools.clone();
        let mut order = vec![0usize; self.len];
        for block in &self.across {
            let size = block.len();
            let p0 = class_zero_probability(pools[0].len(), pools[1].len(), size);
            let chosen = if rng.gen_range(0.0..1.0) < p0 { 0 } else { 1 };

            let pool = &mut pools[chosen];
            if pool.len() < size {
                return Err(PowerError::invalid(format!(
                    "class pool {chosen} exhausted: block needs {size} indices, {} left",
                    pool.len()
                )));
            }
            let mut taken = pool.split_off(pool.len() - size);
            taken.reverse();
            for (&position, source) in block.iter().zip(taken) {
                order[position] = source;
            }
        }
        Ok(order)
    }
}
