use std::collections::BTreeMap;

use ndarray::{Array2, Axis};

use crate::PowerError;

mod across;
mod within;

/// Apply a row reordering: row `i` of the result is row `order[i]` of the
/// input.
pub fn permute_rows<A: Clone>(data: &Array2<A>, order: &[usize]) -> Array2<A> {
    debug_assert_eq!(data.nrows(), order.len());
    data.select(Axis(0), order)
}

/// Stable relabeling of arbitrary integer labels to contiguous `0..k`,
/// assigned in ascending label-value order.
pub fn contiguous_labels(values: &[usize]) -> (Vec<usize>, usize) {
    let mut sorted: Vec<usize> = values.to_vec();
    sorted.sort_unstable();
    sorted.dedup();
    let relabeled = values
        .iter()
        .map(|v| sorted.binary_search(v).expect("value came from the input"))
        .collect();
    (relabeled, sorted.len())
}

/// Per-replication index bookkeeping for the two-level permutation scheme.
///
/// Holds three views of the same observation indices: inner-group lists for
/// within-group shuffling, class pools seeding the across-group draw, and
/// outer-group blocks sorted descending by size: larger blocks have fewer
/// remaining combinatorial placements and must be resolved before the pools
/// shrink. Ties keep first-seen outer-label order, which makes the block
/// sequence deterministic.
///
/// Built freshly for every replication: the across step consumes its pools
/// destructively, so nothing here may be shared between replications.
#[derive(Debug, Clone)]
pub struct GroupIndex {
    len: usize,
    within: Vec<Vec<usize>>,
    class_pools: [Vec<usize>; 2],
    across: Vec<Vec<usize>>,
}

impl GroupIndex {
    /// Bucket observation indices by the `[outer, inner]` membership rows
    /// and the per-observation class labels.
    ///
    /// Outer and inner label cardinality must both be exactly 2 (the
    /// two-sample, two-level assumption); anything else is a configuration
    /// error, as is a membership/label length mismatch.
    pub fn build(
        membership: &[[usize; 2]],
        class_labels: &[usize],
    ) -> Result<Self, PowerError> {
        if membership.is_empty() {
            return Err(PowerError::invalid("group membership must be non-empty"));
        }
        if membership.len() != class_labels.len() {
            return Err(PowerError::invalid(format!(
                "{} membership rows but {} class labels",
                membership.len(),
                class_labels.len()
            )));
        }

        let mut inner_buckets: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for (i, row) in membership.iter().enumerate() {
            inner_buckets.entry(row[1]).or_default().push(i);
        }
        if inner_buckets.len() != 2 {
            return Err(PowerError::invalid(format!(
                "expected exactly 2 inner groups, found {}",
                inner_buckets.len()
            )));
        }

        let mut class_pools: [Vec<usize>; 2] = [Vec::new(), Vec::new()];
        for (i, &label) in class_labels.iter().enumerate() {
            if label > 1 {
                return Err(PowerError::invalid(format!(
                    "class labels must be 0 or 1, found {label}"
                )));
            }
            class_pools[label].push(i);
        }
        if class_pools.iter().any(Vec::is_empty) {
            return Err(PowerError::invalid(
                "two-sample test needs observations in both classes",
            ));
        }

        // outer blocks keep first-seen order so the descending sort is stable
        let mut outer_blocks: Vec<(usize, Vec<usize>)> = Vec::new();
        for (i, row) in membership.iter().enumerate() {
            match outer_blocks.iter_mut().find(|(label, _)| *label == row[0]) {
                Some((_, block)) => block.push(i),
                None => outer_blocks.push((row[0], vec![i])),
            }
        }
        if outer_blocks.len() != 2 {
            return Err(PowerError::invalid(format!(
                "expected exactly 2 outer groups, found {}",
                outer_blocks.len()
            )));
        }
        outer_blocks.sort_by(|a, b| b.1.len().cmp(&a.1.len()));

        Ok(Self {
            len: membership.len(),
            within: inner_buckets.into_values().collect(),
            class_pools,
            across: outer_blocks.into_iter().map(|(_, block)| block).collect(),
        })
    }

    /// Total number of observations.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Sizes of the two class pools.
    pub fn class_sizes(&self) -> [usize; 2] {
        [self.class_pools[0].len(), self.class_pools[1].len()]
    }
}
