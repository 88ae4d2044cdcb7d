use rand::Rng;
use rand::seq::SliceRandom;

use super::GroupIndex;

impl GroupIndex {
    /// Reorder observations inside each inner group, never across groups.
    ///
    /// Every inner group's index list is shuffled independently and the
    /// draw is scattered back over the positions the group occupies,
    /// yielding a full-length `order` vector (row `i` of the permuted data
    /// comes from row `order[i]`). The result is a bijection on `0..len`
    /// that maps every index to an index of the same inner group, and is
    /// deterministic given the generator state.
    pub fn within_permute<R: Rng>(&self, rng: &mut R) -> Vec<usize> {
        let mut order = vec![0usize; self.len];
        for group in &self.within {
            let mut drawn = group.clone();
            drawn.shuffle(rng);
            for (&position, &source) in group.iter().zip(&drawn) {
                order[position] = source;
            }
        }
        order
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use itertools::Itertools;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256PlusPlus;

    use crate::sim::TwoLevelDesign;

    fn index_for(n: usize) -> (GroupIndex, Vec<[usize; 2]>) {
        let membership = TwoLevelDesign::new(n).membership();
        let labels: Vec<usize> = membership.iter().map(|row| row[0]).collect();
        (GroupIndex::build(&membership, &labels).unwrap(), membership)
    }

    #[test]
    fn order_is_a_bijection() {
        let (index, _) = index_for(6);
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(5);
        for _ in 0..20 {
            let order = index.within_permute(&mut rng);
            let sorted: Vec<usize> = order.iter().copied().sorted().collect();
            assert_eq!(sorted, (0..24).collect::<Vec<_>>());
        }
    }

    #[test]
    fn mapping_never_leaves_the_inner_group() {
        let (index, membership) = index_for(5);
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(41);
        for _ in 0..20 {
            let order = index.within_permute(&mut rng);
            for (i, &source) in order.iter().enumerate() {
                assert_eq!(
                    membership[i][1], membership[source][1],
                    "position {i} drew from a different inner group"
                );
            }
        }
    }

    #[test]
    fn deterministic_given_the_seed() {
        let (index, _) = index_for(4);
        let mut rng_a = Xoshiro256PlusPlus::seed_from_u64(1234);
        let mut rng_b = Xoshiro256PlusPlus::seed_from_u64(1234);
        assert_eq!(
            index.within_permute(&mut rng_a),
            index.within_permute(&mut rng_b)
        );
    }
}
