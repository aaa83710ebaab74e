use ahash::AHashSet;
use rand::Rng;

use crate::codec::Index;

/// One training row: (user index, item index, label)
pub type Sample = (Index, Index, f32);

/// Draws unobserved items for each positive pair
///
/// A user's positive set is excluded with an O(1) lookup.
/// Attempts are bounded at `10 * per_positive`, so a user who interacted with
/// (almost) every item simply ends up with fewer negatives.
pub struct NegativeSampler {
    positives: Vec<AHashSet<Index>>,
    item_count: usize,
    per_positive: usize,
}

impl NegativeSampler {
    pub fn new(pairs: &[(Index, Index)], user_count: usize, item_count: usize, per_positive: usize) -> Self {
        let mut positives = vec![AHashSet::new(); user_count];
        for &(u, i) in pairs {
            positives[u].insert(i);
        }
        Self {
            positives,
            item_count,
            per_positive,
        }
    }

    /// Positive pairs with label 1 followed by their sampled negatives with label 0
    /// Returns the samples and the number of negatives that could not be drawn.
    pub fn samples<R: Rng>(&self, pairs: &[(Index, Index)], rng: &mut R) -> (Vec<Sample>, usize) {
        let mut samples: Vec<Sample> = Vec::with_capacity(pairs.len() * (1 + self.per_positive));
        samples.extend(pairs.iter().map(|&(u, i)| (u, i, 1.0)));
        if self.per_positive == 0 || self.item_count == 0 {
            return (samples, 0);
        }

        let mut shortfall = 0;
        let max_attempts = self.per_positive * 10;
        for &(u, _) in pairs {
            let pos_set = &self.positives[u];
            if pos_set.len() >= self.item_count {
                // 全 item と相互作用済み
                shortfall += self.per_positive;
                continue;
            }
            let mut drawn = 0;
            let mut attempts = 0;
            while drawn < self.per_positive && attempts < max_attempts {
                let item = rng.gen_range(0..self.item_count);
                if !pos_set.contains(&item) {
                    samples.push((u, item, 0.0));
                    drawn += 1;
                }
                attempts += 1;
            }
            shortfall += self.per_positive - drawn;
        }
        (samples, shortfall)
    }
}
