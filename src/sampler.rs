//! Row sampling ahead of each boosting round.

use rand::rngs::StdRng;
use rand::Rng;

/// A sampler subsets the row index ahead of fitting a new tree.
pub trait Sampler {
    /// Returns the rows chosen for training and the rows excluded.
    fn sample(&mut self, rng: &mut StdRng, index: &[u32]) -> (Vec<u32>, Vec<u32>);
}

/// Bernoulli row sampling at a fixed rate. One draw per row, taken from the
/// single training-wide RNG stream so results depend only on the seed.
pub struct RandomSampler {
    subsample: f32,
}

impl RandomSampler {
    pub fn new(subsample: f32) -> Self {
        RandomSampler { subsample }
    }
}

impl Sampler for RandomSampler {
    fn sample(&mut self, rng: &mut StdRng, index: &[u32]) -> (Vec<u32>, Vec<u32>) {
        let mut chosen = Vec::with_capacity((index.len() as f32 * self.subsample) as usize);
        let mut excluded = Vec::new();
        for i in index {
            if rng.random::<f32>() < self.subsample {
                chosen.push(*i);
            } else {
                excluded.push(*i);
            }
        }
        (chosen, excluded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_sampler_rate_and_partition() {
        let index: Vec<u32> = (0..10_000).collect();
        let mut rng = StdRng::seed_from_u64(7);
        let mut sampler = RandomSampler::new(0.7);
        let (chosen, excluded) = sampler.sample(&mut rng, &index);
        assert_eq!(chosen.len() + excluded.len(), index.len());
        let rate = chosen.len() as f32 / index.len() as f32;
        assert!((rate - 0.7).abs() < 0.02);
        // Order within each side is preserved.
        assert!(chosen.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_sampler_is_deterministic() {
        let index: Vec<u32> = (0..1000).collect();
        let mut a = StdRng::seed_from_u64(42);
        let mut b = StdRng::seed_from_u64(42);
        let (chosen_a, _) = RandomSampler::new(0.5).sample(&mut a, &index);
        let (chosen_b, _) = RandomSampler::new(0.5).sample(&mut b, &index);
        assert_eq!(chosen_a, chosen_b);
    }
}
