// src/rng/pseudo_random.rs
use super::RandomSequenceGenerator;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, StandardNormal};

/// Pseudo-random normal vectors from a seeded `StdRng`.
#[derive(Debug, Clone)]
pub struct PseudoRandomSequence {
    rng: StdRng,
    seed: u64,
    sequence: Vec<f64>,
}

impl PseudoRandomSequence {
    pub fn new(dimension: usize, seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            seed,
            sequence: vec![0.0; dimension],
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl RandomSequenceGenerator for PseudoRandomSequence {
    fn dimension(&self) -> usize {
        self.sequence.len()
    }

    fn next_sequence(&mut self) -> &[f64] {
        for z in self.sequence.iter_mut() {
            *z = StandardNormal.sample(&mut self.rng);
        }
        &self.sequence
    }

    fn last_sequence(&self) -> &[f64] {
        &self.sequence
    }

    fn allows_error_estimate(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reproducibility() {
        let mut rsg1 = PseudoRandomSequence::new(5, 42);
        let mut rsg2 = PseudoRandomSequence::new(5, 42);

        for _ in 0..100 {
            assert_eq!(rsg1.next_sequence(), rsg2.next_sequence());
        }
    }

    #[test]
    fn test_different_seeds() {
        let mut rsg1 = PseudoRandomSequence::new(10, 42);
        let mut rsg2 = PseudoRandomSequence::new(10, 43);
        assert_ne!(rsg1.next_sequence().to_vec(), rsg2.next_sequence().to_vec());
    }

    #[test]
    fn test_last_sequence_tracks_latest_draw() {
        let mut rsg = PseudoRandomSequence::new(3, 1);
        let drawn = rsg.next_sequence().to_vec();
        assert_eq!(rsg.last_sequence(), drawn.as_slice());
    }

    #[test]
    fn test_normal_distribution() {
        let mut rsg = PseudoRandomSequence::new(1, 42);

        let samples: Vec<f64> = (0..10000).map(|_| rsg.next_sequence()[0]).collect();

        let mean = samples.iter().sum::<f64>() / samples.len() as f64;
        let variance =
            samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / samples.len() as f64;

        assert!(mean.abs() < 0.05, "Mean should be close to 0, got {}", mean);
        assert!(
            (variance - 1.0).abs() < 0.05,
            "Variance should be close to 1, got {}",
            variance
        );
    }
}
