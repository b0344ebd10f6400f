// src/rng/mod.rs
//! Random Sequence Generation for Monte Carlo Simulations
//!
//! # Design Philosophy
//!
//! A path needs one standard normal draw per time step (per factor), so the
//! engine pulls whole vectors of draws at a time from a
//! [`RandomSequenceGenerator`] of fixed dimension:
//! 1. **Reproducibility**: same seed and dimension → same sequence of vectors
//! 2. **Exclusive ownership**: a generator belongs to one engine run; its
//!    cursor advances by exactly one vector per path
//! 3. **Parallel batches**: independent streams come from disjoint seeds
//!    derived by [`RngFactory`], never from sharing a generator
//!
//! # Policies
//!
//! - [`RngPolicy::PseudoRandom`]: `StdRng` with Ziggurat normals. Supports
//!   error estimates, so it may be used with a tolerance stopping rule.
//! - [`RngPolicy::LowDiscrepancy`]: scrambled base-2 digital points mapped
//!   through the inverse normal CDF. Each coordinate is stratified on its own;
//!   see [`SobolSequence`] for what that leaves out. Draws are not independent, so the sample standard
//!   error is meaningless and no error estimate is offered.

mod pseudo_random;
mod sobol;

pub use pseudo_random::PseudoRandomSequence;
pub use sobol::{SobolSequence, SOBOL_MAX_DIMENSIONS};

use crate::error::{SdeError, SdeResult};
use serde::{Deserialize, Serialize};

/// Source of fixed-dimension vectors of standard normal draws.
pub trait RandomSequenceGenerator: Send {
    fn dimension(&self) -> usize;

    /// Advance by one vector and return it.
    fn next_sequence(&mut self) -> &[f64];

    /// The vector returned by the latest call to `next_sequence`.
    fn last_sequence(&self) -> &[f64];

    /// Whether sample statistics of this generator yield a valid error estimate.
    fn allows_error_estimate(&self) -> bool;
}

/// Which family of sequence generator an engine draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RngPolicy {
    #[default]
    PseudoRandom,
    LowDiscrepancy,
}

impl RngPolicy {
    pub fn allows_error_estimate(&self) -> bool {
        matches!(self, RngPolicy::PseudoRandom)
    }

    pub fn make_sequence_generator(
        &self,
        dimension: usize,
        seed: u64,
    ) -> SdeResult<Box<dyn RandomSequenceGenerator>> {
        if dimension == 0 {
            return Err(SdeError::configuration(
                "dimension",
                "sequence generator needs at least one dimension",
            ));
        }
        match self {
            RngPolicy::PseudoRandom => Ok(Box::new(PseudoRandomSequence::new(dimension, seed))),
            RngPolicy::LowDiscrepancy => Ok(Box::new(SobolSequence::new(dimension, seed)?)),
        }
    }
}

/// Derives disjoint seeds for parallel batches of one run
pub struct RngFactory {
    base_seed: u64,
}

impl RngFactory {
    pub fn new(base_seed: u64) -> Self {
        Self { base_seed }
    }

    /// Seed of the stream feeding batch `batch`
    ///
    /// splitmix64 of `base_seed + golden_gamma · (batch + 1)`, so neighbouring
    /// batches and neighbouring base seeds do not share streams.
    pub fn stream_seed(&self, batch: u64) -> u64 {
        splitmix64(
            self.base_seed
                .wrapping_add(0x9E37_79B9_7F4A_7C15u64.wrapping_mul(batch.wrapping_add(1))),
        )
    }
}

pub(crate) fn splitmix64(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58476d1ce4e5b9u64);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d049bb133111ebu64);
    z ^ (z >> 31)
}
