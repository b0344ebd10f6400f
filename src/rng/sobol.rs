// src/rng/sobol.rs
use super::{splitmix64, RandomSequenceGenerator};
use crate::error::{SdeError, SdeResult};
use crate::math_utils::inverse_norm_cdf;

pub const SOBOL_MAX_DIMENSIONS: usize = 21_201;

// 2^-52
const INV_2_52: f64 = 1.0 / 4_503_599_627_370_496.0;

/// Scrambled base-2 digital sequence mapped to standard normals.
///
/// Dimension 0 uses the canonical van der Corput direction numbers; the
/// others use seeded odd direction integers, which keeps every
/// one-dimensional projection stratified. These are not the Joe-Kuo Sobol
/// direction numbers, so the joint distribution of two or more dimensions
/// carries no low-discrepancy guarantee and behaves closer to a stratified
/// random sample. Points are generated in Gray-code order, one xor per
/// dimension.
#[derive(Debug, Clone)]
pub struct SobolSequence {
    index: u64,
    state: Vec<u64>,
    directions: Vec<[u64; 64]>,
    scramblers: Vec<u64>,
    uniforms: Vec<f64>,
    sequence: Vec<f64>,
}

impl SobolSequence {
    pub fn new(dimension: usize, seed: u64) -> SdeResult<Self> {
        if !(1..=SOBOL_MAX_DIMENSIONS).contains(&dimension) {
            return Err(SdeError::configuration(
                "dimension",
                format!(
                    "Sobol dimension {} outside [1, {}]",
                    dimension, SOBOL_MAX_DIMENSIONS
                ),
            ));
        }

        let directions = (0..dimension as u64)
            .map(|dim| direction_numbers(dim, seed))
            .collect();
        let scramblers = (0..dimension as u64)
            .map(|dim| splitmix64(seed ^ ((dim + 1) << 32)))
            .collect();

        Ok(Self {
            index: 0,
            state: vec![0; dimension],
            directions,
            scramblers,
            uniforms: vec![0.0; dimension],
            sequence: vec![0.0; dimension],
        })
    }

    /// Uniform coordinates of the latest point, all in (0, 1).
    pub fn last_uniforms(&self) -> &[f64] {
        &self.uniforms
    }

    fn advance(&mut self) {
        self.index = self.index.wrapping_add(1);
        // index 0 would repeat the origin; skip it on wrap-around
        if self.index == 0 {
            self.index = 1;
        }
        let c = self.index.trailing_zeros() as usize;
        for dim in 0..self.state.len() {
            self.state[dim] ^= self.directions[dim][c];
            let scrambled = self.state[dim] ^ self.scramblers[dim];
            // top 52 bits, centred in their cell: exact, never 0 or 1
            self.uniforms[dim] = ((scrambled >> 12) as f64 + 0.5) * INV_2_52;
        }
    }
}

impl RandomSequenceGenerator for SobolSequence {
    fn dimension(&self) -> usize {
        self.sequence.len()
    }

    fn next_sequence(&mut self) -> &[f64] {
        self.advance();
        for (z, &u) in self.sequence.iter_mut().zip(&self.uniforms) {
            *z = inverse_norm_cdf(u);
        }
        &self.sequence
    }

    fn last_sequence(&self) -> &[f64] {
        &self.sequence
    }

    fn allows_error_estimate(&self) -> bool {
        false
    }
}

fn direction_numbers(dim: u64, seed: u64) -> [u64; 64] {
    let mut v = [0_u64; 64];
    if dim == 0 {
        for (j, item) in v.iter_mut().enumerate() {
            *item = 1_u64 << (63 - j);
        }
        return v;
    }
    for (j, item) in v.iter_mut().enumerate() {
        let hash = splitmix64(seed ^ ((dim + 1) << 40) ^ j as u64);
        let mask = if j == 63 {
            u64::MAX
        } else {
            (1_u64 << (j + 1)) - 1
        };
        *item = ((hash | 1) & mask) << (63 - j);
    }
    v
}
