// src/path/brownian_bridge.rs
//! Brownian bridge construction
//!
//! # Algorithm
//!
//! The terminal value `W(t_n)` is drawn first from the first normal. Each
//! further normal fills the midpoint of the widest remaining gap `(t_j, t_k)`
//! conditionally on its two ends:
//! ```text
//! W(t_l) = a·W(t_j) + b·W(t_k) + s·Z
//! a = (t_k − t_l)/(t_k − t_j),  b = (t_l − t_j)/(t_k − t_j)
//! s² = (t_l − t_j)(t_k − t_l)/(t_k − t_j)
//! ```
//! The output is converted back to per-step normals `ΔW_i / √Δt_i`, so the
//! transform is an orthogonal map on the input vector and can replace the
//! raw draws one for one.

use crate::error::{SdeError, SdeResult};
use crate::time_grid::TimeGrid;

#[derive(Debug, Clone, PartialEq)]
pub struct BrownianBridge {
    // grid times excluding t = 0
    times: Vec<f64>,
    sqrt_dt: Vec<f64>,
    bridge_index: Vec<usize>,
    left_index: Vec<usize>,
    right_index: Vec<usize>,
    left_weight: Vec<f64>,
    right_weight: Vec<f64>,
    std_dev: Vec<f64>,
}

impl BrownianBridge {
    pub fn new(grid: &TimeGrid) -> Self {
        let times = grid.times()[1..].to_vec();
        let size = times.len();

        let mut sqrt_dt = Vec::with_capacity(size);
        sqrt_dt.push(times[0].sqrt());
        for i in 1..size {
            sqrt_dt.push((times[i] - times[i - 1]).sqrt());
        }

        let mut bridge = BrownianBridge {
            times,
            sqrt_dt,
            bridge_index: vec![0; size],
            left_index: vec![0; size],
            right_index: vec![0; size],
            left_weight: vec![0.0; size],
            right_weight: vec![0.0; size],
            std_dev: vec![0.0; size],
        };
        bridge.initialize();
        bridge
    }

    fn initialize(&mut self) {
        let size = self.times.len();
        let t = &self.times;
        // map[i] != 0 once point i has been constructed
        let mut map = vec![0_usize; size];

        map[size - 1] = 1;
        self.bridge_index[0] = size - 1;
        self.std_dev[0] = t[size - 1].sqrt();

        let mut j = 0;
        for i in 1..size {
            while map[j] != 0 {
                j += 1;
            }
            let mut k = j;
            while map[k] == 0 {
                k += 1;
            }
            // midpoint of the gap [j, k-1]
            let l = j + ((k - 1 - j) >> 1);
            map[l] = i;

            self.bridge_index[i] = l;
            self.left_index[i] = j;
            self.right_index[i] = k;
            if j != 0 {
                let span = t[k] - t[j - 1];
                self.left_weight[i] = (t[k] - t[l]) / span;
                self.right_weight[i] = (t[l] - t[j - 1]) / span;
                self.std_dev[i] = ((t[l] - t[j - 1]) * (t[k] - t[l]) / span).sqrt();
            } else {
                self.left_weight[i] = (t[k] - t[l]) / t[k];
                self.right_weight[i] = t[l] / t[k];
                self.std_dev[i] = (t[l] * (t[k] - t[l]) / t[k]).sqrt();
            }

            j = k + 1;
            if j >= size {
                j = 0;
            }
        }
    }

    pub fn size(&self) -> usize {
        self.times.len()
    }

    /// Map independent normals to normalized per-step Brownian increments.
    pub fn transform(&self, input: &[f64], output: &mut [f64]) -> SdeResult<()> {
        let size = self.size();
        if input.len() != size || output.len() != size {
            return Err(SdeError::configuration(
                "brownian_bridge",
                format!(
                    "expected {} draws, got input {} and output {}",
                    size,
                    input.len(),
                    output.len()
                ),
            ));
        }

        output[size - 1] = self.std_dev[0] * input[0];
        for i in 1..size {
            let j = self.left_index[i];
            let k = self.right_index[i];
            let l = self.bridge_index[i];
            output[l] = if j != 0 {
                self.left_weight[i] * output[j - 1]
                    + self.right_weight[i] * output[k]
                    + self.std_dev[i] * input[i]
            } else {
                self.right_weight[i] * output[k] + self.std_dev[i] * input[i]
            };
        }

        // Brownian values to normalized increments
        for i in (1..size).rev() {
            output[i] -= output[i - 1];
            output[i] /= self.sqrt_dt[i];
        }
        output[0] /= self.sqrt_dt[0];
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn irregular_grid() -> TimeGrid {
        TimeGrid::from_times(vec![0.0, 0.1, 0.35, 0.5, 1.2, 1.3, 2.0, 3.0]).unwrap()
    }

    #[test]
    fn single_step_is_identity() {
        let bridge = BrownianBridge::new(&TimeGrid::new(3.0, 1).unwrap());
        let mut out = [0.0];
        bridge.transform(&[0.75], &mut out).unwrap();
        assert_abs_diff_eq!(out[0], 0.75, epsilon = 1e-14);
    }

    #[test]
    fn first_draw_sets_terminal_value() {
        let grid = irregular_grid();
        let bridge = BrownianBridge::new(&grid);
        let input = [1.3, -0.2, 0.5, 0.9, -1.1, 0.05, 0.4];
        let mut out = [0.0; 7];
        bridge.transform(&input, &mut out).unwrap();

        let terminal: f64 = out
            .iter()
            .enumerate()
            .map(|(i, z)| z * grid.dt(i).sqrt())
            .sum();
        assert_abs_diff_eq!(terminal, 3.0_f64.sqrt() * 1.3, epsilon = 1e-12);
    }

    #[test]
    fn transform_preserves_euclidean_norm() {
        // identity covariance in and out makes the map orthogonal
        let bridge = BrownianBridge::new(&irregular_grid());
        let input = [0.3, -1.7, 0.2, 2.1, -0.6, 0.8, -0.1];
        let mut out = [0.0; 7];
        bridge.transform(&input, &mut out).unwrap();
        let norm_in: f64 = input.iter().map(|z| z * z).sum();
        let norm_out: f64 = out.iter().map(|z| z * z).sum();
        assert_abs_diff_eq!(norm_in, norm_out, epsilon = 1e-12);
    }

    #[test]
    fn every_point_is_constructed_once() {
        let bridge = BrownianBridge::new(&TimeGrid::new(1.0, 13).unwrap());
        let mut seen = bridge.bridge_index.clone();
        seen.sort_unstable();
        assert_eq!(seen, (0..13).collect::<Vec<_>>());
    }

    #[test]
    fn rejects_wrong_length() {
        let bridge = BrownianBridge::new(&TimeGrid::new(1.0, 4).unwrap());
        let mut out = [0.0; 4];
        assert!(bridge.transform(&[0.0; 3], &mut out).is_err());
    }
}
