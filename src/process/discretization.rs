// src/process/discretization.rs
//! Euler Scheme for the Log-State of a Process
//!
//! # Mathematical Framework
//!
//! For a process whose log-state follows
//! ```text
//! d ln X_t = μ(t, X_t) dt + σ(t, X_t) dW_t
//! ```
//!
//! the Euler scheme freezes the coefficients at the start of each step:
//! ```text
//! Δ ln X ≈ μ(t_n, X_n) Δt + σ(t_n, X_n) √Δt Z_n
//! ```
//!
//! # Convergence Properties
//!
//! - **Weak convergence**: Order 1.0 in step size
//! - Exact when μ and σ do not move over the step, otherwise biased by how
//!   much the live term structures change inside `[t_n, t_n + Δt]`

use super::StochasticProcess;
use crate::time_grid::Time;

/// Euler discretization of drift and diffusion over one step
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EulerDiscretization;

impl EulerDiscretization {
    pub fn new() -> Self {
        EulerDiscretization
    }

    /// Drift contribution `μ(t0, x0) Δt`
    pub fn drift<P: StochasticProcess + ?Sized>(&self, process: &P, t0: Time, x0: f64, dt: Time) -> f64 {
        process.drift(t0, x0) * dt
    }

    /// Standard deviation `σ(t0, x0) √Δt`
    pub fn diffusion<P: StochasticProcess + ?Sized>(
        &self,
        process: &P,
        t0: Time,
        x0: f64,
        dt: Time,
    ) -> f64 {
        process.diffusion(t0, x0) * dt.sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::{BlackConstantVol, DayCounter, FlatForward, SimpleQuote};
    use crate::process::BlackScholesProcess;
    use approx::assert_abs_diff_eq;
    use chrono::NaiveDate;
    use std::sync::Arc;

    #[test]
    fn euler_terms_scale_with_step() {
        let today = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        let dc = DayCounter::Actual365Fixed;
        let process = BlackScholesProcess::new(
            Arc::new(SimpleQuote::new(100.0)),
            Arc::new(FlatForward::new(today, 0.01, dc).unwrap()),
            Arc::new(FlatForward::new(today, 0.05, dc).unwrap()),
            Arc::new(BlackConstantVol::new(today, 0.3, dc)),
        );
        let euler = EulerDiscretization::new();
        let mu = 0.05 - 0.01 - 0.5 * 0.09;

        assert_abs_diff_eq!(euler.drift(&process, 0.0, 100.0, 0.5), mu * 0.5, epsilon = 1e-15);
        assert_abs_diff_eq!(euler.diffusion(&process, 0.0, 100.0, 0.25), 0.15, epsilon = 1e-15);
    }
}
