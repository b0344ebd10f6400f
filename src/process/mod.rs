// src/process/mod.rs
//! Stochastic processes for the log of an asset price
//!
//! Two variants sit behind one interface:
//!
//! - [`BlackScholesProcess`]: drift and volatility are read from the live
//!   term structures at every step and advanced with an Euler scheme.
//! - [`ConstantParameterProcess`]: drift and volatility are frozen once at a
//!   horizon, and each step is the exact lognormal transition.
//!
//! Both apply a log-increment the same way, `x · exp(Δ)`, which is what makes
//! them interchangeable inside a path generator fed by the same draws.
//! [`Process`] is the closed set of the two, so every `evolve` implementation
//! is enumerable.

pub mod black_scholes;
pub mod constant;
pub mod discretization;

pub use black_scholes::BlackScholesProcess;
pub use constant::{ConstantParameterProcess, ConstantParameterProcessBuilder, Horizon, VolatilitySource};
pub use discretization::EulerDiscretization;

use crate::error::{SdeError, SdeResult};
use crate::time_grid::Time;
use chrono::NaiveDate;
use std::fmt;
use std::sync::Arc;

pub trait StochasticProcess: fmt::Debug + Send + Sync {
    /// Current state (spot).
    fn x0(&self) -> f64;

    /// Number of Brownian factors driving the process.
    fn factors(&self) -> usize {
        1
    }

    /// Drift of the log-state at `(t, x)`.
    fn drift(&self, t: Time, x: f64) -> f64;

    /// Volatility of the log-state at `(t, x)`.
    fn diffusion(&self, t: Time, x: f64) -> f64;

    /// Apply a log-increment: `x0 · exp(dx)`.
    fn apply(&self, x0: f64, dx: f64) -> f64 {
        x0 * dx.exp()
    }

    fn std_deviation(&self, t0: Time, x0: f64, dt: Time) -> f64 {
        self.diffusion(t0, x0) * dt.sqrt()
    }

    /// Not provided: `evolve` already encodes mean and variance of the step.
    fn expectation(&self, _t0: Time, _x0: f64, _dt: Time) -> SdeResult<f64> {
        Err(SdeError::UnsupportedOperation {
            operation: "expectation".to_string(),
            context: "log-state processes are advanced with evolve()".to_string(),
        })
    }

    /// State at `t0 + dt` given the state at `t0` and a standard normal draw.
    fn evolve(&self, t0: Time, x0: f64, dt: Time, dw: f64) -> f64;

    /// Year fraction from the process reference date to `date`.
    fn time(&self, date: NaiveDate) -> Time;
}

/// The two process variants a path generator can be driven by.
#[derive(Debug, Clone)]
pub enum Process {
    General(Arc<BlackScholesProcess>),
    ConstantParameter(Arc<ConstantParameterProcess>),
}

impl Process {
    pub fn is_constant_parameter(&self) -> bool {
        matches!(self, Process::ConstantParameter(_))
    }

    fn inner(&self) -> &dyn StochasticProcess {
        match self {
            Process::General(p) => p.as_ref(),
            Process::ConstantParameter(p) => p.as_ref(),
        }
    }
}

impl StochasticProcess for Process {
    fn x0(&self) -> f64 {
        self.inner().x0()
    }

    fn factors(&self) -> usize {
        self.inner().factors()
    }

    fn drift(&self, t: Time, x: f64) -> f64 {
        self.inner().drift(t, x)
    }

    fn diffusion(&self, t: Time, x: f64) -> f64 {
        self.inner().diffusion(t, x)
    }

    fn apply(&self, x0: f64, dx: f64) -> f64 {
        self.inner().apply(x0, dx)
    }

    fn std_deviation(&self, t0: Time, x0: f64, dt: Time) -> f64 {
        self.inner().std_deviation(t0, x0, dt)
    }

    fn expectation(&self, t0: Time, x0: f64, dt: Time) -> SdeResult<f64> {
        self.inner().expectation(t0, x0, dt)
    }

    fn evolve(&self, t0: Time, x0: f64, dt: Time, dw: f64) -> f64 {
        match self {
            Process::General(p) => p.evolve(t0, x0, dt, dw),
            Process::ConstantParameter(p) => p.evolve(t0, x0, dt, dw),
        }
    }

    fn time(&self, date: NaiveDate) -> Time {
        self.inner().time(date)
    }
}

impl From<BlackScholesProcess> for Process {
    fn from(process: BlackScholesProcess) -> Self {
        Process::General(Arc::new(process))
    }
}

impl From<ConstantParameterProcess> for Process {
    fn from(process: ConstantParameterProcess) -> Self {
        Process::ConstantParameter(Arc::new(process))
    }
}
