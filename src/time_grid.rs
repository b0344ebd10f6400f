// src/time_grid.rs
use crate::error::{validation::*, SdeError, SdeResult};

/// Time measured in years.
pub type Time = f64;

/// Strictly increasing sequence of simulation times starting at 0.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeGrid {
    times: Vec<Time>,
    dt: Vec<Time>,
}

impl TimeGrid {
    /// Regular grid with `steps` equal intervals on `[0, end]`.
    pub fn new(end: Time, steps: usize) -> SdeResult<Self> {
        validate_positive("end", end)?;
        validate_steps(steps)?;
        let dt = end / steps as f64;
        let mut times: Vec<Time> = (0..=steps).map(|i| i as f64 * dt).collect();
        // pin the last point so the horizon is hit exactly
        times[steps] = end;
        Self::from_times(times)
    }

    /// Grid from explicit times; the first one must be 0.
    pub fn from_times(times: Vec<Time>) -> SdeResult<Self> {
        if times.len() < 2 {
            return Err(SdeError::configuration(
                "time_grid",
                "needs at least one step after t = 0",
            ));
        }
        if times[0] != 0.0 {
            return Err(SdeError::configuration("time_grid", "must start at t = 0"));
        }
        for &t in &times {
            validate_finite("time", t)?;
        }
        if times.windows(2).any(|w| w[1] <= w[0]) {
            return Err(SdeError::configuration(
                "time_grid",
                "times must be strictly increasing",
            ));
        }
        let dt = times.windows(2).map(|w| w[1] - w[0]).collect();
        Ok(TimeGrid { times, dt })
    }

    /// Number of points, including t = 0.
    pub fn size(&self) -> usize {
        self.times.len()
    }

    pub fn steps(&self) -> usize {
        self.dt.len()
    }

    pub fn times(&self) -> &[Time] {
        &self.times
    }

    pub fn dt(&self, i: usize) -> Time {
        self.dt[i]
    }

    pub fn back(&self) -> Time {
        self.times[self.times.len() - 1]
    }
}
