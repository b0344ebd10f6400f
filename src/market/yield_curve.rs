// src/market/yield_curve.rs
//! Yield term structures
//!
//! All rates are continuously compounded. Times are year fractions measured
//! from the structure's reference date with its own day counter.

use super::day_count::DayCounter;
use crate::error::{validation::validate_finite, SdeError, SdeResult};
use crate::time_grid::Time;
use chrono::NaiveDate;
use std::fmt;

/// Step used when an instantaneous forward has to be approximated numerically.
const FORWARD_BUMP: Time = 1e-4;

pub trait YieldTermStructure: fmt::Debug + Send + Sync {
    fn reference_date(&self) -> NaiveDate;

    fn day_counter(&self) -> DayCounter;

    /// Zero rate for maturity `t`.
    fn zero_rate(&self, t: Time) -> f64;

    fn discount(&self, t: Time) -> f64 {
        (-self.zero_rate(t) * t).exp()
    }

    /// Forward rate between `t1` and `t2`.
    ///
    /// ```text
    /// f(t1, t2) = (z(t2)·t2 − z(t1)·t1) / (t2 − t1)
    /// ```
    fn forward_rate(&self, t1: Time, t2: Time) -> f64 {
        if t2 <= t1 {
            return self.instantaneous_forward(t1);
        }
        (self.zero_rate(t2) * t2 - self.zero_rate(t1) * t1) / (t2 - t1)
    }

    /// Instantaneous forward rate at `t`.
    fn instantaneous_forward(&self, t: Time) -> f64 {
        let t = t.max(0.0);
        self.forward_rate(t, t + FORWARD_BUMP)
    }

    /// Year fraction between the reference date and `date`.
    fn time_from_reference(&self, date: NaiveDate) -> Time {
        self.day_counter().year_fraction(self.reference_date(), date)
    }
}

/// Flat yield curve: the same rate for every maturity.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatForward {
    reference_date: NaiveDate,
    rate: f64,
    day_counter: DayCounter,
}

impl FlatForward {
    pub fn new(reference_date: NaiveDate, rate: f64, day_counter: DayCounter) -> SdeResult<Self> {
        validate_finite("rate", rate)?;
        Ok(FlatForward {
            reference_date,
            rate,
            day_counter,
        })
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }
}

impl YieldTermStructure for FlatForward {
    fn reference_date(&self) -> NaiveDate {
        self.reference_date
    }

    fn day_counter(&self) -> DayCounter {
        self.day_counter
    }

    fn zero_rate(&self, _t: Time) -> f64 {
        self.rate
    }

    fn forward_rate(&self, _t1: Time, _t2: Time) -> f64 {
        self.rate
    }

    fn instantaneous_forward(&self, _t: Time) -> f64 {
        self.rate
    }
}

/// Curve of piecewise-constant instantaneous forwards.
///
/// Forward `i` applies on `(t_{i-1}, t_i]`; the first forward applies up to
/// the first node and the last one beyond the last node. The first date is
/// the reference date.
#[derive(Debug, Clone, PartialEq)]
pub struct ForwardCurve {
    dates: Vec<NaiveDate>,
    times: Vec<Time>,
    forwards: Vec<f64>,
    // integral of the forward curve from 0 up to each node
    integrals: Vec<f64>,
    day_counter: DayCounter,
}

impl ForwardCurve {
    pub fn new(dates: Vec<NaiveDate>, forwards: Vec<f64>, day_counter: DayCounter) -> SdeResult<Self> {
        if dates.is_empty() || dates.len() != forwards.len() {
            return Err(SdeError::InvalidConfiguration {
                field: "forward_curve".to_string(),
                reason: format!(
                    "need matching non-empty dates and rates, got {} dates and {} rates",
                    dates.len(),
                    forwards.len()
                ),
            });
        }
        for &f in &forwards {
            validate_finite("forward_rate", f)?;
        }
        if dates.windows(2).any(|w| w[1] <= w[0]) {
            return Err(SdeError::InvalidConfiguration {
                field: "forward_curve".to_string(),
                reason: "dates must be strictly increasing".to_string(),
            });
        }

        let reference = dates[0];
        let times: Vec<Time> = dates
            .iter()
            .map(|&d| day_counter.year_fraction(reference, d))
            .collect();

        let mut integrals = Vec::with_capacity(times.len());
        integrals.push(0.0);
        for i in 1..times.len() {
            let prev = integrals[i - 1];
            integrals.push(prev + forwards[i] * (times[i] - times[i - 1]));
        }

        Ok(ForwardCurve {
            dates,
            times,
            forwards,
            integrals,
            day_counter,
        })
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    fn integrated_forward(&self, t: Time) -> f64 {
        if t <= 0.0 {
            return 0.0;
        }
        let last = self.times.len() - 1;
        if t > self.times[last] {
            return self.integrals[last] + self.forwards[last] * (t - self.times[last]);
        }
        // first node with t_i >= t; node 0 sits at t = 0 so i >= 1
        let i = self.times.partition_point(|&ti| ti < t);
        self.integrals[i - 1] + self.forwards[i] * (t - self.times[i - 1])
    }
}

impl YieldTermStructure for ForwardCurve {
    fn reference_date(&self) -> NaiveDate {
        self.dates[0]
    }

    fn day_counter(&self) -> DayCounter {
        self.day_counter
    }

    fn zero_rate(&self, t: Time) -> f64 {
        if t <= 0.0 {
            return self.instantaneous_forward(0.0);
        }
        self.integrated_forward(t) / t
    }

    fn instantaneous_forward(&self, t: Time) -> f64 {
        if t <= 0.0 {
            return self.forwards[0];
        }
        let last = self.times.len() - 1;
        if t > self.times[last] {
            return self.forwards[last];
        }
        self.forwards[self.times.partition_point(|&ti| ti < t)]
    }
}
