// src/market/volatility.rs
//! Black volatility term structures
//!
//! `black_vol(t, K)` is the implied volatility for expiry `t`, and
//! `black_variance(t, K) = σ(t, K)²·t` the total variance up to `t`.
//! `local_vol` is the instantaneous volatility a time-stepping process sees at
//! `t`, i.e. the square root of the slope of the total variance.

use super::day_count::DayCounter;
use super::quote::{Quote, SimpleQuote};
use crate::error::{validation::validate_positive, SdeError, SdeResult};
use crate::time_grid::Time;
use chrono::NaiveDate;
use std::fmt;
use std::sync::Arc;

/// Shortest expiry used when a volatility is requested at `t = 0`.
const MIN_EXPIRY: Time = 1e-5;

/// Step for numerical differentiation of the total variance.
const VARIANCE_BUMP: Time = 1e-4;

pub trait BlackVolTermStructure: fmt::Debug + Send + Sync {
    fn reference_date(&self) -> NaiveDate;

    fn day_counter(&self) -> DayCounter;

    fn black_variance(&self, t: Time, strike: f64) -> f64;

    fn black_vol(&self, t: Time, strike: f64) -> f64 {
        let t = t.max(MIN_EXPIRY);
        (self.black_variance(t, strike) / t).sqrt()
    }

    /// Instantaneous volatility at `t`, from the forward variance slope.
    fn local_vol(&self, t: Time, strike: f64) -> f64 {
        let t = t.max(0.0);
        let slope = (self.black_variance(t + VARIANCE_BUMP, strike)
            - self.black_variance(t, strike))
            / VARIANCE_BUMP;
        slope.max(0.0).sqrt()
    }

    fn time_from_reference(&self, date: NaiveDate) -> Time {
        self.day_counter().year_fraction(self.reference_date(), date)
    }
}

/// Constant Black volatility for every strike and expiry.
#[derive(Debug, Clone)]
pub struct BlackConstantVol {
    reference_date: NaiveDate,
    volatility: Arc<dyn Quote>,
    day_counter: DayCounter,
}

impl BlackConstantVol {
    pub fn new(reference_date: NaiveDate, volatility: f64, day_counter: DayCounter) -> Self {
        Self::with_quote(
            reference_date,
            Arc::new(SimpleQuote::new(volatility)),
            day_counter,
        )
    }

    pub fn with_quote(
        reference_date: NaiveDate,
        volatility: Arc<dyn Quote>,
        day_counter: DayCounter,
    ) -> Self {
        BlackConstantVol {
            reference_date,
            volatility,
            day_counter,
        }
    }
}

impl BlackVolTermStructure for BlackConstantVol {
    fn reference_date(&self) -> NaiveDate {
        self.reference_date
    }

    fn day_counter(&self) -> DayCounter {
        self.day_counter
    }

    fn black_variance(&self, t: Time, _strike: f64) -> f64 {
        let sigma = self.volatility.value();
        sigma * sigma * t.max(0.0)
    }

    fn black_vol(&self, _t: Time, _strike: f64) -> f64 {
        self.volatility.value()
    }

    fn local_vol(&self, _t: Time, _strike: f64) -> f64 {
        self.volatility.value()
    }
}

/// Strike-independent Black variance curve.
///
/// Total variance is interpolated linearly in time between the node dates,
/// starts from zero at the reference date and is extrapolated with flat
/// volatility beyond the last node.
#[derive(Debug, Clone, PartialEq)]
pub struct BlackVarianceCurve {
    reference_date: NaiveDate,
    // node times including the t = 0 anchor
    times: Vec<Time>,
    variances: Vec<f64>,
    day_counter: DayCounter,
}

impl BlackVarianceCurve {
    pub fn new(
        reference_date: NaiveDate,
        dates: &[NaiveDate],
        volatilities: &[f64],
        day_counter: DayCounter,
    ) -> SdeResult<Self> {
        if dates.is_empty() || dates.len() != volatilities.len() {
            return Err(SdeError::InvalidConfiguration {
                field: "variance_curve".to_string(),
                reason: format!(
                    "need matching non-empty dates and volatilities, got {} and {}",
                    dates.len(),
                    volatilities.len()
                ),
            });
        }

        let mut times = Vec::with_capacity(dates.len() + 1);
        let mut variances = Vec::with_capacity(dates.len() + 1);
        times.push(0.0);
        variances.push(0.0);

        for (&date, &vol) in dates.iter().zip(volatilities) {
            validate_positive("volatility", vol)?;
            let t = day_counter.year_fraction(reference_date, date);
            let last_t = times[times.len() - 1];
            if t <= last_t {
                return Err(SdeError::InvalidConfiguration {
                    field: "variance_curve".to_string(),
                    reason: format!("dates must be strictly increasing and after {}", reference_date),
                });
            }
            let variance = vol * vol * t;
            let last_variance = variances[variances.len() - 1];
            if variance < last_variance {
                return Err(SdeError::InvalidParameters {
                    parameter: "black_variance".to_string(),
                    value: variance,
                    constraint: format!("must be non-decreasing in time (previous {})", last_variance),
                });
            }
            times.push(t);
            variances.push(variance);
        }

        Ok(BlackVarianceCurve {
            reference_date,
            times,
            variances,
            day_counter,
        })
    }

    fn last_node(&self) -> (Time, f64) {
        let last = self.times.len() - 1;
        (self.times[last], self.variances[last])
    }

    // segment [t_{i-1}, t_i] containing t, with t clamped inside the node range
    fn segment(&self, t: Time) -> usize {
        self.times
            .partition_point(|&ti| ti <= t)
            .clamp(1, self.times.len() - 1)
    }
}

impl BlackVolTermStructure for BlackVarianceCurve {
    fn reference_date(&self) -> NaiveDate {
        self.reference_date
    }

    fn day_counter(&self) -> DayCounter {
        self.day_counter
    }

    fn black_variance(&self, t: Time, _strike: f64) -> f64 {
        if t <= 0.0 {
            return 0.0;
        }
        let (last_t, last_var) = self.last_node();
        if t > last_t {
            return last_var * t / last_t;
        }
        let i = self.segment(t);
        let (t0, t1) = (self.times[i - 1], self.times[i]);
        let (v0, v1) = (self.variances[i - 1], self.variances[i]);
        v0 + (v1 - v0) * (t - t0) / (t1 - t0)
    }

    fn local_vol(&self, t: Time, _strike: f64) -> f64 {
        let (last_t, last_var) = self.last_node();
        if t >= last_t {
            return (last_var / last_t).sqrt();
        }
        let i = self.segment(t.max(0.0));
        let slope = (self.variances[i] - self.variances[i - 1]) / (self.times[i] - self.times[i - 1]);
        slope.sqrt()
    }
}
