// src/process/constant.rs
//! Black-Scholes process with parameters frozen at a horizon
//!
//! # Mathematical Framework
//!
//! At construction the term structures are sampled once at the horizon `T`:
//! ```text
//! r = z_r(T),  q = z_q(T),  σ = σ_Black(T, S_0)
//! μ = r − q − ½σ²
//! ```
//!
//! With constant coefficients the log-price increment over any `Δt` is
//! exactly normal, so
//! ```text
//! S_{t+Δt} = S_t · exp(μ Δt + σ √Δt Z)
//! ```
//! is the transition density of GBM, with no bias in the step size.

use super::black_scholes::BlackScholesProcess;
use super::StochasticProcess;
use crate::error::validation::{ensure_finite_frozen, ensure_positive_frozen, validate_positive};
use crate::error::{SdeError, SdeResult};
use crate::market::{BlackVolTermStructure, Quote, YieldTermStructure};
use crate::time_grid::Time;
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::debug;

/// Where the frozen volatility is read from.
#[derive(Debug, Clone)]
pub enum VolatilitySource {
    /// Black volatility surface, sampled at the horizon and the spot.
    Surface(Arc<dyn BlackVolTermStructure>),
    /// A single flat volatility quote.
    FlatQuote(Arc<dyn Quote>),
}

impl VolatilitySource {
    fn black_vol(&self, t: Time, strike: f64) -> f64 {
        match self {
            VolatilitySource::Surface(surface) => surface.black_vol(t, strike),
            VolatilitySource::FlatQuote(quote) => quote.value(),
        }
    }
}

/// Evaluation horizon at which the parameters are frozen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Horizon {
    Time(Time),
    Date(NaiveDate),
}

#[derive(Debug, Clone)]
pub struct ConstantParameterProcess {
    x0: Arc<dyn Quote>,
    dividend_yield: Arc<dyn YieldTermStructure>,
    risk_free_rate: Arc<dyn YieldTermStructure>,
    volatility: VolatilitySource,
    horizon: Time,
    risk_free_forward: f64,
    dividend_forward: f64,
    sigma: f64,
    drift: f64,
    expected_log_return: f64,
    step_std_dev: f64,
}

impl ConstantParameterProcess {
    pub fn builder() -> ConstantParameterProcessBuilder {
        ConstantParameterProcessBuilder::default()
    }

    /// Freeze the term structures of a general process at `horizon`.
    pub fn from_process(process: &BlackScholesProcess, horizon: Time) -> SdeResult<Self> {
        Self::builder()
            .spot(process.state_variable().clone())
            .dividend_yield(process.dividend_yield().clone())
            .risk_free_rate(process.risk_free_rate().clone())
            .volatility(VolatilitySource::Surface(process.black_volatility().clone()))
            .horizon(horizon)
            .build()
    }

    pub fn horizon(&self) -> Time {
        self.horizon
    }

    pub fn frozen_drift(&self) -> f64 {
        self.drift
    }

    pub fn frozen_volatility(&self) -> f64 {
        self.sigma
    }

    pub fn frozen_risk_free_rate(&self) -> f64 {
        self.risk_free_forward
    }

    pub fn frozen_dividend_rate(&self) -> f64 {
        self.dividend_forward
    }

    /// `horizon · μ`
    pub fn expected_log_return(&self) -> f64 {
        self.expected_log_return
    }

    /// `√horizon · σ`
    pub fn step_std_dev(&self) -> f64 {
        self.step_std_dev
    }

    /// Single exact step from 0 to the horizon.
    pub fn evolve_to_horizon(&self, x0: f64, dw: f64) -> f64 {
        self.apply(x0, self.expected_log_return + self.step_std_dev * dw)
    }

    pub fn volatility_source(&self) -> &VolatilitySource {
        &self.volatility
    }

    pub fn dividend_yield(&self) -> &Arc<dyn YieldTermStructure> {
        &self.dividend_yield
    }

    pub fn risk_free_rate(&self) -> &Arc<dyn YieldTermStructure> {
        &self.risk_free_rate
    }
}

impl StochasticProcess for ConstantParameterProcess {
    fn x0(&self) -> f64 {
        self.x0.value()
    }

    fn drift(&self, _t: Time, _x: f64) -> f64 {
        self.drift
    }

    fn diffusion(&self, _t: Time, _x: f64) -> f64 {
        self.sigma
    }

    fn evolve(&self, _t0: Time, x0: f64, dt: Time, dw: f64) -> f64 {
        // same operation order as expected_log_return/step_std_dev
        self.apply(x0, dt * self.drift + (dt.sqrt() * self.sigma) * dw)
    }

    fn time(&self, date: NaiveDate) -> Time {
        self.risk_free_rate.time_from_reference(date)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConstantParameterProcessBuilder {
    spot: Option<Arc<dyn Quote>>,
    dividend_yield: Option<Arc<dyn YieldTermStructure>>,
    risk_free_rate: Option<Arc<dyn YieldTermStructure>>,
    volatility: Option<VolatilitySource>,
    horizon: Option<Horizon>,
}

impl ConstantParameterProcessBuilder {
    pub fn spot(mut self, spot: Arc<dyn Quote>) -> Self {
        self.spot = Some(spot);
        self
    }

    pub fn dividend_yield(mut self, curve: Arc<dyn YieldTermStructure>) -> Self {
        self.dividend_yield = Some(curve);
        self
    }

    pub fn risk_free_rate(mut self, curve: Arc<dyn YieldTermStructure>) -> Self {
        self.risk_free_rate = Some(curve);
        self
    }

    pub fn volatility(mut self, source: VolatilitySource) -> Self {
        self.volatility = Some(source);
        self
    }

    pub fn black_volatility(self, surface: Arc<dyn BlackVolTermStructure>) -> Self {
        self.volatility(VolatilitySource::Surface(surface))
    }

    pub fn flat_volatility(self, quote: Arc<dyn Quote>) -> Self {
        self.volatility(VolatilitySource::FlatQuote(quote))
    }

    pub fn horizon(mut self, t: Time) -> Self {
        self.horizon = Some(Horizon::Time(t));
        self
    }

    pub fn horizon_date(mut self, date: NaiveDate) -> Self {
        self.horizon = Some(Horizon::Date(date));
        self
    }

    pub fn build(self) -> SdeResult<ConstantParameterProcess> {
        let x0 = self.spot.ok_or_else(|| missing("spot"))?;
        let dividend_yield = self.dividend_yield.ok_or_else(|| missing("dividend_yield"))?;
        let risk_free_rate = self.risk_free_rate.ok_or_else(|| missing("risk_free_rate"))?;
        let volatility = self.volatility.ok_or_else(|| missing("volatility"))?;
        let horizon = match self.horizon.ok_or_else(|| missing("horizon"))? {
            Horizon::Time(t) => t,
            Horizon::Date(date) => risk_free_rate.time_from_reference(date),
        };
        if !horizon.is_finite() || horizon <= 0.0 {
            return Err(SdeError::configuration(
                "horizon",
                format!("must be a positive year fraction, got {}", horizon),
            ));
        }

        let spot = x0.value();
        validate_positive("spot", spot)?;

        let risk_free_forward = risk_free_rate.zero_rate(horizon);
        let dividend_forward = dividend_yield.zero_rate(horizon);
        let sigma = volatility.black_vol(horizon, spot);
        ensure_finite_frozen("risk_free_rate", risk_free_forward)?;
        ensure_finite_frozen("dividend_yield", dividend_forward)?;
        ensure_positive_frozen("volatility", sigma)?;

        let drift = risk_free_forward - dividend_forward - 0.5 * sigma * sigma;
        let expected_log_return = horizon * drift;
        let step_std_dev = horizon.sqrt() * sigma;

        debug!(
            horizon,
            risk_free_forward,
            dividend_forward,
            sigma,
            drift,
            "froze constant-parameter process"
        );

        Ok(ConstantParameterProcess {
            x0,
            dividend_yield,
            risk_free_rate,
            volatility,
            horizon,
            risk_free_forward,
            dividend_forward,
            sigma,
            drift,
            expected_log_return,
            step_std_dev,
        })
    }
}

fn missing(field: &str) -> SdeError {
    SdeError::configuration(field, "not given")
}
