// src/process/black_scholes.rs
use super::discretization::EulerDiscretization;
use super::StochasticProcess;
use crate::market::{BlackVolTermStructure, Quote, YieldTermStructure};
use crate::time_grid::Time;
use chrono::NaiveDate;
use std::sync::Arc;

/// Black-Scholes process with time-dependent term structures.
///
/// The log-state follows
/// ```text
/// d ln S_t = (f_r(t) − f_q(t) − ½ σ_loc(t, S_t)²) dt + σ_loc(t, S_t) dW_t
/// ```
/// where `f_r`, `f_q` are instantaneous forwards of the risk-free and dividend
/// curves and `σ_loc` the local volatility implied by the Black surface.
/// Every call to `drift` and `diffusion` queries the live structures.
#[derive(Debug, Clone)]
pub struct BlackScholesProcess {
    x0: Arc<dyn Quote>,
    dividend_yield: Arc<dyn YieldTermStructure>,
    risk_free_rate: Arc<dyn YieldTermStructure>,
    black_volatility: Arc<dyn BlackVolTermStructure>,
    discretization: EulerDiscretization,
}

impl BlackScholesProcess {
    pub fn new(
        x0: Arc<dyn Quote>,
        dividend_yield: Arc<dyn YieldTermStructure>,
        risk_free_rate: Arc<dyn YieldTermStructure>,
        black_volatility: Arc<dyn BlackVolTermStructure>,
    ) -> Self {
        BlackScholesProcess {
            x0,
            dividend_yield,
            risk_free_rate,
            black_volatility,
            discretization: EulerDiscretization::new(),
        }
    }

    pub fn state_variable(&self) -> &Arc<dyn Quote> {
        &self.x0
    }

    pub fn dividend_yield(&self) -> &Arc<dyn YieldTermStructure> {
        &self.dividend_yield
    }

    pub fn risk_free_rate(&self) -> &Arc<dyn YieldTermStructure> {
        &self.risk_free_rate
    }

    pub fn black_volatility(&self) -> &Arc<dyn BlackVolTermStructure> {
        &self.black_volatility
    }
}

impl StochasticProcess for BlackScholesProcess {
    fn x0(&self) -> f64 {
        self.x0.value()
    }

    fn drift(&self, t: Time, x: f64) -> f64 {
        let sigma = self.diffusion(t, x);
        self.risk_free_rate.instantaneous_forward(t)
            - self.dividend_yield.instantaneous_forward(t)
            - 0.5 * sigma * sigma
    }

    fn diffusion(&self, t: Time, x: f64) -> f64 {
        self.black_volatility.local_vol(t, x)
    }

    fn evolve(&self, t0: Time, x0: f64, dt: Time, dw: f64) -> f64 {
        let dx = self.discretization.drift(self, t0, x0, dt)
            + self.discretization.diffusion(self, t0, x0, dt) * dw;
        self.apply(x0, dx)
    }

    fn time(&self, date: NaiveDate) -> Time {
        self.risk_free_rate.time_from_reference(date)
    }
}
