//! Option Payoff Functions and Path Pricers
//!
//! # Mathematical Definitions
//!
//! ## European Options
//! - **Call**: max(S_T - K, 0)
//! - **Put**: max(K - S_T, 0)
//!
//! ## Arithmetic Average Price Options
//! - **Call**: max(A - K, 0), A = (1/n) ∑ S(t_i)
//! - **Put**: max(K - A, 0)
//!
//! ## Geometric Average Price Options
//! - **Call**: max(G - K, 0), G = (∏ S(t_i))^(1/n)
//! - **Put**: max(K - G, 0)
//!
//! Geometric averages have a closed form under constant parameters and
//! serve as the control for their arithmetic counterparts.
//!
//! The average runs over the fixings at every grid time after t = 0, so the
//! engine's time grid doubles as the fixing schedule.

use crate::market::YieldTermStructure;
use crate::path::SamplePath;
use crate::time_grid::Time;

/// Supported option payoffs
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Payoff {
    /// European call option: max(S_T - K, 0)
    EuropeanCall { k: f64 },

    /// European put option: max(K - S_T, 0)
    EuropeanPut { k: f64 },

    /// Arithmetic average price call: max(A - K, 0)
    AsianCall { k: f64 },

    /// Arithmetic average price put: max(K - A, 0)
    AsianPut { k: f64 },

    /// Geometric average price call: max(G - K, 0)
    GeometricAsianCall { k: f64 },

    /// Geometric average price put: max(K - G, 0)
    GeometricAsianPut { k: f64 },
}

impl Payoff {
    /// Undiscounted payoff of one simulated path.
    pub fn calculate(&self, path: &SamplePath) -> f64 {
        match *self {
            Payoff::EuropeanCall { k } => (path.back() - k).max(0.0),
            Payoff::EuropeanPut { k } => (k - path.back()).max(0.0),
            Payoff::AsianCall { k } => (arithmetic_average(path) - k).max(0.0),
            Payoff::AsianPut { k } => (k - arithmetic_average(path)).max(0.0),
            Payoff::GeometricAsianCall { k } => (geometric_average(path) - k).max(0.0),
            Payoff::GeometricAsianPut { k } => (k - geometric_average(path)).max(0.0),
        }
    }

    pub fn strike(&self) -> f64 {
        match *self {
            Payoff::EuropeanCall { k }
            | Payoff::EuropeanPut { k }
            | Payoff::AsianCall { k }
            | Payoff::AsianPut { k }
            | Payoff::GeometricAsianCall { k }
            | Payoff::GeometricAsianPut { k } => k,
        }
    }

    pub fn is_path_dependent(&self) -> bool {
        !matches!(self, Payoff::EuropeanCall { .. } | Payoff::EuropeanPut { .. })
    }

    pub fn is_call(&self) -> bool {
        matches!(
            self,
            Payoff::EuropeanCall { .. } | Payoff::AsianCall { .. } | Payoff::GeometricAsianCall { .. }
        )
    }

    /// Geometric payoff on the same fixings, the control for an arithmetic one.
    pub fn geometric_counterpart(&self) -> Option<Payoff> {
        match *self {
            Payoff::AsianCall { k } => Some(Payoff::GeometricAsianCall { k }),
            Payoff::AsianPut { k } => Some(Payoff::GeometricAsianPut { k }),
            _ => None,
        }
    }
}

// average of the fixings after t = 0
fn arithmetic_average(path: &SamplePath) -> f64 {
    let fixings = &path.values()[1..];
    fixings.iter().sum::<f64>() / fixings.len() as f64
}

fn geometric_average(path: &SamplePath) -> f64 {
    let fixings = &path.values()[1..];
    (fixings.iter().map(|s| s.ln()).sum::<f64>() / fixings.len() as f64).exp()
}

/// Maps a simulated path to one discounted value.
pub trait PathPricer: Send + Sync {
    fn price(&self, path: &SamplePath) -> f64;
}

/// Payoff at maturity discounted with a fixed factor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiscountedPayoffPricer {
    payoff: Payoff,
    discount: f64,
}

impl DiscountedPayoffPricer {
    pub fn new(payoff: Payoff, discount: f64) -> Self {
        DiscountedPayoffPricer { payoff, discount }
    }

    /// Discount factor read from `curve` at `maturity`.
    pub fn from_curve(payoff: Payoff, curve: &dyn YieldTermStructure, maturity: Time) -> Self {
        Self::new(payoff, curve.discount(maturity))
    }

    pub fn payoff(&self) -> Payoff {
        self.payoff
    }

    pub fn discount(&self) -> f64 {
        self.discount
    }
}

impl PathPricer for DiscountedPayoffPricer {
    fn price(&self, path: &SamplePath) -> f64 {
        self.discount * self.payoff.calculate(path)
    }
}
