// src/analytics/bs_analytic.rs
//! Analytical Black-Scholes formulas for European options
//!
//! # Mathematical Foundation
//!
//! With a continuous dividend yield `q` the underlying follows
//! ```text
//! dS_t = (r − q) S_t dt + σ S_t dW_t
//! ```
//! and European prices have closed forms in the cumulative normal Φ(x).
//! They serve as reference values for the Monte Carlo engine.

use crate::error::{validation::*, SdeResult};
use crate::math_utils::norm_cdf;

fn d1_d2(s: f64, k: f64, r: f64, q: f64, sigma: f64, t: f64) -> (f64, f64) {
    let vol_sqrt_t = sigma * t.sqrt();
    let d1 = ((s / k).ln() + (r - q + 0.5 * sigma * sigma) * t) / vol_sqrt_t;
    (d1, d1 - vol_sqrt_t)
}

/// Black-Scholes European call option price
///
/// # Formula
/// ```text
/// C = S e^(-qT) Φ(d₁) − K e^(-rT) Φ(d₂)
/// d₁ = [ln(S/K) + (r − q + σ²/2)T] / (σ√T)
/// d₂ = d₁ − σ√T
/// ```
pub fn bs_call_price(s: f64, k: f64, r: f64, q: f64, sigma: f64, t: f64) -> f64 {
    let (d1, d2) = d1_d2(s, k, r, q, sigma, t);
    s * (-q * t).exp() * norm_cdf(d1) - k * (-r * t).exp() * norm_cdf(d2)
}

/// Black-Scholes European put option price
///
/// # Formula
/// ```text
/// P = K e^(-rT) Φ(-d₂) − S e^(-qT) Φ(-d₁)
/// ```
pub fn bs_put_price(s: f64, k: f64, r: f64, q: f64, sigma: f64, t: f64) -> f64 {
    let (d1, d2) = d1_d2(s, k, r, q, sigma, t);
    k * (-r * t).exp() * norm_cdf(-d2) - s * (-q * t).exp() * norm_cdf(-d1)
}

/// Validated call/put price
pub fn european_price(
    is_call: bool,
    s: f64,
    k: f64,
    r: f64,
    q: f64,
    sigma: f64,
    t: f64,
) -> SdeResult<f64> {
    validate_positive("s", s)?;
    validate_positive("k", k)?;
    validate_finite("r", r)?;
    validate_finite("q", q)?;
    validate_positive("sigma", sigma)?;
    validate_positive("t", t)?;
    Ok(if is_call {
        bs_call_price(s, k, r, q, sigma, t)
    } else {
        bs_put_price(s, k, r, q, sigma, t)
    })
}
