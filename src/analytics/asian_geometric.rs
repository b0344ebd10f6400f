// src/analytics/asian_geometric.rs
//! Discrete geometric average price options
//!
//! # Mathematical Foundation
//!
//! Under flat `r`, `q` and `σ` the geometric average of the fixings
//! `G = (∏ S(t_i))^(1/N)` is lognormal:
//! ```text
//! ln G ~ N(μ_G, v_G)
//! μ_G = ln S + (r − q − σ²/2) · (1/N) ∑ t_i
//! v_G = σ²/N² · ∑_i ∑_j min(t_i, t_j)
//! ```
//! so the option is a Black formula on `G` discounted from the payment time.
//! The arithmetic average is strongly correlated with `G`, which makes this
//! price the natural control for arithmetic Asian options.

use crate::error::{validation::*, SdeError, SdeResult};
use crate::math_utils::norm_cdf;

/// Price of a discrete geometric average price option
///
/// `fixing_times` must be strictly increasing and positive; the payoff is paid
/// at `maturity`.
#[allow(clippy::too_many_arguments)]
pub fn discrete_geometric_average_price(
    is_call: bool,
    s: f64,
    k: f64,
    r: f64,
    q: f64,
    sigma: f64,
    fixing_times: &[f64],
    maturity: f64,
) -> SdeResult<f64> {
    validate_positive("s", s)?;
    validate_positive("k", k)?;
    validate_finite("r", r)?;
    validate_finite("q", q)?;
    validate_positive("sigma", sigma)?;
    validate_positive("maturity", maturity)?;
    if fixing_times.is_empty() {
        return Err(SdeError::configuration("fixing_times", "no fixings given"));
    }
    for &t in fixing_times {
        validate_positive("fixing_time", t)?;
    }
    if fixing_times.windows(2).any(|w| w[1] <= w[0]) {
        return Err(SdeError::configuration(
            "fixing_times",
            "fixings must be strictly increasing",
        ));
    }

    let n = fixing_times.len() as f64;
    let mean_time = fixing_times.iter().sum::<f64>() / n;
    // ∑_i ∑_j min(t_i, t_j) for sorted times: t_i appears 2(N − i) + 1 times
    let min_sum: f64 = fixing_times
        .iter()
        .enumerate()
        .map(|(i, &t)| t * (2.0 * (n - i as f64) - 1.0))
        .sum();

    let mu = s.ln() + (r - q - 0.5 * sigma * sigma) * mean_time;
    let variance = sigma * sigma * min_sum / (n * n);
    let std_dev = variance.sqrt();
    let forward = (mu + 0.5 * variance).exp();
    let discount = (-r * maturity).exp();

    let d1 = (mu - k.ln() + variance) / std_dev;
    let d2 = d1 - std_dev;
    let undiscounted = if is_call {
        forward * norm_cdf(d1) - k * norm_cdf(d2)
    } else {
        k * norm_cdf(-d2) - forward * norm_cdf(-d1)
    };
    Ok(discount * undiscounted)
}
