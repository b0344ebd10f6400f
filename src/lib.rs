//! # const-sde: Monte Carlo with Frozen-Parameter and Time-Varying Black-Scholes Processes
//!
//! A Rust library for pricing options by Monte Carlo simulation of a
//! Black-Scholes asset under two interchangeable process models.
//!
//! ## Key Features
//!
//! - **Two process variants**: a general process that reads live yield and
//!   volatility term structures at every Euler step, and a constant-parameter
//!   process frozen at a horizon that evolves with the exact lognormal step
//! - **Model switch**: run both variants over the same seed, grid and pricer
//!   to separate model-structure error from discretization error
//! - **Variance Reduction**: antithetic variates, Sobol sequences and
//!   Brownian-bridge path construction
//! - **Stopping rules**: fixed sample count or absolute tolerance with a
//!   sample budget
//! - **Parallel batches** with Rayon, merged in a fixed order
//!
//! ## Quick Start
//!
//! ```rust
//! use chrono::NaiveDate;
//! use const_sde::market::{BlackConstantVol, DayCounter, FlatForward, SimpleQuote};
//! use const_sde::mc::{McEngine, Payoff};
//! use const_sde::process::BlackScholesProcess;
//! use std::sync::Arc;
//!
//! # fn main() -> const_sde::SdeResult<()> {
//! let today = NaiveDate::from_ymd_opt(1998, 5, 15).unwrap();
//! let dc = DayCounter::Actual365Fixed;
//! let process = Arc::new(BlackScholesProcess::new(
//!     Arc::new(SimpleQuote::new(36.0)),
//!     Arc::new(FlatForward::new(today, 0.0, dc)?),
//!     Arc::new(FlatForward::new(today, 0.06, dc)?),
//!     Arc::new(BlackConstantVol::new(today, 0.20, dc)),
//! ));
//!
//! let mut engine = McEngine::builder(process)
//!     .with_steps(1)
//!     .with_samples(10_000)
//!     .with_antithetic_variate(true)
//!     .with_seed(42)
//!     .with_maturity(3.0)
//!     .with_payoff(Payoff::EuropeanPut { k: 40.0 })
//!     .with_constant_parameter_model(true)
//!     .build()?;
//!
//! let result = engine.calculate()?;
//! println!("Put price: {:.4} ± {:.4}", result.price, result.error_estimate.unwrap_or(0.0));
//! # Ok(())
//! # }
//! ```

// Module declarations
pub mod analytics;
pub mod error;
pub mod market;
pub mod math_utils;
pub mod mc;
pub mod path;
pub mod process;
pub mod rng;
pub mod time_grid;

// Re-export commonly used types for convenience
pub use error::{SdeError, SdeResult};
pub use mc::{McConfig, McEngine, McEngineBuilder, McResult};
pub use process::{BlackScholesProcess, ConstantParameterProcess, Process, StochasticProcess};
pub use time_grid::{Time, TimeGrid};
