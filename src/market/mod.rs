// src/market/mod.rs
//! Market data consumed by the processes
//!
//! Spot quotes, yield term structures and Black volatility term structures.
//! The core only queries these; every object is immutable once built and is
//! shared between processes and engines through `Arc`.

pub mod day_count;
pub mod quote;
pub mod volatility;
pub mod yield_curve;

pub use day_count::DayCounter;
pub use quote::{Quote, SimpleQuote};
pub use volatility::{BlackConstantVol, BlackVarianceCurve, BlackVolTermStructure};
pub use yield_curve::{FlatForward, ForwardCurve, YieldTermStructure};
