// src/analytics/mod.rs
//! Closed-form reference prices.

pub mod asian_geometric;
pub mod bs_analytic;
