// src/mc/mod.rs
//! Monte Carlo pricing: payoffs, running statistics, configuration and the
//! sampling engine.

pub mod config;
pub mod engine;
pub mod payoffs;
pub mod statistics;

pub use config::{ConvergenceCriterion, McConfig, StepRule, VarianceReduction};
pub use engine::{EngineState, McEngine, McEngineBuilder, McResult, ProcessSelector};
pub use payoffs::{DiscountedPayoffPricer, PathPricer, Payoff};
pub use statistics::RunningStatistics;
