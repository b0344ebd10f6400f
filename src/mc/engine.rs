// src/mc/engine.rs
//! Monte Carlo engine
//!
//! # Sampling loop
//!
//! Each sample is one priced path (or, with antithetic variates, the average
//! of a path and its mirror). Samples feed a [`RunningStatistics`]; the run
//! stops on one of two rules:
//!
//! - **Fixed samples**: exactly `n` samples.
//! - **Tolerance**: start with `min(1023, max_samples)` samples, then while
//!   the standard error exceeds the tolerance draw
//!   ```text
//!   next = max(n·(ε/tol)²·0.8 − n, 1023)
//!   ```
//!   more, capped by the remaining budget. Hitting `max_samples` first ends
//!   in [`EngineState::ExhaustedBudget`] with `tolerance_met = false`.
//!
//! # Process selection
//!
//! The engine owns a [`ProcessSelector`] rather than a process: switching to
//! the constant-parameter model swaps the process fed to the path generator
//! and leaves seed, grid and pricer untouched, so both models can be run
//! back to back over the same random stream.
//!
//! # Control variate
//!
//! With a control pricer `X` of known value `E[X]` each sample becomes
//! ```text
//! Y − (X − E[X])
//! ```
//! Arithmetic Asian payoffs get the geometric average option on the same
//! fixings as their default control, valued in closed form with the rates and
//! volatility frozen at maturity.

use super::config::{ConvergenceCriterion, McConfig, VarianceReduction};
use super::payoffs::{DiscountedPayoffPricer, PathPricer, Payoff};
use super::statistics::RunningStatistics;
use crate::analytics::asian_geometric::discrete_geometric_average_price;
use crate::error::{validation::validate_positive, SdeError, SdeResult};
use crate::math_utils::Timer;
use crate::path::{PathGenerator, SamplePath};
use crate::process::{BlackScholesProcess, ConstantParameterProcess, Process, StochasticProcess};
use crate::rng::{RngFactory, RngPolicy};
use crate::time_grid::{Time, TimeGrid};
use chrono::NaiveDate;
use rayon::prelude::*;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Smallest batch drawn by the tolerance loop.
const MIN_BATCH: usize = 1023;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Configured,
    Sampling,
    Converged,
    ExhaustedBudget,
}

#[derive(Debug, Clone, PartialEq)]
pub struct McResult {
    pub price: f64,
    /// Standard error of `price`; `None` for low-discrepancy runs or a single sample.
    pub error_estimate: Option<f64>,
    pub samples: usize,
    pub tolerance_met: bool,
    pub state: EngineState,
    pub elapsed_ms: f64,
}

/// Chooses which process variant drives the path generator.
#[derive(Debug, Clone)]
pub struct ProcessSelector {
    general: Arc<BlackScholesProcess>,
    horizon: Option<Time>,
    constant_parameter: bool,
}

impl ProcessSelector {
    pub fn new(general: Arc<BlackScholesProcess>, horizon: Option<Time>) -> Self {
        ProcessSelector {
            general,
            horizon,
            constant_parameter: false,
        }
    }

    pub fn with_constant_parameter_model(mut self, enabled: bool) -> Self {
        self.constant_parameter = enabled;
        self
    }

    pub fn uses_constant_parameter_model(&self) -> bool {
        self.constant_parameter
    }

    /// The general process as is, or a fresh copy frozen at the horizon.
    pub fn select(&self) -> SdeResult<Process> {
        if !self.constant_parameter {
            return Ok(Process::General(self.general.clone()));
        }
        let horizon = self
            .horizon
            .ok_or_else(|| SdeError::configuration("horizon", "not given"))?;
        Ok(ConstantParameterProcess::from_process(&self.general, horizon)?.into())
    }
}

/// Control pricer together with its known expectation.
#[derive(Clone)]
struct ControlVariate {
    pricer: Arc<dyn PathPricer>,
    value: f64,
}

pub struct McEngine {
    selector: ProcessSelector,
    process: Process,
    time_grid: Arc<TimeGrid>,
    pricer: Arc<dyn PathPricer>,
    control: Option<ControlVariate>,
    criterion: ConvergenceCriterion,
    rng: RngPolicy,
    seed: u64,
    variance_reduction: VarianceReduction,
    batches: usize,
    state: EngineState,
    statistics: RunningStatistics,
}

impl McEngine {
    pub fn builder(process: Arc<BlackScholesProcess>) -> McEngineBuilder {
        McEngineBuilder::new(process)
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn statistics(&self) -> &RunningStatistics {
        &self.statistics
    }

    pub fn time_grid(&self) -> &Arc<TimeGrid> {
        &self.time_grid
    }

    pub fn process(&self) -> &Process {
        &self.process
    }

    pub fn criterion(&self) -> ConvergenceCriterion {
        self.criterion
    }

    pub fn variance_reduction(&self) -> VarianceReduction {
        self.variance_reduction
    }

    pub fn uses_constant_parameter_model(&self) -> bool {
        self.selector.uses_constant_parameter_model()
    }

    /// Known value of the control, when one is applied.
    pub fn control_value(&self) -> Option<f64> {
        self.control.as_ref().map(|control| control.value)
    }

    /// Switch process variant; seed, grid and pricer stay as they are.
    pub fn set_constant_parameter_model(&mut self, enabled: bool) -> SdeResult<()> {
        let selector = self.selector.clone().with_constant_parameter_model(enabled);
        self.process = selector.select()?;
        self.selector = selector;
        self.state = EngineState::Configured;
        Ok(())
    }

    /// Run the simulation from a fresh generator seeded with the engine seed.
    pub fn calculate(&mut self) -> SdeResult<McResult> {
        let timer = Timer::new();
        self.state = EngineState::Sampling;
        self.statistics.reset();

        let tolerance_met = match self.criterion {
            ConvergenceCriterion::FixedSamples(samples) => {
                self.statistics = if self.batches > 1 {
                    self.sample_parallel(samples)?
                } else {
                    let mut generator = self.path_generator(self.seed)?;
                    let mut stats = RunningStatistics::new();
                    self.add_samples(&mut generator, samples, &mut stats)?;
                    stats
                };
                self.state = EngineState::Converged;
                true
            }
            ConvergenceCriterion::Tolerance {
                tolerance,
                max_samples,
            } => self.sample_to_tolerance(tolerance, max_samples)?,
        };

        let price = self.statistics.mean().ok_or_else(|| SdeError::NumericalInstability {
            method: "Monte Carlo".to_string(),
            reason: "no samples were drawn".to_string(),
        })?;
        if !price.is_finite() {
            return Err(SdeError::NumericalInstability {
                method: "Monte Carlo".to_string(),
                reason: format!("Price estimate is not finite: {}", price),
            });
        }

        let error_estimate = if self.rng.allows_error_estimate() {
            self.statistics.error_estimate()
        } else {
            None
        };
        let result = McResult {
            price,
            error_estimate,
            samples: self.statistics.count(),
            tolerance_met,
            state: self.state,
            elapsed_ms: timer.elapsed_ms(),
        };

        info!(
            price = result.price,
            error = ?result.error_estimate,
            samples = result.samples,
            constant_parameter = self.uses_constant_parameter_model(),
            elapsed_ms = result.elapsed_ms,
            state = ?result.state,
            "Monte Carlo run finished"
        );
        Ok(result)
    }

    fn sample_to_tolerance(&mut self, tolerance: f64, max_samples: usize) -> SdeResult<bool> {
        let mut generator = self.path_generator(self.seed)?;
        let mut stats = RunningStatistics::new();
        self.add_samples(&mut generator, MIN_BATCH.min(max_samples), &mut stats)?;

        let met = loop {
            let error = stats.error_estimate().unwrap_or(f64::INFINITY);
            if error <= tolerance {
                break true;
            }
            let drawn = stats.count();
            if drawn >= max_samples {
                warn!(
                    samples = drawn,
                    error,
                    tolerance,
                    "sample budget exhausted before reaching tolerance"
                );
                break false;
            }
            let order = error / tolerance;
            let n = drawn as f64;
            let next = (n * order * order * 0.8 - n)
                .max(MIN_BATCH as f64)
                .min((max_samples - drawn) as f64) as usize;
            debug!(samples = drawn, error, next, "tolerance not reached");
            self.add_samples(&mut generator, next, &mut stats)?;
        };

        self.statistics = stats;
        self.state = if met {
            EngineState::Converged
        } else {
            EngineState::ExhaustedBudget
        };
        Ok(met)
    }

    fn sample_parallel(&self, samples: usize) -> SdeResult<RunningStatistics> {
        let factory = RngFactory::new(self.seed);
        let batches = self.batches.min(samples);
        let per_batch = samples / batches;
        let remainder = samples % batches;

        let results = (0..batches)
            .into_par_iter()
            .map(|batch| -> SdeResult<RunningStatistics> {
                let count = per_batch + usize::from(batch < remainder);
                let mut generator = self.path_generator(factory.stream_seed(batch as u64))?;
                let mut stats = RunningStatistics::new();
                self.add_samples(&mut generator, count, &mut stats)?;
                debug!(batch, samples = count, mean = ?stats.mean(), "batch finished");
                Ok(stats)
            })
            .collect::<SdeResult<Vec<_>>>()?;

        // merge in batch order so the result does not depend on scheduling
        let mut total = RunningStatistics::new();
        for stats in &results {
            total.merge(stats);
        }
        Ok(total)
    }

    fn path_generator(&self, seed: u64) -> SdeResult<PathGenerator> {
        let dimension = self.process.factors() * self.time_grid.steps();
        let rng = self.rng.make_sequence_generator(dimension, seed)?;
        PathGenerator::new(
            self.process.clone(),
            self.time_grid.clone(),
            rng,
            self.variance_reduction.contains(VarianceReduction::BROWNIAN_BRIDGE),
        )
    }

    fn add_samples(
        &self,
        generator: &mut PathGenerator,
        samples: usize,
        stats: &mut RunningStatistics,
    ) -> SdeResult<()> {
        let antithetic = self.variance_reduction.contains(VarianceReduction::ANTITHETIC);
        for _ in 0..samples {
            let path = generator.next()?;
            let (mut value, mut weight) = (self.sample_value(&path.value), path.weight);
            if antithetic {
                let mirror = generator.antithetic()?;
                value = 0.5 * (value + self.sample_value(&mirror.value));
                weight = 0.5 * (weight + mirror.weight);
            }
            if !value.is_finite() {
                return Err(SdeError::NumericalInstability {
                    method: "Monte Carlo".to_string(),
                    reason: format!("path priced to a non-finite value: {}", value),
                });
            }
            stats.add_weighted(value, weight);
        }
        Ok(())
    }

    fn sample_value(&self, path: &SamplePath) -> f64 {
        let price = self.pricer.price(path);
        match &self.control {
            Some(control) => price - (control.pricer.price(path) - control.value),
            None => price,
        }
    }
}

// geometric average option on the grid fixings, valued with frozen parameters
fn geometric_control(
    process: &BlackScholesProcess,
    payoff: Option<Payoff>,
    time_grid: &TimeGrid,
    maturity: Time,
) -> SdeResult<ControlVariate> {
    let geometric = payoff
        .and_then(|payoff| payoff.geometric_counterpart())
        .ok_or_else(|| {
            SdeError::configuration("control_variate", "no analytic control for this payoff")
        })?;
    let frozen = ConstantParameterProcess::from_process(process, maturity)?;
    let value = discrete_geometric_average_price(
        geometric.is_call(),
        frozen.x0(),
        geometric.strike(),
        frozen.frozen_risk_free_rate(),
        frozen.frozen_dividend_rate(),
        frozen.frozen_volatility(),
        &time_grid.times()[1..],
        maturity,
    )?;
    let pricer = DiscountedPayoffPricer::from_curve(
        geometric,
        process.risk_free_rate().as_ref(),
        maturity,
    );
    Ok(ControlVariate {
        pricer: Arc::new(pricer),
        value,
    })
}

#[derive(Clone)]
enum PricerSource {
    Payoff(Payoff),
    Custom(Arc<dyn PathPricer>),
}

/// Named-parameter construction of a [`McEngine`].
#[derive(Clone)]
pub struct McEngineBuilder {
    process: Arc<BlackScholesProcess>,
    pricer: Option<PricerSource>,
    control: Option<ControlVariate>,
    maturity: Option<Time>,
    config: McConfig,
}

impl McEngineBuilder {
    pub fn new(process: Arc<BlackScholesProcess>) -> Self {
        McEngineBuilder {
            process,
            pricer: None,
            control: None,
            maturity: None,
            config: McConfig::default(),
        }
    }

    /// Start from a parsed configuration; named parameters may still override it.
    pub fn from_config(process: Arc<BlackScholesProcess>, config: McConfig) -> Self {
        McEngineBuilder {
            config,
            ..Self::new(process)
        }
    }

    pub fn with_steps(mut self, steps: usize) -> Self {
        self.config.steps = Some(steps);
        self
    }

    pub fn with_steps_per_year(mut self, steps: usize) -> Self {
        self.config.steps_per_year = Some(steps);
        self
    }

    pub fn with_brownian_bridge(mut self, enabled: bool) -> Self {
        self.config.brownian_bridge = enabled;
        self
    }

    pub fn with_antithetic_variate(mut self, enabled: bool) -> Self {
        self.config.antithetic_variate = enabled;
        self
    }

    /// Correct samples with a control; arithmetic Asian payoffs get the
    /// geometric average option unless [`Self::with_control_pricer`] is used.
    pub fn with_control_variate(mut self, enabled: bool) -> Self {
        self.config.control_variate = enabled;
        self
    }

    /// Use `pricer`, whose expectation is `value`, as the control.
    pub fn with_control_pricer(mut self, pricer: Arc<dyn PathPricer>, value: f64) -> Self {
        self.control = Some(ControlVariate { pricer, value });
        self.config.control_variate = true;
        self
    }

    pub fn with_samples(mut self, samples: usize) -> Self {
        self.config.required_samples = Some(samples);
        self
    }

    pub fn with_absolute_tolerance(mut self, tolerance: f64) -> Self {
        self.config.required_tolerance = Some(tolerance);
        self
    }

    pub fn with_max_samples(mut self, samples: usize) -> Self {
        self.config.max_samples = Some(samples);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.config.seed = seed;
        self
    }

    pub fn with_constant_parameter_model(mut self, enabled: bool) -> Self {
        self.config.use_constant_parameter_model = enabled;
        self
    }

    pub fn with_rng(mut self, policy: RngPolicy) -> Self {
        self.config.rng = policy;
        self
    }

    pub fn with_batches(mut self, batches: usize) -> Self {
        self.config.batches = batches;
        self
    }

    /// One batch per logical CPU; prices then differ between machines with
    /// different core counts.
    pub fn with_parallel_batches(self) -> Self {
        self.with_batches(McConfig::available_batches())
    }

    pub fn with_maturity(mut self, maturity: Time) -> Self {
        self.maturity = Some(maturity);
        self
    }

    pub fn with_maturity_date(self, date: NaiveDate) -> Self {
        let maturity = self.process.time(date);
        self.with_maturity(maturity)
    }

    /// Price paths with `payoff` discounted on the risk-free curve at maturity.
    pub fn with_payoff(mut self, payoff: Payoff) -> Self {
        self.pricer = Some(PricerSource::Payoff(payoff));
        self
    }

    pub fn with_pricer(mut self, pricer: Arc<dyn PathPricer>) -> Self {
        self.pricer = Some(PricerSource::Custom(pricer));
        self
    }

    pub fn config(&self) -> &McConfig {
        &self.config
    }

    pub fn build(self) -> SdeResult<McEngine> {
        let criterion = self.config.validate()?;
        let step_rule = self.config.step_rule()?;

        let maturity = self
            .maturity
            .ok_or_else(|| SdeError::configuration("maturity", "not given"))?;
        validate_positive("maturity", maturity)?;
        let time_grid = Arc::new(TimeGrid::new(maturity, step_rule.steps_for(maturity))?);

        let payoff = match &self.pricer {
            Some(PricerSource::Payoff(payoff)) => Some(*payoff),
            _ => None,
        };
        let control = match (self.config.control_variate, self.control) {
            (false, _) => None,
            (true, Some(control)) => Some(control),
            (true, None) => Some(geometric_control(&self.process, payoff, &time_grid, maturity)?),
        };

        let pricer: Arc<dyn PathPricer> = match self.pricer {
            Some(PricerSource::Payoff(payoff)) => Arc::new(DiscountedPayoffPricer::from_curve(
                payoff,
                self.process.risk_free_rate().as_ref(),
                maturity,
            )),
            Some(PricerSource::Custom(pricer)) => pricer,
            None => return Err(SdeError::configuration("pricer", "not given")),
        };

        let selector = ProcessSelector::new(self.process, Some(maturity))
            .with_constant_parameter_model(self.config.use_constant_parameter_model);
        let process = selector.select()?;

        debug!(
            steps = time_grid.steps(),
            maturity,
            criterion = ?criterion,
            rng = ?self.config.rng,
            control_value = ?control.as_ref().map(|control| control.value),
            constant_parameter = self.config.use_constant_parameter_model,
            "configured Monte Carlo engine"
        );

        Ok(McEngine {
            selector,
            process,
            time_grid,
            pricer,
            control,
            criterion,
            rng: self.config.rng,
            seed: self.config.seed,
            variance_reduction: self.config.variance_reduction(),
            batches: self.config.batches,
            state: EngineState::Configured,
            statistics: RunningStatistics::new(),
        })
    }
}
