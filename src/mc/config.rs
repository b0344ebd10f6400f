// src/mc/config.rs
use crate::error::{validation::*, SdeError, SdeResult};
use crate::rng::RngPolicy;
use crate::time_grid::Time;
use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct VarianceReduction: u32 {
        const NONE            = 0;
        const ANTITHETIC      = 1 << 0;
        const BROWNIAN_BRIDGE = 1 << 1;
        const CONTROL_VARIATE = 1 << 2;
    }
}

/// When the sampling loop stops.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConvergenceCriterion {
    /// Draw exactly this many samples.
    FixedSamples(usize),
    /// Draw until the error estimate falls to `tolerance`, at most `max_samples`.
    Tolerance { tolerance: f64, max_samples: usize },
}

/// How the number of time steps is derived from the maturity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepRule {
    Steps(usize),
    StepsPerYear(usize),
}

impl StepRule {
    /// `max(⌊steps_per_year · T⌋, 1)` for the per-year rule.
    pub fn steps_for(&self, maturity: Time) -> usize {
        match *self {
            StepRule::Steps(n) => n,
            StepRule::StepsPerYear(n) => ((n as f64 * maturity).floor() as usize).max(1),
        }
    }
}

/// Monte Carlo engine options
///
/// Exactly one of `steps`/`steps_per_year` and exactly one of
/// `required_samples`/`required_tolerance` must be set. `max_samples` only
/// bounds tolerance-driven runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct McConfig {
    pub steps: Option<usize>,
    pub steps_per_year: Option<usize>,
    pub brownian_bridge: bool,
    pub antithetic_variate: bool,
    /// Correct each sample with a control of known value.
    pub control_variate: bool,
    pub required_samples: Option<usize>,
    pub required_tolerance: Option<f64>,
    pub max_samples: Option<usize>,
    pub seed: u64,
    pub use_constant_parameter_model: bool,
    pub rng: RngPolicy,
    /// Parallel batches for fixed-sample pseudo-random runs.
    pub batches: usize,
}

impl Default for McConfig {
    fn default() -> Self {
        McConfig {
            steps: None,
            steps_per_year: None,
            brownian_bridge: false,
            antithetic_variate: false,
            control_variate: false,
            required_samples: None,
            required_tolerance: None,
            max_samples: None,
            seed: 0,
            use_constant_parameter_model: false,
            rng: RngPolicy::PseudoRandom,
            batches: 1,
        }
    }
}

impl McConfig {
    pub fn from_toml_str(source: &str) -> SdeResult<Self> {
        toml::from_str(source).map_err(|e| SdeError::configuration("toml", e.to_string()))
    }

    /// Check option combinations and resolve the stopping rule.
    pub fn validate(&self) -> SdeResult<ConvergenceCriterion> {
        self.step_rule()?;

        if self.batches == 0 {
            return Err(SdeError::configuration("batches", "must be at least 1"));
        }
        if let Some(max) = self.max_samples {
            validate_samples("max_samples", max)?;
        }

        let criterion = match (self.required_samples, self.required_tolerance) {
            (Some(_), Some(_)) => {
                return Err(SdeError::configuration(
                    "required_samples",
                    "required_samples and required_tolerance are mutually exclusive",
                ))
            }
            (None, None) => {
                return Err(SdeError::configuration(
                    "required_samples",
                    "neither required_samples nor required_tolerance given",
                ))
            }
            (Some(samples), None) => {
                validate_samples("required_samples", samples)?;
                ConvergenceCriterion::FixedSamples(samples)
            }
            (None, Some(tolerance)) => {
                validate_positive("required_tolerance", tolerance)?;
                if !self.rng.allows_error_estimate() {
                    return Err(SdeError::configuration(
                        "required_tolerance",
                        format!("{:?} generators do not allow an error estimate", self.rng),
                    ));
                }
                ConvergenceCriterion::Tolerance {
                    tolerance,
                    max_samples: self.max_samples.unwrap_or(MAX_SAMPLES),
                }
            }
        };

        if self.batches > 1 {
            if !matches!(criterion, ConvergenceCriterion::FixedSamples(_)) {
                return Err(SdeError::configuration(
                    "batches",
                    "parallel batches need a fixed number of samples",
                ));
            }
            if self.rng != RngPolicy::PseudoRandom {
                return Err(SdeError::configuration(
                    "batches",
                    "parallel batches need the pseudo-random generator",
                ));
            }
        }

        Ok(criterion)
    }

    pub fn step_rule(&self) -> SdeResult<StepRule> {
        match (self.steps, self.steps_per_year) {
            (Some(_), Some(_)) => Err(SdeError::configuration(
                "steps",
                "number of steps overspecified",
            )),
            (None, None) => Err(SdeError::configuration("steps", "number of steps not given")),
            (Some(steps), None) => {
                validate_steps(steps)?;
                Ok(StepRule::Steps(steps))
            }
            (None, Some(per_year)) => {
                validate_steps(per_year)?;
                Ok(StepRule::StepsPerYear(per_year))
            }
        }
    }

    pub fn variance_reduction(&self) -> VarianceReduction {
        let mut flags = VarianceReduction::NONE;
        if self.antithetic_variate {
            flags |= VarianceReduction::ANTITHETIC;
        }
        if self.brownian_bridge {
            flags |= VarianceReduction::BROWNIAN_BRIDGE;
        }
        if self.control_variate {
            flags |= VarianceReduction::CONTROL_VARIATE;
        }
        flags
    }

    /// One batch per logical CPU.
    ///
    /// Each batch draws its own seed stream, so a price computed with this
    /// count depends on the machine. Pass a fixed count for results that
    /// reproduce across hosts.
    pub fn available_batches() -> usize {
        num_cpus::get().max(1)
    }
}
