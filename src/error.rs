// src/error.rs
use thiserror::Error;

/// Error types for the const-sde library
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SdeError {
    /// Invalid parameter values
    #[error("Invalid parameter '{parameter}' = {value}: {constraint}")]
    InvalidParameters {
        parameter: String,
        value: f64,
        constraint: String,
    },

    /// Invalid or contradictory configuration, detected before sampling starts
    #[error("Invalid configuration for '{field}': {reason}")]
    InvalidConfiguration { field: String, reason: String },

    /// Operation the process deliberately does not provide
    #[error("Unsupported operation '{operation}' in context: {context}")]
    UnsupportedOperation { operation: String, context: String },

    /// Degenerate market input met while freezing process parameters
    #[error("Numerical degeneracy in '{quantity}' = {value}: {reason}")]
    NumericalDegeneracy {
        quantity: String,
        value: f64,
        reason: String,
    },

    /// Numerical instability during simulation
    #[error("Numerical instability in {method}: {reason}")]
    NumericalInstability { method: String, reason: String },
}

impl SdeError {
    pub(crate) fn configuration(field: &str, reason: impl Into<String>) -> Self {
        SdeError::InvalidConfiguration {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for const-sde operations
pub type SdeResult<T> = Result<T, SdeError>;

/// Validation utilities
pub mod validation {
    use super::{SdeError, SdeResult};

    /// Upper bound on the number of samples a single run may draw.
    pub const MAX_SAMPLES: usize = 1_000_000_000;

    /// Upper bound on the number of time steps per path.
    pub const MAX_STEPS: usize = 100_000;

    /// Validate that a parameter is positive
    pub fn validate_positive(name: &str, value: f64) -> SdeResult<()> {
        if value.is_nan() || value <= 0.0 {
            Err(SdeError::InvalidParameters {
                parameter: name.to_string(),
                value,
                constraint: "must be positive (> 0)".to_string(),
            })
        } else {
            Ok(())
        }
    }

    /// Validate that a parameter is non-negative
    pub fn validate_non_negative(name: &str, value: f64) -> SdeResult<()> {
        if value.is_nan() || value < 0.0 {
            Err(SdeError::InvalidParameters {
                parameter: name.to_string(),
                value,
                constraint: "must be non-negative (≥ 0)".to_string(),
            })
        } else {
            Ok(())
        }
    }

    /// Validate that a value is finite and not NaN
    pub fn validate_finite(name: &str, value: f64) -> SdeResult<()> {
        if !value.is_finite() {
            Err(SdeError::InvalidParameters {
                parameter: name.to_string(),
                value,
                constraint: "must be finite (not NaN or infinite)".to_string(),
            })
        } else {
            Ok(())
        }
    }

    /// Validate a sample count
    pub fn validate_samples(field: &str, samples: usize) -> SdeResult<()> {
        if samples == 0 {
            Err(SdeError::configuration(field, "must be greater than 0"))
        } else if samples > MAX_SAMPLES {
            Err(SdeError::configuration(
                field,
                "exceeds maximum allowed (1 billion)",
            ))
        } else {
            Ok(())
        }
    }

    /// Validate steps count
    pub fn validate_steps(steps: usize) -> SdeResult<()> {
        if steps == 0 {
            Err(SdeError::configuration("steps", "must be greater than 0"))
        } else if steps > MAX_STEPS {
            Err(SdeError::configuration(
                "steps",
                "exceeds maximum allowed (100,000)",
            ))
        } else {
            Ok(())
        }
    }

    /// Check a frozen market quantity, reporting degeneracy rather than letting NaN through
    pub fn ensure_finite_frozen(quantity: &str, value: f64) -> SdeResult<()> {
        if value.is_finite() {
            Ok(())
        } else {
            Err(SdeError::NumericalDegeneracy {
                quantity: quantity.to_string(),
                value,
                reason: "must be finite".to_string(),
            })
        }
    }

    /// Check a frozen volatility, which must be strictly positive
    pub fn ensure_positive_frozen(quantity: &str, value: f64) -> SdeResult<()> {
        ensure_finite_frozen(quantity, value)?;
        if value <= 0.0 {
            Err(SdeError::NumericalDegeneracy {
                quantity: quantity.to_string(),
                value,
                reason: "zero or negative volatility/variance".to_string(),
            })
        } else {
            Ok(())
        }
    }
}
