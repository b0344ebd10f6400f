// src/path/sample_path.rs
use crate::time_grid::{Time, TimeGrid};
use std::sync::Arc;

/// A value together with its weight in the estimator.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample<T> {
    pub value: T,
    pub weight: f64,
}

impl<T> Sample<T> {
    pub fn new(value: T, weight: f64) -> Self {
        Sample { value, weight }
    }
}

/// Asset values aligned with the points of a time grid, `values[0]` at t = 0.
#[derive(Debug, Clone, PartialEq)]
pub struct SamplePath {
    time_grid: Arc<TimeGrid>,
    values: Vec<f64>,
}

impl SamplePath {
    pub fn new(time_grid: Arc<TimeGrid>) -> Self {
        let values = vec![0.0; time_grid.size()];
        SamplePath { time_grid, values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn time_grid(&self) -> &TimeGrid {
        &self.time_grid
    }

    pub fn time(&self, i: usize) -> Time {
        self.time_grid.times()[i]
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn values_mut(&mut self) -> &mut [f64] {
        &mut self.values
    }

    pub fn front(&self) -> f64 {
        self.values[0]
    }

    pub fn back(&self) -> f64 {
        self.values[self.values.len() - 1]
    }
}
