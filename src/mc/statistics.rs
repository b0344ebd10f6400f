// src/mc/statistics.rs
//! Running sample statistics
//!
//! Welford's update keeps the mean and the sum of squared deviations stable
//! over billions of samples:
//! ```text
//! δ = x − m_{n−1}
//! m_n = m_{n−1} + w·δ / W_n
//! M2_n = M2_{n−1} + w·δ·(x − m_n)
//! ```
//! Two accumulators over disjoint sample sets combine exactly (Chan et al.),
//! which is how parallel batches are merged.

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunningStatistics {
    count: usize,
    weight_sum: f64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, value: f64) {
        self.add_weighted(value, 1.0);
    }

    pub fn add_weighted(&mut self, value: f64, weight: f64) {
        if self.count == 0 {
            self.min = value;
            self.max = value;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);
        }
        self.count += 1;
        self.weight_sum += weight;
        let delta = value - self.mean;
        self.mean += weight * delta / self.weight_sum;
        self.m2 += weight * delta * (value - self.mean);
    }

    /// Fold another accumulator into this one.
    pub fn merge(&mut self, other: &RunningStatistics) {
        if other.count == 0 {
            return;
        }
        if self.count == 0 {
            *self = other.clone();
            return;
        }
        let total = self.weight_sum + other.weight_sum;
        let delta = other.mean - self.mean;
        self.mean += delta * other.weight_sum / total;
        self.m2 += other.m2 + delta * delta * self.weight_sum * other.weight_sum / total;
        self.weight_sum = total;
        self.count += other.count;
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// `None` until at least one sample was added.
    pub fn mean(&self) -> Option<f64> {
        (self.count > 0).then_some(self.mean)
    }

    /// Unbiased sample variance; needs two samples.
    pub fn variance(&self) -> Option<f64> {
        if self.count < 2 {
            return None;
        }
        let n = self.count as f64;
        Some((self.m2 / self.weight_sum * n / (n - 1.0)).max(0.0))
    }

    pub fn standard_deviation(&self) -> Option<f64> {
        self.variance().map(f64::sqrt)
    }

    /// Standard error of the mean, `√(var/n)`.
    pub fn error_estimate(&self) -> Option<f64> {
        self.variance().map(|v| (v / self.count as f64).sqrt())
    }

    pub fn min(&self) -> Option<f64> {
        (self.count > 0).then_some(self.min)
    }

    pub fn max(&self) -> Option<f64> {
        (self.count > 0).then_some(self.max)
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
