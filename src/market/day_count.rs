// src/market/day_count.rs
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Day-count conventions used to turn dates into year fractions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DayCounter {
    Actual365Fixed,
    Actual360,
}

impl DayCounter {
    pub fn year_fraction(&self, start: NaiveDate, end: NaiveDate) -> f64 {
        let days = (end - start).num_days() as f64;
        match self {
            DayCounter::Actual365Fixed => days / 365.0,
            DayCounter::Actual360 => days / 360.0,
        }
    }
}
