// src/market/quote.rs
use std::fmt;

/// An observable scalar market value, such as a spot price.
pub trait Quote: fmt::Debug + Send + Sync {
    fn value(&self) -> f64;
}

/// Quote with a fixed value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimpleQuote {
    value: f64,
}

impl SimpleQuote {
    pub fn new(value: f64) -> Self {
        SimpleQuote { value }
    }
}

impl Quote for SimpleQuote {
    fn value(&self) -> f64 {
        self.value
    }
}
