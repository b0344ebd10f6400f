// src/path/mod.rs
//! Path construction over a time grid
//!
//! A [`PathGenerator`] turns one vector of standard normal draws into one
//! [`SamplePath`] by stepping a process along the grid. Draws can be used as
//! per-step shocks directly or reordered through a [`BrownianBridge`] so that
//! the first (best-stratified) coordinates drive the coarse shape of the path.

pub mod brownian_bridge;
pub mod path_generator;
pub mod sample_path;

pub use brownian_bridge::BrownianBridge;
pub use path_generator::PathGenerator;
pub use sample_path::{Sample, SamplePath};
