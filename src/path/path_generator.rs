// src/path/path_generator.rs
use super::brownian_bridge::BrownianBridge;
use super::sample_path::{Sample, SamplePath};
use crate::error::{SdeError, SdeResult};
use crate::process::{Process, StochasticProcess};
use crate::rng::RandomSequenceGenerator;
use crate::time_grid::TimeGrid;
use std::sync::Arc;

/// Single-factor path generator.
///
/// Each call to [`next`](PathGenerator::next) draws one vector of normals of
/// dimension `steps` and walks the process along the grid:
/// ```text
/// x_{i+1} = process.evolve(t_i, x_i, t_{i+1} − t_i, z_i)
/// ```
/// [`antithetic`](PathGenerator::antithetic) reuses the last vector with its
/// sign flipped and leaves the sequence where it is.
pub struct PathGenerator {
    process: Process,
    time_grid: Arc<TimeGrid>,
    generator: Box<dyn RandomSequenceGenerator>,
    bridge: Option<BrownianBridge>,
    draws: Vec<f64>,
    sample: Sample<SamplePath>,
}

impl PathGenerator {
    pub fn new(
        process: Process,
        time_grid: Arc<TimeGrid>,
        generator: Box<dyn RandomSequenceGenerator>,
        brownian_bridge: bool,
    ) -> SdeResult<Self> {
        let dimension = process.factors() * time_grid.steps();
        if generator.dimension() != dimension {
            return Err(SdeError::configuration(
                "dimension",
                format!(
                    "sequence generator has dimension {}, grid needs {}",
                    generator.dimension(),
                    dimension
                ),
            ));
        }
        let bridge = brownian_bridge.then(|| BrownianBridge::new(&time_grid));

        Ok(PathGenerator {
            process,
            draws: vec![0.0; dimension],
            sample: Sample::new(SamplePath::new(time_grid.clone()), 1.0),
            time_grid,
            generator,
            bridge,
        })
    }

    pub fn process(&self) -> &Process {
        &self.process
    }

    pub fn time_grid(&self) -> &Arc<TimeGrid> {
        &self.time_grid
    }

    pub fn dimension(&self) -> usize {
        self.draws.len()
    }

    pub fn next(&mut self) -> SdeResult<&Sample<SamplePath>> {
        self.generator.next_sequence();
        self.build(false)?;
        Ok(&self.sample)
    }

    pub fn antithetic(&mut self) -> SdeResult<&Sample<SamplePath>> {
        self.build(true)?;
        Ok(&self.sample)
    }

    fn build(&mut self, negate: bool) -> SdeResult<()> {
        let sign = if negate { -1.0 } else { 1.0 };
        let sequence = self.generator.last_sequence();

        match &self.bridge {
            Some(bridge) => {
                let signed: Vec<f64> = sequence.iter().map(|z| sign * z).collect();
                bridge.transform(&signed, &mut self.draws)?;
            }
            None => {
                for (d, z) in self.draws.iter_mut().zip(sequence) {
                    *d = sign * z;
                }
            }
        }

        let times = self.time_grid.times();
        let path = self.sample.value.values_mut();
        path[0] = self.process.x0();
        for i in 0..self.draws.len() {
            let dt = times[i + 1] - times[i];
            path[i + 1] = self.process.evolve(times[i], path[i], dt, self.draws[i]);
        }
        Ok(())
    }
}
