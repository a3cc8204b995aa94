use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{check_dimension, validate, CostFunction, OptimizeReport, Optimizer};
use crate::error::Error;

/// Coordinate-wise random local search.
///
/// Iteration `i` moves coordinate `i % dimension` by a uniform offset in
/// `[-radius, radius]` and keeps the move only if the cost strictly drops.
#[derive(Debug)]
pub struct RandomSearch {
    dimension: usize,
    iterations: usize,
    radius: f32,
    rng: StdRng,
}

impl RandomSearch {
    pub fn new(dimension: usize, iterations: usize, radius: f32, seed: u64) -> Result<Self, Error> {
        validate(dimension, iterations, radius)?;

        Ok(Self {
            dimension,
            iterations,
            radius,
            rng: StdRng::seed_from_u64(seed),
        })
    }
}

impl Optimizer for RandomSearch {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn optimize(&mut self, cost: &dyn CostFunction, params: &mut [f32]) -> Result<OptimizeReport, Error> {
        check_dimension(self.dimension, cost, params)?;

        let initial_cost = cost.cost(params);
        let mut best = initial_cost;

        for it in 0..self.iterations {
            let k = it % self.dimension;
            let prev = params[k];

            params[k] = prev + self.rng.gen_range(-self.radius..=self.radius);

            let c = cost.cost(params);
            if c < best {
                best = c;
            } else {
                params[k] = prev;
            }
        }

        let report = OptimizeReport {
            initial_cost,
            final_cost: best,
            iterations: self.iterations,
            evaluations: self.iterations + 1,
        };

        if !report.improved() {
            debug!("random search kept its seed after {} iterations", self.iterations);
        }

        Ok(report)
    }
}
