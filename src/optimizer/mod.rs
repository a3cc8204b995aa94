//! Derivative-free minimizers over a fixed-dimension parameter vector.
//!
//! Both strategies share one contract: `params` is the seed on entry and the
//! best point found on exit, and it is left untouched when nothing beats the
//! seed.

mod random_search;
mod simplex;

pub use random_search::RandomSearch;
pub use simplex::Simplex;

use std::fmt;

use crate::config::{OptimizerConfig, OptimizerKind};
use crate::error::Error;

/// Black-box scalar cost. Implementations may read shared evidence but see it
/// only through `&self`.
pub trait CostFunction {
    fn dimension(&self) -> usize;
    fn cost(&self, params: &[f32]) -> f32;
}

/// Closure-backed [`CostFunction`].
pub struct FnCost<F> {
    dimension: usize,
    f: F,
}

pub fn cost_fn<F: Fn(&[f32]) -> f32>(dimension: usize, f: F) -> FnCost<F> {
    FnCost { dimension, f }
}

impl<F: Fn(&[f32]) -> f32> CostFunction for FnCost<F> {
    #[inline]
    fn dimension(&self) -> usize {
        self.dimension
    }

    #[inline]
    fn cost(&self, params: &[f32]) -> f32 {
        (self.f)(params)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OptimizeReport {
    pub initial_cost: f32,
    pub final_cost: f32,
    pub iterations: usize,
    pub evaluations: usize,
}

impl OptimizeReport {
    #[inline]
    pub fn improved(&self) -> bool {
        self.final_cost < self.initial_cost
    }
}

pub trait Optimizer: fmt::Debug {
    fn dimension(&self) -> usize;

    fn optimize(&mut self, cost: &dyn CostFunction, params: &mut [f32]) -> Result<OptimizeReport, Error>;
}

pub fn from_config(config: &OptimizerConfig, dimension: usize) -> Result<Box<dyn Optimizer>, Error> {
    let optimizer: Box<dyn Optimizer> = match config.kind {
        OptimizerKind::RandomSearch => Box::new(RandomSearch::new(
            dimension,
            config.iterations,
            config.radius,
            config.seed,
        )?),
        OptimizerKind::Simplex => Box::new(Simplex::new(
            dimension,
            config.iterations,
            config.radius,
            config.tolerance,
        )?),
    };

    Ok(optimizer)
}

fn validate(dimension: usize, iterations: usize, radius: f32) -> Result<(), Error> {
    if dimension == 0 {
        return Err(Error::InvalidParameter {
            name: "dimension",
            value: 0.0,
        });
    }

    if !(radius > 0.0) || !radius.is_finite() {
        return Err(Error::InvalidRadius(radius));
    }

    if iterations == 0 {
        return Err(Error::InvalidIterations);
    }

    Ok(())
}

fn check_dimension(expected: usize, cost: &dyn CostFunction, params: &[f32]) -> Result<(), Error> {
    for found in [cost.dimension(), params.len()] {
        if found != expected {
            return Err(Error::DimensionMismatch { expected, found });
        }
    }

    Ok(())
}
