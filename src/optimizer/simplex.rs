use log::{debug, trace};

use super::{check_dimension, validate, CostFunction, OptimizeReport, Optimizer};
use crate::error::Error;

const REFLECT: f32 = 1.0;
const EXPAND: f32 = 2.0;
const CONTRACT: f32 = 0.5;
const SHRINK: f32 = 0.5;

/// Downhill simplex (Nelder-Mead) search.
///
/// The initial simplex is the seed plus one vertex `radius` away along each
/// axis. Stops after the iteration budget or once the vertex costs differ by
/// no more than `tolerance`.
#[derive(Debug)]
pub struct Simplex {
    dimension: usize,
    iterations: usize,
    radius: f32,
    tolerance: f32,
}

impl Simplex {
    pub fn new(dimension: usize, iterations: usize, radius: f32, tolerance: f32) -> Result<Self, Error> {
        validate(dimension, iterations, radius)?;

        if !(tolerance >= 0.0) {
            return Err(Error::InvalidParameter {
                name: "tolerance",
                value: tolerance,
            });
        }

        Ok(Self {
            dimension,
            iterations,
            radius,
            tolerance,
        })
    }
}

struct Vertices {
    points: Vec<Vec<f32>>,
    costs: Vec<f32>,
}

impl Vertices {
    fn order(&self) -> Vec<usize> {
        let mut idx: Vec<usize> = (0..self.points.len()).collect();
        idx.sort_by(|&a, &b| self.costs[a].total_cmp(&self.costs[b]));
        idx
    }
}

/// `from + t * (to - from)`
fn along(from: &[f32], to: &[f32], t: f32) -> Vec<f32> {
    from.iter().zip(to).map(|(&a, &b)| a + t * (b - a)).collect()
}

impl Optimizer for Simplex {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn optimize(&mut self, cost: &dyn CostFunction, params: &mut [f32]) -> Result<OptimizeReport, Error> {
        check_dimension(self.dimension, cost, params)?;

        let n = self.dimension;
        let initial_cost = cost.cost(params);
        let mut evaluations = 1;

        let mut v = Vertices {
            points: Vec::with_capacity(n + 1),
            costs: Vec::with_capacity(n + 1),
        };
        v.points.push(params.to_vec());
        v.costs.push(initial_cost);

        for axis in 0..n {
            let mut p = params.to_vec();
            p[axis] += self.radius;
            v.costs.push(cost.cost(&p));
            v.points.push(p);
            evaluations += 1;
        }

        let mut iterations = 0;

        while iterations < self.iterations {
            let order = v.order();
            let (best, worst, second) = (order[0], order[n], order[n - 1]);

            if (v.costs[worst] - v.costs[best]).abs() <= self.tolerance {
                trace!("simplex converged after {} iterations", iterations);
                break;
            }

            iterations += 1;

            let mut centroid = vec![0.0; n];
            for &i in &order[..n] {
                for (c, x) in centroid.iter_mut().zip(&v.points[i]) {
                    *c += x / n as f32;
                }
            }

            let reflected = along(&centroid, &v.points[worst], -REFLECT);
            let fr = cost.cost(&reflected);
            evaluations += 1;

            if fr < v.costs[best] {
                let expanded = along(&centroid, &reflected, EXPAND);
                let fe = cost.cost(&expanded);
                evaluations += 1;

                if fe < fr {
                    v.points[worst] = expanded;
                    v.costs[worst] = fe;
                } else {
                    v.points[worst] = reflected;
                    v.costs[worst] = fr;
                }
                continue;
            }

            if fr < v.costs[second] {
                v.points[worst] = reflected;
                v.costs[worst] = fr;
                continue;
            }

            let (contracted, bound) = if fr < v.costs[worst] {
                (along(&centroid, &reflected, CONTRACT), fr)
            } else {
                (along(&centroid, &v.points[worst], CONTRACT), v.costs[worst])
            };
            let fc = cost.cost(&contracted);
            evaluations += 1;

            if fc < bound {
                v.points[worst] = contracted;
                v.costs[worst] = fc;
                continue;
            }

            let anchor = v.points[best].clone();
            for &i in &order[1..] {
                v.points[i] = along(&anchor, &v.points[i], SHRINK);
                v.costs[i] = cost.cost(&v.points[i]);
                evaluations += 1;
            }
        }

        let best = v.order()[0];
        let final_cost = if v.costs[best] < initial_cost {
            params.copy_from_slice(&v.points[best]);
            v.costs[best]
        } else {
            debug!("simplex kept its seed after {} iterations", iterations);
            initial_cost
        };

        Ok(OptimizeReport {
            initial_cost,
            final_cost,
            iterations,
            evaluations,
        })
    }
}
