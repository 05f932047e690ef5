//! Derivative-free minimization used for model parameter estimation.

use std::cmp::Ordering;

/// Result of Nelder-Mead optimization.
#[derive(Debug, Clone)]
pub struct NelderMeadResult {
    /// The optimal point found.
    pub optimal_point: Vec<f64>,
    /// The objective function value at the optimal point.
    pub optimal_value: f64,
    /// Number of iterations performed.
    pub iterations: usize,
    /// Whether a tolerance was met before the iteration budget ran out.
    pub converged: bool,
}

/// Configuration for Nelder-Mead optimization.
#[derive(Debug, Clone)]
pub struct NelderMeadConfig {
    /// Maximum number of iterations.
    pub max_iter: usize,
    /// Relative tolerance on the spread of objective values across the simplex.
    pub f_tolerance: f64,
    /// Relative tolerance on the simplex diameter.
    pub x_tolerance: f64,
    /// Reflection coefficient.
    pub alpha: f64,
    /// Expansion coefficient.
    pub gamma: f64,
    /// Contraction coefficient.
    pub rho: f64,
    /// Shrink coefficient.
    pub sigma: f64,
    /// Initial simplex step, relative to the magnitude of each coordinate.
    pub initial_step: f64,
}

impl Default for NelderMeadConfig {
    fn default() -> Self {
        Self {
            max_iter: 2000,
            f_tolerance: 1e-10,
            x_tolerance: 1e-8,
            alpha: 1.0,
            gamma: 2.0,
            rho: 0.5,
            sigma: 0.5,
            initial_step: 0.05,
        }
    }
}

/// Box constraints, one `(min, max)` pair per coordinate.
type Bounds<'a> = Option<&'a [(f64, f64)]>;

struct Simplex<'a> {
    vertices: Vec<Vec<f64>>,
    values: Vec<f64>,
    bounds: Bounds<'a>,
}

impl<'a> Simplex<'a> {
    fn new<F: Fn(&[f64]) -> f64>(
        objective: &F,
        initial: &[f64],
        bounds: Bounds<'a>,
        step: f64,
    ) -> Self {
        let start = clamp(initial.to_vec(), bounds);
        let mut vertices = vec![start.clone()];
        for i in 0..start.len() {
            let mut vertex = start.clone();
            vertex[i] += if vertex[i].abs() > 1e-10 {
                step * vertex[i].abs()
            } else {
                step
            };
            vertices.push(clamp(vertex, bounds));
        }
        let values = vertices.iter().map(|v| score(objective, v)).collect();
        Self {
            vertices,
            values,
            bounds,
        }
    }

    /// Reorder vertices so that `values` is ascending.
    fn sort(&mut self) {
        let mut order: Vec<usize> = (0..self.vertices.len()).collect();
        order.sort_by(|&a, &b| {
            self.values[a]
                .partial_cmp(&self.values[b])
                .unwrap_or(Ordering::Equal)
        });
        self.vertices = order.iter().map(|&i| self.vertices[i].clone()).collect();
        self.values = order.iter().map(|&i| self.values[i]).collect();
    }

    fn worst(&self) -> usize {
        self.vertices.len() - 1
    }

    /// Centroid of every vertex except the worst.
    fn centroid(&self) -> Vec<f64> {
        let dim = self.vertices[0].len();
        let count = self.worst() as f64;
        let mut centroid = vec![0.0; dim];
        for vertex in &self.vertices[..self.worst()] {
            for (c, x) in centroid.iter_mut().zip(vertex) {
                *c += x;
            }
        }
        centroid.iter_mut().for_each(|c| *c /= count);
        centroid
    }

    /// Point `centroid + coef * (towards - centroid)`, clamped to the bounds.
    fn along(&self, centroid: &[f64], towards: &[f64], coef: f64) -> Vec<f64> {
        let point = centroid
            .iter()
            .zip(towards)
            .map(|(c, t)| c + coef * (t - c))
            .collect();
        clamp(point, self.bounds)
    }

    fn replace_worst(&mut self, vertex: Vec<f64>, value: f64) {
        let worst = self.worst();
        self.vertices[worst] = vertex;
        self.values[worst] = value;
    }

    fn shrink<F: Fn(&[f64]) -> f64>(&mut self, objective: &F, sigma: f64) {
        let best = self.vertices[0].clone();
        for i in 1..self.vertices.len() {
            let shrunk = best
                .iter()
                .zip(&self.vertices[i])
                .map(|(b, x)| b + sigma * (x - b))
                .collect();
            self.vertices[i] = clamp(shrunk, self.bounds);
            self.values[i] = score(objective, &self.vertices[i]);
        }
    }

    fn value_spread(&self) -> f64 {
        self.values[self.worst()] - self.values[0]
    }

    fn diameter(&self) -> f64 {
        let best = &self.vertices[0];
        self.vertices[1..]
            .iter()
            .map(|v| {
                v.iter()
                    .zip(best)
                    .map(|(a, b)| (a - b).abs())
                    .fold(0.0, f64::max)
            })
            .fold(0.0, f64::max)
    }
}

/// Minimize `objective` with the Nelder-Mead simplex method.
///
/// Points outside `bounds` are clamped onto the box before evaluation, and non-finite
/// objective values are treated as `+inf`. Convergence is declared when either the
/// spread of objective values or the simplex diameter falls below its relative tolerance.
///
/// # Example
/// ```
/// use traffic_forecast::utils::optimization::{nelder_mead, NelderMeadConfig};
///
/// let result = nelder_mead(
///     |x| (x[0] - 2.0).powi(2) + (x[1] - 3.0).powi(2),
///     &[0.0, 0.0],
///     None,
///     NelderMeadConfig::default(),
/// );
///
/// assert!(result.converged);
/// assert!((result.optimal_point[0] - 2.0).abs() < 1e-3);
/// assert!((result.optimal_point[1] - 3.0).abs() < 1e-3);
/// ```
pub fn nelder_mead<F>(
    objective: F,
    initial: &[f64],
    bounds: Option<&[(f64, f64)]>,
    config: NelderMeadConfig,
) -> NelderMeadResult
where
    F: Fn(&[f64]) -> f64,
{
    if initial.is_empty() {
        return NelderMeadResult {
            optimal_point: vec![],
            optimal_value: f64::NAN,
            iterations: 0,
            converged: false,
        };
    }

    let mut simplex = Simplex::new(&objective, initial, bounds, config.initial_step);
    let mut iterations = 0;
    let mut converged = false;

    while iterations < config.max_iter {
        simplex.sort();

        let best_value = simplex.values[0];
        let scale_f = 1.0 + best_value.abs();
        let scale_x = 1.0 + simplex.vertices[0].iter().fold(0.0_f64, |m, x| m.max(x.abs()));
        if simplex.value_spread() <= config.f_tolerance * scale_f
            || simplex.diameter() <= config.x_tolerance * scale_x
        {
            converged = true;
            break;
        }

        iterations += 1;

        let worst = simplex.worst();
        let second_worst_value = simplex.values[worst - 1];
        let worst_value = simplex.values[worst];
        let centroid = simplex.centroid();

        let reflected = simplex.along(&centroid, &simplex.vertices[worst], -config.alpha);
        let reflected_value = score(&objective, &reflected);

        if reflected_value < best_value {
            let expanded = simplex.along(&centroid, &reflected, config.gamma);
            let expanded_value = score(&objective, &expanded);
            if expanded_value < reflected_value {
                simplex.replace_worst(expanded, expanded_value);
            } else {
                simplex.replace_worst(reflected, reflected_value);
            }
            continue;
        }

        if reflected_value < second_worst_value {
            simplex.replace_worst(reflected, reflected_value);
            continue;
        }

        if reflected_value < worst_value {
            let outside = simplex.along(&centroid, &reflected, config.rho);
            let outside_value = score(&objective, &outside);
            if outside_value <= reflected_value {
                simplex.replace_worst(outside, outside_value);
                continue;
            }
        } else {
            let inside = simplex.along(&centroid, &simplex.vertices[worst], config.rho);
            let inside_value = score(&objective, &inside);
            if inside_value < worst_value {
                simplex.replace_worst(inside, inside_value);
                continue;
            }
        }

        simplex.shrink(&objective, config.sigma);
    }

    simplex.sort();
    NelderMeadResult {
        optimal_point: simplex.vertices.swap_remove(0),
        optimal_value: simplex.values[0],
        iterations,
        converged,
    }
}

fn score<F: Fn(&[f64]) -> f64>(objective: &F, point: &[f64]) -> f64 {
    let value = objective(point);
    if value.is_finite() {
        value
    } else {
        f64::INFINITY
    }
}

fn clamp(mut point: Vec<f64>, bounds: Bounds<'_>) -> Vec<f64> {
    if let Some(bounds) = bounds {
        for (x, &(lo, hi)) in point.iter_mut().zip(bounds) {
            *x = x.clamp(lo, hi);
        }
    }
    point
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn nelder_mead_quadratic_2d() {
        let result = nelder_mead(
            |x| (x[0] - 2.0).powi(2) + (x[1] - 3.0).powi(2),
            &[0.0, 0.0],
            None,
            NelderMeadConfig::default(),
        );

        assert!(result.converged);
        assert_relative_eq!(result.optimal_point[0], 2.0, epsilon = 1e-3);
        assert_relative_eq!(result.optimal_point[1], 3.0, epsilon = 1e-3);
        assert!(result.optimal_value < 1e-6);
    }

    #[test]
    fn nelder_mead_rosenbrock() {
        let result = nelder_mead(
            |x| (1.0 - x[0]).powi(2) + 100.0 * (x[1] - x[0] * x[0]).powi(2),
            &[-1.0, 1.0],
            None,
            NelderMeadConfig {
                max_iter: 5000,
                ..Default::default()
            },
        );

        assert_relative_eq!(result.optimal_point[0], 1.0, epsilon = 1e-2);
        assert_relative_eq!(result.optimal_point[1], 1.0, epsilon = 1e-2);
    }

    #[test]
    fn nelder_mead_respects_bounds() {
        // Unconstrained minimum at x = 5 lies outside the box.
        let bounds = [(-1.0, 1.0)];
        let result = nelder_mead(
            |x| (x[0] - 5.0).powi(2),
            &[0.0],
            Some(&bounds),
            NelderMeadConfig::default(),
        );

        assert!(result.optimal_point[0] <= 1.0);
        assert_relative_eq!(result.optimal_point[0], 1.0, epsilon = 1e-6);
    }

    #[test]
    fn nelder_mead_scale_invariant_tolerance() {
        // Objective values in the millions still converge with a relative tolerance.
        let result = nelder_mead(
            |x| 4.0e6 + 1.0e6 * (x[0] - 0.3).powi(2),
            &[0.0],
            None,
            NelderMeadConfig::default(),
        );
        assert!(result.converged);
        assert_relative_eq!(result.optimal_point[0], 0.3, epsilon = 1e-3);
    }

    #[test]
    fn nelder_mead_treats_nan_as_infinite() {
        let result = nelder_mead(
            |x| if x[0] < 0.0 { f64::NAN } else { (x[0] - 1.0).powi(2) },
            &[0.5],
            None,
            NelderMeadConfig::default(),
        );
        assert!(result.optimal_value.is_finite());
        assert_relative_eq!(result.optimal_point[0], 1.0, epsilon = 1e-3);
    }

    #[test]
    fn nelder_mead_empty_input() {
        let result = nelder_mead(|_| 0.0, &[], None, NelderMeadConfig::default());
        assert!(!result.converged);
        assert!(result.optimal_point.is_empty());
    }
}
