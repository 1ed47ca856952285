//! Least-squares quadratic surface fitting.
//!
//! The asynchronous Newton method never differentiates the objective
//! directly. Instead it fits a quadratic surface to a cloud of
//! (point, fitness) samples by ordinary least squares and reads the
//! gradient and Hessian of the fit, which tolerates both noisy
//! objectives and samples arriving from anywhere in the region.

use super::matrix::{invert, multiply, multiply_vector, transpose, LupDecomposition};
use super::NumericsError;

/// Number of coefficients in the quadratic fit over `n` parameters:
/// constant, `n` linear, `n` pure quadratic, and `n(n-1)/2` cross
/// terms.
pub fn coefficient_count(number_parameters: usize) -> usize {
    1 + 2 * number_parameters + number_parameters * (number_parameters - 1) / 2
}

/// Fits a quadratic surface to the samples by least squares and
/// returns its `(hessian, gradient)` at `center`.
///
/// Each sample is expressed as an offset from the center
/// (`center - point`) and a design-matrix row
/// `[1, x_1..x_n, 0.5*x_1^2..0.5*x_n^2, x_1*x_2, .., x_{n-1}*x_n]`
/// is built from it; the normal equations
/// `W = (X^T X)^-1 X^T y` then yield the surface coefficients.
///
/// # Errors
/// [`NumericsError::InsufficientSamples`] when there are fewer
/// samples than coefficients, and
/// [`NumericsError::SingularMatrix`] when the samples do not span
/// the surface (e.g. collinear points).
pub fn randomized_hessian(
    points: &[Vec<f64>],
    center: &[f64],
    fitnesses: &[f64],
) -> Result<(Vec<Vec<f64>>, Vec<f64>), NumericsError> {
    let n = center.len();
    let x_len = coefficient_count(n);
    if points.len() < x_len || points.len() != fitnesses.len() {
        return Err(NumericsError::InsufficientSamples {
            needed: x_len,
            provided: points.len().min(fitnesses.len()),
        });
    }

    let mut design = Vec::with_capacity(points.len());
    for point in points {
        if point.len() != n {
            return Err(NumericsError::DimensionMismatch);
        }
        let offset: Vec<f64> = center.iter().zip(point).map(|(&c, &p)| c - p).collect();

        let mut row = Vec::with_capacity(x_len);
        row.push(1.0);
        row.extend_from_slice(&offset);
        row.extend(offset.iter().map(|&x| 0.5 * x * x));
        for j in 0..n {
            for k in j + 1..n {
                row.push(offset[j] * offset[k]);
            }
        }
        design.push(row);
    }

    // Normal equations: W = (X^T X)^-1 X^T y.
    let design_transpose = transpose(&design);
    let normal = multiply(&design_transpose, &design)?;
    let normal_inverse = invert(&normal)?;
    let projection = multiply(&normal_inverse, &design_transpose)?;
    let coefficients = multiply_vector(&projection, fitnesses)?;

    let gradient = coefficients[1..1 + n].to_vec();
    let mut hessian = vec![vec![0.0; n]; n];
    for i in 0..n {
        hessian[i][i] = coefficients[1 + n + i];
    }
    let mut current = 1 + 2 * n;
    for j in 0..n {
        for k in j + 1..n {
            hessian[j][k] = coefficients[current];
            hessian[k][j] = coefficients[current];
            current += 1;
        }
    }

    Ok((hessian, gradient))
}

/// Solves `H * step = g` for the Newton step toward the stationary
/// point of the fitted surface.
///
/// # Errors
/// [`NumericsError::SingularMatrix`] when the Hessian cannot be
/// inverted.
pub fn newton_step(hessian: &[Vec<f64>], gradient: &[f64]) -> Result<Vec<f64>, NumericsError> {
    LupDecomposition::new(hessian)?.solve(gradient)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn coefficient_counts() {
        assert_eq!(coefficient_count(1), 3);
        assert_eq!(coefficient_count(2), 6);
        assert_eq!(coefficient_count(3), 10);
    }

    #[test]
    fn too_few_samples_error() {
        let points = vec![vec![0.0, 0.0]; 4];
        let fitnesses = vec![0.0; 4];
        assert!(matches!(
            randomized_hessian(&points, &[0.0, 0.0], &fitnesses),
            Err(NumericsError::InsufficientSamples {
                needed: 6,
                provided: 4
            })
        ));
    }

    #[test]
    fn collinear_samples_are_a_singular_fit() {
        // All samples on a line cannot determine a 2d surface.
        let points: Vec<Vec<f64>> = (0..8).map(|i| vec![i as f64, i as f64]).collect();
        let fitnesses = vec![1.0; 8];
        assert!(matches!(
            randomized_hessian(&points, &[0.0, 0.0], &fitnesses),
            Err(NumericsError::SingularMatrix)
        ));
    }

    #[test]
    fn exact_quadratic_is_recovered() {
        // f(p) = -( (p0-1)^2 + 2*(p1+2)^2 + p0*p1 ), a known surface
        // whose Hessian and gradient the fit must reproduce.
        let objective = |p: &[f64]| {
            -((p[0] - 1.0).powi(2) + 2.0 * (p[1] + 2.0).powi(2) + p[0] * p[1])
        };
        let center = [0.5, -1.0];

        let mut rng = StdRng::seed_from_u64(7);
        let points: Vec<Vec<f64>> = (0..40)
            .map(|_| {
                vec![
                    center[0] - 1.0 + 2.0 * rng.gen::<f64>(),
                    center[1] - 1.0 + 2.0 * rng.gen::<f64>(),
                ]
            })
            .collect();
        let fitnesses: Vec<f64> = points.iter().map(|p| objective(p)).collect();

        let (hessian, _gradient) = randomized_hessian(&points, &center, &fitnesses).unwrap();

        // The fit is in offsets x = center - p, so the surface's
        // second derivatives match the objective's directly.
        assert!((hessian[0][0] - -2.0).abs() < 1e-6);
        assert!((hessian[1][1] - -4.0).abs() < 1e-6);
        assert!((hessian[0][1] - -1.0).abs() < 1e-6);
        assert!((hessian[1][0] - -1.0).abs() < 1e-6);
    }

    #[test]
    fn newton_step_lands_on_the_stationary_point() {
        // One-dimensional parabola f(p) = -(p - 3)^2 around center 1:
        // the step from the fitted surface must point at p = 3.
        let objective = |p: &[f64]| -(p[0] - 3.0) * (p[0] - 3.0);
        let center = [1.0];

        let mut rng = StdRng::seed_from_u64(11);
        let points: Vec<Vec<f64>> = (0..20)
            .map(|_| vec![center[0] - 2.0 + 4.0 * rng.gen::<f64>()])
            .collect();
        let fitnesses: Vec<f64> = points.iter().map(|p| objective(p)).collect();

        let (hessian, gradient) = randomized_hessian(&points, &center, &fitnesses).unwrap();
        let step = newton_step(&hessian, &gradient).unwrap();

        // With offsets x = center - p, the fit's stationary point
        // sits at x* = -H^-1 g, i.e. p* = center + step.
        assert!((center[0] + step[0] - 3.0).abs() < 1e-6);
    }
}
