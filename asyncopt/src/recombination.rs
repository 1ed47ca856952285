//! Stateless bounding, sampling and crossover routines shared by
//! the search engines.
//!
//! All random sampling is parameterized by a caller-supplied uniform
//! random source, so the same routines serve both the engines' own
//! RNGs and reproducible test generators.

use rand::Rng;

use std::error::Error;
use std::f64::consts::PI;
use std::fmt;

/// Tolerance used to recognize a `[-2π, 2π]` bound pair as a
/// periodic (radian) coordinate.
const RADIAN_BOUND_EPSILON: f64 = 1e-5;

/// An error describing an invalid search box or step vector.
#[derive(Debug)]
pub enum BoundsError {
    /// The minimum and maximum bound vectors have different lengths.
    MismatchedLengths(usize, usize),
    /// `min_bound[index] >= max_bound[index]`.
    InvertedBound(usize, f64, f64),
    /// A step or radius coordinate was not strictly positive.
    NonPositiveStep(usize, f64),
}

impl fmt::Display for BoundsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MismatchedLengths(min_len, max_len) => write!(
                f,
                "length of min_bound ({}) was not equal to length of max_bound ({})",
                min_len, max_len
            ),
            Self::InvertedBound(i, min, max) => write!(
                f,
                "min_bound[{}] ({}) was >= max_bound[{}] ({})",
                i, min, i, max
            ),
            Self::NonPositiveStep(i, step) => {
                write!(f, "step or width[{}] ({}) was <= 0", i, step)
            }
        }
    }
}

impl Error for BoundsError {}

/// Checks that the two bound vectors describe a valid search box.
///
/// # Errors
/// Returns a [`BoundsError`] if the lengths differ or any minimum
/// is not strictly below its maximum.
///
/// # Examples
/// ```
/// use asyncopt::recombination::check_bounds;
///
/// assert!(check_bounds(&[0.0, -1.0], &[1.0, 1.0]).is_ok());
/// assert!(check_bounds(&[0.0, 2.0], &[1.0, 1.0]).is_err());
/// ```
pub fn check_bounds(min_bound: &[f64], max_bound: &[f64]) -> Result<(), BoundsError> {
    if min_bound.len() != max_bound.len() {
        return Err(BoundsError::MismatchedLengths(
            min_bound.len(),
            max_bound.len(),
        ));
    }
    for (i, (&min, &max)) in min_bound.iter().zip(max_bound).enumerate() {
        if min >= max {
            return Err(BoundsError::InvertedBound(i, min, max));
        }
    }
    Ok(())
}

/// Checks that every coordinate of a step or radius vector is
/// strictly positive.
pub fn check_step(step: &[f64]) -> Result<(), BoundsError> {
    for (i, &s) in step.iter().enumerate() {
        if s <= 0.0 {
            return Err(BoundsError::NonPositiveStep(i, s));
        }
    }
    Ok(())
}

/// Returns true if the coordinate's bound pair is exactly the
/// periodic radian domain `[-2π, 2π]`.
pub(crate) fn is_wrappable_radian_bound(min: f64, max: f64) -> bool {
    (max - 2.0 * PI).abs() < RADIAN_BOUND_EPSILON && (min + 2.0 * PI).abs() < RADIAN_BOUND_EPSILON
}

/// Clamps each coordinate of `parameters` into its bound pair.
///
/// When `wrap_radians` is set, any coordinate whose bounds are
/// exactly `[-2π, 2π]` is wrapped by repeated ±2π shifts instead of
/// clamped, preserving periodic (angular) semantics.
///
/// # Examples
/// ```
/// use asyncopt::recombination::bound_parameters;
/// use std::f64::consts::PI;
///
/// let mut v = [3.0 * PI];
/// bound_parameters(&[-2.0 * PI], &[2.0 * PI], &mut v, true);
/// assert!((v[0] - PI).abs() < 1e-12);
/// ```
pub fn bound_parameters(
    min_bound: &[f64],
    max_bound: &[f64],
    parameters: &mut [f64],
    wrap_radians: bool,
) {
    for i in 0..min_bound.len() {
        if wrap_radians && is_wrappable_radian_bound(min_bound[i], max_bound[i]) {
            while parameters[i] > max_bound[i] {
                parameters[i] -= 2.0 * PI;
            }
            while parameters[i] < min_bound[i] {
                parameters[i] += 2.0 * PI;
            }
        } else {
            if parameters[i] < min_bound[i] {
                parameters[i] = min_bound[i];
            }
            if parameters[i] > max_bound[i] {
                parameters[i] = max_bound[i];
            }
        }
    }
}

/// Returns true if any coordinate lies outside its bound pair.
pub fn out_of_bounds(min_bound: &[f64], max_bound: &[f64], parameters: &[f64]) -> bool {
    parameters
        .iter()
        .zip(min_bound.iter().zip(max_bound))
        .any(|(&p, (&min, &max))| p < min || p > max)
}

/// Draws one point uniformly within the search box.
pub fn random_within(min_bound: &[f64], max_bound: &[f64], rng: &mut impl Rng) -> Vec<f64> {
    min_bound
        .iter()
        .zip(max_bound)
        .map(|(&min, &max)| min + rng.gen::<f64>() * (max - min))
        .collect()
}

/// Draws one point uniformly within the box of the given per-axis
/// radius centered at `center`.
pub fn random_around(center: &[f64], radius: &[f64], rng: &mut impl Rng) -> Vec<f64> {
    center
        .iter()
        .zip(radius)
        .map(|(&c, &r)| c - r + rng.gen::<f64>() * 2.0 * r)
        .collect()
}

/// Draws one point uniformly along the segment
/// `center + t * direction` for `t` in `[t_min, t_max]`.
pub fn random_along(
    center: &[f64],
    direction: &[f64],
    t_min: f64,
    t_max: f64,
    rng: &mut impl Rng,
) -> Vec<f64> {
    let t = t_min + rng.gen::<f64>() * (t_max - t_min);
    center
        .iter()
        .zip(direction)
        .map(|(&c, &d)| c + t * d)
        .collect()
}

/// Binary (binomial) crossover of two parameter vectors.
///
/// One coordinate, chosen uniformly at random, is always taken from
/// `src2`; every other coordinate is taken from `src2` independently
/// with probability `crossover_rate` and from `src1` otherwise.
pub fn binary_recombination(
    src1: &[f64],
    src2: &[f64],
    crossover_rate: f64,
    rng: &mut impl Rng,
) -> Vec<f64> {
    let selected = rng.gen_range(0..src1.len());

    (0..src1.len())
        .map(|i| {
            if i == selected || rng.gen::<f64>() < crossover_rate {
                src2[i]
            } else {
                src1[i]
            }
        })
        .collect()
}

/// Exponential crossover of two parameter vectors.
///
/// Coordinates are copied from `src1` until either the uniformly
/// chosen start coordinate is reached or a Bernoulli(`crossover_rate`)
/// trial succeeds; the remainder is copied from `src2`.
pub fn exponential_recombination(
    src1: &[f64],
    src2: &[f64],
    crossover_rate: f64,
    rng: &mut impl Rng,
) -> Vec<f64> {
    let selected = rng.gen_range(0..src1.len());

    let mut dest = vec![0.0; src1.len()];
    let mut i = 0;
    while i < src1.len() {
        if i == selected || rng.gen::<f64>() < crossover_rate {
            break;
        }
        dest[i] = src1[i];
        i += 1;
    }
    while i < src1.len() {
        dest[i] = src2[i];
        i += 1;
    }
    dest
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    #[test]
    fn check_bounds_rejects_bad_boxes() {
        assert!(check_bounds(&[0.0], &[1.0, 2.0]).is_err());
        assert!(check_bounds(&[1.0], &[1.0]).is_err());
        assert!(check_bounds(&[-1.0, 0.0], &[1.0, 0.5]).is_ok());
    }

    #[test]
    fn check_step_rejects_non_positive() {
        assert!(check_step(&[0.5, 0.0]).is_err());
        assert!(check_step(&[0.5, -1.0]).is_err());
        assert!(check_step(&[0.5, 1.0]).is_ok());
    }

    #[test]
    fn clamping_stays_within_bounds() {
        let mut v = [-3.0, 0.5, 12.0];
        bound_parameters(&[0.0, 0.0, 0.0], &[10.0, 10.0, 10.0], &mut v, false);
        assert_eq!(v, [0.0, 0.5, 10.0]);
    }

    #[test]
    fn radian_bounds_wrap_instead_of_clamping() {
        let mut v = [3.0 * PI];
        bound_parameters(&[-2.0 * PI], &[2.0 * PI], &mut v, true);
        assert!((v[0] - PI).abs() < 1e-12);

        let mut v = [-3.0 * PI];
        bound_parameters(&[-2.0 * PI], &[2.0 * PI], &mut v, true);
        assert!((v[0] + PI).abs() < 1e-12);
    }

    #[test]
    fn non_radian_bounds_clamp_even_when_wrapping_enabled() {
        let mut v = [5.0];
        bound_parameters(&[0.0], &[1.0], &mut v, true);
        assert_eq!(v, [1.0]);
    }

    #[test]
    fn random_samples_respect_their_regions() {
        let mut rng = rng();
        let min = [0.0, -5.0, 100.0];
        let max = [1.0, 5.0, 200.0];
        for _ in 0..100 {
            let p = random_within(&min, &max, &mut rng);
            assert!(!out_of_bounds(&min, &max, &p));
        }

        let center = [0.0, 0.0];
        let radius = [1.0, 2.0];
        for _ in 0..100 {
            let p = random_around(&center, &radius, &mut rng);
            assert!(p[0].abs() <= 1.0 && p[1].abs() <= 2.0);
        }
    }

    #[test]
    fn random_along_lies_on_the_segment() {
        let mut rng = rng();
        let center = [1.0, 2.0];
        let direction = [1.0, -1.0];
        for _ in 0..100 {
            let p = random_along(&center, &direction, -1.0, 3.0, &mut rng);
            let t = p[0] - center[0];
            assert!((-1.0..=3.0).contains(&t));
            assert!((p[1] - (center[1] - t)).abs() < 1e-12);
        }
    }

    #[test]
    fn binary_recombination_with_zero_rate_swaps_exactly_one() {
        let mut rng = rng();
        let src1 = [1.0, 1.0, 1.0, 1.0, 1.0];
        let src2 = [2.0, 2.0, 2.0, 2.0, 2.0];
        for _ in 0..20 {
            let child = binary_recombination(&src1, &src2, 0.0, &mut rng);
            let swapped = child.iter().filter(|&&c| c == 2.0).count();
            assert_eq!(swapped, 1);
        }
    }

    #[test]
    fn binary_recombination_with_full_rate_copies_src2() {
        let mut rng = rng();
        let src1 = [1.0, 1.0, 1.0];
        let src2 = [2.0, 3.0, 4.0];
        let child = binary_recombination(&src1, &src2, 1.0, &mut rng);
        assert_eq!(child, src2);
    }

    #[test]
    fn exponential_recombination_is_a_prefix_suffix_split() {
        let mut rng = rng();
        let src1 = [1.0; 8];
        let src2 = [2.0; 8];
        for _ in 0..20 {
            let child = exponential_recombination(&src1, &src2, 0.3, &mut rng);
            let split = child.iter().position(|&c| c == 2.0).unwrap_or(8);
            assert!(child[..split].iter().all(|&c| c == 1.0));
            assert!(child[split..].iter().all(|&c| c == 2.0));
        }
    }
}
