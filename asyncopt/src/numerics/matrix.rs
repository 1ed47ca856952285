//! Row-major dense matrix routines: products, LUP decomposition,
//! and inversion.
//!
//! Matrices are `Vec<Vec<f64>>` in row-major order. The sizes
//! involved (quadratic fits over at most a few dozen parameters) are
//! far too small to justify a linear algebra crate.

use super::NumericsError;

/// Pivots with absolute value at or below this are treated as zero.
const PIVOT_TOLERANCE: f64 = 1e-12;

/// Returns the transpose of `m`.
pub fn transpose(m: &[Vec<f64>]) -> Vec<Vec<f64>> {
    let rows = m.len();
    let cols = m[0].len();
    (0..cols)
        .map(|j| (0..rows).map(|i| m[i][j]).collect())
        .collect()
}

/// Computes the matrix product `a * b`.
///
/// # Errors
/// [`NumericsError::DimensionMismatch`] if the inner dimensions
/// disagree.
pub fn multiply(a: &[Vec<f64>], b: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, NumericsError> {
    let inner = a[0].len();
    if inner != b.len() {
        return Err(NumericsError::DimensionMismatch);
    }
    let cols = b[0].len();

    Ok(a.iter()
        .map(|row| {
            (0..cols)
                .map(|j| (0..inner).map(|k| row[k] * b[k][j]).sum())
                .collect()
        })
        .collect())
}

/// Computes the matrix-vector product `a * v`.
pub fn multiply_vector(a: &[Vec<f64>], v: &[f64]) -> Result<Vec<f64>, NumericsError> {
    if a[0].len() != v.len() {
        return Err(NumericsError::DimensionMismatch);
    }
    Ok(a.iter()
        .map(|row| row.iter().zip(v).map(|(&m, &x)| m * x).sum())
        .collect())
}

/// An LUP decomposition of a square matrix: `P * A = L * U`, with L
/// and U packed into one matrix and the permutation kept as a row
/// index map.
#[derive(Debug)]
pub struct LupDecomposition {
    lu: Vec<Vec<f64>>,
    permutation: Vec<usize>,
}

impl LupDecomposition {
    /// Decomposes a square matrix with partial pivoting.
    ///
    /// # Errors
    /// [`NumericsError::SingularMatrix`] when no usable pivot remains
    /// in some column.
    pub fn new(a: &[Vec<f64>]) -> Result<LupDecomposition, NumericsError> {
        let n = a.len();
        let mut lu: Vec<Vec<f64>> = a.to_vec();
        let mut permutation: Vec<usize> = (0..n).collect();

        for col in 0..n {
            let pivot_row = (col..n)
                .max_by(|&i, &j| lu[i][col].abs().partial_cmp(&lu[j][col].abs()).unwrap())
                .ok_or(NumericsError::SingularMatrix)?;
            if lu[pivot_row][col].abs() <= PIVOT_TOLERANCE {
                return Err(NumericsError::SingularMatrix);
            }

            lu.swap(col, pivot_row);
            permutation.swap(col, pivot_row);

            for row in col + 1..n {
                let factor = lu[row][col] / lu[col][col];
                lu[row][col] = factor;
                for k in col + 1..n {
                    lu[row][k] -= factor * lu[col][k];
                }
            }
        }

        Ok(LupDecomposition { lu, permutation })
    }

    /// Solves `A * x = b` by forward and back substitution.
    pub fn solve(&self, b: &[f64]) -> Result<Vec<f64>, NumericsError> {
        let n = self.lu.len();
        if b.len() != n {
            return Err(NumericsError::DimensionMismatch);
        }

        let mut x = vec![0.0; n];
        for i in 0..n {
            x[i] = b[self.permutation[i]];
            for k in 0..i {
                x[i] -= self.lu[i][k] * x[k];
            }
        }
        for i in (0..n).rev() {
            for k in i + 1..n {
                x[i] -= self.lu[i][k] * x[k];
            }
            x[i] /= self.lu[i][i];
        }
        Ok(x)
    }
}

/// Inverts a square matrix via LUP decomposition, one column solve
/// per unit vector.
///
/// # Errors
/// [`NumericsError::SingularMatrix`] when the matrix has no inverse.
pub fn invert(a: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, NumericsError> {
    let n = a.len();
    let decomposition = LupDecomposition::new(a)?;

    let mut columns = Vec::with_capacity(n);
    for j in 0..n {
        let mut unit = vec![0.0; n];
        unit[j] = 1.0;
        columns.push(decomposition.solve(&unit)?);
    }

    // Solved column-by-column; transpose back to row-major.
    Ok(transpose(&columns))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: &[Vec<f64>], b: &[Vec<f64>]) {
        for (row_a, row_b) in a.iter().zip(b) {
            for (&x, &y) in row_a.iter().zip(row_b) {
                assert!((x - y).abs() < 1e-9, "{} != {}", x, y);
            }
        }
    }

    #[test]
    fn transpose_swaps_dimensions() {
        let m = vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]];
        assert_eq!(
            transpose(&m),
            vec![vec![1.0, 4.0], vec![2.0, 5.0], vec![3.0, 6.0]]
        );
    }

    #[test]
    fn multiply_matches_hand_computation() {
        let a = vec![vec![1.0, 2.0], vec![3.0, 4.0]];
        let b = vec![vec![5.0, 6.0], vec![7.0, 8.0]];
        assert_eq!(
            multiply(&a, &b).unwrap(),
            vec![vec![19.0, 22.0], vec![43.0, 50.0]]
        );
        assert_eq!(multiply_vector(&a, &[1.0, 1.0]).unwrap(), vec![3.0, 7.0]);
    }

    #[test]
    fn mismatched_dimensions_error() {
        let a = vec![vec![1.0, 2.0]];
        let b = vec![vec![1.0]];
        assert_eq!(multiply(&a, &b).unwrap_err(), NumericsError::DimensionMismatch);
        assert_eq!(
            multiply_vector(&a, &[1.0]).unwrap_err(),
            NumericsError::DimensionMismatch
        );
    }

    #[test]
    fn solve_recovers_known_solution() {
        // Requires pivoting: leading zero.
        let a = vec![
            vec![0.0, 2.0, 1.0],
            vec![1.0, 1.0, 1.0],
            vec![2.0, 0.0, 3.0],
        ];
        let x_true = [1.0, -2.0, 3.0];
        let b: Vec<f64> = multiply_vector(&a, &x_true).unwrap();

        let x = LupDecomposition::new(&a).unwrap().solve(&b).unwrap();
        for (computed, expected) in x.iter().zip(&x_true) {
            assert!((computed - expected).abs() < 1e-9);
        }
    }

    #[test]
    fn invert_produces_identity() {
        let a = vec![
            vec![4.0, 7.0, 2.0],
            vec![2.0, 6.0, 1.0],
            vec![1.0, 2.0, 5.0],
        ];
        let inverse = invert(&a).unwrap();
        let product = multiply(&a, &inverse).unwrap();
        let identity = vec![
            vec![1.0, 0.0, 0.0],
            vec![0.0, 1.0, 0.0],
            vec![0.0, 0.0, 1.0],
        ];
        assert_close(&product, &identity);
    }

    #[test]
    fn singular_matrix_is_a_typed_error() {
        let a = vec![vec![1.0, 2.0], vec![2.0, 4.0]];
        assert_eq!(invert(&a).unwrap_err(), NumericsError::SingularMatrix);
        assert_eq!(
            LupDecomposition::new(&a).unwrap_err(),
            NumericsError::SingularMatrix
        );
    }
}
