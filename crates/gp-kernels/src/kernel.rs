//! Kernel traits
//!
//! Kernels are layered by capability rather than by inheritance:
//!
//! - [`Kernel`]: evaluate a Gram matrix between two input matrices
//! - [`StationaryKernel`]: a kernel of the scaled distance `|(x - y) / l|`
//!   with an amplitude `variance`
//! - [`SpectralDensity`]: a stationary kernel whose spectral measure can be
//!   sampled, which is all [`SpectralKernel`](crate::SpectralKernel) needs to
//!   build a random feature approximation of it

use gp_core::{Element, Error, Flatten, Result};
use nalgebra::{DMatrix, DVector};
use rand::Rng;
use std::fmt::Debug;

/// Covariance function over rows of input matrices
pub trait Kernel<T: Element>: Flatten<T> + Clone + Debug + Send + Sync {
    /// Gram matrix `K[i, j] = k(x_i, y_j)`, shape `x.nrows() x y.nrows()`
    fn gram(&self, x: &DMatrix<T>, y: &DMatrix<T>) -> Result<DMatrix<T>>;

    /// Number of input columns the kernel accepts
    fn input_dim(&self) -> usize;

    /// Human-readable label
    fn name(&self) -> &str;

    /// Whether evaluation goes through an explicit finite feature map
    fn is_spectral(&self) -> bool {
        false
    }
}

/// Kernel that depends on inputs only through `(x - y) / lengthscale`
pub trait StationaryKernel<T: Element>: Kernel<T> {
    /// Per-dimension lengthscales (constrained)
    fn lengthscale(&self) -> DVector<T>;

    /// Amplitude (constrained)
    fn variance(&self) -> T;

    /// Unit-variance correlation as a function of the squared scaled distance
    fn correlation(&self, scaled_sq_dist: T) -> T;
}

/// Stationary kernel whose spectral measure can be sampled
pub trait SpectralDensity<T: Element>: StationaryKernel<T> {
    /// Draw `num_basis x input_dim` frequencies for unit lengthscales
    ///
    /// Rows are independent draws from the normalised spectral measure.
    /// Dividing column `d` by `lengthscale[d]` yields frequencies for the
    /// kernel's actual lengthscales.
    fn sample_frequencies<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        num_basis: usize,
        input_dim: usize,
    ) -> Result<DMatrix<T>>;
}

/// Ensure an input matrix has `input_dim` columns
pub fn check_input_dim<T: Element>(x: &DMatrix<T>, input_dim: usize) -> Result<()> {
    if x.ncols() != input_dim {
        return Err(Error::DimensionMismatch {
            expected: input_dim,
            actual: x.ncols(),
        });
    }
    Ok(())
}

/// Squared distances between rows of `x` and `y` after dividing by `lengthscale`
pub fn scaled_sq_distances<T: Element>(
    x: &DMatrix<T>,
    y: &DMatrix<T>,
    lengthscale: &DVector<T>,
) -> Result<DMatrix<T>> {
    check_input_dim(x, lengthscale.len())?;
    check_input_dim(y, lengthscale.len())?;
    Ok(DMatrix::from_fn(x.nrows(), y.nrows(), |i, j| {
        let mut acc = T::zero();
        for d in 0..lengthscale.len() {
            let diff = (x[(i, d)] - y[(j, d)]) / lengthscale[d];
            acc += diff * diff;
        }
        acc
    }))
}

/// Evaluate a stationary kernel in closed form
pub(crate) fn stationary_gram<T: Element, K: StationaryKernel<T>>(
    kernel: &K,
    x: &DMatrix<T>,
    y: &DMatrix<T>,
) -> Result<DMatrix<T>> {
    let variance = kernel.variance();
    let r2 = scaled_sq_distances(x, y, &kernel.lengthscale())?;
    Ok(r2.map(|d| variance * kernel.correlation(d)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_scaled_sq_distances() {
        let x = DMatrix::from_row_slice(2, 2, &[0.0, 0.0, 1.0, 2.0]);
        let y = DMatrix::from_row_slice(1, 2, &[1.0, 0.0]);
        let ls = DVector::from_vec(vec![1.0, 2.0]);
        let d = scaled_sq_distances(&x, &y, &ls).unwrap();
        assert_eq!(d.shape(), (2, 1));
        assert_relative_eq!(d[(0, 0)], 1.0);
        assert_relative_eq!(d[(1, 0)], 1.0);
    }

    #[test]
    fn test_dimension_mismatch_is_reported_early() {
        let x = DMatrix::<f64>::zeros(3, 3);
        let y = DMatrix::<f64>::zeros(2, 2);
        let ls = DVector::from_element(2, 1.0);
        match scaled_sq_distances(&x, &y, &ls) {
            Err(Error::DimensionMismatch { expected, actual }) => {
                assert_eq!(expected, 2);
                assert_eq!(actual, 3);
            }
            other => panic!("expected dimension mismatch, got {other:?}"),
        }
    }
}
