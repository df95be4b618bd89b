//! Random Fourier feature approximation of stationary kernels
//!
//! By Bochner's theorem a stationary kernel is the Fourier transform of its
//! spectral measure. Drawing `M` frequencies `w_m` from that measure gives the
//! finite approximation
//!
//! ```text
//! k(x, y) ~ variance / M * sum_m [cos(w_m.x) cos(w_m.y) + sin(w_m.x) sin(w_m.y)]
//!         = variance / M * phi(x) . phi(y)
//! ```
//!
//! with `phi(x) = [cos(x W^T), sin(x W^T)]`. The Gram matrix is then the
//! product of two explicit `N x 2M` factors, which downstream code can use for
//! low-rank linear algebra.
//!
//! ## Trainable features
//!
//! The sampled frequency matrix is a dynamic leaf like the hyperparameters, so
//! an optimiser may move it away from its random initialisation. The model is
//! then a learned-feature model rather than a fixed random approximation.
//!
//! ## Frequency scaling
//!
//! [`compute_phi`](SpectralKernel::compute_phi) divides the frequencies by the
//! lengthscales only when asked to. Gram evaluation follows the kernel's static
//! `scale_frequencies` flag, which defaults to `false`: unscaled frequencies,
//! with the lengthscale parameter inert. Call
//! [`with_scaled_frequencies`](SpectralKernel::with_scaled_frequencies) to make
//! the approximation track the base kernel's lengthscales.

use crate::kernel::{check_input_dim, Kernel, SpectralDensity};
use crate::stationary::Rbf;
use gp_core::{Bijector, Element, Error, Flatten, LeafCursor, Result, Softplus, Static};
use nalgebra::{DMatrix, DVector};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, instrument};

/// Random Fourier feature approximation of a base stationary kernel
///
/// Dynamic leaves, in order: the base kernel's leaves (lengthscales then
/// variance), then the `num_basis x input_dim` frequency matrix column-major.
/// `num_basis`, `input_dim`, the scaling flag and the name are static.
#[derive(Debug, Clone, PartialEq)]
pub struct SpectralKernel<T: Element, K> {
    base: K,
    features: DMatrix<T>,
    num_basis: Static<usize>,
    input_dim: Static<usize>,
    scale_frequencies: Static<bool>,
    name: Static<String>,
}

/// Random Fourier feature approximation of the RBF kernel
pub type SpectralRbf<T, B = Softplus> = SpectralKernel<T, Rbf<T, B>>;

impl<T: Element, K: SpectralDensity<T>> SpectralKernel<T, K> {
    /// Sample `num_basis` frequencies for `base` from a caller-provided source
    ///
    /// The input dimension is taken from the base kernel's lengthscales.
    pub fn new<R: Rng + ?Sized>(base: K, num_basis: usize, rng: &mut R) -> Result<Self> {
        if num_basis == 0 {
            return Err(Error::InvalidParameter(
                "num_basis must be positive".to_string(),
            ));
        }
        let input_dim = base.input_dim();
        let features = base.sample_frequencies(rng, num_basis, input_dim)?;
        debug!(
            kernel = base.name(),
            num_basis,
            input_dim,
            "sampled spectral features"
        );
        let name = base.name().to_string();
        Ok(Self {
            base,
            features,
            num_basis: Static(num_basis),
            input_dim: Static(input_dim),
            scale_frequencies: Static(false),
            name: Static(name),
        })
    }

    /// Sample frequencies from a ChaCha8 stream seeded with `seed`
    ///
    /// Equal seeds give bit-identical features. Give independently
    /// constructed kernels distinct seeds, or share one generator through
    /// [`new`](SpectralKernel::new), to keep their features independent.
    pub fn with_seed(base: K, num_basis: usize, seed: u64) -> Result<Self> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        Self::new(base, num_basis, &mut rng)
    }

    /// Whether Gram evaluation divides frequencies by the lengthscales
    pub fn with_scaled_frequencies(mut self, scale: bool) -> Self {
        self.scale_frequencies = Static(scale);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Static(name.into());
        self
    }

    pub fn base(&self) -> &K {
        &self.base
    }

    /// The `num_basis x input_dim` frequency matrix
    pub fn features(&self) -> &DMatrix<T> {
        &self.features
    }

    pub fn num_basis(&self) -> usize {
        *self.num_basis
    }

    pub fn scales_frequencies(&self) -> bool {
        *self.scale_frequencies
    }

    /// Frequencies actually applied to inputs
    pub fn omega(&self, scale: bool) -> DMatrix<T> {
        if !scale {
            return self.features.clone();
        }
        let lengthscale: DVector<T> = self.base.lengthscale();
        let mut omega = self.features.clone();
        for (d, mut col) in omega.column_iter_mut().enumerate() {
            col /= lengthscale[d];
        }
        omega
    }

    /// Feature map `[cos(X W^T), sin(X W^T)]`, shape `N x 2 num_basis`
    ///
    /// `W` is the frequency matrix, divided column-wise by the lengthscales
    /// when `scale` is set.
    pub fn compute_phi(&self, x: &DMatrix<T>, scale: bool) -> Result<DMatrix<T>> {
        check_input_dim(x, *self.input_dim)?;
        let projection = x * self.omega(scale).transpose();
        let m = self.num_basis();
        let mut phi = DMatrix::zeros(x.nrows(), 2 * m);
        phi.columns_mut(0, m).copy_from(&projection.map(|v| v.cos()));
        phi.columns_mut(m, m).copy_from(&projection.map(|v| v.sin()));
        Ok(phi)
    }

    /// Factor `L` with `gram(X, X) = L L^T`, shape `N x 2 num_basis`
    pub fn low_rank_factor(&self, x: &DMatrix<T>) -> Result<DMatrix<T>> {
        let phi = self.compute_phi(x, self.scales_frequencies())?;
        let weight = (self.base.variance() / T::cast(self.num_basis() as f64)).sqrt();
        Ok(phi * weight)
    }
}

impl<T: Element, B: Bijector<T>> SpectralRbf<T, B> {
    /// RBF base kernel plus its random feature expansion in one step
    pub fn rbf(
        num_basis: usize,
        lengthscale: &DVector<T>,
        variance: T,
        transform: B,
        seed: u64,
        name: impl Into<String>,
    ) -> Result<Self> {
        let base = Rbf::new(lengthscale, variance, transform)?;
        Ok(Self::with_seed(base, num_basis, seed)?.with_name(name))
    }
}

impl<T: Element, K: SpectralDensity<T>> Kernel<T> for SpectralKernel<T, K> {
    /// `variance / num_basis * phi(X) phi(Y)^T`, shape `N_X x N_Y`
    #[instrument(skip_all, fields(kernel = %self.name.as_str(), n_x = x.nrows(), n_y = y.nrows()))]
    fn gram(&self, x: &DMatrix<T>, y: &DMatrix<T>) -> Result<DMatrix<T>> {
        let lx = self.low_rank_factor(x)?;
        let ly = self.low_rank_factor(y)?;
        Ok(lx * ly.transpose())
    }

    fn input_dim(&self) -> usize {
        *self.input_dim
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn is_spectral(&self) -> bool {
        true
    }
}

impl<T: Element, K: SpectralDensity<T>> Flatten<T> for SpectralKernel<T, K> {
    fn flatten(&self) -> Vec<T> {
        let mut leaves = self.base.flatten();
        leaves.extend(self.features.iter().copied());
        leaves
    }

    fn unflatten(&self, leaves: &[T]) -> Result<Self> {
        let mut cursor = LeafCursor::new(leaves);
        let base = self.base.unflatten(cursor.take(self.base.num_leaves())?)?;
        let features = cursor.take_matrix(self.num_basis(), *self.input_dim)?;
        cursor.finish()?;
        Ok(Self {
            base,
            features,
            num_basis: self.num_basis,
            input_dim: self.input_dim,
            scale_frequencies: self.scale_frequencies,
            name: self.name.clone(),
        })
    }

    fn num_leaves(&self) -> usize {
        self.base.num_leaves() + self.features.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::StationaryKernel;
    use crate::stationary::{Matern, MaternOrder};
    use approx::assert_relative_eq;

    fn spectral(num_basis: usize, lengthscale: &[f64], seed: u64) -> SpectralRbf<f64> {
        SpectralRbf::rbf(
            num_basis,
            &DVector::from_column_slice(lengthscale),
            1.0,
            Softplus,
            seed,
            "RBF",
        )
        .unwrap()
    }

    fn inputs(n: usize, offset: f64) -> DMatrix<f64> {
        DMatrix::from_fn(n, 2, |i, j| offset + 0.3 * i as f64 - 0.2 * j as f64)
    }

    #[test]
    fn test_feature_shape_and_flags() {
        let k = spectral(50, &[1.0, 1.0], 123);
        assert_eq!(k.features().shape(), (50, 2));
        assert_eq!(k.num_basis(), 50);
        assert_eq!(k.input_dim(), 2);
        assert!(k.is_spectral());
        assert!(!k.scales_frequencies());
        assert_eq!(k.name(), "RBF");
    }

    #[test]
    fn test_rejects_zero_basis() {
        let base = Rbf::new(&DVector::from_element(2, 1.0), 1.0, Softplus).unwrap();
        assert!(SpectralKernel::with_seed(base, 0, 1).is_err());
    }

    #[test]
    fn test_phi_shape_is_column_concatenated() {
        let k = spectral(50, &[1.0, 1.0], 123);
        let x = inputs(10, 0.0);
        let phi = k.compute_phi(&x, false).unwrap();
        assert_eq!(phi.shape(), (10, 100));
        // cos^2 + sin^2 = 1 per frequency
        for i in 0..10 {
            for m in 0..50 {
                assert_relative_eq!(
                    phi[(i, m)].powi(2) + phi[(i, m + 50)].powi(2),
                    1.0,
                    epsilon = 1e-12
                );
            }
        }
    }

    #[test]
    fn test_gram_diagonal_equals_variance() {
        let base = Rbf::new(&DVector::from_element(2, 1.0), 2.5, Softplus).unwrap();
        let k = SpectralKernel::with_seed(base, 40, 9).unwrap();
        let x = inputs(6, 0.5);
        let gram = k.gram(&x, &x).unwrap();
        for i in 0..6 {
            assert_relative_eq!(gram[(i, i)], 2.5, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_input_dimension_checked() {
        let k = spectral(10, &[1.0, 1.0], 1);
        let x = DMatrix::<f64>::zeros(4, 3);
        assert!(matches!(
            k.compute_phi(&x, true),
            Err(Error::DimensionMismatch { expected: 2, actual: 3 })
        ));
        assert!(k.gram(&inputs(4, 0.0), &x).is_err());
    }

    #[test]
    fn test_omega_scaling() {
        let k = spectral(5, &[2.0, 4.0], 3);
        let scaled = k.omega(true);
        for i in 0..5 {
            assert_relative_eq!(scaled[(i, 0)], k.features()[(i, 0)] / 2.0, epsilon = 1e-12);
            assert_relative_eq!(scaled[(i, 1)], k.features()[(i, 1)] / 4.0, epsilon = 1e-12);
        }
        assert_eq!(&k.omega(false), k.features());
    }

    #[test]
    fn test_low_rank_factor_reproduces_gram() {
        let k = spectral(30, &[1.0, 1.0], 5).with_scaled_frequencies(true);
        let x = inputs(7, 0.0);
        let l = k.low_rank_factor(&x).unwrap();
        assert_eq!(l.shape(), (7, 60));
        let gram = k.gram(&x, &x).unwrap();
        assert!((&l * l.transpose() - gram).norm() < 1e-10);
    }

    #[test]
    fn test_flatten_layout() {
        let k = spectral(4, &[1.0, 2.0], 11);
        let leaves = k.flatten();
        // 2 lengthscales + variance + 4 x 2 features
        assert_eq!(leaves.len(), 11);
        assert_eq!(k.num_leaves(), 11);
        assert_eq!(&leaves[3..], k.features().as_slice());

        let mut moved = leaves.clone();
        for f in moved[3..].iter_mut() {
            *f += 1.0;
        }
        let trained = k.unflatten(&moved).unwrap();
        assert_eq!(trained.features().shape(), (4, 2));
        assert_relative_eq!(trained.features()[(0, 0)], k.features()[(0, 0)] + 1.0);
        assert_eq!(trained.num_basis(), 4);
        assert_eq!(trained.name(), k.name());
        assert!(k.unflatten(&leaves[..10]).is_err());
    }

    #[test]
    fn test_matern_spectral_gram_is_symmetric() {
        let base = Matern::new(MaternOrder::FiveHalves, &DVector::from_element(2, 1.0), 1.0, Softplus)
            .unwrap();
        let k = SpectralKernel::with_seed(base, 64, 21)
            .unwrap()
            .with_scaled_frequencies(true);
        assert_eq!(k.name(), "Matern52");
        assert_relative_eq!(k.base().variance(), 1.0, epsilon = 1e-12);
        let x = inputs(5, 0.0);
        let gram = k.gram(&x, &x).unwrap();
        assert!((&gram - gram.transpose()).norm() < 1e-12);
    }
}
