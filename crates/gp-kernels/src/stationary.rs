//! Closed-form stationary kernels: RBF and Matérn
//!
//! Both kernels carry ARD lengthscales (one per input dimension) and an
//! amplitude, each behind a positivity [`Bijector`]. The input dimension is the
//! number of lengthscales.

use crate::kernel::{stationary_gram, Kernel, SpectralDensity, StationaryKernel};
use gp_core::{Bijector, Element, Error, Flatten, LeafCursor, Param, Result, Softplus, Static, VectorParam};
use nalgebra::{DMatrix, DVector};
use rand::Rng;
use rand_distr::{ChiSquared, Distribution, StandardNormal};
use serde::{Deserialize, Serialize};

/// Squared exponential kernel, `variance * exp(-r^2 / 2)`
#[derive(Debug, Clone, PartialEq)]
pub struct Rbf<T: Element, B = Softplus> {
    lengthscale: VectorParam<T, B>,
    variance: Param<T, B>,
    name: Static<String>,
}

impl<T: Element, B: Bijector<T>> Rbf<T, B> {
    pub fn new(lengthscale: &DVector<T>, variance: T, transform: B) -> Result<Self> {
        let (lengthscale, variance) = stationary_params(lengthscale, variance, transform)?;
        Ok(Self {
            lengthscale,
            variance,
            name: Static("RBF".to_string()),
        })
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Static(name.into());
        self
    }
}

impl<T: Element, B: Bijector<T>> Kernel<T> for Rbf<T, B> {
    fn gram(&self, x: &DMatrix<T>, y: &DMatrix<T>) -> Result<DMatrix<T>> {
        stationary_gram(self, x, y)
    }

    fn input_dim(&self) -> usize {
        self.lengthscale.len()
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl<T: Element, B: Bijector<T>> StationaryKernel<T> for Rbf<T, B> {
    fn lengthscale(&self) -> DVector<T> {
        self.lengthscale.value()
    }

    fn variance(&self) -> T {
        self.variance.value()
    }

    fn correlation(&self, scaled_sq_dist: T) -> T {
        (-scaled_sq_dist * T::cast(0.5)).exp()
    }
}

impl<T: Element, B: Bijector<T>> SpectralDensity<T> for Rbf<T, B> {
    /// Standard normal frequencies
    fn sample_frequencies<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        num_basis: usize,
        input_dim: usize,
    ) -> Result<DMatrix<T>> {
        Ok(DMatrix::from_fn(num_basis, input_dim, |_, _| {
            let z: f64 = StandardNormal.sample(&mut *rng);
            T::cast(z)
        }))
    }
}

impl<T: Element, B: Bijector<T>> Flatten<T> for Rbf<T, B> {
    fn flatten(&self) -> Vec<T> {
        let mut leaves = self.lengthscale.flatten();
        leaves.extend(self.variance.flatten());
        leaves
    }

    fn unflatten(&self, leaves: &[T]) -> Result<Self> {
        let (lengthscale, variance) = unflatten_params(&self.lengthscale, &self.variance, leaves)?;
        Ok(Self {
            lengthscale,
            variance,
            name: self.name.clone(),
        })
    }

    fn num_leaves(&self) -> usize {
        self.lengthscale.len() + 1
    }
}

/// Smoothness of a Matérn kernel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MaternOrder {
    /// nu = 1/2, the exponential kernel
    Half,
    /// nu = 3/2
    ThreeHalves,
    /// nu = 5/2
    FiveHalves,
}

impl MaternOrder {
    /// The smoothness parameter nu
    pub fn nu(self) -> f64 {
        match self {
            MaternOrder::Half => 0.5,
            MaternOrder::ThreeHalves => 1.5,
            MaternOrder::FiveHalves => 2.5,
        }
    }

    fn label(self) -> &'static str {
        match self {
            MaternOrder::Half => "Matern12",
            MaternOrder::ThreeHalves => "Matern32",
            MaternOrder::FiveHalves => "Matern52",
        }
    }
}

/// Matérn kernel of order 1/2, 3/2 or 5/2
#[derive(Debug, Clone, PartialEq)]
pub struct Matern<T: Element, B = Softplus> {
    lengthscale: VectorParam<T, B>,
    variance: Param<T, B>,
    order: Static<MaternOrder>,
    name: Static<String>,
}

impl<T: Element, B: Bijector<T>> Matern<T, B> {
    pub fn new(order: MaternOrder, lengthscale: &DVector<T>, variance: T, transform: B) -> Result<Self> {
        let (lengthscale, variance) = stationary_params(lengthscale, variance, transform)?;
        Ok(Self {
            lengthscale,
            variance,
            order: Static(order),
            name: Static(order.label().to_string()),
        })
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Static(name.into());
        self
    }

    pub fn order(&self) -> MaternOrder {
        *self.order
    }
}

impl<T: Element, B: Bijector<T>> Kernel<T> for Matern<T, B> {
    fn gram(&self, x: &DMatrix<T>, y: &DMatrix<T>) -> Result<DMatrix<T>> {
        stationary_gram(self, x, y)
    }

    fn input_dim(&self) -> usize {
        self.lengthscale.len()
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl<T: Element, B: Bijector<T>> StationaryKernel<T> for Matern<T, B> {
    fn lengthscale(&self) -> DVector<T> {
        self.lengthscale.value()
    }

    fn variance(&self) -> T {
        self.variance.value()
    }

    fn correlation(&self, scaled_sq_dist: T) -> T {
        let r = scaled_sq_dist.max(T::zero()).sqrt();
        match *self.order {
            MaternOrder::Half => (-r).exp(),
            MaternOrder::ThreeHalves => {
                let s = T::cast(3.0f64.sqrt()) * r;
                (T::one() + s) * (-s).exp()
            }
            MaternOrder::FiveHalves => {
                let s = T::cast(5.0f64.sqrt()) * r;
                (T::one() + s + s * s / T::cast(3.0)) * (-s).exp()
            }
        }
    }
}

impl<T: Element, B: Bijector<T>> SpectralDensity<T> for Matern<T, B> {
    /// Multivariate Student-t frequencies with `2 nu` degrees of freedom
    fn sample_frequencies<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        num_basis: usize,
        input_dim: usize,
    ) -> Result<DMatrix<T>> {
        let dof = 2.0 * self.order.nu();
        let chi2 = ChiSquared::new(dof)
            .map_err(|e| Error::Computation(format!("chi-squared with {dof} dof: {e}")))?;
        let mut freqs = DMatrix::zeros(num_basis, input_dim);
        for i in 0..num_basis {
            // one shared mixing draw per row keeps the row multivariate-t
            let u: f64 = chi2.sample(&mut *rng);
            let scale = (dof / u).sqrt();
            for d in 0..input_dim {
                let z: f64 = StandardNormal.sample(&mut *rng);
                freqs[(i, d)] = T::cast(z * scale);
            }
        }
        Ok(freqs)
    }
}

impl<T: Element, B: Bijector<T>> Flatten<T> for Matern<T, B> {
    fn flatten(&self) -> Vec<T> {
        let mut leaves = self.lengthscale.flatten();
        leaves.extend(self.variance.flatten());
        leaves
    }

    fn unflatten(&self, leaves: &[T]) -> Result<Self> {
        let (lengthscale, variance) = unflatten_params(&self.lengthscale, &self.variance, leaves)?;
        Ok(Self {
            lengthscale,
            variance,
            order: self.order,
            name: self.name.clone(),
        })
    }

    fn num_leaves(&self) -> usize {
        self.lengthscale.len() + 1
    }
}

fn stationary_params<T: Element, B: Bijector<T>>(
    lengthscale: &DVector<T>,
    variance: T,
    transform: B,
) -> Result<(VectorParam<T, B>, Param<T, B>)> {
    if lengthscale.is_empty() {
        return Err(Error::InvalidParameter(
            "lengthscale must have at least one entry".to_string(),
        ));
    }
    if let Some(&bad) = lengthscale.iter().find(|&&l| !(l > T::zero())) {
        return Err(Error::not_positive("lengthscale", bad.into_f64()));
    }
    if !(variance > T::zero()) {
        return Err(Error::not_positive("variance", variance.into_f64()));
    }
    Ok((
        VectorParam::new(lengthscale, transform.clone())?,
        Param::new(variance, transform)?,
    ))
}

fn unflatten_params<T: Element, B: Bijector<T>>(
    lengthscale: &VectorParam<T, B>,
    variance: &Param<T, B>,
    leaves: &[T],
) -> Result<(VectorParam<T, B>, Param<T, B>)> {
    let mut cursor = LeafCursor::new(leaves);
    let lengthscale = lengthscale.unflatten(cursor.take(lengthscale.len())?)?;
    let variance = variance.unflatten(cursor.take(1)?)?;
    cursor.finish()?;
    Ok((lengthscale, variance))
}
