//! Serializable configuration for spectral kernels
//!
//! A [`SpectralConfig`] names everything needed to rebuild a spectral kernel,
//! including the seed. The seed has no default: a configuration that omits it
//! fails to parse, so two kernels never share random features by accident.
//!
//! ```rust
//! use gp_kernels::{Kernel, SpectralConfig};
//!
//! let config = SpectralConfig::from_json(r#"{
//!     "num_basis": 64,
//!     "lengthscale": [0.5, 2.0],
//!     "variance": 1.5,
//!     "seed": 42
//! }"#).unwrap();
//!
//! let kernel = config.build_rbf::<f64>().unwrap();
//! assert_eq!(kernel.input_dim(), 2);
//! assert_eq!(kernel.name(), "RBF");
//! ```

use crate::spectral::{SpectralKernel, SpectralRbf};
use crate::stationary::{Matern, MaternOrder};
use gp_core::{Element, Error, Result, Transform};
use nalgebra::DVector;
use serde::{Deserialize, Serialize};

fn default_num_basis() -> usize {
    100
}

fn default_lengthscale() -> Vec<f64> {
    vec![1.0]
}

fn default_variance() -> f64 {
    1.0
}

fn default_name() -> String {
    "RBF".to_string()
}

/// Parameters of a spectral kernel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpectralConfig {
    /// Number of sampled frequencies
    #[serde(default = "default_num_basis")]
    pub num_basis: usize,
    /// Per-dimension lengthscales; their count is the input dimension
    #[serde(default = "default_lengthscale")]
    pub lengthscale: Vec<f64>,
    #[serde(default = "default_variance")]
    pub variance: f64,
    /// Positivity transform for lengthscale and variance
    #[serde(default)]
    pub transform: Transform,
    /// Seed for the frequency draw, required
    pub seed: u64,
    #[serde(default = "default_name")]
    pub name: String,
    /// Divide frequencies by the lengthscales during Gram evaluation
    #[serde(default)]
    pub scale_frequencies: bool,
}

impl SpectralConfig {
    /// Defaults for everything except the seed
    pub fn new(seed: u64) -> Self {
        Self {
            num_basis: default_num_basis(),
            lengthscale: default_lengthscale(),
            variance: default_variance(),
            transform: Transform::default(),
            seed,
            name: default_name(),
            scale_frequencies: false,
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check sizes and positivity before any sampling happens
    pub fn validate(&self) -> Result<()> {
        if self.num_basis == 0 {
            return Err(Error::InvalidParameter("num_basis must be positive".to_string()));
        }
        if self.lengthscale.is_empty() {
            return Err(Error::InvalidParameter(
                "lengthscale must have at least one entry".to_string(),
            ));
        }
        if let Some(&bad) = self.lengthscale.iter().find(|&&l| !(l > 0.0 && l.is_finite())) {
            return Err(Error::not_positive("lengthscale", bad));
        }
        if !(self.variance > 0.0 && self.variance.is_finite()) {
            return Err(Error::not_positive("variance", self.variance));
        }
        Ok(())
    }

    /// Spectral approximation of the RBF kernel described by this config
    pub fn build_rbf<T: Element>(&self) -> Result<SpectralRbf<T, Transform>> {
        self.validate()?;
        let kernel = SpectralRbf::rbf(
            self.num_basis,
            &self.lengthscale_vector(),
            T::cast(self.variance),
            self.transform,
            self.seed,
            self.name.clone(),
        )?;
        Ok(kernel.with_scaled_frequencies(self.scale_frequencies))
    }

    /// Spectral approximation of a Matérn kernel with these parameters
    ///
    /// The configured name replaces the Matérn default only when it was changed
    /// from `"RBF"`.
    pub fn build_matern<T: Element>(
        &self,
        order: MaternOrder,
    ) -> Result<SpectralKernel<T, Matern<T, Transform>>> {
        self.validate()?;
        let base = Matern::new(
            order,
            &self.lengthscale_vector(),
            T::cast(self.variance),
            self.transform,
        )?;
        let mut kernel = SpectralKernel::with_seed(base, self.num_basis, self.seed)?
            .with_scaled_frequencies(self.scale_frequencies);
        if self.name != default_name() {
            kernel = kernel.with_name(self.name.clone());
        }
        Ok(kernel)
    }

    fn lengthscale_vector<T: Element>(&self) -> DVector<T> {
        DVector::from_iterator(
            self.lengthscale.len(),
            self.lengthscale.iter().map(|&l| T::cast(l)),
        )
    }
}
