//! Trainable parameters and positivity transforms
//!
//! Kernel hyperparameters such as lengthscales and variances must stay
//! positive while an optimiser moves them freely. A [`Param`] therefore stores
//! an unconstrained *raw* value, which is the dynamic leaf, and maps it through
//! a [`Bijector`] whenever the constrained value is read.

use crate::{Element, Error, Flatten, LeafCursor, Result, Static};
use nalgebra::DVector;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Invertible elementwise map from the real line onto a constrained set
pub trait Bijector<T: Element>: Clone + Debug + Send + Sync {
    /// Unconstrained -> constrained
    fn forward(&self, x: T) -> T;

    /// Constrained -> unconstrained; fails outside the image of `forward`
    fn inverse(&self, y: T) -> Result<T>;

    fn name(&self) -> &'static str;
}

/// `log(1 + exp(x))`, the default positivity transform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Softplus;

impl<T: Element> Bijector<T> for Softplus {
    fn forward(&self, x: T) -> T {
        // max(x, 0) + log1p(exp(-|x|)) avoids overflow for large x
        x.max(T::zero()) + (-x.abs()).exp().ln_1p()
    }

    fn inverse(&self, y: T) -> Result<T> {
        check_positive(y, "softplus")?;
        // y + log(-expm1(-y))
        Ok(y + (-(-y).exp_m1()).ln())
    }

    fn name(&self) -> &'static str {
        "softplus"
    }
}

/// `exp(x)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Exp;

impl<T: Element> Bijector<T> for Exp {
    fn forward(&self, x: T) -> T {
        x.exp()
    }

    fn inverse(&self, y: T) -> Result<T> {
        check_positive(y, "exp")?;
        Ok(y.ln())
    }

    fn name(&self) -> &'static str {
        "exp"
    }
}

/// No constraint, for parameters that may take any finite real value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Identity;

impl<T: Element> Bijector<T> for Identity {
    fn forward(&self, x: T) -> T {
        x
    }

    fn inverse(&self, y: T) -> Result<T> {
        if !y.is_finite() {
            return Err(Error::non_finite("identity inverse input"));
        }
        Ok(y)
    }

    fn name(&self) -> &'static str {
        "identity"
    }
}

/// Runtime-selected positivity transform, as named in configuration files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transform {
    #[default]
    Softplus,
    Exp,
}

impl<T: Element> Bijector<T> for Transform {
    fn forward(&self, x: T) -> T {
        match self {
            Transform::Softplus => Softplus.forward(x),
            Transform::Exp => Exp.forward(x),
        }
    }

    fn inverse(&self, y: T) -> Result<T> {
        match self {
            Transform::Softplus => Softplus.inverse(y),
            Transform::Exp => Exp.inverse(y),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Transform::Softplus => "softplus",
            Transform::Exp => "exp",
        }
    }
}

fn check_positive<T: Element>(y: T, transform: &str) -> Result<()> {
    if !y.is_finite() {
        return Err(Error::non_finite(&format!("{transform} inverse input")));
    }
    if y <= T::zero() {
        return Err(Error::InvalidParameter(format!(
            "{transform} transform requires a positive value, got {}",
            y.into_f64()
        )));
    }
    Ok(())
}

/// Scalar trainable parameter
///
/// The raw value is the only dynamic leaf; the bijector is static.
#[derive(Debug, Clone, PartialEq)]
pub struct Param<T, B> {
    raw: T,
    bijector: Static<B>,
}

impl<T: Element, B: Bijector<T>> Param<T, B> {
    /// Create from a constrained value
    pub fn new(value: T, bijector: B) -> Result<Self> {
        let raw = bijector.inverse(value)?;
        Ok(Self {
            raw,
            bijector: Static(bijector),
        })
    }

    /// Create from an unconstrained value
    pub fn from_raw(raw: T, bijector: B) -> Self {
        Self {
            raw,
            bijector: Static(bijector),
        }
    }

    /// Constrained value
    pub fn value(&self) -> T {
        self.bijector.forward(self.raw)
    }

    /// Unconstrained value
    pub fn raw(&self) -> T {
        self.raw
    }

    pub fn bijector(&self) -> &B {
        &self.bijector
    }
}

impl<T: Element, B: Bijector<T>> Flatten<T> for Param<T, B> {
    fn flatten(&self) -> Vec<T> {
        vec![self.raw]
    }

    fn unflatten(&self, leaves: &[T]) -> Result<Self> {
        let mut cursor = LeafCursor::new(leaves);
        let raw = cursor.take_scalar()?;
        cursor.finish()?;
        Ok(Self::from_raw(raw, self.bijector.0.clone()))
    }

    fn num_leaves(&self) -> usize {
        1
    }
}

/// Vector of trainable parameters sharing one bijector, applied elementwise
#[derive(Debug, Clone, PartialEq)]
pub struct VectorParam<T: Element, B> {
    raw: DVector<T>,
    bijector: Static<B>,
}

impl<T: Element, B: Bijector<T>> VectorParam<T, B> {
    /// Create from constrained values
    pub fn new(values: &DVector<T>, bijector: B) -> Result<Self> {
        let raw = values
            .iter()
            .map(|&v| bijector.inverse(v))
            .collect::<Result<Vec<T>>>()?;
        Ok(Self {
            raw: DVector::from_vec(raw),
            bijector: Static(bijector),
        })
    }

    /// Create from unconstrained values
    pub fn from_raw(raw: DVector<T>, bijector: B) -> Self {
        Self {
            raw,
            bijector: Static(bijector),
        }
    }

    /// Constrained values
    pub fn value(&self) -> DVector<T> {
        self.raw.map(|x| self.bijector.forward(x))
    }

    pub fn raw(&self) -> &DVector<T> {
        &self.raw
    }

    pub fn len(&self) -> usize {
        self.raw.len()
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    pub fn bijector(&self) -> &B {
        &self.bijector
    }
}

impl<T: Element, B: Bijector<T>> Flatten<T> for VectorParam<T, B> {
    fn flatten(&self) -> Vec<T> {
        self.raw.iter().copied().collect()
    }

    fn unflatten(&self, leaves: &[T]) -> Result<Self> {
        let mut cursor = LeafCursor::new(leaves);
        let raw = cursor.take_vector(self.len())?;
        cursor.finish()?;
        Ok(Self::from_raw(raw, self.bijector.0.clone()))
    }

    fn num_leaves(&self) -> usize {
        self.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    #[test]
    fn test_softplus_known_values() {
        assert_relative_eq!(Softplus.forward(0.0f64), std::f64::consts::LN_2, epsilon = 1e-12);
        // large inputs do not overflow
        assert_relative_eq!(Softplus.forward(800.0f64), 800.0, epsilon = 1e-9);
        assert!(Softplus.forward(-800.0f64) >= 0.0);
    }

    #[test]
    fn test_inverse_rejects_non_positive() {
        assert!(Bijector::<f64>::inverse(&Softplus, 0.0).is_err());
        assert!(Bijector::<f64>::inverse(&Softplus, -1.0).is_err());
        assert!(Bijector::<f64>::inverse(&Exp, -0.5).is_err());
        assert!(Bijector::<f64>::inverse(&Exp, f64::NAN).is_err());
    }

    #[test]
    fn test_identity_accepts_any_finite_value() {
        let p = Param::new(-3.5f64, Identity).unwrap();
        assert_eq!(p.raw(), -3.5);
        assert_eq!(p.value(), -3.5);
        assert!(Param::new(f64::INFINITY, Identity).is_err());
    }

    #[test]
    fn test_param_value_and_raw() {
        let p = Param::new(2.0f64, Exp).unwrap();
        assert_relative_eq!(p.raw(), 2.0f64.ln(), epsilon = 1e-12);
        assert_relative_eq!(p.value(), 2.0, epsilon = 1e-12);
        assert_eq!(p.flatten(), vec![p.raw()]);
    }

    #[test]
    fn test_param_unflatten_keeps_bijector() {
        let p = Param::new(1.5f64, Transform::Exp).unwrap();
        let q = p.unflatten(&[0.0]).unwrap();
        assert_eq!(q.bijector(), &Transform::Exp);
        assert_relative_eq!(q.value(), 1.0, epsilon = 1e-12);
        assert!(p.unflatten(&[0.0, 1.0]).is_err());
    }

    #[test]
    fn test_vector_param_elementwise() {
        let values = DVector::from_vec(vec![0.5f64, 1.0, 3.0]);
        let p = VectorParam::new(&values, Softplus).unwrap();
        assert_eq!(p.len(), 3);
        assert_eq!(p.num_leaves(), 3);
        for (a, b) in p.value().iter().zip(values.iter()) {
            assert_relative_eq!(*a, *b, epsilon = 1e-10);
        }

        let bad = DVector::from_vec(vec![1.0f64, -1.0]);
        assert!(VectorParam::new(&bad, Softplus).is_err());
    }

    #[test]
    fn test_transform_serde_names() {
        let t: Transform = serde_json::from_str("\"exp\"").unwrap();
        assert_eq!(t, Transform::Exp);
        assert_eq!(serde_json::to_string(&Transform::Softplus).unwrap(), "\"softplus\"");
    }

    proptest! {
        #[test]
        fn prop_softplus_round_trip(y in 1e-3f64..50.0) {
            let x = Softplus.inverse(y).unwrap();
            prop_assert!((Softplus.forward(x) - y).abs() < 1e-9 * y.max(1.0));
        }

        #[test]
        fn prop_forward_is_positive(x in -30.0f64..30.0) {
            prop_assert!(Softplus.forward(x) > 0.0);
            prop_assert!(Bijector::<f64>::forward(&Exp, x) > 0.0);
        }
    }
}
