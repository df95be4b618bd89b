//! Element types for operators and kernels
//!
//! This module ties the compile-time element type of a matrix to the runtime
//! [`DType`] tag that operators report. The tag is static metadata: it is never
//! flattened or differentiated.

use bytemuck::Pod;
use nalgebra::RealField;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug};

/// Runtime tag for the element type of an operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DType {
    F32,
    F64,
}

impl DType {
    /// Size of one element in bytes
    pub fn size_of(self) -> usize {
        match self {
            DType::F32 => 4,
            DType::F64 => 8,
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DType::F32 => write!(f, "float32"),
            DType::F64 => write!(f, "float64"),
        }
    }
}

/// Floating point element usable in operators and kernels
///
/// Implemented for `f32` and `f64`. The bound on [`RealField`] gives access to
/// nalgebra's dense linear algebra; [`Pod`] keeps the element plain data.
pub trait Element: RealField + Copy + Pod + Debug + Send + Sync {
    /// Runtime tag for this element type
    const DTYPE: DType;

    /// Lossy conversion from `f64`, used for literals and sampled values
    fn cast(value: f64) -> Self;

    /// Widening conversion to `f64`, used for validation messages
    fn into_f64(self) -> f64;
}

impl Element for f64 {
    const DTYPE: DType = DType::F64;

    fn cast(value: f64) -> Self {
        value
    }

    fn into_f64(self) -> f64 {
        self
    }
}

impl Element for f32 {
    const DTYPE: DType = DType::F32;

    fn cast(value: f64) -> Self {
        value as f32
    }

    fn into_f64(self) -> f64 {
        self as f64
    }
}
