use ndarray::{NdFloat, ScalarOperand};
use num_traits::FromPrimitive;

use std::iter::Sum;

/// Scalar type shared by the tree ensemble, the explainer and the sweep.
pub trait Float: NdFloat + FromPrimitive + Default + Sum + ScalarOperand + std::marker::Unpin {}

impl Float for f32 {}

impl Float for f64 {}
