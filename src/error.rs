use std::path::PathBuf;

use gbtree::LoadError;
use thiserror::Error;
use tree_shap::ShapError;

use crate::model::BoxError;

/// A form entry that cannot be used as a geometry parameter.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InputError {
    #[error("Input for {label} is empty.")]
    Empty { label: &'static str },
    #[error("Input for {label} is not a number: `{text}`.")]
    NotANumber { label: &'static str, text: String },
    #[error("Input for {label} is out of range ({min}-{max}).")]
    OutOfRange {
        label: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
}

/// Mismatch between the model's columns and the inputs this crate supplies.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("model has {actual} features, expected {expected} (8 geometry parameters and rotation)")]
    FeatureCount { expected: usize, actual: usize },
    #[error("no model column matches {feature}")]
    Unmatched { feature: &'static str },
    #[error("{feature} matches several model columns: {columns:?}")]
    Ambiguous {
        feature: &'static str,
        columns: Vec<String>,
    },
    #[error("model column `{column}` matches more than one input")]
    SharedColumn { column: String },
    #[error("input row has {actual} values, expected {expected}")]
    RowLength { expected: usize, actual: usize },
}

/// Errors raised while loading the moment-rotation model.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("failed to load model from {}", path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: LoadError,
    },
    #[error(transparent)]
    Parse(#[from] LoadError),
    #[error("model columns do not match the connection inputs")]
    Layout(#[from] LayoutError),
    #[error("model cannot be explained")]
    Explain(#[from] ShapError),
}

/// A prediction request that failed as a whole.
#[derive(Debug, Error)]
pub enum SweepError {
    #[error("moment prediction failed at sample {index} (rotation {rotation})")]
    Predict {
        index: usize,
        rotation: f64,
        #[source]
        source: BoxError,
    },
    #[error("attribution failed at sample {index} (rotation {rotation})")]
    Explain {
        index: usize,
        rotation: f64,
        #[source]
        source: BoxError,
    },
    #[error("attribution at sample {index} has {actual} values, expected {expected}")]
    MalformedAttribution {
        index: usize,
        expected: usize,
        actual: usize,
    },
}
