//! Moment-rotation curve prediction for extended end-plate connections.
//!
//! A pretrained gradient-boosted model maps the eight connection parameters
//! and a rotation to a moment. [`predict_curve`] evaluates it over the fixed
//! [`ROTATION_SWEEP`]; [`average_attributions`] averages the per-sample SHAP
//! values over the same sweep to rank the parameters by their influence.

pub mod analysis;
pub mod attribution;
pub mod config;
pub mod error;
pub mod geometry;
pub mod layout;
pub mod logging;
pub mod model;
pub mod sweep;

pub use analysis::{Analysis, analyze};
pub use attribution::{AttributionMatrix, AveragedAttribution, Contribution, attribution_matrix, average_attributions};
pub use config::{Overrides, Settings};
pub use error::{InputError, LayoutError, ModelError, SweepError};
pub use geometry::{ConnectionGeometry, FEATURE_COUNT, PARAMETER_COUNT, ParameterKind};
pub use layout::{Feature, FeatureLayout};
pub use model::{BoxError, Explainer, MomentModel, Regressor};
pub use sweep::{CurvePoint, PredictionCurve, ROTATION_SAMPLES, ROTATION_STEP, ROTATION_SWEEP, predict_curve, sample_rows};
