//! Gradient-boosted regression tree ensembles.
//!
//! Trees are evaluated the way XGBoost evaluates them: a row goes left when
//! its feature value is strictly below the split threshold, both rounded to
//! `f32`, and missing (`NaN`) values follow the node's default direction.

mod ensemble;
mod error;
mod tree;
pub mod xgboost;

pub use ensemble::Ensemble;
pub use error::{EnsembleError, LoadError, TreeError};
pub use tree::{Node, NodeKind, Tree};
pub use xgboost::{from_xgboost_json, load_xgboost_json};
