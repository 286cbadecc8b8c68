//! The regression capabilities the sweep runs against, and the loaded
//! moment-rotation model that provides them.

use std::error::Error;
use std::path::Path;

use gbtree::{Ensemble, from_xgboost_json, load_xgboost_json};
use ndarray::{Array1, ArrayView1};
use tracing::{info, warn};
use tree_shap::TreeExplainer;

use crate::error::ModelError;
use crate::layout::FeatureLayout;

pub type BoxError = Box<dyn Error + Send + Sync>;

/// Predicts the moment (kNm) for one Sample Input Row.
pub trait Regressor {
    fn predict(&self, row: ArrayView1<f64>) -> Result<f64, BoxError>;
}

/// Attributes a prediction to the columns of a Sample Input Row.
///
/// The returned vector has one entry per input column, rotation included.
/// Positive values push the prediction up.
pub trait Explainer {
    fn explain(&self, row: ArrayView1<f64>) -> Result<Array1<f64>, BoxError>;
}

/// The pretrained gradient-boosted moment model.
///
/// Loaded once at startup and read-only afterwards. Rows are given in
/// canonical order (parameters, then rotation) and permuted into the model's
/// own column order internally.
#[derive(Debug, Clone)]
pub struct MomentModel {
    ensemble: Ensemble<f64>,
    layout: FeatureLayout,
    expected_value: f64,
}

impl MomentModel {
    /// Loads an XGBoost JSON model file.
    ///
    /// # Errors
    ///
    /// Returns `ModelError::Load` if the file cannot be read or parsed, and
    /// the errors of [`from_ensemble`](Self::from_ensemble).
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let path = path.as_ref();
        let ensemble = load_xgboost_json(path).map_err(|source| ModelError::Load {
            path: path.to_path_buf(),
            source,
        })?;
        let model = Self::from_ensemble(ensemble)?;
        info!(path = %path.display(), "model ready");
        Ok(model)
    }

    /// Parses a model from the text of an XGBoost JSON model.
    pub fn from_json(json: &str) -> Result<Self, ModelError> {
        Self::from_ensemble(from_xgboost_json(json)?)
    }

    /// Wraps an already built ensemble.
    ///
    /// # Errors
    ///
    /// Returns `ModelError::Layout` if the model's columns cannot be matched
    /// to the geometry parameters and rotation, and `ModelError::Explain` if
    /// the trees lack the cover statistics attribution needs.
    pub fn from_ensemble(ensemble: Ensemble<f64>) -> Result<Self, ModelError> {
        let names = ensemble.feature_names();
        if names.is_none() {
            warn!(
                n_features = ensemble.n_features(),
                "model declares no feature names, assuming b, d, Sv, Sh, tw, tf, tp, db, rotation"
            );
        }
        let layout = FeatureLayout::resolve(names, ensemble.n_features())?;
        let expected_value = TreeExplainer::new(&ensemble).expected_value()?;
        info!(
            trees = ensemble.trees().len(),
            features = ensemble.n_features(),
            reordered = !layout.is_canonical(),
            expected_value,
            "loaded moment-rotation model"
        );
        Ok(MomentModel {
            ensemble,
            layout,
            expected_value,
        })
    }

    pub fn ensemble(&self) -> &Ensemble<f64> {
        &self.ensemble
    }

    pub fn layout(&self) -> &FeatureLayout {
        &self.layout
    }

    /// Mean model output over the training data; attributions of a row add
    /// up to its prediction minus this value.
    pub fn expected_value(&self) -> f64 {
        self.expected_value
    }
}

impl Regressor for MomentModel {
    fn predict(&self, row: ArrayView1<f64>) -> Result<f64, BoxError> {
        let row = self.layout.to_model_order(row)?;
        Ok(self.ensemble.predict(row.view())?)
    }
}

impl Explainer for MomentModel {
    fn explain(&self, row: ArrayView1<f64>) -> Result<Array1<f64>, BoxError> {
        let row = self.layout.to_model_order(row)?;
        let values = TreeExplainer::new(&self.ensemble).shap_values(row.view())?;
        Ok(self.layout.to_canonical_order(values.view())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribution::average_attributions;
    use crate::error::LayoutError;
    use crate::geometry::{ConnectionGeometry, ParameterKind};
    use crate::sweep::predict_curve;
    use approx::assert_abs_diff_eq;
    use serde_json::{Value, json};

    fn stump(feature: usize, threshold: f64, left: (f64, f64), right: (f64, f64)) -> Value {
        json!({
            "left_children": [1, -1, -1],
            "right_children": [2, -1, -1],
            "split_indices": [feature, 0, 0],
            "split_conditions": [threshold, left.0, right.0],
            "default_left": [0, 0, 0],
            "sum_hessian": [left.1 + right.1, left.1, right.1],
            "split_type": [0, 0, 0],
            "tree_param": {"num_nodes": "3", "num_feature": "9", "size_leaf_vector": "1"}
        })
    }

    /// Nine named columns with rotation first. One tree splits on rotation
    /// at 0.05, the other on the overall width at 200 mm.
    fn model_json(names: Value) -> String {
        json!({
            "learner": {
                "feature_names": names,
                "gradient_booster": {
                    "name": "gbtree",
                    "model": {
                        "gbtree_model_param": {"num_trees": "2", "num_parallel_tree": "1"},
                        "trees": [
                            stump(0, 0.05, (100.0, 2.0), (200.0, 2.0)),
                            stump(1, 200.0, (10.0, 1.0), (30.0, 3.0))
                        ]
                    }
                },
                "learner_model_param": {
                    "base_score": "[5E-1]",
                    "num_class": "0",
                    "num_feature": "9",
                    "num_target": "1"
                },
                "objective": {"name": "reg:squarederror"}
            },
            "version": [2, 1, 0]
        })
        .to_string()
    }

    fn rotation_first() -> Value {
        json!(["rotation", "b", "d", "Sv", "Sh", "tw", "tf", "tp", "db"])
    }

    const EXAMPLE: [f64; 8] = [150.0, 200.0, 100.0, 80.0, 12.0, 12.0, 10.0, 20.0];

    #[test]
    fn test_predict_reorders_columns() {
        let model = MomentModel::from_json(&model_json(rotation_first())).unwrap();
        let geometry = ConnectionGeometry::new(EXAMPLE);
        assert_abs_diff_eq!(model.predict(geometry.sample_row(0.0).view()).unwrap(), 110.5);
        assert_abs_diff_eq!(model.predict(geometry.sample_row(0.1).view()).unwrap(), 210.5);
        assert_abs_diff_eq!(model.expected_value(), 175.5);
    }

    #[test]
    fn test_explain_returns_canonical_order() {
        let model = MomentModel::from_json(&model_json(rotation_first())).unwrap();
        let row = ConnectionGeometry::new(EXAMPLE).sample_row(0.0);
        let phi = model.explain(row.view()).unwrap();
        assert_eq!(phi.len(), 9);
        assert_abs_diff_eq!(phi[ParameterKind::Width.index()], -15.0);
        assert_abs_diff_eq!(phi[8], -50.0);
        assert_abs_diff_eq!(model.expected_value() + phi.sum(), 110.5, epsilon = 1e-9);
    }

    #[test]
    fn test_sweep_through_loaded_model() {
        let model = MomentModel::from_json(&model_json(rotation_first())).unwrap();
        let geometry = ConnectionGeometry::new(EXAMPLE);

        let curve = predict_curve(&model, &geometry).unwrap();
        assert_abs_diff_eq!(curve.first().moment, 110.5);
        assert_abs_diff_eq!(curve.last().moment, 210.5);

        let averaged = average_attributions(&model, &geometry).unwrap();
        assert_abs_diff_eq!(averaged.get(ParameterKind::Width), -15.0, epsilon = 1e-9);
        assert_abs_diff_eq!(averaged.get(ParameterKind::BoltDiameter), 0.0);
    }

    #[test]
    fn test_unnamed_model_assumes_canonical_order() {
        let model = MomentModel::from_json(&model_json(json!([]))).unwrap();
        assert!(model.layout().is_canonical());
        // column 0 is now the width, column 1 the depth
        let row = ConnectionGeometry::new(EXAMPLE).sample_row(0.0);
        assert_abs_diff_eq!(model.predict(row.view()).unwrap(), 200.0 + 30.0 + 0.5);
    }

    #[test]
    fn test_layout_errors_fail_loading() {
        let names = json!(["rotation", "b", "d", "Sv", "Sh", "tw", "tf", "tp", "bolt"]);
        let err = MomentModel::from_json(&model_json(names)).unwrap_err();
        assert!(matches!(
            err,
            ModelError::Layout(LayoutError::Unmatched {
                feature: "Bolt diameter (db)"
            })
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let err = MomentModel::load("does/not/exist/XGB_Model.json").unwrap_err();
        assert!(matches!(err, ModelError::Load { .. }));
        assert!(err.to_string().contains("does/not/exist/XGB_Model.json"));

        let chain = format!("{:#}", anyhow::Error::new(err));
        assert_eq!(chain.matches("could not read model file").count(), 1);
        assert_eq!(chain.matches("os error").count(), 1);
    }

    #[test]
    fn test_wrong_row_length_is_an_error() {
        let model = MomentModel::from_json(&model_json(rotation_first())).unwrap();
        assert!(model.predict(ndarray::array![1.0, 2.0].view()).is_err());
        assert!(model.explain(ndarray::array![1.0].view()).is_err());
    }
}
