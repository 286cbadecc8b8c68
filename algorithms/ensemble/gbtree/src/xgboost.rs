//! Reader for models saved with XGBoost's `save_model("*.json")`.
//!
//! Only the parts needed for inference are read. Numeric model parameters
//! are stored by XGBoost as strings (`"num_feature": "9"`), and recent
//! versions write `base_score` as a one-element list (`"[5E-1]"`).

use std::fs;
use std::path::Path;
use std::str::FromStr;

use mrc_helpers::Float;
use serde::Deserialize;
use tracing::debug;

use crate::{Ensemble, LoadError, Node, Tree};

/// Objectives whose prediction is the raw sum of tree outputs.
const IDENTITY_OBJECTIVES: [&str; 6] = [
    "reg:squarederror",
    "reg:squaredlogerror",
    "reg:pseudohubererror",
    "reg:absoluteerror",
    "reg:quantileerror",
    "reg:linear",
];

#[derive(Debug, Deserialize)]
struct ModelFile {
    learner: Learner,
    #[serde(default)]
    version: Vec<u32>,
}

#[derive(Debug, Deserialize)]
struct Learner {
    #[serde(default)]
    feature_names: Vec<String>,
    gradient_booster: Booster,
    learner_model_param: LearnerModelParam,
    objective: Objective,
}

#[derive(Debug, Deserialize)]
struct LearnerModelParam {
    base_score: String,
    #[serde(default)]
    num_class: Option<String>,
    num_feature: String,
    #[serde(default)]
    num_target: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Objective {
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "name")]
enum Booster {
    #[serde(rename = "gbtree")]
    GbTree { model: GbTreeModel },
    #[serde(rename = "dart")]
    Dart {
        gbtree: GbTreeBooster,
        weight_drop: Vec<f64>,
    },
    #[serde(rename = "gblinear")]
    GbLinear {},
}

#[derive(Debug, Deserialize)]
struct GbTreeBooster {
    model: GbTreeModel,
}

#[derive(Debug, Deserialize)]
struct GbTreeModel {
    gbtree_model_param: GbTreeModelParam,
    trees: Vec<TreeRecord>,
}

#[derive(Debug, Deserialize)]
struct GbTreeModelParam {
    num_trees: String,
}

#[derive(Debug, Deserialize)]
struct TreeRecord {
    left_children: Vec<i64>,
    right_children: Vec<i64>,
    split_indices: Vec<i64>,
    split_conditions: Vec<f64>,
    default_left: Vec<Flag>,
    sum_hessian: Vec<f64>,
    #[serde(default)]
    split_type: Vec<i64>,
    tree_param: TreeParam,
}

#[derive(Debug, Deserialize)]
struct TreeParam {
    num_nodes: String,
}

/// XGBoost has written `default_left` both as `0`/`1` and as booleans.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(untagged)]
enum Flag {
    Bool(bool),
    Int(i64),
}

impl Flag {
    fn is_set(self) -> bool {
        match self {
            Flag::Bool(b) => b,
            Flag::Int(i) => i != 0,
        }
    }
}

/// Loads an ensemble from an XGBoost JSON model file.
pub fn load_xgboost_json<F: Float>(path: impl AsRef<Path>) -> Result<Ensemble<F>, LoadError> {
    let text = fs::read_to_string(path.as_ref())?;
    from_xgboost_json(&text)
}

/// Parses an ensemble from the text of an XGBoost JSON model.
///
/// # Errors
///
/// Fails on malformed JSON, on boosters other than `gbtree` and `dart`, on
/// objectives that transform the raw output, on multi-output models, on
/// categorical splits and on structurally invalid trees.
pub fn from_xgboost_json<F: Float>(json: &str) -> Result<Ensemble<F>, LoadError> {
    let file: ModelFile = serde_json::from_str(json)?;
    let learner = file.learner;

    if !IDENTITY_OBJECTIVES.contains(&learner.objective.name.as_str()) {
        return Err(LoadError::UnsupportedObjective(learner.objective.name));
    }

    let params = &learner.learner_model_param;
    let num_class: usize = match &params.num_class {
        Some(value) => parse_field("num_class", value)?,
        None => 0,
    };
    let num_target: usize = match &params.num_target {
        Some(value) => parse_field("num_target", value)?,
        None => 1,
    };
    if num_class > 1 || num_target != 1 {
        return Err(LoadError::MultiOutput {
            num_class,
            num_target,
        });
    }
    let n_features: usize = parse_field("num_feature", &params.num_feature)?;
    let base_score: F = to_float("base_score", parse_base_score(&params.base_score)?)?;

    let (model, weight_drop) = match learner.gradient_booster {
        Booster::GbTree { model } => (model, None),
        Booster::Dart {
            gbtree,
            weight_drop,
        } => (gbtree.model, Some(weight_drop)),
        Booster::GbLinear {} => return Err(LoadError::UnsupportedBooster("gblinear".into())),
    };

    let declared: usize = parse_field("num_trees", &model.gbtree_model_param.num_trees)?;
    if declared != model.trees.len() {
        return Err(LoadError::TreeCount {
            declared,
            actual: model.trees.len(),
        });
    }

    let trees = model
        .trees
        .iter()
        .enumerate()
        .map(|(index, record)| convert_tree(index, record))
        .collect::<Result<Vec<Tree<F>>, LoadError>>()?;

    debug!(
        version = ?file.version,
        objective = %learner.objective.name,
        trees = trees.len(),
        n_features,
        "parsed XGBoost model"
    );

    let mut ensemble = Ensemble::new(trees, base_score, n_features)?;
    if let Some(weights) = weight_drop {
        let weights = weights
            .into_iter()
            .map(|w| to_float("weight_drop", w))
            .collect::<Result<Vec<F>, LoadError>>()?;
        ensemble = ensemble.with_weights(weights)?;
    }
    if !learner.feature_names.is_empty() {
        ensemble = ensemble.with_feature_names(learner.feature_names)?;
    }
    Ok(ensemble)
}

fn convert_tree<F: Float>(index: usize, record: &TreeRecord) -> Result<Tree<F>, LoadError> {
    let n_nodes: usize = parse_field("num_nodes", &record.tree_param.num_nodes)?;

    let check = |field: &'static str, actual: usize| {
        if actual == n_nodes {
            Ok(())
        } else {
            Err(LoadError::ArrayLength {
                tree: index,
                field,
                expected: n_nodes,
                actual,
            })
        }
    };
    check("left_children", record.left_children.len())?;
    check("right_children", record.right_children.len())?;
    check("split_indices", record.split_indices.len())?;
    check("split_conditions", record.split_conditions.len())?;
    check("default_left", record.default_left.len())?;
    check("sum_hessian", record.sum_hessian.len())?;

    if record.split_type.iter().any(|&t| t != 0) {
        return Err(LoadError::CategoricalSplit { tree: index });
    }

    let mut nodes = Vec::with_capacity(n_nodes);
    for i in 0..n_nodes {
        let cover = to_float("sum_hessian", record.sum_hessian[i])?;
        // leaves store their output in `split_conditions`
        let value = to_float("split_conditions", record.split_conditions[i])?;
        if record.left_children[i] == -1 {
            nodes.push(Node::leaf(value, cover));
        } else {
            nodes.push(Node::split(
                to_index("split_indices", record.split_indices[i])?,
                value,
                to_index("left_children", record.left_children[i])?,
                to_index("right_children", record.right_children[i])?,
                record.default_left[i].is_set(),
                cover,
            ));
        }
    }
    Tree::new(nodes).map_err(|source| LoadError::Tree {
        tree: index,
        source,
    })
}

fn parse_field<T: FromStr>(field: &'static str, value: &str) -> Result<T, LoadError> {
    value.trim().parse().map_err(|_| LoadError::Field {
        field,
        value: value.to_string(),
    })
}

fn parse_base_score(value: &str) -> Result<f64, LoadError> {
    let inner = value.trim().trim_start_matches('[').trim_end_matches(']');
    parse_field::<f64>("base_score", inner).map_err(|_| LoadError::Field {
        field: "base_score",
        value: value.to_string(),
    })
}

fn to_float<F: Float>(field: &'static str, value: f64) -> Result<F, LoadError> {
    F::from_f64(value).ok_or_else(|| LoadError::Field {
        field,
        value: value.to_string(),
    })
}

fn to_index(field: &'static str, value: i64) -> Result<usize, LoadError> {
    usize::try_from(value).map_err(|_| LoadError::Field {
        field,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EnsembleError;
    use approx::assert_abs_diff_eq;
    use ndarray::array;
    use serde_json::{json, Value};

    /// Two trees over two features, written the way XGBoost 2.x saves them.
    fn model_json() -> Value {
        json!({
            "learner": {
                "attributes": {},
                "feature_names": ["a", "b"],
                "feature_types": ["float", "float"],
                "gradient_booster": {
                    "model": {
                        "gbtree_model_param": {"num_parallel_tree": "1", "num_trees": "2"},
                        "iteration_indptr": [0, 1, 2],
                        "tree_info": [0, 0],
                        "trees": [
                            {
                                "base_weights": [0.0, -1.0, 1.0],
                                "categories": [],
                                "categories_nodes": [],
                                "categories_segments": [],
                                "categories_sizes": [],
                                "default_left": [1, 0, 0],
                                "id": 0,
                                "left_children": [1, -1, -1],
                                "loss_changes": [3.0, 0.0, 0.0],
                                "parents": [2147483647, 0, 0],
                                "right_children": [2, -1, -1],
                                "split_conditions": [0.5, -1.0, 1.0],
                                "split_indices": [0, 0, 0],
                                "split_type": [0, 0, 0],
                                "sum_hessian": [4.0, 1.0, 3.0],
                                "tree_param": {"num_deleted": "0", "num_feature": "2", "num_nodes": "3", "size_leaf_vector": "1"}
                            },
                            {
                                "base_weights": [0.0, 2.0, 4.0],
                                "default_left": [false, false, false],
                                "id": 1,
                                "left_children": [1, -1, -1],
                                "loss_changes": [1.0, 0.0, 0.0],
                                "parents": [2147483647, 0, 0],
                                "right_children": [2, -1, -1],
                                "split_conditions": [10.0, 2.0, 4.0],
                                "split_indices": [1, 0, 0],
                                "sum_hessian": [4.0, 2.0, 2.0],
                                "tree_param": {"num_deleted": "0", "num_feature": "2", "num_nodes": "3", "size_leaf_vector": "1"}
                            }
                        ]
                    },
                    "name": "gbtree"
                },
                "learner_model_param": {
                    "base_score": "[5E-1]",
                    "boost_from_average": "1",
                    "num_class": "0",
                    "num_feature": "2",
                    "num_target": "1"
                },
                "objective": {"name": "reg:squarederror", "reg_loss_param": {"scale_pos_weight": "1"}}
            },
            "version": [2, 0, 3]
        })
    }

    #[test]
    fn test_load_gbtree_model() {
        let ensemble: Ensemble<f64> = from_xgboost_json(&model_json().to_string()).unwrap();
        assert_eq!(ensemble.trees().len(), 2);
        assert_eq!(ensemble.n_features(), 2);
        assert_eq!(ensemble.feature_names().unwrap(), ["a".to_string(), "b".to_string()]);
        assert_abs_diff_eq!(ensemble.base_score(), 0.5);
        assert_abs_diff_eq!(ensemble.predict(array![0.0, 0.0].view()).unwrap(), 1.5);
        assert_abs_diff_eq!(ensemble.predict(array![1.0, 20.0].view()).unwrap(), 5.5);
        // root of the first tree sends missing values left
        assert_abs_diff_eq!(ensemble.predict(array![f64::NAN, 0.0].view()).unwrap(), 1.5);
        assert_eq!(ensemble.trees()[0].node(2).cover, 3.0);
    }

    #[test]
    fn test_load_legacy_scalar_base_score_without_names() {
        let mut model = model_json();
        model["learner"]["learner_model_param"]["base_score"] = json!("2.5E0");
        model["learner"]["feature_names"] = json!([]);
        let ensemble: Ensemble<f32> = from_xgboost_json(&model.to_string()).unwrap();
        assert_eq!(ensemble.base_score(), 2.5);
        assert!(ensemble.feature_names().is_none());
    }

    #[test]
    fn test_load_dart_model_applies_weight_drop() {
        let plain = model_json();
        let dart = json!({
            "learner": {
                "feature_names": [],
                "gradient_booster": {
                    "name": "dart",
                    "gbtree": plain["learner"]["gradient_booster"].clone(),
                    "weight_drop": [0.5, 2.0]
                },
                "learner_model_param": plain["learner"]["learner_model_param"].clone(),
                "objective": {"name": "reg:squarederror"}
            },
            "version": [1, 7, 6]
        });
        let ensemble: Ensemble<f64> = from_xgboost_json(&dart.to_string()).unwrap();
        // 0.5 + 0.5 * -1 + 2.0 * 2
        assert_abs_diff_eq!(ensemble.predict(array![0.0, 0.0].view()).unwrap(), 4.0);
    }

    #[test]
    fn test_rejects_unsupported_models() {
        let mut logistic = model_json();
        logistic["learner"]["objective"]["name"] = json!("binary:logistic");
        assert!(matches!(
            from_xgboost_json::<f64>(&logistic.to_string()),
            Err(LoadError::UnsupportedObjective(name)) if name == "binary:logistic"
        ));

        let mut multi = model_json();
        multi["learner"]["learner_model_param"]["num_target"] = json!("3");
        assert!(matches!(
            from_xgboost_json::<f64>(&multi.to_string()),
            Err(LoadError::MultiOutput { num_class: 0, num_target: 3 })
        ));

        let mut linear = model_json();
        linear["learner"]["gradient_booster"] = json!({"name": "gblinear", "model": {"weights": [0.1]}});
        assert!(matches!(
            from_xgboost_json::<f64>(&linear.to_string()),
            Err(LoadError::UnsupportedBooster(name)) if name == "gblinear"
        ));

        let mut categorical = model_json();
        categorical["learner"]["gradient_booster"]["model"]["trees"][0]["split_type"] = json!([1, 0, 0]);
        assert!(matches!(
            from_xgboost_json::<f64>(&categorical.to_string()),
            Err(LoadError::CategoricalSplit { tree: 0 })
        ));
    }

    #[test]
    fn test_rejects_malformed_models() {
        assert!(matches!(from_xgboost_json::<f64>("{"), Err(LoadError::Json(_))));

        let mut short = model_json();
        short["learner"]["gradient_booster"]["model"]["trees"][1]["sum_hessian"] = json!([4.0, 2.0]);
        assert!(matches!(
            from_xgboost_json::<f64>(&short.to_string()),
            Err(LoadError::ArrayLength { tree: 1, field: "sum_hessian", expected: 3, actual: 2 })
        ));

        let mut count = model_json();
        count["learner"]["gradient_booster"]["model"]["gbtree_model_param"]["num_trees"] = json!("5");
        assert!(matches!(
            from_xgboost_json::<f64>(&count.to_string()),
            Err(LoadError::TreeCount { declared: 5, actual: 2 })
        ));

        let mut feature = model_json();
        feature["learner"]["gradient_booster"]["model"]["trees"][1]["split_indices"] = json!([7, 0, 0]);
        assert!(matches!(
            from_xgboost_json::<f64>(&feature.to_string()),
            Err(LoadError::Ensemble(EnsembleError::Tree { index: 1, .. }))
        ));

        let mut base = model_json();
        base["learner"]["learner_model_param"]["base_score"] = json!("[abc]");
        assert!(matches!(
            from_xgboost_json::<f64>(&base.to_string()),
            Err(LoadError::Field { field: "base_score", .. })
        ));
    }
}
