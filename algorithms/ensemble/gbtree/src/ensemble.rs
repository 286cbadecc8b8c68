use mrc_helpers::Float;
use ndarray::{Array1, ArrayView1, ArrayView2};

use crate::{EnsembleError, NodeKind, Tree, TreeError};

/// An additive ensemble of regression trees.
///
/// The prediction for a row is `base_score + Σ weight_t · tree_t(row)`.
/// Plain gradient boosting uses a weight of one for every tree; DART models
/// carry a per-tree drop weight.
#[derive(Debug, Clone, PartialEq)]
pub struct Ensemble<F: Float> {
    trees: Vec<Tree<F>>,
    weights: Vec<F>,
    base_score: F,
    n_features: usize,
    feature_names: Option<Vec<String>>,
}

impl<F: Float> Ensemble<F> {
    /// Creates an ensemble with unit tree weights.
    ///
    /// # Errors
    ///
    /// Returns `EnsembleError::Tree` if a tree splits on a feature index
    /// outside `0..n_features`.
    pub fn new(trees: Vec<Tree<F>>, base_score: F, n_features: usize) -> Result<Self, EnsembleError> {
        for (index, tree) in trees.iter().enumerate() {
            if let Some(feature) = tree.max_feature().filter(|&f| f >= n_features) {
                let node = tree
                    .nodes()
                    .iter()
                    .position(|n| matches!(n.kind, NodeKind::Split { feature: used, .. } if used == feature))
                    .unwrap_or_default();
                return Err(EnsembleError::Tree {
                    index,
                    source: TreeError::FeatureOutOfRange {
                        node,
                        feature,
                        n_features,
                    },
                });
            }
        }
        let weights = vec![F::one(); trees.len()];
        Ok(Ensemble {
            trees,
            weights,
            base_score,
            n_features,
            feature_names: None,
        })
    }

    /// Replaces the unit tree weights.
    pub fn with_weights(mut self, weights: Vec<F>) -> Result<Self, EnsembleError> {
        if weights.len() != self.trees.len() {
            return Err(EnsembleError::WeightCount {
                expected: self.trees.len(),
                actual: weights.len(),
            });
        }
        self.weights = weights;
        Ok(self)
    }

    /// Attaches the column names the model was trained with.
    pub fn with_feature_names(mut self, names: Vec<String>) -> Result<Self, EnsembleError> {
        if names.len() != self.n_features {
            return Err(EnsembleError::FeatureNameCount {
                expected: self.n_features,
                actual: names.len(),
            });
        }
        self.feature_names = Some(names);
        Ok(self)
    }

    pub fn trees(&self) -> &[Tree<F>] {
        &self.trees
    }

    pub fn weights(&self) -> &[F] {
        &self.weights
    }

    /// Trees paired with their weights.
    pub fn weighted_trees(&self) -> impl Iterator<Item = (&Tree<F>, F)> {
        self.trees.iter().zip(self.weights.iter().copied())
    }

    pub fn base_score(&self) -> F {
        self.base_score
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn feature_names(&self) -> Option<&[String]> {
        self.feature_names.as_deref()
    }

    /// Checks that a row has exactly one value per model feature.
    pub fn check_row(&self, features: ArrayView1<F>) -> Result<(), EnsembleError> {
        if features.len() != self.n_features {
            return Err(EnsembleError::FeatureCount {
                expected: self.n_features,
                actual: features.len(),
            });
        }
        Ok(())
    }

    /// Predicts the output for one row.
    ///
    /// # Errors
    ///
    /// Returns `EnsembleError::FeatureCount` if the row length differs from
    /// the model's feature count.
    pub fn predict(&self, features: ArrayView1<F>) -> Result<F, EnsembleError> {
        self.check_row(features)?;
        let mut total = self.base_score;
        for (tree, weight) in self.weighted_trees() {
            total += weight * tree.predict(features);
        }
        Ok(total)
    }

    /// Predicts one output per row of `rows`.
    pub fn predict_rows(&self, rows: ArrayView2<F>) -> Result<Array1<F>, EnsembleError> {
        rows.rows().into_iter().map(|row| self.predict(row)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Node;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    fn stump(feature: usize, threshold: f64, left: f64, right: f64) -> Tree<f64> {
        Tree::new(vec![
            Node::split(feature, threshold, 1, 2, false, 4.0),
            Node::leaf(left, 2.0),
            Node::leaf(right, 2.0),
        ])
        .unwrap()
    }

    #[test]
    fn test_predict_sums_trees_and_base_score() {
        let ensemble = Ensemble::new(
            vec![stump(0, 1.0, -1.0, 1.0), stump(1, 5.0, 10.0, 20.0)],
            0.5,
            2,
        )
        .unwrap();
        assert_abs_diff_eq!(ensemble.predict(array![0.0, 0.0].view()).unwrap(), 9.5);
        assert_abs_diff_eq!(ensemble.predict(array![2.0, 7.0].view()).unwrap(), 21.5);
    }

    #[test]
    fn test_tree_weights_scale_outputs() {
        let ensemble = Ensemble::new(vec![stump(0, 1.0, 2.0, 4.0), stump(0, 1.0, 2.0, 4.0)], 0.0, 1)
            .unwrap()
            .with_weights(vec![0.5, 0.25])
            .unwrap();
        assert_abs_diff_eq!(ensemble.predict(array![3.0].view()).unwrap(), 3.0);
    }

    #[test]
    fn test_predict_rows() {
        let ensemble = Ensemble::new(vec![stump(0, 1.0, -1.0, 1.0)], 0.0, 1).unwrap();
        let out = ensemble.predict_rows(array![[0.0], [2.0], [1.0]].view()).unwrap();
        assert_eq!(out, array![-1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_errors() {
        let err = Ensemble::new(vec![stump(3, 1.0, 0.0, 1.0)], 0.0, 2).unwrap_err();
        assert_eq!(
            err,
            EnsembleError::Tree {
                index: 0,
                source: TreeError::FeatureOutOfRange {
                    node: 0,
                    feature: 3,
                    n_features: 2
                }
            }
        );

        let ensemble = Ensemble::new(vec![stump(0, 1.0, 0.0, 1.0)], 0.0, 2).unwrap();
        assert_eq!(
            ensemble.predict(array![1.0].view()).unwrap_err(),
            EnsembleError::FeatureCount { expected: 2, actual: 1 }
        );
        assert_eq!(
            ensemble.clone().with_weights(vec![]).unwrap_err(),
            EnsembleError::WeightCount { expected: 1, actual: 0 }
        );
        assert_eq!(
            ensemble.with_feature_names(vec!["a".into()]).unwrap_err(),
            EnsembleError::FeatureNameCount { expected: 2, actual: 1 }
        );
    }
}
