//! Exact SHAP values for tree ensembles.
//!
//! Implements the path-dependent TreeSHAP algorithm of Lundberg et al.: the
//! contribution of a feature is its Shapley value for the game whose value on
//! a feature subset `S` is the tree output with features outside `S`
//! integrated out along the training cover of each branch. Runs in
//! `O(T · L · D²)` for `T` trees with `L` leaves and depth `D`.

mod path;

use gbtree::{Ensemble, EnsembleError, NodeKind, Tree};
use mrc_helpers::Float;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use thiserror::Error;

use crate::path::{PathElement, extend, unwind, unwound_sum};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShapError {
    #[error(transparent)]
    Ensemble(#[from] EnsembleError),
    #[error("tree {tree}, node {node}: split node has no cover")]
    DegenerateCover { tree: usize, node: usize },
}

/// Computes SHAP values for rows evaluated by an [`Ensemble`].
#[derive(Debug, Clone, Copy)]
pub struct TreeExplainer<'a, F: Float> {
    ensemble: &'a Ensemble<F>,
}

impl<'a, F: Float> TreeExplainer<'a, F> {
    pub fn new(ensemble: &'a Ensemble<F>) -> Self {
        TreeExplainer { ensemble }
    }

    pub fn ensemble(&self) -> &'a Ensemble<F> {
        self.ensemble
    }

    /// The model output when no feature is known: the base score plus the
    /// cover-weighted mean leaf value of every tree.
    ///
    /// # Errors
    ///
    /// Returns `ShapError::DegenerateCover` if a reachable split node has a
    /// non-positive cover.
    pub fn expected_value(&self) -> Result<F, ShapError> {
        let mut total = self.ensemble.base_score();
        for (index, (tree, weight)) in self.ensemble.weighted_trees().enumerate() {
            total += weight * subtree_mean(tree, index, 0)?;
        }
        Ok(total)
    }

    /// SHAP values of one row, one per model feature.
    ///
    /// The values add up to the prediction minus [`expected_value`](Self::expected_value).
    ///
    /// # Errors
    ///
    /// Returns `ShapError::Ensemble` if the row has the wrong length and
    /// `ShapError::DegenerateCover` for split nodes without cover.
    pub fn shap_values(&self, features: ArrayView1<F>) -> Result<Array1<F>, ShapError> {
        self.ensemble.check_row(features)?;
        let mut phi = Array1::zeros(self.ensemble.n_features());
        for (index, (tree, weight)) in self.ensemble.weighted_trees().enumerate() {
            let walk = Walk {
                tree,
                tree_index: index,
                weight,
                features,
            };
            let path = Vec::with_capacity(tree.depth() + 2);
            walk.visit(&mut phi, 0, path, F::one(), F::one(), None)?;
        }
        Ok(phi)
    }

    /// SHAP values for every row of `rows`, one row of values per input row.
    pub fn shap_values_batch(&self, rows: ArrayView2<F>) -> Result<Array2<F>, ShapError> {
        let mut out = Array2::zeros((rows.nrows(), self.ensemble.n_features()));
        for (row, mut target) in rows.rows().into_iter().zip(out.rows_mut()) {
            target.assign(&self.shap_values(row)?);
        }
        Ok(out)
    }
}

fn subtree_mean<F: Float>(tree: &Tree<F>, tree_index: usize, node: usize) -> Result<F, ShapError> {
    let current = tree.node(node);
    match current.kind {
        NodeKind::Leaf { value } => Ok(value),
        NodeKind::Split { left, right, .. } => {
            if !(current.cover > F::zero()) {
                return Err(ShapError::DegenerateCover {
                    tree: tree_index,
                    node,
                });
            }
            let left_part = tree.node(left).cover * subtree_mean(tree, tree_index, left)?;
            let right_part = tree.node(right).cover * subtree_mean(tree, tree_index, right)?;
            Ok((left_part + right_part) / current.cover)
        }
    }
}

/// State shared by one recursive walk over a single tree.
struct Walk<'t, 'x, F: Float> {
    tree: &'t Tree<F>,
    tree_index: usize,
    weight: F,
    features: ArrayView1<'x, F>,
}

impl<F: Float> Walk<'_, '_, F> {
    fn visit(
        &self,
        phi: &mut Array1<F>,
        node: usize,
        mut path: Vec<PathElement<F>>,
        zero_fraction: F,
        one_fraction: F,
        feature: Option<usize>,
    ) -> Result<(), ShapError> {
        extend(&mut path, zero_fraction, one_fraction, feature);
        let current = self.tree.node(node);

        match current.kind {
            NodeKind::Leaf { value } => {
                let scaled = value * self.weight;
                for i in 1..path.len() {
                    let element = path[i];
                    if let Some(f) = element.feature {
                        let w = unwound_sum(&path, i);
                        phi[f] += w * (element.one_fraction - element.zero_fraction) * scaled;
                    }
                }
                Ok(())
            }
            NodeKind::Split {
                feature: split,
                left,
                right,
                ..
            } => {
                if !(current.cover > F::zero()) {
                    return Err(ShapError::DegenerateCover {
                        tree: self.tree_index,
                        node,
                    });
                }
                let hot = self.tree.next_node(node, self.features).unwrap_or(left);
                let cold = if hot == left { right } else { left };
                let hot_zero = self.tree.node(hot).cover / current.cover;
                let cold_zero = self.tree.node(cold).cover / current.cover;

                // a feature split on twice along the path keeps a single entry
                let mut incoming_zero = F::one();
                let mut incoming_one = F::one();
                if let Some(k) = path.iter().position(|e| e.feature == Some(split)) {
                    incoming_zero = path[k].zero_fraction;
                    incoming_one = path[k].one_fraction;
                    unwind(&mut path, k);
                }

                self.visit(
                    phi,
                    hot,
                    path.clone(),
                    hot_zero * incoming_zero,
                    incoming_one,
                    Some(split),
                )?;
                self.visit(
                    phi,
                    cold,
                    path,
                    cold_zero * incoming_zero,
                    F::zero(),
                    Some(split),
                )
            }
        }
    }
}
