use mrc_helpers::Float;
use ndarray::ArrayView1;

use crate::TreeError;

/// What a node does with an incoming row.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind<F: Float> {
    /// Terminal node contributing `value` to the prediction.
    Leaf { value: F },
    /// Rows with `x[feature] < threshold` go to `left`, the rest to `right`.
    /// Both sides are compared in single precision, as XGBoost stores them.
    /// Missing values go left when `default_left` is set.
    Split {
        feature: usize,
        threshold: F,
        left: usize,
        right: usize,
        default_left: bool,
    },
}

/// A tree node together with its cover (the training hessian mass that
/// reached it).
#[derive(Debug, Clone, PartialEq)]
pub struct Node<F: Float> {
    pub kind: NodeKind<F>,
    pub cover: F,
}

impl<F: Float> Node<F> {
    pub fn leaf(value: F, cover: F) -> Self {
        Node {
            kind: NodeKind::Leaf { value },
            cover,
        }
    }

    pub fn split(
        feature: usize,
        threshold: F,
        left: usize,
        right: usize,
        default_left: bool,
        cover: F,
    ) -> Self {
        Node {
            kind: NodeKind::Split {
                feature,
                threshold,
                left,
                right,
                default_left,
            },
            cover,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Leaf { .. })
    }
}

/// A single regression tree stored as a flat node array rooted at index 0.
#[derive(Debug, Clone, PartialEq)]
pub struct Tree<F: Float> {
    nodes: Vec<Node<F>>,
}

impl<F: Float> Tree<F> {
    /// Builds a tree from its node array.
    ///
    /// Every child index must exist and be greater than its parent's index,
    /// which rules out cycles.
    ///
    /// # Errors
    ///
    /// Returns `TreeError::Empty` for an empty node array,
    /// `TreeError::ChildOutOfRange` for dangling children and
    /// `TreeError::NotTopological` for children placed before their parent.
    pub fn new(nodes: Vec<Node<F>>) -> Result<Self, TreeError> {
        if nodes.is_empty() {
            return Err(TreeError::Empty);
        }
        for (index, node) in nodes.iter().enumerate() {
            if let NodeKind::Split { left, right, .. } = node.kind {
                for child in [left, right] {
                    if child >= nodes.len() {
                        return Err(TreeError::ChildOutOfRange { node: index, child });
                    }
                    if child <= index {
                        return Err(TreeError::NotTopological { node: index, child });
                    }
                }
            }
        }
        Ok(Tree { nodes })
    }

    pub fn nodes(&self) -> &[Node<F>] {
        &self.nodes
    }

    pub fn node(&self, index: usize) -> &Node<F> {
        &self.nodes[index]
    }

    /// Largest feature index used by any split, `None` for a single-leaf tree.
    pub fn max_feature(&self) -> Option<usize> {
        self.nodes
            .iter()
            .filter_map(|node| match node.kind {
                NodeKind::Split { feature, .. } => Some(feature),
                NodeKind::Leaf { .. } => None,
            })
            .max()
    }

    /// The child of node `index` that `features` descends into, or `None`
    /// when the node is a leaf.
    ///
    /// A feature index past the end of `features` is treated as missing.
    pub fn next_node(&self, index: usize, features: ArrayView1<F>) -> Option<usize> {
        match self.nodes[index].kind {
            NodeKind::Leaf { .. } => None,
            NodeKind::Split {
                feature,
                threshold,
                left,
                right,
                default_left,
            } => {
                let value = features.get(feature).copied().unwrap_or_else(F::nan);
                let go_left = if value.is_nan() {
                    default_left
                } else {
                    goes_left(value, threshold)
                };
                Some(if go_left { left } else { right })
            }
        }
    }

    /// Index of the leaf `features` ends up in.
    pub fn leaf_index(&self, features: ArrayView1<F>) -> usize {
        let mut index = 0;
        while let Some(next) = self.next_node(index, features) {
            index = next;
        }
        index
    }

    /// Raw output of this tree for one row.
    pub fn predict(&self, features: ArrayView1<F>) -> F {
        match self.nodes[self.leaf_index(features)].kind {
            NodeKind::Leaf { value } => value,
            // leaf_index only stops on leaves
            NodeKind::Split { .. } => F::nan(),
        }
    }

    /// Number of edges on the longest root-to-leaf path.
    pub fn depth(&self) -> usize {
        let mut depths = vec![0usize; self.nodes.len()];
        let mut deepest = 0;
        for (index, node) in self.nodes.iter().enumerate() {
            if let NodeKind::Split { left, right, .. } = node.kind {
                let child_depth = depths[index] + 1;
                depths[left] = depths[left].max(child_depth);
                depths[right] = depths[right].max(child_depth);
                deepest = deepest.max(child_depth);
            }
        }
        deepest
    }
}

fn goes_left<F: Float>(value: F, threshold: F) -> bool {
    match (value.to_f32(), threshold.to_f32()) {
        (Some(value), Some(threshold)) => value < threshold,
        _ => value < threshold,
    }
}
