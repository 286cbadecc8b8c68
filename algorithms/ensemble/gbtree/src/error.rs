use thiserror::Error;

/// Structural problems in a single regression tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("a tree must have at least one node")]
    Empty,
    #[error("node {node} points to child {child}, which does not exist")]
    ChildOutOfRange { node: usize, child: usize },
    #[error("node {node} points to node {child}; children must come after their parent")]
    NotTopological { node: usize, child: usize },
    #[error("node {node} splits on feature {feature}, but the model has {n_features} features")]
    FeatureOutOfRange {
        node: usize,
        feature: usize,
        n_features: usize,
    },
}

/// Errors raised when assembling or evaluating an [`Ensemble`](crate::Ensemble).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnsembleError {
    #[error("tree {index} is invalid")]
    Tree {
        index: usize,
        #[source]
        source: TreeError,
    },
    #[error("expected {expected} tree weights, got {actual}")]
    WeightCount { expected: usize, actual: usize },
    #[error("expected {expected} feature names, got {actual}")]
    FeatureNameCount { expected: usize, actual: usize },
    #[error("row has {actual} features, the model expects {expected}")]
    FeatureCount { expected: usize, actual: usize },
}

/// Errors raised while reading an XGBoost JSON model.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("could not read model file")]
    Io(#[from] std::io::Error),
    #[error("model file is not valid XGBoost JSON")]
    Json(#[from] serde_json::Error),
    #[error("field `{field}` has unusable value `{value}`")]
    Field { field: &'static str, value: String },
    #[error("booster `{0}` is not a tree booster")]
    UnsupportedBooster(String),
    #[error("objective `{0}` does not produce raw regression outputs")]
    UnsupportedObjective(String),
    #[error("model has {num_class} classes and {num_target} targets; a single regression output is required")]
    MultiOutput { num_class: usize, num_target: usize },
    #[error("tree {tree} uses categorical splits, which are not supported")]
    CategoricalSplit { tree: usize },
    #[error("tree {tree}: `{field}` has {actual} entries, expected {expected}")]
    ArrayLength {
        tree: usize,
        field: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("model declares {declared} trees but contains {actual}")]
    TreeCount { declared: usize, actual: usize },
    #[error("tree {tree} is invalid")]
    Tree {
        tree: usize,
        #[source]
        source: TreeError,
    },
    #[error(transparent)]
    Ensemble(#[from] EnsembleError),
}
