//! Mapping between the crate's input order and the model's column order.

use ndarray::{Array1, ArrayView1};

use crate::error::LayoutError;
use crate::geometry::{FEATURE_COUNT, PARAMETER_COUNT, ParameterKind};

/// One column of a Sample Input Row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    Parameter(ParameterKind),
    Rotation,
}

impl Feature {
    /// Canonical input order: the eight parameters, then the rotation.
    pub const ALL: [Feature; FEATURE_COUNT] = [
        Feature::Parameter(ParameterKind::Width),
        Feature::Parameter(ParameterKind::Depth),
        Feature::Parameter(ParameterKind::BoltVerticalSpacing),
        Feature::Parameter(ParameterKind::BoltHorizontalSpacing),
        Feature::Parameter(ParameterKind::WebThickness),
        Feature::Parameter(ParameterKind::FlangeThickness),
        Feature::Parameter(ParameterKind::EndplateThickness),
        Feature::Parameter(ParameterKind::BoltDiameter),
        Feature::Rotation,
    ];

    pub fn index(self) -> usize {
        match self {
            Feature::Parameter(kind) => kind.index(),
            Feature::Rotation => PARAMETER_COUNT,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Feature::Parameter(kind) => kind.label(),
            Feature::Rotation => "Rotation (rad)",
        }
    }

    /// Column names accepted for this feature, before normalisation.
    fn aliases(self) -> Vec<&'static str> {
        match self {
            Feature::Parameter(kind) => vec![kind.symbol(), kind.label(), kind.key()],
            Feature::Rotation => vec!["rotation", "rot", "theta", "phi", "Rotation (rad)"],
        }
    }

    /// Whether a model column name refers to this feature.
    pub fn matches(self, column: &str) -> bool {
        let column = normalize(column);
        self.aliases().into_iter().any(|alias| normalize(alias) == column)
    }
}

/// Lowercases `name` and strips spaces, underscores, hyphens and parentheses.
pub fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, ' ' | '_' | '-' | '(' | ')'))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Position of every canonical feature among the model's columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureLayout {
    columns: [usize; FEATURE_COUNT],
}

impl Default for FeatureLayout {
    fn default() -> Self {
        Self::canonical()
    }
}

impl FeatureLayout {
    /// The identity layout: model columns are in canonical order.
    pub fn canonical() -> Self {
        let mut columns = [0; FEATURE_COUNT];
        for (i, column) in columns.iter_mut().enumerate() {
            *column = i;
        }
        FeatureLayout { columns }
    }

    /// Resolves the layout of a model with `n_features` columns, optionally
    /// named.
    ///
    /// Without names the canonical order is assumed. With names, every
    /// feature must match exactly one column and no column may serve two
    /// features.
    ///
    /// # Errors
    ///
    /// Returns a `LayoutError` describing the first mismatch found.
    pub fn resolve(names: Option<&[String]>, n_features: usize) -> Result<Self, LayoutError> {
        if n_features != FEATURE_COUNT {
            return Err(LayoutError::FeatureCount {
                expected: FEATURE_COUNT,
                actual: n_features,
            });
        }
        let Some(names) = names else {
            return Ok(Self::canonical());
        };
        if names.len() != n_features {
            return Err(LayoutError::FeatureCount {
                expected: FEATURE_COUNT,
                actual: names.len(),
            });
        }

        let mut columns = [0; FEATURE_COUNT];
        let mut taken = [false; FEATURE_COUNT];
        for feature in Feature::ALL {
            let matched: Vec<usize> = names
                .iter()
                .enumerate()
                .filter(|(_, name)| feature.matches(name))
                .map(|(column, _)| column)
                .collect();
            let column = match matched.as_slice() {
                [] => {
                    return Err(LayoutError::Unmatched {
                        feature: feature.label(),
                    });
                }
                [column] => *column,
                _ => {
                    return Err(LayoutError::Ambiguous {
                        feature: feature.label(),
                        columns: matched.iter().map(|&c| names[c].clone()).collect(),
                    });
                }
            };
            if taken[column] {
                return Err(LayoutError::SharedColumn {
                    column: names[column].clone(),
                });
            }
            taken[column] = true;
            columns[feature.index()] = column;
        }
        Ok(FeatureLayout { columns })
    }

    pub fn is_canonical(&self) -> bool {
        self.columns.iter().enumerate().all(|(i, &c)| i == c)
    }

    /// Model column holding `feature`.
    pub fn column_of(&self, feature: Feature) -> usize {
        self.columns[feature.index()]
    }

    /// Reorders a canonical row into model column order.
    pub fn to_model_order(&self, row: ArrayView1<f64>) -> Result<Array1<f64>, LayoutError> {
        check_len(row)?;
        let mut out = Array1::zeros(FEATURE_COUNT);
        for (i, &column) in self.columns.iter().enumerate() {
            out[column] = row[i];
        }
        Ok(out)
    }

    /// Reorders per-column model values (such as SHAP values) into
    /// canonical order.
    pub fn to_canonical_order(&self, values: ArrayView1<f64>) -> Result<Array1<f64>, LayoutError> {
        check_len(values)?;
        Ok(self.columns.iter().map(|&column| values[column]).collect())
    }
}

fn check_len(row: ArrayView1<f64>) -> Result<(), LayoutError> {
    if row.len() != FEATURE_COUNT {
        return Err(LayoutError::RowLength {
            expected: FEATURE_COUNT,
            actual: row.len(),
        });
    }
    Ok(())
}
