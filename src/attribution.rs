//! Averages per-sample attributions over the rotation sweep.

use std::fmt::{self, Display, Formatter};

use ndarray::{Array2, ArrayView2};
use serde::Serialize;
use serde::ser::{SerializeMap, Serializer};
use tracing::debug;

use crate::error::SweepError;
use crate::geometry::{ConnectionGeometry, FEATURE_COUNT, PARAMETER_COUNT, ParameterKind};
use crate::model::Explainer;
use crate::sweep::{ROTATION_SAMPLES, ROTATION_SWEEP};

/// One attribution row per sweep sample, one column per input feature
/// (rotation last).
#[derive(Debug, Clone, PartialEq)]
pub struct AttributionMatrix {
    values: Array2<f64>,
}

impl AttributionMatrix {
    pub fn view(&self) -> ArrayView2<'_, f64> {
        self.values.view()
    }

    /// Column means with the rotation column dropped.
    pub fn average(&self) -> AveragedAttribution {
        let mut scores = [0.0; PARAMETER_COUNT];
        for (score, column) in scores.iter_mut().zip(self.values.columns()) {
            *score = column.sum() / ROTATION_SAMPLES as f64;
        }
        AveragedAttribution { scores }
    }
}

/// Explains every Sample Input Row of `geometry`.
///
/// # Errors
///
/// Returns `SweepError::Explain` for the first sample the explainer fails on
/// and `SweepError::MalformedAttribution` for a vector that does not have
/// one entry per input feature.
pub fn attribution_matrix<E>(explainer: &E, geometry: &ConnectionGeometry) -> Result<AttributionMatrix, SweepError>
where
    E: Explainer + ?Sized,
{
    let mut values = Array2::zeros((ROTATION_SAMPLES, FEATURE_COUNT));
    for ((index, &rotation), mut target) in ROTATION_SWEEP.iter().enumerate().zip(values.rows_mut()) {
        let row = geometry.sample_row(rotation);
        let phi = explainer
            .explain(row.view())
            .map_err(|source| SweepError::Explain {
                index,
                rotation,
                source,
            })?;
        if phi.len() != FEATURE_COUNT {
            return Err(SweepError::MalformedAttribution {
                index,
                expected: FEATURE_COUNT,
                actual: phi.len(),
            });
        }
        target.assign(&phi);
    }
    Ok(AttributionMatrix { values })
}

/// Mean attribution of each geometry parameter over the rotation sweep.
pub fn average_attributions<E>(explainer: &E, geometry: &ConnectionGeometry) -> Result<AveragedAttribution, SweepError>
where
    E: Explainer + ?Sized,
{
    let averaged = attribution_matrix(explainer, geometry)?.average();
    debug!(scores = ?averaged.scores(), "averaged attributions");
    Ok(averaged)
}

/// Direction in which a parameter moves the predicted moment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Contribution {
    Raises,
    Lowers,
}

impl Contribution {
    /// Zero counts as raising.
    pub fn of(score: f64) -> Self {
        if score >= 0.0 {
            Contribution::Raises
        } else {
            Contribution::Lowers
        }
    }
}

impl Display for Contribution {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Contribution::Raises => f.write_str("raises"),
            Contribution::Lowers => f.write_str("lowers"),
        }
    }
}

/// Eight scores aligned with [`ParameterKind::ALL`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AveragedAttribution {
    scores: [f64; PARAMETER_COUNT],
}

impl AveragedAttribution {
    pub fn scores(&self) -> &[f64; PARAMETER_COUNT] {
        &self.scores
    }

    pub fn get(&self, kind: ParameterKind) -> f64 {
        self.scores[kind.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (ParameterKind, f64)> + '_ {
        ParameterKind::ALL.into_iter().map(|kind| (kind, self.get(kind)))
    }

    pub fn contribution(&self, kind: ParameterKind) -> Contribution {
        Contribution::of(self.get(kind))
    }
}

impl Serialize for AveragedAttribution {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(PARAMETER_COUNT))?;
        for (kind, score) in self.iter() {
            map.serialize_entry(kind.key(), &score)?;
        }
        map.end()
    }
}
