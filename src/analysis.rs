//! One Predict request: the curve and the averaged attribution together.

use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info_span};

use crate::attribution::{AveragedAttribution, average_attributions};
use crate::error::SweepError;
use crate::geometry::ConnectionGeometry;
use crate::model::{Explainer, Regressor};
use crate::sweep::{PredictionCurve, predict_curve};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Analysis {
    pub geometry: ConnectionGeometry,
    pub curve: PredictionCurve,
    pub attribution: AveragedAttribution,
}

/// Runs the sweep prediction and then the attribution averaging for a
/// validated geometry. Fails as a whole if either stage fails.
pub fn analyze<M>(model: &M, geometry: &ConnectionGeometry) -> Result<Analysis, SweepError>
where
    M: Regressor + Explainer + ?Sized,
{
    let span = info_span!("analyze");
    let _enter = span.enter();
    let started = Instant::now();

    let curve = predict_curve(model, geometry)?;
    let attribution = average_attributions(model, geometry)?;

    debug!(
        elapsed_ms = started.elapsed().as_secs_f64() * 1e3,
        peak_moment = curve.peak().moment,
        "analysis complete"
    );
    Ok(Analysis {
        geometry: *geometry,
        curve,
        attribution,
    })
}
