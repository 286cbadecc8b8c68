//! Evaluates the moment model over the fixed rotation sweep.

use ndarray::Array2;
use serde::Serialize;
use tracing::debug;

use crate::error::SweepError;
use crate::geometry::{ConnectionGeometry, FEATURE_COUNT, PARAMETER_COUNT};
use crate::model::Regressor;

/// Spacing of the rotation sweep in radians.
pub const ROTATION_STEP: f64 = 0.004;

/// Number of rotations in the sweep.
pub const ROTATION_SAMPLES: usize = 31;

/// Rotations `0, 0.004, …, 0.120` rad; entry `i` is `i × ROTATION_STEP`.
pub const ROTATION_SWEEP: [f64; ROTATION_SAMPLES] = rotation_sweep();

const fn rotation_sweep() -> [f64; ROTATION_SAMPLES] {
    let mut values = [0.0; ROTATION_SAMPLES];
    let mut i = 0;
    while i < ROTATION_SAMPLES {
        values[i] = i as f64 * ROTATION_STEP;
        i += 1;
    }
    values
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CurvePoint {
    /// Rotation in radians.
    pub rotation: f64,
    /// Predicted moment in kNm.
    pub moment: f64,
}

/// One predicted moment per sweep rotation, in sweep order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PredictionCurve {
    points: Vec<CurvePoint>,
}

impl PredictionCurve {
    pub fn points(&self) -> &[CurvePoint] {
        &self.points
    }

    pub fn rotations(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|p| p.rotation)
    }

    pub fn moments(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|p| p.moment)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    // A curve always holds ROTATION_SAMPLES points.
    pub fn first(&self) -> CurvePoint {
        self.points[0]
    }

    pub fn last(&self) -> CurvePoint {
        self.points[self.points.len() - 1]
    }

    /// The point with the largest moment.
    pub fn peak(&self) -> CurvePoint {
        self.points
            .iter()
            .copied()
            .fold(self.first(), |best, p| if p.moment > best.moment { p } else { best })
    }
}

/// The 31 × 9 matrix of Sample Input Rows for `geometry`.
pub fn sample_rows(geometry: &ConnectionGeometry) -> Array2<f64> {
    let values = geometry.values();
    Array2::from_shape_fn((ROTATION_SAMPLES, FEATURE_COUNT), |(i, j)| {
        if j < PARAMETER_COUNT {
            values[j]
        } else {
            ROTATION_SWEEP[i]
        }
    })
}

/// Predicts the moment-rotation curve of a validated geometry.
///
/// The model is queried once per sweep rotation, in order.
///
/// # Errors
///
/// Returns `SweepError::Predict` for the first sample the model fails on;
/// no partial curve is returned.
pub fn predict_curve<R>(model: &R, geometry: &ConnectionGeometry) -> Result<PredictionCurve, SweepError>
where
    R: Regressor + ?Sized,
{
    debug!(geometry = ?geometry.values(), "predicting moment-rotation curve");
    let mut points = Vec::with_capacity(ROTATION_SAMPLES);
    for (index, &rotation) in ROTATION_SWEEP.iter().enumerate() {
        let row = geometry.sample_row(rotation);
        let moment = model
            .predict(row.view())
            .map_err(|source| SweepError::Predict {
                index,
                rotation,
                source,
            })?;
        points.push(CurvePoint { rotation, moment });
    }
    Ok(PredictionCurve { points })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::model::BoxError;
    use approx::assert_abs_diff_eq;
    use ndarray::ArrayView1;
    use proptest::prelude::*;
    use std::cell::Cell;

    pub(crate) const EXAMPLE: [f64; PARAMETER_COUNT] =
        [150.0, 200.0, 100.0, 80.0, 12.0, 12.0, 10.0, 20.0];

    /// moment = Σ parameters + 1000 · rotation
    pub(crate) struct LinearStub;

    impl Regressor for LinearStub {
        fn predict(&self, row: ArrayView1<f64>) -> Result<f64, BoxError> {
            let params: f64 = row.iter().take(PARAMETER_COUNT).sum();
            Ok(params + row[PARAMETER_COUNT] * 1000.0)
        }
    }

    /// Fails on the `fail_at`-th call, counting from zero.
    struct FailingStub {
        calls: Cell<usize>,
        fail_at: usize,
    }

    impl Regressor for FailingStub {
        fn predict(&self, _row: ArrayView1<f64>) -> Result<f64, BoxError> {
            let call = self.calls.get();
            self.calls.set(call + 1);
            if call == self.fail_at {
                Err("booster crashed".into())
            } else {
                Ok(1.0)
            }
        }
    }

    #[test]
    fn test_rotation_sweep() {
        assert_eq!(ROTATION_SWEEP.len(), 31);
        assert_eq!(ROTATION_SWEEP[0], 0.0);
        assert_abs_diff_eq!(ROTATION_SWEEP[30], 0.12, epsilon = 1e-12);
        for (i, &r) in ROTATION_SWEEP.iter().enumerate() {
            assert_eq!(r, i as f64 * ROTATION_STEP);
        }
        assert!(ROTATION_SWEEP.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_example_curve() {
        let geometry = ConnectionGeometry::new(EXAMPLE);
        let curve = predict_curve(&LinearStub, &geometry).unwrap();
        assert_eq!(curve.len(), ROTATION_SAMPLES);

        let first = curve.first();
        assert_eq!(first.rotation, 0.0);
        assert_abs_diff_eq!(first.moment, 584.0);

        let last = curve.last();
        assert_abs_diff_eq!(last.rotation, 0.12, epsilon = 1e-12);
        assert_abs_diff_eq!(last.moment, 704.0, epsilon = 1e-9);
        assert_eq!(curve.peak(), last);

        for (point, &rotation) in curve.points().iter().zip(ROTATION_SWEEP.iter()) {
            assert_eq!(point.rotation, rotation);
        }
    }

    #[test]
    fn test_failure_on_fifth_sample_fails_the_call() {
        let stub = FailingStub {
            calls: Cell::new(0),
            fail_at: 4,
        };
        let err = predict_curve(&stub, &ConnectionGeometry::new(EXAMPLE)).unwrap_err();
        match err {
            SweepError::Predict {
                index, rotation, ..
            } => {
                assert_eq!(index, 4);
                assert_abs_diff_eq!(rotation, 0.016, epsilon = 1e-12);
            }
            other => panic!("unexpected error {other:?}"),
        }
        // nothing is queried after the failure
        assert_eq!(stub.calls.get(), 5);
    }

    #[test]
    fn test_error_chain_names_the_cause_once() {
        let stub = FailingStub {
            calls: Cell::new(0),
            fail_at: 0,
        };
        let err = predict_curve(&stub, &ConnectionGeometry::new(EXAMPLE)).unwrap_err();
        assert_eq!(err.to_string(), "moment prediction failed at sample 0 (rotation 0)");
        let chain = format!("{:#}", anyhow::Error::new(err));
        assert_eq!(chain, "moment prediction failed at sample 0 (rotation 0): booster crashed");
    }

    #[test]
    fn test_sample_rows() {
        let rows = sample_rows(&ConnectionGeometry::new(EXAMPLE));
        assert_eq!(rows.dim(), (ROTATION_SAMPLES, FEATURE_COUNT));
        for (i, row) in rows.rows().into_iter().enumerate() {
            assert_eq!(row, ConnectionGeometry::new(EXAMPLE).sample_row(ROTATION_SWEEP[i]));
        }
    }

    #[test]
    fn test_curve_serializes_as_point_list() {
        let curve = predict_curve(&LinearStub, &ConnectionGeometry::new(EXAMPLE)).unwrap();
        let json = serde_json::to_value(&curve).unwrap();
        assert_eq!(json.as_array().unwrap().len(), ROTATION_SAMPLES);
        assert_eq!(json[0]["moment"], 584.0);
    }

    pub(crate) fn valid_geometry() -> impl Strategy<Value = ConnectionGeometry> {
        (
            100.0..=300.0,
            100.0..=300.0,
            70.0..=150.0,
            50.0..=150.0,
            10.0..=14.0,
            10.0..=14.0,
            8.0..=14.0,
            16.0..=24.0,
        )
            .prop_map(|(b, d, sv, sh, tw, tf, tp, db)| {
                ConnectionGeometry::new([b, d, sv, sh, tw, tf, tp, db])
            })
    }

    proptest! {
        #[test]
        fn prop_curve_follows_sweep(geometry in valid_geometry()) {
            prop_assert!(ConnectionGeometry::validated(*geometry.values()).is_ok());
            let curve = predict_curve(&LinearStub, &geometry).unwrap();
            prop_assert_eq!(curve.len(), ROTATION_SAMPLES);
            let rotations: Vec<f64> = curve.rotations().collect();
            prop_assert_eq!(rotations, ROTATION_SWEEP.to_vec());
        }

        #[test]
        fn prop_prediction_is_deterministic(geometry in valid_geometry()) {
            let a = predict_curve(&LinearStub, &geometry).unwrap();
            let b = predict_curve(&LinearStub, &geometry).unwrap();
            let bits = |c: &PredictionCurve| c.moments().map(f64::to_bits).collect::<Vec<_>>();
            prop_assert_eq!(bits(&a), bits(&b));
        }
    }
}
