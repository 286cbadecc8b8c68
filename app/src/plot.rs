//! Plot data derived from an analysis, kept apart from the drawing code.

use ecolor::Color32;
use mrcurve::{AveragedAttribution, Contribution, ParameterKind, PredictionCurve};

pub const RAISES_COLOR: Color32 = Color32::from_rgb(0xD6, 0x27, 0x28);
pub const LOWERS_COLOR: Color32 = Color32::from_rgb(0x1F, 0x5F, 0xBF);

pub fn contribution_color(contribution: Contribution) -> Color32 {
    match contribution {
        Contribution::Raises => RAISES_COLOR,
        Contribution::Lowers => LOWERS_COLOR,
    }
}

/// Red for scores `>= 0`, blue for negative ones.
pub fn bar_color(score: f64) -> Color32 {
    contribution_color(Contribution::of(score))
}

/// `[rotation, moment]` pairs in sweep order.
pub fn curve_points(curve: &PredictionCurve) -> Vec<[f64; 2]> {
    curve.points().iter().map(|p| [p.rotation, p.moment]).collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttributionBar {
    /// Position on the category axis; the first parameter sits at 0.
    pub position: f64,
    pub score: f64,
    pub color: Color32,
    pub label: &'static str,
}

pub fn attribution_bars(attribution: &AveragedAttribution) -> Vec<AttributionBar> {
    attribution
        .iter()
        .map(|(kind, score)| AttributionBar {
            position: kind.index() as f64,
            score,
            color: bar_color(score),
            label: kind.label(),
        })
        .collect()
}

/// Parameter label for a tick on the category axis, empty between bars.
pub fn category_label(value: f64) -> String {
    let rounded = value.round();
    if (value - rounded).abs() > 1e-6 || rounded < 0.0 {
        return String::new();
    }
    ParameterKind::ALL
        .get(rounded as usize)
        .map(|kind| kind.label().to_string())
        .unwrap_or_default()
}
