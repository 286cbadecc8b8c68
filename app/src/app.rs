use crate::predictor::Predictor;
use crate::ui;

use eframe::egui;
use eframe::{App, Frame};
use mrcurve::{Analysis, ConnectionGeometry, PARAMETER_COUNT, ParameterKind};
use tracing::{error, info};

/// A message box shown on top of the window until dismissed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorDialog {
    pub title: &'static str,
    pub message: String,
}

impl ErrorDialog {
    pub fn input(message: impl Into<String>) -> Self {
        ErrorDialog {
            title: "Input Error",
            message: message.into(),
        }
    }

    pub fn prediction(message: impl Into<String>) -> Self {
        ErrorDialog {
            title: "Prediction Error",
            message: message.into(),
        }
    }
}

/// Window state. Drawing lives in `ui`; this type only holds data and the
/// actions the buttons trigger.
pub struct PredictorApp {
    /// The loaded model, or the reason it could not be loaded.
    pub predictor: Result<Box<dyn Predictor>, String>,
    /// Raw text of the eight entries, in parameter order.
    pub entries: [String; PARAMETER_COUNT],
    /// Result of the last successful Predict.
    pub analysis: Option<Analysis>,
    pub dialog: Option<ErrorDialog>,
    /// Entry that gets keyboard focus back once the dialog closes.
    pub refocus: Option<ParameterKind>,
}

impl PredictorApp {
    pub fn new(predictor: Result<Box<dyn Predictor>, String>) -> Self {
        if let Err(reason) = &predictor {
            error!(%reason, "prediction disabled");
        }
        PredictorApp {
            predictor,
            entries: Default::default(),
            analysis: None,
            dialog: None,
            refocus: None,
        }
    }

    pub fn can_predict(&self) -> bool {
        self.predictor.is_ok()
    }

    /// Checks one entry after it loses focus. Blank entries are left for
    /// Predict to report.
    pub fn validate_entry(&mut self, kind: ParameterKind) -> bool {
        let text = &self.entries[kind.index()];
        if text.trim().is_empty() {
            return true;
        }
        match kind.parse_entry(text) {
            Ok(_) => true,
            Err(err) => {
                self.dialog = Some(ErrorDialog::input(err.to_string()));
                self.refocus = Some(kind);
                false
            }
        }
    }

    /// Validates every entry, then runs the curve prediction and the
    /// attribution. Any failure leaves the previous plots in place.
    pub fn predict(&mut self) {
        let predictor = match &self.predictor {
            Ok(predictor) => predictor,
            Err(reason) => {
                self.dialog = Some(ErrorDialog::prediction(reason.clone()));
                return;
            }
        };
        let geometry = match ConnectionGeometry::from_entries(&self.entries) {
            Ok(geometry) => geometry,
            Err(err) => {
                self.dialog = Some(ErrorDialog::input(err.to_string()));
                return;
            }
        };
        match predictor.analyze(&geometry) {
            Ok(analysis) => {
                info!(peak_moment = analysis.curve.peak().moment, "prediction ready");
                self.analysis = Some(analysis);
            }
            Err(err) => {
                let message = format!("{err:#}");
                error!(error = %message, "prediction failed");
                self.dialog = Some(ErrorDialog::prediction(message));
            }
        }
    }

    /// Empties the entries and both plots.
    pub fn clear(&mut self) {
        for entry in &mut self.entries {
            entry.clear();
        }
        self.analysis = None;
        self.refocus = None;
    }
}

impl App for PredictorApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut Frame) {
        ui::draw_central_panel(self, ctx);
        ui::draw_error_dialog(self, ctx);
    }
}
