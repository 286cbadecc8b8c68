mod app;
mod plot;
mod predictor;
mod ui;

use std::path::PathBuf;

use app::PredictorApp;
use clap::Parser;
use mrcurve::{Overrides, Settings, logging};
use predictor::{ModelAdapter, Predictor};

/// Desktop window for the moment-rotation curve predictor.
#[derive(Debug, Parser)]
#[command(name = "mrcurve-app", version)]
struct Cli {
    /// Settings file (default: mrcurve.toml in the working directory)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// XGBoost JSON model file
    #[arg(long, value_name = "FILE")]
    model: Option<PathBuf>,
}

fn main() -> eframe::Result<()> {
    let cli = Cli::parse();
    let overrides = Overrides {
        model_path: cli.model,
        log_filter: None,
    };
    let settings = Settings::load(cli.config.as_deref(), &overrides).unwrap_or_else(|err| {
        eprintln!("ignoring invalid settings: {err}");
        Settings::default()
    });
    logging::init(&settings.log_filter);

    let predictor = ModelAdapter::load(&settings.model_path)
        .map(|adapter| Box::new(adapter) as Box<dyn Predictor>)
        .map_err(|err| format!("{:#}", anyhow::Error::new(err)));

    let native_options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default()
            .with_inner_size([900.0, 730.0])
            .with_min_inner_size([760.0, 640.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Moment-Rotation Curve Predictor",
        native_options,
        Box::new(|_cc| Ok(Box::new(PredictorApp::new(predictor)))),
    )
}
