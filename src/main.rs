use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use mrcurve::{Analysis, ConnectionGeometry, MomentModel, Overrides, ParameterKind, Settings, analyze, logging};
use tracing::error;

/// Predicts the moment-rotation curve of an extended end-plate connection.
#[derive(Debug, Parser)]
#[command(name = "mrcurve", version)]
struct Cli {
    /// Settings file (default: mrcurve.toml in the working directory)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// XGBoost JSON model file
    #[arg(long, value_name = "FILE")]
    model: Option<PathBuf>,
    #[arg(long, value_enum, default_value_t = Format::Table)]
    format: Format,
    /// Overall width b (mm)
    #[arg(long, value_name = "B", allow_hyphen_values = true)]
    width: String,
    /// Overall depth d (mm)
    #[arg(long, value_name = "D", allow_hyphen_values = true)]
    depth: String,
    /// Bolt vertical spacing Sv (mm)
    #[arg(long, value_name = "SV", allow_hyphen_values = true)]
    sv: String,
    /// Bolt horizontal spacing Sh (mm)
    #[arg(long, value_name = "SH", allow_hyphen_values = true)]
    sh: String,
    /// Web thickness tw (mm)
    #[arg(long, value_name = "TW", allow_hyphen_values = true)]
    tw: String,
    /// Flange thickness tf (mm)
    #[arg(long, value_name = "TF", allow_hyphen_values = true)]
    tf: String,
    /// Endplate thickness tp (mm)
    #[arg(long, value_name = "TP", allow_hyphen_values = true)]
    tp: String,
    /// Bolt diameter db (mm)
    #[arg(long, value_name = "DB", allow_hyphen_values = true)]
    db: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Table,
    Json,
}

impl Cli {
    fn entries(&self) -> [&str; 8] {
        [
            self.width.as_str(),
            self.depth.as_str(),
            self.sv.as_str(),
            self.sh.as_str(),
            self.tw.as_str(),
            self.tf.as_str(),
            self.tp.as_str(),
            self.db.as_str(),
        ]
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let overrides = Overrides {
        model_path: cli.model.clone(),
        log_filter: None,
    };
    let settings = Settings::load(cli.config.as_deref(), &overrides).context("failed to read settings")?;
    logging::init(&settings.log_filter);

    let geometry = ConnectionGeometry::from_entries(&cli.entries())?;
    let model = MomentModel::load(&settings.model_path)?;
    let analysis = analyze(&model, &geometry).context("prediction failed")?;

    match cli.format {
        Format::Table => print_table(&analysis),
        Format::Json => println!("{}", serde_json::to_string_pretty(&analysis)?),
    }
    Ok(())
}

fn print_table(analysis: &Analysis) {
    println!("{:>14}  {:>14}", "Rotation (rad)", "Moment (kNm)");
    for point in analysis.curve.points() {
        println!("{:>14.3}  {:>14.3}", point.rotation, point.moment);
    }
    println!();
    println!("{:<30}  {:>12}  Effect", "Parameter", "SHAP value");
    for kind in ParameterKind::ALL {
        println!(
            "{:<30}  {:>12.4}  {}",
            kind.label(),
            analysis.attribution.get(kind),
            analysis.attribution.contribution(kind)
        );
    }
}
