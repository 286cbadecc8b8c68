//! Layered settings for the front ends.
//!
//! Sources, lowest priority first: built-in defaults, `mrcurve.toml` in the
//! working directory (or the file passed with `--config`), `MRCURVE_*`
//! environment variables, command-line overrides.

use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

/// Config file read when no other is given.
pub const DEFAULT_CONFIG_FILE: &str = "mrcurve.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// XGBoost JSON model exported from the trained regressor.
    pub model_path: PathBuf,
    /// `tracing` filter used when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            model_path: PathBuf::from("XGB_Model.json"),
            log_filter: "info".to_string(),
        }
    }
}

/// Values given on the command line; `None` leaves the lower layers alone.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Overrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_filter: Option<String>,
}

impl Settings {
    /// Loads settings from all layers.
    ///
    /// A missing config file is not an error.
    pub fn load(config_file: Option<&Path>, overrides: &Overrides) -> Result<Settings, Box<figment::Error>> {
        Self::figment(config_file, overrides).extract().map_err(Box::new)
    }

    fn figment(config_file: Option<&Path>, overrides: &Overrides) -> Figment {
        let file = config_file.unwrap_or(Path::new(DEFAULT_CONFIG_FILE));
        Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(file))
            .merge(Env::prefixed("MRCURVE_"))
            .merge(Serialized::defaults(overrides))
    }
}
