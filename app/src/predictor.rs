use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use mrcurve::{Analysis, ConnectionGeometry, MomentModel, analyze};

/// What the window needs from the moment model.
pub trait Predictor: Send + Sync {
    /// Runs one Predict request for a validated geometry.
    fn analyze(&self, geometry: &ConnectionGeometry) -> Result<Analysis>;

    /// Short description shown under the buttons.
    fn name(&self) -> String;
}

/// The loaded XGBoost model, shared read-only for the life of the window.
pub struct ModelAdapter {
    model: Arc<MomentModel>,
    path: PathBuf,
}

impl ModelAdapter {
    pub fn load(path: &Path) -> Result<Self, mrcurve::ModelError> {
        let model = MomentModel::load(path)?;
        Ok(ModelAdapter {
            model: Arc::new(model),
            path: path.to_path_buf(),
        })
    }
}

impl Predictor for ModelAdapter {
    fn analyze(&self, geometry: &ConnectionGeometry) -> Result<Analysis> {
        Ok(analyze(&*self.model, geometry)?)
    }

    fn name(&self) -> String {
        let file = self
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string());
        format!("{file} ({} trees)", self.model.ensemble().trees().len())
    }
}
