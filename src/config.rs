use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::data::model::{MoonsParams, SplitParams};

/// Environment variable naming the config file when no argument is given.
pub const CONFIG_ENV: &str = "SVM_DASHBOARD_CONFIG";

/// Finest mesh spacing a config file may ask for.
pub const MIN_MESH_STEP: f64 = 0.01;

// ---------------------------------------------------------------------------
// Application configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct ModelParams {
    /// RBF kernel width of the stand-in scorer.
    pub gamma: f64,
}

impl Default for ModelParams {
    fn default() -> Self {
        Self { gamma: 1.0 }
    }
}

/// Start-up configuration. Every field has a default, so `{}` is a valid
/// config file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Subject frame shown in the statistics table.
    pub data_file: Option<PathBuf>,
    /// Variable id → title CSV for the table headers.
    pub titles_file: Option<PathBuf>,
    pub moons: MoonsParams,
    pub split: SplitParams,
    pub model: ModelParams,
    pub mesh_step: f64,
    /// Padding around the data when building the mesh.
    pub margin: f64,
    pub threshold: f64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_file: None,
            titles_file: None,
            moons: MoonsParams::default(),
            split: SplitParams::default(),
            model: ModelParams::default(),
            mesh_step: 0.05,
            margin: 0.25,
            threshold: 0.5,
        }
    }
}

impl AppConfig {
    /// Read and validate a JSON config file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: AppConfig = serde_json::from_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Config path from the first CLI argument, else from [`CONFIG_ENV`].
    pub fn locate(mut args: impl Iterator<Item = String>) -> Option<PathBuf> {
        choose_path(args.next(), std::env::var(CONFIG_ENV).ok())
    }

    fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            (0.0..=1.0).contains(&self.threshold),
            "threshold must be in [0, 1], got {}",
            self.threshold
        );
        anyhow::ensure!(
            self.mesh_step >= MIN_MESH_STEP,
            "mesh_step must be at least {MIN_MESH_STEP}, got {}",
            self.mesh_step
        );
        anyhow::ensure!(
            self.split.test_fraction > 0.0 && self.split.test_fraction < 1.0,
            "split.test_fraction must be in (0, 1), got {}",
            self.split.test_fraction
        );
        anyhow::ensure!(self.moons.n_samples >= 4, "moons.n_samples must be at least 4");
        anyhow::ensure!(self.model.gamma > 0.0, "model.gamma must be positive");
        Ok(())
    }
}

fn choose_path(arg: Option<String>, env: Option<String>) -> Option<PathBuf> {
    arg.or(env).filter(|s| !s.is_empty()).map(PathBuf::from)
}
