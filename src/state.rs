use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::analysis::describe::{build_frequency_table, FrequencyTable};
use crate::analysis::grid::{ClassifierGrid, GridBounds};
use crate::analysis::ClassificationReport;
use crate::classifier::KernelScorer;
use crate::config::AppConfig;
use crate::data::loader;
use crate::data::model::{
    make_moons, train_test_split, LabeledSplit, MoonsParams, SplitParams, SubjectFrame,
    TrainTestSplit, VariableTitles,
};

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    // ---- Inputs edited from the side panel ----
    pub moons: MoonsParams,
    pub split_params: SplitParams,
    pub gamma: f64,
    pub mesh_step: f64,
    pub margin: f64,
    pub threshold: f64,
    /// Configured start-up threshold, restored by "Reset threshold".
    pub default_threshold: f64,

    // ---- Classification pipeline ----
    pub dataset: LabeledSplit,
    pub split: TrainTestSplit,
    pub model: KernelScorer,
    pub grid: Option<ClassifierGrid>,
    pub report: Option<ClassificationReport>,

    // ---- Statistics table ----
    pub frame_path: Option<PathBuf>,
    pub frame: Option<SubjectFrame>,
    pub titles: VariableTitles,
    pub table: Option<FrequencyTable>,

    /// Bumped whenever `report` is replaced, so cached plot textures know
    /// when to rebuild.
    pub revision: u64,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    /// Build the initial state: generate the moons, fit, evaluate, and load
    /// any configured files.
    pub fn new(config: &AppConfig) -> Self {
        let dataset = make_moons(&config.moons);
        let split = train_test_split(&dataset, &config.split);
        let model = KernelScorer::fit(&split.train, config.model.gamma);

        let mut state = Self {
            moons: config.moons,
            split_params: config.split,
            gamma: config.model.gamma,
            mesh_step: config.mesh_step,
            margin: config.margin,
            threshold: config.threshold,
            default_threshold: config.threshold,
            dataset,
            split,
            model,
            grid: None,
            report: None,
            frame_path: None,
            frame: None,
            titles: VariableTitles::default(),
            table: None,
            revision: 0,
            status_message: None,
        };
        state.rebuild_grid();

        if let Some(path) = &config.titles_file {
            state.load_titles(path);
        }
        if let Some(path) = &config.data_file {
            state.load_frame(path);
        }
        state
    }

    /// Regenerate the dataset from `self.moons` and everything downstream.
    pub fn regenerate_data(&mut self) {
        self.dataset = make_moons(&self.moons);
        self.split = train_test_split(&self.dataset, &self.split_params);
        log::info!(
            "generated {} samples ({} train / {} test)",
            self.dataset.len(),
            self.split.train.len(),
            self.split.test.len()
        );
        self.refit_model();
    }

    /// Refit the scorer after a kernel-width change.
    pub fn refit_model(&mut self) {
        self.model = KernelScorer::fit(&self.split.train, self.gamma);
        self.rebuild_grid();
    }

    /// Re-evaluate the decision mesh, then the report.
    pub fn rebuild_grid(&mut self) {
        let grid = GridBounds::around(self.dataset.features(), self.margin)
            .and_then(|bounds| ClassifierGrid::evaluate(&self.model, &bounds, self.mesh_step));
        match grid {
            Ok(grid) => {
                self.grid = Some(grid);
                self.refresh_report();
            }
            Err(e) => self.fail("Could not evaluate decision mesh", &e),
        }
    }

    /// Restore the configured threshold.
    pub fn reset_threshold(&mut self) {
        self.threshold = self.default_threshold;
        self.refresh_report();
    }

    /// Recompute threshold-dependent results.
    pub fn refresh_report(&mut self) {
        let Some(grid) = &self.grid else {
            return;
        };
        match ClassificationReport::compute(&self.model, &self.split, grid, self.threshold) {
            Ok(report) => {
                log::debug!(
                    "threshold {:.3} → scaled {:.3}, test accuracy {:.3}, AUC {:?}",
                    self.threshold,
                    report.scale.scaled,
                    report.accuracies.test,
                    report.roc.as_ref().map(|roc| roc.auc)
                );
                self.status_message = report
                    .roc
                    .is_none()
                    .then(|| "ROC curve undefined: the test split holds a single class".to_string());
                self.report = Some(report);
                self.revision += 1;
            }
            Err(e) => {
                self.report = None;
                self.revision += 1;
                self.fail("Could not score the classifier", &e);
            }
        }
    }

    /// Load a subject frame and rebuild the statistics table.
    pub fn load_frame(&mut self, path: &Path) {
        let result = loader::load_frame(path).and_then(|frame| {
            let table = build_frequency_table(&frame)
                .with_context(|| format!("describing {}", path.display()))?;
            Ok((frame, table))
        });
        match result {
            Ok((frame, table)) => {
                log::info!(
                    "Loaded {} subjects ({} rows) from {}",
                    frame.len(),
                    frame.n_rows(),
                    path.display()
                );
                self.table = Some(table.with_titles(&self.titles));
                self.frame = Some(frame);
                self.frame_path = Some(path.to_path_buf());
                self.status_message = None;
            }
            Err(e) => self.fail("Failed to load data file", &e),
        }
    }

    /// Load variable titles and relabel the current table.
    pub fn load_titles(&mut self, path: &Path) {
        match loader::load_titles(path) {
            Ok(titles) => {
                log::info!("Loaded {} variable titles from {}", titles.len(), path.display());
                self.titles = titles;
                self.table = self.table.take().map(|t| t.with_titles(&self.titles));
            }
            Err(e) => self.fail("Failed to load titles file", &e),
        }
    }

    /// Write the statistics table (columns + rows) as JSON.
    pub fn export_table(&self, path: &Path) -> Result<()> {
        let table = self.table.as_ref().context("no statistics table to export")?;
        write_json(path, table)
    }

    /// Write the classification report as JSON.
    pub fn export_report(&self, path: &Path) -> Result<()> {
        let report = self.report.as_ref().context("no classification report to export")?;
        write_json(path, report)
    }

    pub fn fail(&mut self, what: &str, err: &dyn std::fmt::Display) {
        log::error!("{what}: {err:#}");
        self.status_message = Some(format!("Error: {what}: {err:#}"));
    }
}

fn write_json(path: &Path, value: &impl serde::Serialize) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("creating {}", path.display()))?;
    serde_json::to_writer_pretty(std::io::BufWriter::new(file), value)
        .with_context(|| format!("writing {}", path.display()))?;
    log::info!("Exported {}", path.display());
    Ok(())
}
