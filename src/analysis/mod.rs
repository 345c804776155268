/// Computational core: everything the plots and the table display.
///
/// ```text
///  model + splits + grid + threshold          SubjectFrame
///               │                                  │
///               ▼                                  ▼
///   ┌──────────────────────────┐          ┌──────────────┐
///   │ scores / roc / grid      │          │   describe   │
///   └──────────────────────────┘          └──────────────┘
///               │                                  │
///               ▼                                  ▼
///      ClassificationReport                 FrequencyTable
/// ```
///
/// Outputs are plain data; the `ui` layer turns them into plot items.

pub mod describe;
pub mod grid;
pub mod roc;
pub mod scores;

use serde::Serialize;

use crate::classifier::DecisionFunction;
use crate::data::model::TrainTestSplit;
use crate::error::{AnalysisError, AnalysisResult};

use grid::{threshold_contour, ClassifierGrid, Segment};
use roc::{compute_roc_curve, RocCurve};
use scores::{
    compute_accuracies, compute_confusion, compute_scaled_threshold, Accuracies, ConfusionCounts,
    ThresholdScale,
};

/// Every derived quantity of the classification panel at one threshold.
///
/// `roc` is `None` when the test split holds a single class; the other
/// figures stay defined in that case.
#[derive(Debug, Clone, Serialize)]
pub struct ClassificationReport {
    pub threshold: f64,
    pub accuracies: Accuracies,
    pub scale: ThresholdScale,
    pub confusion: ConfusionCounts,
    pub roc: Option<RocCurve>,
    #[serde(skip)]
    pub contour: Vec<Segment>,
}

impl ClassificationReport {
    pub fn compute(
        model: &dyn DecisionFunction,
        split: &TrainTestSplit,
        grid: &ClassifierGrid,
        threshold: f64,
    ) -> AnalysisResult<Self> {
        let scale = compute_scaled_threshold(grid.values(), threshold)?;
        let roc = match compute_roc_curve(model, &split.test) {
            Ok(roc) => Some(roc),
            Err(AnalysisError::DegenerateLabels(class)) => {
                log::warn!("no ROC curve: test split holds only class {class}");
                None
            }
            Err(e) => return Err(e),
        };
        Ok(Self {
            threshold,
            accuracies: compute_accuracies(model, &split.train, &split.test, threshold)?,
            confusion: compute_confusion(model, &split.test, grid.values(), threshold)?,
            roc,
            contour: threshold_contour(grid, scale.scaled),
            scale,
        })
    }
}
