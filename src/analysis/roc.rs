use serde::Serialize;

use crate::classifier::DecisionFunction;
use crate::data::model::LabeledSplit;
use crate::error::{ensure_len, AnalysisError, AnalysisResult};

// ---------------------------------------------------------------------------
// ROC curve
// ---------------------------------------------------------------------------

/// A single point on the ROC curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RocPoint {
    /// Score threshold at which this point is computed (`+inf` for the
    /// origin).
    pub threshold: f64,
    /// False positive rate: FP / (FP + TN).
    pub fpr: f64,
    /// True positive rate (recall): TP / (TP + FN).
    pub tpr: f64,
}

/// ROC curve with AUC.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RocCurve {
    /// Points from (0, 0) to (1, 1), thresholds decreasing.
    pub points: Vec<RocPoint>,
    /// Area under the curve (trapezoidal rule).
    pub auc: f64,
}

impl RocCurve {
    pub fn fpr(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.fpr).collect()
    }

    pub fn tpr(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.tpr).collect()
    }
}

/// ROC curve of `model` on the test split.
pub fn compute_roc_curve(model: &dyn DecisionFunction, test: &LabeledSplit) -> AnalysisResult<RocCurve> {
    let scores = model.decision_function(test.features());
    roc_curve(&scores, test.labels())
}

/// Compute the ROC curve from scores and binary labels.
///
/// Walks the distinct scores from highest to lowest, accumulating true and
/// false positives. Points that are collinear with their neighbours are
/// dropped; they do not change the curve or its area.
pub fn roc_curve(scores: &[f64], labels: &[u8]) -> AnalysisResult<RocCurve> {
    ensure_len("roc scores", labels.len(), scores.len())?;
    if scores.is_empty() {
        return Err(AnalysisError::EmptyInput("no scores for ROC curve"));
    }
    let total_pos = labels.iter().filter(|&&l| l != 0).count();
    if total_pos == 0 {
        return Err(AnalysisError::DegenerateLabels(0));
    }
    if total_pos == labels.len() {
        return Err(AnalysisError::DegenerateLabels(1));
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));

    // Cumulative (fp, tp, threshold) at each distinct score.
    let mut steps: Vec<(usize, usize, f64)> = Vec::new();
    let (mut tp, mut fp) = (0usize, 0usize);
    for (i, &idx) in order.iter().enumerate() {
        if labels[idx] != 0 {
            tp += 1;
        } else {
            fp += 1;
        }
        let last_of_group = order
            .get(i + 1)
            .map_or(true, |&next| scores[next] != scores[idx]);
        if last_of_group {
            steps.push((fp, tp, scores[idx]));
        }
    }

    let steps = drop_collinear(steps);

    let p = total_pos as f64;
    let n = (labels.len() - total_pos) as f64;
    let mut points = Vec::with_capacity(steps.len() + 1);
    points.push(RocPoint {
        threshold: f64::INFINITY,
        fpr: 0.0,
        tpr: 0.0,
    });
    points.extend(steps.into_iter().map(|(fp, tp, threshold)| RocPoint {
        threshold,
        fpr: fp as f64 / n,
        tpr: tp as f64 / p,
    }));

    let auc = trapezoidal_auc(&points);
    Ok(RocCurve { points, auc })
}

/// Keep the endpoints and every step where the curve changes direction.
fn drop_collinear(steps: Vec<(usize, usize, f64)>) -> Vec<(usize, usize, f64)> {
    if steps.len() <= 2 {
        return steps;
    }
    let last = steps.len() - 1;
    (0..steps.len())
        .filter(|&i| {
            if i == 0 || i == last {
                return true;
            }
            let (f0, t0, _) = steps[i - 1];
            let (f1, t1, _) = steps[i];
            let (f2, t2, _) = steps[i + 1];
            // Second differences of both counters.
            f2 + f0 != 2 * f1 || t2 + t0 != 2 * t1
        })
        .map(|i| steps[i])
        .collect()
}

fn trapezoidal_auc(points: &[RocPoint]) -> f64 {
    points
        .windows(2)
        .map(|w| (w[1].fpr - w[0].fpr) * (w[1].tpr + w[0].tpr) / 2.0)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-12;

    fn assert_monotone_and_anchored(curve: &RocCurve) {
        let first = curve.points.first().unwrap();
        let last = curve.points.last().unwrap();
        assert_eq!((first.fpr, first.tpr), (0.0, 0.0));
        assert!((last.fpr - 1.0).abs() < EPS && (last.tpr - 1.0).abs() < EPS);
        for w in curve.points.windows(2) {
            assert!(w[1].fpr >= w[0].fpr);
            assert!(w[1].tpr >= w[0].tpr);
            assert!(w[1].threshold < w[0].threshold);
        }
    }

    #[test]
    fn textbook_example() {
        let curve = roc_curve(&[0.1, 0.4, 0.35, 0.8], &[0, 0, 1, 1]).unwrap();
        assert_monotone_and_anchored(&curve);
        assert_eq!(curve.fpr(), vec![0.0, 0.0, 0.5, 0.5, 1.0]);
        assert_eq!(curve.tpr(), vec![0.0, 0.5, 0.5, 1.0, 1.0]);
        assert!((curve.auc - 0.75).abs() < EPS);
    }

    #[test]
    fn perfect_separation_has_unit_auc() {
        let curve = roc_curve(&[0.9, 0.8, 0.2, 0.1], &[1, 1, 0, 0]).unwrap();
        assert_monotone_and_anchored(&curve);
        assert!((curve.auc - 1.0).abs() < EPS);
    }

    #[test]
    fn tied_scores_share_a_point() {
        let curve = roc_curve(&[0.5, 0.5, 0.5, 0.5], &[0, 1, 0, 1]).unwrap();
        assert_eq!(curve.points.len(), 2);
        assert!((curve.auc - 0.5).abs() < EPS);
    }

    #[test]
    fn collinear_points_are_dropped_without_changing_area() {
        // Three negatives in a row form a straight horizontal run.
        let curve = roc_curve(&[0.9, 0.7, 0.6, 0.5, 0.1], &[1, 0, 0, 0, 1]).unwrap();
        assert_monotone_and_anchored(&curve);
        assert_eq!(curve.points.len(), 4);
        assert!((curve.auc - 0.5).abs() < EPS);
    }

    #[test]
    fn single_class_is_degenerate() {
        assert_eq!(roc_curve(&[0.1, 0.2], &[1, 1]).unwrap_err(), AnalysisError::DegenerateLabels(1));
        assert_eq!(roc_curve(&[0.1, 0.2], &[0, 0]).unwrap_err(), AnalysisError::DegenerateLabels(0));
    }

    #[test]
    fn length_mismatch_is_rejected() {
        let err = roc_curve(&[0.1], &[0, 1]).unwrap_err();
        assert!(matches!(err, AnalysisError::ShapeMismatch { .. }));
    }

    #[test]
    fn model_curve_is_monotone() {
        use crate::classifier::KernelScorer;
        use crate::data::model::{make_moons, train_test_split, MoonsParams, SplitParams};

        let data = make_moons(&MoonsParams::default());
        let parts = train_test_split(&data, &SplitParams::default());
        let model = KernelScorer::fit(&parts.train, 1.0);
        let curve = compute_roc_curve(&model, &parts.test).unwrap();
        assert_monotone_and_anchored(&curve);
        assert!((0.0..=1.0).contains(&curve.auc));
    }
}
