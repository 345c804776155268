use serde::Serialize;

use crate::classifier::DecisionFunction;
use crate::data::model::LabeledSplit;
use crate::error::{ensure_len, AnalysisError, AnalysisResult};

// ---------------------------------------------------------------------------
// Predictions
// ---------------------------------------------------------------------------

/// Score `split` with `model` and binarise against `cutoff` (strictly greater
/// means class 1).
fn predict(model: &dyn DecisionFunction, split: &LabeledSplit, cutoff: f64) -> AnalysisResult<Vec<u8>> {
    let scores = model.decision_function(split.features());
    ensure_len("decision scores", split.len(), scores.len())?;
    Ok(scores.iter().map(|&s| u8::from(s > cutoff)).collect())
}

fn accuracy(truth: &[u8], predicted: &[u8]) -> AnalysisResult<f64> {
    ensure_len("predictions", truth.len(), predicted.len())?;
    if truth.is_empty() {
        return Err(AnalysisError::EmptyInput("no labels to score"));
    }
    let correct = truth.iter().zip(predicted).filter(|(a, b)| a == b).count();
    Ok(correct as f64 / truth.len() as f64)
}

// ---------------------------------------------------------------------------
// Accuracies
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Accuracies {
    pub train: f64,
    pub test: f64,
}

/// Train and test accuracy at `threshold`.
///
/// NOTE: the raw decision score is compared against the unscaled `[0, 1]`
/// threshold here, whereas [`compute_confusion`] rescales the threshold into
/// the grid's value range first. Both behaviours are pinned by tests until
/// product decides which one is intended.
pub fn compute_accuracies(
    model: &dyn DecisionFunction,
    train: &LabeledSplit,
    test: &LabeledSplit,
    threshold: f64,
) -> AnalysisResult<Accuracies> {
    let train_pred = predict(model, train, threshold)?;
    let test_pred = predict(model, test, threshold)?;
    Ok(Accuracies {
        train: accuracy(train.labels(), &train_pred)?,
        test: accuracy(test.labels(), &test_pred)?,
    })
}

// ---------------------------------------------------------------------------
// Threshold scaling
// ---------------------------------------------------------------------------

/// A `[0, 1]` threshold mapped into the value range of a decision grid,
/// plus the half-width of a colour scale centred on it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ThresholdScale {
    pub scaled: f64,
    pub display_range: f64,
    pub z_min: f64,
    pub z_max: f64,
}

impl ThresholdScale {
    /// Lower end of the symmetric colour scale.
    pub fn color_min(&self) -> f64 {
        self.scaled - self.display_range
    }

    /// Upper end of the symmetric colour scale.
    pub fn color_max(&self) -> f64 {
        self.scaled + self.display_range
    }

    /// Position of `value` on the colour scale in `[0, 1]`. A zero-width
    /// scale maps everything to the middle.
    pub fn normalize(&self, value: f64) -> f64 {
        if self.display_range <= 0.0 {
            return 0.5;
        }
        ((value - self.color_min()) / (2.0 * self.display_range)).clamp(0.0, 1.0)
    }
}

/// `scaled = threshold * (max - min) + min`, and the display range is the
/// larger distance from `scaled` to either end, so the centred scale never
/// clips the grid.
pub fn compute_scaled_threshold(z: &[f64], threshold: f64) -> AnalysisResult<ThresholdScale> {
    if z.is_empty() {
        return Err(AnalysisError::EmptyInput("decision grid has no values"));
    }
    let z_min = z.iter().copied().fold(f64::INFINITY, f64::min);
    let z_max = z.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let scaled = threshold * (z_max - z_min) + z_min;
    let display_range = (scaled - z_min).abs().max((scaled - z_max).abs());
    Ok(ThresholdScale {
        scaled,
        display_range,
        z_min,
        z_max,
    })
}

// ---------------------------------------------------------------------------
// Confusion counts
// ---------------------------------------------------------------------------

/// The four cells of a binary confusion matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ConfusionCell {
    TruePositive,
    FalseNegative,
    FalsePositive,
    TrueNegative,
}

impl ConfusionCell {
    pub fn abbreviation(self) -> &'static str {
        match self {
            ConfusionCell::TruePositive => "TP",
            ConfusionCell::FalseNegative => "FN",
            ConfusionCell::FalsePositive => "FP",
            ConfusionCell::TrueNegative => "TN",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ConfusionCell::TruePositive => "True Positive",
            ConfusionCell::FalseNegative => "False Negative",
            ConfusionCell::FalsePositive => "False Positive",
            ConfusionCell::TrueNegative => "True Negative",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ConfusionCounts {
    pub true_positive: usize,
    pub false_negative: usize,
    pub false_positive: usize,
    pub true_negative: usize,
}

impl ConfusionCounts {
    pub fn from_predictions(truth: &[u8], predicted: &[u8]) -> AnalysisResult<Self> {
        ensure_len("predictions", truth.len(), predicted.len())?;
        let mut counts = ConfusionCounts::default();
        for (&t, &p) in truth.iter().zip(predicted) {
            match (t != 0, p != 0) {
                (true, true) => counts.true_positive += 1,
                (true, false) => counts.false_negative += 1,
                (false, true) => counts.false_positive += 1,
                (false, false) => counts.true_negative += 1,
            }
        }
        Ok(counts)
    }

    /// Row-major flattening of the 2x2 matrix: `[tn, fp, fn, tp]`.
    pub fn ravel(&self) -> [usize; 4] {
        [
            self.true_negative,
            self.false_positive,
            self.false_negative,
            self.true_positive,
        ]
    }

    /// Presentation order: `tp, fn, fp, tn`.
    pub fn presentation(&self) -> [(ConfusionCell, usize); 4] {
        [
            (ConfusionCell::TruePositive, self.true_positive),
            (ConfusionCell::FalseNegative, self.false_negative),
            (ConfusionCell::FalsePositive, self.false_positive),
            (ConfusionCell::TrueNegative, self.true_negative),
        ]
    }

    pub fn total(&self) -> usize {
        self.ravel().iter().sum()
    }
}

/// Confusion counts on the test split, using the threshold rescaled into
/// the value range of `z`.
pub fn compute_confusion(
    model: &dyn DecisionFunction,
    test: &LabeledSplit,
    z: &[f64],
    threshold: f64,
) -> AnalysisResult<ConfusionCounts> {
    let scale = compute_scaled_threshold(z, threshold)?;
    let predicted = predict(model, test, scale.scaled)?;
    ConfusionCounts::from_predictions(test.labels(), &predicted)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-12;

    /// Scores each row by its first coordinate.
    struct FirstFeature;

    impl DecisionFunction for FirstFeature {
        fn decision_function(&self, features: &[[f64; 2]]) -> Vec<f64> {
            features.iter().map(|p| p[0]).collect()
        }
    }

    /// Returns one score too few.
    struct Truncating;

    impl DecisionFunction for Truncating {
        fn decision_function(&self, features: &[[f64; 2]]) -> Vec<f64> {
            vec![0.0; features.len().saturating_sub(1)]
        }
    }

    fn split(scores: &[f64], labels: &[u8]) -> LabeledSplit {
        LabeledSplit::new(scores.iter().map(|&s| [s, 0.0]).collect(), labels.to_vec()).unwrap()
    }

    #[test]
    fn scaled_threshold_concrete_grid() {
        let scale = compute_scaled_threshold(&[0.0, 1.0, 2.0, 3.0], 0.5).unwrap();
        assert!((scale.scaled - 1.5).abs() < EPS);
        assert!((scale.display_range - 1.5).abs() < EPS);
    }

    #[test]
    fn scaled_threshold_stays_in_range_and_scale_covers_grid() {
        let z = [-2.5, 0.3, 4.0, 1.25, -0.75];
        for i in 0..=20 {
            let t = i as f64 / 20.0;
            let s = compute_scaled_threshold(&z, t).unwrap();
            assert!(s.z_min - EPS <= s.scaled && s.scaled <= s.z_max + EPS);
            assert!(s.color_min() <= s.z_min + EPS);
            assert!(s.color_max() >= s.z_max - EPS);
        }
    }

    #[test]
    fn constant_grid_has_zero_range() {
        let scale = compute_scaled_threshold(&[2.0; 6], 0.3).unwrap();
        assert_eq!(scale.scaled, 2.0);
        assert_eq!(scale.display_range, 0.0);
        assert_eq!(scale.normalize(2.0), 0.5);
    }

    #[test]
    fn empty_grid_is_rejected() {
        let err = compute_scaled_threshold(&[], 0.5).unwrap_err();
        assert!(matches!(err, AnalysisError::EmptyInput(_)));
    }

    #[test]
    fn confusion_concrete_predictions() {
        let counts = ConfusionCounts::from_predictions(&[0, 0, 1, 1], &[0, 1, 1, 1]).unwrap();
        assert_eq!(
            counts,
            ConfusionCounts {
                true_positive: 2,
                false_negative: 0,
                false_positive: 1,
                true_negative: 1,
            }
        );
        assert_eq!(counts.ravel(), [1, 1, 0, 2]);
        let order: Vec<_> = counts.presentation().iter().map(|(c, n)| (c.abbreviation(), *n)).collect();
        assert_eq!(order, vec![("TP", 2), ("FN", 0), ("FP", 1), ("TN", 1)]);
    }

    #[test]
    fn confusion_total_matches_test_size_for_every_threshold() {
        let test = split(&[-1.0, -0.2, 0.1, 0.4, 0.9, 1.3], &[0, 0, 1, 0, 1, 1]);
        let z = [-1.0, 0.0, 1.0, 2.0];
        for i in 0..=10 {
            let counts = compute_confusion(&FirstFeature, &test, &z, i as f64 / 10.0).unwrap();
            assert_eq!(counts.total(), test.len());
        }
    }

    #[test]
    fn confusion_uses_rescaled_threshold() {
        // z spans [0, 10]; threshold 0.5 rescales to 5.0.
        let test = split(&[0.7, 6.0], &[1, 1]);
        let z = [0.0, 10.0];
        let counts = compute_confusion(&FirstFeature, &test, &z, 0.5).unwrap();
        assert_eq!(counts.true_positive, 1);
        assert_eq!(counts.false_negative, 1);
    }

    #[test]
    fn accuracy_compares_raw_scores_to_unscaled_threshold() {
        // Same data as above: against the raw 0.5 both scores count as class 1.
        let test = split(&[0.7, 6.0], &[1, 1]);
        let train = split(&[0.2, 0.7], &[0, 0]);
        let acc = compute_accuracies(&FirstFeature, &train, &test, 0.5).unwrap();
        assert!((acc.test - 1.0).abs() < EPS);
        assert!((acc.train - 0.5).abs() < EPS);
    }

    #[test]
    fn accuracy_rejects_short_score_vectors() {
        let s = split(&[0.1, 0.2], &[0, 1]);
        let err = compute_accuracies(&Truncating, &s, &s, 0.5).unwrap_err();
        assert!(matches!(err, AnalysisError::ShapeMismatch { expected: 2, actual: 1, .. }));
    }

    #[test]
    fn accuracy_rejects_empty_split() {
        let empty = LabeledSplit::default();
        let s = split(&[0.1], &[0]);
        let err = compute_accuracies(&FirstFeature, &s, &empty, 0.5).unwrap_err();
        assert!(matches!(err, AnalysisError::EmptyInput(_)));
    }
}
