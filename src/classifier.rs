use crate::data::model::LabeledSplit;

// ---------------------------------------------------------------------------
// Decision-function capability
// ---------------------------------------------------------------------------

/// A fitted binary classifier that exposes raw real-valued scores.
///
/// Higher scores lean towards class 1. Implementations must return exactly
/// one score per input row, in input order.
pub trait DecisionFunction {
    fn decision_function(&self, features: &[[f64; 2]]) -> Vec<f64>;
}

// ---------------------------------------------------------------------------
// KernelScorer – minimal stand-in for an externally trained SVM
// ---------------------------------------------------------------------------

/// RBF kernel scorer: mean kernel similarity to the class-1 training points
/// minus mean similarity to the class-0 points.
///
/// Scores lie in `[-1, 1]`. This is not a margin-maximising SVM; it only
/// gives the dashboard a decision surface with the same shape of output.
#[derive(Debug, Clone)]
pub struct KernelScorer {
    positives: Vec<[f64; 2]>,
    negatives: Vec<[f64; 2]>,
    gamma: f64,
}

impl KernelScorer {
    /// "Fit" by memorising the training split.
    pub fn fit(train: &LabeledSplit, gamma: f64) -> Self {
        let mut positives = Vec::new();
        let mut negatives = Vec::new();
        for (x, &y) in train.features().iter().zip(train.labels()) {
            if y == 1 {
                positives.push(*x);
            } else {
                negatives.push(*x);
            }
        }
        log::debug!(
            "kernel scorer fitted on {} positives / {} negatives (gamma={gamma})",
            positives.len(),
            negatives.len()
        );
        KernelScorer {
            positives,
            negatives,
            gamma,
        }
    }

    fn mean_similarity(&self, points: &[[f64; 2]], x: &[f64; 2]) -> f64 {
        if points.is_empty() {
            return 0.0;
        }
        let sum: f64 = points
            .iter()
            .map(|p| {
                let d2 = (p[0] - x[0]).powi(2) + (p[1] - x[1]).powi(2);
                (-self.gamma * d2).exp()
            })
            .sum();
        sum / points.len() as f64
    }
}

impl DecisionFunction for KernelScorer {
    fn decision_function(&self, features: &[[f64; 2]]) -> Vec<f64> {
        features
            .iter()
            .map(|x| self.mean_similarity(&self.positives, x) - self.mean_similarity(&self.negatives, x))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split() -> LabeledSplit {
        LabeledSplit::new(vec![[0.0, 0.0], [0.1, 0.0], [3.0, 3.0], [3.1, 3.0]], vec![0, 0, 1, 1])
            .unwrap()
    }

    #[test]
    fn scores_follow_class_proximity() {
        let model = KernelScorer::fit(&split(), 1.0);
        let scores = model.decision_function(&[[0.0, 0.0], [3.0, 3.0]]);
        assert_eq!(scores.len(), 2);
        assert!(scores[0] < 0.0);
        assert!(scores[1] > 0.0);
    }

    #[test]
    fn scores_are_bounded() {
        let model = KernelScorer::fit(&split(), 0.5);
        for s in model.decision_function(&[[-5.0, 2.0], [1.5, 1.5], [3.05, 3.0]]) {
            assert!((-1.0..=1.0).contains(&s));
        }
    }

    #[test]
    fn single_class_training_still_scores() {
        let train = LabeledSplit::new(vec![[1.0, 1.0]], vec![1]).unwrap();
        let model = KernelScorer::fit(&train, 1.0);
        let scores = model.decision_function(&[[1.0, 1.0]]);
        assert!((scores[0] - 1.0).abs() < 1e-12);
    }
}
