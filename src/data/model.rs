use std::collections::BTreeMap;
use std::f64::consts::PI;

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::error::{ensure_len, AnalysisError, AnalysisResult};

// ---------------------------------------------------------------------------
// LabeledSplit – feature rows with binary labels
// ---------------------------------------------------------------------------

/// One partition (train or test) of a 2-D binary classification dataset.
#[derive(Debug, Clone, Default)]
pub struct LabeledSplit {
    features: Vec<[f64; 2]>,
    labels: Vec<u8>,
}

impl LabeledSplit {
    /// Pair features with labels. Labels must be 0 or 1.
    pub fn new(features: Vec<[f64; 2]>, labels: Vec<u8>) -> AnalysisResult<Self> {
        ensure_len("split labels", features.len(), labels.len())?;
        if let Some((row, &label)) = labels.iter().enumerate().find(|&(_, &l)| l > 1) {
            return Err(AnalysisError::InvalidLabel { row, label });
        }
        Ok(LabeledSplit { features, labels })
    }

    pub fn features(&self) -> &[[f64; 2]] {
        &self.features
    }

    pub fn labels(&self) -> &[u8] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    fn select(&self, indices: &[usize]) -> Self {
        LabeledSplit {
            features: indices.iter().map(|&i| self.features[i]).collect(),
            labels: indices.iter().map(|&i| self.labels[i]).collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Two-moons synthetic dataset
// ---------------------------------------------------------------------------

/// Parameters of the two interleaving half-circles dataset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MoonsParams {
    pub n_samples: usize,
    /// Standard deviation of the Gaussian noise added to every coordinate.
    pub noise: f64,
    pub seed: u64,
}

impl Default for MoonsParams {
    fn default() -> Self {
        Self {
            n_samples: 200,
            noise: 0.6,
            seed: 0,
        }
    }
}

/// Generate the two-moons dataset.
///
/// The outer moon (label 0) gets `n / 2` points, the inner moon (label 1)
/// the rest. Rows are shuffled before noise is added, so the output is a
/// deterministic function of `params`.
pub fn make_moons(params: &MoonsParams) -> LabeledSplit {
    let n_out = params.n_samples / 2;
    let n_in = params.n_samples - n_out;

    let mut features = Vec::with_capacity(params.n_samples);
    let mut labels = Vec::with_capacity(params.n_samples);

    for t in linspace(0.0, PI, n_out) {
        features.push([t.cos(), t.sin()]);
        labels.push(0);
    }
    for t in linspace(0.0, PI, n_in) {
        features.push([1.0 - t.cos(), 1.0 - t.sin() - 0.5]);
        labels.push(1);
    }

    let mut rng = ChaCha8Rng::seed_from_u64(params.seed);
    let mut order: Vec<usize> = (0..params.n_samples).collect();
    order.shuffle(&mut rng);

    let mut split = LabeledSplit { features, labels }.select(&order);
    if params.noise > 0.0 {
        for x in &mut split.features {
            x[0] += gauss(&mut rng, params.noise);
            x[1] += gauss(&mut rng, params.noise);
        }
    }
    split
}

fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            (0..n).map(|i| start + step * i as f64).collect()
        }
    }
}

/// Box-Muller transform for a zero-mean normal sample.
pub fn gauss(rng: &mut impl Rng, std_dev: f64) -> f64 {
    let u1: f64 = rng.gen::<f64>().max(1e-15);
    let u2: f64 = rng.gen();
    std_dev * (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
}

// ---------------------------------------------------------------------------
// Train / test split
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitParams {
    /// Fraction of rows assigned to the test partition, in `(0, 1)`.
    pub test_fraction: f64,
    pub seed: u64,
}

impl Default for SplitParams {
    fn default() -> Self {
        Self {
            test_fraction: 0.4,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TrainTestSplit {
    pub train: LabeledSplit,
    pub test: LabeledSplit,
}

/// Shuffle rows and cut off `ceil(n * test_fraction)` of them as the test set.
pub fn train_test_split(data: &LabeledSplit, params: &SplitParams) -> TrainTestSplit {
    let n = data.len();
    let fraction = params.test_fraction.clamp(0.0, 1.0);
    let n_test = ((n as f64) * fraction).ceil() as usize;

    let mut order: Vec<usize> = (0..n).collect();
    order.shuffle(&mut ChaCha8Rng::seed_from_u64(params.seed));
    let (test_idx, train_idx) = order.split_at(n_test.min(n));

    TrainTestSplit {
        train: data.select(train_idx),
        test: data.select(test_idx),
    }
}

// ---------------------------------------------------------------------------
// SubjectFrame – subject-keyed numeric series
// ---------------------------------------------------------------------------

/// One numeric column of the subject data frame. `None` marks a missing cell.
#[derive(Debug, Clone, PartialEq)]
pub struct SubjectSeries {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

impl SubjectSeries {
    pub fn new(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// Build a series without missing values.
    pub fn from_values(name: impl Into<String>, values: &[f64]) -> Self {
        Self::new(name, values.iter().copied().map(Some).collect())
    }

    /// Present values, skipping `None` and NaN.
    pub fn present(&self) -> impl Iterator<Item = f64> + '_ {
        self.values.iter().filter_map(|v| v.filter(|x| !x.is_nan()))
    }
}

/// Ordered set of subject series. Column order is preserved from the source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubjectFrame {
    pub columns: Vec<SubjectSeries>,
}

impl SubjectFrame {
    pub fn new(columns: Vec<SubjectSeries>) -> Self {
        Self { columns }
    }

    pub fn subject_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    /// Longest column length.
    pub fn n_rows(&self) -> usize {
        self.columns.iter().map(|c| c.values.len()).max().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

// ---------------------------------------------------------------------------
// VariableTitles – display names for subject columns
// ---------------------------------------------------------------------------

/// Maps a subject id to a human-readable title.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VariableTitles {
    titles: BTreeMap<String, String>,
}

impl VariableTitles {
    pub fn insert(&mut self, id: impl Into<String>, title: impl Into<String>) {
        self.titles.insert(id.into(), title.into());
    }

    pub fn get(&self, id: &str) -> Option<&str> {
        self.titles.get(id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.titles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.titles.is_empty()
    }
}
