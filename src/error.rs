use thiserror::Error;

// ---------------------------------------------------------------------------
// Analysis errors – input-contract violations of the computational core
// ---------------------------------------------------------------------------

/// Errors raised by the score, contour and statistics computations.
///
/// All of them describe bad input; nothing here is transient, so callers
/// surface them instead of retrying.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    /// Two sequences that must line up have different lengths.
    #[error("shape mismatch in {what}: expected {expected} values, got {actual}")]
    ShapeMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    /// A grid, split or frame with nothing in it.
    #[error("empty input: {0}")]
    EmptyInput(&'static str),

    /// A class label outside `{0, 1}`.
    #[error("label {label} at row {row} is not binary (expected 0 or 1)")]
    InvalidLabel { row: usize, label: u8 },

    /// Only one class present, so rates like the ROC AUC are undefined.
    #[error("labels contain only class {0}; both classes are required")]
    DegenerateLabels(u8),

    /// Two subject columns share one id, so their statistics would collide.
    #[error("subject id '{0}' appears in more than one column")]
    DuplicateSubject(String),

    /// The requested mesh is too fine to evaluate.
    #[error("mesh of {points:.0} points exceeds the limit of {limit}")]
    MeshTooLarge { points: f64, limit: usize },
}

pub type AnalysisResult<T> = Result<T, AnalysisError>;

/// Check that `actual` matches `expected`, naming the offending input.
pub fn ensure_len(what: &'static str, expected: usize, actual: usize) -> AnalysisResult<()> {
    if expected != actual {
        return Err(AnalysisError::ShapeMismatch {
            what,
            expected,
            actual,
        });
    }
    Ok(())
}
