use serde::Serialize;

use crate::classifier::DecisionFunction;
use crate::error::{ensure_len, AnalysisError, AnalysisResult};

// ---------------------------------------------------------------------------
// GridBounds – rectangular extent of the feature space
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GridBounds {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl GridBounds {
    /// Extent of `features` padded by `margin` on every side.
    pub fn around(features: &[[f64; 2]], margin: f64) -> AnalysisResult<Self> {
        if features.is_empty() {
            return Err(AnalysisError::EmptyInput("no feature rows to bound"));
        }
        let mut b = GridBounds {
            x_min: f64::INFINITY,
            x_max: f64::NEG_INFINITY,
            y_min: f64::INFINITY,
            y_max: f64::NEG_INFINITY,
        };
        for p in features {
            b.x_min = b.x_min.min(p[0]);
            b.x_max = b.x_max.max(p[0]);
            b.y_min = b.y_min.min(p[1]);
            b.y_max = b.y_max.max(p[1]);
        }
        b.x_min -= margin;
        b.x_max += margin;
        b.y_min -= margin;
        b.y_max += margin;
        Ok(b)
    }
}

// ---------------------------------------------------------------------------
// ClassifierGrid – decision values sampled over a mesh
// ---------------------------------------------------------------------------

/// Upper bound on mesh points in one evaluation.
pub const MAX_MESH_POINTS: usize = 4_000_000;

/// Decision-function values over a rectangular mesh.
///
/// `z` is row-major: row `r` runs along `xs` at height `ys[r]`. The mesh
/// coordinates `xx`/`yy` are implied by the two axes, so the shape
/// invariant reduces to `z.len() == xs.len() * ys.len()`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassifierGrid {
    xs: Vec<f64>,
    ys: Vec<f64>,
    z: Vec<f64>,
    mesh_step: f64,
}

impl ClassifierGrid {
    pub fn new(xs: Vec<f64>, ys: Vec<f64>, z: Vec<f64>, mesh_step: f64) -> AnalysisResult<Self> {
        ensure_len("grid values", xs.len() * ys.len(), z.len())?;
        Ok(Self {
            xs,
            ys,
            z,
            mesh_step,
        })
    }

    /// Sample `model` at every mesh point of `bounds` spaced by `mesh_step`.
    pub fn evaluate(
        model: &dyn DecisionFunction,
        bounds: &GridBounds,
        mesh_step: f64,
    ) -> AnalysisResult<Self> {
        let points = axis_len(bounds.x_min, bounds.x_max, mesh_step)
            * axis_len(bounds.y_min, bounds.y_max, mesh_step);
        if points > MAX_MESH_POINTS as f64 {
            return Err(AnalysisError::MeshTooLarge {
                points,
                limit: MAX_MESH_POINTS,
            });
        }

        let xs = arange(bounds.x_min, bounds.x_max, mesh_step);
        let ys = arange(bounds.y_min, bounds.y_max, mesh_step);
        if xs.is_empty() || ys.is_empty() {
            return Err(AnalysisError::EmptyInput("mesh has no points"));
        }

        let mesh: Vec<[f64; 2]> = ys
            .iter()
            .flat_map(|&y| xs.iter().map(move |&x| [x, y]))
            .collect();
        let z = model.decision_function(&mesh);
        log::debug!("evaluated {}x{} mesh (step {mesh_step})", ys.len(), xs.len());
        Self::new(xs, ys, z, mesh_step)
    }

    pub fn xs(&self) -> &[f64] {
        &self.xs
    }

    pub fn ys(&self) -> &[f64] {
        &self.ys
    }

    /// All values, row-major.
    pub fn values(&self) -> &[f64] {
        &self.z
    }

    pub fn mesh_step(&self) -> f64 {
        self.mesh_step
    }

    pub fn n_rows(&self) -> usize {
        self.ys.len()
    }

    pub fn n_cols(&self) -> usize {
        self.xs.len()
    }

    pub fn at(&self, row: usize, col: usize) -> f64 {
        self.z[row * self.xs.len() + col]
    }

    /// Mesh x coordinate of a cell (the `xx` matrix).
    pub fn xx(&self, _row: usize, col: usize) -> f64 {
        self.xs[col]
    }

    /// Mesh y coordinate of a cell (the `yy` matrix).
    pub fn yy(&self, row: usize, _col: usize) -> f64 {
        self.ys[row]
    }
}

/// Number of samples `arange` yields, kept in `f64` so huge counts compare
/// without overflowing.
fn axis_len(start: f64, stop: f64, step: f64) -> f64 {
    if step.is_nan() || step <= 0.0 || stop <= start {
        return 0.0;
    }
    ((stop - start) / step).ceil()
}

/// `[start, stop)` in increments of `step`.
fn arange(start: f64, stop: f64, step: f64) -> Vec<f64> {
    let n = axis_len(start, stop, step) as usize;
    (0..n).map(|i| start + step * i as f64).collect()
}

// ---------------------------------------------------------------------------
// Threshold contour (marching squares)
// ---------------------------------------------------------------------------

pub type Segment = [[f64; 2]; 2];

/// Line segments approximating the `z == level` contour.
///
/// Each mesh cell contributes at most two segments. Saddle cells are
/// resolved with the cell-centre average.
pub fn threshold_contour(grid: &ClassifierGrid, level: f64) -> Vec<Segment> {
    let mut segments = Vec::new();
    if grid.n_rows() < 2 || grid.n_cols() < 2 {
        return segments;
    }

    for r in 0..grid.n_rows() - 1 {
        for c in 0..grid.n_cols() - 1 {
            let (x0, x1) = (grid.xs[c], grid.xs[c + 1]);
            let (y0, y1) = (grid.ys[r], grid.ys[r + 1]);
            let v00 = grid.at(r, c);
            let v01 = grid.at(r, c + 1);
            let v10 = grid.at(r + 1, c);
            let v11 = grid.at(r + 1, c + 1);

            // Edge crossings in fixed order: bottom, right, top, left.
            let edges = [
                crossing([x0, y0], v00, [x1, y0], v01, level),
                crossing([x1, y0], v01, [x1, y1], v11, level),
                crossing([x0, y1], v10, [x1, y1], v11, level),
                crossing([x0, y0], v00, [x0, y1], v10, level),
            ];
            let hits: Vec<[f64; 2]> = edges.iter().flatten().copied().collect();

            match hits.len() {
                2 => segments.push([hits[0], hits[1]]),
                4 => {
                    let [bottom, right, top, left] = [hits[0], hits[1], hits[2], hits[3]];
                    let centre = (v00 + v01 + v10 + v11) / 4.0;
                    if (centre > level) == (v00 > level) {
                        segments.push([bottom, right]);
                        segments.push([top, left]);
                    } else {
                        segments.push([bottom, left]);
                        segments.push([right, top]);
                    }
                }
                _ => {}
            }
        }
    }
    segments
}

fn crossing(pa: [f64; 2], a: f64, pb: [f64; 2], b: f64, level: f64) -> Option<[f64; 2]> {
    if (a > level) == (b > level) {
        return None;
    }
    let t = (level - a) / (b - a);
    Some([pa[0] + t * (pb[0] - pa[0]), pa[1] + t * (pb[1] - pa[1])])
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Scores the x coordinate.
    struct XScore;

    impl DecisionFunction for XScore {
        fn decision_function(&self, features: &[[f64; 2]]) -> Vec<f64> {
            features.iter().map(|p| p[0]).collect()
        }
    }

    #[test]
    fn grid_rejects_mismatched_values() {
        let err = ClassifierGrid::new(vec![0.0, 1.0], vec![0.0], vec![1.0], 1.0).unwrap_err();
        assert!(matches!(err, AnalysisError::ShapeMismatch { expected: 2, actual: 1, .. }));
    }

    #[test]
    fn evaluate_samples_half_open_mesh() {
        let bounds = GridBounds {
            x_min: 0.0,
            x_max: 1.0,
            y_min: 0.0,
            y_max: 0.5,
        };
        let grid = ClassifierGrid::evaluate(&XScore, &bounds, 0.25).unwrap();
        assert_eq!(grid.xs(), &[0.0, 0.25, 0.5, 0.75]);
        assert_eq!(grid.ys(), &[0.0, 0.25]);
        assert_eq!(grid.values().len(), 8);
        assert_eq!(grid.at(1, 2), 0.5);
        assert_eq!(grid.xx(1, 3), 0.75);
        assert_eq!(grid.yy(1, 3), 0.25);
    }

    #[test]
    fn evaluate_rejects_degenerate_bounds() {
        let bounds = GridBounds {
            x_min: 1.0,
            x_max: 1.0,
            y_min: 0.0,
            y_max: 1.0,
        };
        let err = ClassifierGrid::evaluate(&XScore, &bounds, 0.1).unwrap_err();
        assert!(matches!(err, AnalysisError::EmptyInput(_)));
    }

    #[test]
    fn tiny_mesh_step_is_rejected_before_allocating() {
        let bounds = GridBounds {
            x_min: -2.0,
            x_max: 3.0,
            y_min: -1.5,
            y_max: 2.0,
        };
        let err = ClassifierGrid::evaluate(&XScore, &bounds, 1e-300).unwrap_err();
        assert!(matches!(err, AnalysisError::MeshTooLarge { limit: MAX_MESH_POINTS, .. }));

        let err = ClassifierGrid::evaluate(&XScore, &bounds, 1e-3).unwrap_err();
        assert!(matches!(err, AnalysisError::MeshTooLarge { .. }));
        assert!(ClassifierGrid::evaluate(&XScore, &bounds, 0.01).is_ok());
    }

    #[test]
    fn bounds_pad_feature_extent() {
        let b = GridBounds::around(&[[0.0, 1.0], [2.0, -1.0]], 0.5).unwrap();
        assert_eq!(b, GridBounds { x_min: -0.5, x_max: 2.5, y_min: -1.5, y_max: 1.5 });
        assert!(GridBounds::around(&[], 0.5).is_err());
    }

    #[test]
    fn contour_of_linear_field_is_vertical_line() {
        let grid = ClassifierGrid::new(
            vec![0.0, 1.0, 2.0],
            vec![0.0, 1.0, 2.0],
            vec![0.0, 1.0, 2.0, 0.0, 1.0, 2.0, 0.0, 1.0, 2.0],
            1.0,
        )
        .unwrap();

        let segments = threshold_contour(&grid, 0.5);
        assert_eq!(segments.len(), 2);
        for seg in &segments {
            for p in seg {
                assert!((p[0] - 0.5).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn contour_misses_level_outside_range() {
        let grid = ClassifierGrid::new(vec![0.0, 1.0], vec![0.0, 1.0], vec![0.0; 4], 1.0).unwrap();
        assert!(threshold_contour(&grid, 0.5).is_empty());
    }

    #[test]
    fn saddle_cell_yields_two_segments() {
        let grid =
            ClassifierGrid::new(vec![0.0, 1.0], vec![0.0, 1.0], vec![1.0, 0.0, 0.0, 1.0], 1.0)
                .unwrap();
        assert_eq!(threshold_contour(&grid, 0.5).len(), 2);
    }
}
