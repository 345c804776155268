use eframe::egui::{self, Color32, ColorImage, TextureHandle, TextureOptions, Ui};
use egui_plot::{
    BoxElem, BoxPlot, BoxSpread, Legend, Line, MarkerShape, Plot, PlotImage, PlotPoint, PlotPoints,
    Points,
};

use crate::analysis::describe::FrequencyTable;
use crate::analysis::grid::ClassifierGrid;
use crate::analysis::roc::RocCurve;
use crate::analysis::scores::ThresholdScale;
use crate::color;
use crate::data::model::LabeledSplit;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Decision contour (central panel)
// ---------------------------------------------------------------------------

/// Contour texture cached across frames, keyed by the state revision.
#[derive(Default)]
pub struct ContourCache {
    revision: Option<u64>,
    texture: Option<TextureHandle>,
}

/// Rasterise the grid: one pixel per mesh point, top row = highest y.
pub fn contour_image(grid: &ClassifierGrid, scale: &ThresholdScale) -> ColorImage {
    let (w, h) = (grid.n_cols(), grid.n_rows());
    let mut rgba = Vec::with_capacity(w * h * 4);
    for row in (0..h).rev() {
        for col in 0..w {
            let c = color::diverging(scale.normalize(grid.at(row, col)));
            rgba.extend_from_slice(&[c.r(), c.g(), c.b(), 255]);
        }
    }
    ColorImage::from_rgba_unmultiplied([w, h], &rgba)
}

/// Render the decision-boundary plot with train/test points.
pub fn decision_plot(ui: &mut Ui, state: &AppState, cache: &mut ContourCache, height: f32) {
    let (Some(grid), Some(report)) = (&state.grid, &state.report) else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("No decision surface available");
        });
        return;
    };

    if cache.revision != Some(state.revision) || cache.texture.is_none() {
        let image = contour_image(grid, &report.scale);
        cache.texture = Some(ui.ctx().load_texture("decision_contour", image, TextureOptions::LINEAR));
        cache.revision = Some(state.revision);
    }
    let Some(texture) = &cache.texture else {
        return;
    };

    let step = grid.mesh_step();
    let width = grid.n_cols() as f64 * step;
    let height_units = grid.n_rows() as f64 * step;
    let center = PlotPoint::new(
        grid.xs()[0] - step / 2.0 + width / 2.0,
        grid.ys()[0] - step / 2.0 + height_units / 2.0,
    );
    let threshold_name = format!("Threshold ({:.3})", report.scale.scaled);

    Plot::new("decision_plot")
        .legend(Legend::default().position(egui_plot::Corner::LeftBottom))
        .height(height)
        .data_aspect(1.0)
        .show_axes(false)
        .show_grid(false)
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            plot_ui.image(
                PlotImage::new(
                    texture.id(),
                    center,
                    egui::vec2(width as f32, height_units as f32),
                )
                .tint(color::with_opacity(Color32::WHITE, 0.9)),
            );

            for seg in &report.contour {
                let line = Line::new(PlotPoints::from(vec![seg[0], seg[1]]))
                    .name(&threshold_name)
                    .color(color::THRESHOLD_LINE)
                    .width(2.0);
                plot_ui.line(line);
            }

            let train_name = format!("Training Data (accuracy={:.3})", report.accuracies.train);
            let test_name = format!("Test Data (accuracy={:.3})", report.accuracies.test);
            for label in [0u8, 1] {
                plot_ui.points(class_points(&state.split.train, label, &train_name, MarkerShape::Circle));
                plot_ui.points(class_points(&state.split.test, label, &test_name, MarkerShape::Up));
            }
        });
}

fn class_points(split: &LabeledSplit, label: u8, name: &str, shape: MarkerShape) -> Points<'static> {
    let pts: PlotPoints = split
        .features()
        .iter()
        .zip(split.labels())
        .filter(|&(_, &l)| l == label)
        .map(|(x, _)| *x)
        .collect();
    Points::new(pts)
        .name(name)
        .shape(shape)
        .radius(5.0)
        .filled(true)
        .color(color::class_color(label))
}

// ---------------------------------------------------------------------------
// ROC curve
// ---------------------------------------------------------------------------

pub fn roc_plot(ui: &mut Ui, roc: &RocCurve, height: f32) {
    ui.strong(format!("ROC Curve (AUC = {:.3})", roc.auc));

    let points: PlotPoints = roc.points.iter().map(|p| [p.fpr, p.tpr]).collect();

    Plot::new("roc_plot")
        .legend(Legend::default().position(egui_plot::Corner::LeftTop))
        .height(height)
        .x_axis_label("False Positive Rate")
        .y_axis_label("True Positive Rate")
        .include_x(0.0)
        .include_x(1.0)
        .include_y(0.0)
        .include_y(1.0)
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            plot_ui.line(Line::new(points).name("Test Data").width(2.0));
        });
}

// ---------------------------------------------------------------------------
// Distribution box plot
// ---------------------------------------------------------------------------

/// One box per subject built from its quartiles; subjects without values
/// are left out.
pub fn distribution_plot(ui: &mut Ui, table: &FrequencyTable, height: f32) {
    let palette = color::generate_palette(table.descriptions.len());
    let names: Vec<&str> = table.columns.iter().skip(1).map(|c| c.name.as_str()).collect();

    let boxes: Vec<BoxElem> = table
        .descriptions
        .iter()
        .enumerate()
        .filter(|(_, (_, d))| d.count > 0)
        .map(|(i, (_, d))| {
            let name = names.get(i).copied().unwrap_or("");
            BoxElem::new(i as f64, BoxSpread::new(d.min, d.q25, d.q50, d.q75, d.max))
                .name(name)
                .fill(color::with_opacity(palette[i], 0.4))
                .stroke(egui::Stroke::new(1.5, palette[i]))
        })
        .collect();

    Plot::new("distribution_plot")
        .height(height)
        .show_x(false)
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            plot_ui.box_plot(BoxPlot::new(boxes));
        });
}
