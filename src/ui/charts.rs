use std::f32::consts::TAU;

use eframe::egui::{self, Align2, Color32, FontId, Pos2, Sense, Shape, Stroke, Ui, Vec2};
use egui_extras::{Column, TableBuilder};

use crate::analysis::describe::FrequencyTable;
use crate::analysis::scores::ConfusionCounts;
use crate::color;

// ---------------------------------------------------------------------------
// Confusion-matrix pie chart
// ---------------------------------------------------------------------------

/// Largest arc angle drawn as one convex polygon.
const MAX_ARC_STEP: f32 = 0.1;

/// Draw the confusion counts as a pie, slices in tp, fn, fp, tn order,
/// starting at twelve o'clock and running clockwise.
pub fn confusion_pie(ui: &mut Ui, counts: &ConfusionCounts, height: f32) {
    ui.strong("Confusion Matrix");

    let total = counts.total();
    if total == 0 {
        ui.label("No test samples.");
        return;
    }

    let size = Vec2::new(ui.available_width(), height);
    let (response, painter) = ui.allocate_painter(size, Sense::hover());
    let rect = response.rect;
    let radius = (rect.height().min(rect.width() * 0.5) * 0.45).max(1.0);
    let center = Pos2::new(rect.left() + radius + 8.0, rect.center().y);

    let mut start = -TAU / 4.0;
    for (cell, count) in counts.presentation() {
        if count == 0 {
            continue;
        }
        let sweep = TAU * count as f32 / total as f32;
        let fill = color::confusion_color(cell);

        // Split into thin convex wedges so slices wider than half a turn
        // still tessellate correctly.
        let n_parts = (sweep / MAX_ARC_STEP).ceil().max(1.0) as usize;
        let part = sweep / n_parts as f32;
        for i in 0..n_parts {
            let a0 = start + part * i as f32;
            let a1 = a0 + part;
            let points = vec![center, arc_point(center, radius, a0), arc_point(center, radius, a1)];
            painter.add(Shape::convex_polygon(points, fill, Stroke::NONE));
        }

        let mid = start + sweep / 2.0;
        let label_pos = arc_point(center, radius * 0.65, mid);
        painter.text(
            label_pos,
            Align2::CENTER_CENTER,
            format!("{}\n{}", cell.abbreviation(), count),
            FontId::proportional(13.0),
            Color32::WHITE,
        );
        start += sweep;
    }

    // Legend to the right of the pie.
    let mut y = center.y - 2.0 * 18.0;
    let legend_x = center.x + radius + 24.0;
    for (cell, count) in counts.presentation() {
        let swatch = egui::Rect::from_min_size(Pos2::new(legend_x, y), Vec2::splat(12.0));
        painter.rect_filled(swatch, 2.0, color::confusion_color(cell));
        let pct = 100.0 * count as f64 / total as f64;
        painter.text(
            Pos2::new(legend_x + 18.0, y + 6.0),
            Align2::LEFT_CENTER,
            format!("{} ({count}, {pct:.1}%)", cell.label()),
            FontId::proportional(12.0),
            ui.visuals().text_color(),
        );
        y += 18.0;
    }
}

fn arc_point(center: Pos2, radius: f32, angle: f32) -> Pos2 {
    Pos2::new(center.x + radius * angle.cos(), center.y + radius * angle.sin())
}

// ---------------------------------------------------------------------------
// Frequency table
// ---------------------------------------------------------------------------

/// Render the descriptive statistics, one row per statistic.
pub fn frequency_table(ui: &mut Ui, table: &FrequencyTable) {
    let n_subjects = table.columns.len().saturating_sub(1);

    egui::ScrollArea::horizontal()
        .id_salt("frequency_table_scroll")
        .show(ui, |ui: &mut Ui| {
            TableBuilder::new(ui)
                .striped(true)
                .column(Column::auto().at_least(80.0))
                .columns(Column::auto().at_least(70.0), n_subjects)
                .header(22.0, |mut header| {
                    for col in &table.columns {
                        header.col(|ui: &mut Ui| {
                            ui.strong(&col.name);
                        });
                    }
                })
                .body(|mut body| {
                    for row in &table.rows {
                        body.row(20.0, |mut tr| {
                            tr.col(|ui: &mut Ui| {
                                ui.label(&row.param);
                            });
                            for id in table.subject_ids() {
                                tr.col(|ui: &mut Ui| {
                                    let text = row.values.get(id).map_or_else(String::new, |v| format_stat(*v));
                                    ui.label(text);
                                });
                            }
                        });
                    }
                });
        });
}

/// Integers print without decimals, NaN as a dash.
fn format_stat(v: f64) -> String {
    if v.is_nan() {
        "–".to_string()
    } else if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{v:.0}")
    } else {
        format!("{v:.3}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_format() {
        assert_eq!(format_stat(4.0), "4");
        assert_eq!(format_stat(2.5), "2.500");
        assert_eq!(format_stat(f64::NAN), "–");
    }

    #[test]
    fn arc_starts_at_angle() {
        let p = arc_point(Pos2::new(10.0, 10.0), 5.0, 0.0);
        assert_eq!(p, Pos2::new(15.0, 10.0));
    }
}
