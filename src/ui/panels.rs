use std::path::PathBuf;

use eframe::egui::{self, Color32, DragValue, RichText, ScrollArea, Slider, Ui};

use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – model and data controls
// ---------------------------------------------------------------------------

/// Render the left control panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Controls");
    ui.separator();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            // ---- Threshold: only the report depends on it ----
            ui.strong("Threshold");
            if ui
                .add(Slider::new(&mut state.threshold, 0.0..=1.0).step_by(0.01))
                .changed()
            {
                state.refresh_report();
            }
            if let Some(report) = &state.report {
                ui.label(format!("scaled: {:.3}", report.scale.scaled));
            }
            if ui.small_button("Reset threshold").clicked() {
                state.reset_threshold();
                state.refresh_report();
            }
            ui.separator();

            // ---- Model ----
            ui.strong("Kernel width (gamma)");
            if ui
                .add(Slider::new(&mut state.gamma, 0.01..=100.0).logarithmic(true))
                .changed()
            {
                state.refit_model();
            }

            ui.strong("Mesh step");
            if ui
                .add(Slider::new(&mut state.mesh_step, 0.02..=0.5).logarithmic(true))
                .changed()
            {
                state.rebuild_grid();
            }
            ui.separator();

            // ---- Dataset: regenerated on demand ----
            egui::CollapsingHeader::new(RichText::new("Dataset").strong())
                .default_open(true)
                .show(ui, |ui: &mut Ui| {
                    ui.add(Slider::new(&mut state.moons.n_samples, 20..=1000).text("samples"));
                    ui.add(Slider::new(&mut state.moons.noise, 0.0..=1.0).text("noise"));
                    ui.add(
                        Slider::new(&mut state.split_params.test_fraction, 0.1..=0.9)
                            .text("test fraction"),
                    );
                    ui.horizontal(|ui: &mut Ui| {
                        ui.label("data seed");
                        ui.add(DragValue::new(&mut state.moons.seed));
                    });
                    ui.horizontal(|ui: &mut Ui| {
                        ui.label("split seed");
                        ui.add(DragValue::new(&mut state.split_params.seed));
                    });
                    if ui.button("Regenerate").clicked() {
                        state.regenerate_data();
                    }
                    ui.label(format!(
                        "{} train / {} test",
                        state.split.train.len(),
                        state.split.test.len()
                    ));
                });
            ui.separator();

            // ---- Subject frame ----
            ui.strong("Statistics data");
            match &state.frame_path {
                Some(path) => ui.label(path.display().to_string()),
                None => ui.label("No data file loaded."),
            };
            if let Some(frame) = &state.frame {
                ui.label(format!("{} subjects, {} rows", frame.len(), frame.n_rows()));
            }
            if !state.titles.is_empty() {
                ui.label(format!("{} variable titles", state.titles.len()));
            }
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open data…").clicked() {
                if let Some(path) = pick_data_file() {
                    state.load_frame(&path);
                }
                ui.close_menu();
            }
            if ui.button("Open variable titles…").clicked() {
                if let Some(path) = pick_csv("Open variable titles") {
                    state.load_titles(&path);
                }
                ui.close_menu();
            }
            ui.separator();
            if ui
                .add_enabled(state.table.is_some(), egui::Button::new("Export table…"))
                .clicked()
            {
                if let Some(path) = pick_json_target("frequency_table.json") {
                    if let Err(e) = state.export_table(&path) {
                        state.fail("Export failed", &e);
                    }
                }
                ui.close_menu();
            }
            if ui
                .add_enabled(state.report.is_some(), egui::Button::new("Export report…"))
                .clicked()
            {
                if let Some(path) = pick_json_target("classification_report.json") {
                    if let Err(e) = state.export_report(&path) {
                        state.fail("Export failed", &e);
                    }
                }
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(report) = &state.report {
            let auc = report
                .roc
                .as_ref()
                .map_or_else(|| "n/a".to_string(), |roc| format!("{:.3}", roc.auc));
            ui.label(format!(
                "train acc {:.3} · test acc {:.3} · AUC {auc}",
                report.accuracies.train, report.accuracies.test
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

fn pick_data_file() -> Option<PathBuf> {
    rfd::FileDialog::new()
        .set_title("Open subject data")
        .add_filter("Supported files", &["csv", "json", "parquet", "pq"])
        .add_filter("CSV", &["csv"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file()
}

fn pick_csv(title: &str) -> Option<PathBuf> {
    rfd::FileDialog::new()
        .set_title(title)
        .add_filter("CSV", &["csv"])
        .pick_file()
}

fn pick_json_target(default_name: &str) -> Option<PathBuf> {
    rfd::FileDialog::new()
        .set_title("Export as JSON")
        .set_file_name(default_name)
        .add_filter("JSON", &["json"])
        .save_file()
}
