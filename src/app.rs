use eframe::egui::{self, Ui};

use crate::config::AppConfig;
use crate::state::AppState;
use crate::ui::plot::ContourCache;
use crate::ui::{charts, panels, plot};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct SvmDashboardApp {
    pub state: AppState,
    contour: ContourCache,
}

impl SvmDashboardApp {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            state: AppState::new(config),
            contour: ContourCache::default(),
        }
    }
}

impl eframe::App for SvmDashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: controls ----
        egui::SidePanel::left("control_panel")
            .default_width(240.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Bottom panel: statistics table + distribution ----
        egui::TopBottomPanel::bottom("statistics_panel")
            .resizable(true)
            .default_height(260.0)
            .show(ctx, |ui| {
                statistics_section(ui, &self.state);
            });

        // ---- Central panel: decision surface, ROC, confusion ----
        egui::CentralPanel::default().show(ctx, |ui| {
            let height = ui.available_height();
            ui.columns(2, |cols: &mut [Ui]| {
                plot::decision_plot(&mut cols[0], &self.state, &mut self.contour, height);
                match &self.state.report {
                    Some(report) => {
                        match &report.roc {
                            Some(roc) => plot::roc_plot(&mut cols[1], roc, height * 0.45),
                            None => {
                                cols[1].strong("ROC Curve");
                                cols[1].label("Undefined: the test split holds a single class.");
                            }
                        }
                        cols[1].separator();
                        charts::confusion_pie(&mut cols[1], &report.confusion, height * 0.4);
                    }
                    None => {
                        cols[1].label("No classification report.");
                    }
                }
            });
        });
    }
}

fn statistics_section(ui: &mut Ui, state: &AppState) {
    let Some(table) = &state.table else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.label("Open a data file to see descriptive statistics  (File → Open data…)");
        });
        return;
    };
    let height = ui.available_height();
    ui.columns(2, |cols: &mut [Ui]| {
        charts::frequency_table(&mut cols[0], table);
        plot::distribution_plot(&mut cols[1], table, height);
    });
}
