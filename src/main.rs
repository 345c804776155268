use eframe::egui;
use svm_dashboard::app::SvmDashboardApp;
use svm_dashboard::config::AppConfig;

fn main() -> eframe::Result {
    env_logger::init();

    let config = match AppConfig::locate(std::env::args().skip(1)) {
        Some(path) => AppConfig::from_file(&path).unwrap_or_else(|e| {
            log::error!("{e:#}; falling back to defaults");
            AppConfig::default()
        }),
        None => AppConfig::default(),
    };
    log::info!("starting with {config:?}");

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 900.0])
            .with_min_inner_size([800.0, 600.0]),
        ..Default::default()
    };

    eframe::run_native(
        "SVM Dashboard – Decision Boundary Explorer",
        options,
        Box::new(move |_cc| Ok(Box::new(SvmDashboardApp::new(&config)))),
    )
}
