#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")] // no console window in release
// Entry point: logger, environment, settings and localization, then the window.
// Everything else lives in the app module.

use eframe::{egui, egui_wgpu::WgpuConfiguration};

mod api;
mod app;
mod host;
mod localization;
mod logger;
mod tags;
mod types;
mod ui_constants;
mod views;

fn main() -> eframe::Result<()> {
    logger::init();
    match dotenvy::dotenv() {
        Ok(path) => log::info!("Loaded environment from {}", path.display()),
        Err(e) if e.not_found() => {}
        Err(e) => log::warn!("Ignoring .env: {e}"),
    }

    let store = app::settings::SettingsStore::from_env();
    let settings = store.current_or_default();
    if let Err(e) = localization::initialize_localization(settings.language.as_deref()) {
        log::error!("Localization initialization failed: {e}");
    }
    log::info!(
        "Prompt library at {}, settings file {}",
        settings.api_base_url,
        store.path().display()
    );

    let wgpu_options = WgpuConfiguration {
        present_mode: eframe::wgpu::PresentMode::AutoVsync,
        ..Default::default()
    };
    let native_options = eframe::NativeOptions {
        renderer: eframe::Renderer::Wgpu,
        hardware_acceleration: eframe::HardwareAcceleration::Preferred,
        wgpu_options,
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1100.0, 760.0])
            .with_min_inner_size([640.0, 420.0])
            .with_resizable(true),
        ..Default::default()
    };

    let res = eframe::run_native(
        localization::translate("app-window-title").as_str(),
        native_options,
        Box::new(move |cc| Box::new(app::PromptLibraryApp::new(&cc.egui_ctx, store))),
    );
    if let Err(ref e) = res {
        log::error!("eframe::run_native failed: {e}");
    }
    res
}
