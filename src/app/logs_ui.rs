// Logs viewport: separate OS window listing the in-app log buffer.

use eframe::egui;
use lazy_static::lazy_static;
use log::Level;
use std::sync::RwLock;

use crate::localization::{translate, translate_with};

lazy_static! {
    static ref LOGS_OPEN: RwLock<bool> = RwLock::new(false);
    static ref AUTOSCROLL: RwLock<bool> = RwLock::new(true);
}

pub fn open_logs() {
    if let Ok(mut v) = LOGS_OPEN.write() {
        *v = true;
    }
}

pub fn is_open() -> bool {
    LOGS_OPEN.read().map(|g| *g).unwrap_or(false)
}

pub fn draw_logs_viewport(ctx: &egui::Context) {
    if !is_open() {
        return;
    }

    // Deferred viewports cannot reach the main thread's localization state.
    let labels = Labels {
        clear: translate("logs-clear"),
        copy: translate("logs-copy"),
        autoscroll: translate("logs-autoscroll"),
    };
    let title = translate("logs-title");

    ctx.show_viewport_deferred(
        egui::ViewportId::from_hash_of("logs_window"),
        egui::ViewportBuilder::default()
            .with_title(title)
            .with_inner_size([800.0, 500.0])
            .with_resizable(true),
        move |ctx, _class| {
            if ctx.input(|i| i.viewport().close_requested()) {
                if let Ok(mut v) = LOGS_OPEN.write() {
                    *v = false;
                }
                ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                return;
            }
            egui::CentralPanel::default().show(ctx, |ui| {
                draw_toolbar(ui, &labels);
                ui.separator();
                draw_lines(ui);
            });
        },
    );
}

struct Labels {
    clear: String,
    copy: String,
    autoscroll: String,
}

fn draw_toolbar(ui: &mut egui::Ui, labels: &Labels) {
    ui.horizontal(|ui| {
        if ui.button(labels.clear.as_str()).clicked() {
            crate::logger::clear();
        }
        if ui.button(labels.copy.as_str()).clicked() {
            let text = crate::logger::all_lines().join("\n");
            ui.output_mut(|o| o.copied_text = text);
        }
        let mut autoscroll = AUTOSCROLL.read().map(|g| *g).unwrap_or(true);
        if ui.checkbox(&mut autoscroll, labels.autoscroll.as_str()).changed() {
            if let Ok(mut w) = AUTOSCROLL.write() {
                *w = autoscroll;
            }
        }
        ui.separator();
        ui.label(format!("{}", crate::logger::len()));
    });
}

fn draw_lines(ui: &mut egui::Ui) {
    let stick = AUTOSCROLL.read().map(|g| *g).unwrap_or(true);
    let scroll = egui::ScrollArea::vertical()
        .auto_shrink([false, false])
        .stick_to_bottom(stick);

    let total = crate::logger::len();
    let row_height = ui.text_style_height(&egui::TextStyle::Monospace) + 2.0;
    scroll.show_rows(ui, row_height, total, |ui, row_range| {
        let mut job = egui::text::LayoutJob::default();
        crate::logger::for_each_range(row_range.start, row_range.end, |e| {
            let fmt = egui::TextFormat {
                color: color_for_level(e.level),
                font_id: egui::FontId::monospace(12.0),
                ..Default::default()
            };
            job.append(&format!("{}\n", e.line()), 0.0, fmt);
        });
        ui.label(job);
    });
}

/// Line count label for the top bar button.
pub fn button_label() -> String {
    translate_with("logs-button", &[("count", crate::logger::len().to_string())])
}

fn color_for_level(level: Level) -> egui::Color32 {
    match level {
        Level::Error => egui::Color32::from_rgb(220, 80, 80),
        Level::Warn => egui::Color32::from_rgb(235, 200, 80),
        Level::Info => egui::Color32::from_rgb(200, 200, 200),
        Level::Debug => egui::Color32::from_rgb(120, 180, 255),
        Level::Trace => egui::Color32::from_rgb(160, 160, 160),
    }
}
