use eframe::egui::{self, Color32, RichText};

use crate::api::PromptRecord;
use crate::localization::{translate, translate_count, translate_with};
use crate::ui_constants::card::META_ROUNDING;

/// "768×1024 • Seed: 42 • Model: sdxl.safetensors • 2 LoRA(s)"; empty when nothing is known.
pub fn quick_info(record: &PromptRecord) -> String {
    let mut info = Vec::new();
    if let Some((w, h)) = record.size() {
        info.push(format!("{w}×{h}"));
    }
    if let Some(seed) = record.seed {
        info.push(translate_with("card-seed", &[("seed", seed.to_string())]));
    }
    if let Some(model) = record.checkpoint_name() {
        info.push(translate_with("card-model", &[("model", model.to_string())]));
    }
    if !record.loras.is_empty() {
        info.push(translate_count("card-loras", record.loras.len() as u64));
    }
    info.join(" • ")
}

/// Label/value pairs of the expanded metadata box.
pub fn metadata_lines(record: &PromptRecord) -> Vec<(String, String)> {
    let mut lines = Vec::new();
    if let Some(checkpoint) = record.checkpoint.as_deref().filter(|c| !c.is_empty()) {
        lines.push((translate("meta-checkpoint"), checkpoint.to_string()));
    }
    if !record.loras.is_empty() {
        let loras = record
            .loras
            .iter()
            .map(|l| format!("{} ({:.2})", l.name, l.strength))
            .collect::<Vec<_>>()
            .join(", ");
        lines.push((translate("meta-loras"), loras));
    }
    if let Some((w, h)) = record.size() {
        lines.push((translate("meta-size"), format!("{w} × {h}")));
    }
    if let Some(seed) = record.seed {
        lines.push((translate("meta-seed"), seed.to_string()));
    }
    lines
}

/// Single-line summary under the preview.
pub fn draw_quick_info(ui: &mut egui::Ui, record: &PromptRecord) {
    let text = quick_info(record);
    if text.is_empty() {
        return;
    }
    ui.label(
        RichText::new(text)
            .small()
            .color(Color32::from_rgb(170, 170, 170)),
    );
}

pub fn draw_metadata_box(ui: &mut egui::Ui, record: &PromptRecord) {
    egui::Frame::none()
        .fill(Color32::from_rgba_premultiplied(28, 28, 28, 180))
        .rounding(egui::Rounding::same(META_ROUNDING))
        .inner_margin(egui::Margin::symmetric(8.0, 6.0))
        .show(ui, |ui| {
            let lines = metadata_lines(record);
            if lines.is_empty() {
                ui.label(RichText::new(translate("meta-none")).color(Color32::from_gray(0x66)));
                return;
            }
            for (label, value) in lines {
                ui.horizontal_wrapped(|ui| {
                    ui.label(RichText::new(label).color(Color32::from_rgb(0xff, 0xaa, 0x77)));
                    ui.label(value);
                });
            }
        });
}
