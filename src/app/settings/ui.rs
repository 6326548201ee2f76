// Settings UI: egui viewport window editing a draft copy of the settings.

use eframe::egui;
use lazy_static::lazy_static;
use std::path::PathBuf;
use std::sync::RwLock;
use strum::IntoEnumIterator;

use super::store::{AppSettings, SettingsStore};
use crate::app::list::ResponseOrdering;
use crate::localization::{available_languages, translate};
use crate::types::{LocalizableName, SortBy};

lazy_static! {
    static ref SETTINGS_OPEN: RwLock<bool> = RwLock::new(false);
    // Staged values for Save/Cancel
    static ref DRAFT: RwLock<Option<Draft>> = RwLock::new(None);
}

#[derive(Clone)]
struct Draft {
    settings: AppSettings,
    document_path: String,
    auto_refresh_on: bool,
    auto_refresh_secs: u64,
    error: Option<String>,
}

impl Draft {
    fn from_settings(settings: AppSettings) -> Self {
        Self {
            document_path: settings.document_path.to_string_lossy().to_string(),
            auto_refresh_on: settings.auto_refresh_secs.is_some(),
            auto_refresh_secs: settings.auto_refresh_secs.unwrap_or(30),
            settings,
            error: None,
        }
    }

    fn into_settings(self) -> AppSettings {
        let mut settings = self.settings;
        settings.document_path = PathBuf::from(self.document_path.trim());
        settings.auto_refresh_secs = self.auto_refresh_on.then_some(self.auto_refresh_secs.max(1));
        settings.page_size = settings.page_size.max(1);
        settings.api_base_url = settings.api_base_url.trim().to_string();
        settings
    }
}

/// Opens the window on a fresh read of the settings file.
pub fn open_settings(store: &SettingsStore) {
    store.invalidate();
    let draft = Draft::from_settings(store.current_or_default());
    if let Ok(mut d) = DRAFT.write() {
        *d = Some(draft);
    }
    if let Ok(mut open) = SETTINGS_OPEN.write() {
        *open = true;
    }
}

fn close() {
    if let Ok(mut open) = SETTINGS_OPEN.write() {
        *open = false;
    }
    if let Ok(mut d) = DRAFT.write() {
        *d = None;
    }
}

fn language_label(code: Option<&str>) -> String {
    match code {
        None => translate("language-auto"),
        Some(code) => translate(&format!("language-{code}")),
    }
}

fn draw_form(ui: &mut egui::Ui, draft: &mut Draft) {
    let s = &mut draft.settings;
    egui::Grid::new("settings_grid")
        .num_columns(2)
        .spacing([12.0, 8.0])
        .show(ui, |ui| {
            ui.label(translate("settings-api-url"));
            ui.add(egui::TextEdit::singleline(&mut s.api_base_url).desired_width(320.0));
            ui.end_row();

            ui.label(translate("settings-page-size"));
            ui.add(egui::DragValue::new(&mut s.page_size).clamp_range(1..=200));
            ui.end_row();

            ui.label(translate("settings-default-sort"));
            egui::ComboBox::from_id_source("settings_default_sort")
                .selected_text(s.default_sort.localized_name())
                .show_ui(ui, |ui| {
                    for sort in SortBy::iter() {
                        let name = sort.localized_name();
                        ui.selectable_value(&mut s.default_sort, sort, name);
                    }
                });
            ui.end_row();

            ui.label(translate("settings-wheel-sensitivity"));
            ui.add(
                egui::DragValue::new(&mut s.wheel_sensitivity)
                    .clamp_range(0.001..=1.0)
                    .speed(0.001)
                    .fixed_decimals(3),
            );
            ui.end_row();

            ui.label(translate("settings-ordering"));
            egui::ComboBox::from_id_source("settings_ordering")
                .selected_text(s.response_ordering.localized_name())
                .show_ui(ui, |ui| {
                    for ordering in ResponseOrdering::iter() {
                        let name = ordering.localized_name();
                        ui.selectable_value(&mut s.response_ordering, ordering, name);
                    }
                });
            ui.end_row();

            ui.label(translate("settings-auto-refresh"));
            ui.horizontal(|ui| {
                ui.checkbox(&mut draft.auto_refresh_on, "");
                ui.add_enabled(
                    draft.auto_refresh_on,
                    egui::DragValue::new(&mut draft.auto_refresh_secs)
                        .clamp_range(1..=3600)
                        .suffix(" s"),
                );
            });
            ui.end_row();

            ui.label(translate("settings-document-path"));
            ui.add(egui::TextEdit::singleline(&mut draft.document_path).desired_width(320.0));
            ui.end_row();

            ui.label(translate("settings-language"));
            egui::ComboBox::from_id_source("settings_language")
                .selected_text(language_label(s.language.as_deref()))
                .show_ui(ui, |ui| {
                    ui.selectable_value(&mut s.language, None, language_label(None));
                    for code in available_languages() {
                        let label = language_label(Some(&code));
                        ui.selectable_value(&mut s.language, Some(code), label);
                    }
                });
            ui.end_row();
        });

    ui.add_space(8.0);
    ui.checkbox(&mut s.allow_strength_adjustment, translate("settings-allow-strength"));
    ui.checkbox(&mut s.allow_editing, translate("settings-allow-editing"));
    ui.checkbox(&mut s.default_active, translate("settings-default-active"));
}

/// Draws the settings window when open. Returns the new settings after a successful save.
pub fn draw_settings_viewport(ctx: &egui::Context, store: &SettingsStore) -> Option<AppSettings> {
    if !SETTINGS_OPEN.read().map(|open| *open).unwrap_or(false) {
        return None;
    }
    let mut draft = DRAFT.read().ok().and_then(|d| d.clone())?;
    let mut saved: Option<AppSettings> = None;
    let mut closing = false;

    let viewport_id = egui::ViewportId::from_hash_of("settings_window");
    ctx.show_viewport_immediate(
        viewport_id,
        egui::ViewportBuilder::default()
            .with_title(translate("settings-title"))
            .with_inner_size([560.0, 420.0])
            .with_resizable(true),
        |ctx, _class| {
            egui::CentralPanel::default().show(ctx, |ui| {
                draw_form(ui, &mut draft);

                if let Some(err) = &draft.error {
                    ui.add_space(6.0);
                    ui.colored_label(egui::Color32::RED, err);
                }

                ui.add_space(8.0);
                ui.separator();
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.button(translate("save")).clicked() {
                        let settings = draft.clone().into_settings();
                        match store.save(&settings) {
                            Ok(()) => {
                                saved = Some(settings);
                                closing = true;
                            }
                            Err(e) => {
                                log::error!("Failed to save settings: {e}");
                                draft.error = Some(e.to_string());
                            }
                        }
                    }
                    if ui.button(translate("cancel")).clicked() {
                        closing = true;
                    }
                });
            });

            if ctx.input(|i| i.viewport().close_requested()) {
                closing = true;
            }
        },
    );

    if closing {
        close();
        ctx.send_viewport_cmd_to(viewport_id, egui::ViewportCommand::Close);
    } else if let Ok(mut d) = DRAFT.write() {
        *d = Some(draft);
    }
    saved
}
