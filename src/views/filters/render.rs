use eframe::egui::{self, Layout, RichText};

use crate::app::list::{FilterChange, ListQuery};
use crate::localization::translate;
use crate::views::filters::items::{
    search_field::{search_field, SearchEvent},
    segmented_panel::segmented_panel,
};

/// Buttons pressed and filter edits made in the panel this frame.
#[derive(Debug, Default)]
pub struct FiltersOutcome {
    pub change: Option<FilterChange>,
    pub refresh: bool,
    pub export: bool,
    pub settings: bool,
    pub logs: bool,
}

/// Right-side filters panel. `search_input` is the uncommitted search text;
/// sort and favorites are read from the active query and reported as changes.
pub fn draw_filters_panel(
    ctx: &egui::Context,
    query: &ListQuery,
    search_input: &mut String,
    logs_label: &str,
) -> FiltersOutcome {
    let mut out = FiltersOutcome::default();
    egui::SidePanel::right("filters_panel")
        .frame(
            egui::Frame::none()
                .fill(egui::Color32::from_rgb(30, 30, 30))
                .inner_margin(10.0),
        )
        .resizable(false)
        .default_width(220.0)
        .show(ctx, |ui| {
            ui.label(RichText::new(translate("filters-title")).strong());
            ui.separator();

            ui.label(RichText::new(translate("filters-search-label")).weak());
            match search_field(ui, search_input) {
                Some(SearchEvent::Submit) => {
                    out.change = Some(FilterChange {
                        search_text: Some(search_input.trim().to_string()),
                        ..Default::default()
                    });
                }
                Some(SearchEvent::Clear) => {
                    out.change = Some(FilterChange {
                        search_text: Some(String::new()),
                        ..Default::default()
                    });
                }
                None => {}
            }

            ui.separator();

            let mut sort = query.sort_by;
            if segmented_panel(ui, "filters-sort", &mut sort) {
                out.change = Some(FilterChange {
                    sort_by: Some(sort),
                    ..out.change.take().unwrap_or_default()
                });
            }

            ui.separator();

            let mut favorites = query.favorites_only;
            if ui
                .checkbox(&mut favorites, translate("filters-favorites-only"))
                .changed()
            {
                out.change = Some(FilterChange {
                    favorites_only: Some(favorites),
                    ..out.change.take().unwrap_or_default()
                });
            }

            ui.separator();
            ui.horizontal(|ui| {
                out.refresh = ui.button(translate("filters-refresh")).clicked();
                out.export = ui.button(translate("filters-export")).clicked();
            });

            ui.add_space(8.0);
            ui.with_layout(Layout::bottom_up(egui::Align::LEFT), |ui| {
                out.logs = ui.button(logs_label).clicked();
                out.settings = ui.button(translate("settings-button")).clicked();
            });
        });
    out
}
