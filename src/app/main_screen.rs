use eframe::egui::{self, RichText};

use super::{logs_ui, settings, PromptLibraryApp};
use crate::host::{LinkOpener, SystemBrowser};
use crate::localization::translate;
use crate::ui_constants::spacing;
use crate::views::cards::{mark_copied, prompt_card, CardAction};
use crate::views::filters::draw_filters_panel;
use crate::views::pagination::draw_pagination;

pub(super) fn update_library(app: &mut PromptLibraryApp, ctx: &egui::Context) {
    let logs_label = logs_ui::button_label();
    let filters = draw_filters_panel(ctx, app.list.query(), &mut app.search_input, &logs_label);
    if let Some(change) = filters.change {
        app.list.set_filter(change);
    }
    if filters.refresh {
        app.list.refresh();
    }
    if filters.export {
        app.list.export_all();
    }
    if filters.settings {
        settings::open_settings(&app.store);
        ctx.request_repaint();
    }
    if filters.logs {
        logs_ui::open_logs();
        ctx.request_repaint();
    }

    if let Some(confirmation) = app.delete_prompt.show(ctx) {
        app.list.delete_record(confirmation);
    }

    let mut actions: Vec<CardAction> = Vec::new();
    let mut page_delta: Option<i64> = None;

    egui::CentralPanel::default().show(ctx, |ui| {
        let view = app.list.render();

        ui.horizontal(|ui| {
            ui.heading(translate("library-title"));
            ui.label(RichText::new(view.count_label()).weak());
        });
        ui.separator();

        egui::ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                if let Some(message) = &view.empty_message {
                    ui.add_space(spacing::XLARGE);
                    ui.vertical_centered(|ui| {
                        if view.loading {
                            ui.add(egui::Spinner::new());
                        }
                        ui.label(RichText::new(message).weak());
                    });
                }
                for card in &view.cards {
                    let thumbnail = match (card.expanded, card.record.thumbnail_filename()) {
                        (true, Some(name)) => Some(app.thumbnails.get(ctx, name)),
                        _ => None,
                    };
                    if let Some(action) = prompt_card(ui, card, thumbnail) {
                        actions.push(action);
                    }
                    ui.add_space(spacing::MEDIUM);
                }
            });

        ui.separator();
        page_delta = draw_pagination(ui, &view);
    });

    for action in actions {
        match action {
            CardAction::ToggleExpanded(id) => app.list.toggle_expanded(id),
            CardAction::ToggleFavorite(id) => app.list.toggle_favorite(id),
            CardAction::AskDelete(id) => {
                let preview = app
                    .list
                    .records()
                    .iter()
                    .find(|r| r.id == id)
                    .map(|r| r.preview(60))
                    .unwrap_or_default();
                app.delete_prompt.ask(id, preview);
            }
            CardAction::CopyPrompt(id) => {
                if let Some(text) = app.list.copy_prompt(id) {
                    ctx.output_mut(|o| o.copied_text = text);
                    mark_copied(ctx, id);
                    log::debug!("Copied prompt {id} to the clipboard");
                }
            }
            CardAction::OpenThumbnail(url) => SystemBrowser.open(&url),
        }
    }
    if let Some(delta) = page_delta {
        app.list.go_to_page(delta);
    }
}
