use eframe::egui::{self, Color32, RichText, Rounding, Stroke};

use super::meta_row::{draw_metadata_box, draw_quick_info};
use crate::app::list::CardView;
use crate::app::thumbnails::ThumbnailState;
use crate::localization::translate;
use crate::ui_constants::card::{INNER_MARGIN, PREVIEW_CHARS, ROUNDING, THUMBNAIL_MAX_WIDTH};
use crate::ui_constants::spacing;

/// How long the copy button shows its confirmation, in seconds.
const COPIED_FEEDBACK_SECS: f64 = 2.0;

/// What the user asked for on a card this frame.
#[derive(Debug, Clone, PartialEq)]
pub enum CardAction {
    ToggleExpanded(i64),
    ToggleFavorite(i64),
    AskDelete(i64),
    CopyPrompt(i64),
    OpenThumbnail(String),
}

fn copied_id(record_id: i64) -> egui::Id {
    egui::Id::new(("prompt_copied_at", record_id))
}

/// Starts the "Copied" feedback on the card of `record_id`.
pub fn mark_copied(ctx: &egui::Context, record_id: i64) {
    let now = ctx.input(|i| i.time);
    ctx.memory_mut(|m| m.data.insert_temp(copied_id(record_id), now));
}

/// Full-width prompt card. Clicking anywhere outside the buttons expands or collapses it.
pub fn prompt_card(
    ui: &mut egui::Ui,
    card: &CardView<'_>,
    thumbnail: Option<ThumbnailState<'_>>,
) -> Option<CardAction> {
    let record = card.record;
    let mut action = None;

    let stroke = if record.is_favorite {
        Stroke::new(1.0, Color32::from_rgb(200, 170, 60))
    } else {
        Stroke::new(1.0, Color32::from_rgb(64, 64, 64))
    };
    let fill = if card.expanded {
        Color32::from_rgb(42, 42, 42)
    } else {
        Color32::from_rgb(36, 36, 36)
    };

    let frame_out = egui::Frame::none()
        .fill(fill)
        .stroke(stroke)
        .rounding(Rounding::same(ROUNDING))
        .inner_margin(egui::Margin::same(INNER_MARGIN))
        .show(ui, |ui| {
            ui.set_width(ui.available_width());

            // Header: date left, favorite/delete right
            ui.horizontal(|ui| {
                ui.label(
                    RichText::new(record.created_display())
                        .small()
                        .color(Color32::from_rgb(180, 180, 180)),
                );
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui
                        .small_button("🗑")
                        .on_hover_text(translate("card-delete"))
                        .clicked()
                    {
                        action = Some(CardAction::AskDelete(record.id));
                    }
                    let star = if record.is_favorite { "⭐" } else { "☆" };
                    if ui
                        .small_button(star)
                        .on_hover_text(translate("card-toggle-favorite"))
                        .clicked()
                    {
                        action = Some(CardAction::ToggleFavorite(record.id));
                    }
                });
            });

            ui.add_space(spacing::SMALL);
            ui.add(
                egui::Label::new(
                    RichText::new(record.preview(PREVIEW_CHARS))
                        .color(Color32::from_rgb(230, 230, 230)),
                )
                .selectable(false),
            );
            draw_quick_info(ui, record);

            if card.expanded {
                ui.add_space(spacing::MEDIUM);
                if let Some(a) = draw_details(ui, card, thumbnail) {
                    action = Some(a);
                }
            }
        });

    // Pointer test instead of a click sense on the frame, which would sit above the buttons.
    let card_rect = frame_out.response.rect;
    if action.is_none() && ui.rect_contains_pointer(card_rect) {
        ui.ctx().set_cursor_icon(egui::CursorIcon::PointingHand);
        if ui.input(|i| i.pointer.primary_clicked()) {
            action = Some(CardAction::ToggleExpanded(record.id));
        }
    }
    action
}

fn draw_details(
    ui: &mut egui::Ui,
    card: &CardView<'_>,
    thumbnail: Option<ThumbnailState<'_>>,
) -> Option<CardAction> {
    let record = card.record;
    let mut action = None;

    ui.label(RichText::new(&record.prompt_text).color(Color32::from_rgb(220, 220, 220)));
    if let Some(negative) = record.negative_prompt.as_deref().filter(|n| !n.is_empty()) {
        ui.add_space(spacing::SMALL);
        ui.label(
            RichText::new(format!("{} {negative}", translate("card-negative")))
                .small()
                .color(Color32::from_rgb(200, 130, 130)),
        );
    }
    ui.add_space(spacing::MEDIUM);

    ui.horizontal_top(|ui| {
        match thumbnail {
            Some(ThumbnailState::Ready(tex)) => {
                let size = tex.size_vec2();
                let scale = (THUMBNAIL_MAX_WIDTH / size.x).min(1.0);
                let image = egui::Image::new(egui::load::SizedTexture::new(tex.id(), size * scale))
                    .sense(egui::Sense::click());
                let resp = ui
                    .add(image)
                    .on_hover_cursor(egui::CursorIcon::PointingHand);
                if resp.clicked() {
                    if let Some(url) = &card.thumbnail_url {
                        action = Some(CardAction::OpenThumbnail(url.clone()));
                    }
                }
            }
            Some(ThumbnailState::Loading) => {
                ui.add(egui::Spinner::new());
            }
            // A broken thumbnail is simply not shown
            Some(ThumbnailState::Failed) | None => {}
        }
        ui.vertical(|ui| draw_metadata_box(ui, record));
    });

    ui.add_space(spacing::MEDIUM);
    let now = ui.input(|i| i.time);
    let copied_at = ui
        .ctx()
        .memory(|m| m.data.get_temp::<f64>(copied_id(record.id)));
    let label = match copied_at {
        Some(at) if now - at < COPIED_FEEDBACK_SECS => {
            ui.ctx().request_repaint_after(std::time::Duration::from_secs_f64(
                COPIED_FEEDBACK_SECS - (now - at),
            ));
            translate("card-copied")
        }
        _ => translate("card-copy"),
    };
    if ui.button(label).clicked() {
        action = Some(CardAction::CopyPrompt(record.id));
    }
    action
}
