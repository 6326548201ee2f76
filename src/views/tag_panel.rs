// egui host side of the tag collection widget: painter adapter, pointer routing and the node panel.

use std::sync::mpsc;

use eframe::egui::{self, pos2, Align2, Color32, FontId, Pos2, Rect, RichText, Sense, Stroke, Vec2};

use crate::app::nodes::{TagNode, TriggerWordsUpdate, TAG_COLLECTION_ID};
use crate::localization::translate;
use crate::tags::{CanvasError, DrawContext, HostWidget, TagCollectionWidget};
use crate::ui_constants::spacing;

/// `DrawContext` over an egui painter. Widget-local (0, 0) maps to `origin`.
pub struct EguiCanvas<'a> {
    painter: &'a egui::Painter,
    origin: Pos2,
}

impl<'a> EguiCanvas<'a> {
    pub fn new(painter: &'a egui::Painter, origin: Pos2) -> Self {
        Self { painter, origin }
    }

    fn to_screen(&self, rect: Rect) -> Rect {
        rect.translate(self.origin.to_vec2())
    }
}

impl DrawContext for EguiCanvas<'_> {
    fn fill_rect(&mut self, rect: Rect, rounding: f32, color: Color32) -> Result<(), CanvasError> {
        self.painter.rect_filled(self.to_screen(rect), rounding, color);
        Ok(())
    }

    fn stroke_rect(
        &mut self,
        rect: Rect,
        rounding: f32,
        width: f32,
        color: Color32,
    ) -> Result<(), CanvasError> {
        self.painter
            .rect_stroke(self.to_screen(rect), rounding, Stroke::new(width, color));
        Ok(())
    }

    fn measure_text(&mut self, text: &str, font_size: f32) -> Result<f32, CanvasError> {
        let galley = self.painter.layout_no_wrap(
            text.to_string(),
            FontId::proportional(font_size),
            Color32::WHITE,
        );
        let width = galley.size().x;
        if width.is_finite() {
            Ok(width)
        } else {
            Err(CanvasError::Measure(format!("non-finite width for {text:?}")))
        }
    }

    fn draw_text(
        &mut self,
        pos: Pos2,
        text: &str,
        font_size: f32,
        color: Color32,
    ) -> Result<(), CanvasError> {
        let pos = pos + self.origin.to_vec2();
        if !(pos.x.is_finite() && pos.y.is_finite()) {
            return Err(CanvasError::Draw(format!("non-finite position for {text:?}")));
        }
        self.painter.text(
            pos,
            Align2::LEFT_CENTER,
            text,
            FontId::proportional(font_size),
            color,
        );
        Ok(())
    }
}

fn edit_focus_id(node_id: u64) -> egui::Id {
    egui::Id::new(("tag_edit_focus_pending", node_id))
}

/// Draws the widget at the cursor and routes clicks, double clicks and the wheel to it.
pub fn show_tag_widget(
    ui: &mut egui::Ui,
    node_id: u64,
    widget: &mut TagCollectionWidget,
    wheel_sensitivity: f32,
) {
    let width = ui.available_width();
    let height = widget.compute_height(width);
    let (rect, response) = ui.allocate_exact_size(Vec2::new(width, height), Sense::click());

    let painter = ui.painter_at(rect);
    let drawn = widget.render(&mut EguiCanvas::new(&painter, rect.min), 0.0, width);
    if drawn > height {
        // Measured text came out wider than the estimate; reserve the extra row next frame
        ui.ctx().request_repaint();
    }

    let local = |p: Pos2| pos2(p.x - rect.min.x, p.y - rect.min.y);

    // Every click toggles, so the second click of a double click restores the state
    if response.clicked() {
        if let Some(p) = response.interact_pointer_pos() {
            let p = local(p);
            widget.handle_pointer_down(p);
            if response.double_clicked() && widget.begin_edit(p) {
                ui.ctx().memory_mut(|m| m.data.insert_temp(edit_focus_id(node_id), true));
            }
        }
    }

    if let Some(p) = response.hover_pos().filter(|_| !widget.is_editing()) {
        let dy = ui.input(|i| i.raw_scroll_delta.y);
        if dy != 0.0 && widget.handle_wheel(local(p), dy.signum(), wheel_sensitivity) {
            // Keep the surrounding scroll area still while adjusting strength
            ui.input_mut(|i| {
                i.raw_scroll_delta = Vec2::ZERO;
                i.smooth_scroll_delta = Vec2::ZERO;
            });
        }
    }

    draw_edit_overlay(ui, node_id, widget, rect.min);
}

fn draw_edit_overlay(ui: &mut egui::Ui, node_id: u64, widget: &mut TagCollectionWidget, origin: Pos2) {
    let Some(chip) = widget.editing_rect() else {
        return;
    };
    let screen_rect = chip.translate(origin.to_vec2()).expand2(Vec2::new(40.0, 0.0));
    let Some(buffer) = widget.edit_buffer_mut() else {
        return;
    };
    let resp = ui.put(screen_rect, egui::TextEdit::singleline(buffer));

    let focus_id = edit_focus_id(node_id);
    let focus_pending = ui.ctx().memory(|m| m.data.get_temp::<bool>(focus_id)).unwrap_or(false);
    if focus_pending {
        resp.request_focus();
        ui.ctx().memory_mut(|m| m.data.remove::<bool>(focus_id));
        return;
    }

    if resp.lost_focus() {
        if ui.input(|i| i.key_pressed(egui::Key::Escape)) {
            widget.cancel_edit();
        } else {
            widget.commit_edit();
        }
    }
}

/// What a node panel asks of its host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeAction {
    /// A node-level setting changed and the document needs saving.
    Changed,
    Remove(u64),
}

fn trigger_input_id(node_id: u64) -> egui::Id {
    egui::Id::new(("trigger_words_input", node_id))
}

/// One tag node: the widget, batch buttons, the add row and the trigger words row.
pub fn draw_tag_node(
    ui: &mut egui::Ui,
    node: &mut TagNode,
    wheel_sensitivity: f32,
    trigger_tx: &mpsc::Sender<TriggerWordsUpdate>,
) -> Option<NodeAction> {
    let mut action = None;

    egui::Frame::none()
        .fill(Color32::from_rgb(36, 36, 36))
        .stroke(Stroke::new(1.0, Color32::from_rgb(64, 64, 64)))
        .rounding(egui::Rounding::same(8.0))
        .inner_margin(egui::Margin::same(8.0))
        .show(ui, |ui| {
            ui.horizontal(|ui| {
                ui.label(RichText::new(&node.title).strong());
                ui.label(
                    RichText::new(format!("#{}", node.id))
                        .small()
                        .color(Color32::from_gray(120)),
                );
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui
                        .small_button("✖")
                        .on_hover_text(translate("node-remove"))
                        .clicked()
                    {
                        action = Some(NodeAction::Remove(node.id));
                    }
                });
            });
            ui.add_space(spacing::SMALL);

            show_tag_widget(ui, node.id, &mut node.widget, wheel_sensitivity);
            ui.add_space(spacing::SMALL);

            ui.horizontal(|ui| {
                if ui.button(translate("tags-toggle-all-on")).clicked() {
                    node.widget.set_all_active(true);
                }
                if ui.button(translate("tags-toggle-all-off")).clicked() {
                    node.widget.set_all_active(false);
                }
                if ui.button(translate("tags-clear-all")).clicked() {
                    node.widget.clear();
                }
            });

            ui.horizontal(|ui| {
                let resp = ui.add(
                    egui::TextEdit::singleline(&mut node.new_tag_input)
                        .hint_text(translate("tags-add-placeholder"))
                        .desired_width(220.0),
                );
                let submitted = resp.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
                if (ui.button(translate("tags-add")).clicked() || submitted)
                    && !node.new_tag_input.trim().is_empty()
                {
                    let text = std::mem::take(&mut node.new_tag_input);
                    node.widget.push_tag(text, node.default_active);
                    node.rebuild_highlight();
                }
            });

            ui.horizontal(|ui| {
                let id = trigger_input_id(node.id);
                let mut input = ui
                    .ctx()
                    .memory(|m| m.data.get_temp::<String>(id))
                    .unwrap_or_else(|| node.original_trigger_words.clone());
                ui.add(
                    egui::TextEdit::singleline(&mut input)
                        .hint_text(translate("trigger-words-placeholder"))
                        .desired_width(220.0),
                );
                if ui.button(translate("trigger-words-apply")).clicked() {
                    let _ = trigger_tx.send(TriggerWordsUpdate {
                        target_id: node.id,
                        collection_id: TAG_COLLECTION_ID.to_string(),
                        trigger_words_text: input.clone(),
                    });
                }
                if ui
                    .add_enabled(
                        !node.original_trigger_words.trim().is_empty(),
                        egui::Button::new(translate("trigger-words-add-tags")),
                    )
                    .clicked()
                {
                    node.add_trigger_word_tags();
                }
                ui.ctx().memory_mut(|m| m.data.insert_temp(id, input));
            });

            ui.horizontal(|ui| {
                let mut allow = node.widget.options().allow_strength_adjustment;
                if ui
                    .checkbox(&mut allow, translate("tags-allow-strength"))
                    .changed()
                {
                    node.widget.set_allow_strength_adjustment(allow);
                    action.get_or_insert(NodeAction::Changed);
                }
                let mut default_active = node.default_active;
                if ui
                    .checkbox(&mut default_active, translate("tags-default-active"))
                    .changed()
                {
                    node.set_default_active(default_active);
                    action.get_or_insert(NodeAction::Changed);
                }
            });

            let text = node.widget.active_text(", ");
            if !text.is_empty() {
                ui.add_space(spacing::SMALL);
                ui.label(
                    RichText::new(text)
                        .small()
                        .color(Color32::from_rgb(170, 170, 170)),
                );
            }
        });

    action
}
