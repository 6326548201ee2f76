use std::collections::{HashMap, HashSet};
use std::convert::Infallible;
use std::sync::Arc;

use eframe::egui::{pos2, Color32, Pos2, Rect};
use thiserror::Error;

use super::highlight::tag_matches_tokens;
use super::layout::{layout_chips, ChipLayout};
use super::strength::{clamp_strength, format_weighted, parse_weighted, round_strength};
use super::Tag;
use crate::host::RedrawSignal;
use crate::ui_constants::chips::{
    ESTIMATED_CHAR_WIDTH, FONT_SIZE, HIGHLIGHT_STROKE, MARGIN, MIN_HEIGHT, PAD_X, ROUNDING,
};

// Палитра чипов
const FILL_ACTIVE_HIGHLIGHTED: Color32 = Color32::from_rgb(0x4a, 0x7c, 0x59);
const FILL_ACTIVE: Color32 = Color32::from_rgb(0x2a, 0x4a, 0x3a);
const FILL_INACTIVE: Color32 = Color32::from_rgb(0x3a, 0x3a, 0x3a);
const HIGHLIGHT_BORDER: Color32 = Color32::from_rgb(0x6f, 0xa8, 0x66);
const TEXT_ACTIVE: Color32 = Color32::WHITE;
const TEXT_INACTIVE: Color32 = Color32::from_rgb(0x88, 0x88, 0x88);

const MEASURE_CACHE_LIMIT: usize = 1024;

#[derive(Debug, Error)]
pub enum CanvasError {
    #[error("text measurement failed: {0}")]
    Measure(String),
    #[error("drawing failed: {0}")]
    Draw(String),
}

/// Drawing surface handed to the widget by its host.
/// Coordinates are widget-local: x starts at the left edge of the widget area.
pub trait DrawContext {
    fn fill_rect(&mut self, rect: Rect, rounding: f32, color: Color32) -> Result<(), CanvasError>;
    fn stroke_rect(
        &mut self,
        rect: Rect,
        rounding: f32,
        width: f32,
        color: Color32,
    ) -> Result<(), CanvasError>;
    fn measure_text(&mut self, text: &str, font_size: f32) -> Result<f32, CanvasError>;
    /// `pos` is the left end of the text baseline centre line.
    fn draw_text(
        &mut self,
        pos: Pos2,
        text: &str,
        font_size: f32,
        color: Color32,
    ) -> Result<(), CanvasError>;
}

/// What a host frame needs from an embedded widget.
pub trait HostWidget {
    fn render(&mut self, canvas: &mut dyn DrawContext, origin_y: f32, width: f32) -> f32;
    fn compute_height(&self, width: f32) -> f32;
    fn handle_pointer_down(&mut self, pos: Pos2) -> bool;
    fn handle_wheel(&mut self, pos: Pos2, delta: f32, sensitivity: f32) -> bool;
    fn set_value(&mut self, tags: Vec<Tag>);
    fn get_value(&self) -> &[Tag];
}

#[derive(Debug, Clone)]
pub struct WidgetOptions {
    pub allow_strength_adjustment: bool,
    pub allow_editing: bool,
    pub empty_text: String,
    pub error_text: String,
}

impl Default for WidgetOptions {
    fn default() -> Self {
        Self {
            allow_strength_adjustment: false,
            allow_editing: true,
            empty_text: "No tags".to_string(),
            error_text: "Error rendering tags".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
struct EditState {
    index: usize,
    buffer: String,
}

/// Chip editor over an ordered tag collection.
pub struct TagCollectionWidget {
    tags: Vec<Tag>,
    options: WidgetOptions,
    redraw: Arc<dyn RedrawSignal>,
    measured: HashMap<String, f32>,
    last_origin_y: f32,
    last_width: f32,
    editing: Option<EditState>,
    changed: bool,
}

impl TagCollectionWidget {
    pub fn new(options: WidgetOptions, redraw: Arc<dyn RedrawSignal>) -> Self {
        Self {
            tags: Vec::new(),
            options,
            redraw,
            measured: HashMap::new(),
            last_origin_y: 0.0,
            last_width: 0.0,
            editing: None,
            changed: false,
        }
    }

    pub fn options(&self) -> &WidgetOptions {
        &self.options
    }

    pub fn set_allow_strength_adjustment(&mut self, allow: bool) {
        if self.options.allow_strength_adjustment != allow {
            self.options.allow_strength_adjustment = allow;
            self.redraw.request_redraw();
        }
    }

    pub fn set_allow_editing(&mut self, allow: bool) {
        self.options.allow_editing = allow;
        if !allow {
            self.editing = None;
        }
    }

    pub fn set_placeholder_texts(&mut self, empty_text: String, error_text: String) {
        if self.options.empty_text != empty_text || self.options.error_text != error_text {
            self.options.empty_text = empty_text;
            self.options.error_text = error_text;
            self.redraw.request_redraw();
        }
    }

    fn labels(&self) -> Vec<String> {
        let show_strength = self.options.allow_strength_adjustment;
        self.tags.iter().map(|t| t.label(show_strength)).collect()
    }

    fn estimated_width(&self, label: &str) -> f32 {
        self.measured
            .get(label)
            .copied()
            .unwrap_or_else(|| label.chars().count() as f32 * ESTIMATED_CHAR_WIDTH)
    }

    /// Layout at the last rendered position without touching the canvas.
    fn cached_layout(&self, origin_y: f32, width: f32) -> ChipLayout {
        let labels = self.labels();
        layout_chips::<Infallible>(labels.len(), origin_y, width, |i| {
            Ok(self.estimated_width(&labels[i]))
        })
        .unwrap_or_else(|never| match never {})
    }

    fn hit(&self, pos: Pos2) -> Option<usize> {
        self.cached_layout(self.last_origin_y, self.last_width)
            .hit(pos)
    }

    fn paint(
        &mut self,
        canvas: &mut dyn DrawContext,
        origin_y: f32,
        width: f32,
    ) -> Result<f32, CanvasError> {
        let labels = self.labels();
        if self.measured.len() > MEASURE_CACHE_LIMIT {
            self.measured.clear();
        }
        let measured = &mut self.measured;
        let layout = layout_chips(labels.len(), origin_y, width, |i| {
            let w = canvas.measure_text(&labels[i], FONT_SIZE)?;
            measured.insert(labels[i].clone(), w);
            Ok(w)
        })?;

        for slot in &layout.slots {
            let tag = &self.tags[slot.index];
            let fill = match (tag.active, tag.highlighted) {
                (true, true) => FILL_ACTIVE_HIGHLIGHTED,
                (true, false) => FILL_ACTIVE,
                (false, _) => FILL_INACTIVE,
            };
            canvas.fill_rect(slot.rect, ROUNDING, fill)?;
            if tag.highlighted {
                canvas.stroke_rect(slot.rect, ROUNDING, HIGHLIGHT_STROKE, HIGHLIGHT_BORDER)?;
            }
            let text_color = if tag.active { TEXT_ACTIVE } else { TEXT_INACTIVE };
            canvas.draw_text(
                pos2(slot.rect.min.x + PAD_X, slot.rect.center().y),
                &labels[slot.index],
                FONT_SIZE,
                text_color,
            )?;
        }
        Ok(layout.height())
    }

    fn placeholder(
        canvas: &mut dyn DrawContext,
        origin_y: f32,
        text: &str,
    ) -> Result<(), CanvasError> {
        canvas.draw_text(
            pos2(MARGIN, origin_y + MIN_HEIGHT / 2.0),
            text,
            FONT_SIZE,
            TEXT_INACTIVE,
        )
    }

    pub fn apply_highlight(&mut self, tokens: &HashSet<String>) {
        for tag in &mut self.tags {
            tag.highlighted = tag_matches_tokens(&tag.text, tokens);
        }
        self.redraw.request_redraw();
    }

    /// Value handed to the host for persistence.
    pub fn serialize(&self) -> Vec<Tag> {
        if !self.options.allow_strength_adjustment {
            return self.tags.clone();
        }
        self.tags
            .iter()
            .cloned()
            .map(|mut tag| {
                tag.strength = tag.strength.map(|s| round_strength(clamp_strength(s)));
                tag
            })
            .collect()
    }

    /// Active tags as prompt text.
    pub fn active_text(&self, separator: &str) -> String {
        self.tags
            .iter()
            .filter(|t| t.active)
            .map(|t| match t.strength {
                Some(s) if self.options.allow_strength_adjustment => {
                    format_weighted(&t.text, round_strength(clamp_strength(s)))
                }
                _ => t.text.clone(),
            })
            .collect::<Vec<_>>()
            .join(separator)
    }

    fn mark_changed(&mut self) {
        self.changed = true;
        self.redraw.request_redraw();
    }

    pub fn take_changed(&mut self) -> bool {
        std::mem::take(&mut self.changed)
    }

    pub fn set_all_active(&mut self, active: bool) {
        for tag in &mut self.tags {
            tag.active = active;
        }
        self.mark_changed();
    }

    pub fn clear(&mut self) {
        self.tags.clear();
        self.editing = None;
        self.mark_changed();
    }

    pub fn push_tag(&mut self, text: impl Into<String>, active: bool) {
        let (text, strength) = parse_weighted(&text.into());
        let text = text.trim().to_string();
        if text.is_empty() {
            return;
        }
        let mut tag = Tag::new(text).with_active(active);
        tag.strength = strength;
        self.tags.push(tag);
        self.mark_changed();
    }

    pub fn extend(&mut self, tags: impl IntoIterator<Item = Tag>) {
        self.tags.extend(tags);
        self.mark_changed();
    }

    // --- inline editing ---

    pub fn begin_edit(&mut self, pos: Pos2) -> bool {
        if !self.options.allow_editing {
            return false;
        }
        let Some(index) = self.hit(pos) else {
            return false;
        };
        let tag = &self.tags[index];
        let buffer = match tag.strength {
            Some(s) if self.options.allow_strength_adjustment => format_weighted(&tag.text, s),
            _ => tag.text.clone(),
        };
        self.editing = Some(EditState { index, buffer });
        self.redraw.request_redraw();
        true
    }

    pub fn is_editing(&self) -> bool {
        self.editing.is_some()
    }

    pub fn edit_buffer_mut(&mut self) -> Option<&mut String> {
        self.editing.as_mut().map(|e| &mut e.buffer)
    }

    /// Chip rectangle under edit, for placing the host text field.
    pub fn editing_rect(&self) -> Option<Rect> {
        let edit = self.editing.as_ref()?;
        self.cached_layout(self.last_origin_y, self.last_width)
            .slots
            .get(edit.index)
            .map(|slot| slot.rect)
    }

    /// Applies the edit buffer. "(word:1.2)" sets text and strength; empty text removes the tag.
    pub fn commit_edit(&mut self) -> bool {
        let Some(edit) = self.editing.take() else {
            return false;
        };
        if edit.index >= self.tags.len() {
            return false;
        }
        let (text, strength) = parse_weighted(&edit.buffer);
        let text = text.trim().to_string();
        if text.is_empty() {
            self.tags.remove(edit.index);
        } else {
            let tag = &mut self.tags[edit.index];
            tag.text = text;
            if strength.is_some() {
                tag.strength = strength;
            }
        }
        self.mark_changed();
        true
    }

    pub fn cancel_edit(&mut self) {
        if self.editing.take().is_some() {
            self.redraw.request_redraw();
        }
    }
}

impl HostWidget for TagCollectionWidget {
    fn render(&mut self, canvas: &mut dyn DrawContext, origin_y: f32, width: f32) -> f32 {
        self.last_origin_y = origin_y;
        self.last_width = width;

        if self.tags.is_empty() {
            let text = self.options.empty_text.clone();
            if let Err(e) = Self::placeholder(canvas, origin_y, &text) {
                log::warn!("Failed to draw empty tag placeholder: {e}");
            }
            return MIN_HEIGHT;
        }

        match self.paint(canvas, origin_y, width) {
            Ok(height) => height,
            Err(e) => {
                log::error!("Error rendering tags: {e}");
                let text = self.options.error_text.clone();
                if let Err(e) = Self::placeholder(canvas, origin_y, &text) {
                    log::warn!("Failed to draw tag error placeholder: {e}");
                }
                MIN_HEIGHT
            }
        }
    }

    fn compute_height(&self, width: f32) -> f32 {
        self.cached_layout(0.0, width).height()
    }

    fn handle_pointer_down(&mut self, pos: Pos2) -> bool {
        let Some(index) = self.hit(pos) else {
            return false;
        };
        self.tags[index].active = !self.tags[index].active;
        self.mark_changed();
        true
    }

    fn handle_wheel(&mut self, pos: Pos2, delta: f32, sensitivity: f32) -> bool {
        if !self.options.allow_strength_adjustment {
            return false;
        }
        let Some(index) = self.hit(pos) else {
            return false;
        };
        let Some(current) = self.tags[index].strength else {
            return false;
        };
        // Kept at full precision; labels, active text and serialize round to two decimals
        let next = clamp_strength(current + delta * sensitivity);
        if next != current {
            self.tags[index].strength = Some(next);
            self.mark_changed();
        }
        true
    }

    fn set_value(&mut self, tags: Vec<Tag>) {
        self.tags = tags;
        self.editing = None;
        self.redraw.request_redraw();
    }

    fn get_value(&self) -> &[Tag] {
        &self.tags
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tags::{collect_highlight_tokens, tags_from_value};
    use crate::ui_constants::chips::ROW_STEP;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingRedraw(AtomicUsize);

    impl RedrawSignal for CountingRedraw {
        fn request_redraw(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// Records draw calls; glyphs are 8px wide.
    #[derive(Default)]
    struct RecordingCanvas {
        fills: Vec<(Rect, Color32)>,
        strokes: usize,
        texts: Vec<String>,
        fail_measure: bool,
    }

    impl DrawContext for RecordingCanvas {
        fn fill_rect(&mut self, rect: Rect, _: f32, color: Color32) -> Result<(), CanvasError> {
            self.fills.push((rect, color));
            Ok(())
        }
        fn stroke_rect(&mut self, _: Rect, _: f32, _: f32, _: Color32) -> Result<(), CanvasError> {
            self.strokes += 1;
            Ok(())
        }
        fn measure_text(&mut self, text: &str, _: f32) -> Result<f32, CanvasError> {
            if self.fail_measure {
                return Err(CanvasError::Measure("font not loaded".into()));
            }
            Ok(text.chars().count() as f32 * 8.0)
        }
        fn draw_text(&mut self, _: Pos2, text: &str, _: f32, _: Color32) -> Result<(), CanvasError> {
            self.texts.push(text.to_string());
            Ok(())
        }
    }

    fn widget_with(tags: Vec<Tag>, allow_strength: bool) -> (TagCollectionWidget, Arc<CountingRedraw>) {
        let redraw = Arc::new(CountingRedraw::default());
        let options = WidgetOptions {
            allow_strength_adjustment: allow_strength,
            ..WidgetOptions::default()
        };
        let mut widget = TagCollectionWidget::new(options, redraw.clone());
        widget.set_value(tags);
        (widget, redraw)
    }

    fn sample_tags() -> Vec<Tag> {
        ["masterpiece", "sunlight", "long flowing hair", "bokeh", "a", "cinematic composition"]
            .into_iter()
            .map(Tag::new)
            .collect()
    }

    #[test]
    fn compute_height_never_below_rendered_height() {
        for width in [60.0, 120.0, 200.0, 333.0, 640.0] {
            let (mut widget, _) = widget_with(sample_tags(), false);
            let before = widget.compute_height(width);
            let rendered = widget.render(&mut RecordingCanvas::default(), 0.0, width);
            assert!(before >= rendered, "estimate {before} < rendered {rendered} at {width}");
            assert_eq!(widget.compute_height(width), rendered);
        }
    }

    #[test]
    fn empty_collection_draws_placeholder() {
        let (mut widget, _) = widget_with(Vec::new(), false);
        let mut canvas = RecordingCanvas::default();
        assert_eq!(widget.render(&mut canvas, 0.0, 300.0), MIN_HEIGHT);
        assert_eq!(canvas.texts, vec!["No tags".to_string()]);
        assert_eq!(widget.compute_height(300.0), MIN_HEIGHT);

        widget.set_placeholder_texts("Нет тегов".into(), "Ошибка".into());
        let mut canvas = RecordingCanvas::default();
        widget.render(&mut canvas, 0.0, 300.0);
        assert_eq!(canvas.texts, vec!["Нет тегов".to_string()]);
    }

    #[test]
    fn canvas_fault_becomes_error_placeholder() {
        let (mut widget, _) = widget_with(sample_tags(), false);
        let mut canvas = RecordingCanvas {
            fail_measure: true,
            ..RecordingCanvas::default()
        };
        assert_eq!(widget.render(&mut canvas, 0.0, 300.0), MIN_HEIGHT);
        assert!(canvas.fills.is_empty());
        assert_eq!(canvas.texts, vec!["Error rendering tags".to_string()]);
    }

    #[test]
    fn malformed_entries_render_in_order() {
        let tags = tags_from_value(&json!([{ "active": false }, "plain", { "text": "third" }]));
        let (mut widget, _) = widget_with(tags, false);
        let mut canvas = RecordingCanvas::default();
        widget.render(&mut canvas, 0.0, 800.0);
        assert_eq!(canvas.texts, vec!["", "plain", "third"]);
        assert_eq!(canvas.fills[0].1, FILL_INACTIVE);
    }

    #[test]
    fn click_toggles_the_hit_chip() {
        let (mut widget, redraw) = widget_with(sample_tags(), false);
        let mut canvas = RecordingCanvas::default();
        widget.render(&mut canvas, 100.0, 800.0);
        let before = redraw.0.load(Ordering::SeqCst);

        let target = canvas.fills[1].0.center();
        assert!(widget.handle_pointer_down(target));
        assert!(!widget.get_value()[1].active);
        assert!(widget.get_value()[0].active);
        assert!(redraw.0.load(Ordering::SeqCst) > before);
        assert!(widget.take_changed());
        assert!(!widget.take_changed());

        // row gap and the area above the origin are not chips
        assert!(!widget.handle_pointer_down(pos2(target.x, 50.0)));
    }

    #[test]
    fn wheel_adjusts_clamps_and_rounds() {
        let tags = vec![Tag::new("glow").with_strength(1.99), Tag::new("plain")];
        let (mut widget, _) = widget_with(tags, true);
        let mut canvas = RecordingCanvas::default();
        widget.render(&mut canvas, 0.0, 800.0);
        let glow = canvas.fills[0].0.center();
        let plain = canvas.fills[1].0.center();

        // no strength on the tag
        assert!(!widget.handle_wheel(plain, 1.0, 0.02));
        assert_eq!(widget.get_value()[1].strength, None);

        assert!(widget.handle_wheel(glow, 1.0, 0.02));
        assert_eq!(widget.get_value()[0].strength, Some(2.0));
        assert!(widget.take_changed());
        // at the bound the wheel is consumed but nothing changes
        assert!(widget.handle_wheel(glow, 1.0, 0.02));
        assert!(!widget.take_changed());

        assert!(widget.handle_wheel(glow, -1.0, 0.123));
        assert_eq!(widget.serialize()[0].strength, Some(1.88));
        assert_eq!(widget.active_text(", "), "(glow:1.88), plain");
    }

    #[test]
    fn fine_wheel_steps_accumulate() {
        let (mut widget, _) = widget_with(vec![Tag::new("glow").with_strength(1.0)], true);
        let mut canvas = RecordingCanvas::default();
        widget.render(&mut canvas, 0.0, 800.0);
        let glow = canvas.fills[0].0.center();

        for _ in 0..50 {
            assert!(widget.handle_wheel(glow, 1.0, 0.004));
        }
        let strength = widget.get_value()[0].strength.unwrap();
        assert!(strength > 1.19 && strength < 1.21, "strength {strength}");
        assert_eq!(widget.serialize()[0].strength, Some(1.2));

        let mut canvas = RecordingCanvas::default();
        widget.render(&mut canvas, 0.0, 800.0);
        assert_eq!(canvas.texts, vec!["glow 1.20".to_string()]);
    }

    #[test]
    fn wheel_is_ignored_without_strength_capability() {
        let (mut widget, _) = widget_with(vec![Tag::new("glow").with_strength(1.0)], false);
        let mut canvas = RecordingCanvas::default();
        widget.render(&mut canvas, 0.0, 800.0);
        assert!(!widget.handle_wheel(canvas.fills[0].0.center(), 1.0, 0.5));
        assert_eq!(widget.get_value()[0].strength, Some(1.0));
    }

    #[test]
    fn highlight_marks_whole_tokens_only() {
        let (mut widget, _) = widget_with(
            vec![Tag::new("sunlight"), Tag::new("sunlight,,dramatic lighting")],
            false,
        );
        widget.apply_highlight(&collect_highlight_tokens(&["sun"]));
        assert!(widget.get_value().iter().all(|t| !t.highlighted));

        widget.apply_highlight(&collect_highlight_tokens(&["sunlight"]));
        assert!(widget.get_value().iter().all(|t| t.highlighted));

        let mut canvas = RecordingCanvas::default();
        widget.render(&mut canvas, 0.0, 800.0);
        assert_eq!(canvas.strokes, 2);
        assert_eq!(canvas.fills[0].1, FILL_ACTIVE_HIGHLIGHTED);
    }

    #[test]
    fn serialize_applies_strength_rules_only_when_enabled() {
        let mut tag = Tag::new("glow").with_strength(2.4567);
        tag.extra.insert("category".into(), json!("Lora"));
        tag.highlighted = true;

        let (plain, _) = widget_with(vec![tag.clone()], false);
        assert_eq!(plain.serialize()[0].strength, Some(2.4567));

        let (weighted, _) = widget_with(vec![tag], true);
        let out = weighted.serialize();
        assert_eq!(out[0].strength, Some(2.0));
        assert_eq!(out[0].text, "glow");
        let json = serde_json::to_value(&out).unwrap();
        assert_eq!(json[0]["category"], json!("Lora"));
        assert!(json[0].get("highlighted").is_none());
    }

    #[test]
    fn edit_commit_parses_weighted_text() {
        let (mut widget, _) = widget_with(vec![Tag::new("hair"), Tag::new("eyes")], true);
        let mut canvas = RecordingCanvas::default();
        widget.render(&mut canvas, 0.0, 800.0);

        assert!(widget.begin_edit(canvas.fills[0].0.center()));
        assert_eq!(widget.editing_rect(), Some(canvas.fills[0].0));
        *widget.edit_buffer_mut().unwrap() = "(long hair:1.2)".to_string();
        assert!(widget.commit_edit());
        assert_eq!(widget.get_value()[0].text, "long hair");
        assert_eq!(widget.get_value()[0].strength, Some(1.2));

        widget.render(&mut canvas, 0.0, 800.0);
        let eyes = widget.cached_layout(0.0, 800.0).slots[1].rect.center();
        assert!(widget.begin_edit(eyes));
        widget.edit_buffer_mut().unwrap().clear();
        assert!(widget.commit_edit());
        assert_eq!(widget.get_value().len(), 1);
        assert!(!widget.is_editing());
    }

    #[test]
    fn batch_operations_and_active_text() {
        let (mut widget, _) = widget_with(Vec::new(), true);
        widget.push_tag("(rim light:0.8)", true);
        widget.push_tag("fog", true);
        widget.push_tag("   ", true);
        assert_eq!(widget.get_value().len(), 2);
        assert_eq!(widget.active_text(", "), "(rim light:0.80), fog");

        widget.set_all_active(false);
        assert_eq!(widget.active_text(", "), "");
        widget.set_all_active(true);
        widget.set_allow_strength_adjustment(false);
        assert_eq!(widget.active_text(", "), "rim light, fog");

        widget.clear();
        assert!(widget.get_value().is_empty());
        assert!(widget.take_changed());
    }

    #[test]
    fn rows_follow_width() {
        let (mut widget, _) = widget_with(vec![Tag::new("aaaaaaaaaa"); 4], false);
        // each chip is 100 wide; two fit in a 260 wide area
        let height = widget.render(&mut RecordingCanvas::default(), 0.0, 260.0);
        assert_eq!(height, 2.0 * ROW_STEP);
    }
}
