use eframe::egui::{
    pos2, Align, Align2, Color32, CursorIcon, FontId, Label, Layout, Rect, RichText, Rounding,
    Sense, Stroke, Ui, Vec2,
};
use strum::{EnumCount, IntoEnumIterator};

use crate::localization::translate;
use crate::types::LocalizableName;
use crate::views::filters::EnumWithAlternativeNames;

/// Header row (name left, current value right) over one clickable segment per variant.
/// Returns true when the user picked a different variant this frame.
pub fn segmented_panel<T>(ui: &mut Ui, name_key: &str, current: &mut T) -> bool
where
    T: IntoEnumIterator + EnumCount + EnumWithAlternativeNames + LocalizableName + PartialEq,
{
    ui.horizontal(|ui| {
        ui.add(Label::new(RichText::new(translate(name_key)).weak()).selectable(false));
        ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
            ui.add(Label::new(RichText::new(current.localized_name())).selectable(false));
        });
    });

    let height = (ui.spacing().interact_size.y * 1.4).clamp(28.0, 40.0);
    let (container_rect, _) =
        ui.allocate_exact_size(Vec2::new(ui.available_width(), height), Sense::hover());
    let painter = ui.painter().clone();
    painter.rect(
        container_rect,
        Rounding::same(6.0),
        Color32::from_rgb(30, 30, 30),
        Stroke::new(1.0, Color32::from_gray(80)),
    );

    let seg_w = container_rect.width() / T::COUNT.max(1) as f32;
    let accent = Color32::from_rgb(0x6f, 0xa8, 0x66);
    let mut changed = false;

    for (i, variant) in T::iter().enumerate() {
        let seg_rect = Rect::from_min_size(
            container_rect.min + Vec2::new(i as f32 * seg_w, 0.0),
            Vec2::new(seg_w, container_rect.height()),
        );
        let is_selected = *current == variant;

        if i > 0 {
            let x = seg_rect.min.x;
            painter.line_segment(
                [pos2(x, seg_rect.min.y + 4.0), pos2(x, seg_rect.max.y - 4.0)],
                Stroke::new(1.0, Color32::from_gray(60)),
            );
        }

        let response = ui
            .interact(seg_rect, ui.id().with(("segmented_panel", name_key, i)), Sense::click())
            .on_hover_cursor(CursorIcon::PointingHand)
            .on_hover_text(variant.localized_name());

        let inner = seg_rect.shrink2(Vec2::new(2.0, 2.0));
        if is_selected {
            painter.rect_filled(inner, Rounding::same(4.0), Color32::from_rgb(45, 45, 45));
        } else if response.hovered() {
            painter.rect_filled(
                inner,
                Rounding::same(4.0),
                Color32::from_rgba_premultiplied(255, 255, 255, 6),
            );
        }

        painter.text(
            seg_rect.center(),
            Align2::CENTER_CENTER,
            variant.alternative_name(),
            FontId::proportional(16.0),
            if is_selected { accent } else { Color32::from_gray(150) },
        );

        if response.clicked() && !is_selected {
            *current = variant;
            changed = true;
        }
    }

    changed
}
