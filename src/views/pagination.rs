use eframe::egui;

use crate::app::list::ListView;

/// ◀ "Page X of Y" ▶. Returns the page delta the user asked for.
pub fn draw_pagination(ui: &mut egui::Ui, view: &ListView<'_>) -> Option<i64> {
    let mut delta = None;
    ui.horizontal(|ui| {
        if ui
            .add_enabled(view.prev_enabled, egui::Button::new("◀"))
            .clicked()
        {
            delta = Some(-1);
        }
        ui.label(view.page_label());
        if ui
            .add_enabled(view.next_enabled, egui::Button::new("▶"))
            .clicked()
        {
            delta = Some(1);
        }
        if view.loading {
            ui.add(egui::Spinner::new().size(14.0));
        }
    });
    delta
}
