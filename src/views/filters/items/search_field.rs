use eframe::egui::{Key, TextEdit, Ui};

use crate::localization::translate;

pub enum SearchEvent {
    Submit,
    Clear,
}

/// Search input with Search/Clear buttons underneath. Enter submits.
pub fn search_field(ui: &mut Ui, text: &mut String) -> Option<SearchEvent> {
    let resp = ui.add_sized(
        [ui.available_width(), 0.0],
        TextEdit::singleline(text).hint_text(translate("filters-search-placeholder")),
    );
    let mut event = None;
    if resp.lost_focus() && ui.input(|i| i.key_pressed(Key::Enter)) {
        event = Some(SearchEvent::Submit);
    }
    ui.horizontal(|ui| {
        if ui.button(translate("filters-search")).clicked() {
            event = Some(SearchEvent::Submit);
        }
        if ui.button(translate("filters-clear")).clicked() {
            text.clear();
            event = Some(SearchEvent::Clear);
        }
    });
    event
}
