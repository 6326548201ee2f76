use eframe::egui::{self, RichText};

use super::PromptLibraryApp;
use crate::localization::{translate, translate_count};
use crate::ui_constants::spacing;
use crate::views::tag_panel::{draw_tag_node, NodeAction};

pub(super) fn update_nodes(app: &mut PromptLibraryApp, ctx: &egui::Context) {
    let sensitivity = app.wheel_sensitivity();
    let trigger_tx = app.nodes.sender();
    let mut actions: Vec<NodeAction> = Vec::new();
    let mut add_clicked = false;

    egui::CentralPanel::default().show(ctx, |ui| {
        ui.horizontal(|ui| {
            ui.heading(translate("nodes-title"));
            ui.label(
                RichText::new(translate_count("nodes-count", app.nodes.nodes().len() as u64))
                    .weak(),
            );
            add_clicked = ui.button(translate("node-add")).clicked();
        });
        ui.separator();

        egui::ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                for node in app.nodes.nodes_mut() {
                    if let Some(action) = draw_tag_node(ui, node, sensitivity, &trigger_tx) {
                        actions.push(action);
                    }
                    ui.add_space(spacing::MEDIUM);
                }
            });
    });

    for action in actions {
        match action {
            NodeAction::Changed => app.nodes.mark_dirty(),
            NodeAction::Remove(id) => {
                if app.nodes.remove_node(id) {
                    log::info!("Removed tag node {id}");
                }
            }
        }
    }
    if add_clicked {
        let id = app.add_tag_node();
        log::info!("Added tag node {id}");
    }
}
