// Delete confirmation: the only place a DeleteConfirmation is created.

use eframe::egui;

use crate::localization::{translate, translate_with};

/// Proof that the user confirmed deleting one record.
#[derive(Debug, PartialEq, Eq)]
pub struct DeleteConfirmation {
    id: i64,
}

impl DeleteConfirmation {
    pub(in crate::app) fn confirmed(id: i64) -> Self {
        Self { id }
    }

    pub fn id(&self) -> i64 {
        self.id
    }
}

/// Pending "delete this prompt?" question.
#[derive(Debug, Default)]
pub struct DeletePrompt {
    pending: Option<(i64, String)>,
}

impl DeletePrompt {
    pub fn ask(&mut self, id: i64, preview: String) {
        self.pending = Some((id, preview));
    }

    /// Draws the modal window; returns a confirmation once the user agreed.
    pub fn show(&mut self, ctx: &egui::Context) -> Option<DeleteConfirmation> {
        let (id, preview) = self.pending.as_ref()?;
        let id = *id;
        let mut answer: Option<bool> = None;

        egui::Window::new(translate("delete-title"))
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
            .show(ctx, |ui| {
                ui.label(translate("delete-question"));
                ui.add_space(4.0);
                ui.label(egui::RichText::new(preview).italics().weak());
                ui.add_space(8.0);
                ui.horizontal(|ui| {
                    if ui.button(translate_with("delete-confirm", &[("id", id.to_string())])).clicked() {
                        answer = Some(true);
                    }
                    if ui.button(translate("cancel")).clicked() {
                        answer = Some(false);
                    }
                });
            });

        match answer {
            Some(true) => {
                self.pending = None;
                log::info!("Delete confirmed for prompt {id}");
                Some(DeleteConfirmation::confirmed(id))
            }
            Some(false) => {
                self.pending = None;
                None
            }
            None => None,
        }
    }
}
