// Pure drawing code. Views read controller models and report user actions back; they own no state
// apart from transient egui memory.
pub mod cards;
pub mod filters;
pub mod pagination;
pub mod tag_panel;
