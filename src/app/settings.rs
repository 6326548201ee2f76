// Settings module split: store (data, persistence, cached accessor) and ui (egui viewport).

pub mod store;
pub mod ui;

pub use store::{AppSettings, SettingsStore};
pub use ui::{draw_settings_viewport, open_settings};
