// Application state and the per-frame update. Screens are drawn by main_screen / nodes_screen;
// the runtime, settings, list controller and tag nodes live in submodules.

use eframe::{egui, App};
use std::sync::Arc;
use std::time::Instant;
use strum::IntoEnumIterator;

use crate::api::{HttpPromptSource, PromptSource};
use crate::host::{RedrawSignal, SystemBrowser};
use crate::tags::WidgetOptions;
use crate::types::LocalizableName;

mod confirm;
pub mod document;
pub mod list;
mod logs_ui;
mod main_screen;
pub mod nodes;
mod nodes_screen;
mod runtime;
pub mod settings;
pub mod thumbnails;

pub use runtime::rt;

use confirm::DeletePrompt;
use document::NodeDocument;
use list::{CardListController, ListDeps, ListQuery};
use nodes::NodeHost;
use settings::{AppSettings, SettingsStore};
use thumbnails::ThumbnailCache;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::EnumIter)]
enum Screen {
    Library,
    TriggerWords,
}

impl LocalizableName for Screen {
    fn localization_key(&self) -> &'static str {
        match self {
            Screen::Library => "screen-library",
            Screen::TriggerWords => "screen-trigger-words",
        }
    }
}

pub struct PromptLibraryApp {
    screen: Screen,
    store: SettingsStore,
    settings: AppSettings,
    list: CardListController,
    thumbnails: ThumbnailCache,
    nodes: NodeHost,
    delete_prompt: DeletePrompt,
    // Uncommitted text of the search field
    search_input: String,
    redraw: Arc<dyn RedrawSignal>,
}

fn widget_options(settings: &AppSettings) -> WidgetOptions {
    WidgetOptions {
        allow_strength_adjustment: settings.allow_strength_adjustment,
        allow_editing: settings.allow_editing,
        empty_text: crate::localization::translate("tags-empty"),
        error_text: crate::localization::translate("tags-error"),
    }
}

fn build_list(settings: &AppSettings, redraw: Arc<dyn RedrawSignal>) -> CardListController {
    let http = HttpPromptSource::or_default(&settings.api_base_url);
    log::info!("Prompt library backend: {}", http.base_url());
    let source: Arc<dyn PromptSource> = Arc::new(http);
    let deps = ListDeps {
        source,
        links: Arc::new(SystemBrowser),
        redraw,
        runtime: rt().handle().clone(),
    };
    CardListController::new(
        ListQuery::new(settings.page_size, settings.default_sort),
        settings.response_ordering,
        deps,
    )
    .with_auto_refresh(settings.auto_refresh())
}

impl PromptLibraryApp {
    pub fn new(ctx: &egui::Context, store: SettingsStore) -> Self {
        let settings = store.current_or_default();
        let redraw: Arc<dyn RedrawSignal> = Arc::new(ctx.clone());

        let mut list = build_list(&settings, redraw.clone());
        list.refresh();
        let thumbnails = ThumbnailCache::new(list.source(), rt().handle().clone());

        let document = NodeDocument::load(&settings.document_path).unwrap_or_else(|e| {
            log::error!("Failed to load tag nodes: {e}");
            NodeDocument::default()
        });
        let nodes = NodeHost::from_document(document, widget_options(&settings), redraw.clone());
        let empty = nodes.nodes().is_empty();

        let mut app = Self {
            screen: Screen::Library,
            store,
            settings,
            list,
            thumbnails,
            nodes,
            delete_prompt: DeletePrompt::default(),
            search_input: String::new(),
            redraw,
        };
        if empty {
            app.add_tag_node();
        }
        app
    }

    /// New node with the capability defaults from the settings.
    fn add_tag_node(&mut self) -> u64 {
        let id = self.nodes.add_node(
            crate::localization::translate("node-default-title"),
            self.settings.allow_strength_adjustment,
        );
        if let Some(node) = self.nodes.node_mut(id) {
            node.default_active = self.settings.default_active;
        }
        id
    }

    /// Wheel sensitivity through the cached settings accessor, so edits to the file apply.
    fn wheel_sensitivity(&self) -> f32 {
        match self.store.current() {
            Ok(s) => s.wheel_sensitivity,
            Err(e) => {
                log::debug!("Settings unavailable, keeping wheel sensitivity: {e}");
                self.settings.wheel_sensitivity
            }
        }
    }

    fn apply_settings(&mut self, new: AppSettings) {
        let old = std::mem::replace(&mut self.settings, new);
        let s = &self.settings;

        if s.language != old.language {
            if let Err(e) = crate::localization::initialize_localization(s.language.as_deref()) {
                log::warn!("Language not applied: {e}");
            }
            log::info!("UI language: {}", crate::localization::current_language());
        }

        if s.api_base_url != old.api_base_url || s.page_size != old.page_size {
            log::info!("Backend settings changed, rebuilding the prompt list");
            let mut list = build_list(s, self.redraw.clone());
            list.refresh();
            self.thumbnails = ThumbnailCache::new(list.source(), rt().handle().clone());
            self.list = list;
        } else {
            self.list.set_ordering(s.response_ordering);
            self.list.set_auto_refresh(s.auto_refresh());
        }

        self.nodes.apply_options(widget_options(s));
        if s.document_path != old.document_path {
            self.save_nodes();
        }
    }

    fn save_nodes(&self) {
        let path = &self.settings.document_path;
        match self.nodes.to_document().save(path) {
            Ok(()) => log::debug!("Saved {} tags to {}", self.nodes.tag_count(), path.display()),
            Err(e) => log::error!("Failed to save tag nodes: {e}"),
        }
    }

    fn draw_top_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("screen_tabs").show(ctx, |ui| {
            ui.horizontal(|ui| {
                for screen in Screen::iter() {
                    let name = screen.localized_name();
                    ui.selectable_value(&mut self.screen, screen, name);
                }
            });
        });
    }
}

impl App for PromptLibraryApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = Instant::now();
        if self.list.poll_incoming() {
            self.thumbnails.retry_failed();
        }
        self.thumbnails.poll_incoming(ctx);
        self.list.tick(now);
        if let Some(wait) = self.list.next_refresh_in(now) {
            ctx.request_repaint_after(wait);
        }

        self.nodes.poll_updates();
        if self.nodes.take_dirty() {
            self.save_nodes();
        }

        if let Some(saved) = settings::draw_settings_viewport(ctx, &self.store) {
            self.apply_settings(saved);
        }
        logs_ui::draw_logs_viewport(ctx);
        if logs_ui::is_open() && crate::logger::take_new_flag() {
            ctx.request_repaint();
        }

        self.draw_top_bar(ctx);
        match self.screen {
            Screen::Library => main_screen::update_library(self, ctx),
            Screen::TriggerWords => nodes_screen::update_nodes(self, ctx),
        }
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.save_nodes();
    }
}
