// Tag-editing nodes hosted by the app, and the trigger words notifications they consume.

use std::sync::{mpsc, Arc};

use super::document::{NodeDocument, NodeRecord};
use crate::host::RedrawSignal;
use crate::tags::{
    collect_highlight_tokens, split_trigger_groups, tags_from_trigger_words, HostWidget,
    TagCollectionWidget, WidgetOptions,
};

/// Name of the tag collection slot on a node.
pub const TAG_COLLECTION_ID: &str = "modify_tags";

/// "Trigger words updated" notification. `trigger_words_text` separates grouped
/// phrases with `,,` and words inside a group with `,`.
#[derive(Debug, Clone, PartialEq)]
pub struct TriggerWordsUpdate {
    pub target_id: u64,
    pub collection_id: String,
    pub trigger_words_text: String,
}

pub struct TagNode {
    pub id: u64,
    pub title: String,
    pub widget: TagCollectionWidget,
    pub original_trigger_words: String,
    pub default_active: bool,
    // Text field of the "add tag" row
    pub new_tag_input: String,
}

impl TagNode {
    fn new(id: u64, title: String, options: WidgetOptions, redraw: Arc<dyn RedrawSignal>) -> Self {
        Self {
            id,
            title,
            widget: TagCollectionWidget::new(options, redraw),
            original_trigger_words: String::new(),
            default_active: true,
            new_tag_input: String::new(),
        }
    }

    fn from_record(record: NodeRecord, options: WidgetOptions, redraw: Arc<dyn RedrawSignal>) -> Self {
        let mut node = Self::new(record.id, record.title, options, redraw);
        node.widget
            .set_allow_strength_adjustment(record.allow_strength_adjustment);
        node.widget.set_value(record.modify_tags);
        node.original_trigger_words = record.original_trigger_words;
        node.default_active = record.default_active;
        node.rebuild_highlight();
        node
    }

    pub fn to_record(&self) -> NodeRecord {
        NodeRecord {
            id: self.id,
            title: self.title.clone(),
            modify_tags: self.widget.serialize(),
            original_trigger_words: self.original_trigger_words.clone(),
            allow_strength_adjustment: self.widget.options().allow_strength_adjustment,
            default_active: self.default_active,
        }
    }

    /// Highlight derived from the stored trigger words; empty text clears it.
    pub fn rebuild_highlight(&mut self) {
        let groups = split_trigger_groups(&self.original_trigger_words);
        self.widget.apply_highlight(&collect_highlight_tokens(groups.as_slice()));
    }

    pub fn apply_trigger_words(&mut self, text: &str) {
        self.original_trigger_words = text.to_string();
        if !text.trim().is_empty() {
            self.rebuild_highlight();
        }
    }

    /// Appends the stored trigger words as tags.
    pub fn add_trigger_word_tags(&mut self) {
        let tags = tags_from_trigger_words(&self.original_trigger_words, self.default_active);
        if tags.is_empty() {
            return;
        }
        self.widget.extend(tags);
        self.rebuild_highlight();
    }

    /// Changing the default also switches every existing tag.
    pub fn set_default_active(&mut self, active: bool) {
        self.default_active = active;
        self.widget.set_all_active(active);
        self.rebuild_highlight();
    }
}

pub struct NodeHost {
    nodes: Vec<TagNode>,
    options: WidgetOptions,
    redraw: Arc<dyn RedrawSignal>,
    tx: mpsc::Sender<TriggerWordsUpdate>,
    rx: mpsc::Receiver<TriggerWordsUpdate>,
    dirty: bool,
}

impl NodeHost {
    pub fn new(options: WidgetOptions, redraw: Arc<dyn RedrawSignal>) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            nodes: Vec::new(),
            options,
            redraw,
            tx,
            rx,
            dirty: false,
        }
    }

    pub fn from_document(
        document: NodeDocument,
        options: WidgetOptions,
        redraw: Arc<dyn RedrawSignal>,
    ) -> Self {
        let mut host = Self::new(options, redraw);
        host.nodes = document
            .nodes
            .into_iter()
            .map(|record| TagNode::from_record(record, host.options.clone(), host.redraw.clone()))
            .collect();
        log::info!("Restored {} tag nodes", host.nodes.len());
        host
    }

    pub fn to_document(&self) -> NodeDocument {
        NodeDocument {
            nodes: self.nodes.iter().map(TagNode::to_record).collect(),
        }
    }

    /// Producers of trigger words notifications send through this.
    pub fn sender(&self) -> mpsc::Sender<TriggerWordsUpdate> {
        self.tx.clone()
    }

    pub fn nodes(&self) -> &[TagNode] {
        &self.nodes
    }

    pub fn nodes_mut(&mut self) -> &mut [TagNode] {
        &mut self.nodes
    }

    pub fn node_mut(&mut self, id: u64) -> Option<&mut TagNode> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    pub fn add_node(&mut self, title: impl Into<String>, allow_strength_adjustment: bool) -> u64 {
        let id = self.nodes.iter().map(|n| n.id).max().map_or(1, |max| max + 1);
        let mut node = TagNode::new(id, title.into(), self.options.clone(), self.redraw.clone());
        node.widget.set_allow_strength_adjustment(allow_strength_adjustment);
        self.nodes.push(node);
        self.dirty = true;
        id
    }

    pub fn remove_node(&mut self, id: u64) -> bool {
        let before = self.nodes.len();
        self.nodes.retain(|n| n.id != id);
        let removed = self.nodes.len() != before;
        self.dirty |= removed;
        removed
    }

    /// Host-wide switches and placeholder texts from the settings.
    /// Strength adjustment stays a per-node choice.
    pub fn apply_options(&mut self, options: WidgetOptions) {
        for node in &mut self.nodes {
            node.widget.set_allow_editing(options.allow_editing);
            node.widget
                .set_placeholder_texts(options.empty_text.clone(), options.error_text.clone());
        }
        self.options = options;
    }

    pub fn handle_trigger_update(&mut self, update: TriggerWordsUpdate) -> bool {
        if update.collection_id != TAG_COLLECTION_ID {
            log::warn!(
                "Trigger words for unknown collection {:?} on node {}",
                update.collection_id,
                update.target_id
            );
            return false;
        }
        let Some(node) = self.node_mut(update.target_id) else {
            log::warn!("Node not found for trigger words update: {}", update.target_id);
            return false;
        };
        node.apply_trigger_words(&update.trigger_words_text);
        self.dirty = true;
        self.redraw.request_redraw();
        true
    }

    pub fn poll_updates(&mut self) -> bool {
        let mut handled = false;
        while let Ok(update) = self.rx.try_recv() {
            handled |= self.handle_trigger_update(update);
        }
        handled
    }

    /// Node level edits made directly on a `TagNode` by the UI.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// True once after any node or tag change that should be persisted.
    pub fn take_dirty(&mut self) -> bool {
        let mut dirty = std::mem::take(&mut self.dirty);
        for node in &mut self.nodes {
            dirty |= node.widget.take_changed();
        }
        dirty
    }

    pub fn tag_count(&self) -> usize {
        self.nodes.iter().map(|n| n.widget.get_value().len()).sum()
    }
}
