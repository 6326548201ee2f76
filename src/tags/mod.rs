// Tag collection widget: data types, trigger-word highlighting, chip layout and the widget itself.
// Nothing here knows about egui windows; views::tag_panel adapts it to the host frame.

mod highlight;
mod layout;
mod strength;
mod types;
mod widget;

pub use highlight::{collect_highlight_tokens, split_trigger_groups, tags_from_trigger_words};
pub use types::{tags_from_value, Tag};
pub use widget::{CanvasError, DrawContext, HostWidget, TagCollectionWidget, WidgetOptions};
