pub mod items;
pub mod render;
pub use render::draw_filters_panel;

use crate::types::SortBy;

/// Short glyph drawn inside a segment.
pub trait EnumWithAlternativeNames {
    fn alternative_name(&self) -> &'static str;
}

impl EnumWithAlternativeNames for SortBy {
    fn alternative_name(&self) -> &'static str {
        match self {
            SortBy::Date => "🕓",
            SortBy::Alphabetical => "A-Z",
        }
    }
}
