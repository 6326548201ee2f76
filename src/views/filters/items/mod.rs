// Filter panel building blocks.
pub mod search_field;
pub mod segmented_panel;
