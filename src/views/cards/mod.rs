// Prompt cards of the library list.
pub mod card;
mod meta_row;

pub use card::{mark_copied, prompt_card, CardAction};
