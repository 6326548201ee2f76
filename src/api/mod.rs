// Client of the prompt library backend.
// Public API:
//   - PromptRecord, LoraInfo, ListPage: typed response structures
//   - ListRequest: one list call (limit/offset/sort/favorites/search)
//   - PromptSource: async data source used by the card list
//   - HttpPromptSource: PromptSource over the REST backend
//
// Endpoints, relative to the configured base URL:
//   GET /list?limit&offset&sort_by&favorites_only&search
//   POST /favorite/{id}
//   DELETE /record/{id}
//   GET /export
//   GET /thumbnail/{filename}

use lazy_static::lazy_static;

mod error;
mod records;
mod source;

pub use error::ApiError;
pub use records::{parse_list_page, ListPage, ListRequest, PromptRecord};
pub use source::{HttpPromptSource, PromptSource};

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8188/prompt_library/api";

lazy_static! {
    static ref CLIENT: reqwest::Client = reqwest::Client::builder()
        .user_agent(concat!("prompt-library-manager/", env!("CARGO_PKG_VERSION")))
        .build()
        .unwrap();
    static ref DEFAULT_BASE: url::Url = url::Url::parse(DEFAULT_BASE_URL).unwrap();
}
