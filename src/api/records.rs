use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};

use crate::types::SortBy;

/// Accepts `true`/`false`, SQLite style `0`/`1` and their string forms.
fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum FlagValue {
        Bool(bool),
        Int(i64),
        Float(f64),
        Str(String),
    }

    Ok(match Option::<FlagValue>::deserialize(deserializer)? {
        Some(FlagValue::Bool(b)) => b,
        Some(FlagValue::Int(n)) => n != 0,
        Some(FlagValue::Float(n)) => n != 0.0,
        Some(FlagValue::Str(s)) => matches!(s.trim(), "1" | "true" | "True"),
        None => false,
    })
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LoraInfo {
    #[serde(default, alias = "lora_name")]
    pub name: String,
    #[serde(default)]
    pub strength: f32,
}

/// One generation entry of the prompt library.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PromptRecord {
    pub id: i64,
    #[serde(default, alias = "createdAt")]
    pub created_at: String,
    #[serde(default, alias = "promptText")]
    pub prompt_text: String,
    #[serde(default, alias = "negativePrompt")]
    pub negative_prompt: Option<String>,
    #[serde(default, alias = "isFavorite", deserialize_with = "deserialize_flag")]
    pub is_favorite: bool,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub seed: Option<i64>,
    #[serde(default)]
    pub checkpoint: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub loras: Vec<LoraInfo>,
    #[serde(default, alias = "thumbnailPath")]
    pub thumbnail_path: Option<String>,
}

/// Last path segment, for both `/` and `\` separated paths.
fn file_name(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

impl PromptRecord {
    pub fn thumbnail_filename(&self) -> Option<&str> {
        self.thumbnail_path
            .as_deref()
            .map(file_name)
            .filter(|name| !name.is_empty())
    }

    pub fn checkpoint_name(&self) -> Option<&str> {
        self.checkpoint
            .as_deref()
            .map(file_name)
            .filter(|name| !name.is_empty())
    }

    pub fn size(&self) -> Option<(u32, u32)> {
        match (self.width, self.height) {
            (Some(w), Some(h)) if w > 0 && h > 0 => Some((w, h)),
            _ => None,
        }
    }

    /// First `max_chars` characters, with an ellipsis when cut.
    pub fn preview(&self, max_chars: usize) -> String {
        let mut chars = self.prompt_text.chars();
        let head: String = chars.by_ref().take(max_chars).collect();
        if chars.next().is_some() {
            format!("{head}...")
        } else {
            head
        }
    }

    /// `created_at` as "Mar 4, 2024 09:15"; unparsable values are shown as is.
    pub fn created_display(&self) -> String {
        let raw = self.created_at.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return dt.format("%b %-d, %Y %H:%M").to_string();
        }
        for pattern in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
            if let Ok(dt) = NaiveDateTime::parse_from_str(raw, pattern) {
                return dt.format("%b %-d, %Y %H:%M").to_string();
            }
        }
        raw.to_string()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ListPage {
    #[serde(default, alias = "records", deserialize_with = "null_as_empty")]
    pub prompts: Vec<PromptRecord>,
    #[serde(default)]
    pub total: u64,
}

pub fn parse_list_page(body: &str) -> Result<ListPage, serde_json::Error> {
    serde_json::from_str(body)
}

/// One `GET /list` call.
#[derive(Debug, Clone, PartialEq)]
pub struct ListRequest {
    pub limit: u32,
    pub offset: u64,
    pub sort_by: SortBy,
    pub favorites_only: bool,
    pub search: Option<String>,
}

impl ListRequest {
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("limit", self.limit.to_string()),
            ("offset", self.offset.to_string()),
            ("sort_by", self.sort_by.api_value().to_string()),
            (
                "favorites_only",
                if self.favorites_only { "1" } else { "0" }.to_string(),
            ),
        ];
        if let Some(search) = self.search.as_deref().filter(|s| !s.is_empty()) {
            pairs.push(("search", search.to_string()));
        }
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_rows_deserialize() {
        let page = parse_list_page(
            r#"{
                "prompts": [
                    { "id": 7, "created_at": "2024-03-04 09:15:00", "prompt_text": "a castle",
                      "is_favorite": 1, "width": 832, "height": 1216, "seed": null,
                      "checkpoint": "models/sdxl\\juggernaut.safetensors",
                      "loras": [{ "name": "detail", "strength": 0.8 }],
                      "thumbnail_path": "C:\\out\\thumbs\\7.png" },
                    { "id": 8, "createdAt": "2024-03-05T10:00:00Z", "promptText": "fog",
                      "isFavorite": false, "loras": null }
                ],
                "total": 45
            }"#,
        )
        .unwrap();

        assert_eq!(page.total, 45);
        let first = &page.prompts[0];
        assert!(first.is_favorite);
        assert_eq!(first.seed, None);
        assert_eq!(first.size(), Some((832, 1216)));
        assert_eq!(first.checkpoint_name(), Some("juggernaut.safetensors"));
        assert_eq!(first.thumbnail_filename(), Some("7.png"));
        assert_eq!(first.created_display(), "Mar 4, 2024 09:15");

        let second = &page.prompts[1];
        assert_eq!(second.prompt_text, "fog");
        assert!(!second.is_favorite);
        assert!(second.loras.is_empty());
        assert_eq!(second.thumbnail_filename(), None);
        assert_eq!(second.created_display(), "Mar 5, 2024 10:00");
    }

    #[test]
    fn records_key_is_accepted() {
        let page = parse_list_page(r#"{ "records": [{ "id": 1 }], "total": 1 }"#).unwrap();
        assert_eq!(page.prompts.len(), 1);
        assert_eq!(page.prompts[0].created_display(), "");
        assert!(parse_list_page(r#"{ "prompts": "nope" }"#).is_err());
    }

    #[test]
    fn preview_cuts_on_char_boundary() {
        let record = PromptRecord {
            prompt_text: "ёж".repeat(60),
            ..serde_json::from_str(r#"{ "id": 1 }"#).unwrap()
        };
        let preview = record.preview(100);
        assert!(preview.ends_with("..."));
        assert_eq!(preview.chars().count(), 103);
        assert_eq!(record.preview(500), record.prompt_text);
    }

    #[test]
    fn query_omits_empty_search() {
        let mut request = ListRequest {
            limit: 20,
            offset: 40,
            sort_by: SortBy::Alphabetical,
            favorites_only: true,
            search: Some(String::new()),
        };
        assert_eq!(
            request.query_pairs(),
            vec![
                ("limit", "20".to_string()),
                ("offset", "40".to_string()),
                ("sort_by", "alphabetical".to_string()),
                ("favorites_only", "1".to_string()),
            ]
        );
        request.search = Some("detail".into());
        assert_eq!(request.query_pairs().last(), Some(&("search", "detail".to_string())));
    }
}
