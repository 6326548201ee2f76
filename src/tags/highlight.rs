use std::collections::HashSet;

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;

use super::Tag;

/// Separator between grouped trigger phrases. Words inside a group use a single comma.
pub const GROUP_SEPARATOR: &str = ",,";

lazy_static! {
    static ref COMMA_RUN: Regex = Regex::new(r",{2,}").unwrap();
}

pub fn normalize_tag_text(text: &str) -> String {
    text.trim().to_lowercase()
}

/// "a,, b ,,c,,," -> ["a", "b", "c"]
pub fn split_trigger_groups(text: &str) -> Vec<String> {
    text.split(GROUP_SEPARATOR)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Tokens a tag may match: every whole word, every `,,` group inside it and
/// every single-comma part, all normalized.
pub fn collect_highlight_tokens<S: AsRef<str>>(words: &[S]) -> HashSet<String> {
    let mut tokens = HashSet::new();
    let mut insert = |raw: &str| {
        let norm = normalize_tag_text(raw);
        if !norm.is_empty() {
            tokens.insert(norm);
        }
    };

    for word in words {
        let word = word.as_ref();
        insert(word);
        for group in COMMA_RUN.split(word) {
            insert(group);
            for part in group.split(',') {
                insert(part);
            }
        }
        for part in word.split(',') {
            insert(part);
        }
    }
    tokens
}

/// Whole-token match of a tag text against the set; the text itself or any of
/// its grouped / comma-separated sub-phrases. Never a substring match.
pub fn tag_matches_tokens(text: &str, tokens: &HashSet<String>) -> bool {
    if tokens.is_empty() {
        return false;
    }
    if tokens.contains(&normalize_tag_text(text)) {
        return true;
    }
    COMMA_RUN
        .split(text)
        .flat_map(|group| std::iter::once(group).chain(group.split(',')))
        .map(normalize_tag_text)
        .any(|part| !part.is_empty() && tokens.contains(&part))
}

/// Builds the tag list of a node from trigger words text: one tag per `,,` group
/// when groups are present, otherwise one per comma word.
pub fn tags_from_trigger_words(text: &str, default_active: bool) -> Vec<Tag> {
    let pieces: Vec<String> = if text.contains(GROUP_SEPARATOR) {
        split_trigger_groups(text)
    } else {
        text.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    };

    pieces
        .into_iter()
        .map(|piece| {
            let mut tag = Tag::new(piece).with_active(default_active);
            tag.highlighted = true;
            tag.extra
                .insert("category".to_string(), Value::String("Lora".to_string()));
            tag
        })
        .collect()
}
