use lazy_static::lazy_static;
use regex::Regex;

use crate::ui_constants::strength::{MAX, MIN};

lazy_static! {
    // "(word:1.2)" as produced by the prompt backend
    static ref WEIGHTED: Regex = Regex::new(r"^\((.+?):([\d.]+)\)$").unwrap();
}

pub fn clamp_strength(value: f32) -> f32 {
    value.clamp(MIN, MAX)
}

/// Two decimals, the precision shown on chips and written to prompts.
pub fn round_strength(value: f32) -> f32 {
    (value * 100.0).round() / 100.0
}

pub fn format_weighted(text: &str, strength: f32) -> String {
    format!("({}:{:.2})", text, strength)
}

/// Splits "(word:1.2)" into ("word", Some(1.2)); the strength is clamped.
/// Text that is not in the weighted form comes back unchanged with `None`.
pub fn parse_weighted(text: &str) -> (String, Option<f32>) {
    let trimmed = text.trim();
    if let Some(caps) = WEIGHTED.captures(trimmed) {
        if let Ok(strength) = caps[2].parse::<f32>() {
            return (caps[1].trim().to_string(), Some(clamp_strength(strength)));
        }
    }
    (text.to_string(), None)
}
