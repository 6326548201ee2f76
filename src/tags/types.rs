use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// One editable phrase of a tag collection.
///
/// Fields the widget does not know about are kept in `extra` and written back
/// unchanged, so other collaborators can store their own data on a tag.
/// `highlighted` is derived from trigger words and is never serialized.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tag {
    pub text: String,
    pub active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strength: Option<f32>,
    #[serde(skip)]
    pub highlighted: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Tag {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            active: true,
            strength: None,
            highlighted: false,
            extra: Map::new(),
        }
    }

    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    #[cfg(test)]
    pub fn with_strength(mut self, strength: f32) -> Self {
        self.strength = Some(strength);
        self
    }

    /// Lenient conversion from whatever the host stored: missing text becomes "",
    /// anything but `false` counts as active, non-numeric strength is dropped.
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Object(map) => {
                let mut extra = map.clone();
                let text = match extra.remove("text") {
                    Some(Value::String(s)) => s,
                    Some(Value::Number(n)) => n.to_string(),
                    _ => String::new(),
                };
                let active = extra
                    .remove("active")
                    .and_then(|v| v.as_bool())
                    .unwrap_or(true);
                let strength = extra
                    .remove("strength")
                    .and_then(|v| v.as_f64())
                    .map(|s| s as f32);
                let highlighted = extra
                    .remove("highlighted")
                    .and_then(|v| v.as_bool())
                    .unwrap_or(false);
                Self {
                    text,
                    active,
                    strength,
                    highlighted,
                    extra,
                }
            }
            Value::String(s) => Tag::new(s.clone()),
            other => {
                log::debug!("Tag entry is not an object, using empty tag: {other}");
                Tag::new(String::new())
            }
        }
    }

    /// Chip label: the text, plus the strength when it is shown.
    pub fn label(&self, show_strength: bool) -> String {
        match self.strength {
            Some(s) if show_strength => format!("{} {:.2}", self.text, s),
            _ => self.text.clone(),
        }
    }
}

impl<'de> Deserialize<'de> for Tag {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(Tag::from_value(&value))
    }
}

/// Reads a persisted tag list. Accepts an array, or a string holding a JSON array
/// (older documents stored the widget value as text). Anything else is an empty list.
pub fn tags_from_value(value: &Value) -> Vec<Tag> {
    match value {
        Value::Array(items) => items.iter().map(Tag::from_value).collect(),
        Value::String(s) => match serde_json::from_str::<Value>(s) {
            Ok(Value::Array(items)) => items.iter().map(Tag::from_value).collect(),
            Ok(_) => Vec::new(),
            Err(e) => {
                log::warn!("Stored tag list is not valid JSON: {e}");
                Vec::new()
            }
        },
        _ => Vec::new(),
    }
}
