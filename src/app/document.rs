// Persisted host document: the tag nodes and their widget values.

use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::tags::{tags_from_value, Tag};

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("cannot access document {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("document {path} is not valid json: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

fn deserialize_tags<'de, D>(deserializer: D) -> Result<Vec<Tag>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(tags_from_value(&value))
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default, deserialize_with = "deserialize_tags")]
    pub modify_tags: Vec<Tag>,
    #[serde(default)]
    pub original_trigger_words: String,
    #[serde(default)]
    pub allow_strength_adjustment: bool,
    #[serde(default = "default_true")]
    pub default_active: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeDocument {
    #[serde(default)]
    pub nodes: Vec<NodeRecord>,
}

impl NodeDocument {
    /// A missing file is an empty document.
    pub fn load(path: &Path) -> Result<Self, DocumentError> {
        let data = match std::fs::read_to_string(path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("No node document at {}, starting empty", path.display());
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(DocumentError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        serde_json::from_str(&data).map_err(|source| DocumentError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), DocumentError> {
        let data = serde_json::to_string_pretty(self).map_err(|source| DocumentError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| DocumentError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        std::fs::write(path, data).map_err(|source| DocumentError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}
