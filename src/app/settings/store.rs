// Settings store: data types, file persistence and the cached accessor used by the app.

use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use thiserror::Error;

use crate::api::DEFAULT_BASE_URL;
use crate::app::list::ResponseOrdering;
use crate::types::SortBy;

pub const SETTINGS_PATH_ENV: &str = "PROMPT_LIBRARY_SETTINGS_PATH";
pub const API_URL_ENV: &str = "PROMPT_LIBRARY_API_URL";
const DEFAULT_SETTINGS_FILE: &str = "prompt_library_settings.json";

fn default_api_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}
fn default_page_size() -> u32 {
    20
}
fn default_wheel_sensitivity() -> f32 {
    0.02
}
fn default_true() -> bool {
    true
}
fn default_auto_refresh_secs() -> Option<u64> {
    Some(30)
}
fn default_document_path() -> PathBuf {
    PathBuf::from("tag_nodes.json")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default)]
    pub default_sort: SortBy,
    // Strength change per wheel notch
    #[serde(default = "default_wheel_sensitivity")]
    pub wheel_sensitivity: f32,
    #[serde(default)]
    pub allow_strength_adjustment: bool,
    // Active state of tags created from trigger words
    #[serde(default = "default_true")]
    pub default_active: bool,
    #[serde(default = "default_true")]
    pub allow_editing: bool,
    #[serde(default)]
    pub response_ordering: ResponseOrdering,
    // None disables the periodic list refresh
    #[serde(default = "default_auto_refresh_secs")]
    pub auto_refresh_secs: Option<u64>,
    #[serde(default = "default_document_path")]
    pub document_path: PathBuf,
    // UI language (None = auto/system). Legacy "auto" maps to None.
    #[serde(default, deserialize_with = "deserialize_language_opt")]
    pub language: Option<String>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            page_size: default_page_size(),
            default_sort: SortBy::default(),
            wheel_sensitivity: default_wheel_sensitivity(),
            allow_strength_adjustment: false,
            default_active: true,
            allow_editing: true,
            response_ordering: ResponseOrdering::default(),
            auto_refresh_secs: default_auto_refresh_secs(),
            document_path: default_document_path(),
            language: None,
        }
    }
}

fn deserialize_language_opt<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt
        .map(|s| s.trim().to_ascii_lowercase())
        .filter(|s| !s.is_empty() && s != "auto"))
}

#[derive(Debug, Clone, Error)]
pub enum SettingsUnavailable {
    #[error("cannot access settings file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: Arc<std::io::Error>,
    },
    #[error("settings file {path} is invalid: {source}")]
    Invalid {
        path: PathBuf,
        #[source]
        source: Arc<serde_json::Error>,
    },
}

impl AppSettings {
    pub fn load_from_file(path: &Path) -> Result<Self, SettingsUnavailable> {
        let data = std::fs::read_to_string(path).map_err(|source| SettingsUnavailable::Io {
            path: path.to_path_buf(),
            source: Arc::new(source),
        })?;
        serde_json::from_str(&data).map_err(|source| SettingsUnavailable::Invalid {
            path: path.to_path_buf(),
            source: Arc::new(source),
        })
    }

    pub fn save_to_file(&self, path: &Path) -> Result<(), SettingsUnavailable> {
        let data = serde_json::to_string_pretty(self).map_err(|source| {
            SettingsUnavailable::Invalid {
                path: path.to_path_buf(),
                source: Arc::new(source),
            }
        })?;
        std::fs::write(path, data).map_err(|source| SettingsUnavailable::Io {
            path: path.to_path_buf(),
            source: Arc::new(source),
        })
    }

    pub fn auto_refresh(&self) -> Option<Duration> {
        self.auto_refresh_secs
            .filter(|&secs| secs > 0)
            .map(Duration::from_secs)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var(API_URL_ENV) {
            if !url.trim().is_empty() {
                self.api_base_url = url.trim().to_string();
            }
        }
    }
}

pub fn settings_file_path() -> PathBuf {
    std::env::var_os(SETTINGS_PATH_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SETTINGS_FILE))
}

// Failed reads are cached as well.
struct Cached {
    loaded_at: Instant,
    value: Result<AppSettings, SettingsUnavailable>,
}

/// Settings file with a time-bounded in-memory copy.
/// A missing file means defaults; an unreadable or invalid one is reported.
pub struct SettingsStore {
    path: PathBuf,
    ttl: Duration,
    cache: RwLock<Option<Cached>>,
}

impl SettingsStore {
    pub const DEFAULT_TTL: Duration = Duration::from_secs(5);

    pub fn new(path: PathBuf, ttl: Duration) -> Self {
        Self {
            path,
            ttl,
            cache: RwLock::new(None),
        }
    }

    pub fn from_env() -> Self {
        Self::new(settings_file_path(), Self::DEFAULT_TTL)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn current(&self) -> Result<AppSettings, SettingsUnavailable> {
        self.current_at(Instant::now())
    }

    /// Settings as of `now`; the file is re-read once the cached copy is older than the TTL.
    pub fn current_at(&self, now: Instant) -> Result<AppSettings, SettingsUnavailable> {
        if let Ok(guard) = self.cache.read() {
            if let Some(cached) = guard.as_ref() {
                if now.saturating_duration_since(cached.loaded_at) < self.ttl {
                    return cached.value.clone();
                }
            }
        }

        let value = self.read_file().map(|mut settings| {
            settings.apply_env_overrides();
            settings
        });
        if let Ok(mut guard) = self.cache.write() {
            *guard = Some(Cached {
                loaded_at: now,
                value: value.clone(),
            });
        }
        value
    }

    fn read_file(&self) -> Result<AppSettings, SettingsUnavailable> {
        if self.path.exists() {
            AppSettings::load_from_file(&self.path)
        } else {
            log::debug!("No settings file at {}, using defaults", self.path.display());
            Ok(AppSettings::default())
        }
    }

    /// Falls back to defaults and logs when the file can't be used.
    pub fn current_or_default(&self) -> AppSettings {
        match self.current() {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("Using default settings: {e}");
                let mut settings = AppSettings::default();
                settings.apply_env_overrides();
                settings
            }
        }
    }

    pub fn save(&self, settings: &AppSettings) -> Result<(), SettingsUnavailable> {
        settings.save_to_file(&self.path)?;
        log::info!("Saved settings to {}", self.path.display());
        if let Ok(mut guard) = self.cache.write() {
            *guard = Some(Cached {
                loaded_at: Instant::now(),
                value: Ok(settings.clone()),
            });
        }
        Ok(())
    }

    pub fn invalidate(&self) {
        if let Ok(mut guard) = self.cache.write() {
            *guard = None;
        }
    }
}
