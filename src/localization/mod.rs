// Fluent based UI strings. Bundles are embedded; the manager is per thread.

use fluent_bundle::{FluentArgs, FluentBundle, FluentResource};
use std::cell::RefCell;
use std::collections::HashMap;
use thiserror::Error;
use unic_langid::LanguageIdentifier;

type Bundle = FluentBundle<FluentResource>;

const SUPPORTED_LANGS: [&str; 2] = ["en", "ru"];
const FALLBACK_LANG: &str = "en";

#[derive(Debug, Error)]
pub enum LocalizationError {
    #[error("unsupported language: {0}")]
    UnsupportedLanguage(String),
}

fn load_ftl_source(lang: &str) -> &'static str {
    match lang {
        "ru" => include_str!("resources/ru.ftl"),
        _ => include_str!("resources/en.ftl"),
    }
}

/// Reduces a locale like `ru_RU.UTF-8` to a supported short code.
fn normalize_lang(code: &str) -> Option<String> {
    let code = code.to_ascii_lowercase();
    let short = code.split(['-', '_', '.']).next().unwrap_or_default();
    SUPPORTED_LANGS.contains(&short).then(|| short.to_string())
}

fn build_bundle(code: &str) -> Option<Bundle> {
    let langid: LanguageIdentifier = code.parse().ok()?;
    let mut bundle = FluentBundle::new(vec![langid]);
    // Isolation marks render as boxes in egui.
    bundle.set_use_isolating(false);
    let resource = match FluentResource::try_new(load_ftl_source(code).to_string()) {
        Ok(res) => res,
        Err((res, errors)) => {
            log::warn!("{} syntax errors in {code}.ftl", errors.len());
            res
        }
    };
    if let Err(errors) = bundle.add_resource(resource) {
        log::warn!("{} duplicate messages in {code}.ftl", errors.len());
    }
    Some(bundle)
}

struct LocalizationManager {
    current: String,
    bundles: HashMap<String, Bundle>,
}

impl LocalizationManager {
    fn new() -> Self {
        let bundles = SUPPORTED_LANGS
            .iter()
            .filter_map(|&code| build_bundle(code).map(|b| (code.to_string(), b)))
            .collect();
        Self {
            current: FALLBACK_LANG.to_string(),
            bundles,
        }
    }

    fn set_current(&mut self, code: &str) -> Result<(), LocalizationError> {
        let short = normalize_lang(code)
            .filter(|c| self.bundles.contains_key(c))
            .ok_or_else(|| LocalizationError::UnsupportedLanguage(code.to_string()))?;
        self.current = short;
        Ok(())
    }

    fn set_auto(&mut self) {
        let detected = sys_locale::get_locale()
            .and_then(|l| normalize_lang(&l))
            .unwrap_or_else(|| FALLBACK_LANG.to_string());
        self.current = detected;
    }

    fn format(&self, id: &str, args: Option<&FluentArgs>) -> String {
        [self.current.as_str(), FALLBACK_LANG]
            .into_iter()
            .filter_map(|code| self.bundles.get(code))
            .find_map(|bundle| {
                let pattern = bundle.get_message(id)?.value()?;
                let mut errors = vec![];
                Some(bundle.format_pattern(pattern, args, &mut errors).to_string())
            })
            .unwrap_or_else(|| format!("[missing: {id}]"))
    }
}

thread_local! {
    static LOCALIZATION: RefCell<LocalizationManager> = RefCell::new(LocalizationManager::new());
}

/// `None` follows the system locale. An unsupported code falls back to English and errors.
pub fn initialize_localization(preferred_lang: Option<&str>) -> Result<(), LocalizationError> {
    LOCALIZATION.with(|cell| {
        let mut mgr = cell.borrow_mut();
        match preferred_lang {
            Some(code) => mgr.set_current(code).map_err(|e| {
                mgr.current = FALLBACK_LANG.to_string();
                e
            }),
            None => {
                mgr.set_auto();
                Ok(())
            }
        }
    })
}

pub fn current_language() -> String {
    LOCALIZATION.with(|cell| cell.borrow().current.clone())
}

pub fn available_languages() -> Vec<String> {
    SUPPORTED_LANGS.iter().map(|s| s.to_string()).collect()
}

pub fn translate(message_id: &str) -> String {
    LOCALIZATION.with(|cell| cell.borrow().format(message_id, None))
}

pub fn translate_with(message_id: &str, args: &[(&str, String)]) -> String {
    let mut fargs = FluentArgs::new();
    for (k, v) in args {
        fargs.set(*k, v.clone());
    }
    LOCALIZATION.with(|cell| cell.borrow().format(message_id, Some(&fargs)))
}

/// Like `translate_with` for a single numeric `$count`, so plural variants select.
pub fn translate_count(message_id: &str, count: u64) -> String {
    let mut fargs = FluentArgs::new();
    fargs.set("count", count);
    LOCALIZATION.with(|cell| cell.borrow().format(message_id, Some(&fargs)))
}
