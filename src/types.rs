use serde::{Deserialize, Serialize};

use crate::localization::translate;

/// Enums shown in selectors get a localized label.
pub trait LocalizableName {
    fn localization_key(&self) -> &'static str;

    fn localized_name(&self) -> String {
        translate(self.localization_key())
    }
}

#[derive(
    strum::EnumCount,
    strum::EnumIter,
    strum::Display,
    PartialEq,
    Eq,
    Clone,
    Copy,
    Default,
    Debug,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    #[default]
    Date,
    Alphabetical,
}

impl SortBy {
    // Values expected by the library backend
    pub fn api_value(&self) -> &'static str {
        match self {
            SortBy::Date => "date",
            SortBy::Alphabetical => "alphabetical",
        }
    }
}

impl LocalizableName for SortBy {
    fn localization_key(&self) -> &'static str {
        match self {
            SortBy::Date => "sort-date",
            SortBy::Alphabetical => "sort-alphabetical",
        }
    }
}
