use crate::errors::CatalogResult;
use serde::{Deserialize, Serialize};

/// Where a source string was extracted from (`<location filename=".." line=".."/>`).
/// Only used by translators; ignored at runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub filename: String,
    pub line: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranslationStatus {
    #[default]
    Finished,
    Unfinished,
    Vanished,
    Obsolete,
}

impl TranslationStatus {
    /// Map the `type` attribute of `<translation>`. Unknown values count as unfinished.
    pub fn from_type_attr(value: Option<&str>) -> Self {
        match value {
            None | Some("") => TranslationStatus::Finished,
            Some("vanished") => TranslationStatus::Vanished,
            Some("obsolete") => TranslationStatus::Obsolete,
            Some(_) => TranslationStatus::Unfinished,
        }
    }

    /// Vanished and obsolete entries no longer exist in the UI sources.
    pub fn is_active(&self) -> bool {
        matches!(self, TranslationStatus::Finished | TranslationStatus::Unfinished)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TranslationEntry {
    pub source: String,
    /// Disambiguation comment, part of the lookup key together with `source`
    pub comment: Option<String>,
    pub locations: Vec<Location>,
    pub translation: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub plural_forms: Vec<String>,
    pub status: TranslationStatus,
}

impl TranslationEntry {
    pub fn new(source: impl Into<String>, translation: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            translation: translation.into(),
            ..Default::default()
        }
    }

    /// A translation is only shown when it is finished and non-empty.
    pub fn is_usable(&self) -> bool {
        self.status == TranslationStatus::Finished && !self.translation.is_empty()
    }

    pub fn is_numerus(&self) -> bool {
        !self.plural_forms.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Context {
    pub name: String,
    pub entries: Vec<TranslationEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TsDocument {
    pub version: Option<String>,
    pub language: Option<String>,
    pub source_language: Option<String>,
    pub contexts: Vec<Context>,
}

impl TsDocument {
    pub fn entries(&self) -> impl Iterator<Item = (&Context, &TranslationEntry)> {
        self.contexts
            .iter()
            .flat_map(|ctx| ctx.entries.iter().map(move |entry| (ctx, entry)))
    }

    pub fn message_count(&self) -> usize {
        self.contexts.iter().map(|ctx| ctx.entries.len()).sum()
    }

    pub fn to_json(&self) -> CatalogResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
