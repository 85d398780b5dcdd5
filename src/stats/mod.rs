use crate::models::{TranslationStatus, TsDocument};
use serde::Serialize;
use std::fmt;

/// Completion counts for a catalog, as a release tool would report them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CatalogStats {
    pub contexts: usize,
    pub messages: usize,
    /// Finished with a non-empty translation
    pub finished: usize,
    pub unfinished: usize,
    /// Marked finished but the translation text is empty
    pub untranslated: usize,
    /// Vanished or obsolete
    pub obsolete: usize,
}

impl CatalogStats {
    pub fn from_document(doc: &TsDocument) -> Self {
        let mut stats = CatalogStats {
            contexts: doc.contexts.len(),
            ..Default::default()
        };

        for (_, entry) in doc.entries() {
            stats.messages += 1;
            match entry.status {
                TranslationStatus::Finished if entry.translation.is_empty() => stats.untranslated += 1,
                TranslationStatus::Finished => stats.finished += 1,
                TranslationStatus::Unfinished => stats.unfinished += 1,
                TranslationStatus::Vanished | TranslationStatus::Obsolete => stats.obsolete += 1,
            }
        }
        stats
    }

    pub fn active(&self) -> usize {
        self.messages - self.obsolete
    }

    /// Share of active messages that resolve to a translation.
    pub fn completion_ratio(&self) -> f64 {
        match self.active() {
            0 => 0.0,
            active => self.finished as f64 / active as f64,
        }
    }
}

impl fmt::Display for CatalogStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Generated {} translation(s) ({} finished and {} unfinished)",
            self.finished + self.unfinished,
            self.finished,
            self.unfinished
        )?;
        if self.untranslated > 0 {
            write!(f, "\nIgnored {} untranslated source text(s)", self.untranslated)?;
        }
        Ok(())
    }
}

/// Active sources that fall back to the source text at runtime, in file order.
pub fn untranslated_sources(doc: &TsDocument) -> Vec<(&str, &str)> {
    doc.entries()
        .filter(|(_, entry)| entry.status.is_active() && !entry.is_usable())
        .map(|(ctx, entry)| (ctx.name.as_str(), entry.source.as_str()))
        .collect()
}
