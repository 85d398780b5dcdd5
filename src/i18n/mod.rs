mod catalog;
mod resolve;

pub use catalog::{Catalog, SearchHit};
pub use resolve::{candidate_file_names, load_for_locale, normalize_locale, resolve_catalog, select_locale};

use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Language {
    #[serde(rename = "ru")]
    Russian,
    #[default]
    #[serde(rename = "en")]
    English,
}

impl Language {
    /// Accepts bare language codes as well as full locales (`ru`, `ru_RU`, `ru-RU.UTF-8`).
    /// Unknown languages use English rules.
    pub fn from_code(code: &str) -> Self {
        let normalized = normalize_locale(code);
        let language = normalized.split('_').next().unwrap_or_default();
        match language.to_ascii_lowercase().as_str() {
            "ru" => Language::Russian,
            _ => Language::English,
        }
    }

    pub fn to_code(&self) -> &'static str {
        match self {
            Language::Russian => "ru",
            Language::English => "en",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Language::Russian => "Русский",
            Language::English => "English",
        }
    }

    /// Index of the numerus form used for `n`.
    pub fn plural_index(&self, n: u64) -> usize {
        match self {
            Language::Russian => {
                let (mod10, mod100) = (n % 10, n % 100);
                if mod10 == 1 && mod100 != 11 {
                    0
                } else if (2..=4).contains(&mod10) && !(12..=14).contains(&mod100) {
                    1
                } else {
                    2
                }
            }
            Language::English => usize::from(n != 1),
        }
    }
}

static INSTALLED: OnceLock<Catalog> = OnceLock::new();

/// Install the process-wide catalog. Only the first call has an effect.
pub fn install(catalog: Catalog) -> bool {
    INSTALLED.set(catalog).is_ok()
}

pub fn installed() -> Option<&'static Catalog> {
    INSTALLED.get()
}

/// Translate with the installed catalog; without one every key maps to itself.
pub fn tr(key: &str) -> &str {
    match INSTALLED.get() {
        Some(catalog) => catalog.lookup(key),
        None => key,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_from_locale_codes() {
        assert_eq!(Language::from_code("ru"), Language::Russian);
        assert_eq!(Language::from_code("ru_RU"), Language::Russian);
        assert_eq!(Language::from_code("ru-RU.UTF-8"), Language::Russian);
        assert_eq!(Language::from_code("en_US"), Language::English);
        assert_eq!(Language::from_code("de"), Language::English);
        assert_eq!(Language::Russian.to_code(), "ru");
        assert_eq!(Language::from_code("ru_RU").display_name(), "Русский");
    }

    #[test]
    fn russian_plural_rule() {
        let ru = Language::Russian;
        let forms: Vec<usize> = [0, 1, 2, 5, 11, 12, 21, 22, 25, 101, 111, 112]
            .iter()
            .map(|&n| ru.plural_index(n))
            .collect();
        assert_eq!(forms, vec![2, 0, 1, 2, 2, 2, 0, 1, 2, 0, 2, 2]);
    }

    #[test]
    fn english_plural_rule() {
        assert_eq!(Language::English.plural_index(1), 0);
        assert_eq!(Language::English.plural_index(0), 1);
        assert_eq!(Language::English.plural_index(7), 1);
    }

    #[test]
    fn tr_installs_once() {
        let first = Catalog::parse(
            "<TS language=\"ru\"><context><name>C</name><message>\
             <source>Box</source><translation>Параллелепипед</translation>\
             </message></context></TS>",
        )
        .unwrap();
        assert!(install(first));
        assert!(!install(Catalog::empty()));
        assert_eq!(tr("Box"), "Параллелепипед");
        assert_eq!(tr("Unknown Key"), "Unknown Key");
    }
}
