use super::Catalog;
use crate::config::Config;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const FALLBACK_LOCALE: &str = "en";

/// `ru-RU.UTF-8@euro` -> `ru_RU`
pub fn normalize_locale(locale: &str) -> String {
    let end = locale.find(['.', '@']).unwrap_or(locale.len());
    locale[..end].trim().replace('-', "_")
}

/// File names tried for a locale, most specific first:
/// `prefix_ru_RU.ts`, `prefix_ru.ts`, `prefix.ts`.
pub fn candidate_file_names(prefix: &str, locale: &str) -> Vec<String> {
    let locale = normalize_locale(locale);
    let parts: Vec<&str> = locale.split('_').filter(|p| !p.is_empty()).collect();

    let mut names: Vec<String> = (1..=parts.len())
        .rev()
        .map(|n| format!("{}_{}.ts", prefix, parts[..n].join("_")))
        .collect();
    names.push(format!("{}.ts", prefix));
    names
}

pub fn resolve_catalog(dir: &Path, prefix: &str, locale: &str) -> Option<PathBuf> {
    candidate_file_names(prefix, locale)
        .into_iter()
        .map(|name| dir.join(name))
        .find(|path| {
            debug!("Trying catalog {}", path.display());
            path.is_file()
        })
}

/// Load the catalog for `locale`. A missing or broken catalog is not an error
/// for the application: it gets an empty catalog and shows source strings.
pub fn load_for_locale(dir: &Path, prefix: &str, locale: &str) -> Catalog {
    let Some(path) = resolve_catalog(dir, prefix, locale) else {
        warn!(
            "No translation catalog for locale {} in {}",
            locale,
            dir.display()
        );
        return Catalog::empty();
    };

    match Catalog::load(&path) {
        Ok(catalog) => catalog,
        Err(e) => {
            warn!("Failed to load catalog {}: {}", path.display(), e);
            Catalog::empty()
        }
    }
}

/// Pick the UI locale: command line, then config file, then the OS, then English.
pub fn select_locale(cli_lang: Option<&str>, config: &Config) -> String {
    let chosen = cli_lang
        .map(str::to_string)
        .filter(is_set)
        .or_else(|| config.language.clone().filter(is_set))
        .or_else(|| sys_locale::get_locale().filter(is_set))
        .unwrap_or_else(|| FALLBACK_LOCALE.to_string());
    let locale = normalize_locale(&chosen);
    info!("Using locale {}", locale);
    locale
}

fn is_set(locale: &String) -> bool {
    !locale.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn normalizes_os_locale_strings() {
        assert_eq!(normalize_locale("ru-RU"), "ru_RU");
        assert_eq!(normalize_locale("ru_RU.UTF-8"), "ru_RU");
        assert_eq!(normalize_locale("de_DE@euro"), "de_DE");
        assert_eq!(normalize_locale("en"), "en");
    }

    #[test]
    fn candidates_go_from_specific_to_generic() {
        assert_eq!(
            candidate_file_names("isomeshviewer", "ru_RU"),
            vec![
                "isomeshviewer_ru_RU.ts".to_string(),
                "isomeshviewer_ru.ts".to_string(),
                "isomeshviewer.ts".to_string(),
            ]
        );
        assert_eq!(
            candidate_file_names("app", "sr-Latn-RS"),
            vec!["app_sr_Latn_RS.ts", "app_sr_Latn.ts", "app_sr.ts", "app.ts"]
        );
        assert_eq!(candidate_file_names("app", ""), vec!["app.ts"]);
    }

    #[test]
    fn resolves_language_only_catalog() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("isomeshviewer_ru.ts"), "<TS/>").unwrap();

        let path = resolve_catalog(dir.path(), "isomeshviewer", "ru_RU").unwrap();
        assert!(path.ends_with("isomeshviewer_ru.ts"));
        assert!(resolve_catalog(dir.path(), "isomeshviewer", "de_DE").is_none());
    }

    #[test]
    fn broken_or_missing_catalog_loads_empty() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("isomeshviewer_ru.ts"), "<TS><context>").unwrap();

        assert!(load_for_locale(dir.path(), "isomeshviewer", "ru").is_empty());
        let missing = load_for_locale(dir.path(), "isomeshviewer", "fr");
        assert_eq!(missing.lookup("Box"), "Box");
    }

    #[test]
    fn cli_language_wins_over_config() {
        let config = Config {
            language: Some("en_US".to_string()),
            ..Config::default()
        };
        assert_eq!(select_locale(Some("ru-RU"), &config), "ru_RU");
        assert_eq!(select_locale(None, &config), "en_US");
    }

    #[test]
    fn blank_cli_language_defers_to_config() {
        let config = Config {
            language: Some("ru_RU".to_string()),
            ..Config::default()
        };
        assert_eq!(select_locale(Some(""), &config), "ru_RU");
        assert_eq!(select_locale(Some("  "), &config), "ru_RU");

        let blank = Config {
            language: Some(String::new()),
            ..Config::default()
        };
        assert_eq!(select_locale(Some("ru"), &blank), "ru");
        assert!(!select_locale(None, &blank).is_empty());
    }
}
