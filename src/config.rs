use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const APP_DIR: &str = "isomesh-viewer";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Interface locale, e.g. "ru_RU". Unset means the OS locale.
    #[serde(default)]
    pub language: Option<String>,
    /// Directory holding the `.ts` catalogs
    #[serde(default)]
    pub translations_directory: Option<PathBuf>,
    /// Catalog file name prefix: `<prefix>_<locale>.ts`
    #[serde(default = "default_catalog_prefix")]
    pub catalog_prefix: String,
}

fn default_catalog_prefix() -> String {
    "isomeshviewer".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            language: None,
            translations_directory: None,
            catalog_prefix: default_catalog_prefix(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            load_from_path(&config_path)
        } else {
            let config = Config::default();
            config.save()?;
            Ok(config)
        }
    }

    pub fn save(&self) -> Result<()> {
        save_to_path(self, &Self::config_path()?)
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR);
        Ok(config_dir.join("config.toml"))
    }

    /// Directory with the catalogs. Defaults to the user data directory.
    pub fn translations_directory_path(&self) -> PathBuf {
        self.translations_directory.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(APP_DIR)
                .join("translations")
        })
    }
}

pub fn load_from_path(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    Ok(config)
}

pub fn save_to_path(config: &Config, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_fields_use_defaults() {
        let config: Config = toml::from_str("language = \"ru_RU\"").unwrap();
        assert_eq!(config.language.as_deref(), Some("ru_RU"));
        assert_eq!(config.catalog_prefix, "isomeshviewer");
        assert!(config.translations_directory.is_none());
    }

    #[test]
    fn save_and_load_from_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = Config {
            language: Some("ru".to_string()),
            translations_directory: Some(PathBuf::from("/opt/isomesh/translations")),
            ..Config::default()
        };

        save_to_path(&config, &path).unwrap();
        assert_eq!(load_from_path(&path).unwrap(), config);
    }

    #[test]
    fn explicit_translations_directory_is_used() {
        let config = Config {
            translations_directory: Some(PathBuf::from("catalogs")),
            ..Config::default()
        };
        assert_eq!(config.translations_directory_path(), PathBuf::from("catalogs"));
    }
}
