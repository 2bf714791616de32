use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::error::DexError;

pub const DEFAULT_CONFIG_FILE: &str = "dex-export.json";
pub const DEFAULT_BASE_URL: &str = "https://pokeapi.co/api/v2";
pub const DEFAULT_LANGUAGE: &str = "en";
pub const DEFAULT_SPECIES_LIMIT: u32 = 10_000;
pub const DEFAULT_WINDOW_SIZE: usize = 10;
pub const DEFAULT_WINDOW_DELAY_MS: u64 = 1_000;
pub const DEFAULT_OUTPUT: &str = "out/pokemon.csv";

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub species_limit: Option<u32>,
    #[serde(default)]
    pub window_size: Option<usize>,
    #[serde(default)]
    pub window_delay_ms: Option<u64>,
    #[serde(default)]
    pub cache_dir: Option<String>,
    #[serde(default)]
    pub output: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub base_url: String,
    pub language: String,
    pub species_limit: u32,
    pub window_size: usize,
    pub window_delay: Duration,
    /// `None` means the platform cache directory.
    pub cache_dir: Option<Utf8PathBuf>,
    pub output: Utf8PathBuf,
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Reads `dex-export.json` from the working directory, or `path` when given.
    /// A missing implicit file yields the defaults; a missing explicit one is an error.
    pub fn resolve(path: Option<&str>) -> Result<ResolvedConfig, DexError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(DEFAULT_CONFIG_FILE),
        };

        if path.is_none() && !config_path.exists() {
            return Self::resolve_config(Config::default());
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| DexError::ConfigRead(config_path.clone()))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|err| DexError::ConfigParse(err.to_string()))?;

        Self::resolve_config(config)
    }

    pub fn resolve_config(config: Config) -> Result<ResolvedConfig, DexError> {
        let window_size = config.window_size.unwrap_or(DEFAULT_WINDOW_SIZE);
        if window_size == 0 {
            return Err(DexError::InvalidConfig(
                "window_size must be at least 1".to_string(),
            ));
        }

        let species_limit = config.species_limit.unwrap_or(DEFAULT_SPECIES_LIMIT);
        if species_limit == 0 {
            return Err(DexError::InvalidConfig(
                "species_limit must be at least 1".to_string(),
            ));
        }

        let language = config
            .language
            .map(|value| value.trim().to_string())
            .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string());
        if language.is_empty() {
            return Err(DexError::InvalidConfig("language is empty".to_string()));
        }

        let base_url = config
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(ResolvedConfig {
            base_url,
            language,
            species_limit,
            window_size,
            window_delay: Duration::from_millis(
                config.window_delay_ms.unwrap_or(DEFAULT_WINDOW_DELAY_MS),
            ),
            cache_dir: config.cache_dir.map(Utf8PathBuf::from),
            output: Utf8PathBuf::from(config.output.unwrap_or_else(|| DEFAULT_OUTPUT.to_string())),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_to_empty_config() {
        let resolved = ConfigLoader::resolve_config(Config::default()).unwrap();
        assert_eq!(resolved.base_url, DEFAULT_BASE_URL);
        assert_eq!(resolved.language, "en");
        assert_eq!(resolved.window_size, 10);
        assert_eq!(resolved.window_delay, Duration::from_secs(1));
        assert!(resolved.cache_dir.is_none());
        assert_eq!(resolved.output.as_str(), DEFAULT_OUTPUT);
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let config = Config {
            base_url: Some("http://localhost:8080/api/v2/".to_string()),
            ..Config::default()
        };
        let resolved = ConfigLoader::resolve_config(config).unwrap();
        assert_eq!(resolved.base_url, "http://localhost:8080/api/v2");
    }
}
