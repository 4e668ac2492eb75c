use std::fs;
use std::path::PathBuf;

use camino::Utf8PathBuf;
use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{Organism, parse_organism_list};
use crate::error::BiogeneError;

pub const CONFIG_FILE: &str = "biogene.json";
pub const DEFAULT_EUTILS_URL: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils";

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub eutils: EutilsConfig,
    #[serde(default)]
    pub populate: PopulateConfig,
    #[serde(default)]
    pub uniprot_mapping_path: Option<Utf8PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct EutilsConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub tool: String,
    pub email: Option<String>,
    pub timeout_secs: u64,
}

impl Default for EutilsConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_EUTILS_URL.to_string(),
            api_key: None,
            tool: "biogene".to_string(),
            email: None,
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct PopulateConfig {
    pub organisms: String,
    pub retstart: i64,
    pub fetch: i64,
    pub total: i64,
    pub delay_ms: i64,
    pub retries: u32,
    pub retry_delay_secs: u64,
}

impl Default for PopulateConfig {
    fn default() -> Self {
        Self {
            organisms: "Homo sapiens".to_string(),
            retstart: 0,
            fetch: 50,
            total: -1,
            delay_ms: 5000,
            retries: 3,
            retry_delay_secs: 5 * 60,
        }
    }
}

impl PopulateConfig {
    pub fn organisms(&self) -> Result<Vec<Organism>, BiogeneError> {
        parse_organism_list(&self.organisms)
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    pub fn resolve(path: Option<&str>) -> Result<Config, BiogeneError> {
        let config_path = match path {
            Some(path) => Some(PathBuf::from(path)),
            None => Self::default_locations()
                .into_iter()
                .find(|candidate| candidate.exists()),
        };

        let Some(config_path) = config_path else {
            debug!("no config file found, using defaults");
            return Ok(Config::default());
        };

        debug!(path = %config_path.display(), "loading config");
        let content = fs::read_to_string(&config_path)
            .map_err(|_| BiogeneError::ConfigRead(config_path.clone()))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Config, BiogeneError> {
        serde_json::from_str(content).map_err(|err| BiogeneError::ConfigParse(err.to_string()))
    }

    fn default_locations() -> Vec<PathBuf> {
        let mut locations = vec![PathBuf::from(CONFIG_FILE)];
        if let Some(dirs) = BaseDirs::new() {
            locations.push(dirs.config_dir().join("biogene").join(CONFIG_FILE));
        }
        locations
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_yields_defaults() {
        let config = ConfigLoader::parse("{}").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.eutils.base_url, DEFAULT_EUTILS_URL);
        assert_eq!(config.populate.fetch, 50);
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let config = ConfigLoader::parse(
            r#"{"eutils": {"email": "lab@example.org"}, "populate": {"organisms": "Homo sapiens:Mus musculus", "delay_ms": 1000}}"#,
        )
        .unwrap();
        assert_eq!(config.eutils.email.as_deref(), Some("lab@example.org"));
        assert_eq!(config.eutils.tool, "biogene");
        assert_eq!(config.populate.delay_ms, 1000);
        assert_eq!(config.populate.total, -1);
        assert_eq!(config.populate.organisms().unwrap().len(), 2);
    }
}
