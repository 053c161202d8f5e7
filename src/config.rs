use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::PrepdocError;

/// On-disk config (`prepdoc.json`). Every field can be overridden through
/// the `PREPDOC_*` environment variables, which also lets a deployment run
/// without any file at all.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub lims: Option<LimsConfig>,
    #[serde(default)]
    pub arnold: Option<ArnoldConfig>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct LimsConfig {
    pub base_url: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ArnoldConfig {
    pub host: String,
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub lims_base_url: String,
    pub lims_username: String,
    pub lims_password: String,
    pub arnold_host: String,
}

pub struct ConfigLoader;

impl ConfigLoader {
    pub fn resolve(path: Option<&str>) -> Result<ResolvedConfig, PrepdocError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from("prepdoc.json"),
        };

        let config = if config_path.exists() {
            let content = fs::read_to_string(&config_path)
                .map_err(|_| PrepdocError::ConfigRead(config_path.clone()))?;
            serde_json::from_str(&content)
                .map_err(|err| PrepdocError::ConfigParse(err.to_string()))?
        } else if path.is_some() {
            return Err(PrepdocError::ConfigRead(config_path));
        } else {
            Config::default()
        };

        Self::resolve_config(config)
    }

    pub fn resolve_config(config: Config) -> Result<ResolvedConfig, PrepdocError> {
        let lims_base_url = env_or("PREPDOC_LIMS_URL", config.lims.as_ref().map(|c| &c.base_url));
        let lims_username = env_or(
            "PREPDOC_LIMS_USERNAME",
            config.lims.as_ref().map(|c| &c.username),
        );
        let lims_password = env_or(
            "PREPDOC_LIMS_PASSWORD",
            config.lims.as_ref().map(|c| &c.password),
        );
        let arnold_host = env_or("PREPDOC_ARNOLD_HOST", config.arnold.as_ref().map(|c| &c.host));

        match (lims_base_url, lims_username, lims_password, arnold_host) {
            (Some(lims_base_url), Some(lims_username), Some(lims_password), Some(arnold_host)) => {
                Ok(ResolvedConfig {
                    lims_base_url,
                    lims_username,
                    lims_password,
                    arnold_host,
                })
            }
            _ => Err(PrepdocError::MissingConfig),
        }
    }
}

fn env_or(var: &str, fallback: Option<&String>) -> Option<String> {
    match std::env::var(var) {
        Ok(value) if !value.trim().is_empty() => Some(value.trim().to_string()),
        _ => fallback.cloned(),
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn resolve_complete_file_config() {
        let config = Config {
            lims: Some(LimsConfig {
                base_url: "https://lims.example.com".to_string(),
                username: "apiuser".to_string(),
                password: "secret".to_string(),
            }),
            arnold: Some(ArnoldConfig {
                host: "https://arnold.example.com/api/v1".to_string(),
            }),
        };

        let resolved = ConfigLoader::resolve_config(config).unwrap();
        assert_eq!(resolved.lims_base_url, "https://lims.example.com");
        assert_eq!(resolved.arnold_host, "https://arnold.example.com/api/v1");
    }

    #[test]
    fn incomplete_config_is_rejected() {
        let config = Config {
            lims: None,
            arnold: Some(ArnoldConfig {
                host: "https://arnold.example.com".to_string(),
            }),
        };
        let err = ConfigLoader::resolve_config(config).unwrap_err();
        assert_matches!(err, PrepdocError::MissingConfig);
    }
}
