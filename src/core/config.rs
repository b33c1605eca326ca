use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const CONFIG_FILE: &str = "config.yml";

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub location: LocationConfig,

    #[serde(default = "default_storage")]
    pub storage_folder: String,

    #[serde(default = "default_output")]
    pub output_folder: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ApiConfig {
    #[serde(default = "default_api_base")]
    pub base_url: String,
    /// Page opened after a successful login or registration.
    #[serde(default = "default_login_redirect")]
    pub login_redirect: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LocationConfig {
    #[serde(default = "default_reverse_geocode_url")]
    pub reverse_geocode_url: String,
    #[serde(default = "default_ip_lookup_url")]
    pub ip_lookup_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            location: LocationConfig::default(),
            storage_folder: default_storage(),
            output_folder: default_output(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_api_base(),
            login_redirect: default_login_redirect(),
        }
    }
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            reverse_geocode_url: default_reverse_geocode_url(),
            ip_lookup_url: default_ip_lookup_url(),
        }
    }
}

fn default_api_base() -> String {
    "http://localhost:8000".to_string()
}
fn default_login_redirect() -> String {
    "主页.html".to_string()
}
fn default_reverse_geocode_url() -> String {
    "https://nominatim.openstreetmap.org/reverse".to_string()
}
fn default_ip_lookup_url() -> String {
    "http://ip-api.com/json/".to_string()
}
fn default_storage() -> String {
    "data".to_string()
}
fn default_output() -> String {
    "output".to_string()
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new(CONFIG_FILE))
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            anyhow::bail!("{} not found.", path.display());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: Config = serde_yaml_ng::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let content = serde_yaml_ng::to_string(self)?;
        fs::write(CONFIG_FILE, content).context("Failed to write config.yml")?;
        Ok(())
    }

    pub fn ensure_directories(&self) -> Result<()> {
        fs::create_dir_all(&self.storage_folder)?;
        fs::create_dir_all(&self.output_folder)?;
        Ok(())
    }

    /// `<base_url>/<endpoint>` without doubled slashes.
    pub fn endpoint(&self, name: &str) -> String {
        format!("{}/{}", self.api.base_url.trim_end_matches('/'), name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_yaml_fills_defaults() -> Result<()> {
        let temp_dir = tempfile::tempdir()?;
        let path = temp_dir.path().join("config.yml");
        fs::write(&path, "api:\n  base_url: http://backend:9000/\noutput_folder: out\n")?;

        let config = Config::load_from(&path)?;
        assert_eq!(config.api.base_url, "http://backend:9000/");
        assert_eq!(config.api.login_redirect, "主页.html");
        assert_eq!(config.output_folder, "out");
        assert_eq!(config.storage_folder, "data");
        assert_eq!(config.location.ip_lookup_url, "http://ip-api.com/json/");
        assert_eq!(config.endpoint("user_login"), "http://backend:9000/user_login");
        Ok(())
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let temp_dir = tempfile::tempdir().unwrap();
        assert!(Config::load_from(&temp_dir.path().join("nope.yml")).is_err());
    }
}
