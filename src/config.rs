//! Configuration for the inbound EDI pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variables holding the translation/mapping API key, in lookup order.
pub const API_KEY_ENV: [&str; 2] = ["STEDI_API_KEY", "stedi_api_key"];

/// Environment variables holding the mapping identifier, in lookup order.
pub const MAPPING_ID_ENV: [&str; 2] = ["STEDI_MAPPING_ID", "stedi_mapping_id"];

/// Main configuration for the pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Translation and mapping service settings
    #[serde(default)]
    pub stedi: StediConfig,

    /// Object store settings
    #[serde(default)]
    pub storage: StorageConfig,

    /// Output artifact settings
    #[serde(default)]
    pub output: OutputConfig,
}

/// Translation and mapping service configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct StediConfig {
    /// API key sent as `Authorization: Key <api_key>`.
    /// Usually supplied through `STEDI_API_KEY` rather than the file.
    #[serde(default)]
    pub api_key: String,

    /// Identifier of the mapping applied to translated documents
    #[serde(default)]
    pub mapping_id: String,

    /// Translation endpoint
    #[serde(default = "default_translate_url")]
    pub translate_url: String,

    /// Base URL of the mappings API; `/{mapping_id}/map` is appended
    #[serde(default = "default_mappings_base_url")]
    pub mappings_base_url: String,

    /// Format of the fetched object
    #[serde(default = "default_input_format")]
    pub input_format: String,

    /// Format requested from the translation service
    #[serde(default = "default_output_format")]
    pub output_format: String,

    /// Optional per-request timeout. Unset keeps the HTTP client default.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Default for StediConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            mapping_id: String::new(),
            translate_url: default_translate_url(),
            mappings_base_url: default_mappings_base_url(),
            input_format: default_input_format(),
            output_format: default_output_format(),
            timeout_secs: None,
        }
    }
}

impl std::fmt::Debug for StediConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StediConfig")
            .field("api_key", &if self.api_key.is_empty() { "" } else { "<redacted>" })
            .field("mapping_id", &self.mapping_id)
            .field("translate_url", &self.translate_url)
            .field("mappings_base_url", &self.mappings_base_url)
            .field("input_format", &self.input_format)
            .field("output_format", &self.output_format)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Object store configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Local directory standing in for S3. Each bucket is a subdirectory.
    /// If unset, buckets are accessed on S3 with credentials from the environment.
    #[serde(default)]
    pub local_root: Option<String>,

    /// AWS region. A non-empty AWS_REGION overrides it.
    #[serde(default)]
    pub region: Option<String>,

    /// Custom S3 endpoint (LocalStack, MinIO, ...)
    #[serde(default)]
    pub endpoint_url: Option<String>,
}

impl StorageConfig {
    /// Check if objects live on the local filesystem.
    pub fn is_local(&self) -> bool {
        self.local_root.is_some()
    }
}

/// Output artifact configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Key prefix for stored artifacts
    #[serde(default = "default_prefix")]
    pub prefix: String,

    /// Field of the mapped document naming the artifact
    #[serde(default = "default_id_field")]
    pub id_field: String,

    /// Exclusive upper bound of the random key suffix
    #[serde(default = "default_suffix_bound")]
    pub suffix_bound: u32,

    /// Ignore notifications for objects under `prefix`
    #[serde(default = "default_true")]
    pub skip_own_artifacts: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            id_field: default_id_field(),
            suffix_bound: default_suffix_bound(),
            skip_own_artifacts: true,
        }
    }
}

impl Config {
    /// Load configuration from a YAML or JSON file.
    /// Format is auto-detected from file extension (.yaml, .yml, or .json).
    pub fn from_file(path: &PathBuf) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        let config: Config = match ext {
            "json" => serde_json::from_str(&contents)?,
            _ => serde_yaml::from_str(&contents)?,
        };
        Ok(config)
    }

    /// Load configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> anyhow::Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Load configuration from a JSON string.
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let config: Config = serde_json::from_str(json)?;
        Ok(config)
    }

    /// Build configuration from defaults plus the process environment.
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env(|name| std::env::var(name).ok());
        config
    }

    /// Overlay values from the environment. Non-empty variables win over file values.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let first = |names: &[&str]| {
            names
                .iter()
                .filter_map(|name| lookup(name))
                .find(|value| !value.trim().is_empty())
        };

        if let Some(key) = first(&API_KEY_ENV) {
            self.stedi.api_key = key;
        }
        if let Some(id) = first(&MAPPING_ID_ENV) {
            self.stedi.mapping_id = id;
        }
        if let Some(region) = first(&["AWS_REGION"]) {
            self.storage.region = Some(region);
        }
    }

    /// Serialize configuration to YAML.
    pub fn to_yaml(&self) -> anyhow::Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.stedi.api_key.trim().is_empty() {
            anyhow::bail!("Missing API key: set {} or stedi.api_key", API_KEY_ENV[0]);
        }
        if self.stedi.mapping_id.trim().is_empty() {
            anyhow::bail!("Missing mapping id: set {} or stedi.mapping_id", MAPPING_ID_ENV[0]);
        }
        for url in [&self.stedi.translate_url, &self.stedi.mappings_base_url] {
            reqwest::Url::parse(url)
                .map_err(|e| anyhow::anyhow!("Invalid service URL '{}': {}", url, e))?;
        }
        if self.stedi.timeout_secs == Some(0) {
            anyhow::bail!("Request timeout must be > 0 when set");
        }
        if self.output.suffix_bound == 0 {
            anyhow::bail!("Key suffix bound must be > 0");
        }
        if self.output.id_field.is_empty() {
            anyhow::bail!("Identifier field must not be empty");
        }
        let prefix = self.output.prefix.trim_matches('/');
        if prefix.is_empty() {
            anyhow::bail!("Output prefix must not be empty");
        }
        if let (Some(_), Some(_)) = (&self.storage.local_root, &self.storage.endpoint_url) {
            anyhow::bail!("Cannot specify both storage.local_root and storage.endpoint_url");
        }
        Ok(())
    }
}

// Default value functions for serde
fn default_translate_url() -> String { "https://edi-core.stedi.com/2021-06-05/translate".to_string() }
fn default_mappings_base_url() -> String { "https://mappings.stedi.com/2021-06-01/mappings".to_string() }
fn default_input_format() -> String { "edi".to_string() }
fn default_output_format() -> String { "jedi@2.0-beta".to_string() }
fn default_prefix() -> String { "orders".to_string() }
fn default_id_field() -> String { "po_number".to_string() }
fn default_suffix_bound() -> u32 { 100 }
fn default_true() -> bool { true }

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn valid_config() -> Config {
        let mut config = Config::default();
        config.stedi.api_key = "key".to_string();
        config.stedi.mapping_id = "01GEXAMPLE".to_string();
        config
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.stedi.output_format, "jedi@2.0-beta");
        assert_eq!(config.stedi.input_format, "edi");
        assert_eq!(config.output.prefix, "orders");
        assert_eq!(config.output.id_field, "po_number");
        assert_eq!(config.output.suffix_bound, 100);
        assert!(config.output.skip_own_artifacts);
        assert!(!config.storage.is_local());
    }

    #[test]
    fn test_config_validation() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_config_validation_missing_credentials() {
        let mut config = valid_config();
        config.stedi.api_key = "  ".to_string();
        assert!(config.validate().is_err());

        let mut config = valid_config();
        config.stedi.mapping_id.clear();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("mapping id"));
    }

    #[test]
    fn test_config_validation_invalid() {
        let mut config = valid_config();
        config.output.suffix_bound = 0;
        assert!(config.validate().is_err());

        let mut config = valid_config();
        config.stedi.translate_url = "not a url".to_string();
        assert!(config.validate().is_err());

        let mut config = valid_config();
        config.output.prefix = "/".to_string();
        assert!(config.validate().is_err());

        let mut config = valid_config();
        config.storage.local_root = Some("/tmp/buckets".to_string());
        config.storage.endpoint_url = Some("http://localhost:4566".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_apply_env() {
        let vars: HashMap<&str, &str> = [
            ("stedi_api_key", "lower-key"),
            ("STEDI_MAPPING_ID", "map-1"),
            ("stedi_mapping_id", "ignored"),
            ("STEDI_API_KEY", ""),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_env(|name| vars.get(name).map(|v| v.to_string()));

        assert_eq!(config.stedi.api_key, "lower-key");
        assert_eq!(config.stedi.mapping_id, "map-1");
        assert!(config.storage.region.is_none());
    }

    #[test]
    fn test_apply_env_region_overrides_file() {
        let mut config = Config::from_yaml("storage:\n  region: eu-west-1\n").unwrap();

        config.apply_env(|_| None);
        assert_eq!(config.storage.region.as_deref(), Some("eu-west-1"));

        config.apply_env(|name| (name == "AWS_REGION").then(|| "us-east-2".to_string()));
        assert_eq!(config.storage.region.as_deref(), Some("us-east-2"));
    }

    #[test]
    fn test_from_yaml_partial() {
        let config = Config::from_yaml(
            r#"
stedi:
  mapping_id: "abc"
  timeout_secs: 20
output:
  prefix: "po"
storage:
  local_root: "/tmp/buckets"
"#,
        )
        .unwrap();

        assert_eq!(config.stedi.mapping_id, "abc");
        assert_eq!(config.stedi.timeout_secs, Some(20));
        assert_eq!(config.stedi.translate_url, default_translate_url());
        assert_eq!(config.output.prefix, "po");
        assert_eq!(config.output.suffix_bound, 100);
        assert!(config.storage.is_local());
    }

    #[test]
    fn test_from_file_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"stedi": {"api_key": "k", "mapping_id": "m"}}"#).unwrap();

        let config = Config::from_file(&path).unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let config = valid_config();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("\"key\""));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_yaml_roundtrip_keeps_defaults() {
        let yaml = valid_config().to_yaml().unwrap();
        let parsed = Config::from_yaml(&yaml).unwrap();
        assert_eq!(parsed.stedi.mappings_base_url, default_mappings_base_url());
        assert_eq!(parsed.output.id_field, "po_number");
    }
}
