use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::properties::PropertyTemplate;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub version: String,
    pub storage: StorageConfig,
    #[serde(default = "default_locale")]
    pub locale: String,
    #[serde(default = "default_worker_count")]
    pub worker_count: usize,
    #[serde(default)]
    pub database_path: Option<String>,
    #[serde(default)]
    pub properties: Vec<PropertyTemplateSpec>,
}

fn default_locale() -> String {
    "en".to_string()
}

fn default_worker_count() -> usize {
    num_cpus::get()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub root: String,
    #[serde(default)]
    pub swap_root: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyTemplateSpec {
    pub name: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub pattern: Option<String>,
    #[serde(default)]
    pub steps: Vec<String>,
}

impl Config {
    /// Compiles the property template specs into ready-to-use templates.
    pub fn property_templates(&self) -> Result<Vec<PropertyTemplate>, ConfigError> {
        self.properties
            .iter()
            .map(|spec| {
                let pattern = spec
                    .pattern
                    .as_deref()
                    .map(regex::Regex::new)
                    .transpose()
                    .map_err(|e| ConfigError::InvalidPattern {
                        name: spec.name.clone(),
                        reason: e.to_string(),
                    })?;
                Ok(PropertyTemplate {
                    name: spec.name.clone(),
                    required: spec.required,
                    pattern,
                    steps: spec.steps.clone(),
                })
            })
            .collect()
    }
}
