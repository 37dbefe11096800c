//! Configuration management

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

use crate::core::models::{
    BackendConfig, BackendKind, ModelCapabilities, ModelConfig, Variant, DEFAULT_TEMPERATURE,
    MAX_TEMPERATURE, MIN_TEMPERATURE,
};

const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
const DEFAULT_OLLAMA_MODEL: &str = "gemma3:1b";
const DEFAULT_OLLAMA_DOMAIN_MODEL: &str = "gpt-oss:20b";
const DEFAULT_OPENAI_URL: &str = "https://api.openai.com";
const DEFAULT_OPENAI_MODEL: &str = "gpt-3.5-turbo";
const DEFAULT_GEMINI_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";

/// Display name of the hosted OpenAI entry
pub const OPENAI_DISPLAY_NAME: &str = "OpenAI GPT";
/// Display name of the hosted Gemini entry
pub const GEMINI_DISPLAY_NAME: &str = "Google Gemini";

/// Configuration for translator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslatorConfig {
    pub models: Vec<ModelConfig>,
    /// Model preselected by the multi-model variant
    #[serde(default)]
    pub default_model: Option<String>,
    /// Model used by the domain variant
    #[serde(default)]
    pub domain_model: Option<String>,
    #[serde(default = "default_temperature")]
    pub default_temperature: f32,
    /// Per-call timeout; `None` waits indefinitely
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

fn default_temperature() -> f32 {
    DEFAULT_TEMPERATURE
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            models: vec![],
            default_model: None,
            domain_model: None,
            default_temperature: DEFAULT_TEMPERATURE,
            timeout_ms: None,
        }
    }
}

fn ollama_display_name(model: &str) -> String {
    format!("Ollama ({})", model)
}

impl TranslatorConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from any key/value source
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let get_or = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let ollama_url = get_or("OLLAMA_BASE_URL", DEFAULT_OLLAMA_URL);
        let ollama_model = get_or("OLLAMA_MODEL", DEFAULT_OLLAMA_MODEL);
        let ollama_domain_model = get_or("OLLAMA_DOMAIN_MODEL", DEFAULT_OLLAMA_DOMAIN_MODEL);

        let mut models = vec![ModelConfig {
            display_name: ollama_display_name(&ollama_model),
            backend: BackendConfig {
                kind: BackendKind::Ollama,
                endpoint: ollama_url.clone(),
                model: ollama_model.clone(),
                api_key: None,
            },
            capabilities: ModelCapabilities::default(),
        }];

        if ollama_domain_model != ollama_model {
            models.push(ModelConfig {
                display_name: ollama_display_name(&ollama_domain_model),
                backend: BackendConfig {
                    kind: BackendKind::Ollama,
                    endpoint: ollama_url,
                    model: ollama_domain_model.clone(),
                    api_key: None,
                },
                capabilities: ModelCapabilities::default(),
            });
        }

        match get("GOOGLE_API_KEY") {
            Some(api_key) => models.push(ModelConfig {
                display_name: GEMINI_DISPLAY_NAME.to_string(),
                backend: BackendConfig {
                    kind: BackendKind::Gemini,
                    endpoint: get_or("GEMINI_BASE_URL", DEFAULT_GEMINI_URL),
                    model: get_or("GEMINI_MODEL", DEFAULT_GEMINI_MODEL),
                    api_key: Some(api_key),
                },
                capabilities: ModelCapabilities::default(),
            }),
            None => info!("GOOGLE_API_KEY not set, {} disabled", GEMINI_DISPLAY_NAME),
        }

        match get("OPENAI_API_KEY") {
            Some(api_key) => models.push(ModelConfig {
                display_name: OPENAI_DISPLAY_NAME.to_string(),
                backend: BackendConfig {
                    kind: BackendKind::OpenAi,
                    endpoint: get_or("OPENAI_BASE_URL", DEFAULT_OPENAI_URL),
                    model: get_or("OPENAI_MODEL", DEFAULT_OPENAI_MODEL),
                    api_key: Some(api_key),
                },
                capabilities: ModelCapabilities::default(),
            }),
            None => info!("OPENAI_API_KEY not set, {} disabled", OPENAI_DISPLAY_NAME),
        }

        let default_temperature = match get("DEFAULT_TEMPERATURE") {
            Some(v) => v.parse::<f32>()?,
            None => DEFAULT_TEMPERATURE,
        };

        let timeout_ms = match get("REQUEST_TIMEOUT_MS") {
            Some(v) => Some(v.parse::<u64>()?).filter(|ms| *ms > 0),
            None => None,
        };

        Ok(Self {
            models,
            default_model: Some(ollama_display_name(&ollama_model)),
            domain_model: Some(ollama_display_name(&ollama_domain_model)),
            default_temperature,
            timeout_ms,
        })
    }

    /// Load from `path` when given, otherwise from the environment, then validate
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let config = match path {
            Some(path) => {
                info!("Loading configuration from {}", path.display());
                Self::from_file(path)?
            }
            None => Self::from_env()?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Load from a JSON or YAML file, picked by extension
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config: Self = if is_yaml(path) {
            serde_yaml::from_str(&content)?
        } else {
            serde_json::from_str(&content)?
        };
        Ok(config)
    }

    /// Save configuration to file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let path = path.as_ref();
        let content = if is_yaml(path) {
            serde_yaml::to_string(self)?
        } else {
            serde_json::to_string_pretty(self)?
        };
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.models.is_empty() {
            return Err(anyhow::anyhow!("At least one model must be configured"));
        }

        for model in &self.models {
            if model.display_name.trim().is_empty() {
                return Err(anyhow::anyhow!("Model display name is required"));
            }
            if model.backend.endpoint.trim().is_empty() {
                return Err(anyhow::anyhow!("Endpoint is required for {}", model.display_name));
            }
            if model.backend.model.trim().is_empty() {
                return Err(anyhow::anyhow!("Model id is required for {}", model.display_name));
            }
            let has_key = model.backend.api_key.as_deref().is_some_and(|k| !k.is_empty());
            if model.backend.kind.requires_api_key() && !has_key {
                return Err(anyhow::anyhow!("API key is required for {}", model.display_name));
            }
        }

        if !(MIN_TEMPERATURE..=MAX_TEMPERATURE).contains(&self.default_temperature) {
            return Err(anyhow::anyhow!(
                "default_temperature must be between {} and {}",
                MIN_TEMPERATURE,
                MAX_TEMPERATURE
            ));
        }

        for name in [&self.default_model, &self.domain_model].into_iter().flatten() {
            if self.find_model(name).is_none() {
                warn!("Configured model '{}' is not registered", name);
            }
        }

        Ok(())
    }

    /// Find model by display name
    pub fn find_model(&self, display_name: &str) -> Option<&ModelConfig> {
        self.models.iter().find(|m| m.display_name == display_name)
    }

    /// Model a variant uses when the caller does not choose one
    pub fn model_for_variant(&self, variant: Variant) -> Option<String> {
        let first = self.models.first().map(|m| m.display_name.clone());
        match variant {
            Variant::Full => self.default_model.clone().or(first),
            Variant::Simple => self
                .models
                .iter()
                .find(|m| m.backend.kind == BackendKind::Ollama)
                .map(|m| m.display_name.clone())
                .or(first),
            Variant::Domain => self.domain_model.clone().or(first),
        }
    }
}

fn is_yaml(path: &Path) -> bool {
    path.extension()
        .map(|ext| {
            let ext = ext.to_string_lossy().to_lowercase();
            ext == "yaml" || ext == "yml"
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_env_defaults_register_local_models_only() {
        let config = TranslatorConfig::from_lookup(lookup(&[])).unwrap();

        let names: Vec<&str> = config.models.iter().map(|m| m.display_name.as_str()).collect();
        assert_eq!(names, vec!["Ollama (gemma3:1b)", "Ollama (gpt-oss:20b)"]);
        assert_eq!(config.timeout_ms, None);
        assert_eq!(config.default_temperature, DEFAULT_TEMPERATURE);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_hosted_models_need_credentials() {
        let config = TranslatorConfig::from_lookup(lookup(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("GOOGLE_API_KEY", "g-key"),
            ("REQUEST_TIMEOUT_MS", "15000"),
        ]))
        .unwrap();

        assert!(config.find_model(OPENAI_DISPLAY_NAME).is_some());
        assert!(config.find_model(GEMINI_DISPLAY_NAME).is_some());
        assert_eq!(config.timeout_ms, Some(15000));

        let mut broken = config.clone();
        broken
            .models
            .iter_mut()
            .filter(|m| m.backend.kind == BackendKind::OpenAi)
            .for_each(|m| m.backend.api_key = None);
        assert!(broken.validate().is_err());
    }

    #[test]
    fn test_zero_timeout_means_none() {
        let config = TranslatorConfig::from_lookup(lookup(&[("REQUEST_TIMEOUT_MS", "0")])).unwrap();
        assert_eq!(config.timeout_ms, None);
    }

    #[test]
    fn test_variant_model_selection() {
        let config = TranslatorConfig::from_lookup(lookup(&[("OPENAI_API_KEY", "sk")])).unwrap();
        assert_eq!(config.model_for_variant(Variant::Full).as_deref(), Some("Ollama (gemma3:1b)"));
        assert_eq!(config.model_for_variant(Variant::Simple).as_deref(), Some("Ollama (gemma3:1b)"));
        assert_eq!(
            config.model_for_variant(Variant::Domain).as_deref(),
            Some("Ollama (gpt-oss:20b)")
        );
    }

    #[test]
    fn test_config_validation_missing_models() {
        let config = TranslatorConfig::default();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_file_round_trip_json_and_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let config = TranslatorConfig::from_lookup(lookup(&[("GOOGLE_API_KEY", "g")])).unwrap();

        for name in ["config.json", "config.yaml"] {
            let path = dir.path().join(name);
            config.to_file(&path).unwrap();
            let loaded = TranslatorConfig::load(Some(&path)).unwrap();
            assert_eq!(loaded.models.len(), config.models.len());
            assert_eq!(loaded.domain_model, config.domain_model);
        }
    }

    #[test]
    fn test_yaml_capabilities_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("models.yml");
        std::fs::write(
            &path,
            r#"
models:
  - display_name: "Local"
    backend:
      kind: ollama
      endpoint: "http://127.0.0.1:11434"
      model: "qwen2.5:7b"
    capabilities:
      supports_sampling: false
      max_tokens: 512
timeout_ms: 30000
"#,
        )
        .unwrap();

        let config = TranslatorConfig::from_file(&path).unwrap();
        assert_eq!(config.default_temperature, DEFAULT_TEMPERATURE);
        assert_eq!(config.timeout_ms, Some(30000));
        assert!(!config.models[0].capabilities.supports_sampling);
        assert_eq!(config.model_for_variant(Variant::Domain).as_deref(), Some("Local"));
    }
}
