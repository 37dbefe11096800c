//! Display name → backend lookup, fixed after startup

use std::sync::Arc;
use tracing::info;

use crate::core::backend::{self, Backend};
use crate::core::errors::{Result, TranslationError};
use crate::core::models::{ModelCapabilities, ModelConfig};

/// One selectable model
#[derive(Debug, Clone)]
pub struct RegisteredModel {
    pub display_name: String,
    pub backend: Arc<dyn Backend>,
    pub capabilities: ModelCapabilities,
}

/// Ordered set of models, in the order they should be offered
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    models: Vec<RegisteredModel>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build HTTP backends for every configured model
    pub fn from_configs(configs: &[ModelConfig], client: reqwest::Client) -> Result<Self> {
        let mut registry = Self::new();
        for config in configs {
            let backend = backend::from_config(&config.backend, client.clone())?;
            registry.register(
                config.display_name.clone(),
                Arc::from(backend),
                config.capabilities,
            )?;
        }
        info!("Registered {} models", registry.len());
        Ok(registry)
    }

    /// Add a model; display names must be unique
    pub fn register(
        &mut self,
        display_name: impl Into<String>,
        backend: Arc<dyn Backend>,
        capabilities: ModelCapabilities,
    ) -> Result<()> {
        let display_name = display_name.into();
        if self.get(&display_name).is_some() {
            return Err(TranslationError::ConfigError {
                message: format!("Duplicate model name: {}", display_name),
            });
        }
        self.models.push(RegisteredModel {
            display_name,
            backend,
            capabilities,
        });
        Ok(())
    }

    pub fn get(&self, display_name: &str) -> Option<&RegisteredModel> {
        self.models.iter().find(|m| m.display_name == display_name)
    }

    /// Like [`get`](Self::get) but a miss is an error
    pub fn resolve(&self, display_name: &str) -> Result<&RegisteredModel> {
        self.get(display_name)
            .ok_or_else(|| TranslationError::ModelNotFound {
                model: display_name.to_string(),
            })
    }

    pub fn names(&self) -> Vec<&str> {
        self.models.iter().map(|m| m.display_name.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RegisteredModel> {
        self.models.iter()
    }

    pub fn first(&self) -> Option<&RegisteredModel> {
        self.models.first()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::{BackendConfig, BackendKind};

    fn ollama(display_name: &str, model: &str) -> ModelConfig {
        ModelConfig {
            display_name: display_name.to_string(),
            backend: BackendConfig {
                kind: BackendKind::Ollama,
                endpoint: "http://localhost:11434".to_string(),
                model: model.to_string(),
                api_key: None,
            },
            capabilities: ModelCapabilities::default(),
        }
    }

    #[test]
    fn test_registry_preserves_order_and_resolves() {
        let configs = vec![
            ollama("Ollama (gemma3:1b)", "gemma3:1b"),
            ollama("Ollama (gpt-oss:20b)", "gpt-oss:20b"),
        ];
        let registry = ModelRegistry::from_configs(&configs, reqwest::Client::new()).unwrap();

        assert_eq!(registry.names(), vec!["Ollama (gemma3:1b)", "Ollama (gpt-oss:20b)"]);
        let entry = registry.resolve("Ollama (gpt-oss:20b)").unwrap();
        assert_eq!(entry.backend.model(), "gpt-oss:20b");
    }

    #[test]
    fn test_registry_miss_is_model_not_found() {
        let registry = ModelRegistry::new();
        let err = registry.resolve("OpenAI GPT").unwrap_err();
        assert!(matches!(err, TranslationError::ModelNotFound { ref model } if model == "OpenAI GPT"));
    }

    #[test]
    fn test_duplicate_names_are_rejected() {
        let configs = vec![ollama("Local", "a"), ollama("Local", "b")];
        assert!(ModelRegistry::from_configs(&configs, reqwest::Client::new()).is_err());
    }
}
