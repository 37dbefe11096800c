//! Core data models for translation

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::core::errors::{ErrorKind, TranslationError};

/// Lowest accepted sampling temperature
pub const MIN_TEMPERATURE: f32 = 0.1;
/// Highest accepted sampling temperature
pub const MAX_TEMPERATURE: f32 = 1.0;
/// Temperature used when the caller does not pick one
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Which flavour of the translator is running
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    /// Multi-model with a temperature control
    Full,
    /// Single local model, short prompt
    Simple,
    /// Domain-aware prompt with echo stripping
    Domain,
}

impl Variant {
    /// Port the variant listens on unless told otherwise
    pub fn default_port(&self) -> u16 {
        match self {
            Variant::Simple => 7861,
            Variant::Full | Variant::Domain => 7860,
        }
    }

    /// Whether the user may pick a model
    pub fn selectable_model(&self) -> bool {
        matches!(self, Variant::Full)
    }

    /// Whether the user may tune the temperature
    pub fn adjustable_temperature(&self) -> bool {
        matches!(self, Variant::Full)
    }

    /// Whether the form has a domain field
    pub fn uses_domain(&self) -> bool {
        matches!(self, Variant::Domain)
    }

    /// Page title
    pub fn title(&self) -> &'static str {
        match self {
            Variant::Full => "AI 智能翻譯機器人",
            Variant::Simple => "AI 翻譯機器人",
            Variant::Domain => "AI 專業翻譯助手",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variant::Full => write!(f, "full"),
            Variant::Simple => write!(f, "simple"),
            Variant::Domain => write!(f, "domain"),
        }
    }
}

impl FromStr for Variant {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "full" => Ok(Variant::Full),
            "simple" => Ok(Variant::Simple),
            "domain" => Ok(Variant::Domain),
            other => Err(format!("unknown variant '{}', expected full, simple or domain", other)),
        }
    }
}

/// Backend protocol family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Local Ollama server
    Ollama,
    /// OpenAI compatible chat completions
    OpenAi,
    /// Google Gemini generateContent
    Gemini,
}

impl BackendKind {
    /// Hosted backends need a credential
    pub fn requires_api_key(&self) -> bool {
        !matches!(self, BackendKind::Ollama)
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Ollama => write!(f, "ollama"),
            BackendKind::OpenAi => write!(f, "openai"),
            BackendKind::Gemini => write!(f, "gemini"),
        }
    }
}

/// What a backend accepts besides the prompt
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelCapabilities {
    /// Backend honours a temperature parameter
    #[serde(default = "default_true")]
    pub supports_sampling: bool,
    /// Upper bound on generated tokens, if the backend should be told one
    #[serde(default)]
    pub max_tokens: Option<u32>,
}

fn default_true() -> bool {
    true
}

impl Default for ModelCapabilities {
    fn default() -> Self {
        Self {
            supports_sampling: true,
            max_tokens: None,
        }
    }
}

/// Where and how to reach one model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    pub kind: BackendKind,
    pub endpoint: String,
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

/// One registry entry as it appears in configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Name shown in the model selector
    pub display_name: String,
    pub backend: BackendConfig,
    #[serde(default)]
    pub capabilities: ModelCapabilities,
}

/// Parameters forwarded to the backend alongside the prompt
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GenerationParams {
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl GenerationParams {
    /// Derive parameters from a model's capabilities and the caller's temperature
    pub fn for_capabilities(capabilities: &ModelCapabilities, temperature: Option<f32>) -> Self {
        Self {
            temperature: if capabilities.supports_sampling {
                temperature
            } else {
                None
            },
            max_tokens: capabilities.max_tokens,
        }
    }
}

/// Translation request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationRequest {
    pub source_text: String,
    pub source_language: String,
    pub target_language: String,
    pub domain: Option<String>,
    pub model: String,
    pub temperature: Option<f32>,
}

impl TranslationRequest {
    pub fn new(
        source_text: impl Into<String>,
        source_language: impl Into<String>,
        target_language: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            source_text: source_text.into(),
            source_language: source_language.into(),
            target_language: target_language.into(),
            domain: None,
            model: model.into(),
            temperature: None,
        }
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Check the fields that can be rejected without touching a backend
    pub fn validate(&self) -> Result<(), TranslationError> {
        if self.source_text.trim().is_empty() {
            return Err(TranslationError::EmptyText);
        }
        if let Some(value) = self.temperature {
            if !(MIN_TEMPERATURE..=MAX_TEMPERATURE).contains(&value) {
                return Err(TranslationError::InvalidTemperature { value });
            }
        }
        Ok(())
    }
}

/// A successful backend round trip
#[derive(Debug, Clone, PartialEq)]
pub struct Translation {
    pub text: String,
    pub model: String,
}

/// Translation result as shown to the user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationResult {
    /// Translation, or a user-facing message when `error` is set
    pub text: String,
    pub error: Option<ErrorKind>,
    /// Display name of the model that produced the text
    pub model: Option<String>,
}

impl TranslationResult {
    pub fn success(translation: Translation) -> Self {
        Self {
            text: translation.text,
            error: None,
            model: Some(translation.model),
        }
    }

    pub fn failure(error: &TranslationError) -> Self {
        Self {
            text: error.user_message(),
            error: Some(error.kind()),
            model: None,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

impl From<Result<Translation, TranslationError>> for TranslationResult {
    fn from(result: Result<Translation, TranslationError>) -> Self {
        match result {
            Ok(translation) => Self::success(translation),
            Err(e) => Self::failure(&e),
        }
    }
}

/// Source/target language selection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct LanguagePair {
    pub source_language: String,
    pub target_language: String,
}

impl LanguagePair {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source_language: source.into(),
            target_language: target.into(),
        }
    }

    /// Exchange source and target
    pub fn swap(self) -> Self {
        Self {
            source_language: self.target_language,
            target_language: self.source_language,
        }
    }
}
