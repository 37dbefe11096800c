//! Translation client: prompt rendering, one backend call, post-filtering

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::core::catalog::Catalog;
use crate::core::config::TranslatorConfig;
use crate::core::errors::{ErrorKind, Result, TranslationError};
use crate::core::models::{GenerationParams, Translation, TranslationRequest, TranslationResult, Variant};
use crate::core::postfilter::{self, PostFilter};
use crate::core::prompt::{fields, PromptTemplate};
use crate::core::registry::ModelRegistry;

/// Async translation client bound to one variant
#[derive(Debug, Clone)]
pub struct Translator {
    variant: Variant,
    registry: Arc<ModelRegistry>,
    template: Arc<PromptTemplate>,
    catalog: Arc<Catalog>,
    post_filter: Arc<dyn PostFilter>,
    timeout: Option<Duration>,
    default_model: Option<String>,
    default_temperature: f32,
}

impl Translator {
    /// Create a translator with the variant's built-in template, catalog and filter
    pub fn new(variant: Variant, registry: ModelRegistry) -> Self {
        let default_model = registry.first().map(|m| m.display_name.clone());
        Self {
            variant,
            registry: Arc::new(registry),
            template: Arc::new(PromptTemplate::for_variant(variant)),
            catalog: Arc::new(Catalog::for_variant(variant)),
            post_filter: Arc::from(postfilter::for_variant(variant)),
            timeout: None,
            default_model,
            default_temperature: crate::core::models::DEFAULT_TEMPERATURE,
        }
    }

    /// Create from configuration, building HTTP backends for every model
    pub fn from_config(config: &TranslatorConfig, variant: Variant) -> Result<Self> {
        let client = reqwest::Client::builder()
            .pool_idle_timeout(Some(Duration::from_secs(30)))
            .pool_max_idle_per_host(10)
            .build()?;

        let registry = ModelRegistry::from_configs(&config.models, client)?;
        let mut translator = Self::new(variant, registry)
            .with_timeout(config.timeout_ms.map(Duration::from_millis));
        translator.default_temperature = config.default_temperature;
        if let Some(model) = config.model_for_variant(variant) {
            translator.default_model = Some(model);
        }

        info!(
            "Translator ready: variant={} models={} filter={} timeout={:?}",
            variant,
            translator.registry.len(),
            translator.post_filter.name(),
            translator.timeout
        );
        Ok(translator)
    }

    pub fn with_template(mut self, template: PromptTemplate) -> Self {
        self.template = Arc::new(template);
        self
    }

    pub fn with_catalog(mut self, catalog: Catalog) -> Self {
        self.catalog = Arc::new(catalog);
        self
    }

    pub fn with_post_filter(mut self, post_filter: impl PostFilter + 'static) -> Self {
        self.post_filter = Arc::new(post_filter);
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn template(&self) -> &PromptTemplate {
        &self.template
    }

    /// Model used when a request does not name one
    pub fn default_model(&self) -> Option<&str> {
        self.default_model.as_deref()
    }

    pub fn default_temperature(&self) -> f32 {
        self.default_temperature
    }

    /// Render the prompt a request would send
    pub fn render_prompt(&self, request: &TranslationRequest) -> Result<String> {
        let source = self.catalog.prompt_name(&request.source_language);
        let target = self.catalog.prompt_name(&request.target_language);

        let mut values: HashMap<&str, &str> = HashMap::from([
            (fields::SOURCE_LANGUAGE, source),
            (fields::TARGET_LANGUAGE, target),
            (fields::TEXT, request.source_text.as_str()),
        ]);
        if let Some(domain) = request.domain.as_deref() {
            values.insert(fields::DOMAIN, domain);
        }

        self.template.render(&values)
    }

    /// Translate, turning every failure into a displayable result
    pub async fn translate(&self, request: &TranslationRequest) -> TranslationResult {
        self.translate_with_cancel(request, &CancellationToken::new()).await
    }

    /// Like [`translate`](Self::translate), aborting when `cancel` fires
    pub async fn translate_with_cancel(
        &self,
        request: &TranslationRequest,
        cancel: &CancellationToken,
    ) -> TranslationResult {
        let result = self.try_translate(request, cancel).await;
        if let Err(e) = &result {
            match e.kind() {
                ErrorKind::Backend | ErrorKind::Configuration => {
                    warn!("Translation with '{}' failed: {}", request.model, e)
                }
                ErrorKind::Validation | ErrorKind::Cancelled => debug!("Translation not sent: {}", e),
            }
        }
        TranslationResult::from(result)
    }

    /// Typed form of [`translate_with_cancel`](Self::translate_with_cancel)
    pub async fn try_translate(
        &self,
        request: &TranslationRequest,
        cancel: &CancellationToken,
    ) -> Result<Translation> {
        request.validate()?;
        let entry = self.registry.resolve(&request.model)?;
        let prompt = self.render_prompt(request)?;
        let params = GenerationParams::for_capabilities(&entry.capabilities, request.temperature);

        debug!(
            "Sending {} prompt chars to {} (temperature={:?})",
            prompt.chars().count(),
            entry.display_name,
            params.temperature
        );

        let start = Instant::now();
        let call = entry.backend.generate(&prompt, &params);
        let raw = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(TranslationError::Cancelled),
            result = self.call_with_timeout(call) => result,
        }?;

        let target = self.catalog.prompt_name(&request.target_language);
        let text = self.post_filter.apply(&raw, target);
        if text.is_empty() {
            return Err(TranslationError::InvalidResponseError {
                message: "Model returned an empty response".to_string(),
            });
        }

        info!(
            "Translated {} chars with {} in {:?}",
            request.source_text.chars().count(),
            entry.display_name,
            start.elapsed()
        );

        Ok(Translation {
            text,
            model: entry.display_name.clone(),
        })
    }

    async fn call_with_timeout<F>(&self, call: F) -> Result<String>
    where
        F: std::future::Future<Output = Result<String>>,
    {
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .map_err(|_| TranslationError::TimeoutError {
                    after_ms: millis(limit),
                })?,
            None => call.await,
        }
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::backend::{Backend, OllamaBackend};
    use crate::core::errors::TRANSLATION_ERROR_PREFIX;
    use crate::core::models::ModelCapabilities;
    use crate::core::postfilter::EchoStrip;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Canned backend that counts calls and records what it was sent
    #[derive(Debug, Default)]
    struct FakeBackend {
        reply: String,
        delay: Option<Duration>,
        calls: AtomicUsize,
        last_prompt: Mutex<Option<String>>,
        last_params: Mutex<Option<GenerationParams>>,
    }

    impl FakeBackend {
        fn replying(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: reply.to_string(),
                ..Default::default()
            })
        }

        fn slow(reply: &str, delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                reply: reply.to_string(),
                delay: Some(delay),
                ..Default::default()
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Backend for FakeBackend {
        fn kind(&self) -> crate::core::models::BackendKind {
            crate::core::models::BackendKind::Ollama
        }

        fn model(&self) -> &str {
            "fake"
        }

        async fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_prompt.lock().unwrap() = Some(prompt.to_string());
            *self.last_params.lock().unwrap() = Some(*params);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            Ok(self.reply.clone())
        }
    }

    fn translator_with(variant: Variant, backend: Arc<FakeBackend>, caps: ModelCapabilities) -> Translator {
        let mut registry = ModelRegistry::new();
        registry.register("Fake", backend, caps).unwrap();
        Translator::new(variant, registry)
    }

    fn request(text: &str) -> TranslationRequest {
        TranslationRequest::new(text, "English", "繁體中文", "Fake")
    }

    #[tokio::test]
    async fn test_translate_success() {
        let backend = FakeBackend::replying("  你好  ");
        let translator = translator_with(Variant::Full, backend.clone(), ModelCapabilities::default());

        let result = translator.translate(&request("Hello")).await;
        assert!(result.is_ok());
        assert_eq!(result.text, "你好");
        assert_eq!(result.model.as_deref(), Some("Fake"));
        assert_eq!(backend.calls(), 1);

        let prompt = backend.last_prompt.lock().unwrap().clone().unwrap();
        assert!(prompt.contains("英文文本：\nHello"));
        assert!(prompt.contains("繁體中文翻譯："));
    }

    #[tokio::test]
    async fn test_empty_text_never_reaches_backend() {
        let backend = FakeBackend::replying("unused");
        let translator = translator_with(Variant::Full, backend.clone(), ModelCapabilities::default());

        for text in ["", "   ", "\n\t "] {
            let result = translator.translate(&request(text)).await;
            assert_eq!(result.text, "Please enter text to translate.");
            assert_eq!(result.error, Some(ErrorKind::Validation));
        }
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn test_unknown_model_never_reaches_backend() {
        let backend = FakeBackend::replying("unused");
        let translator = translator_with(Variant::Full, backend.clone(), ModelCapabilities::default());

        let mut req = request("Hello");
        req.model = "OpenAI GPT".to_string();
        let result = translator.translate(&req).await;

        assert_eq!(result.text, "Error: model not found: OpenAI GPT");
        assert_eq!(result.error, Some(ErrorKind::Configuration));
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn test_temperature_forwarded_only_with_sampling() {
        let backend = FakeBackend::replying("ok");
        let translator = translator_with(Variant::Full, backend.clone(), ModelCapabilities::default());
        translator.translate(&request("Hello").with_temperature(0.3)).await;
        assert_eq!(backend.last_params.lock().unwrap().unwrap().temperature, Some(0.3));

        let backend = FakeBackend::replying("ok");
        let caps = ModelCapabilities {
            supports_sampling: false,
            max_tokens: Some(100),
        };
        let translator = translator_with(Variant::Full, backend.clone(), caps);
        translator.translate(&request("Hello").with_temperature(0.3)).await;
        let params = backend.last_params.lock().unwrap().unwrap();
        assert_eq!(params.temperature, None);
        assert_eq!(params.max_tokens, Some(100));
    }

    #[tokio::test]
    async fn test_domain_variant_strips_echo() {
        let backend = FakeBackend::replying("英文文本：Hello\n繁體中文翻譯：\n你好");
        let translator = translator_with(Variant::Domain, backend.clone(), ModelCapabilities::default());

        let req = TranslationRequest::new("Hello", "英文", "繁體中文", "Fake").with_domain("商業");
        let result = translator.translate(&req).await;
        assert_eq!(result.text, "你好");

        let prompt = backend.last_prompt.lock().unwrap().clone().unwrap();
        assert!(prompt.contains("專精於商業領域"));
    }

    #[tokio::test]
    async fn test_domain_variant_without_domain_reports_missing_field() {
        let backend = FakeBackend::replying("unused");
        let translator = translator_with(Variant::Domain, backend.clone(), ModelCapabilities::default());

        let result = translator.translate(&request("Hello")).await;
        assert!(result.text.starts_with(TRANSLATION_ERROR_PREFIX));
        assert!(result.text.contains("domain"));
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn test_swapped_post_filter() {
        let backend = FakeBackend::replying("繁體中文翻譯：\n你好");
        let translator = translator_with(Variant::Full, backend, ModelCapabilities::default())
            .with_post_filter(EchoStrip);
        assert_eq!(translator.translate(&request("Hello")).await.text, "你好");
    }

    #[tokio::test]
    async fn test_empty_model_output_is_an_error() {
        let backend = FakeBackend::replying("  \n ");
        let translator = translator_with(Variant::Full, backend, ModelCapabilities::default());
        let result = translator.translate(&request("Hello")).await;
        assert_eq!(result.error, Some(ErrorKind::Backend));
        assert!(!result.text.is_empty());
    }

    #[tokio::test]
    async fn test_connection_refused_becomes_message() {
        let mut registry = ModelRegistry::new();
        let backend = OllamaBackend::new(reqwest::Client::new(), "http://127.0.0.1:1", "gemma3:1b");
        registry
            .register("Fake", Arc::new(backend), ModelCapabilities::default())
            .unwrap();
        let translator = Translator::new(Variant::Simple, registry);

        let result = translator.translate(&request("Hello")).await;
        assert!(result.text.starts_with(TRANSLATION_ERROR_PREFIX));
        assert_eq!(result.error, Some(ErrorKind::Backend));
    }

    #[tokio::test]
    async fn test_timeout() {
        let backend = FakeBackend::slow("late", Duration::from_secs(5));
        let translator = translator_with(Variant::Full, backend, ModelCapabilities::default())
            .with_timeout(Some(Duration::from_millis(20)));

        let err = translator
            .try_translate(&request("Hello"), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, TranslationError::TimeoutError { after_ms: 20 }));
    }

    #[tokio::test]
    async fn test_timeout_builder_and_fast_backend() {
        let translator = translator_with(Variant::Full, FakeBackend::replying("你好"), ModelCapabilities::default())
            .with_timeout(Some(Duration::from_secs(5)));

        let translation = translator
            .try_translate(&request("Hello"), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(translation.text, "你好");
    }

    #[test]
    fn test_timeout_millis_saturate() {
        assert_eq!(millis(Duration::from_millis(20)), 20);
        assert_eq!(millis(Duration::MAX), u64::MAX);
    }

    #[tokio::test]
    async fn test_cancellation() {
        let backend = FakeBackend::slow("late", Duration::from_secs(5));
        let translator = translator_with(Variant::Full, backend, ModelCapabilities::default());
        let token = CancellationToken::new();

        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            canceller.cancel();
        });

        let result = translator.translate_with_cancel(&request("Hello"), &token).await;
        assert_eq!(result.error, Some(ErrorKind::Cancelled));
    }
}
