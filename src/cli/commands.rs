//! CLI command definitions and handlers

use clap::{Args, Subcommand};
use std::io::Read;
use std::time::Duration;

use crate::core::client::Translator;
use crate::core::config::TranslatorConfig;
use crate::core::models::{TranslationRequest, Variant};

/// Commands for the translator
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the web translator
    Serve {
        /// Which translator to serve
        #[arg(long, default_value = "full")]
        variant: Variant,

        /// Bind address (default: 127.0.0.1)
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Listen port (default: 7860, 7861 for the simple variant)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Translate text and print the result
    Translate {
        #[command(flatten)]
        input: TextArgs,

        /// Print the rendered prompt before the result
        #[arg(long)]
        show_prompt: bool,
    },

    /// Print the prompt that would be sent, without calling a model
    Prompt {
        #[command(flatten)]
        input: TextArgs,
    },

    /// List registered models
    Models,

    /// List languages and domains offered by a variant
    Languages {
        #[arg(long, default_value = "full")]
        variant: Variant,
    },
}

/// Text and selections shared by `translate` and `prompt`
#[derive(Args, Debug, Clone)]
pub struct TextArgs {
    /// Text to translate (read from stdin when omitted)
    #[arg(short, long)]
    pub text: Option<String>,

    /// Source language label (variant default when omitted)
    #[arg(short, long)]
    pub source: Option<String>,

    /// Target language label (variant default when omitted)
    #[arg(short = 'g', long)]
    pub target: Option<String>,

    /// Professional domain, domain variant only
    #[arg(short, long)]
    pub domain: Option<String>,

    /// Model display name (variant default when omitted)
    #[arg(short, long)]
    pub model: Option<String>,

    /// Sampling temperature, 0.1-1.0
    #[arg(long)]
    pub temperature: Option<f32>,

    #[arg(long, default_value = "full")]
    pub variant: Variant,
}

impl TextArgs {
    /// Fill unset selections from the translator's defaults
    pub fn into_request(self, translator: &Translator) -> anyhow::Result<TranslationRequest> {
        let text = match self.text {
            Some(text) => text,
            None => {
                let mut buf = String::new();
                std::io::stdin().read_to_string(&mut buf)?;
                buf
            }
        };

        let catalog = translator.catalog();
        let source = self
            .source
            .unwrap_or_else(|| catalog.default_pair.source_language.clone());
        let target = self
            .target
            .unwrap_or_else(|| catalog.default_pair.target_language.clone());
        let model = self
            .model
            .or_else(|| translator.default_model().map(str::to_string))
            .unwrap_or_default();

        let mut request = TranslationRequest::new(text, source, target, model);
        request.domain = self.domain.or_else(|| {
            translator
                .variant()
                .uses_domain()
                .then(|| catalog.default_domain.clone())
                .flatten()
        });
        request.temperature = self.temperature.or_else(|| {
            translator
                .variant()
                .adjustable_temperature()
                .then(|| translator.default_temperature())
        });
        Ok(request)
    }
}

/// Handle server command
pub async fn handle_serve(
    config: &TranslatorConfig,
    variant: Variant,
    host: String,
    port: Option<u16>,
) -> anyhow::Result<()> {
    use crate::server::api::run_server;
    use tracing::info;

    let port = port.unwrap_or_else(|| variant.default_port());
    let translator = Translator::from_config(config, variant)?;

    info!("Starting HTTP server on {}:{}", host, port);
    println!("🚀 {} starting on http://{}:{}", variant.title(), host, port);
    println!("📄 OpenAPI document: http://{}:{}/api-docs/openapi.json", host, port);

    run_server(translator, host, port).await?;

    Ok(())
}

/// Handle translate command; `Ok(false)` when the result is an error message
pub async fn handle_translate(
    config: &TranslatorConfig,
    input: TextArgs,
    show_prompt: bool,
) -> anyhow::Result<bool> {
    use indicatif::{ProgressBar, ProgressStyle};

    let translator = Translator::from_config(config, input.variant)?;
    let request = input.into_request(&translator)?;

    if show_prompt {
        match translator.render_prompt(&request) {
            Ok(prompt) => {
                println!("=== Prompt ===");
                println!("{}", prompt);
                println!("{}", "=".repeat(50));
            }
            Err(e) => eprintln!("Could not render prompt: {}", e),
        }
    }

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    spinner.set_message(format!("Translating with {}...", request.model));
    spinner.enable_steady_tick(Duration::from_millis(100));

    let result = translator.translate(&request).await;
    spinner.finish_and_clear();

    if result.is_ok() {
        if let Some(model) = &result.model {
            println!("{} response:", model);
        }
        println!("{}", result.text);
    } else {
        eprintln!("{}", result.text);
    }

    Ok(result.is_ok())
}

/// Handle prompt command
pub fn handle_prompt(config: &TranslatorConfig, input: TextArgs) -> anyhow::Result<()> {
    let translator = Translator::from_config(config, input.variant)?;
    let request = input.into_request(&translator)?;
    println!("{}", translator.render_prompt(&request)?);
    Ok(())
}

/// Handle models command
pub fn handle_models(config: &TranslatorConfig) -> anyhow::Result<()> {
    println!("{:<24} {:<8} {:<20} {:<8} {}", "NAME", "BACKEND", "MODEL", "SAMPLING", "ENDPOINT");
    for model in &config.models {
        println!(
            "{:<24} {:<8} {:<20} {:<8} {}",
            model.display_name,
            model.backend.kind.to_string(),
            model.backend.model,
            if model.capabilities.supports_sampling { "yes" } else { "no" },
            model.backend.endpoint
        );
    }
    Ok(())
}

/// Handle languages command
pub fn handle_languages(variant: Variant) -> anyhow::Result<()> {
    use crate::core::catalog::Catalog;

    let catalog = Catalog::for_variant(variant);
    println!("Languages ({}):", variant);
    for language in &catalog.languages {
        if language.label == language.prompt_name {
            println!("  {}", language.label);
        } else {
            println!("  {} → {}", language.label, language.prompt_name);
        }
    }
    if !catalog.domains.is_empty() {
        println!("Domains:");
        for domain in &catalog.domains {
            println!("  {}", domain);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::registry::ModelRegistry;

    fn args(variant: Variant) -> TextArgs {
        TextArgs {
            text: Some("Hello".to_string()),
            source: None,
            target: None,
            domain: None,
            model: None,
            temperature: None,
            variant,
        }
    }

    fn translator(variant: Variant) -> Translator {
        Translator::from_config(&TranslatorConfig::from_lookup(|_| None).unwrap(), variant).unwrap()
    }

    #[test]
    fn test_domain_defaults_fill_request() {
        let request = args(Variant::Domain).into_request(&translator(Variant::Domain)).unwrap();
        assert_eq!(request.source_language, "英文");
        assert_eq!(request.target_language, "繁體中文");
        assert_eq!(request.domain.as_deref(), Some("一般"));
        assert_eq!(request.model, "Ollama (gpt-oss:20b)");
        assert_eq!(request.temperature, None);
    }

    #[test]
    fn test_full_defaults_include_temperature() {
        let request = args(Variant::Full).into_request(&translator(Variant::Full)).unwrap();
        assert_eq!(request.model, "Ollama (gemma3:1b)");
        assert_eq!(request.temperature, Some(0.7));
        assert_eq!(request.domain, None);
    }

    #[test]
    fn test_empty_registry_leaves_model_blank() {
        let translator = Translator::new(Variant::Simple, ModelRegistry::new());
        let request = args(Variant::Simple).into_request(&translator).unwrap();
        assert_eq!(request.model, "");
    }
}
