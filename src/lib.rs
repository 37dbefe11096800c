//! LLM Translator - prompt-templated translation over locally or remotely hosted models
//!
//! This library renders a translation prompt from a template, sends it to one
//! configured text-generation backend (Ollama, OpenAI or Gemini) and returns
//! the model's answer, with a small web front end on top.

#![forbid(unsafe_code)]

pub mod cli;
pub mod core;
pub mod server;

// Re-export key types for convenience
pub use crate::core::{
    backend::Backend,
    catalog::Catalog,
    client::Translator,
    config::TranslatorConfig,
    errors::{ErrorKind, TranslationError},
    models::{LanguagePair, TranslationRequest, TranslationResult, Variant},
    postfilter::{EchoStrip, PassThrough, PostFilter},
    prompt::PromptTemplate,
    registry::ModelRegistry,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
