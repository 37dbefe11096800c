//! Language, domain and example tables offered by each variant

use serde::{Deserialize, Serialize};

use crate::core::models::{LanguagePair, Variant};

/// A selectable language: what the user sees and what goes into the prompt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct LanguageOption {
    pub label: String,
    pub prompt_name: String,
}

/// Example input shown below the form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ExampleInput {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
}

impl ExampleInput {
    fn text(text: &str) -> Self {
        Self {
            text: text.to_string(),
            source_language: None,
            target_language: None,
            domain: None,
        }
    }

    fn full(text: &str, source: &str, target: &str, domain: &str) -> Self {
        Self {
            text: text.to_string(),
            source_language: Some(source.to_string()),
            target_language: Some(target.to_string()),
            domain: Some(domain.to_string()),
        }
    }
}

/// Every table a front end needs to build its selectors
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalog {
    pub languages: Vec<LanguageOption>,
    pub domains: Vec<String>,
    pub default_pair: LanguagePair,
    pub default_domain: Option<String>,
    pub examples: Vec<ExampleInput>,
}

const FULL_LANGUAGES: &[(&str, &str)] = &[
    ("繁體中文", "繁體中文"),
    ("簡體中文", "簡體中文"),
    ("English", "英文"),
    ("日本語", "日文"),
    ("한국어", "韓文"),
    ("Français", "法文"),
    ("Deutsch", "德文"),
    ("Español", "西班牙文"),
    ("Italiano", "義大利文"),
    ("Português", "葡萄牙文"),
    ("Русский", "俄文"),
    ("العربية", "阿拉伯文"),
];

const SIMPLE_LANGUAGES: &[&str] = &[
    "繁體中文", "簡體中文", "English", "日本語", "한국어", "Français", "Deutsch", "Español",
];

const DOMAIN_LANGUAGES: &[&str] = &[
    "繁體中文", "簡體中文", "英文", "日文", "韓文", "法文", "德文", "西班牙文", "義大利文", "俄文",
];

const DOMAINS: &[&str] = &[
    "一般", "商業", "科技", "醫療", "法律", "文學", "新聞", "學術", "技術文件", "行銷",
];

impl Catalog {
    /// Built-in tables for a variant
    pub fn for_variant(variant: Variant) -> Self {
        match variant {
            Variant::Full => Self {
                languages: FULL_LANGUAGES
                    .iter()
                    .map(|(label, prompt_name)| LanguageOption {
                        label: label.to_string(),
                        prompt_name: prompt_name.to_string(),
                    })
                    .collect(),
                domains: Vec::new(),
                default_pair: LanguagePair::new("English", "繁體中文"),
                default_domain: None,
                examples: vec![
                    ExampleInput::text("Hello, how are you today? I hope you're having a wonderful day!"),
                    ExampleInput::text("The quick brown fox jumps over the lazy dog."),
                    ExampleInput::text("人工智慧正在改變我們的世界，帶來無限的可能性。"),
                    ExampleInput::text("La vie est belle et pleine de surprises."),
                    ExampleInput::text("こんにちは、元気ですか？"),
                ],
            },
            Variant::Simple => Self {
                languages: verbatim(SIMPLE_LANGUAGES),
                domains: Vec::new(),
                default_pair: LanguagePair::new("English", "繁體中文"),
                default_domain: None,
                examples: Vec::new(),
            },
            Variant::Domain => Self {
                languages: verbatim(DOMAIN_LANGUAGES),
                domains: DOMAINS.iter().map(|d| d.to_string()).collect(),
                default_pair: LanguagePair::new("英文", "繁體中文"),
                default_domain: Some("一般".to_string()),
                examples: vec![
                    ExampleInput::full(
                        "The quarterly revenue increased by 15% compared to last year.",
                        "英文",
                        "繁體中文",
                        "商業",
                    ),
                    ExampleInput::full("Hello, how are you today?", "英文", "日文", "一般"),
                    ExampleInput::full(
                        "La inteligencia artificial está revolucionando la medicina.",
                        "西班牙文",
                        "繁體中文",
                        "科技",
                    ),
                    ExampleInput::full(
                        "Le taux de chômage a diminué de 2% ce mois.",
                        "法文",
                        "繁體中文",
                        "新聞",
                    ),
                    ExampleInput::full(
                        "Die Maschine verwendet künstliche Intelligenz.",
                        "德文",
                        "繁體中文",
                        "科技",
                    ),
                ],
            },
        }
    }

    /// Name to put in the prompt for a selected label.
    ///
    /// Labels not in the table are passed through unchanged so callers may
    /// type their own language names.
    pub fn prompt_name<'a>(&'a self, label: &'a str) -> &'a str {
        self.languages
            .iter()
            .find(|l| l.label == label)
            .map(|l| l.prompt_name.as_str())
            .unwrap_or(label)
    }

    pub fn labels(&self) -> Vec<&str> {
        self.languages.iter().map(|l| l.label.as_str()).collect()
    }
}

fn verbatim(labels: &[&str]) -> Vec<LanguageOption> {
    labels
        .iter()
        .map(|label| LanguageOption {
            label: label.to_string(),
            prompt_name: label.to_string(),
        })
        .collect()
}
