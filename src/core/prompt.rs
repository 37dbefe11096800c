//! Prompt templates with named placeholders

use regex::{Captures, Regex};
use std::collections::HashMap;

use crate::core::errors::{Result, TranslationError};
use crate::core::models::Variant;

/// Long-form instruction used by the multi-model translator
pub const FULL_TEMPLATE: &str = "
你是一位專業的{target_language}翻譯家，具有豐富的語言學背景和多語言翻譯經驗。

請將以下{source_language}文本翻譯成{target_language}，並確保：
1. 保持原文的語氣、風格和語調
2. 使用自然流暢的{target_language}表達
3. 保持專業術語的準確性
4. 符合{target_language}的語言習慣和文化背景
5. 如果原文包含特殊格式（如標點符號、換行等），請保持相同的格式

{source_language}文本：
{text}

{target_language}翻譯：
";

/// Short instruction used by the single-model translator
pub const SIMPLE_TEMPLATE: &str = "
你是一位專業的{target_language}翻譯家。
請將以下{source_language}文本翻譯成{target_language}，保持原文的語氣和風格。

{source_language}文本：{text}
{target_language}翻譯：
";

/// Instruction naming a professional domain
pub const DOMAIN_TEMPLATE: &str = "
你是一位專業的{target_language}翻譯家，專精於{domain}領域。
請將以下{source_language}文本翻譯成{target_language}，並確保：
1. 保持原文的語氣和風格
2. 使用專業術語
3. 符合{target_language}的語言習慣

{source_language}文本：{text}
{target_language}翻譯：
";

/// Field names understood by the built-in templates
pub mod fields {
    pub const SOURCE_LANGUAGE: &str = "source_language";
    pub const TARGET_LANGUAGE: &str = "target_language";
    pub const DOMAIN: &str = "domain";
    pub const TEXT: &str = "text";
}

fn placeholder_pattern() -> &'static Regex {
    static PATTERN: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("valid placeholder regex"))
}

/// Template text plus the placeholders found in it
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    text: String,
    placeholders: Vec<String>,
}

impl PromptTemplate {
    /// Parse a template, recording its placeholders in order of first use
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let mut placeholders: Vec<String> = Vec::new();
        for caps in placeholder_pattern().captures_iter(&text) {
            let name = caps[1].to_string();
            if !placeholders.contains(&name) {
                placeholders.push(name);
            }
        }
        Self { text, placeholders }
    }

    /// Built-in template for a variant
    pub fn for_variant(variant: Variant) -> Self {
        match variant {
            Variant::Full => Self::new(FULL_TEMPLATE),
            Variant::Simple => Self::new(SIMPLE_TEMPLATE),
            Variant::Domain => Self::new(DOMAIN_TEMPLATE),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn placeholders(&self) -> &[String] {
        &self.placeholders
    }

    /// Substitute every placeholder with its field value.
    ///
    /// Substitution is a single pass over the template: values are inserted
    /// literally and never re-scanned, so a source text containing `{text}`
    /// comes out unchanged.
    pub fn render(&self, fields: &HashMap<&str, &str>) -> Result<String> {
        if let Some(missing) = self
            .placeholders
            .iter()
            .find(|name| !fields.contains_key(name.as_str()))
        {
            return Err(TranslationError::MissingField {
                field: missing.clone(),
            });
        }

        let rendered = placeholder_pattern().replace_all(&self.text, |caps: &Captures| {
            fields.get(&caps[1]).copied().unwrap_or_default().to_string()
        });
        Ok(rendered.into_owned())
    }
}

/// Free-function form of [`PromptTemplate::render`]
pub fn render(template: &PromptTemplate, fields: &HashMap<&str, &str>) -> Result<String> {
    template.render(fields)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn basic_fields() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            (fields::SOURCE_LANGUAGE, "English"),
            (fields::TARGET_LANGUAGE, "繁體中文"),
            (fields::TEXT, "Hello"),
        ])
    }

    #[test]
    fn test_render_simple_template() {
        let template = PromptTemplate::for_variant(Variant::Simple);
        let prompt = render(&template, &basic_fields()).unwrap();

        assert!(prompt.contains("English文本：Hello"));
        assert!(prompt.contains("繁體中文翻譯："));
        assert!(prompt.contains("翻譯成繁體中文"));
        assert!(!placeholder_pattern().is_match(&prompt));
    }

    #[test]
    fn test_render_full_template_places_text_after_label() {
        let template = PromptTemplate::for_variant(Variant::Full);
        let prompt = template.render(&basic_fields()).unwrap();

        let label = prompt.find("English文本：").unwrap();
        let text = prompt.find("\nHello\n").unwrap();
        let answer = prompt.rfind("繁體中文翻譯：").unwrap();
        assert!(label < text && text < answer);
        assert!(!prompt.contains('{'));
    }

    #[test]
    fn test_domain_template_requires_domain() {
        let template = PromptTemplate::for_variant(Variant::Domain);
        let err = template.render(&basic_fields()).unwrap_err();
        assert!(matches!(err, TranslationError::MissingField { ref field } if field == "domain"));

        let mut with_domain = basic_fields();
        with_domain.insert(fields::DOMAIN, "商業");
        let prompt = template.render(&with_domain).unwrap();
        assert!(prompt.contains("專精於商業領域"));
    }

    #[test]
    fn test_render_is_literal_and_single_pass() {
        let template = PromptTemplate::new("[{text}] -> {target_language}");
        let mut values = basic_fields();
        values.insert(fields::TEXT, "{target_language} \\n $1");
        let prompt = template.render(&values).unwrap();
        assert_eq!(prompt, "[{target_language} \\n $1] -> 繁體中文");
    }

    #[test]
    fn test_placeholders_are_deduplicated() {
        let template = PromptTemplate::new(FULL_TEMPLATE);
        assert_eq!(
            template.placeholders(),
            &["target_language", "source_language", "text"]
        );
    }
}
