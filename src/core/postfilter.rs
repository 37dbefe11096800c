//! Post-processing applied to raw backend output

use std::fmt::Debug;

use crate::core::models::Variant;

/// Marker the templates put on the line preceding the expected answer
pub const TRANSLATION_MARKER: &str = "翻譯";

/// Transforms backend output into the text shown to the user
pub trait PostFilter: Send + Sync + Debug {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Clean up `response`; `target_language` is the name used in the prompt
    fn apply(&self, response: &str, target_language: &str) -> String;
}

/// Returns the response trimmed, nothing else
#[derive(Debug, Clone, Copy, Default)]
pub struct PassThrough;

impl PostFilter for PassThrough {
    fn name(&self) -> &'static str {
        "pass-through"
    }

    fn apply(&self, response: &str, _target_language: &str) -> String {
        response.trim().to_string()
    }
}

/// Drops a prompt the model repeated before its answer.
///
/// The first line mentioning both the target language and
/// [`TRANSLATION_MARKER`] ends the echo; everything after it is the answer.
/// Only meaningful for models that echo the template verbatim.
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoStrip;

impl PostFilter for EchoStrip {
    fn name(&self) -> &'static str {
        "echo-strip"
    }

    fn apply(&self, response: &str, target_language: &str) -> String {
        // An empty name would match any line mentioning the marker.
        if target_language.is_empty() || !response.contains(target_language) {
            return response.trim().to_string();
        }

        let lines: Vec<&str> = response.split('\n').collect();
        let marker = lines
            .iter()
            .position(|line| line.contains(target_language) && line.contains(TRANSLATION_MARKER));

        match marker {
            Some(i) if i + 1 < lines.len() => lines[i + 1..].join("\n").trim().to_string(),
            _ => response.trim().to_string(),
        }
    }
}

/// Filter a variant uses by default
pub fn for_variant(variant: Variant) -> Box<dyn PostFilter> {
    match variant {
        Variant::Domain => Box::new(EchoStrip),
        Variant::Full | Variant::Simple => Box::new(PassThrough),
    }
}
