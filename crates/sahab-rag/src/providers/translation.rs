//! Translation providers
//!
//! Answers are generated in English and translated on the way out when a
//! request asks for another language.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use crate::config::TranslationConfig;
use crate::error::{Error, Result};

/// Languages offered to users, with the code the translator expects
const LANGUAGES: &[(&str, &str)] = &[
    ("english", "en"),
    ("assamese", "as"),
    ("bengali", "bn"),
    ("gujarati", "gu"),
    ("hindi", "hi"),
    ("kannada", "kn"),
    ("malayalam", "ml"),
    ("marathi", "mr"),
    ("nepali", "ne"),
    ("odia", "or"),
    ("punjabi", "pa"),
    ("sindhi", "sd"),
    ("tamil", "ta"),
    ("telugu", "te"),
    ("urdu", "ur"),
];

/// Language code for a display name, case-insensitive
pub fn language_code(name: &str) -> Option<&'static str> {
    let name = name.trim().to_lowercase();
    LANGUAGES
        .iter()
        .find(|(language, _)| *language == name)
        .map(|(_, code)| *code)
}

/// Display names of every supported language, capitalized
pub fn supported_languages() -> Vec<String> {
    LANGUAGES
        .iter()
        .map(|(name, _)| {
            let mut chars = name.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect()
}

/// Trait for translating finished answer text
#[async_trait]
pub trait Translator: Send + Sync {
    /// Translate `text` into the language identified by `target`
    async fn translate(&self, text: &str, target: &str) -> Result<String>;

    /// Get provider name for logging
    fn name(&self) -> &str;
}

/// Translator backed by the public Google Translate endpoint
pub struct GoogleTranslator {
    client: Client,
    base_url: String,
}

impl GoogleTranslator {
    /// Create a new translator
    pub fn new(config: &TranslationConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }
}

/// Join the translated segments of a `translate_a/single` response
///
/// The payload is a nested array whose first element lists
/// `[translated, original, ...]` per sentence.
fn parse_segments(value: &serde_json::Value) -> Option<String> {
    let segments = value.get(0)?.as_array()?;
    let mut out = String::new();
    for segment in segments {
        if let Some(text) = segment.get(0).and_then(|t| t.as_str()) {
            out.push_str(text);
        }
    }
    Some(out)
}

#[async_trait]
impl Translator for GoogleTranslator {
    async fn translate(&self, text: &str, target: &str) -> Result<String> {
        if text.trim().is_empty() {
            return Ok(text.to_string());
        }

        let response = self
            .client
            .post(&self.base_url)
            .query(&[("client", "gtx"), ("sl", "auto"), ("tl", target), ("dt", "t")])
            .form(&[("q", text)])
            .send()
            .await
            .map_err(|e| Error::translation(format!("Translation request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::translation(format!(
                "Translation failed: HTTP {}",
                response.status()
            )));
        }

        let value: serde_json::Value = response
            .json()
            .await
            .map_err(|e| Error::translation(format!("Failed to parse translation: {}", e)))?;

        parse_segments(&value)
            .ok_or_else(|| Error::translation("Unexpected translation payload"))
    }

    fn name(&self) -> &str {
        "google"
    }
}

/// Translator that leaves text unchanged
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTranslator;

#[async_trait]
impl Translator for NoopTranslator {
    async fn translate(&self, text: &str, _target: &str) -> Result<String> {
        Ok(text.to_string())
    }

    fn name(&self) -> &str {
        "noop"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_language_codes() {
        assert_eq!(language_code("Hindi"), Some("hi"));
        assert_eq!(language_code(" tamil "), Some("ta"));
        assert_eq!(language_code("ODIA"), Some("or"));
        assert_eq!(language_code("Klingon"), None);
        assert_eq!(supported_languages().len(), 15);
        assert_eq!(supported_languages()[0], "English");
    }

    #[test]
    fn test_parse_segments_joins_sentences() {
        let payload = json!([
            [["धारा 302 ", "Section 302 ", null, null], ["हत्या।", "murder.", null, null]],
            null,
            "en"
        ]);
        assert_eq!(parse_segments(&payload).unwrap(), "धारा 302 हत्या।");
        assert!(parse_segments(&json!({"unexpected": true})).is_none());
    }

    #[tokio::test]
    async fn test_noop_translator() {
        let translator = NoopTranslator;
        assert_eq!(translator.translate("bail", "hi").await.unwrap(), "bail");
    }
}
