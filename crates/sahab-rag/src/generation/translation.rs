//! Output localization for streamed answers
//!
//! Answers in the default language pass straight through. Any other
//! language needs the whole answer before it can be translated, so the
//! stream is drained, translated once and replayed word by word.

use futures::{stream, StreamExt};
use std::sync::Arc;

use crate::providers::{language_code, Translator};

use super::streamer::FragmentStream;

/// Translates fragment streams into the requested language
#[derive(Clone)]
pub struct Localizer {
    translator: Arc<dyn Translator>,
    default_language: String,
}

impl Localizer {
    /// Create a localizer; `default_language` is what the model answers in
    pub fn new(translator: Arc<dyn Translator>, default_language: impl Into<String>) -> Self {
        Self {
            translator,
            default_language: default_language.into(),
        }
    }

    /// Whether `language` needs no translation
    pub fn is_default(&self, language: &str) -> bool {
        let language = language.trim();
        if language.is_empty() || language.eq_ignore_ascii_case(&self.default_language) {
            return true;
        }
        let code = Self::target_code(language);
        code == Self::target_code(&self.default_language)
    }

    /// Translator code for a language name; unknown names are lowercased
    pub fn target_code(language: &str) -> String {
        match language_code(language) {
            Some(code) => code.to_string(),
            None => language.trim().to_lowercase(),
        }
    }

    /// Localize a fragment stream into `language`
    pub fn localize(&self, fragments: FragmentStream, language: &str) -> FragmentStream {
        if self.is_default(language) {
            return fragments;
        }

        let translator = Arc::clone(&self.translator);
        let target = Self::target_code(language);

        let translated = stream::once(async move {
            let text: String = fragments.collect::<Vec<String>>().await.concat();
            match translator.translate(&text, &target).await {
                Ok(translated) => {
                    tracing::debug!(
                        "Translated {} characters into '{}' with {}",
                        text.len(),
                        target,
                        translator.name()
                    );
                    translated
                }
                Err(e) => {
                    tracing::warn!("Translation into '{}' failed, sending original: {}", target, e);
                    text
                }
            }
        });

        Box::pin(translated.flat_map(|text| stream::iter(split_keep_whitespace(&text))))
    }
}

/// Split into words, each carrying its trailing whitespace
///
/// Leading whitespace becomes its own fragment, so the concatenation of the
/// result is always exactly `text`.
pub fn split_keep_whitespace(text: &str) -> Vec<String> {
    let mut fragments = Vec::new();
    let mut current = String::new();
    let mut in_whitespace = false;

    for c in text.chars() {
        if c.is_whitespace() {
            in_whitespace = true;
        } else if in_whitespace {
            if !current.is_empty() {
                fragments.push(std::mem::take(&mut current));
            }
            in_whitespace = false;
        }
        current.push(c);
    }
    if !current.is_empty() {
        fragments.push(current);
    }
    fragments
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, Result};
    use async_trait::async_trait;
    use parking_lot::Mutex;

    struct RecordingTranslator {
        calls: Mutex<Vec<(String, String)>>,
        fail: bool,
    }

    impl RecordingTranslator {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(Vec::new()),
                fail,
            })
        }
    }

    #[async_trait]
    impl Translator for RecordingTranslator {
        async fn translate(&self, text: &str, target: &str) -> Result<String> {
            self.calls.lock().push((text.to_string(), target.to_string()));
            if self.fail {
                Err(Error::translation("service unavailable"))
            } else {
                Ok(format!("[{}] {}", target, text))
            }
        }

        fn name(&self) -> &str {
            "recording"
        }
    }

    fn source(fragments: &[&str]) -> FragmentStream {
        let owned: Vec<String> = fragments.iter().map(|f| f.to_string()).collect();
        Box::pin(stream::iter(owned))
    }

    #[test]
    fn test_split_keep_whitespace_reassembles() {
        for text in ["", "bail", "  धारा 302  हत्या\n- दंड ", "a b\tc\n\n"] {
            assert_eq!(split_keep_whitespace(text).concat(), text);
        }
        assert_eq!(split_keep_whitespace("a  b c"), vec!["a  ", "b ", "c"]);
        assert_eq!(split_keep_whitespace(" a"), vec![" ", "a"]);
    }

    #[tokio::test]
    async fn test_default_language_is_identity() {
        let translator = RecordingTranslator::new(false);
        let localizer = Localizer::new(translator.clone(), "English");

        for language in ["English", "english", "", "en"] {
            let out: Vec<String> = localizer
                .localize(source(&["- Section", " 302"]), language)
                .collect()
                .await;
            assert_eq!(out, vec!["- Section", " 302"]);
        }
        assert!(translator.calls.lock().is_empty());
    }

    #[tokio::test]
    async fn test_translates_whole_answer_once() {
        let translator = RecordingTranslator::new(false);
        let localizer = Localizer::new(translator.clone(), "English");

        let out: Vec<String> = localizer
            .localize(source(&["Section ", "302 ", "applies."]), "Hindi")
            .collect()
            .await;

        assert_eq!(out.concat(), "[hi] Section 302 applies.");
        assert_eq!(out.len(), 4);
        let calls = translator.calls.lock();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0], ("Section 302 applies.".to_string(), "hi".to_string()));
    }

    #[tokio::test]
    async fn test_translation_failure_emits_original() {
        let localizer = Localizer::new(RecordingTranslator::new(true), "English");
        let out: Vec<String> = localizer
            .localize(source(&["Section ", "302"]), "Tamil")
            .collect()
            .await;
        assert_eq!(out.concat(), "Section 302");
    }

    #[tokio::test]
    async fn test_unknown_language_is_lowercased() {
        let translator = RecordingTranslator::new(false);
        let localizer = Localizer::new(translator.clone(), "English");
        let _: Vec<String> = localizer.localize(source(&["x"]), "French").collect().await;
        assert_eq!(translator.calls.lock()[0].1, "french");
    }
}
